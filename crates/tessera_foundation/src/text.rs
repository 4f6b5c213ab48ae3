//! The text codec: attribute values as the strings stored in scene XML.

use glam::{DVec2, IVec2, Quat, Vec3};

use crate::error::{Error, Result};
use crate::math::{Color, Transform};
use crate::value::{AssetReference, AttributeTypeId, AttributeValue, Variant};

impl AttributeValue {
    /// Encodes this value as its document text form.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Real(n) => n.to_string(),
            Self::Color(c) => format!("{} {} {} {}", c.r, c.g, c.b, c.a),
            Self::Vector3(v) => format!("{} {} {}", v.x, v.y, v.z),
            Self::Bool(b) => if *b { "true" } else { "false" }.to_owned(),
            Self::UInt(n) => n.to_string(),
            Self::Quaternion(q) => format!("{} {} {} {}", q.w, q.x, q.y, q.z),
            Self::AssetReference(r) => r.0.clone(),
            Self::AssetReferenceList(list) => {
                list.iter().map(AssetReference::as_str).collect::<Vec<_>>().join(";")
            }
            Self::Variant(v) => v.0.clone(),
            Self::VariantList(list) => {
                list.iter().map(|v| v.0.as_str()).collect::<Vec<_>>().join(";")
            }
            Self::Transform(t) => format!(
                "{},{},{},{},{},{},{},{},{}",
                t.position.x,
                t.position.y,
                t.position.z,
                t.rotation.x,
                t.rotation.y,
                t.rotation.z,
                t.scale.x,
                t.scale.y,
                t.scale.z
            ),
            Self::Point(p) | Self::Size(p) => format!("{} {}", p.x, p.y),
            Self::PointF(p) | Self::SizeF(p) => format!("{} {}", p.x, p.y),
        }
    }

    /// Decodes a value of the given kind from its document text form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseValue`] when the text does not parse as the
    /// requested kind.
    pub fn from_text(kind: AttributeTypeId, text: &str) -> Result<Self> {
        let value = match kind {
            AttributeTypeId::String => Self::String(text.to_owned()),
            AttributeTypeId::Int => Self::Int(parse_scalar(kind, text)?),
            AttributeTypeId::Real => Self::Real(parse_scalar(kind, text)?),
            AttributeTypeId::UInt => Self::UInt(parse_scalar(kind, text)?),
            AttributeTypeId::Bool => Self::Bool(parse_bool(text)),
            AttributeTypeId::Color => Self::Color(parse_color(text)?),
            AttributeTypeId::Vector3 => {
                let [x, y, z] = parse_floats::<3>(kind, text, ' ')?;
                Self::Vector3(Vec3::new(x, y, z))
            }
            AttributeTypeId::Quaternion => {
                let [w, x, y, z] = parse_floats::<4>(kind, text, ' ')?;
                Self::Quaternion(Quat::from_xyzw(x, y, z, w))
            }
            AttributeTypeId::AssetReference => Self::AssetReference(AssetReference::new(text)),
            AttributeTypeId::AssetReferenceList => {
                Self::AssetReferenceList(split_list(text).map(AssetReference::new).collect())
            }
            AttributeTypeId::Variant => Self::Variant(Variant::new(text)),
            AttributeTypeId::VariantList => {
                Self::VariantList(split_list(text).map(Variant::new).collect())
            }
            AttributeTypeId::Transform => {
                let [px, py, pz, rx, ry, rz, sx, sy, sz] = parse_floats::<9>(kind, text, ',')?;
                Self::Transform(Transform::new(
                    Vec3::new(px, py, pz),
                    Vec3::new(rx, ry, rz),
                    Vec3::new(sx, sy, sz),
                ))
            }
            AttributeTypeId::Point => Self::Point(parse_ivec2(kind, text)?),
            AttributeTypeId::Size => Self::Size(parse_ivec2(kind, text)?),
            AttributeTypeId::PointF => Self::PointF(parse_dvec2(kind, text)?),
            AttributeTypeId::SizeF => Self::SizeF(parse_dvec2(kind, text)?),
        };
        Ok(value)
    }
}

fn parse_scalar<T: std::str::FromStr>(kind: AttributeTypeId, text: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| Error::parse_value(kind.type_name(), text))
}

// Established document behavior: a leading "true" or "1" reads as true and
// anything else as false, so bool text never fails to parse.
fn parse_bool(text: &str) -> bool {
    let t = text.trim();
    (t.len() >= 4 && t[..4].eq_ignore_ascii_case("true")) || t.starts_with('1')
}

fn parse_floats<const N: usize>(
    kind: AttributeTypeId,
    text: &str,
    separator: char,
) -> Result<[f32; N]> {
    let mut out = [0.0_f32; N];
    let mut fields = text.split(separator).map(str::trim).filter(|s| !s.is_empty());
    for slot in &mut out {
        let field = fields
            .next()
            .ok_or_else(|| Error::parse_value(kind.type_name(), text))?;
        *slot = field
            .parse()
            .map_err(|_| Error::parse_value(kind.type_name(), text))?;
    }
    if fields.next().is_some() {
        return Err(Error::parse_value(kind.type_name(), text));
    }
    Ok(out)
}

// Colors accept three fields with an implied opaque alpha.
fn parse_color(text: &str) -> Result<Color> {
    if let Ok([r, g, b, a]) = parse_floats::<4>(AttributeTypeId::Color, text, ' ') {
        return Ok(Color::new(r, g, b, a));
    }
    let [r, g, b] = parse_floats::<3>(AttributeTypeId::Color, text, ' ')?;
    Ok(Color::new(r, g, b, 1.0))
}

fn parse_ivec2(kind: AttributeTypeId, text: &str) -> Result<IVec2> {
    let mut fields = text.split_whitespace();
    let x = fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::parse_value(kind.type_name(), text))?;
    let y = fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::parse_value(kind.type_name(), text))?;
    if fields.next().is_some() {
        return Err(Error::parse_value(kind.type_name(), text));
    }
    Ok(IVec2::new(x, y))
}

fn parse_dvec2(kind: AttributeTypeId, text: &str) -> Result<DVec2> {
    let mut fields = text.split_whitespace();
    let x = fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::parse_value(kind.type_name(), text))?;
    let y = fields
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::parse_value(kind.type_name(), text))?;
    if fields.next().is_some() {
        return Err(Error::parse_value(kind.type_name(), text));
    }
    Ok(DVec2::new(x, y))
}

// Lists join with ';'. Splitting the empty string yields one empty element,
// which reads back as the empty list rather than a list of one empty entry.
fn split_list(text: &str) -> impl Iterator<Item = &str> {
    let mut parts: Vec<&str> = text.split(';').collect();
    if parts.len() == 1 && parts[0].is_empty() {
        parts.clear();
    }
    parts.into_iter()
}
