//! The tagged value type stored in scene attributes.

use std::fmt;

use glam::{DVec2, IVec2, Quat, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{Color, Transform};

/// The closed set of attribute kinds.
///
/// Each kind has a stable numeric id and a canonical lowercase type name;
/// both appear in the scene document formats and must never change for
/// existing kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u32)]
pub enum AttributeTypeId {
    /// UTF-8 string.
    String = 1,
    /// 32-bit signed integer.
    Int = 2,
    /// 32-bit float.
    Real = 3,
    /// RGBA color.
    Color = 4,
    /// 3D vector.
    Vector3 = 5,
    /// Boolean.
    Bool = 6,
    /// 32-bit unsigned integer.
    UInt = 7,
    /// Unit quaternion.
    Quaternion = 8,
    /// Reference to an external asset.
    AssetReference = 9,
    /// List of asset references.
    AssetReferenceList = 10,
    /// Generic tagged value, carried as text.
    Variant = 11,
    /// List of generic tagged values.
    VariantList = 12,
    /// Position + rotation + scale composite.
    Transform = 13,
    /// 2D integer point.
    Point = 14,
    /// 2D double-precision point.
    PointF = 15,
    /// 2D integer size.
    Size = 16,
    /// 2D double-precision size.
    SizeF = 17,
}

impl AttributeTypeId {
    /// All kinds, in id order.
    pub const ALL: [Self; 17] = [
        Self::String,
        Self::Int,
        Self::Real,
        Self::Color,
        Self::Vector3,
        Self::Bool,
        Self::UInt,
        Self::Quaternion,
        Self::AssetReference,
        Self::AssetReferenceList,
        Self::Variant,
        Self::VariantList,
        Self::Transform,
        Self::Point,
        Self::PointF,
        Self::Size,
        Self::SizeF,
    ];

    /// Returns the canonical lowercase type name.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Real => "real",
            Self::Color => "color",
            Self::Vector3 => "vector3",
            Self::Bool => "bool",
            Self::UInt => "uint",
            Self::Quaternion => "quaternion",
            Self::AssetReference => "assetreference",
            Self::AssetReferenceList => "assetreferencelist",
            Self::Variant => "variant",
            Self::VariantList => "variantlist",
            Self::Transform => "transform",
            Self::Point => "point",
            Self::PointF => "pointf",
            Self::Size => "size",
            Self::SizeF => "sizef",
        }
    }

    /// Looks a kind up by type name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAttributeType`] for names outside the closed set.
    pub fn from_type_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == lower)
            .ok_or_else(|| Error::unknown_attribute_type(name))
    }

    /// Looks a kind up by numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAttributeType`] for ids outside the closed set.
    pub fn from_id(id: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| *kind as u32 == id)
            .ok_or_else(|| Error::unknown_attribute_type(id.to_string()))
    }

    /// Returns true if values of this kind can be interpolated.
    #[must_use]
    pub const fn interpolatable(self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Real
                | Self::UInt
                | Self::Vector3
                | Self::Quaternion
                | Self::Color
                | Self::Transform
        )
    }
}

impl fmt::Display for AttributeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A reference to an external asset by URL or scene-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssetReference(pub String);

impl AssetReference {
    /// Creates an asset reference from any string-like value.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the raw reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A generic tagged value carried as text, for reflective callers that do
/// not know the concrete kind at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variant(pub String);

impl Variant {
    /// Creates a variant from any string-like value.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

/// A typed attribute value, one variant per kind in the closed set.
///
/// The kind of a value never changes through mutation; codecs and
/// interpolation dispatch on the variant.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeValue {
    /// UTF-8 string.
    String(String),
    /// 32-bit signed integer.
    Int(i32),
    /// 32-bit float.
    Real(f32),
    /// RGBA color.
    Color(Color),
    /// 3D vector.
    Vector3(Vec3),
    /// Boolean.
    Bool(bool),
    /// 32-bit unsigned integer.
    UInt(u32),
    /// Unit quaternion.
    Quaternion(Quat),
    /// Reference to an external asset.
    AssetReference(AssetReference),
    /// List of asset references.
    AssetReferenceList(Vec<AssetReference>),
    /// Generic tagged value.
    Variant(Variant),
    /// List of generic tagged values.
    VariantList(Vec<Variant>),
    /// Position + rotation + scale composite.
    Transform(Transform),
    /// 2D integer point.
    Point(IVec2),
    /// 2D double-precision point.
    PointF(DVec2),
    /// 2D integer size.
    Size(IVec2),
    /// 2D double-precision size.
    SizeF(DVec2),
}

impl AttributeValue {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn type_id(&self) -> AttributeTypeId {
        match self {
            Self::String(_) => AttributeTypeId::String,
            Self::Int(_) => AttributeTypeId::Int,
            Self::Real(_) => AttributeTypeId::Real,
            Self::Color(_) => AttributeTypeId::Color,
            Self::Vector3(_) => AttributeTypeId::Vector3,
            Self::Bool(_) => AttributeTypeId::Bool,
            Self::UInt(_) => AttributeTypeId::UInt,
            Self::Quaternion(_) => AttributeTypeId::Quaternion,
            Self::AssetReference(_) => AttributeTypeId::AssetReference,
            Self::AssetReferenceList(_) => AttributeTypeId::AssetReferenceList,
            Self::Variant(_) => AttributeTypeId::Variant,
            Self::VariantList(_) => AttributeTypeId::VariantList,
            Self::Transform(_) => AttributeTypeId::Transform,
            Self::Point(_) => AttributeTypeId::Point,
            Self::PointF(_) => AttributeTypeId::PointF,
            Self::Size(_) => AttributeTypeId::Size,
            Self::SizeF(_) => AttributeTypeId::SizeF,
        }
    }

    /// Returns the canonical type name of this value's kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_id().type_name()
    }

    /// Returns the zero value for a kind.
    #[must_use]
    pub fn default_for(kind: AttributeTypeId) -> Self {
        match kind {
            AttributeTypeId::String => Self::String(String::new()),
            AttributeTypeId::Int => Self::Int(0),
            AttributeTypeId::Real => Self::Real(0.0),
            AttributeTypeId::Color => Self::Color(Color::default()),
            AttributeTypeId::Vector3 => Self::Vector3(Vec3::ZERO),
            AttributeTypeId::Bool => Self::Bool(false),
            AttributeTypeId::UInt => Self::UInt(0),
            AttributeTypeId::Quaternion => Self::Quaternion(Quat::IDENTITY),
            AttributeTypeId::AssetReference => Self::AssetReference(AssetReference::default()),
            AttributeTypeId::AssetReferenceList => Self::AssetReferenceList(Vec::new()),
            AttributeTypeId::Variant => Self::Variant(Variant::default()),
            AttributeTypeId::VariantList => Self::VariantList(Vec::new()),
            AttributeTypeId::Transform => Self::Transform(Transform::IDENTITY),
            AttributeTypeId::Point | AttributeTypeId::Size => Self::Point(IVec2::ZERO),
            AttributeTypeId::PointF | AttributeTypeId::SizeF => Self::PointF(DVec2::ZERO),
        }
        .coerce_kind(kind)
    }

    // Size/SizeF share payloads with Point/PointF; fix the tag up after default_for.
    fn coerce_kind(self, kind: AttributeTypeId) -> Self {
        match (kind, self) {
            (AttributeTypeId::Size, Self::Point(v)) => Self::Size(v),
            (AttributeTypeId::SizeF, Self::PointF(v)) => Self::SizeF(v),
            (_, v) => v,
        }
    }

    /// Attempts to extract a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract a signed integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract an unsigned integer.
    #[must_use]
    pub const fn as_uint(&self) -> Option<u32> {
        match self {
            Self::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float.
    #[must_use]
    pub const fn as_real(&self) -> Option<f32> {
        match self {
            Self::Real(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a vector.
    #[must_use]
    pub const fn as_vector3(&self) -> Option<Vec3> {
        match self {
            Self::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract a quaternion.
    #[must_use]
    pub const fn as_quaternion(&self) -> Option<Quat> {
        match self {
            Self::Quaternion(q) => Some(*q),
            _ => None,
        }
    }

    /// Attempts to extract a color.
    #[must_use]
    pub const fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Attempts to extract a transform.
    #[must_use]
    pub const fn as_transform(&self) -> Option<&Transform> {
        match self {
            Self::Transform(t) => Some(t),
            _ => None,
        }
    }

    /// Interpolates between two values of this value's kind.
    ///
    /// Numeric, vector, color, quaternion, and transform kinds interpolate;
    /// for every other kind this returns `None` (a no-op for the caller).
    /// Mismatched kinds also return `None`.
    #[must_use]
    pub fn interpolated(start: &Self, end: &Self, t: f32) -> Option<Self> {
        use crate::math::lerp_f32;
        match (start, end) {
            (Self::Int(a), Self::Int(b)) => {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
                Some(Self::Int(lerp_f32(*a as f32, *b as f32, t).round() as i32))
            }
            (Self::UInt(a), Self::UInt(b)) => {
                #[allow(
                    clippy::cast_precision_loss,
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss
                )]
                Some(Self::UInt(lerp_f32(*a as f32, *b as f32, t).round() as u32))
            }
            (Self::Real(a), Self::Real(b)) => Some(Self::Real(lerp_f32(*a, *b, t))),
            (Self::Vector3(a), Self::Vector3(b)) => Some(Self::Vector3(a.lerp(*b, t))),
            (Self::Quaternion(a), Self::Quaternion(b)) => Some(Self::Quaternion(a.slerp(*b, t))),
            (Self::Color(a), Self::Color(b)) => Some(Self::Color(a.lerp(*b, t))),
            (Self::Transform(a), Self::Transform(b)) => {
                Some(Self::Transform(Transform::interpolate(a, b, t)))
            }
            _ => None,
        }
    }
}

// Value equality is structural; floats compare by bits so that Eq-like
// behavior holds for values that round-trip through the codecs.
impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Real(a), Self::Real(b)) => a.to_bits() == b.to_bits(),
            (Self::Color(a), Self::Color(b)) => a == b,
            (Self::Vector3(a), Self::Vector3(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Quaternion(a), Self::Quaternion(b)) => a == b,
            (Self::AssetReference(a), Self::AssetReference(b)) => a == b,
            (Self::AssetReferenceList(a), Self::AssetReferenceList(b)) => a == b,
            (Self::Variant(a), Self::Variant(b)) => a == b,
            (Self::VariantList(a), Self::VariantList(b)) => a == b,
            (Self::Transform(a), Self::Transform(b)) => a == b,
            (Self::Point(a), Self::Point(b)) | (Self::Size(a), Self::Size(b)) => a == b,
            (Self::PointF(a), Self::PointF(b)) | (Self::SizeF(a), Self::SizeF(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// Convenience From implementations

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for AttributeValue {
    fn from(n: u32) -> Self {
        Self::UInt(n)
    }
}

impl From<f32> for AttributeValue {
    fn from(n: f32) -> Self {
        Self::Real(n)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec3> for AttributeValue {
    fn from(v: Vec3) -> Self {
        Self::Vector3(v)
    }
}

impl From<Quat> for AttributeValue {
    fn from(q: Quat) -> Self {
        Self::Quaternion(q)
    }
}

impl From<Color> for AttributeValue {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

impl From<Transform> for AttributeValue {
    fn from(t: Transform) -> Self {
        Self::Transform(t)
    }
}

impl From<AssetReference> for AttributeValue {
    fn from(r: AssetReference) -> Self {
        Self::AssetReference(r)
    }
}
