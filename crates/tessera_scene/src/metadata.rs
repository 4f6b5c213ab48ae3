//! Per-attribute policy read by editors, replication, and interpolation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How an attribute's value may be interpolated over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InterpolationMode {
    /// Value changes snap; interpolation requests are rejected.
    #[default]
    None,
    /// Value changes may be smoothed with a time-based interpolation.
    Linear,
}

/// Optional, externally owned policy attached to an attribute.
///
/// Attributes hold a shared reference to their metadata and never mutate
/// it; the table is typically built once per component type at registration
/// time.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttributeMetadata {
    /// Whether time-based interpolation is allowed for this attribute.
    pub interpolation: InterpolationMode,
    /// Legal values for enumerated attributes; empty means unrestricted.
    pub enum_choices: Vec<String>,
    /// Inclusive lower bound for numeric attributes.
    pub min: Option<f32>,
    /// Inclusive upper bound for numeric attributes.
    pub max: Option<f32>,
    /// Element type hint for list-valued attributes.
    pub element_type: Option<String>,
}

impl AttributeMetadata {
    /// Metadata that enables linear interpolation and nothing else.
    #[must_use]
    pub fn interpolatable() -> Self {
        Self {
            interpolation: InterpolationMode::Linear,
            ..Self::default()
        }
    }
}
