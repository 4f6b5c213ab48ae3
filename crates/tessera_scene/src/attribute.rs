//! The attribute cell: a named, typed value owned by a component.

use std::sync::Arc;

use tessera_foundation::wire::{WireReader, WireWriter};
use tessera_foundation::{AttributeTypeId, AttributeValue, Result};

use crate::metadata::{AttributeMetadata, InterpolationMode};

/// A named, typed value cell.
///
/// The kind of an attribute is fixed at creation; every store keeps the
/// stored variant. Notification is not this type's concern: mutation
/// announcements are produced by the owning component and routed by the
/// scene, so bare `set` calls here are only made on detached values
/// (codec internals, interpolation snapshots).
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    value: AttributeValue,
    metadata: Option<Arc<AttributeMetadata>>,
}

impl Attribute {
    /// Creates an attribute with an initial value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
            metadata: None,
        }
    }

    /// Creates an attribute holding the zero value of a kind.
    #[must_use]
    pub fn empty(name: impl Into<String>, kind: AttributeTypeId) -> Self {
        Self::new(name, AttributeValue::default_for(kind))
    }

    /// Attaches metadata; builder form used by component factories.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<AttributeMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The attribute name, unique within its component.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// The kind of the stored value.
    #[must_use]
    pub fn type_id(&self) -> AttributeTypeId {
        self.value.type_id()
    }

    /// The canonical type name of the stored value's kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.value.type_name()
    }

    /// The attached metadata, if any.
    #[must_use]
    pub fn metadata(&self) -> Option<&Arc<AttributeMetadata>> {
        self.metadata.as_ref()
    }

    /// True when metadata marks this attribute interpolatable and the kind
    /// supports it.
    #[must_use]
    pub fn interpolatable(&self) -> bool {
        self.type_id().interpolatable()
            && self
                .metadata
                .as_ref()
                .is_some_and(|m| m.interpolation == InterpolationMode::Linear)
    }

    /// Stores a value directly, with no notification.
    pub(crate) fn set(&mut self, value: AttributeValue) {
        self.value = value;
    }

    /// Encodes the value as document text.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.value.to_text()
    }

    /// Replaces the value by parsing document text of this attribute's kind.
    ///
    /// # Errors
    ///
    /// Returns a parse error and leaves the value untouched when the text
    /// does not parse.
    pub(crate) fn set_from_text(&mut self, text: &str) -> Result<()> {
        self.value = AttributeValue::from_text(self.type_id(), text)?;
        Ok(())
    }

    /// Writes the value in wire form.
    pub fn encode(&self, writer: &mut WireWriter) {
        self.value.encode(writer);
    }

    /// Replaces the value by decoding wire form of this attribute's kind.
    ///
    /// # Errors
    ///
    /// Returns a wire error and leaves the value untouched on short or
    /// invalid input.
    pub(crate) fn decode(&mut self, reader: &mut WireReader<'_>) -> Result<()> {
        self.value = AttributeValue::decode(self.type_id(), reader)?;
        Ok(())
    }

}
