//! Error types for the tessera scene model.
//!
//! Uses `thiserror` for ergonomic error definition.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for scene model operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An attribute type name or id that is not part of the closed kind set.
    #[error("unknown attribute type: {0}")]
    UnknownAttributeType(String),

    /// A component type name that no factory has been registered for.
    #[error("unknown component type: {0}")]
    UnknownComponentType(String),

    /// A component type id that no factory has been registered for.
    #[error("unknown component type id: {0}")]
    UnknownComponentTypeId(u32),

    /// A registration key (type name or type id) is already bound to a different type.
    #[error("conflicting registration for component type {name:?} (id {id})")]
    DuplicateRegistration {
        /// The type name being registered.
        name: String,
        /// The numeric type id being registered.
        id: u32,
    },

    /// An explicit entity id collides with an entity already in the scene.
    #[error("entity id {0} is already in use")]
    DuplicateEntityId(u32),

    /// An entity id that is not present in the scene.
    #[error("entity not found: {0}")]
    EntityNotFound(u32),

    /// A component lookup that matched nothing.
    #[error("component not found: {type_name} (name {name:?})")]
    ComponentNotFound {
        /// The component type name that was queried.
        type_name: String,
        /// The instance name that was queried.
        name: String,
    },

    /// An attribute lookup that matched nothing.
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    /// A component is already attached to an entity.
    #[error("component {0} is already attached to an entity")]
    ComponentAttached(String),

    /// An entity already holds a component with the same type and instance name.
    #[error("entity already has a {type_name} component named {name:?}")]
    DuplicateComponent {
        /// The component type name being attached.
        type_name: String,
        /// The instance name being attached.
        name: String,
    },

    /// A value of one kind assigned to an attribute of another.
    #[error("attribute {attribute:?} holds {expected}, got {actual}")]
    TypeMismatch {
        /// The attribute being assigned.
        attribute: String,
        /// The canonical type name of the attribute's kind.
        expected: &'static str,
        /// The canonical type name of the assigned value's kind.
        actual: &'static str,
    },

    /// A static component's binary stream carried the wrong attribute count.
    #[error("attribute count mismatch: schema has {expected}, stream has {found}")]
    AttributeCountMismatch {
        /// Attributes in the declared schema.
        expected: usize,
        /// Attributes in the stream.
        found: usize,
    },

    /// Text that could not be parsed as a value of the expected kind.
    #[error("cannot parse {input:?} as {type_name}")]
    ParseValue {
        /// The canonical type name of the expected kind.
        type_name: &'static str,
        /// The input that failed to parse.
        input: String,
    },

    /// A malformed XML document or unexpected element structure.
    #[error("xml error: {0}")]
    Xml(String),

    /// A binary stream ended before the expected data.
    #[error("wire underflow: needed {needed} bytes, {remaining} remaining")]
    WireUnderflow {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the stream.
        remaining: usize,
    },

    /// A length-prefixed string that is not valid UTF-8.
    #[error("invalid utf-8 in wire string")]
    InvalidUtf8,

    /// An operation only dynamic components support was called on a static one.
    #[error("component {0} has a fixed attribute schema")]
    StaticSchema(String),

    /// A file read or write failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an unknown-attribute-type error.
    #[must_use]
    pub fn unknown_attribute_type(name: impl Into<String>) -> Self {
        Self::UnknownAttributeType(name.into())
    }

    /// Creates an unknown-component-type error.
    #[must_use]
    pub fn unknown_component_type(name: impl Into<String>) -> Self {
        Self::UnknownComponentType(name.into())
    }

    /// Creates a parse-value error.
    #[must_use]
    pub fn parse_value(type_name: &'static str, input: impl Into<String>) -> Self {
        Self::ParseValue {
            type_name,
            input: input.into(),
        }
    }

    /// Creates an xml structure error.
    #[must_use]
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Creates a component-not-found error.
    #[must_use]
    pub fn component_not_found(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ComponentNotFound {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}
