//! Reflective entity-component-attribute scene model.
//!
//! This crate provides:
//! - [`Attribute`] / [`AttributeMetadata`] - Named, typed value cells
//! - [`Component`] - Static- and dynamic-schema attribute bags
//! - [`ComponentRegistry`] - Type name/id to factory indirection
//! - [`Entity`] - Component ownership and action dispatch
//! - [`Scene`] - Entity map, id allocation, change routing, XML/binary
//!   documents, and attribute interpolation
//!
//! The model is single-threaded by design: scene mutation happens
//! synchronously on the owning thread, and listeners run before the
//! mutating call returns.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod attribute;
mod binary;
mod change;
mod component;
mod entity;
mod events;
mod interpolation;
mod metadata;
mod registry;
mod scene;
mod xml;

pub use attribute::Attribute;
pub use change::ChangeType;
pub use component::{AttributeTriple, Component, ComponentEvent};
pub use entity::{Action, Entity, EntityId, ExecScope};
pub use events::{ListenerId, SceneEvent};
pub use interpolation::AttributeRef;
pub use metadata::{AttributeMetadata, InterpolationMode};
pub use registry::{
    ComponentRegistry, DYNAMIC_COMPONENT_TYPE_ID, DYNAMIC_COMPONENT_TYPE_NAME,
    NAME_COMPONENT_TYPE_ID, NAME_COMPONENT_TYPE_NAME,
};
pub use scene::{IdConflict, LoadOptions, SaveOptions, Scene};
