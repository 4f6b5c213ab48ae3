//! Attribute value kinds, math composites, and codecs for the tessera scene model.
//!
//! This crate provides:
//! - [`AttributeValue`] - The tagged value type stored in scene attributes
//! - [`AttributeTypeId`] - The closed set of attribute kinds and their wire names
//! - [`Color`], [`Transform`] - Composite math types
//! - [`WireWriter`], [`WireReader`] - The length-prefixed binary codec
//! - [`Error`] - Error types shared by the scene model

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
pub mod math;
mod text;
mod value;
pub mod wire;

pub use error::{Error, Result};
pub use math::{Color, Transform};
pub use value::{AssetReference, AttributeTypeId, AttributeValue, Variant};
pub use wire::{WireReader, WireWriter};
