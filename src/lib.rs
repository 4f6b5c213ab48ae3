//! Tessera - Reflective entity-component-attribute scene model
//!
//! This crate re-exports both layers of the tessera workspace for
//! convenient access. For detailed documentation, see the individual
//! layer crates.
//!
//! ```text
//! Layer 1: tessera_scene      — Attributes, components, entities, scene,
//!                               XML/binary documents, interpolation
//! Layer 0: tessera_foundation — Value kinds, math composites, codecs
//! ```

pub use tessera_foundation as foundation;
pub use tessera_scene as scene;
