//! Integration tests for Layer 1: Scene
//!
//! Tests for entities, components, change propagation, the scene document
//! formats, and attribute interpolation.

mod components;
mod documents;
mod events;

use std::sync::Arc;

use tessera::foundation::AttributeTypeId;
use tessera::scene::{Attribute, AttributeMetadata, ComponentRegistry, Scene};

pub const PLACEABLE_TYPE_ID: u32 = 20;
pub const LIGHT_TYPE_ID: u32 = 16;

/// A registry with a couple of static component types, in the shape host
/// modules would register.
pub fn test_registry() -> Arc<ComponentRegistry> {
    let mut registry = ComponentRegistry::new();
    registry
        .register("Placeable", PLACEABLE_TYPE_ID, || {
            vec![
                Attribute::empty("transform", AttributeTypeId::Transform)
                    .with_metadata(Arc::new(AttributeMetadata::interpolatable())),
                Attribute::empty("visible", AttributeTypeId::Bool),
            ]
        })
        .unwrap();
    registry
        .register("Light", LIGHT_TYPE_ID, || {
            vec![
                Attribute::empty("range", AttributeTypeId::Real)
                    .with_metadata(Arc::new(AttributeMetadata::interpolatable())),
                Attribute::empty("color", AttributeTypeId::Color),
            ]
        })
        .unwrap();
    Arc::new(registry)
}

pub fn test_scene() -> Scene {
    Scene::new("test", true, test_registry())
}
