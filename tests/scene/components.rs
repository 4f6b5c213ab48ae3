use proptest::prelude::*;

use tessera::foundation::{AttributeValue, Error};
use tessera::scene::{
    AttributeTriple, ChangeType, DYNAMIC_COMPONENT_TYPE_ID, DYNAMIC_COMPONENT_TYPE_NAME,
};

use crate::{test_scene, LIGHT_TYPE_ID};

// ============================================================================
// Creation through the registry
// ============================================================================

#[test]
fn test_create_component_builds_declared_schema() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "sun", ChangeType::Default).unwrap();
    let comp = scene.entity(id).unwrap().component("Light", Some("sun")).unwrap();
    assert_eq!(comp.type_id(), LIGHT_TYPE_ID);
    assert!(!comp.dynamic());
    let names: Vec<&str> = comp.attributes().iter().map(|a| a.name()).collect();
    assert_eq!(names, ["range", "color"]);
}

#[test]
fn test_unknown_component_type_fails() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    assert!(matches!(
        scene.create_component(id, "Camera", "", ChangeType::Default),
        Err(Error::UnknownComponentType(_))
    ));
}

#[test]
fn test_duplicate_type_name_pair_rejected() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "sun", ChangeType::Default).unwrap();
    assert!(matches!(
        scene.create_component(id, "Light", "sun", ChangeType::Default),
        Err(Error::DuplicateComponent { type_name, name })
            if type_name == "Light" && name == "sun"
    ));
    // A different instance name is fine.
    scene.create_component(id, "Light", "moon", ChangeType::Default).unwrap();
    assert_eq!(scene.entity(id).unwrap().components().len(), 2);
}

#[test]
fn test_get_or_create_is_idempotent() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene
        .get_or_create_component(id, "Light", "sun", ChangeType::Default)
        .unwrap();
    scene
        .get_or_create_component(id, "Light", "sun", ChangeType::Default)
        .unwrap();
    assert_eq!(scene.entity(id).unwrap().components().len(), 1);
}

#[test]
fn test_component_lookup_by_type_id() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene
        .create_component(id, DYNAMIC_COMPONENT_TYPE_NAME, "state", ChangeType::Default)
        .unwrap();
    let entity = scene.entity(id).unwrap();
    let comp = entity
        .component_by_id(DYNAMIC_COMPONENT_TYPE_ID, "state")
        .unwrap();
    assert!(comp.dynamic());
    assert_eq!(comp.name(), "state");
}

// ============================================================================
// Attribute mutation
// ============================================================================

#[test]
fn test_set_attribute_checks_kind() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "", ChangeType::Default).unwrap();
    let err = scene
        .set_attribute(
            id,
            "Light",
            None,
            "range",
            AttributeValue::Bool(true),
            ChangeType::Default,
        )
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
    // Value untouched.
    let comp = scene.entity(id).unwrap().component("Light", None).unwrap();
    assert_eq!(comp.attribute("range").unwrap().value(), &AttributeValue::Real(0.0));
}

#[test]
fn test_dynamic_attribute_lifecycle() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene
        .create_component(id, DYNAMIC_COMPONENT_TYPE_NAME, "", ChangeType::Default)
        .unwrap();
    scene
        .create_attribute(id, DYNAMIC_COMPONENT_TYPE_NAME, None, "real", "health", ChangeType::Default)
        .unwrap();
    scene
        .set_attribute(
            id,
            DYNAMIC_COMPONENT_TYPE_NAME,
            None,
            "health",
            AttributeValue::Real(75.0),
            ChangeType::Default,
        )
        .unwrap();
    scene
        .remove_attribute(id, DYNAMIC_COMPONENT_TYPE_NAME, None, "health", ChangeType::Default)
        .unwrap();
    let comp = scene
        .entity(id)
        .unwrap()
        .component(DYNAMIC_COMPONENT_TYPE_NAME, None)
        .unwrap();
    assert!(comp.attribute("health").is_none());
}

#[test]
fn test_static_components_reject_schema_edits() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "", ChangeType::Default).unwrap();
    assert!(matches!(
        scene.create_attribute(id, "Light", None, "int", "extra", ChangeType::Default),
        Err(Error::StaticSchema(_))
    ));
    assert!(matches!(
        scene.remove_attribute(id, "Light", None, "range", ChangeType::Default),
        Err(Error::StaticSchema(_))
    ));
}

// ============================================================================
// Merge-diff convergence
// ============================================================================

#[test]
fn test_merge_classifies_update_create_delete() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene
        .create_component(id, DYNAMIC_COMPONENT_TYPE_NAME, "", ChangeType::Default)
        .unwrap();
    for (kind, name) in [("int", "hits"), ("string", "label"), ("bool", "armed")] {
        scene
            .create_attribute(id, DYNAMIC_COMPONENT_TYPE_NAME, None, kind, name, ChangeType::Default)
            .unwrap();
    }

    let incoming = vec![
        AttributeTriple {
            name: "armed".to_owned(),
            type_name: "bool".to_owned(),
            value: "true".to_owned(),
        },
        AttributeTriple {
            name: "speed".to_owned(),
            type_name: "real".to_owned(),
            value: "2.5".to_owned(),
        },
    ];

    let comp = scene
        .entity_mut(id)
        .unwrap()
        .component_mut(DYNAMIC_COMPONENT_TYPE_NAME, None)
        .unwrap();
    comp.merge_triples(incoming, ChangeType::Disconnected);

    // "armed" updated, "speed" created, "hits" and "label" deleted.
    let names: Vec<&str> = comp.attributes().iter().map(|a| a.name()).collect();
    assert_eq!(names, ["armed", "speed"]);
    assert_eq!(comp.attribute("armed").unwrap().value(), &AttributeValue::Bool(true));
    assert_eq!(comp.attribute("speed").unwrap().value(), &AttributeValue::Real(2.5));
}

proptest! {
    /// Merging any incoming record set into any starting schema converges
    /// to exactly the incoming set, and a second merge of the same records
    /// produces no structural events.
    #[test]
    fn prop_merge_converges_and_is_idempotent(
        existing in proptest::collection::btree_set("[a-f]{1,3}", 0..6),
        incoming in proptest::collection::btree_map("[a-f]{1,3}", 0_i32..100, 0..6),
    ) {
        let mut scene = test_scene();
        let id = scene.create_entity(ChangeType::Disconnected);
        scene
            .create_component(id, DYNAMIC_COMPONENT_TYPE_NAME, "", ChangeType::Disconnected)
            .unwrap();
        for name in &existing {
            scene
                .create_attribute(
                    id,
                    DYNAMIC_COMPONENT_TYPE_NAME,
                    None,
                    "string",
                    name,
                    ChangeType::Disconnected,
                )
                .unwrap();
        }

        let records: Vec<AttributeTriple> = incoming
            .iter()
            .map(|(name, value)| AttributeTriple {
                name: name.clone(),
                type_name: "int".to_owned(),
                value: value.to_string(),
            })
            .collect();

        let comp = scene
            .entity_mut(id)
            .unwrap()
            .component_mut(DYNAMIC_COMPONENT_TYPE_NAME, None)
            .unwrap();
        comp.merge_triples(records.clone(), ChangeType::Disconnected);

        let names: Vec<String> = comp.attributes().iter().map(|a| a.name().to_owned()).collect();
        let expected: Vec<String> = incoming.keys().cloned().collect();
        prop_assert_eq!(&names, &expected);

        // Second application changes nothing structurally.
        comp.merge_triples(records, ChangeType::Disconnected);
        let names_again: Vec<String> =
            comp.attributes().iter().map(|a| a.name().to_owned()).collect();
        prop_assert_eq!(names_again, expected);
    }
}
