use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tessera::foundation::AttributeValue;
use tessera::scene::{
    ChangeType, ComponentRegistry, LoadOptions, SaveOptions, Scene, SceneEvent,
    DYNAMIC_COMPONENT_TYPE_NAME,
};

use crate::{test_registry, test_scene};

fn load_opts_keep_ids() -> LoadOptions {
    LoadOptions {
        use_file_ids: true,
        ..LoadOptions::default()
    }
}

fn scene_with_dynamic_pair() -> (Scene, tessera::scene::EntityId) {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene
        .create_component(id, DYNAMIC_COMPONENT_TYPE_NAME, "", ChangeType::Default)
        .unwrap();
    for (name, value) in [("a", "1"), ("b", "2")] {
        scene
            .create_attribute(id, DYNAMIC_COMPONENT_TYPE_NAME, None, "string", name, ChangeType::Default)
            .unwrap();
        scene
            .set_attribute(
                id,
                DYNAMIC_COMPONENT_TYPE_NAME,
                None,
                name,
                AttributeValue::from(value),
                ChangeType::Default,
            )
            .unwrap();
    }
    (scene, id)
}

// ============================================================================
// XML round trips
// ============================================================================

#[test]
fn test_dynamic_component_survives_xml_round_trip() {
    let (scene, id) = scene_with_dynamic_pair();
    let xml = scene.scene_xml(SaveOptions::default());

    let mut other = Scene::new("copy", true, Arc::clone(scene.registry()));
    let loaded = other.load_xml(&xml, load_opts_keep_ids(), ChangeType::Default).unwrap();

    // Same id, same attribute set, same values.
    assert_eq!(loaded, vec![id]);
    let comp = other
        .entity(id)
        .unwrap()
        .component(DYNAMIC_COMPONENT_TYPE_NAME, None)
        .unwrap();
    assert_eq!(comp.attribute("a").unwrap().value(), &AttributeValue::from("1"));
    assert_eq!(comp.attribute("b").unwrap().value(), &AttributeValue::from("2"));
    assert_eq!(comp.attributes().len(), 2);
}

#[test]
fn test_static_component_xml_round_trip_preserves_values() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "sun", ChangeType::Default).unwrap();
    scene
        .set_attribute(id, "Light", None, "range", AttributeValue::Real(30.5), ChangeType::Default)
        .unwrap();

    let xml = scene.scene_xml(SaveOptions::default());
    let mut other = Scene::new("copy", true, Arc::clone(scene.registry()));
    other.load_xml(&xml, load_opts_keep_ids(), ChangeType::Default).unwrap();

    let comp = other.entity(id).unwrap().component("Light", Some("sun")).unwrap();
    assert_eq!(comp.attribute("range").unwrap().value(), &AttributeValue::Real(30.5));
}

#[test]
fn test_xml_and_binary_agree() {
    let (scene, id) = scene_with_dynamic_pair();
    let xml = scene.scene_xml(SaveOptions::default());
    let bytes = scene.scene_binary(SaveOptions::default());

    let mut from_xml = Scene::new("x", true, Arc::clone(scene.registry()));
    from_xml.load_xml(&xml, load_opts_keep_ids(), ChangeType::Default).unwrap();
    let mut from_binary = Scene::new("b", true, Arc::clone(scene.registry()));
    from_binary
        .load_binary(&bytes, load_opts_keep_ids(), ChangeType::Default)
        .unwrap();

    let via_xml = from_xml
        .entity(id)
        .unwrap()
        .component(DYNAMIC_COMPONENT_TYPE_NAME, None)
        .unwrap()
        .to_triples();
    let via_binary = from_binary
        .entity(id)
        .unwrap()
        .component(DYNAMIC_COMPONENT_TYPE_NAME, None)
        .unwrap()
        .to_triples();
    assert_eq!(via_xml, via_binary);
}

// ============================================================================
// Two-pass load events
// ============================================================================

#[test]
fn test_load_events_fire_after_entities_are_complete() {
    let (scene, id) = scene_with_dynamic_pair();
    let xml = scene.scene_xml(SaveOptions::default());

    let mut other = Scene::new("copy", true, Arc::clone(scene.registry()));
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    other.add_listener(move |event| match event {
        SceneEvent::EntityCreated { entity, .. } => {
            sink.borrow_mut().push(format!("created {entity}"));
        }
        SceneEvent::AttributeChanged { attribute, .. } => {
            sink.borrow_mut().push(format!("changed {attribute}"));
        }
        _ => {}
    });

    other.load_xml(&xml, load_opts_keep_ids(), ChangeType::Default).unwrap();

    // Creation is announced first, then one change per attribute; the
    // during-build mutations emit nothing.
    assert_eq!(
        *log.borrow(),
        vec![
            format!("created {id}"),
            "changed a".to_owned(),
            "changed b".to_owned(),
        ]
    );
}

// ============================================================================
// Flat files
// ============================================================================

#[test]
fn test_file_round_trip_with_clear() {
    let (scene, id) = scene_with_dynamic_pair();
    let dir = std::env::temp_dir();
    let xml_path = dir.join(format!("tessera-doc-{}.xml", std::process::id()));
    let bin_path = dir.join(format!("tessera-doc-{}.bin", std::process::id()));

    scene.save_xml_file(&xml_path, SaveOptions::default()).unwrap();
    scene.save_binary_file(&bin_path, SaveOptions::default()).unwrap();

    let mut other = Scene::new("copy", true, Arc::clone(scene.registry()));
    // Pre-existing content is dropped by clear_scene.
    other.create_entity(ChangeType::Default);
    let loaded = other
        .load_xml_file(&xml_path, load_opts_keep_ids(), ChangeType::Default, true)
        .unwrap();
    assert_eq!(loaded, vec![id]);
    assert_eq!(other.entity_count(), 1);

    let loaded = other
        .load_binary_file(&bin_path, load_opts_keep_ids(), ChangeType::Default, true)
        .unwrap();
    assert_eq!(loaded, vec![id]);
    assert_eq!(other.entity_count(), 1);

    let _ = std::fs::remove_file(xml_path);
    let _ = std::fs::remove_file(bin_path);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let mut scene = test_scene();
    let result = scene.load_xml_file(
        "/nonexistent/scene.xml",
        LoadOptions::default(),
        ChangeType::Default,
        false,
    );
    assert!(matches!(result, Err(tessera::foundation::Error::Io(_))));
}

// ============================================================================
// Registry asymmetry
// ============================================================================

#[test]
fn test_disjoint_registries_degrade_per_format() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "", ChangeType::Default).unwrap();
    scene
        .create_component(id, DYNAMIC_COMPONENT_TYPE_NAME, "", ChangeType::Default)
        .unwrap();

    let xml = scene.scene_xml(SaveOptions::default());
    let bytes = scene.scene_binary(SaveOptions::default());

    // A registry without Light: the XML loader skips the element, the
    // binary loader skips the blob; either way the dynamic component stays.
    let bare = Arc::new(ComponentRegistry::new());

    let mut from_xml = Scene::new("x", true, Arc::clone(&bare));
    let loaded = from_xml.load_xml(&xml, load_opts_keep_ids(), ChangeType::Default).unwrap();
    assert_eq!(loaded, vec![id]);
    let entity = from_xml.entity(id).unwrap();
    assert!(entity.component("Light", None).is_none());
    assert!(entity.component(DYNAMIC_COMPONENT_TYPE_NAME, None).is_some());

    let mut from_binary = Scene::new("b", true, bare);
    let loaded = from_binary
        .load_binary(&bytes, load_opts_keep_ids(), ChangeType::Default)
        .unwrap();
    assert_eq!(loaded, vec![id]);
    let entity = from_binary.entity(id).unwrap();
    assert!(entity.component("Light", None).is_none());
    assert!(entity.component(DYNAMIC_COMPONENT_TYPE_NAME, None).is_some());
}

// ============================================================================
// Save filtering
// ============================================================================

#[test]
fn test_temporary_component_excluded_from_save() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "keep", ChangeType::Default).unwrap();
    scene.create_component(id, "Light", "drop", ChangeType::Default).unwrap();
    scene
        .entity_mut(id)
        .unwrap()
        .component_mut("Light", Some("drop"))
        .unwrap()
        .set_temporary(true);

    let xml = scene.scene_xml(SaveOptions::default());
    let mut other = Scene::new("copy", true, test_registry());
    other.load_xml(&xml, load_opts_keep_ids(), ChangeType::Default).unwrap();
    let entity = other.entity(id).unwrap();
    assert!(entity.component("Light", Some("keep")).is_some());
    assert!(entity.component("Light", Some("drop")).is_none());

    let bytes = scene.scene_binary(SaveOptions {
        include_temporary: true,
        include_local: false,
    });
    let mut all = Scene::new("all", true, test_registry());
    all.load_binary(&bytes, load_opts_keep_ids(), ChangeType::Default).unwrap();
    assert_eq!(all.entity(id).unwrap().components().len(), 2);
}
