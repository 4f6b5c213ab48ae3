use std::cell::RefCell;
use std::rc::Rc;

use tessera::foundation::AttributeValue;
use tessera::scene::{ChangeType, Scene, SceneEvent, DYNAMIC_COMPONENT_TYPE_NAME};

use crate::test_scene;

fn record_events(scene: &mut Scene) -> Rc<RefCell<Vec<SceneEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    scene.add_listener(move |event| sink.borrow_mut().push(event.clone()));
    events
}

// ============================================================================
// Change type resolution
// ============================================================================

#[test]
fn test_default_resolves_to_component_update_mode() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "", ChangeType::Default).unwrap();
    scene
        .entity_mut(id)
        .unwrap()
        .component_mut("Light", None)
        .unwrap()
        .set_update_mode(ChangeType::LocalOnly);

    let events = record_events(&mut scene);
    scene
        .set_attribute(id, "Light", None, "range", AttributeValue::Real(1.0), ChangeType::Default)
        .unwrap();

    assert!(matches!(
        events.borrow().as_slice(),
        [SceneEvent::AttributeChanged { change: ChangeType::LocalOnly, .. }]
    ));
}

#[test]
fn test_explicit_change_overrides_update_mode() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "", ChangeType::Default).unwrap();
    scene
        .entity_mut(id)
        .unwrap()
        .component_mut("Light", None)
        .unwrap()
        .set_update_mode(ChangeType::LocalOnly);

    let events = record_events(&mut scene);
    scene
        .set_attribute(
            id,
            "Light",
            None,
            "range",
            AttributeValue::Real(2.0),
            ChangeType::Replicate,
        )
        .unwrap();

    assert!(matches!(
        events.borrow().as_slice(),
        [SceneEvent::AttributeChanged { change: ChangeType::Replicate, .. }]
    ));
}

#[test]
fn test_local_entity_defaults_to_local_only() {
    let mut scene = test_scene();
    let events = record_events(&mut scene);
    scene.create_local_entity(ChangeType::Default);
    assert!(matches!(
        events.borrow().as_slice(),
        [SceneEvent::EntityCreated { change: ChangeType::LocalOnly, .. }]
    ));
}

#[test]
fn test_observers_never_see_default_or_disconnected() {
    let mut scene = test_scene();
    let events = record_events(&mut scene);

    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "", ChangeType::Default).unwrap();
    scene
        .set_attribute(id, "Light", None, "range", AttributeValue::Real(9.0), ChangeType::Default)
        .unwrap();
    scene.remove_component(id, "Light", None, ChangeType::Default).unwrap();
    scene.remove_entity(id, ChangeType::Default).unwrap();

    let hidden = events.borrow().iter().any(|event| {
        let change = match event {
            SceneEvent::AttributeChanged { change, .. }
            | SceneEvent::AttributeAdded { change, .. }
            | SceneEvent::AttributeRemoved { change, .. }
            | SceneEvent::ComponentAdded { change, .. }
            | SceneEvent::ComponentRemoved { change, .. }
            | SceneEvent::EntityCreated { change, .. }
            | SceneEvent::EntityRemoved { change, .. } => *change,
            _ => return false,
        };
        matches!(change, ChangeType::Default | ChangeType::Disconnected)
    });
    assert!(!hidden);
    assert_eq!(events.borrow().len(), 5);
}

// ============================================================================
// Suppression
// ============================================================================

#[test]
fn test_disconnected_stores_without_announcing() {
    let mut scene = test_scene();
    let events = record_events(&mut scene);

    let id = scene.create_entity(ChangeType::Disconnected);
    scene
        .create_component(id, DYNAMIC_COMPONENT_TYPE_NAME, "", ChangeType::Disconnected)
        .unwrap();
    scene
        .create_attribute(
            id,
            DYNAMIC_COMPONENT_TYPE_NAME,
            None,
            "int",
            "score",
            ChangeType::Disconnected,
        )
        .unwrap();
    scene
        .set_attribute(
            id,
            DYNAMIC_COMPONENT_TYPE_NAME,
            None,
            "score",
            AttributeValue::Int(11),
            ChangeType::Disconnected,
        )
        .unwrap();

    assert!(events.borrow().is_empty());
    let comp = scene
        .entity(id)
        .unwrap()
        .component(DYNAMIC_COMPONENT_TYPE_NAME, None)
        .unwrap();
    assert_eq!(comp.attribute("score").unwrap().value(), &AttributeValue::Int(11));
}

// ============================================================================
// Event payloads and ordering
// ============================================================================

#[test]
fn test_attribute_event_carries_full_address() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "sun", ChangeType::Default).unwrap();
    let events = record_events(&mut scene);
    scene
        .set_attribute(
            id,
            "Light",
            Some("sun"),
            "range",
            AttributeValue::Real(7.0),
            ChangeType::Default,
        )
        .unwrap();

    let events = events.borrow();
    let SceneEvent::AttributeChanged {
        entity,
        component_type,
        component_name,
        attribute,
        change,
    } = &events[0]
    else {
        panic!("expected an attribute change, got {:?}", events[0]);
    };
    assert_eq!(*entity, id);
    assert_eq!(&**component_type, "Light");
    assert_eq!(component_name, "sun");
    assert_eq!(attribute, "range");
    assert_eq!(*change, ChangeType::Replicate);
}

#[test]
fn test_removal_events_precede_teardown() {
    let mut scene = test_scene();
    let id = scene.create_entity(ChangeType::Default);
    scene.create_component(id, "Light", "", ChangeType::Default).unwrap();

    let observed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&observed);
    scene.add_listener(move |event| match event {
        SceneEvent::ComponentRemoved { .. } | SceneEvent::EntityRemoved { .. } => {
            sink.borrow_mut().push(format!("{event:?}"));
        }
        _ => {}
    });

    scene.remove_component(id, "Light", None, ChangeType::Default).unwrap();
    assert!(scene.entity(id).unwrap().component("Light", None).is_none());
    scene.remove_entity(id, ChangeType::Default).unwrap();
    assert!(!scene.has_entity(id));
    assert_eq!(observed.borrow().len(), 2);
}

#[test]
fn test_clear_announces_each_entity_then_scene() {
    let mut scene = test_scene();
    let a = scene.create_entity(ChangeType::Default);
    let b = scene.create_local_entity(ChangeType::Default);
    let events = record_events(&mut scene);

    scene.clear(true, ChangeType::Default);

    let events = events.borrow();
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], SceneEvent::EntityRemoved { entity, .. } if *entity == a));
    assert!(matches!(&events[1], SceneEvent::EntityRemoved { entity, .. } if *entity == b));
    assert!(matches!(&events[2], SceneEvent::SceneCleared));
    assert_eq!(scene.entity_count(), 0);
}

#[test]
fn test_silent_clear() {
    let mut scene = test_scene();
    scene.create_entity(ChangeType::Default);
    let events = record_events(&mut scene);
    scene.clear(false, ChangeType::Default);
    assert!(events.borrow().is_empty());
    assert_eq!(scene.entity_count(), 0);
}

#[test]
fn test_listener_removal_is_single_shot() {
    let mut scene = test_scene();
    let count = Rc::new(RefCell::new(0_usize));
    let sink = Rc::clone(&count);
    let id = scene.add_listener(move |_| *sink.borrow_mut() += 1);
    scene.create_entity(ChangeType::Default);
    assert!(scene.remove_listener(id));
    assert!(!scene.remove_listener(id));
    scene.create_entity(ChangeType::Default);
    assert_eq!(*count.borrow(), 1);
}
