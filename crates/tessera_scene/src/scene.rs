//! The scene: entity ownership, id allocation, and change routing.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use tessera_foundation::{AttributeValue, Error, Result};

use crate::change::ChangeType;
use crate::component::ComponentEvent;
use crate::entity::{Entity, EntityId, ExecScope};
use crate::events::{Listener, ListenerId, Listeners, SceneEvent};
use crate::interpolation::AttributeInterpolation;
use crate::registry::ComponentRegistry;

/// What a scene save includes beyond replicated, persistent entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Include entities and components flagged temporary.
    pub include_temporary: bool,
    /// Include entities from the local id namespace.
    pub include_local: bool,
}

/// What to do when a loaded entity's id is already present in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdConflict {
    /// Destroy the pre-existing entity to make room; logged as a warning
    /// since it can silently drop data.
    #[default]
    Replace,
    /// Skip the incoming entity and continue with the next one.
    Fail,
}

/// Options for the bulk content loaders.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Keep entity ids found in the document instead of allocating fresh
    /// ones.
    pub use_file_ids: bool,
    /// Collision policy when `use_file_ids` keeps an id that is taken.
    pub conflict: IdConflict,
}

/// Owns the entity set, allocates ids, and routes change notifications.
///
/// Single-threaded by design: every operation runs to completion on the
/// owning thread, and listeners are invoked synchronously before the
/// mutating call returns.
#[derive(Debug)]
pub struct Scene {
    name: String,
    authority: bool,
    view_enabled: bool,
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    next_replicated_id: u32,
    next_local_id: u32,
    pub(crate) listeners: Listeners,
    pub(crate) interpolations: Vec<AttributeInterpolation>,
    pub(crate) interpolating: bool,
    registry: Arc<ComponentRegistry>,
}

impl Scene {
    /// Creates an empty scene.
    ///
    /// `authority` is true for server or standalone scenes that assign
    /// networked ids themselves.
    #[must_use]
    pub fn new(name: impl Into<String>, authority: bool, registry: Arc<ComponentRegistry>) -> Self {
        Self {
            name: name.into(),
            authority,
            view_enabled: true,
            entities: BTreeMap::new(),
            next_replicated_id: 0,
            next_local_id: 0,
            listeners: Listeners::default(),
            interpolations: Vec::new(),
            interpolating: false,
            registry,
        }
    }

    /// The scene name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for server or standalone scenes.
    #[must_use]
    pub fn authority(&self) -> bool {
        self.authority
    }

    /// Whether view-only resource loading is enabled for this scene.
    #[must_use]
    pub fn view_enabled(&self) -> bool {
        self.view_enabled
    }

    /// Sets the view-enabled flag.
    pub fn set_view_enabled(&mut self, enabled: bool) {
        self.view_enabled = enabled;
    }

    /// The component registry this scene instantiates types from.
    #[must_use]
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    // ---------------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------------

    /// Registers a listener invoked synchronously for every event.
    pub fn add_listener(&mut self, listener: impl FnMut(&SceneEvent) + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener) as Listener)
    }

    /// Removes a listener; returns whether it was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn dispatch(&mut self, event: SceneEvent) {
        self.listeners.dispatch(&event);
    }

    pub(crate) fn dispatch_component_events(
        &mut self,
        entity: EntityId,
        component_type: &Arc<str>,
        component_name: &str,
        events: Vec<ComponentEvent>,
    ) {
        for event in events {
            let event = match event {
                ComponentEvent::Changed { attribute, change } => SceneEvent::AttributeChanged {
                    entity,
                    component_type: Arc::clone(component_type),
                    component_name: component_name.to_owned(),
                    attribute,
                    change,
                },
                ComponentEvent::Added { attribute, change } => SceneEvent::AttributeAdded {
                    entity,
                    component_type: Arc::clone(component_type),
                    component_name: component_name.to_owned(),
                    attribute,
                    change,
                },
                ComponentEvent::Removed { attribute, change } => SceneEvent::AttributeRemoved {
                    entity,
                    component_type: Arc::clone(component_type),
                    component_name: component_name.to_owned(),
                    attribute,
                    change,
                },
            };
            self.dispatch(event);
        }
    }

    // Entity-level operations resolve Default by namespace: local entities
    // never replicate.
    fn resolve_entity_change(id: EntityId, change: ChangeType) -> ChangeType {
        change.resolve(if id.is_local() {
            ChangeType::LocalOnly
        } else {
            ChangeType::Replicate
        })
    }

    // ---------------------------------------------------------------------
    // Id allocation
    // ---------------------------------------------------------------------

    /// Returns the next free networked entity id.
    ///
    /// The counter is first raised above the largest networked id present,
    /// then probed linearly (wrapping within the namespace, skipping zero)
    /// until a free id is found.
    pub fn next_free_id(&mut self) -> EntityId {
        let largest = self
            .entities
            .keys()
            .filter(|id| !id.is_local())
            .map(|id| id.raw())
            .max()
            .unwrap_or(0);
        self.next_replicated_id = self
            .next_replicated_id
            .wrapping_add(1)
            .max(largest.wrapping_add(1))
            & (EntityId::LOCAL_FLAG - 1);
        if self.next_replicated_id == 0 {
            self.next_replicated_id = 1;
        }
        while self.entities.contains_key(&EntityId(self.next_replicated_id)) {
            self.next_replicated_id = (self.next_replicated_id + 1) & (EntityId::LOCAL_FLAG - 1);
            if self.next_replicated_id == 0 {
                self.next_replicated_id = 1;
            }
        }
        EntityId(self.next_replicated_id)
    }

    /// Returns the next free local entity id (high bit set).
    pub fn next_free_local_id(&mut self) -> EntityId {
        let largest = self
            .entities
            .keys()
            .filter(|id| id.is_local())
            .map(|id| id.raw() & !EntityId::LOCAL_FLAG)
            .max()
            .unwrap_or(0);
        self.next_local_id = self
            .next_local_id
            .wrapping_add(1)
            .max(largest.wrapping_add(1))
            & (EntityId::LOCAL_FLAG - 1);
        if self.next_local_id == 0 {
            self.next_local_id = 1;
        }
        while self
            .entities
            .contains_key(&EntityId(self.next_local_id | EntityId::LOCAL_FLAG))
        {
            self.next_local_id = (self.next_local_id + 1) & (EntityId::LOCAL_FLAG - 1);
            if self.next_local_id == 0 {
                self.next_local_id = 1;
            }
        }
        EntityId(self.next_local_id | EntityId::LOCAL_FLAG)
    }

    // ---------------------------------------------------------------------
    // Entity management
    // ---------------------------------------------------------------------

    /// True when an entity with this id exists.
    #[must_use]
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities in the scene.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Looks an entity up by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Looks an entity up mutably, for action registration and flags.
    ///
    /// Attribute mutation should go through [`Scene::set_attribute`] so
    /// that change events are emitted.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Iterates entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// The ids of all entities, in id order.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Creates an entity with a fresh networked id.
    pub fn create_entity(&mut self, change: ChangeType) -> EntityId {
        let id = self.next_free_id();
        self.insert_entity(id);
        self.emit_entity_created(id, change);
        id
    }

    /// Creates an entity with a fresh local id.
    pub fn create_local_entity(&mut self, change: ChangeType) -> EntityId {
        let id = self.next_free_local_id();
        self.insert_entity(id);
        self.emit_entity_created(id, change);
        id
    }

    /// Creates an entity with an explicit id; id 0 allocates a networked one.
    ///
    /// # Errors
    ///
    /// Fails fast with [`Error::DuplicateEntityId`] when the id is taken,
    /// leaving the scene unchanged.
    pub fn create_entity_with_id(&mut self, id: EntityId, change: ChangeType) -> Result<EntityId> {
        if id == EntityId::NONE {
            return Ok(self.create_entity(change));
        }
        if self.has_entity(id) {
            warn!(id = id.raw(), "refused to create entity with duplicate id");
            return Err(Error::DuplicateEntityId(id.raw()));
        }
        self.insert_entity(id);
        self.emit_entity_created(id, change);
        Ok(id)
    }

    pub(crate) fn insert_entity(&mut self, id: EntityId) -> &mut Entity {
        debug_assert!(!self.entities.contains_key(&id));
        self.entities.entry(id).or_insert_with(|| Entity::new(id))
    }

    pub(crate) fn emit_entity_created(&mut self, id: EntityId, change: ChangeType) {
        let resolved = Self::resolve_entity_change(id, change);
        if !resolved.suppressed() {
            self.dispatch(SceneEvent::EntityCreated {
                entity: id,
                change: resolved,
            });
        }
    }

    /// Removes an entity and everything it owns.
    ///
    /// The removal event is dispatched before the entity leaves the map,
    /// so listeners may still query it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] for unknown ids.
    pub fn remove_entity(&mut self, id: EntityId, change: ChangeType) -> Result<()> {
        if !self.has_entity(id) {
            return Err(Error::EntityNotFound(id.raw()));
        }
        let resolved = Self::resolve_entity_change(id, change);
        if !resolved.suppressed() {
            self.dispatch(SceneEvent::EntityRemoved {
                entity: id,
                change: resolved,
            });
        }
        if let Some(mut entity) = self.entities.remove(&id) {
            // Components go free-floating before they are dropped.
            entity.detach_all_components();
        }
        Ok(())
    }

    /// Removes every entity.
    pub fn clear(&mut self, send_events: bool, change: ChangeType) {
        let ids = self.entity_ids();
        for id in ids {
            if send_events {
                let _ = self.remove_entity(id, change);
            } else if let Some(mut entity) = self.entities.remove(&id) {
                entity.detach_all_components();
            }
        }
        if send_events {
            self.dispatch(SceneEvent::SceneCleared);
        }
    }

    /// Moves an entity to a new id.
    ///
    /// Any existing holder of `new` is destroyed first, with a warning.
    pub fn change_entity_id(&mut self, old: EntityId, new: EntityId) {
        if old == new || !self.has_entity(old) {
            return;
        }
        if self.has_entity(new) {
            warn!(
                old = old.raw(),
                new = new.raw(),
                "destroying existing entity to change entity id"
            );
            let _ = self.remove_entity(new, ChangeType::LocalOnly);
        }
        if let Some(mut entity) = self.entities.remove(&old) {
            entity.set_id(new);
            self.entities.insert(new, entity);
        }
    }

    /// Finds the first entity whose naming component carries `name`.
    #[must_use]
    pub fn entity_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .values()
            .find(|e| !name.is_empty() && e.name() == name)
            .map(Entity::id)
    }

    /// True when at most one entity carries `name`.
    #[must_use]
    pub fn is_unique_name(&self, name: &str) -> bool {
        self.entities.values().filter(|e| e.name() == name).count() <= 1
    }

    /// The ids of entities carrying a component of the given type (and,
    /// when given, instance name).
    #[must_use]
    pub fn entities_with_component(&self, type_name: &str, name: Option<&str>) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.component(type_name, name).is_some())
            .map(Entity::id)
            .collect()
    }

    // ---------------------------------------------------------------------
    // Component CRUD, routed through the scene for change emission
    // ---------------------------------------------------------------------

    /// Creates a component on an entity through the registry.
    ///
    /// # Errors
    ///
    /// Fails for unknown entities, unknown component types, and duplicate
    /// (type, instance name) pairs.
    pub fn create_component(
        &mut self,
        entity: EntityId,
        type_name: &str,
        instance_name: &str,
        change: ChangeType,
    ) -> Result<()> {
        let component = self.registry.create_by_name(type_name, instance_name)?;
        let component_type = component.type_name_shared();
        let entity_ref = self
            .entities
            .get_mut(&entity)
            .ok_or(Error::EntityNotFound(entity.raw()))?;
        let update_mode = entity_ref.add_component(component)?.update_mode();
        let resolved = change.resolve(update_mode);
        if !resolved.suppressed() {
            self.dispatch(SceneEvent::ComponentAdded {
                entity,
                component_type,
                component_name: instance_name.to_owned(),
                change: resolved,
            });
        }
        Ok(())
    }

    /// Creates a component unless an identical (type, name) pair exists.
    ///
    /// # Errors
    ///
    /// Fails for unknown entities and unknown component types.
    pub fn get_or_create_component(
        &mut self,
        entity: EntityId,
        type_name: &str,
        instance_name: &str,
        change: ChangeType,
    ) -> Result<()> {
        let entity_ref = self
            .entities
            .get(&entity)
            .ok_or(Error::EntityNotFound(entity.raw()))?;
        if entity_ref
            .components()
            .iter()
            .any(|c| c.type_name() == type_name && c.name() == instance_name)
        {
            return Ok(());
        }
        self.create_component(entity, type_name, instance_name, change)
    }

    /// Removes a component from an entity.
    ///
    /// The removal event is dispatched before the component is detached,
    /// so listeners may still query removed-but-not-yet-destroyed state.
    ///
    /// # Errors
    ///
    /// Fails for unknown entities and missing components.
    pub fn remove_component(
        &mut self,
        entity: EntityId,
        type_name: &str,
        instance_name: Option<&str>,
        change: ChangeType,
    ) -> Result<()> {
        let entity_ref = self
            .entities
            .get(&entity)
            .ok_or(Error::EntityNotFound(entity.raw()))?;
        let component = entity_ref
            .component(type_name, instance_name)
            .ok_or_else(|| {
                Error::component_not_found(type_name, instance_name.unwrap_or_default())
            })?;
        let component_type = component.type_name_shared();
        let component_name = component.name().to_owned();
        let resolved = change.resolve(component.update_mode());
        if !resolved.suppressed() {
            self.dispatch(SceneEvent::ComponentRemoved {
                entity,
                component_type,
                component_name: component_name.clone(),
                change: resolved,
            });
        }
        let entity_ref = self
            .entities
            .get_mut(&entity)
            .unwrap_or_else(|| unreachable!("checked above"));
        entity_ref.take_component(type_name, Some(component_name.as_str()));
        Ok(())
    }

    /// Stores a value into a component attribute. The single external
    /// mutation path for attribute values.
    ///
    /// # Errors
    ///
    /// Fails for unknown entities, components, or attributes, and for
    /// values of the wrong kind.
    pub fn set_attribute(
        &mut self,
        entity: EntityId,
        component_type: &str,
        component_name: Option<&str>,
        attribute: &str,
        value: AttributeValue,
        change: ChangeType,
    ) -> Result<()> {
        let entity_ref = self
            .entities
            .get_mut(&entity)
            .ok_or(Error::EntityNotFound(entity.raw()))?;
        let component = entity_ref
            .component_mut(component_type, component_name)
            .ok_or_else(|| {
                Error::component_not_found(component_type, component_name.unwrap_or_default())
            })?;
        let events = component.set_attribute(attribute, value, change)?;
        let type_name = component.type_name_shared();
        let name = component.name().to_owned();
        self.dispatch_component_events(entity, &type_name, &name, events);
        Ok(())
    }

    /// Creates an attribute on a dynamic component. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails for unknown entities/components, static components, and
    /// unknown attribute type names.
    pub fn create_attribute(
        &mut self,
        entity: EntityId,
        component_type: &str,
        component_name: Option<&str>,
        attribute_type: &str,
        attribute: &str,
        change: ChangeType,
    ) -> Result<()> {
        let entity_ref = self
            .entities
            .get_mut(&entity)
            .ok_or(Error::EntityNotFound(entity.raw()))?;
        let component = entity_ref
            .component_mut(component_type, component_name)
            .ok_or_else(|| {
                Error::component_not_found(component_type, component_name.unwrap_or_default())
            })?;
        let events = component.create_attribute(attribute_type, attribute, change)?;
        let type_name = component.type_name_shared();
        let name = component.name().to_owned();
        self.dispatch_component_events(entity, &type_name, &name, events);
        Ok(())
    }

    /// Removes an attribute from a dynamic component.
    ///
    /// # Errors
    ///
    /// Fails for unknown entities/components/attributes and static
    /// components.
    pub fn remove_attribute(
        &mut self,
        entity: EntityId,
        component_type: &str,
        component_name: Option<&str>,
        attribute: &str,
        change: ChangeType,
    ) -> Result<()> {
        let entity_ref = self
            .entities
            .get_mut(&entity)
            .ok_or(Error::EntityNotFound(entity.raw()))?;
        let component = entity_ref
            .component_mut(component_type, component_name)
            .ok_or_else(|| {
                Error::component_not_found(component_type, component_name.unwrap_or_default())
            })?;
        let events = component.remove_attribute(attribute, change)?;
        let type_name = component.type_name_shared();
        let name = component.name().to_owned();
        self.dispatch_component_events(entity, &type_name, &name, events);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------------

    /// Executes a named action on an entity.
    ///
    /// Local handlers run synchronously when the scope includes
    /// [`ExecScope::LOCAL`]; an [`SceneEvent::ActionTriggered`] event is
    /// always dispatched so an external transport can propagate the action
    /// to other scopes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] for unknown entities.
    pub fn exec_action(
        &mut self,
        entity: EntityId,
        scope: ExecScope,
        action: &str,
        params: &[String],
    ) -> Result<()> {
        let entity_ref = self
            .entities
            .get_mut(&entity)
            .ok_or(Error::EntityNotFound(entity.raw()))?;
        if scope.contains(ExecScope::LOCAL) {
            entity_ref.trigger_action(action, params);
        }
        self.dispatch(SceneEvent::ActionTriggered {
            entity,
            action: action.to_owned(),
            params: params.to_vec(),
            scope,
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Flat-file persistence
    // ---------------------------------------------------------------------

    /// Saves the scene as an XML document file.
    ///
    /// # Errors
    ///
    /// Returns the underlying io error, after logging it.
    pub fn save_xml_file(&self, path: impl AsRef<Path>, options: SaveOptions) -> Result<()> {
        let xml = self.scene_xml(options);
        std::fs::write(path.as_ref(), xml).map_err(|error| {
            warn!(path = %path.as_ref().display(), %error, "failed to save scene xml");
            Error::Io(error)
        })
    }

    /// Loads scene content from an XML document file.
    ///
    /// With `clear_scene` the current content is removed (without events)
    /// before loading.
    ///
    /// # Errors
    ///
    /// Fails on io errors and top-level parse failures.
    pub fn load_xml_file(
        &mut self,
        path: impl AsRef<Path>,
        options: LoadOptions,
        change: ChangeType,
        clear_scene: bool,
    ) -> Result<Vec<EntityId>> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|error| {
            warn!(path = %path.as_ref().display(), %error, "failed to read scene xml");
            Error::Io(error)
        })?;
        if clear_scene {
            self.clear(false, ChangeType::Disconnected);
        }
        self.load_xml(&text, options, change)
    }

    /// Saves the scene in the binary format.
    ///
    /// # Errors
    ///
    /// Returns the underlying io error, after logging it.
    pub fn save_binary_file(&self, path: impl AsRef<Path>, options: SaveOptions) -> Result<()> {
        let bytes = self.scene_binary(options);
        std::fs::write(path.as_ref(), bytes).map_err(|error| {
            warn!(path = %path.as_ref().display(), %error, "failed to save scene binary");
            Error::Io(error)
        })
    }

    /// Loads scene content from a binary format file.
    ///
    /// # Errors
    ///
    /// Fails on io errors; any stream corruption aborts the whole load.
    pub fn load_binary_file(
        &mut self,
        path: impl AsRef<Path>,
        options: LoadOptions,
        change: ChangeType,
        clear_scene: bool,
    ) -> Result<Vec<EntityId>> {
        let bytes = std::fs::read(path.as_ref()).map_err(|error| {
            warn!(path = %path.as_ref().display(), %error, "failed to read scene binary");
            Error::Io(error)
        })?;
        if clear_scene {
            self.clear(false, ChangeType::Disconnected);
        }
        self.load_binary(&bytes, options, change)
    }

    // Shared by the XML and binary loaders: decide which id an incoming
    // entity gets and clear a colliding one per policy. Returns None when
    // the conflict policy skips the entity.
    pub(crate) fn resolve_incoming_id(
        &mut self,
        file_id: EntityId,
        options: LoadOptions,
    ) -> Option<EntityId> {
        let id = if options.use_file_ids && file_id != EntityId::NONE {
            file_id
        } else if file_id.is_local() {
            self.next_free_local_id()
        } else {
            self.next_free_id()
        };
        if self.has_entity(id) {
            match options.conflict {
                IdConflict::Replace => {
                    warn!(
                        id = id.raw(),
                        "destroying existing entity to make room for loaded entity"
                    );
                    let _ = self.remove_entity(id, ChangeType::Replicate);
                }
                IdConflict::Fail => {
                    debug!(id = id.raw(), "skipping loaded entity with conflicting id");
                    return None;
                }
            }
        }
        Some(id)
    }

    // Second pass of the bulk loaders: announce fully built entities.
    pub(crate) fn emit_loaded(&mut self, ids: &[EntityId], change: ChangeType) {
        for &id in ids {
            self.emit_entity_created(id, change);
            let Some(entity) = self.entities.get(&id) else {
                continue;
            };
            let mut batches = Vec::new();
            for comp in entity.components() {
                let resolved = change.resolve(comp.update_mode());
                if resolved.suppressed() {
                    continue;
                }
                let attributes: Vec<String> =
                    comp.attributes().iter().map(|a| a.name().to_owned()).collect();
                batches.push((comp.type_name_shared(), comp.name().to_owned(), attributes, resolved));
            }
            for (component_type, component_name, attributes, resolved) in batches {
                for attribute in attributes {
                    self.dispatch(SceneEvent::AttributeChanged {
                        entity: id,
                        component_type: Arc::clone(&component_type),
                        component_name: component_name.clone(),
                        attribute,
                        change: resolved,
                    });
                }
            }
        }
    }
}
