//! The component type registry: name/id to factory closure.
//!
//! Serialization code instantiates arbitrary component types through this
//! indirection instead of a hard-coded type switch; it is the plugin point
//! host modules (rendering, physics, scripting) use to register their own
//! component kinds.

use std::collections::HashMap;
use std::sync::Arc;

use tessera_foundation::{AttributeTypeId, Error, Result};

use crate::attribute::Attribute;
use crate::component::Component;

/// The reserved type id of the runtime-schema component.
pub const DYNAMIC_COMPONENT_TYPE_ID: u32 = 25;
/// The reserved type name of the runtime-schema component.
pub const DYNAMIC_COMPONENT_TYPE_NAME: &str = "DynamicComponent";

/// The reserved type id of the naming component.
pub const NAME_COMPONENT_TYPE_ID: u32 = 26;
/// The reserved type name of the naming component.
pub const NAME_COMPONENT_TYPE_NAME: &str = "Name";

/// Builds the declared attribute set of a static component type.
pub type AttributeFactory = dyn Fn() -> Vec<Attribute> + Send + Sync;

struct Registration {
    type_name: Arc<str>,
    type_id: u32,
    dynamic: bool,
    build: Box<AttributeFactory>,
}

/// Maps component type names and numeric type ids to constructor closures.
///
/// Built once at startup, then shared read-only by scenes. The dynamic
/// component type and the naming component are pre-registered.
pub struct ComponentRegistry {
    registrations: Vec<Registration>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<u32, usize>,
}

impl ComponentRegistry {
    /// Creates a registry holding the built-in component types.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            registrations: Vec::new(),
            by_name: HashMap::new(),
            by_id: HashMap::new(),
        };
        registry
            .insert(
                DYNAMIC_COMPONENT_TYPE_NAME,
                DYNAMIC_COMPONENT_TYPE_ID,
                true,
                Box::new(Vec::new),
            )
            .unwrap_or_else(|_| unreachable!("registry starts empty"));
        registry
            .insert(
                NAME_COMPONENT_TYPE_NAME,
                NAME_COMPONENT_TYPE_ID,
                false,
                Box::new(|| {
                    vec![
                        Attribute::empty("name", AttributeTypeId::String),
                        Attribute::empty("description", AttributeTypeId::String),
                    ]
                }),
            )
            .unwrap_or_else(|_| unreachable!("built-in ids are distinct"));
        registry
    }

    /// Registers a static component type.
    ///
    /// Re-registering the identical (name, id) pair is a no-op; binding
    /// either key to a different type is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] when the name or the id is
    /// already bound to a different type.
    pub fn register(
        &mut self,
        type_name: &str,
        type_id: u32,
        factory: impl Fn() -> Vec<Attribute> + Send + Sync + 'static,
    ) -> Result<()> {
        self.insert(type_name, type_id, false, Box::new(factory))
    }

    fn insert(
        &mut self,
        type_name: &str,
        type_id: u32,
        dynamic: bool,
        build: Box<AttributeFactory>,
    ) -> Result<()> {
        let existing_by_name = self.by_name.get(type_name).copied();
        let existing_by_id = self.by_id.get(&type_id).copied();
        match (existing_by_name, existing_by_id) {
            (Some(a), Some(b)) if a == b => return Ok(()),
            (None, None) => {}
            _ => {
                return Err(Error::DuplicateRegistration {
                    name: type_name.to_owned(),
                    id: type_id,
                });
            }
        }
        let index = self.registrations.len();
        self.registrations.push(Registration {
            type_name: Arc::from(type_name),
            type_id,
            dynamic,
            build,
        });
        self.by_name.insert(type_name.to_owned(), index);
        self.by_id.insert(type_id, index);
        Ok(())
    }

    /// Creates a detached component by type name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownComponentType`] for unregistered names.
    pub fn create_by_name(&self, type_name: &str, instance_name: &str) -> Result<Component> {
        let index = self
            .by_name
            .get(type_name)
            .copied()
            .ok_or_else(|| Error::unknown_component_type(type_name))?;
        Ok(self.build(index, instance_name))
    }

    /// Creates a detached component by numeric type id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownComponentTypeId`] for unregistered ids.
    pub fn create_by_id(&self, type_id: u32, instance_name: &str) -> Result<Component> {
        let index = self
            .by_id
            .get(&type_id)
            .copied()
            .ok_or(Error::UnknownComponentTypeId(type_id))?;
        Ok(self.build(index, instance_name))
    }

    fn build(&self, index: usize, instance_name: &str) -> Component {
        let reg = &self.registrations[index];
        Component::new(
            Arc::clone(&reg.type_name),
            reg.type_id,
            instance_name,
            reg.dynamic,
            (reg.build)(),
        )
    }

    /// Looks up the type name registered for an id.
    #[must_use]
    pub fn type_name_of(&self, type_id: u32) -> Option<&str> {
        self.by_id
            .get(&type_id)
            .map(|&index| &*self.registrations[index].type_name)
    }

    /// Looks up the type id registered for a name.
    #[must_use]
    pub fn type_id_of(&self, type_name: &str) -> Option<u32> {
        self.by_name
            .get(type_name)
            .map(|&index| self.registrations[index].type_id)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.registrations.len())
            .finish()
    }
}
