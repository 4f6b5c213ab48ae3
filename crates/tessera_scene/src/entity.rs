//! Entities: component ownership and the action-dispatch facility.

use std::fmt;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tessera_foundation::{Error, Result};

use crate::component::Component;

/// An entity id.
///
/// The high bit distinguishes *local* ids (never sent over the wire,
/// allocated from a separate counter) from *networked* ids assigned by
/// scene authority. Id 0 is reserved and means "no entity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(pub u32);

impl EntityId {
    /// The bit reserved for the local id namespace.
    pub const LOCAL_FLAG: u32 = 0x8000_0000;

    /// The reserved "no entity" id.
    pub const NONE: Self = Self(0);

    /// True when this id belongs to the local, non-networked namespace.
    #[must_use]
    pub const fn is_local(self) -> bool {
        self.0 & Self::LOCAL_FLAG != 0
    }

    /// The raw numeric id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Where an entity action executes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExecScope: u8 {
        /// Trigger handlers registered on this entity, synchronously.
        const LOCAL = 1;
        /// Ask the scene's transport to run the action on the server.
        const SERVER = 1 << 1;
        /// Ask the scene's transport to run the action on connected peers.
        const PEERS = 1 << 2;
    }
}

/// A handler invoked when an entity action triggers locally.
pub type ActionHandler = Box<dyn FnMut(&[String])>;

/// A named dispatch point on an entity.
///
/// Action names compare case-insensitively.
pub struct Action {
    name: String,
    handlers: Vec<ActionHandler>,
}

impl Action {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    /// The action name as first registered.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a handler, invoked synchronously on local execution.
    pub fn connect(&mut self, handler: impl FnMut(&[String]) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// True when at least one handler is registered.
    #[must_use]
    pub fn has_handlers(&self) -> bool {
        !self.handlers.is_empty()
    }

    pub(crate) fn trigger(&mut self, params: &[String]) {
        for handler in &mut self.handlers {
            handler(params);
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// An identity owning an ordered list of components and a set of named
/// actions.
///
/// Entities are created only through the scene factory methods, never
/// constructed directly by callers.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    temporary: bool,
    components: Vec<Component>,
    actions: Vec<Action>,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            temporary: false,
            components: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// The entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        self.id = id;
        for comp in &mut self.components {
            comp.detach();
            comp.attach(id);
        }
    }

    /// True when this id belongs to the local namespace.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.id.is_local()
    }

    /// Whether this entity (and all its components) is excluded from
    /// persistence.
    #[must_use]
    pub fn temporary(&self) -> bool {
        self.temporary
    }

    /// Sets the temporary flag.
    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    /// The entity's display name, from its naming component if present.
    #[must_use]
    pub fn name(&self) -> &str {
        self.component(crate::registry::NAME_COMPONENT_TYPE_NAME, None)
            .and_then(|c| c.attribute("name"))
            .and_then(|a| a.value().as_str())
            .unwrap_or("")
    }

    /// The components in attachment order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Finds a component by type name and, when given, instance name.
    ///
    /// With `name` `None` the first component of the type matches.
    #[must_use]
    pub fn component(&self, type_name: &str, name: Option<&str>) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.type_name() == type_name && name.is_none_or(|n| c.name() == n))
    }

    /// Finds a component by numeric type id and instance name.
    #[must_use]
    pub fn component_by_id(&self, type_id: u32, name: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.type_id() == type_id && c.name() == name)
    }

    /// Finds a component mutably, for flag edits and direct deserialization.
    ///
    /// Attribute mutation should go through the scene so change events are
    /// dispatched.
    pub fn component_mut(
        &mut self,
        type_name: &str,
        name: Option<&str>,
    ) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .find(|c| c.type_name() == type_name && name.is_none_or(|n| c.name() == n))
    }

    /// Finds a component mutably by numeric type id and instance name.
    pub fn component_by_id_mut(&mut self, type_id: u32, name: &str) -> Option<&mut Component> {
        self.components
            .iter_mut()
            .find(|c| c.type_id() == type_id && c.name() == name)
    }

    /// Attaches a detached component to this entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ComponentAttached`] if the component already has a
    /// parent, and [`Error::DuplicateComponent`] when a component with
    /// the same (type name, instance name) pair is already attached.
    pub(crate) fn add_component(&mut self, mut component: Component) -> Result<&mut Component> {
        if component.parent().is_some() {
            return Err(Error::ComponentAttached(component.type_name().to_owned()));
        }
        if self
            .components
            .iter()
            .any(|c| c.type_name() == component.type_name() && c.name() == component.name())
        {
            return Err(Error::DuplicateComponent {
                type_name: component.type_name().to_owned(),
                name: component.name().to_owned(),
            });
        }
        component.attach(self.id);
        self.components.push(component);
        Ok(self
            .components
            .last_mut()
            .unwrap_or_else(|| unreachable!("just pushed")))
    }

    /// Detaches and removes a component, returning it.
    ///
    /// The parent reference is cleared before the component leaves the
    /// sequence.
    pub(crate) fn take_component(&mut self, type_name: &str, name: Option<&str>) -> Option<Component> {
        let index = self
            .components
            .iter()
            .position(|c| c.type_name() == type_name && name.is_none_or(|n| c.name() == n))?;
        let mut component = self.components.remove(index);
        component.detach();
        Some(component)
    }

    pub(crate) fn detach_all_components(&mut self) {
        for comp in &mut self.components {
            comp.detach();
        }
    }

    /// Returns the action registered under `name`, creating it if absent.
    ///
    /// Lookup is case-insensitive.
    pub fn action(&mut self, name: &str) -> &mut Action {
        if let Some(index) = self
            .actions
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
        {
            return &mut self.actions[index];
        }
        self.actions.push(Action::new(name));
        self.actions
            .last_mut()
            .unwrap_or_else(|| unreachable!("just pushed"))
    }

    /// Removes a named action, dropping its handlers.
    pub fn remove_action(&mut self, name: &str) {
        self.actions.retain(|a| !a.name.eq_ignore_ascii_case(name));
    }

    pub(crate) fn trigger_action(&mut self, name: &str, params: &[String]) {
        if let Some(action) = self
            .actions
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            action.trigger(params);
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity {:?} (ID: {})", self.name(), self.id)
    }
}
