//! Structured change events dispatched to scene listeners.
//!
//! Qt-style signal fan-out is modeled as an explicit listener list: all
//! registered listeners run synchronously, in registration order, before
//! the mutating call returns. Mutations resolved to `Disconnected` dispatch
//! nothing.

use std::fmt;
use std::sync::Arc;

use crate::change::ChangeType;
use crate::entity::{EntityId, ExecScope};

/// A change notification carrying the resolved change type.
///
/// The change type on an event is never `Default` and never
/// `Disconnected`.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// An attribute's value changed.
    AttributeChanged {
        /// The owning entity.
        entity: EntityId,
        /// The owning component's type name.
        component_type: Arc<str>,
        /// The owning component's instance name.
        component_name: String,
        /// The attribute name.
        attribute: String,
        /// The resolved change type.
        change: ChangeType,
    },
    /// A dynamic component gained an attribute.
    AttributeAdded {
        /// The owning entity.
        entity: EntityId,
        /// The owning component's type name.
        component_type: Arc<str>,
        /// The owning component's instance name.
        component_name: String,
        /// The attribute name.
        attribute: String,
        /// The resolved change type.
        change: ChangeType,
    },
    /// A dynamic component is about to lose an attribute.
    AttributeRemoved {
        /// The owning entity.
        entity: EntityId,
        /// The owning component's type name.
        component_type: Arc<str>,
        /// The owning component's instance name.
        component_name: String,
        /// The attribute name.
        attribute: String,
        /// The resolved change type.
        change: ChangeType,
    },
    /// A component was attached to an entity.
    ComponentAdded {
        /// The owning entity.
        entity: EntityId,
        /// The component's type name.
        component_type: Arc<str>,
        /// The component's instance name.
        component_name: String,
        /// The resolved change type.
        change: ChangeType,
    },
    /// A component is about to be removed from an entity.
    ComponentRemoved {
        /// The owning entity.
        entity: EntityId,
        /// The component's type name.
        component_type: Arc<str>,
        /// The component's instance name.
        component_name: String,
        /// The resolved change type.
        change: ChangeType,
    },
    /// An entity was created.
    EntityCreated {
        /// The new entity.
        entity: EntityId,
        /// The resolved change type.
        change: ChangeType,
    },
    /// An entity is about to be removed.
    EntityRemoved {
        /// The doomed entity.
        entity: EntityId,
        /// The resolved change type.
        change: ChangeType,
    },
    /// An entity action was executed.
    ///
    /// Emitted for every execution regardless of scope; transports watch
    /// for scopes that include [`ExecScope::SERVER`] or
    /// [`ExecScope::PEERS`].
    ActionTriggered {
        /// The entity the action belongs to.
        entity: EntityId,
        /// The action name.
        action: String,
        /// Opaque string parameters.
        params: Vec<String>,
        /// Where the action should run.
        scope: ExecScope,
    },
    /// The whole scene was cleared.
    SceneCleared,
}

/// Handle returned by listener registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A registered scene observer.
pub type Listener = Box<dyn FnMut(&SceneEvent)>;

/// The per-scene listener list.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn dispatch(&mut self, event: &SceneEvent) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
