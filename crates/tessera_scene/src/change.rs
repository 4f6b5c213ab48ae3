//! Change-type policy tags threaded through every mutating operation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Controls whether and how a mutation is announced and replicated.
///
/// Every mutating entry point takes a `ChangeType`. It is resolved against
/// the owning component's default before any notification is produced, so
/// observers only ever see [`Replicate`](Self::Replicate) or
/// [`LocalOnly`](Self::LocalOnly) on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChangeType {
    /// Defer to the component's configured default.
    #[default]
    Default,
    /// Apply locally and send to network peers.
    Replicate,
    /// Apply locally, never network it.
    LocalOnly,
    /// Apply the raw value but suppress every notification signal.
    ///
    /// Used during bulk loads while the scene is in an incoherent state.
    Disconnected,
}

impl ChangeType {
    /// Resolves this tag against a component default.
    ///
    /// Never returns [`Default`](Self::Default): when `self` is `Default`
    /// the component's own default wins, and a `Default` component default
    /// falls back to [`Replicate`](Self::Replicate).
    #[must_use]
    pub fn resolve(self, component_default: Self) -> Self {
        match self {
            Self::Default => match component_default {
                Self::Default => Self::Replicate,
                other => other,
            },
            other => other,
        }
    }

    /// Returns true when a mutation with this resolved tag emits no events.
    #[must_use]
    pub const fn suppressed(self) -> bool {
        matches!(self, Self::Disconnected)
    }
}
