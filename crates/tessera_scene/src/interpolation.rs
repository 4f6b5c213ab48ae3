//! Time-based attribute interpolation for smoothing remote updates.
//!
//! Records are keyed by (entity id, component type id, component name,
//! attribute name) rather than a pointer, and the target is re-resolved on
//! every tick so a destroyed target finalizes the record instead of
//! dangling.

use tessera_foundation::AttributeValue;

use crate::change::ChangeType;
use crate::entity::EntityId;
use crate::events::SceneEvent;
use crate::scene::Scene;

/// A stable key naming one attribute in a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRef {
    /// The owning entity.
    pub entity: EntityId,
    /// The owning component's numeric type id.
    pub component_type_id: u32,
    /// The owning component's instance name.
    pub component_name: String,
    /// The attribute name.
    pub attribute: String,
}

/// A transient, scene-owned record driving one smooth transition.
#[derive(Debug)]
pub(crate) struct AttributeInterpolation {
    target: AttributeRef,
    start: AttributeValue,
    end: AttributeValue,
    time: f32,
    length: f32,
}

impl Scene {
    /// Starts interpolating an attribute towards `end` over `length`
    /// seconds. Returns whether a record was started.
    ///
    /// Preconditions, all checked here: positive length, the target
    /// resolves in this scene, the component is not dynamic, metadata marks
    /// the attribute interpolatable, and `end` has the attribute's kind.
    ///
    /// A fresh request (no live record for the target) snaps the value to
    /// `end` immediately and records a cooldown window; a request while a
    /// record is live hands off smoothly from the current value.
    pub fn start_attribute_interpolation(
        &mut self,
        target: AttributeRef,
        end: AttributeValue,
        length: f32,
    ) -> bool {
        if length <= 0.0 {
            return false;
        }
        let Some(entity) = self.entity(target.entity) else {
            return false;
        };
        let Some(component) =
            entity.component_by_id(target.component_type_id, &target.component_name)
        else {
            return false;
        };
        if component.dynamic() {
            return false;
        }
        let Some(attr) = component.attribute(&target.attribute) else {
            return false;
        };
        if !attr.interpolatable() || attr.type_id() != end.type_id() {
            return false;
        }

        let previous = self.end_attribute_interpolation(&target);
        if !previous {
            // Discontinuous update: snap, then let the cooldown window mark
            // the attribute as "being interpolated" for the next request.
            self.apply_interpolated(&target, end.clone());
        }

        let start = self
            .resolve_attribute(&target)
            .cloned()
            .unwrap_or_else(|| end.clone());
        self.interpolations.push(AttributeInterpolation {
            target,
            start,
            end,
            time: 0.0,
            length,
        });
        true
    }

    /// Ends and discards the record for one attribute, if present.
    pub fn end_attribute_interpolation(&mut self, target: &AttributeRef) -> bool {
        let before = self.interpolations.len();
        self.interpolations.retain(|i| &i.target != target);
        self.interpolations.len() != before
    }

    /// Ends and discards every interpolation record.
    pub fn end_all_attribute_interpolations(&mut self) {
        self.interpolations.clear();
    }

    /// True while [`Self::update_attribute_interpolations`] is running.
    ///
    /// Lets dependent code detect updates that happen inside the
    /// interpolation pass, typically to force `LocalOnly` and avoid
    /// re-triggering network sends for locally computed steps.
    #[must_use]
    pub fn is_interpolating(&self) -> bool {
        self.interpolating
    }

    /// True when a live record exists for the given attribute.
    #[must_use]
    pub fn has_interpolation(&self, target: &AttributeRef) -> bool {
        self.interpolations.iter().any(|i| &i.target == target)
    }

    /// Advances every active interpolation by `dt` seconds.
    ///
    /// Called once per frame by an external tick source; must not be
    /// re-entered. A record whose target no longer resolves is silently
    /// finalized. After the value reaches the end, the record stays alive
    /// until elapsed time reaches twice the duration so a follow-up request
    /// can be told apart from a fresh one.
    pub fn update_attribute_interpolations(&mut self, dt: f32) {
        debug_assert!(!self.interpolating, "interpolation pass re-entered");
        self.interpolating = true;

        let mut records = std::mem::take(&mut self.interpolations);
        records.retain_mut(|interp| {
            let resolvable = self
                .entity(interp.target.entity)
                .and_then(|e| {
                    e.component_by_id(interp.target.component_type_id, &interp.target.component_name)
                })
                .is_some_and(|c| c.attribute(&interp.target.attribute).is_some());
            if !resolvable {
                return false;
            }
            if interp.time <= interp.length {
                interp.time += dt;
                let t = (interp.time / interp.length).min(1.0);
                if let Some(value) =
                    AttributeValue::interpolated(&interp.start, &interp.end, t)
                {
                    self.apply_interpolated(&interp.target, value);
                }
                true
            } else {
                // Past the end value; keep the record through the cooldown
                // window without touching the attribute.
                interp.time += dt;
                interp.time < interp.length * 2.0
            }
        });
        self.interpolations = records;

        self.interpolating = false;
    }

    fn resolve_attribute(&self, target: &AttributeRef) -> Option<&AttributeValue> {
        self.entity(target.entity)
            .and_then(|e| e.component_by_id(target.component_type_id, &target.component_name))
            .and_then(|c| c.attribute(&target.attribute))
            .map(crate::attribute::Attribute::value)
    }

    // Interpolation steps are locally computed and never replicated.
    fn apply_interpolated(&mut self, target: &AttributeRef, value: AttributeValue) {
        let Some(entity) = self.entity_mut(target.entity) else {
            return;
        };
        let Some(component) =
            entity.component_by_id_mut(target.component_type_id, &target.component_name)
        else {
            return;
        };
        let component_type = component.type_name_shared();
        if component
            .set_attribute(&target.attribute, value, ChangeType::LocalOnly)
            .is_err()
        {
            return;
        }
        self.dispatch(SceneEvent::AttributeChanged {
            entity: target.entity,
            component_type,
            component_name: target.component_name.clone(),
            attribute: target.attribute.clone(),
            change: ChangeType::LocalOnly,
        });
    }
}
