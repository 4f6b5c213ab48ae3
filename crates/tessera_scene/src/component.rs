//! Components: typed attribute bags attached to entities.
//!
//! A component is either *static* (fixed attribute schema built by its
//! factory) or *dynamic* (attributes created and removed at runtime, with
//! a merge-diff applied on deserialization so the schema itself can be
//! replicated).

use std::sync::Arc;

use tracing::warn;

use tessera_foundation::wire::{WireReader, WireWriter};
use tessera_foundation::{AttributeTypeId, AttributeValue, Error, Result};

use crate::attribute::Attribute;
use crate::change::ChangeType;
use crate::entity::EntityId;

/// A mutation announcement produced by a component operation.
///
/// The change type is already resolved; `Disconnected` mutations produce no
/// event at all. The scene turns these into [`SceneEvent`]s when the
/// component is attached.
///
/// [`SceneEvent`]: crate::events::SceneEvent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentEvent {
    /// An existing attribute's value changed.
    Changed {
        /// The attribute name.
        attribute: String,
        /// The resolved change type.
        change: ChangeType,
    },
    /// A dynamic component gained an attribute.
    Added {
        /// The attribute name.
        attribute: String,
        /// The resolved change type.
        change: ChangeType,
    },
    /// A dynamic component is about to lose an attribute.
    Removed {
        /// The attribute name.
        attribute: String,
        /// The resolved change type.
        change: ChangeType,
    },
}

/// One (name, type name, value text) record from a dynamic component's
/// serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTriple {
    /// The attribute name.
    pub name: String,
    /// The canonical attribute type name.
    pub type_name: String,
    /// The value in document text form.
    pub value: String,
}

/// An ordered bag of attributes with a type identity and change emission.
#[derive(Debug)]
pub struct Component {
    type_name: Arc<str>,
    type_id: u32,
    name: String,
    sync: bool,
    temporary: bool,
    update_mode: ChangeType,
    dynamic: bool,
    attributes: Vec<Attribute>,
    parent: Option<EntityId>,
}

impl Component {
    pub(crate) fn new(
        type_name: Arc<str>,
        type_id: u32,
        name: impl Into<String>,
        dynamic: bool,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            type_name,
            type_id,
            name: name.into(),
            sync: true,
            temporary: false,
            update_mode: ChangeType::Replicate,
            dynamic,
            attributes,
            parent: None,
        }
    }

    /// The component type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn type_name_shared(&self) -> Arc<str> {
        Arc::clone(&self.type_name)
    }

    /// The stable numeric type id.
    #[must_use]
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    /// The instance name, possibly empty.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether mutations of this component are sent to network peers.
    #[must_use]
    pub fn sync(&self) -> bool {
        self.sync
    }

    /// Sets the network-sync flag.
    pub fn set_sync(&mut self, sync: bool) {
        self.sync = sync;
    }

    /// Whether this component is excluded from persistence.
    #[must_use]
    pub fn temporary(&self) -> bool {
        self.temporary
    }

    /// Sets the temporary flag.
    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    /// The default change type used to resolve `ChangeType::Default`.
    #[must_use]
    pub fn update_mode(&self) -> ChangeType {
        self.update_mode
    }

    /// Sets the default change type.
    ///
    /// Only `Replicate` and `LocalOnly` are meaningful defaults; the other
    /// tags are rejected with a warning and the mode is left unchanged.
    pub fn set_update_mode(&mut self, mode: ChangeType) {
        match mode {
            ChangeType::Replicate | ChangeType::LocalOnly => self.update_mode = mode,
            ChangeType::Default | ChangeType::Disconnected => warn!(
                component = &*self.type_name,
                ?mode,
                "rejected invalid component update mode"
            ),
        }
    }

    /// True for components whose attribute schema is built at runtime.
    #[must_use]
    pub fn dynamic(&self) -> bool {
        self.dynamic
    }

    /// The id of the owning entity, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub(crate) fn attach(&mut self, parent: EntityId) {
        debug_assert!(self.parent.is_none(), "component attached twice");
        self.parent = Some(parent);
    }

    pub(crate) fn detach(&mut self) {
        self.parent = None;
    }

    /// The attributes in serialization order.
    ///
    /// Static components keep declaration order; dynamic components keep
    /// name-sorted order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks an attribute up by name, case-sensitively.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name() == name)
    }

    fn event(
        &self,
        make: fn(String, ChangeType) -> ComponentEvent,
        attribute: &str,
        change: ChangeType,
    ) -> Option<ComponentEvent> {
        let resolved = change.resolve(self.update_mode);
        if resolved.suppressed() {
            None
        } else {
            Some(make(attribute.to_owned(), resolved))
        }
    }

    fn changed(&self, attribute: &str, change: ChangeType) -> Option<ComponentEvent> {
        self.event(
            |attribute, change| ComponentEvent::Changed { attribute, change },
            attribute,
            change,
        )
    }

    /// Stores a value into a named attribute.
    ///
    /// This is the single mutation path: the value is stored, then a change
    /// event with the resolved change type is returned for the scene to
    /// dispatch (none for `Disconnected`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`] for unknown names and
    /// [`Error::TypeMismatch`] when the value's kind differs from the
    /// attribute's.
    pub fn set_attribute(
        &mut self,
        name: &str,
        value: AttributeValue,
        change: ChangeType,
    ) -> Result<Vec<ComponentEvent>> {
        let attr = self
            .attribute_mut(name)
            .ok_or_else(|| Error::AttributeNotFound(name.to_owned()))?;
        if attr.type_id() != value.type_id() {
            return Err(Error::TypeMismatch {
                attribute: name.to_owned(),
                expected: attr.type_name(),
                actual: value.type_name(),
            });
        }
        attr.set(value);
        Ok(self.changed(name, change).into_iter().collect())
    }

    /// Stores a value parsed from document text into a named attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`] for unknown names or a parse
    /// error, leaving the value untouched.
    pub fn set_attribute_from_text(
        &mut self,
        name: &str,
        text: &str,
        change: ChangeType,
    ) -> Result<Vec<ComponentEvent>> {
        let attr = self
            .attribute_mut(name)
            .ok_or_else(|| Error::AttributeNotFound(name.to_owned()))?;
        attr.set_from_text(text)?;
        Ok(self.changed(name, change).into_iter().collect())
    }

    /// Creates an attribute on a dynamic component.
    ///
    /// Idempotent: if an attribute with that name already exists it is left
    /// unchanged and no event is produced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaticSchema`] on static components and an unknown
    /// attribute type error for names outside the closed kind set.
    pub fn create_attribute(
        &mut self,
        type_name: &str,
        name: &str,
        change: ChangeType,
    ) -> Result<Vec<ComponentEvent>> {
        if !self.dynamic {
            return Err(Error::StaticSchema(self.type_name.to_string()));
        }
        if self.attribute(name).is_some() {
            return Ok(Vec::new());
        }
        let kind = AttributeTypeId::from_type_name(type_name)?;
        let index = self
            .attributes
            .partition_point(|a| a.name() < name);
        self.attributes.insert(index, Attribute::empty(name, kind));
        Ok(self
            .event(
                |attribute, change| ComponentEvent::Added { attribute, change },
                name,
                change,
            )
            .into_iter()
            .collect())
    }

    /// Removes an attribute from a dynamic component.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaticSchema`] on static components and
    /// [`Error::AttributeNotFound`] for unknown names.
    pub fn remove_attribute(&mut self, name: &str, change: ChangeType) -> Result<Vec<ComponentEvent>> {
        if !self.dynamic {
            return Err(Error::StaticSchema(self.type_name.to_string()));
        }
        let index = self
            .attributes
            .iter()
            .position(|a| a.name() == name)
            .ok_or_else(|| Error::AttributeNotFound(name.to_owned()))?;
        // The event precedes the erase so observers may still query the
        // attribute when the scene dispatches it.
        let events = self
            .event(
                |attribute, change| ComponentEvent::Removed { attribute, change },
                name,
                change,
            )
            .into_iter()
            .collect();
        self.attributes.remove(index);
        Ok(events)
    }

    /// Removes every attribute from a dynamic component.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaticSchema`] on static components.
    pub fn remove_all_attributes(&mut self, change: ChangeType) -> Result<Vec<ComponentEvent>> {
        if !self.dynamic {
            return Err(Error::StaticSchema(self.type_name.to_string()));
        }
        let mut events = Vec::new();
        for attr in &self.attributes {
            events.extend(self.event(
                |attribute, change| ComponentEvent::Removed { attribute, change },
                attr.name(),
                change,
            ));
        }
        self.attributes.clear();
        Ok(events)
    }

    /// True when both components hold the same (name, type) attribute sets,
    /// ignoring order and values.
    #[must_use]
    pub fn attributes_equal_shape(&self, other: &Self) -> bool {
        fn shape(c: &Component) -> Vec<(&str, AttributeTypeId)> {
            let mut pairs: Vec<(&str, AttributeTypeId)> =
                c.attributes.iter().map(|a| (a.name(), a.type_id())).collect();
            pairs.sort_unstable();
            pairs
        }
        shape(self) == shape(other)
    }

    /// Applies serialized attribute records to this component.
    ///
    /// Static components delta-apply: records are matched against declared
    /// attribute names and parsed in place; names absent from the records
    /// are left untouched, unknown names and malformed values are skipped
    /// with a warning.
    ///
    /// Dynamic components run the merge-diff instead: see
    /// [`Self::merge_triples`].
    pub fn apply_triples(
        &mut self,
        incoming: Vec<AttributeTriple>,
        change: ChangeType,
    ) -> Vec<ComponentEvent> {
        if self.dynamic {
            return self.merge_triples(incoming, change);
        }
        let mut events = Vec::new();
        for triple in incoming {
            match self.set_attribute_from_text(&triple.name, &triple.value, change) {
                Ok(changed) => events.extend(changed),
                Err(error) => warn!(
                    component = &*self.type_name,
                    attribute = triple.name,
                    %error,
                    "skipping attribute while deserializing"
                ),
            }
        }
        events
    }

    /// Reconciles a dynamic component's attribute set with incoming records.
    ///
    /// Both lists are sorted by name and co-iterated; each name classifies
    /// as exactly one of update (both), create (incoming only), or delete
    /// (current only). Creates and deletes apply after the scan, and the new
    /// and removed attributes are announced with dedicated added/removed
    /// events. Afterwards the attribute set equals the incoming set.
    pub fn merge_triples(
        &mut self,
        mut incoming: Vec<AttributeTriple>,
        change: ChangeType,
    ) -> Vec<ComponentEvent> {
        debug_assert!(self.dynamic);
        incoming.sort_by(|a, b| a.name.cmp(&b.name));

        // Attributes are kept name-sorted, so the current list is the sorted
        // old list.
        let mut events = Vec::new();
        let mut additions: Vec<AttributeTriple> = Vec::new();
        let mut removals: Vec<String> = Vec::new();

        let old_names: Vec<String> =
            self.attributes.iter().map(|a| a.name().to_owned()).collect();
        let mut new: std::vec::IntoIter<AttributeTriple> = incoming.into_iter();
        let mut pending = new.next();
        let mut old_index = 0;

        while old_index < old_names.len() || pending.is_some() {
            match pending.take() {
                // Incoming exhausted; everything left is a delete.
                None => {
                    removals.extend(old_names[old_index..].iter().cloned());
                    break;
                }
                Some(triple) => {
                    if old_index >= old_names.len() {
                        // Current exhausted; everything left is a create.
                        additions.push(triple);
                        additions.extend(new.by_ref());
                        break;
                    }
                    let old_name = old_names[old_index].as_str();
                    if old_name == triple.name {
                        match self.set_attribute_from_text(&triple.name, &triple.value, change) {
                            Ok(changed) => events.extend(changed),
                            Err(error) => warn!(
                                component = &*self.type_name,
                                attribute = triple.name,
                                %error,
                                "skipping attribute while merging"
                            ),
                        }
                        old_index += 1;
                        pending = new.next();
                    } else if old_name > triple.name.as_str() {
                        additions.push(triple);
                        pending = new.next();
                    } else {
                        removals.push(old_names[old_index].clone());
                        old_index += 1;
                        pending = Some(triple);
                    }
                }
            }
        }

        for triple in additions {
            match self.create_attribute(&triple.type_name, &triple.name, change) {
                Ok(added) => {
                    events.extend(added);
                    match self.set_attribute_from_text(&triple.name, &triple.value, change) {
                        Ok(changed) => events.extend(changed),
                        Err(error) => warn!(
                            component = &*self.type_name,
                            attribute = triple.name,
                            %error,
                            "created attribute with default value"
                        ),
                    }
                }
                Err(error) => warn!(
                    component = &*self.type_name,
                    attribute = triple.name,
                    %error,
                    "skipping unknown attribute type while merging"
                ),
            }
        }
        for name in removals {
            match self.remove_attribute(&name, change) {
                Ok(removed) => events.extend(removed),
                Err(error) => warn!(
                    component = &*self.type_name,
                    attribute = name,
                    %error,
                    "failed to remove attribute while merging"
                ),
            }
        }
        events
    }

    /// Extracts the (name, type name, value) records of this component.
    #[must_use]
    pub fn to_triples(&self) -> Vec<AttributeTriple> {
        self.attributes
            .iter()
            .map(|a| AttributeTriple {
                name: a.name().to_owned(),
                type_name: a.type_name().to_owned(),
                value: a.to_text(),
            })
            .collect()
    }

    /// Writes this component's attribute stream in wire form.
    ///
    /// Static components write a count followed by positional values;
    /// dynamic components write string triples so their structure is itself
    /// wire-portable.
    pub fn encode_attributes(&self, writer: &mut WireWriter) {
        #[allow(clippy::cast_possible_truncation)]
        writer.write_u8(self.attributes.len().min(usize::from(u8::MAX)) as u8);
        for attr in self.attributes.iter().take(usize::from(u8::MAX)) {
            if self.dynamic {
                writer.write_string(attr.name());
                writer.write_string(attr.type_name());
                writer.write_string(&attr.to_text());
            } else {
                attr.encode(writer);
            }
        }
    }

    /// Reads this component's attribute stream from wire form.
    ///
    /// # Errors
    ///
    /// Static components require the stream's attribute count to match the
    /// declared schema; any wire error aborts with the value set partially
    /// applied (callers treat this as fatal for the surrounding load).
    pub fn decode_attributes(
        &mut self,
        reader: &mut WireReader<'_>,
        change: ChangeType,
    ) -> Result<Vec<ComponentEvent>> {
        let count = usize::from(reader.read_u8()?);
        if self.dynamic {
            let mut incoming = Vec::with_capacity(count);
            for _ in 0..count {
                incoming.push(AttributeTriple {
                    name: reader.read_string()?,
                    type_name: reader.read_string()?,
                    value: reader.read_string()?,
                });
            }
            return Ok(self.merge_triples(incoming, change));
        }
        if count != self.attributes.len() {
            return Err(Error::AttributeCountMismatch {
                expected: self.attributes.len(),
                found: count,
            });
        }
        let mut events = Vec::new();
        for index in 0..self.attributes.len() {
            self.attributes[index].decode(reader)?;
            let name = self.attributes[index].name().to_owned();
            events.extend(self.changed(&name, change));
        }
        Ok(events)
    }
}
