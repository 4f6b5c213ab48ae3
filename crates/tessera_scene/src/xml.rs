//! The XML scene document codec.
//!
//! ```text
//! <scene>
//!   <entity id="7">
//!     <component type="Name" name="" sync="true">
//!       <attribute name="name" value="avatar" type="string"/>
//!     </component>
//!   </entity>
//! </scene>
//! ```
//!
//! The attribute `type` is informational for static components (the schema
//! is authoritative) and authoritative for dynamic ones. Reading uses
//! `roxmltree`; writing is a small escaping writer since the format is
//! this simple.

use std::fmt::Write as _;

use roxmltree::{Document, Node};
use tracing::warn;

use tessera_foundation::{Error, Result};

use crate::change::ChangeType;
use crate::component::{AttributeTriple, Component};
use crate::entity::{Entity, EntityId};
use crate::scene::{LoadOptions, SaveOptions, Scene};

// The XML 1.0 Char production: tab, newline, carriage return, and the
// non-surrogate planes minus the 0xFFFE/0xFFFF noncharacters. Anything
// outside it cannot be represented in a document even escaped.
fn xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn write_escaped(out: &mut String, text: &str) {
    for c in text.chars().filter(|&c| xml_char(c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // Attribute-value normalization would turn these into spaces.
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}

fn write_component_xml(out: &mut String, component: &Component, indent: &str) {
    let _ = write!(out, "{indent}<component type=\"");
    write_escaped(out, component.type_name());
    out.push_str("\" name=\"");
    write_escaped(out, component.name());
    let _ = writeln!(
        out,
        "\" sync=\"{}\">",
        if component.sync() { "true" } else { "false" }
    );
    for attr in component.attributes() {
        let _ = write!(out, "{indent} <attribute name=\"");
        write_escaped(out, attr.name());
        out.push_str("\" value=\"");
        write_escaped(out, &attr.to_text());
        let _ = writeln!(out, "\" type=\"{}\"/>", attr.type_name());
    }
    let _ = writeln!(out, "{indent}</component>");
}

fn write_entity_xml(out: &mut String, entity: &Entity, include_temporary: bool, indent: &str) {
    let _ = writeln!(out, "{indent}<entity id=\"{}\">", entity.id().raw());
    for component in entity.components() {
        if component.temporary() && !include_temporary {
            continue;
        }
        write_component_xml(out, component, &format!("{indent} "));
    }
    let _ = writeln!(out, "{indent}</entity>");
}

impl Scene {
    /// Serializes the scene as an XML document.
    ///
    /// Entities appear in id order; temporary and local entities are
    /// included only when the options say so.
    #[must_use]
    pub fn scene_xml(&self, options: SaveOptions) -> String {
        let mut out = String::from("<scene>\n");
        for entity in self.entities() {
            if entity.is_local() && !options.include_local {
                continue;
            }
            if entity.temporary() && !options.include_temporary {
                continue;
            }
            write_entity_xml(&mut out, entity, options.include_temporary, " ");
        }
        out.push_str("</scene>\n");
        out
    }

    /// Serializes one entity as an XML fragment, skipping temporary
    /// components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] for unknown ids.
    pub fn entity_xml(&self, id: EntityId) -> Result<String> {
        let entity = self.entity(id).ok_or(Error::EntityNotFound(id.raw()))?;
        let mut out = String::new();
        write_entity_xml(&mut out, entity, false, "");
        Ok(out)
    }

    /// Loads scene content from an XML document.
    ///
    /// A top-level parse failure aborts the whole load; per-entity and
    /// per-component problems (missing type, unknown type, bad values) skip
    /// just that element. Components deserialize with notifications
    /// suppressed, then created/changed events are dispatched entity by
    /// entity once the batch is complete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Xml`] when the document does not parse or carries
    /// no `scene` root element.
    pub fn load_xml(
        &mut self,
        text: &str,
        options: LoadOptions,
        change: ChangeType,
    ) -> Result<Vec<EntityId>> {
        let doc = Document::parse(text).map_err(|error| {
            warn!(%error, "scene xml parse failed");
            Error::xml(error.to_string())
        })?;
        let root = doc.root_element();
        if !root.has_tag_name("scene") {
            return Err(Error::xml(format!(
                "expected scene root element, found {}",
                root.tag_name().name()
            )));
        }

        let mut loaded = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("entity")) {
            let file_id = node
                .attribute("id")
                .and_then(|s| s.parse::<u32>().ok())
                .map_or(EntityId::NONE, EntityId);
            let Some(id) = self.resolve_incoming_id(file_id, options) else {
                continue;
            };
            self.insert_entity(id);
            self.populate_entity(id, node);
            loaded.push(id);
        }

        self.emit_loaded(&loaded, change);
        Ok(loaded)
    }

    /// Clones an entity within this scene under a fresh id.
    ///
    /// Implemented as serialize, fix up id, deserialize, so clone
    /// correctness is identical to load correctness. The clone is placed in
    /// the local or networked namespace per `local` and flagged per
    /// `temporary`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntityNotFound`] for unknown ids.
    pub fn clone_entity(&mut self, id: EntityId, local: bool, temporary: bool) -> Result<EntityId> {
        let fragment = self.entity_xml(id)?;
        let new_id = if local {
            self.next_free_local_id()
        } else {
            self.next_free_id()
        };
        let doc = Document::parse(&fragment)
            .map_err(|error| Error::xml(format!("clone fragment: {error}")))?;
        self.insert_entity(new_id);
        self.populate_entity(new_id, doc.root_element());
        if let Some(entity) = self.entity_mut(new_id) {
            entity.set_temporary(temporary);
        }
        self.emit_loaded(&[new_id], ChangeType::Default);
        Ok(new_id)
    }

    // Reads the component children of an entity element into an existing
    // (typically just created) entity, with notifications suppressed.
    fn populate_entity(&mut self, id: EntityId, node: Node<'_, '_>) {
        for comp_node in node.children().filter(|n| n.has_tag_name("component")) {
            let Some(type_name) = comp_node.attribute("type") else {
                warn!(entity = id.raw(), "skipping component element without type");
                continue;
            };
            let instance_name = comp_node.attribute("name").unwrap_or_default();
            let sync = comp_node
                .attribute("sync")
                .is_none_or(|s| s.eq_ignore_ascii_case("true") || s == "1");

            let mut component = match self.registry().create_by_name(type_name, instance_name) {
                Ok(component) => component,
                Err(error) => {
                    warn!(entity = id.raw(), component = type_name, %error, "skipping component");
                    continue;
                }
            };
            component.set_sync(sync);

            let triples: Vec<AttributeTriple> = comp_node
                .children()
                .filter(|n| n.has_tag_name("attribute"))
                .filter_map(|attr_node| {
                    let name = attr_node.attribute("name")?;
                    Some(AttributeTriple {
                        name: name.to_owned(),
                        type_name: attr_node.attribute("type").unwrap_or_default().to_owned(),
                        value: attr_node.attribute("value").unwrap_or_default().to_owned(),
                    })
                })
                .collect();
            component.apply_triples(triples, ChangeType::Disconnected);

            let Some(entity) = self.entity_mut(id) else {
                return;
            };
            if let Err(error) = entity.add_component(component) {
                warn!(entity = id.raw(), component = type_name, %error, "skipping component");
            }
        }
    }
}
