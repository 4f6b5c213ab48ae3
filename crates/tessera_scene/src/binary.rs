//! The binary scene format.
//!
//! Layout: `u32 entityCount`, then per entity `u32 id`, `u32
//! componentCount`, then per component `u32 typeId`, length-prefixed name,
//! `u8 syncFlag`, `u32 blobByteLength` and exactly that many bytes of the
//! component's own attribute stream. The length prefix is what lets a
//! reader skip components of unrecognized type without desynchronizing.
//!
//! Unlike the XML loader there is no per-element recovery: a corrupted
//! stream cannot be resynchronized reliably, so any decode error aborts
//! the entire load with the scene untouched.

use tracing::{debug, warn};

use tessera_foundation::wire::{WireReader, WireWriter};
use tessera_foundation::Result;

use crate::change::ChangeType;
use crate::component::Component;
use crate::entity::EntityId;
use crate::scene::{LoadOptions, SaveOptions, Scene};

struct StagedEntity {
    file_id: EntityId,
    components: Vec<Component>,
}

impl Scene {
    /// Serializes the scene in the binary format.
    ///
    /// Entities appear in id order; temporary and local content is included
    /// only when the options say so.
    #[must_use]
    pub fn scene_binary(&self, options: SaveOptions) -> Vec<u8> {
        let included: Vec<_> = self
            .entities()
            .filter(|e| options.include_local || !e.is_local())
            .filter(|e| options.include_temporary || !e.temporary())
            .collect();

        let mut writer = WireWriter::new();
        #[allow(clippy::cast_possible_truncation)]
        writer.write_u32(included.len() as u32);
        for entity in included {
            writer.write_u32(entity.id().raw());
            let components: Vec<_> = entity
                .components()
                .iter()
                .filter(|c| options.include_temporary || !c.temporary())
                .collect();
            #[allow(clippy::cast_possible_truncation)]
            writer.write_u32(components.len() as u32);
            for component in components {
                writer.write_u32(component.type_id());
                writer.write_string(component.name());
                writer.write_u8(u8::from(component.sync()));
                let mut blob = WireWriter::new();
                component.encode_attributes(&mut blob);
                let blob = blob.into_bytes();
                #[allow(clippy::cast_possible_truncation)]
                writer.write_u32(blob.len() as u32);
                writer.write_bytes(&blob);
            }
        }
        writer.into_bytes()
    }

    /// Loads scene content from the binary format.
    ///
    /// The whole stream is decoded before the scene is touched; any wire
    /// error aborts the load with no entities added and no events emitted.
    /// Components of unrecognized type id are skipped via their blob
    /// length. Events follow the XML loader's two-pass shape.
    ///
    /// # Errors
    ///
    /// Returns a wire error on short, truncated, or corrupt input.
    pub fn load_binary(
        &mut self,
        bytes: &[u8],
        options: LoadOptions,
        change: ChangeType,
    ) -> Result<Vec<EntityId>> {
        let mut reader = WireReader::new(bytes);
        let entity_count = reader.read_u32()?;
        let mut staged = Vec::new();
        for _ in 0..entity_count {
            let file_id = EntityId(reader.read_u32()?);
            let component_count = reader.read_u32()?;
            let mut components = Vec::new();
            for _ in 0..component_count {
                let type_id = reader.read_u32()?;
                let instance_name = reader.read_string()?;
                let sync = reader.read_u8()? != 0;
                let blob_len = usize::try_from(reader.read_u32()?)
                    .unwrap_or_else(|_| unreachable!("u32 fits usize"));
                let blob = reader.read_bytes(blob_len)?;

                let mut component = match self.registry().create_by_id(type_id, &instance_name) {
                    Ok(component) => component,
                    Err(error) => {
                        debug!(type_id, %error, "skipping component of unrecognized type");
                        continue;
                    }
                };
                component.set_sync(sync);
                if !blob.is_empty() {
                    let mut blob_reader = WireReader::new(blob);
                    component.decode_attributes(&mut blob_reader, ChangeType::Disconnected)?;
                }
                components.push(component);
            }
            staged.push(StagedEntity {
                file_id,
                components,
            });
        }

        // The stream decoded cleanly; only now mutate the scene.
        let mut loaded = Vec::new();
        for entry in staged {
            let Some(id) = self.resolve_incoming_id(entry.file_id, options) else {
                continue;
            };
            let entity = self.insert_entity(id);
            for component in entry.components {
                let type_name = component.type_name().to_owned();
                if let Err(error) = entity.add_component(component) {
                    warn!(entity = id.raw(), component = type_name, %error, "skipping component");
                }
            }
            loaded.push(id);
        }

        self.emit_loaded(&loaded, change);
        Ok(loaded)
    }
}
