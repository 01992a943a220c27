// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Binary envelope of a [`SerializedForm`].
//!
//! ```text
//! magic      4 bytes    "GSNP"
//! version    u32        FORMAT_VERSION
//! types      varuint32  count, then per type:
//!                       name, field count, hook count
//! arena      varuint32  count, then per slot: tag u8 + varuint32 payload
//! primitives varuint32  length + raw bytes
//! root       one handle
//! ```
//!
//! Everything is little-endian. Reading validates every block pointer, so a
//! form that comes back from bytes can be decoded without further checks
//! beyond the ones the decoder always performs.

use crate::arena::{Arena, SerialHandle};
use crate::buffer::{Reader, Writer};
use crate::ensure;
use crate::error::Error;
use crate::form::SerializedForm;
use crate::resolver::type_table::TypeTable;
use crate::types::{FORMAT_VERSION, MAGIC};

impl SerializedForm {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::with_capacity(
            16 + self.arena.len() * 3 + self.primitives.len() + self.types.len() * 24,
        );
        writer.write_bytes(&MAGIC);
        writer.write_u32(FORMAT_VERSION);

        writer.write_varuint32(self.types.len() as u32);
        for entry in self.types.entries() {
            writer.write_utf8_string(entry.name());
            writer.write_varuint32(entry.field_count());
            writer.write_varuint32(entry.hook_count());
        }

        writer.write_varuint32(self.arena.len() as u32);
        for handle in self.arena.slots() {
            handle.write_to(&mut writer);
        }

        writer.write_varuint32(self.primitives.len() as u32);
        writer.write_bytes(&self.primitives);

        self.root.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Parses and validates an envelope. Type names are resolved against the
    /// process catalog; register types with
    /// [`TypeCatalog::register`](crate::resolver::type_catalog::TypeCatalog::register)
    /// first.
    pub fn from_bytes(bytes: &[u8]) -> Result<SerializedForm, Error> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_bytes(MAGIC.len())?;
        ensure!(
            magic == MAGIC,
            Error::invalid_data(format!("bad magic {magic:02x?}, not a graphsnap form"))
        );
        let version = reader.read_u32()?;
        ensure!(
            version == FORMAT_VERSION,
            Error::invalid_data(format!(
                "unsupported format version {version}, expected {FORMAT_VERSION}"
            ))
        );

        let type_count = read_count(&mut reader, 3)?;
        let mut types = TypeTable::new();
        for _ in 0..type_count {
            let name = reader.read_utf8_string()?;
            let field_count = reader.read_varuint32()?;
            let hook_count = reader.read_varuint32()?;
            types.push_remote(name, field_count, hook_count)?;
        }

        let slot_count = read_count(&mut reader, 1)?;
        let mut slots = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            slots.push(SerialHandle::read_from(&mut reader)?);
        }
        let arena = Arena::from_slots(slots)?;

        let primitive_len = reader.read_varuint32()? as usize;
        let primitives = reader.read_bytes(primitive_len)?.to_vec();

        let root = SerialHandle::read_from(&mut reader)?;
        ensure!(
            reader.is_exhausted(),
            Error::invalid_data(format!(
                "{} trailing bytes after the root handle",
                reader.slice_after_cursor().len()
            ))
        );

        let form = SerializedForm {
            types,
            arena,
            primitives,
            root,
        };
        form.validate()?;
        log::debug!(
            "read form: {} types, {} slots, {} primitive bytes",
            form.types.len(),
            form.arena.len(),
            form.primitives.len()
        );
        Ok(form)
    }

    /// Checks that every pointer lands on a header of the right kind and
    /// that every block fits in the arena.
    fn validate(&self) -> Result<(), Error> {
        ensure!(
            !self.root.is_header() && !matches!(self.root, SerialHandle::CustomSerializedObjects { .. }),
            Error::invalid_data(format!("root handle {:?} is not a value", self.root))
        );
        self.validate_handle(self.root)?;
        for (index, handle) in self.arena.slots().iter().enumerate() {
            self.validate_handle(*handle).map_err(|e| {
                Error::invalid_data(format!("slot {index}: {e}"))
            })?;
        }
        Ok(())
    }

    fn validate_handle(&self, handle: SerialHandle) -> Result<(), Error> {
        let len = self.arena.len() as u64;
        let fits = |block: u32, size: u64| block >= 1 && block as u64 + size <= len;
        match handle {
            SerialHandle::Null | SerialHandle::OutsideReference => {}
            SerialHandle::Primitive { kind, offset } => ensure!(
                offset as usize + kind.width().unwrap_or(1) <= self.primitives.len(),
                Error::invalid_data(format!("{kind:?} at offset {offset} runs past the buffer"))
            ),
            SerialHandle::Reference { block } => {
                let SerialHandle::ObjectType { type_index } = self.header(block)? else {
                    return Err(Error::invalid_data(format!("block {block} is not an object")));
                };
                let entry = self.types.get(type_index).ok_or_else(|| {
                    Error::invalid_data(format!("type index {type_index} not in type table"))
                })?;
                let size = 1 + entry.field_count() as u64 + entry.hook_count() as u64;
                ensure!(
                    fits(block, size),
                    Error::invalid_data(format!("object block {block} runs past the arena"))
                );
            }
            SerialHandle::ReferenceToPrevious { block } => ensure!(
                matches!(
                    self.header(block)?,
                    SerialHandle::ObjectType { .. }
                        | SerialHandle::ArrayRank { .. }
                        | SerialHandle::KeyType { .. }
                ),
                Error::invalid_data(format!("back reference to non-block slot {block}"))
            ),
            SerialHandle::Array { block } => {
                let SerialHandle::ArrayRank { rank } = self.header(block)? else {
                    return Err(Error::invalid_data(format!("block {block} is not an array")));
                };
                let mut size = 1 + rank as u64;
                ensure!(
                    fits(block, size),
                    Error::invalid_data(format!("array block {block} runs past the arena"))
                );
                let mut items = 1u64;
                for dimension in 0..rank {
                    let SerialHandle::ArrayCount { length } = self.header(block + 1 + dimension)?
                    else {
                        return Err(Error::invalid_data(format!(
                            "array block {block} is missing dimension {dimension}"
                        )));
                    };
                    items = items.saturating_mul(length as u64);
                }
                size = size.saturating_add(items);
                ensure!(
                    fits(block, size),
                    Error::invalid_data(format!("array block {block} runs past the arena"))
                );
            }
            SerialHandle::SerializedFromKey { block } => {
                let SerialHandle::KeyType { type_index } = self.header(block)? else {
                    return Err(Error::invalid_data(format!("block {block} is not a key block")));
                };
                ensure!(
                    (type_index as usize) < self.types.len() && fits(block, 2),
                    Error::invalid_data(format!("key block {block} is malformed"))
                );
            }
            SerialHandle::CustomSerializedObjects { block } => {
                let SerialHandle::CustomSerializedObjectsCount { count, .. } =
                    self.header(block)?
                else {
                    return Err(Error::invalid_data(format!(
                        "block {block} is not a hook value list"
                    )));
                };
                ensure!(
                    fits(block, 1 + count as u64),
                    Error::invalid_data(format!("hook value list {block} runs past the arena"))
                );
            }
            SerialHandle::ObjectType { type_index }
            | SerialHandle::KeyType { type_index }
            | SerialHandle::CustomSerializedObjectsCount { type_index, .. } => ensure!(
                (type_index as usize) < self.types.len(),
                Error::invalid_data(format!("type index {type_index} not in type table"))
            ),
            SerialHandle::ArrayRank { .. } | SerialHandle::ArrayCount { .. } => {}
        }
        Ok(())
    }

    fn header(&self, block: u32) -> Result<SerialHandle, Error> {
        self.arena.get(block)
    }
}

/// Reads an element count, rejecting counts the remaining bytes cannot hold.
fn read_count(reader: &mut Reader, min_element_size: usize) -> Result<usize, Error> {
    let count = reader.read_varuint32()? as usize;
    let remaining = reader.slice_after_cursor().len();
    ensure!(
        count.saturating_mul(min_element_size) <= remaining,
        Error::invalid_data(format!("count {count} exceeds the {remaining} remaining bytes"))
    );
    Ok(count)
}
