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

//! The slot table a snapshot is laid out in.
//!
//! Slot 0 always holds [`SerialHandle::Null`]; real blocks start at 1. A
//! block is reserved whole before its content is written, so a back
//! reference can point at a block whose fields are still being encoded.

use crate::buffer::{Reader, Writer};
use crate::ensure;
use crate::error::Error;
use crate::types::{HandleTag, PrimitiveKind};
use std::fmt;

/// One tagged slot of an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerialHandle {
    Null,
    Primitive { kind: PrimitiveKind, offset: u32 },
    /// Owns the plain-object block starting at `block`.
    Reference { block: u32 },
    /// Points back at a block owned elsewhere.
    ReferenceToPrevious { block: u32 },
    Array { block: u32 },
    /// The object is live and was deliberately left out.
    OutsideReference,
    SerializedFromKey { block: u32 },
    /// Hook value list; only found in hook slots.
    CustomSerializedObjects { block: u32 },

    ObjectType { type_index: u32 },
    ArrayRank { rank: u32 },
    ArrayCount { length: u32 },
    KeyType { type_index: u32 },
    CustomSerializedObjectsCount { type_index: u32, count: u32 },
}

impl SerialHandle {
    pub fn tag(&self) -> HandleTag {
        match self {
            SerialHandle::Null => HandleTag::Null,
            SerialHandle::Primitive { .. } => HandleTag::Primitive,
            SerialHandle::Reference { .. } => HandleTag::Reference,
            SerialHandle::ReferenceToPrevious { .. } => HandleTag::ReferenceToPrevious,
            SerialHandle::Array { .. } => HandleTag::Array,
            SerialHandle::OutsideReference => HandleTag::OutsideReference,
            SerialHandle::SerializedFromKey { .. } => HandleTag::SerializedFromKey,
            SerialHandle::CustomSerializedObjects { .. } => HandleTag::CustomSerializedObjects,
            SerialHandle::ObjectType { .. } => HandleTag::ObjectType,
            SerialHandle::ArrayRank { .. } => HandleTag::ArrayRank,
            SerialHandle::ArrayCount { .. } => HandleTag::ArrayCount,
            SerialHandle::KeyType { .. } => HandleTag::KeyType,
            SerialHandle::CustomSerializedObjectsCount { .. } => {
                HandleTag::CustomSerializedObjectsCount
            }
        }
    }

    /// Block headers never stand for a value.
    pub fn is_header(&self) -> bool {
        matches!(
            self,
            SerialHandle::ObjectType { .. }
                | SerialHandle::ArrayRank { .. }
                | SerialHandle::ArrayCount { .. }
                | SerialHandle::KeyType { .. }
                | SerialHandle::CustomSerializedObjectsCount { .. }
        )
    }

    /// Start of the block this handle owns or points at.
    pub fn block(&self) -> Option<u32> {
        match *self {
            SerialHandle::Reference { block }
            | SerialHandle::ReferenceToPrevious { block }
            | SerialHandle::Array { block }
            | SerialHandle::SerializedFromKey { block }
            | SerialHandle::CustomSerializedObjects { block } => Some(block),
            _ => None,
        }
    }

    pub fn write_to(&self, writer: &mut Writer) {
        writer.write_u8(self.tag().into());
        match *self {
            SerialHandle::Null | SerialHandle::OutsideReference => {}
            SerialHandle::Primitive { kind, offset } => {
                writer.write_varuint32(kind.tag() as u32);
                writer.write_varuint32(offset);
            }
            SerialHandle::Reference { block }
            | SerialHandle::ReferenceToPrevious { block }
            | SerialHandle::Array { block }
            | SerialHandle::SerializedFromKey { block }
            | SerialHandle::CustomSerializedObjects { block } => writer.write_varuint32(block),
            SerialHandle::ObjectType { type_index } | SerialHandle::KeyType { type_index } => {
                writer.write_varuint32(type_index)
            }
            SerialHandle::ArrayRank { rank } => writer.write_varuint32(rank),
            SerialHandle::ArrayCount { length } => writer.write_varuint32(length),
            SerialHandle::CustomSerializedObjectsCount { type_index, count } => {
                writer.write_varuint32(type_index);
                writer.write_varuint32(count);
            }
        }
    }

    pub fn read_from(reader: &mut Reader) -> Result<SerialHandle, Error> {
        let raw = reader.read_u8()?;
        let tag = HandleTag::try_from(raw)
            .map_err(|_| Error::invalid_data(format!("unknown handle tag {raw}")))?;
        let handle = match tag {
            HandleTag::Null => SerialHandle::Null,
            HandleTag::OutsideReference => SerialHandle::OutsideReference,
            HandleTag::Primitive => {
                let kind = reader.read_varuint32()?;
                ensure!(
                    kind <= u8::MAX as u32,
                    Error::invalid_data(format!("primitive kind {kind} out of range"))
                );
                SerialHandle::Primitive {
                    kind: PrimitiveKind::from(kind as u8),
                    offset: reader.read_varuint32()?,
                }
            }
            HandleTag::Reference => SerialHandle::Reference {
                block: reader.read_varuint32()?,
            },
            HandleTag::ReferenceToPrevious => SerialHandle::ReferenceToPrevious {
                block: reader.read_varuint32()?,
            },
            HandleTag::Array => SerialHandle::Array {
                block: reader.read_varuint32()?,
            },
            HandleTag::SerializedFromKey => SerialHandle::SerializedFromKey {
                block: reader.read_varuint32()?,
            },
            HandleTag::CustomSerializedObjects => SerialHandle::CustomSerializedObjects {
                block: reader.read_varuint32()?,
            },
            HandleTag::ObjectType => SerialHandle::ObjectType {
                type_index: reader.read_varuint32()?,
            },
            HandleTag::ArrayRank => SerialHandle::ArrayRank {
                rank: reader.read_varuint32()?,
            },
            HandleTag::ArrayCount => SerialHandle::ArrayCount {
                length: reader.read_varuint32()?,
            },
            HandleTag::KeyType => SerialHandle::KeyType {
                type_index: reader.read_varuint32()?,
            },
            HandleTag::CustomSerializedObjectsCount => SerialHandle::CustomSerializedObjectsCount {
                type_index: reader.read_varuint32()?,
                count: reader.read_varuint32()?,
            },
        };
        Ok(handle)
    }
}

/// Flat, 1-indexed sequence of [`SerialHandle`]s.
#[derive(Clone, PartialEq, Eq)]
pub struct Arena {
    slots: Vec<SerialHandle>,
}

impl Default for Arena {
    fn default() -> Self {
        Arena {
            slots: vec![SerialHandle::Null],
        }
    }
}

impl Arena {
    pub fn new() -> Arena {
        Arena::default()
    }

    pub(crate) fn from_slots(slots: Vec<SerialHandle>) -> Result<Arena, Error> {
        ensure!(
            slots.first() == Some(&SerialHandle::Null),
            Error::invalid_data("arena slot 0 must hold the null sentinel")
        );
        Ok(Arena { slots })
    }

    /// Appends `count` null slots and returns the index of the first.
    pub fn reserve(&mut self, count: usize) -> Result<u32, Error> {
        let start = self.slots.len();
        ensure!(
            start + count <= u32::MAX as usize,
            Error::not_allowed("arena exceeds u32 addressable slots")
        );
        self.slots.resize(start + count, SerialHandle::Null);
        Ok(start as u32)
    }

    pub fn set(&mut self, slot: u32, handle: SerialHandle) -> Result<(), Error> {
        let len = self.slots.len();
        let target = self
            .slots
            .get_mut(slot as usize)
            .ok_or_else(|| Error::invalid_data(format!("slot {slot} outside arena of {len}")))?;
        *target = handle;
        Ok(())
    }

    pub fn get(&self, slot: u32) -> Result<SerialHandle, Error> {
        self.slots.get(slot as usize).copied().ok_or_else(|| {
            Error::invalid_data(format!("slot {slot} outside arena of {}", self.slots.len()))
        })
    }

    /// Slot count including the sentinel.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` when only the sentinel is present.
    pub fn is_empty(&self) -> bool {
        self.slots.len() == 1
    }

    pub fn slots(&self) -> &[SerialHandle] {
        &self.slots
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for (i, slot) in self.slots.iter().enumerate() {
            list.entry(&i, slot);
        }
        list.finish()
    }
}
