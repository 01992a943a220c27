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

//! Graph walker turning a live object graph into a [`SerializedForm`].

use crate::arena::{Arena, SerialHandle};
use crate::buffer::Writer;
use crate::config::Config;
use crate::ensure;
use crate::error::Error;
use crate::form::SerializedForm;
use crate::hook::HookContext;
use crate::resolver::ref_resolver::IdentityMap;
use crate::resolver::type_catalog::{KeyedAccessor, TypeSchema};
use crate::resolver::type_table::TypeTable;
use crate::snapshot::LiveSet;
use crate::types::PrimitiveKind;
use crate::value::{ArrayRef, ObjectRef, Value};
use std::sync::Arc;

#[inline(always)]
fn slot(block: u32, offset: usize) -> u32 {
    // the arena already proved the whole block addressable when reserving it
    block + offset as u32
}

fn wire_len(len: usize, what: &str) -> Result<u32, Error> {
    u32::try_from(len)
        .map_err(|_| Error::not_allowed(format!("{what} of {len} entries exceeds the u32 range")))
}

/// State of one encode pass. Not reusable.
pub struct Encoder<'a> {
    config: &'a Config,
    live: &'a dyn LiveSet,
    arena: Arena,
    primitives: Writer,
    types: TypeTable,
    identities: IdentityMap,
    depth: u32,
}

impl<'a> Encoder<'a> {
    pub fn new(config: &'a Config, live: &'a dyn LiveSet) -> Encoder<'a> {
        Encoder {
            config,
            live,
            arena: Arena::new(),
            primitives: Writer::default(),
            types: TypeTable::new(),
            identities: IdentityMap::new(),
            depth: 0,
        }
    }

    pub fn encode(mut self, root: &ObjectRef) -> Result<SerializedForm, Error> {
        if self.live.is_live(root) {
            return Err(Error::root_is_live(format!(
                "root {} is live and cannot be snapshotted",
                root.type_name()
            )));
        }
        let root = self.encode_value(&Value::Object(root.clone()))?;
        log::debug!(
            "encoded {} slots, {} primitive bytes, {} types, {} shared nodes",
            self.arena.len() - 1,
            self.primitives.len(),
            self.types.len(),
            self.identities.len()
        );
        Ok(SerializedForm {
            types: self.types,
            arena: self.arena,
            primitives: self.primitives.into_bytes(),
            root,
        })
    }

    fn enter(&mut self) -> Result<(), Error> {
        self.depth += 1;
        ensure!(
            self.depth <= self.config.max_depth(),
            Error::depth_exceed(format!(
                "graph nesting exceeds the maximum depth of {}",
                self.config.max_depth()
            ))
        );
        Ok(())
    }

    #[inline(always)]
    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn encode_value(&mut self, value: &Value) -> Result<SerialHandle, Error> {
        let handle = match value {
            Value::Null => SerialHandle::Null,
            Value::Bool(v) => self.primitive(PrimitiveKind::Bool, |w| w.write_bool(*v))?,
            Value::I8(v) => self.primitive(PrimitiveKind::I8, |w| w.write_i8(*v))?,
            Value::U8(v) => self.primitive(PrimitiveKind::U8, |w| w.write_u8(*v))?,
            Value::I16(v) => self.primitive(PrimitiveKind::I16, |w| w.write_i16(*v))?,
            Value::U16(v) => self.primitive(PrimitiveKind::U16, |w| w.write_u16(*v))?,
            Value::I32(v) => self.primitive(PrimitiveKind::I32, |w| w.write_i32(*v))?,
            Value::U32(v) => self.primitive(PrimitiveKind::U32, |w| w.write_u32(*v))?,
            Value::I64(v) => self.primitive(PrimitiveKind::I64, |w| w.write_i64(*v))?,
            Value::U64(v) => self.primitive(PrimitiveKind::U64, |w| w.write_u64(*v))?,
            Value::F32(v) => self.primitive(PrimitiveKind::F32, |w| w.write_f32(*v))?,
            Value::F64(v) => self.primitive(PrimitiveKind::F64, |w| w.write_f64(*v))?,
            Value::Char(v) => self.primitive(PrimitiveKind::Char, |w| w.write_u32(*v as u32))?,
            Value::String(v) => {
                self.primitive(PrimitiveKind::String, |w| w.write_utf8_string(v))?
            }
            Value::Object(obj) => self.encode_object(value, obj)?,
            Value::Array(arr) => self.encode_array(value, arr)?,
        };
        Ok(handle)
    }

    /// Appends one primitive; equal primitives are never shared.
    fn primitive(
        &mut self,
        kind: PrimitiveKind,
        write: impl FnOnce(&mut Writer),
    ) -> Result<SerialHandle, Error> {
        let offset = u32::try_from(self.primitives.len())
            .map_err(|_| Error::not_allowed("primitive buffer exceeds 4 GiB"))?;
        write(&mut self.primitives);
        Ok(SerialHandle::Primitive { kind, offset })
    }

    fn encode_object(&mut self, value: &Value, obj: &ObjectRef) -> Result<SerialHandle, Error> {
        if let Some(block) = self.identities.block_of(value) {
            return Ok(SerialHandle::ReferenceToPrevious { block });
        }
        if self.live.is_live(obj) {
            return Ok(SerialHandle::OutsideReference);
        }
        let schema = obj.schema();
        self.enter()?;
        let handle = match schema.keyed() {
            Some(keyed) => self.encode_keyed(value, obj, &schema, keyed)?,
            None => self.encode_plain(value, obj, &schema)?,
        };
        self.leave();
        Ok(handle)
    }

    fn encode_keyed(
        &mut self,
        value: &Value,
        obj: &ObjectRef,
        schema: &Arc<TypeSchema>,
        keyed: &KeyedAccessor,
    ) -> Result<SerialHandle, Error> {
        let descriptor = keyed.descriptor(obj.try_borrow()?.as_any())?;
        let type_index = self.types.register(schema);
        let block = self.arena.reserve(2)?;
        if self.config.is_share_keyed() {
            self.identities.register(value, block);
        }
        self.arena.set(block, SerialHandle::KeyType { type_index })?;
        let handle = self.encode_value(&descriptor)?;
        self.arena.set(slot(block, 1), handle)?;
        Ok(SerialHandle::SerializedFromKey { block })
    }

    fn encode_plain(
        &mut self,
        value: &Value,
        obj: &ObjectRef,
        schema: &Arc<TypeSchema>,
    ) -> Result<SerialHandle, Error> {
        let type_index = self.types.register(schema);
        let fields = schema.fields();
        let hooks = schema.hooks();
        let block = self.arena.reserve(1 + fields.len() + hooks.len())?;
        self.identities.register(value, block);
        self.arena.set(block, SerialHandle::ObjectType { type_index })?;

        for (i, field) in fields.iter().enumerate() {
            let field_value = field.get(obj.try_borrow()?.as_any())?;
            let handle = self.encode_value(&field_value)?;
            self.arena.set(slot(block, 1 + i), handle)?;
        }

        for (i, hook) in hooks.iter().enumerate() {
            let declaring = self.types.register(&hook.declaring_schema());
            let mut context = HookContext::collecting(schema.name(), hook.name());
            hook.invoke(obj.try_borrow_mut()?.as_any_mut(), &mut context)?;
            let values = context.into_collected();
            let count = wire_len(values.len(), "hook value list")?;

            let list = self.arena.reserve(1 + values.len())?;
            self.arena.set(
                list,
                SerialHandle::CustomSerializedObjectsCount {
                    type_index: declaring,
                    count,
                },
            )?;
            for (j, hook_value) in values.iter().enumerate() {
                let handle = self.encode_value(hook_value)?;
                self.arena.set(slot(list, 1 + j), handle)?;
            }
            self.arena.set(
                slot(block, 1 + fields.len() + i),
                SerialHandle::CustomSerializedObjects { block: list },
            )?;
        }
        Ok(SerialHandle::Reference { block })
    }

    fn encode_array(&mut self, value: &Value, arr: &ArrayRef) -> Result<SerialHandle, Error> {
        if let Some(block) = self.identities.block_of(value) {
            return Ok(SerialHandle::ReferenceToPrevious { block });
        }
        let items = {
            let array = arr.try_borrow()?;
            ensure!(
                array.rank() == 1,
                Error::unsupported(format!(
                    "only rank-1 arrays can be snapshotted, found rank {}",
                    array.rank()
                ))
            );
            array.items().to_vec()
        };
        let length = wire_len(items.len(), "array")?;
        self.enter()?;
        let block = self.arena.reserve(2 + items.len())?;
        self.identities.register(value, block);
        self.arena.set(block, SerialHandle::ArrayRank { rank: 1 })?;
        self.arena.set(
            slot(block, 1),
            SerialHandle::ArrayCount { length },
        )?;
        for (i, item) in items.iter().enumerate() {
            let handle = self.encode_value(item)?;
            self.arena.set(slot(block, 2 + i), handle)?;
        }
        self.leave();
        Ok(SerialHandle::Array { block })
    }
}
