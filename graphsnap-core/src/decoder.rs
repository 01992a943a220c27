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

//! Graph builder turning a [`SerializedForm`] back into live objects.

use crate::arena::SerialHandle;
use crate::buffer::Reader;
use crate::config::Config;
use crate::ensure;
use crate::error::Error;
use crate::form::SerializedForm;
use crate::hook::{AfterRestore, HookContext};
use crate::resolver::ref_resolver::InstanceMap;
use crate::resolver::type_catalog::TypeSchema;
use crate::resolver::type_table::TypeEntry;
use crate::types::PrimitiveKind;
use crate::value::{ArrayRef, GraphArray, Value};
use std::sync::Arc;

fn slot(block: u32, offset: usize) -> Result<u32, Error> {
    u32::try_from(offset)
        .ok()
        .and_then(|offset| block.checked_add(offset))
        .ok_or_else(|| Error::invalid_data(format!("block {block} + {offset} overflows")))
}

/// State of one decode pass. Each pass gets a fresh instance map, so one
/// form can be decoded into any number of independent graphs.
pub struct Decoder<'a> {
    config: &'a Config,
    form: &'a SerializedForm,
    primitives: Reader<'a>,
    instances: InstanceMap,
    after_restore: Vec<AfterRestore>,
    depth: u32,
}

impl<'a> Decoder<'a> {
    pub fn new(config: &'a Config, form: &'a SerializedForm) -> Decoder<'a> {
        Decoder {
            config,
            form,
            primitives: Reader::new(form.primitives()),
            instances: InstanceMap::new(),
            after_restore: Vec::new(),
            depth: 0,
        }
    }

    /// Rebuilds the root, then runs every queued after-restore callback once.
    pub fn decode(mut self) -> Result<Value, Error> {
        let root = self.decode_handle(self.form.root())?;
        log::debug!(
            "decoded {} instances, running {} after-restore callbacks",
            self.instances.len(),
            self.after_restore.len()
        );
        for callback in self.after_restore.drain(..) {
            callback();
        }
        Ok(root)
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

    fn handle_at(&self, block: u32, offset: usize) -> Result<SerialHandle, Error> {
        self.form.arena().get(slot(block, offset)?)
    }

    fn type_entry(&self, type_index: u32) -> Result<&'a TypeEntry, Error> {
        self.form
            .types()
            .get(type_index)
            .ok_or_else(|| Error::invalid_data(format!("type index {type_index} not in type table")))
    }

    fn decode_handle(&mut self, handle: SerialHandle) -> Result<Value, Error> {
        match handle {
            SerialHandle::Null | SerialHandle::OutsideReference => Ok(Value::Null),
            SerialHandle::Primitive { kind, offset } => self.read_primitive(kind, offset),
            SerialHandle::ReferenceToPrevious { block } => {
                self.instances.get(block).ok_or_else(|| {
                    Error::invalid_ref(format!("back reference to unbuilt block {block}"))
                })
            }
            SerialHandle::Reference { block } => self.guarded(|this| this.decode_object(block)),
            SerialHandle::Array { block } => self.guarded(|this| this.decode_array(block)),
            SerialHandle::SerializedFromKey { block } => {
                self.guarded(|this| this.decode_keyed(block))
            }
            SerialHandle::CustomSerializedObjects { block } => Err(Error::invalid_data(format!(
                "hook value list at block {block} found outside a hook slot"
            ))),
            header => Err(Error::invalid_data(format!(
                "block header {header:?} found in a value slot"
            ))),
        }
    }

    fn guarded(
        &mut self,
        decode: impl FnOnce(&mut Self) -> Result<Value, Error>,
    ) -> Result<Value, Error> {
        self.enter()?;
        let value = decode(self)?;
        self.leave();
        Ok(value)
    }

    fn read_primitive(&mut self, kind: PrimitiveKind, offset: u32) -> Result<Value, Error> {
        if let PrimitiveKind::Unsupported(tag) = kind {
            log::warn!("unsupported primitive kind {tag} at offset {offset}; restored as null");
            return Ok(Value::Null);
        }
        let reader = &mut self.primitives;
        reader.set_cursor(offset as usize)?;
        let value = match kind {
            PrimitiveKind::Bool => Value::Bool(reader.read_bool()?),
            PrimitiveKind::I8 => Value::I8(reader.read_i8()?),
            PrimitiveKind::U8 => Value::U8(reader.read_u8()?),
            PrimitiveKind::I16 => Value::I16(reader.read_i16()?),
            PrimitiveKind::U16 => Value::U16(reader.read_u16()?),
            PrimitiveKind::I32 => Value::I32(reader.read_i32()?),
            PrimitiveKind::U32 => Value::U32(reader.read_u32()?),
            PrimitiveKind::I64 => Value::I64(reader.read_i64()?),
            PrimitiveKind::U64 => Value::U64(reader.read_u64()?),
            PrimitiveKind::F32 => Value::F32(reader.read_f32()?),
            PrimitiveKind::F64 => Value::F64(reader.read_f64()?),
            PrimitiveKind::Char => {
                let raw = reader.read_u32()?;
                Value::Char(char::from_u32(raw).ok_or_else(|| {
                    Error::invalid_data(format!("{raw:#x} is not a unicode scalar value"))
                })?)
            }
            PrimitiveKind::String => Value::String(reader.read_utf8_string()?),
            PrimitiveKind::Unsupported(_) => Value::Null,
        };
        Ok(value)
    }

    /// Schema of a block header's type, or `None` after recording the block
    /// as null when this process does not know the type.
    fn resolve_schema(
        &mut self,
        block: u32,
        type_index: u32,
    ) -> Result<Option<Arc<TypeSchema>>, Error> {
        let entry = self.type_entry(type_index)?;
        match entry.schema() {
            Some(schema) => Ok(Some(schema.clone())),
            None => {
                log::warn!(
                    "cannot allocate an instance of unknown type {} at block {block}; restored as null",
                    entry.name()
                );
                self.instances.store(block, Value::Null);
                Ok(None)
            }
        }
    }

    fn decode_object(&mut self, block: u32) -> Result<Value, Error> {
        let SerialHandle::ObjectType { type_index } = self.handle_at(block, 0)? else {
            return Err(Error::invalid_data(format!(
                "block {block} does not start with an object header"
            )));
        };
        let Some(schema) = self.resolve_schema(block, type_index)? else {
            self.walk_unknown(block, self.type_entry(type_index)?)?;
            return Ok(Value::Null);
        };

        let instance = schema.blank();
        let value = Value::Object(instance.clone());
        self.instances.store(block, value.clone());

        let fields = schema.fields();
        for (i, field) in fields.iter().enumerate() {
            let field_value = self.decode_handle(self.handle_at(block, 1 + i)?)?;
            if field_value.is_null() {
                continue;
            }
            field.set(instance.try_borrow_mut()?.as_any_mut(), field_value)?;
        }

        for (i, hook) in schema.hooks().iter().enumerate() {
            let (type_index, values) = self.decode_hook_list(block, 1 + fields.len() + i)?;
            let declaring = self.type_entry(type_index)?;
            if let Some(declaring) = declaring.schema() {
                ensure!(
                    declaring.type_id() == hook.declaring_type_id(),
                    Error::type_mismatch(hook.declaring_type(), declaring.name())
                );
            }
            let mut context = HookContext::replaying(schema.name(), hook.name(), values);
            hook.invoke(instance.try_borrow_mut()?.as_any_mut(), &mut context)?;
            self.after_restore.extend(context.finish_replay()?);
        }
        Ok(value)
    }

    /// Decodes the value list behind a hook slot, returning the declaring
    /// type index recorded in its header.
    fn decode_hook_list(&mut self, block: u32, offset: usize) -> Result<(u32, Vec<Value>), Error> {
        let SerialHandle::CustomSerializedObjects { block: list } = self.handle_at(block, offset)?
        else {
            return Err(Error::invalid_data(format!(
                "slot {offset} of block {block} holds no hook value list"
            )));
        };
        let SerialHandle::CustomSerializedObjectsCount { type_index, count } =
            self.handle_at(list, 0)?
        else {
            return Err(Error::invalid_data(format!(
                "block {list} does not start with a hook list header"
            )));
        };
        let mut values = Vec::with_capacity((count as usize).min(self.form.arena().len()));
        for j in 0..count as usize {
            values.push(self.decode_handle(self.handle_at(list, 1 + j)?)?);
        }
        Ok((type_index, values))
    }

    /// Walks the fields and hook lists of a block whose type is unknown here.
    /// Objects first written inside it are still built, so back references
    /// from sibling slots resolve; the values themselves are dropped.
    fn walk_unknown(&mut self, block: u32, entry: &TypeEntry) -> Result<(), Error> {
        let fields = entry.field_count() as usize;
        for i in 0..fields {
            self.decode_handle(self.handle_at(block, 1 + i)?)?;
        }
        for i in 0..entry.hook_count() as usize {
            self.decode_hook_list(block, 1 + fields + i)?;
        }
        Ok(())
    }

    fn decode_array(&mut self, block: u32) -> Result<Value, Error> {
        let SerialHandle::ArrayRank { rank } = self.handle_at(block, 0)? else {
            return Err(Error::invalid_data(format!(
                "block {block} does not start with an array header"
            )));
        };
        ensure!(
            rank == 1,
            Error::unsupported(format!("only rank-1 arrays can be restored, found rank {rank}"))
        );
        let SerialHandle::ArrayCount { length } = self.handle_at(block, 1)? else {
            return Err(Error::invalid_data(format!(
                "array block {block} is missing its length"
            )));
        };
        let length = length as usize;
        ensure!(
            slot(block, 2 + length)? as usize <= self.form.arena().len(),
            Error::invalid_data(format!("array block {block} of {length} runs past the arena"))
        );

        let array = ArrayRef::new(GraphArray::new(vec![Value::Null; length]));
        let value = Value::Array(array.clone());
        self.instances.store(block, value.clone());
        for i in 0..length {
            let item = self.decode_handle(self.handle_at(block, 2 + i)?)?;
            array.try_borrow_mut()?.set(i, item)?;
        }
        Ok(value)
    }

    fn decode_keyed(&mut self, block: u32) -> Result<Value, Error> {
        let SerialHandle::KeyType { type_index } = self.handle_at(block, 0)? else {
            return Err(Error::invalid_data(format!(
                "block {block} does not start with a key header"
            )));
        };
        let descriptor = self.decode_handle(self.handle_at(block, 1)?)?;
        let Some(schema) = self.resolve_schema(block, type_index)? else {
            return Ok(Value::Null);
        };
        let Some(keyed) = schema.keyed() else {
            log::warn!(
                "{} at block {block} has no keyed reconstruction; restored as null",
                schema.name()
            );
            self.instances.store(block, Value::Null);
            return Ok(Value::Null);
        };

        let value = if descriptor.is_null() {
            Value::Null
        } else {
            match keyed.rebuild(descriptor) {
                Ok(instance) => Value::Object(instance),
                Err(e) => {
                    log::warn!(
                        "factory of {} rejected its descriptor at block {block}: {e}; restored as null",
                        schema.name()
                    );
                    Value::Null
                }
            }
        };
        self.instances.store(block, value.clone());
        Ok(value)
    }
}
