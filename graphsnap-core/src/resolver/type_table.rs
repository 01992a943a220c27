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

use crate::error::Error;
use crate::resolver::type_catalog::{TypeCatalog, TypeSchema};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// One row of a form's type table.
#[derive(Clone, Debug)]
pub struct TypeEntry {
    name: String,
    field_count: u32,
    hook_count: u32,
    schema: Option<Arc<TypeSchema>>,
}

impl TypeEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_count(&self) -> u32 {
        self.field_count
    }

    pub fn hook_count(&self) -> u32 {
        self.hook_count
    }

    /// Local schema, `None` when the name is unknown to this process.
    pub fn schema(&self) -> Option<&Arc<TypeSchema>> {
        self.schema.as_ref()
    }
}

/// Dense type indices of one form, in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
    index_of: HashMap<TypeId, u32>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `schema`, appending it on first sight.
    pub fn register(&mut self, schema: &Arc<TypeSchema>) -> u32 {
        if let Some(&index) = self.index_of.get(&schema.type_id()) {
            return index;
        }
        let index = self.entries.len() as u32;
        self.entries.push(TypeEntry {
            name: schema.name().to_string(),
            field_count: schema.fields().len() as u32,
            hook_count: schema.hooks().len() as u32,
            schema: Some(schema.clone()),
        });
        self.index_of.insert(schema.type_id(), index);
        index
    }

    /// Appends an entry read from bytes, resolving it against the catalog.
    ///
    /// An unknown name is kept without a schema; its instances decode to
    /// null. A known name whose shape differs from the local type is an error.
    pub fn push_remote(
        &mut self,
        name: String,
        field_count: u32,
        hook_count: u32,
    ) -> Result<u32, Error> {
        let schema = TypeCatalog::global().lookup_by_name(&name);
        if let Some(local) = &schema {
            let (local_fields, local_hooks) = (local.fields().len(), local.hooks().len());
            if local_fields != field_count as usize || local_hooks != hook_count as usize {
                return Err(Error::type_mismatch(
                    format!("{name} with {local_fields} fields and {local_hooks} hooks"),
                    format!("{field_count} fields and {hook_count} hooks"),
                ));
            }
            self.index_of.insert(local.type_id(), self.entries.len() as u32);
        } else {
            log::warn!("type {name} is not registered in this process; its instances restore as null");
        }
        let index = self.entries.len() as u32;
        self.entries.push(TypeEntry {
            name,
            field_count,
            hook_count,
            schema,
        });
        Ok(index)
    }

    pub fn get(&self, index: u32) -> Option<&TypeEntry> {
        self.entries.get(index as usize)
    }

    pub fn entries(&self) -> &[TypeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
