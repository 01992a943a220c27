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

use crate::value::Value;
use std::collections::HashMap;

/// Identity map of an encode pass: live object or array -> block start.
///
/// Every registered value is retained until the pass ends so that its
/// allocation, and therefore its address, cannot be reused by a temporary
/// produced later in the same pass (a `Vec` field converts to a fresh array
/// on every read).
///
/// ```rust
/// use graphsnap_core::resolver::ref_resolver::IdentityMap;
/// use graphsnap_core::value::{ArrayRef, Value};
///
/// let mut identities = IdentityMap::new();
/// let array = Value::Array(ArrayRef::from_items(vec![]));
///
/// assert_eq!(identities.block_of(&array), None);
/// identities.register(&array, 7);
/// assert_eq!(identities.block_of(&array.clone()), Some(7));
/// ```
#[derive(Default)]
pub struct IdentityMap {
    blocks: HashMap<usize, u32>,
    retained: Vec<Value>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn identity(value: &Value) -> Option<usize> {
        match value {
            Value::Object(obj) => Some(obj.addr()),
            Value::Array(arr) => Some(arr.addr()),
            _ => None,
        }
    }

    /// Block start of an already-walked object or array.
    pub fn block_of(&self, value: &Value) -> Option<u32> {
        Self::identity(value).and_then(|addr| self.blocks.get(&addr).copied())
    }

    /// Must be called as soon as the block is reserved, before its content is walked.
    pub fn register(&mut self, value: &Value, block: u32) {
        if let Some(addr) = Self::identity(value) {
            self.blocks.insert(addr, block);
            self.retained.push(value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Instance map of a decode pass: block start -> instance built for it.
#[derive(Default)]
pub struct InstanceMap {
    instances: HashMap<u32, Value>,
}

impl InstanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called as soon as the blank instance exists, before it is populated.
    pub fn store(&mut self, block: u32, instance: Value) {
        self.instances.insert(block, instance);
    }

    pub fn get(&self, block: u32) -> Option<Value> {
        self.instances.get(&block).cloned()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
