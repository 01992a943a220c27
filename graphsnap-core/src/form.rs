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

use crate::arena::{Arena, SerialHandle};
use crate::resolver::type_table::TypeTable;

/// Immutable result of an encode pass.
///
/// A form owns no live objects. It can be decoded any number of times, each
/// decode building an independent graph.
#[derive(Clone, Debug)]
pub struct SerializedForm {
    pub(crate) types: TypeTable,
    pub(crate) arena: Arena,
    pub(crate) primitives: Vec<u8>,
    pub(crate) root: SerialHandle,
}

impl SerializedForm {
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Raw primitive buffer addressed by [`SerialHandle::Primitive`] offsets.
    pub fn primitives(&self) -> &[u8] {
        &self.primitives
    }

    /// Handle of the root value; kept outside the arena.
    pub fn root(&self) -> SerialHandle {
        self.root
    }
}
