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

/// Default nesting limit. A debug build on a 2 MiB test thread overflows
/// between 250 and 300 nested objects.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

/// Options shared by the encoder and decoder of one [`crate::Snapshotter`].
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum nesting of objects and arrays walked in one pass. Both walks
    /// recurse once per level, so the limit must fit the caller's stack.
    pub max_depth: u32,
    /// Whether a keyed object reached twice is stored once and restored as
    /// one instance. When off, the factory runs once per occurrence.
    pub share_keyed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            share_keyed: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline(always)]
    pub fn is_share_keyed(&self) -> bool {
        self.share_keyed
    }
}
