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

//! # graphsnap core
//!
//! Snapshot and restore of arbitrary, possibly cyclic object graphs.
//!
//! A snapshot is a [`SerializedForm`]: a flat arena of tagged handles, a
//! byte buffer holding every primitive and a table of the types involved.
//! Pointers become block indices, so shared references and cycles survive
//! the trip, and a form can be decoded any number of times.
//!
//! ## Modules
//!
//! - **`value`**: dynamic values, shared object and array handles
//! - **`reflect`**: per-type description through [`Reflect`] and [`Keyed`]
//! - **`resolver`**: process-wide type catalog, per-form type table,
//!   identity and instance maps
//! - **`arena`**: [`SerialHandle`] and the slot table
//! - **`buffer`**: little-endian `Writer` / `Reader`
//! - **`encoder`** / **`decoder`**: the two graph walkers
//! - **`hook`**: symmetric custom payloads and after-restore callbacks
//! - **`wire`**: byte envelope of a form
//! - **`snapshot`**: the configured [`Snapshotter`] entry point
//!
//! ## Walk order
//!
//! The encoder reserves a whole block before walking any of its content and
//! records the object's identity immediately, so a field leading back to an
//! object still being encoded becomes a back reference. The decoder mirrors
//! this: it allocates a blank instance, records it for its block, and only
//! then restores fields and replays hooks. Callbacks queued through
//! [`HookContext::run_after_restore`] run once the whole graph exists.
//!
//! Types are normally described with `#[derive(GraphObject)]` from the
//! `graphsnap` crate.

pub mod arena;
pub mod buffer;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod form;
pub mod hook;
pub mod reflect;
pub mod resolver;
pub mod snapshot;
pub mod types;
pub mod value;
pub mod wire;

pub use arena::{Arena, SerialHandle};
pub use config::Config;
pub use error::Error;
pub use form::SerializedForm;
pub use hook::HookContext;
pub use reflect::{GraphObject, Keyed, Reflect, SchemaBuilder};
pub use resolver::type_catalog::{TypeCatalog, TypeSchema};
pub use snapshot::{LiveSet, NothingLive, Snapshotter};
pub use types::PrimitiveKind;
pub use value::{shared, ArrayRef, FromValue, GraphArray, ObjectRef, Shared, ToValue, Value};
