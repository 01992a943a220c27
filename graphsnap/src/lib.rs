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

//! # graphsnap
//!
//! Snapshot a live object graph into an addressable intermediate form and
//! rebuild an equivalent graph from it later. Shared references, cycles,
//! polymorphic nodes and per-type custom payloads all survive the trip.
//!
//! ## Key Features
//!
//! - **Identity preserving**: every object is stored once; further
//!   references become back references, so cycles and sharing survive
//! - **Hooks**: one method per type that runs symmetrically while encoding
//!   and decoding, for state that is not a plain field
//! - **Keyed reconstruction**: wrappers around external resources persist a
//!   small descriptor and are rebuilt through a factory
//! - **Live set cut**: objects that belong to the running scene are never
//!   captured
//!
//! ## Describing types
//!
//! ```rust
//! use graphsnap::{GraphObject, Shared, Snapshotter};
//!
//! #[derive(GraphObject, Default)]
//! struct Transform {
//!     x: f32,
//!     y: f32,
//! }
//!
//! #[derive(GraphObject, Default)]
//! struct Entity {
//!     name: String,
//!     transform: Option<Shared<Transform>>,
//!     parent: Option<Shared<Entity>>,
//!     #[graph(skip)]
//!     frame_counter: u64,
//! }
//!
//! # fn main() -> Result<(), graphsnap::Error> {
//! let transform = graphsnap::shared(Transform { x: 1.0, y: 2.0 });
//! let root = graphsnap::shared(Entity {
//!     name: "root".to_string(),
//!     transform: Some(transform.clone()),
//!     parent: None,
//!     frame_counter: 99,
//! });
//!
//! let snapshotter = Snapshotter::default();
//! let form = snapshotter.encode(&root)?;
//! let restored: Shared<Entity> = snapshotter.decode_as(&form)?;
//!
//! let restored = restored.borrow();
//! assert_eq!(restored.name, "root");
//! assert_eq!(restored.frame_counter, 0);
//! assert_eq!(restored.transform.as_ref().unwrap().borrow().y, 2.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Hooks
//!
//! `#[graph(hook = "method")]` registers a method with the signature
//! `fn(&mut self, &mut HookContext) -> Result<(), Error>`. Every value it
//! passes through [`HookContext::exchange`] is recorded while encoding and
//! handed back, in the same order, while decoding.
//!
//! ```rust
//! use graphsnap::{Error, GraphObject, HookContext};
//!
//! #[derive(GraphObject, Default)]
//! #[graph(hook = "sync_mesh")]
//! struct Mesh {
//!     #[graph(skip)]
//!     vertices: Vec<f32>,
//!     #[graph(skip)]
//!     gpu_dirty: bool,
//! }
//!
//! impl Mesh {
//!     fn sync_mesh(&mut self, context: &mut HookContext) -> Result<(), Error> {
//!         self.vertices = context.exchange_as(std::mem::take(&mut self.vertices))?;
//!         if context.is_restoring() {
//!             self.gpu_dirty = true;
//!         }
//!         Ok(())
//!     }
//! }
//! ```
//!
//! ## Keyed reconstruction
//!
//! ```rust
//! use graphsnap::{Error, GraphObject, Keyed, Value};
//!
//! #[derive(GraphObject, Default)]
//! #[graph(keyed)]
//! struct TextureHandle {
//!     #[graph(skip)]
//!     path: String,
//! }
//!
//! impl Keyed for TextureHandle {
//!     fn descriptor(&self) -> Value {
//!         Value::from(self.path.as_str())
//!     }
//!
//!     fn from_descriptor(descriptor: Value) -> Result<Self, Error> {
//!         Ok(TextureHandle {
//!             path: graphsnap::FromValue::from_value(descriptor)?,
//!         })
//!     }
//! }
//! ```
//!
//! ## Bytes
//!
//! [`SerializedForm::to_bytes`] and [`SerializedForm::from_bytes`] move a
//! form through a binary envelope. Types are looked up by name when reading,
//! so register them first with [`Snapshotter::register`].

pub use graphsnap_core::{
    error::Error, shared, ArrayRef, FromValue, GraphArray, HookContext, Keyed, LiveSet,
    NothingLive, ObjectRef, Reflect, SchemaBuilder, SerializedForm, Shared, Snapshotter, ToValue,
    TypeCatalog, Value,
};
pub use graphsnap_derive::GraphObject;
