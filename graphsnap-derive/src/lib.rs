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

//! # graphsnap derive macros
//!
//! `#[derive(GraphObject)]` implements `graphsnap_core::reflect::Reflect`
//! for a struct: it declares one persisted field per struct field, plus the
//! base level, hooks and keyed contract requested through `#[graph(...)]`.
//!
//! ## Container attributes
//!
//! - `#[graph(name = "scene::Camera")]`: stable type name written into
//!   forms. Defaults to the module path followed by the struct name.
//! - `#[graph(hook = "method")]`: registers `Self::method` as a hook;
//!   repeat for several hooks, which run in declaration order.
//! - `#[graph(keyed)]`: persist through `Keyed` instead of field by field.
//!
//! ## Field attributes
//!
//! - `#[graph(skip)]`: never persisted; restored as `Default`.
//! - `#[graph(base)]`: the embedded base level. Its fields follow this
//!   type's fields and its hooks run before this type's hooks.
//!
//! ```rust
//! use graphsnap_derive::GraphObject;
//! use graphsnap_core::{Error, HookContext};
//!
//! #[derive(GraphObject, Default)]
//! struct Node {
//!     name: String,
//! }
//!
//! #[derive(GraphObject, Default)]
//! #[graph(name = "scene::Light", hook = "sync")]
//! struct Light {
//!     intensity: f32,
//!     #[graph(base)]
//!     node: Node,
//!     #[graph(skip)]
//!     shadow_map: Option<Vec<u8>>,
//! }
//!
//! impl Light {
//!     fn sync(&mut self, _context: &mut HookContext) -> Result<(), Error> {
//!         Ok(())
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod object;

/// Derive macro implementing `Reflect` for graph snapshots.
///
/// Every persisted field type must implement `ToValue` and `FromValue`, and
/// the struct must implement `Default` for the blank instance the decoder
/// allocates. Generic structs are not supported.
#[proc_macro_derive(GraphObject, attributes(graph))]
pub fn proc_macro_derive_graph_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    object::derive_graph_object(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
