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

use crate::config::Config;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Error;
use crate::form::SerializedForm;
use crate::reflect::Reflect;
use crate::resolver::type_catalog::{TypeCatalog, TypeSchema};
use crate::value::{ObjectRef, Shared, Value};
use std::sync::Arc;

/// Tells the encoder which objects belong to the running scene.
///
/// A live object is never snapshotted: a reference to one is stored as an
/// outside reference and restores as null. Any `Fn(&ObjectRef) -> bool`
/// closure is a `LiveSet`.
pub trait LiveSet {
    fn is_live(&self, object: &ObjectRef) -> bool;
}

/// A live set that contains nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NothingLive;

impl LiveSet for NothingLive {
    fn is_live(&self, _object: &ObjectRef) -> bool {
        false
    }
}

impl<F> LiveSet for F
where
    F: Fn(&ObjectRef) -> bool,
{
    fn is_live(&self, object: &ObjectRef) -> bool {
        self(object)
    }
}

/// Entry point: snapshots object graphs and restores them.
///
/// # Examples
///
/// ```rust
/// use graphsnap_core::reflect::{Reflect, SchemaBuilder};
/// use graphsnap_core::value::{shared, FromValue, Shared, ToValue, Value};
/// use graphsnap_core::Snapshotter;
///
/// #[derive(Default)]
/// struct Node {
///     next: Option<Shared<Node>>,
/// }
///
/// impl Reflect for Node {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.field("next", |n: &Node| n.next.to_value(), |n: &mut Node, v: Value| {
///             n.next = FromValue::from_value(v)?;
///             Ok(())
///         });
///     }
/// }
///
/// let node = shared(Node::default());
/// node.borrow_mut().next = Some(node.clone());
///
/// let snapshotter = Snapshotter::default().max_depth(64);
/// let form = snapshotter.encode(&node).unwrap();
/// let restored: Shared<Node> = snapshotter.decode_as(&form).unwrap();
/// let next = restored.borrow().next.clone().unwrap();
/// assert!(std::rc::Rc::ptr_eq(&next, &restored));
/// # node.borrow_mut().next = None;
/// # restored.borrow_mut().next = None;
/// ```
#[derive(Clone, Debug, Default)]
pub struct Snapshotter {
    config: Config,
}

impl Snapshotter {
    /// Bounds object and array nesting in both directions. Defaults to
    /// [`crate::config::DEFAULT_MAX_DEPTH`]; raise it only on threads with a larger stack.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Stores a keyed object reached through several paths once, so it
    /// restores as one shared instance. Off by default: the factory then
    /// runs once per occurrence.
    pub fn share_keyed(mut self, share_keyed: bool) -> Self {
        self.config.share_keyed = share_keyed;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers `T` by name so forms read from bytes can instantiate it.
    pub fn register<T: Reflect>(&self) -> Result<Arc<TypeSchema>, Error> {
        TypeCatalog::global().register::<T>()
    }

    /// Snapshots the graph reachable from `root`, treating nothing as live.
    pub fn encode(&self, root: impl Into<ObjectRef>) -> Result<SerializedForm, Error> {
        self.encode_with(root, &NothingLive)
    }

    /// Snapshots the graph reachable from `root`. References to objects in
    /// `live` become outside references; a live root is an error.
    pub fn encode_with(
        &self,
        root: impl Into<ObjectRef>,
        live: &dyn LiveSet,
    ) -> Result<SerializedForm, Error> {
        Encoder::new(&self.config, live).encode(&root.into())
    }

    /// Builds a fresh live graph from `form` and returns its root.
    pub fn decode(&self, form: &SerializedForm) -> Result<Value, Error> {
        Decoder::new(&self.config, form).decode()
    }

    pub fn decode_as<T: Reflect>(&self, form: &SerializedForm) -> Result<Shared<T>, Error> {
        match self.decode(form)? {
            Value::Object(obj) => obj
                .downcast::<T>()
                .ok_or_else(|| Error::type_mismatch(T::type_name(), obj.type_name())),
            other => Err(Error::type_mismatch(T::type_name(), other.kind_name())),
        }
    }

    /// Encodes and serializes in one step.
    pub fn to_bytes(&self, root: impl Into<ObjectRef>) -> Result<Vec<u8>, Error> {
        Ok(self.encode(root)?.to_bytes())
    }

    /// Parses and decodes in one step.
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<Value, Error> {
        self.decode(&SerializedForm::from_bytes(bytes)?)
    }
}
