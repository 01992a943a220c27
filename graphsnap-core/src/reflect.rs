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

//! Per-type description: which fields a type persists, which hooks it runs
//! and whether it is rebuilt from a key.
//!
//! Types describe themselves once through [`Reflect::describe`], normally
//! generated by `#[derive(GraphObject)]`. Embedding plays the role of
//! inheritance: a field marked as the base contributes its own fields after
//! the embedding type's fields, and its hooks before the embedding type's
//! hooks.
//!
//! ```rust
//! use graphsnap_core::reflect::{Reflect, SchemaBuilder};
//! use graphsnap_core::value::{FromValue, ToValue, Value};
//!
//! #[derive(Default)]
//! struct Transform {
//!     x: f32,
//!     y: f32,
//! }
//!
//! impl Reflect for Transform {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema.field("x", |t: &Transform| t.x.to_value(), |t: &mut Transform, v: Value| {
//!             t.x = f32::from_value(v)?;
//!             Ok(())
//!         });
//!         schema.field("y", |t: &Transform| t.y.to_value(), |t: &mut Transform, v: Value| {
//!             t.y = f32::from_value(v)?;
//!             Ok(())
//!         });
//!     }
//! }
//! ```

use crate::error::Error;
use crate::hook::HookContext;
use crate::resolver::type_catalog::{FieldAccessor, HookAccessor, KeyedAccessor, TypeCatalog};
use crate::value::{ObjectRef, Value};
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

/// Object-safe view of a described type, implemented for every [`Reflect`] type.
pub trait GraphObject: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn graph_type_name(&self) -> &'static str;
}

impl<T: Reflect> GraphObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn graph_type_name(&self) -> &'static str {
        T::type_name()
    }
}

/// A type whose instances can take part in a snapshot.
///
/// `Default` provides the blank instance the decoder allocates before any
/// field is restored.
pub trait Reflect: Default + 'static {
    /// Stable name recorded in serialized type tables.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn describe(schema: &mut SchemaBuilder<Self>);
}

/// Keyed reconstruction: an instance is persisted as a small descriptor and
/// rebuilt through a factory instead of field by field.
///
/// A `Value::Null` descriptor restores as null without calling the factory.
pub trait Keyed: Reflect {
    fn descriptor(&self) -> Value;

    fn from_descriptor(descriptor: Value) -> Result<Self, Error>;
}

pub(crate) fn downcast_ref<T: 'static>(any: &dyn Any) -> Result<&T, Error> {
    any.downcast_ref::<T>()
        .ok_or_else(|| Error::type_mismatch(std::any::type_name::<T>(), "another graph type"))
}

pub(crate) fn downcast_mut<T: 'static>(any: &mut dyn Any) -> Result<&mut T, Error> {
    any.downcast_mut::<T>()
        .ok_or_else(|| Error::type_mismatch(std::any::type_name::<T>(), "another graph type"))
}

pub type HookFn<T> = fn(&mut T, &mut HookContext) -> Result<(), Error>;

/// Collects the description of one type while [`Reflect::describe`] runs.
pub struct SchemaBuilder<T> {
    fields: Vec<FieldAccessor>,
    skipped: Vec<&'static str>,
    hooks: Vec<HookAccessor>,
    base: Option<BaseLevel>,
    keyed: Option<KeyedAccessor>,
    _marker: PhantomData<fn(T)>,
}

struct BaseLevel {
    name: &'static str,
    fields: Vec<FieldAccessor>,
    skipped: Vec<&'static str>,
    hooks: Vec<HookAccessor>,
}

/// Flattened result of a description, most-derived fields first and
/// most-base hooks first.
pub(crate) struct Described {
    pub fields: Vec<FieldAccessor>,
    pub skipped: Vec<&'static str>,
    pub hooks: Vec<HookAccessor>,
    pub base: Option<&'static str>,
    pub keyed: Option<KeyedAccessor>,
}

impl<T: Reflect> SchemaBuilder<T> {
    pub(crate) fn new() -> SchemaBuilder<T> {
        SchemaBuilder {
            fields: Vec::new(),
            skipped: Vec::new(),
            hooks: Vec::new(),
            base: None,
            keyed: None,
            _marker: PhantomData,
        }
    }

    /// Declares a persisted field with its getter and setter.
    pub fn field<G, S>(&mut self, name: &'static str, get: G, set: S) -> &mut Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.fields.push(FieldAccessor::new(
            name,
            T::type_name(),
            Arc::new(move |any: &dyn Any| -> Result<Value, Error> {
                Ok(get(downcast_ref::<T>(any)?))
            }),
            Arc::new(move |any: &mut dyn Any, value: Value| -> Result<(), Error> {
                set(downcast_mut::<T>(any)?, value)
                    .map_err(|e| Error::enhance_type_error::<T>(e))
            }),
        ));
        self
    }

    /// Records a field that is never persisted.
    pub fn skip(&mut self, name: &'static str) -> &mut Self {
        self.skipped.push(name);
        self
    }

    /// Declares the embedded base level.
    pub fn base<B: Reflect>(
        &mut self,
        project: fn(&T) -> &B,
        project_mut: fn(&mut T) -> &mut B,
    ) -> &mut Self {
        if let Some(existing) = &self.base {
            log::warn!(
                "{} declares a second base {} after {}; ignored",
                T::type_name(),
                B::type_name(),
                existing.name
            );
            return self;
        }
        let base = TypeCatalog::global().schema_of::<B>();
        self.base = Some(BaseLevel {
            name: base.name(),
            fields: base
                .fields()
                .iter()
                .map(|f| f.project(project, project_mut))
                .collect(),
            skipped: base.skipped().to_vec(),
            hooks: base.hooks().iter().map(|h| h.project(project_mut)).collect(),
        });
        self
    }

    /// Declares a hook of this level, run after all fields in both directions.
    pub fn hook(&mut self, name: &'static str, hook: HookFn<T>) -> &mut Self {
        self.hooks.push(HookAccessor::new(
            name,
            T::type_name(),
            TypeId::of::<T>(),
            crate::resolver::type_catalog::schema_fn::<T>,
            Arc::new(move |any: &mut dyn Any, context: &mut HookContext| -> Result<(), Error> {
                hook(downcast_mut::<T>(any)?, context)
            }),
        ));
        self
    }

    pub(crate) fn finish(self) -> Described {
        let type_name = T::type_name();
        let SchemaBuilder {
            mut fields,
            mut skipped,
            hooks: own_hooks,
            base,
            keyed,
            ..
        } = self;

        let mut hooks = Vec::new();
        let mut base_name = None;
        if let Some(base) = base {
            fields.extend(base.fields);
            skipped.extend(base.skipped);
            hooks = base.hooks;
            base_name = Some(base.name);
        }

        let inherited: HashSet<&'static str> = hooks.iter().map(|h| h.name()).collect();
        let mut declared = HashSet::new();
        for hook in own_hooks {
            if inherited.contains(hook.name()) {
                log::warn!(
                    "hook {}::{} overrides a base hook of the same name; excluded",
                    type_name,
                    hook.name()
                );
                continue;
            }
            if !declared.insert(hook.name()) {
                log::warn!(
                    "hook {}::{} is declared twice; the duplicate is excluded",
                    type_name,
                    hook.name()
                );
                continue;
            }
            hooks.push(hook);
        }

        Described {
            fields,
            skipped,
            hooks,
            base: base_name,
            keyed,
        }
    }
}

impl<T: Keyed> SchemaBuilder<T> {
    /// Persists instances through [`Keyed::descriptor`] and [`Keyed::from_descriptor`].
    pub fn keyed(&mut self) -> &mut Self {
        self.keyed = Some(KeyedAccessor::new(keyed_descriptor::<T>, keyed_factory::<T>));
        self
    }
}

fn keyed_descriptor<T: Keyed>(any: &dyn Any) -> Result<Value, Error> {
    Ok(downcast_ref::<T>(any)?.descriptor())
}

fn keyed_factory<T: Keyed>(descriptor: Value) -> Result<ObjectRef, Error> {
    T::from_descriptor(descriptor).map(ObjectRef::new)
}
