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

//! Process-wide catalog of type schemas.
//!
//! A schema is built the first time a type is met (or registered) and is
//! never evicted. The catalog is append-only, so concurrent encode and
//! decode passes on different graphs can share it.

use crate::error::Error;
use crate::hook::HookContext;
use crate::reflect::{downcast_mut, downcast_ref, Reflect, SchemaBuilder};
use crate::value::{ObjectRef, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

type GetFn = Arc<dyn Fn(&dyn Any) -> Result<Value, Error> + Send + Sync>;
type SetFn = Arc<dyn Fn(&mut dyn Any, Value) -> Result<(), Error> + Send + Sync>;
type ErasedHookFn = Arc<dyn Fn(&mut dyn Any, &mut HookContext) -> Result<(), Error> + Send + Sync>;
type DescriptorFn = fn(&dyn Any) -> Result<Value, Error>;
type FactoryFn = fn(Value) -> Result<ObjectRef, Error>;
type BlankFn = fn() -> ObjectRef;

pub(crate) fn schema_fn<T: Reflect>() -> Arc<TypeSchema> {
    TypeCatalog::global().schema_of::<T>()
}

fn blank_instance<T: Reflect>() -> ObjectRef {
    ObjectRef::new(T::default())
}

/// Reads and writes one persisted field.
#[derive(Clone)]
pub struct FieldAccessor {
    name: &'static str,
    declaring_type: &'static str,
    get: GetFn,
    set: SetFn,
}

impl FieldAccessor {
    pub(crate) fn new(
        name: &'static str,
        declaring_type: &'static str,
        get: GetFn,
        set: SetFn,
    ) -> FieldAccessor {
        FieldAccessor {
            name,
            declaring_type,
            get,
            set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    #[inline(always)]
    pub fn get(&self, object: &dyn Any) -> Result<Value, Error> {
        (self.get)(object)
    }

    #[inline(always)]
    pub fn set(&self, object: &mut dyn Any, value: Value) -> Result<(), Error> {
        (self.set)(object, value)
    }

    /// Lifts a base-level accessor onto the embedding type.
    pub(crate) fn project<T: 'static, B: 'static>(
        &self,
        project: fn(&T) -> &B,
        project_mut: fn(&mut T) -> &mut B,
    ) -> FieldAccessor {
        let get = self.get.clone();
        let set = self.set.clone();
        FieldAccessor {
            name: self.name,
            declaring_type: self.declaring_type,
            get: Arc::new(move |any: &dyn Any| -> Result<Value, Error> {
                get(project(downcast_ref::<T>(any)?))
            }),
            set: Arc::new(move |any: &mut dyn Any, value: Value| -> Result<(), Error> {
                set(project_mut(downcast_mut::<T>(any)?), value)
            }),
        }
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// A hook bound to the level that declares it.
#[derive(Clone)]
pub struct HookAccessor {
    name: &'static str,
    declaring_type: &'static str,
    declaring_type_id: TypeId,
    declaring_schema: fn() -> Arc<TypeSchema>,
    invoke: ErasedHookFn,
}

impl HookAccessor {
    pub(crate) fn new(
        name: &'static str,
        declaring_type: &'static str,
        declaring_type_id: TypeId,
        declaring_schema: fn() -> Arc<TypeSchema>,
        invoke: ErasedHookFn,
    ) -> HookAccessor {
        HookAccessor {
            name,
            declaring_type,
            declaring_type_id,
            declaring_schema,
            invoke,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    pub fn declaring_type_id(&self) -> TypeId {
        self.declaring_type_id
    }

    pub(crate) fn declaring_schema(&self) -> Arc<TypeSchema> {
        (self.declaring_schema)()
    }

    #[inline(always)]
    pub fn invoke(&self, object: &mut dyn Any, context: &mut HookContext) -> Result<(), Error> {
        (self.invoke)(object, context)
    }

    pub(crate) fn project<T: 'static, B: 'static>(
        &self,
        project_mut: fn(&mut T) -> &mut B,
    ) -> HookAccessor {
        let invoke = self.invoke.clone();
        HookAccessor {
            invoke: Arc::new(
                move |any: &mut dyn Any, context: &mut HookContext| -> Result<(), Error> {
                    invoke(project_mut(downcast_mut::<T>(any)?), context)
                },
            ),
            ..self.clone()
        }
    }
}

impl fmt::Debug for HookAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// Descriptor getter and factory of a keyed type.
#[derive(Clone, Copy)]
pub struct KeyedAccessor {
    descriptor: DescriptorFn,
    factory: FactoryFn,
}

impl KeyedAccessor {
    pub(crate) fn new(descriptor: DescriptorFn, factory: FactoryFn) -> KeyedAccessor {
        KeyedAccessor {
            descriptor,
            factory,
        }
    }

    #[inline(always)]
    pub fn descriptor(&self, object: &dyn Any) -> Result<Value, Error> {
        (self.descriptor)(object)
    }

    #[inline(always)]
    pub fn rebuild(&self, descriptor: Value) -> Result<ObjectRef, Error> {
        (self.factory)(descriptor)
    }
}

/// Everything the encoder and decoder need to know about one type.
pub struct TypeSchema {
    name: &'static str,
    type_id: TypeId,
    fields: Vec<FieldAccessor>,
    skipped: Vec<&'static str>,
    hooks: Vec<HookAccessor>,
    base: Option<&'static str>,
    keyed: Option<KeyedAccessor>,
    blank: BlankFn,
}

impl TypeSchema {
    fn build<T: Reflect>() -> TypeSchema {
        let mut builder = SchemaBuilder::<T>::new();
        T::describe(&mut builder);
        let described = builder.finish();
        TypeSchema {
            name: T::type_name(),
            type_id: TypeId::of::<T>(),
            fields: described.fields,
            skipped: described.skipped,
            hooks: described.hooks,
            base: described.base,
            keyed: described.keyed,
            blank: blank_instance::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Most-derived level first.
    pub fn fields(&self) -> &[FieldAccessor] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Fields opted out of persistence, kept for diagnostics.
    pub fn skipped(&self) -> &[&'static str] {
        &self.skipped
    }

    /// Most-base level first.
    pub fn hooks(&self) -> &[HookAccessor] {
        &self.hooks
    }

    pub fn base(&self) -> Option<&'static str> {
        self.base
    }

    pub fn keyed(&self) -> Option<&KeyedAccessor> {
        self.keyed.as_ref()
    }

    pub fn is_keyed(&self) -> bool {
        self.keyed.is_some()
    }

    /// Allocates a default instance before any field is restored.
    pub fn blank(&self) -> ObjectRef {
        (self.blank)()
    }
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("skipped", &self.skipped)
            .field("hooks", &self.hooks)
            .field("base", &self.base)
            .field("keyed", &self.keyed.is_some())
            .finish()
    }
}

#[derive(Default)]
struct CatalogInner {
    by_type: HashMap<TypeId, Arc<TypeSchema>>,
    by_name: HashMap<&'static str, Arc<TypeSchema>>,
}

/// Registry of every described type seen by this process.
#[derive(Default)]
pub struct TypeCatalog {
    inner: RwLock<CatalogInner>,
}

impl TypeCatalog {
    pub fn global() -> &'static TypeCatalog {
        static CATALOG: OnceLock<TypeCatalog> = OnceLock::new();
        CATALOG.get_or_init(TypeCatalog::default)
    }

    // entries are only ever added, so a poisoned lock still guards a consistent map
    fn read(&self) -> RwLockReadGuard<'_, CatalogInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the schema of `T`, building and caching it on first use.
    /// A name already taken by another type is logged and keeps its owner.
    pub fn schema_of<T: Reflect>(&self) -> Arc<TypeSchema> {
        match self.insert::<T>() {
            Ok(schema) => schema,
            Err((schema, owner)) => {
                log::warn!(
                    "type name {} of {} is already taken by {:?}; lookups by name resolve to the first",
                    schema.name,
                    std::any::type_name::<T>(),
                    owner
                );
                schema
            }
        }
    }

    /// Registers `T` eagerly so forms read from bytes can resolve it by name.
    pub fn register<T: Reflect>(&self) -> Result<Arc<TypeSchema>, Error> {
        self.insert::<T>().map_err(|(schema, _)| {
            Error::type_error(format!(
                "type name {} is already registered for another type",
                schema.name
            ))
        })
    }

    fn insert<T: Reflect>(&self) -> Result<Arc<TypeSchema>, (Arc<TypeSchema>, TypeId)> {
        let type_id = TypeId::of::<T>();
        if let Some(schema) = self.read().by_type.get(&type_id) {
            return Ok(schema.clone());
        }
        // built outside the lock: describing a type may build its base first
        let built = Arc::new(TypeSchema::build::<T>());
        let mut inner = self.write();
        let schema = inner.by_type.entry(type_id).or_insert(built).clone();
        let owner = inner.by_name.entry(schema.name).or_insert_with(|| schema.clone());
        if owner.type_id != type_id {
            let owner_id = owner.type_id;
            return Err((schema, owner_id));
        }
        log::debug!(
            "cataloged {} ({} fields, {} hooks{})",
            schema.name,
            schema.fields.len(),
            schema.hooks.len(),
            if schema.is_keyed() { ", keyed" } else { "" }
        );
        Ok(schema)
    }

    pub fn lookup(&self, type_id: TypeId) -> Option<Arc<TypeSchema>> {
        self.read().by_type.get(&type_id).cloned()
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<TypeSchema>> {
        self.read().by_name.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
