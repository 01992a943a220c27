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

use graphsnap::{
    Error, GraphObject, HookContext, Reflect, SchemaBuilder, Snapshotter, TypeCatalog, Value,
};

#[derive(GraphObject, Default)]
struct Plain {
    a: i32,
    b: String,
}

#[derive(GraphObject, Default)]
struct Grand {
    g: u8,
}

#[derive(GraphObject, Default)]
struct Parent {
    p: u8,
    #[graph(skip)]
    cache: Vec<u8>,
    #[graph(base)]
    grand: Grand,
}

#[derive(GraphObject, Default)]
struct Child {
    c1: u8,
    #[graph(base)]
    parent: Parent,
    c2: u8,
}

#[test]
fn test_default_type_name_is_module_path() {
    assert_eq!(Plain::type_name(), "test_catalog::Plain");
    let schema = TypeCatalog::global().schema_of::<Plain>();
    assert_eq!(schema.name(), "test_catalog::Plain");
    assert_eq!(schema.field_names(), vec!["a", "b"]);
    assert!(schema.hooks().is_empty());
    assert!(!schema.is_keyed());
}

#[test]
fn test_field_order_most_derived_first() {
    let schema = TypeCatalog::global().schema_of::<Child>();
    assert_eq!(schema.field_names(), vec!["c1", "c2", "p", "g"]);
    assert_eq!(schema.skipped(), &["cache"]);
    assert_eq!(schema.base(), Some("test_catalog::Parent"));

    let declaring: Vec<_> = schema.fields().iter().map(|f| f.declaring_type()).collect();
    assert_eq!(
        declaring,
        vec![
            "test_catalog::Child",
            "test_catalog::Child",
            "test_catalog::Parent",
            "test_catalog::Grand"
        ]
    );
}

#[test]
fn test_schema_is_cached() {
    let first = TypeCatalog::global().schema_of::<Child>();
    let second = TypeCatalog::global().schema_of::<Child>();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(TypeCatalog::global().lookup_by_name("test_catalog::Child").is_some());
    assert!(TypeCatalog::global()
        .lookup(std::any::TypeId::of::<Child>())
        .is_some());
}

#[derive(GraphObject, Default)]
#[graph(name = "catalog::Duplicate")]
struct FirstOwner {
    x: i32,
}

#[derive(GraphObject, Default)]
#[graph(name = "catalog::Duplicate")]
struct SecondOwner {
    y: i32,
}

#[test]
fn test_register_rejects_name_clash() {
    tests::init_logger();
    if !tests::errors_are_values() {
        return;
    }
    let snapshotter = Snapshotter::default();
    snapshotter.register::<FirstOwner>().unwrap();
    let err = snapshotter.register::<SecondOwner>().unwrap_err();
    assert!(matches!(err, Error::TypeError(_)), "{err}");

    let owner = TypeCatalog::global()
        .lookup_by_name("catalog::Duplicate")
        .unwrap();
    assert_eq!(owner.type_id(), std::any::TypeId::of::<FirstOwner>());
    // the clashing type is still usable in-process
    assert_eq!(
        TypeCatalog::global().schema_of::<SecondOwner>().field_names(),
        vec!["y"]
    );
}

/// Described by hand instead of through the derive macro.
#[derive(Default)]
struct Manual {
    hidden: i64,
    shown: i64,
}

impl Manual {
    fn sync(&mut self, context: &mut HookContext) -> Result<(), Error> {
        self.hidden = context.exchange_as(self.hidden)?;
        Ok(())
    }
}

impl Reflect for Manual {
    fn type_name() -> &'static str {
        "catalog::Manual"
    }

    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field(
                "shown",
                |m: &Manual| Value::I64(m.shown),
                |m: &mut Manual, v: Value| {
                    m.shown = graphsnap::FromValue::from_value(v)?;
                    Ok(())
                },
            )
            .skip("hidden")
            .hook("sync", Manual::sync);
    }
}

#[test]
fn test_manual_description() {
    let schema = TypeCatalog::global().schema_of::<Manual>();
    assert_eq!(schema.field_names(), vec!["shown"]);
    assert_eq!(schema.skipped(), &["hidden"]);
    assert_eq!(schema.hooks().len(), 1);

    let snapshotter = Snapshotter::default();
    let form = snapshotter
        .encode(graphsnap::ObjectRef::new(Manual {
            hidden: -1,
            shown: 2,
        }))
        .unwrap();
    let restored = snapshotter.decode_as::<Manual>(&form).unwrap();
    assert_eq!(restored.borrow().hidden, -1);
    assert_eq!(restored.borrow().shown, 2);
}

#[test]
fn test_concurrent_catalog_access() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(|| {
                let schema = TypeCatalog::global().schema_of::<Child>();
                schema.fields().len()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 4);
    }
}
