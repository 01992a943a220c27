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

//! Symmetric hooks, after-restore callbacks and hook ordering.

use graphsnap::{shared, Error, GraphObject, HookContext, Shared, Snapshotter, TypeCatalog, Value};
use graphsnap_core::arena::SerialHandle;
use std::cell::RefCell;

thread_local! {
    static JOURNAL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn note(entry: impl Into<String>) {
    JOURNAL.with(|j| j.borrow_mut().push(entry.into()));
}

fn take_journal() -> Vec<String> {
    JOURNAL.with(|j| std::mem::take(&mut *j.borrow_mut()))
}

#[derive(GraphObject, Default)]
#[graph(hook = "sync_nothing")]
struct Quiet {
    level: i32,
}

impl Quiet {
    fn sync_nothing(&mut self, _context: &mut HookContext) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(GraphObject, Default)]
#[graph(hook = "sync_secret")]
struct Vault {
    #[graph(skip)]
    secret: String,
}

impl Vault {
    fn sync_secret(&mut self, context: &mut HookContext) -> Result<(), Error> {
        self.secret = context.exchange_as(std::mem::take(&mut self.secret))?;
        Ok(())
    }
}

#[derive(GraphObject, Default)]
#[graph(hook = "sync_buffer")]
struct Buffer {
    #[graph(skip)]
    width: u32,
    #[graph(skip)]
    height: u32,
    #[graph(skip)]
    pixels: Vec<u8>,
    #[graph(skip)]
    uploaded: bool,
}

impl Buffer {
    fn sync_buffer(&mut self, context: &mut HookContext) -> Result<(), Error> {
        self.width = context.exchange_as(self.width)?;
        self.height = context.exchange_as(self.height)?;
        self.pixels = context.exchange_as(std::mem::take(&mut self.pixels))?;
        self.uploaded = context.is_restoring();
        Ok(())
    }
}

#[test]
fn test_hook_with_no_values() {
    tests::init_logger();
    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode(&shared(Quiet { level: 4 })).unwrap();

    // header, field, hook slot, then the empty value list
    assert_eq!(form.arena().len(), 1 + 3 + 1);
    assert_eq!(
        form.arena().get(3).unwrap(),
        SerialHandle::CustomSerializedObjects { block: 4 }
    );
    let SerialHandle::CustomSerializedObjectsCount { count, .. } = form.arena().get(4).unwrap()
    else {
        panic!("missing hook list header");
    };
    assert_eq!(count, 0);

    let restored: Shared<Quiet> = snapshotter.decode_as(&form).unwrap();
    assert_eq!(restored.borrow().level, 4);
}

#[test]
fn test_hook_with_one_value() {
    let snapshotter = Snapshotter::default();
    let vault = shared(Vault {
        secret: "hunter2".to_string(),
    });
    let form = snapshotter.encode(&vault).unwrap();
    let restored: Shared<Vault> = snapshotter.decode_as(&form).unwrap();
    assert_eq!(restored.borrow().secret, "hunter2");
    // collecting must hand the value back
    assert_eq!(vault.borrow().secret, "hunter2");
}

#[test]
fn test_hook_with_three_values() {
    let snapshotter = Snapshotter::default();
    let buffer = shared(Buffer {
        width: 2,
        height: 1,
        pixels: vec![1, 2, 3, 4, 5, 6],
        uploaded: false,
    });
    let form = snapshotter.encode(&buffer).unwrap();

    let SerialHandle::CustomSerializedObjectsCount { count, .. } = form.arena().get(3).unwrap()
    else {
        panic!("missing hook list header");
    };
    assert_eq!(count, 3);

    let restored: Shared<Buffer> = snapshotter.decode_as(&form).unwrap();
    let restored = restored.borrow();
    assert_eq!((restored.width, restored.height), (2, 1));
    assert_eq!(restored.pixels, vec![1, 2, 3, 4, 5, 6]);
    assert!(restored.uploaded);
    assert!(!buffer.borrow().uploaded);
}

#[derive(GraphObject, Default)]
#[graph(hook = "greedy")]
struct Greedy {}

impl Greedy {
    fn greedy(&mut self, context: &mut HookContext) -> Result<(), Error> {
        context.exchange(1i32)?;
        if context.is_restoring() {
            context.exchange(Value::Null)?;
        }
        Ok(())
    }
}

#[derive(GraphObject, Default)]
#[graph(hook = "lazy")]
struct Lazy {}

impl Lazy {
    fn lazy(&mut self, context: &mut HookContext) -> Result<(), Error> {
        context.exchange(1i32)?;
        if !context.is_restoring() {
            context.exchange(2i32)?;
        }
        Ok(())
    }
}

#[test]
fn test_asymmetric_hooks_fail() {
    if !tests::errors_are_values() {
        return;
    }
    let snapshotter = Snapshotter::default();

    let form = snapshotter.encode(&shared(Greedy {})).unwrap();
    let err = snapshotter.decode(&form).unwrap_err();
    assert!(matches!(err, Error::HookMismatch(_)), "{err}");

    let form = snapshotter.encode(&shared(Lazy {})).unwrap();
    let err = snapshotter.decode(&form).unwrap_err();
    assert!(matches!(err, Error::HookMismatch(_)), "{err}");
}

#[derive(GraphObject, Default)]
#[graph(hook = "remember")]
struct Remembering {
    name: String,
    friend: Option<Shared<Remembering>>,
}

impl Remembering {
    fn remember(&mut self, context: &mut HookContext) -> Result<(), Error> {
        if context.is_restoring() {
            let name = self.name.clone();
            note(format!("hook {name}"));
            context.run_after_restore(move || note(format!("after {name}")));
        } else {
            context.run_after_restore(|| note("queued while encoding"));
        }
        Ok(())
    }
}

#[test]
fn test_after_restore_runs_last_in_order() {
    let second = shared(Remembering {
        name: "second".to_string(),
        friend: None,
    });
    let first = shared(Remembering {
        name: "first".to_string(),
        friend: Some(second.clone()),
    });

    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode(&first).unwrap();
    take_journal();

    let _restored = snapshotter.decode(&form).unwrap();
    // fields are restored before hooks, so the inner object finishes first
    assert_eq!(
        take_journal(),
        vec!["hook second", "hook first", "after second", "after first"]
    );

    let _again = snapshotter.decode(&form).unwrap();
    assert_eq!(take_journal().len(), 4);
}

#[derive(GraphObject, Default)]
#[graph(hook = "sync_base", hook = "shared_name")]
struct BaseLevel {
    base_value: i32,
}

impl BaseLevel {
    fn sync_base(&mut self, context: &mut HookContext) -> Result<(), Error> {
        note(if context.is_restoring() { "base restore" } else { "base collect" });
        Ok(())
    }

    fn shared_name(&mut self, _context: &mut HookContext) -> Result<(), Error> {
        note("base shared_name");
        Ok(())
    }
}

#[derive(GraphObject, Default)]
#[graph(hook = "sync_derived", hook = "shared_name", hook = "sync_derived")]
struct DerivedLevel {
    derived_value: i32,
    #[graph(base)]
    base: BaseLevel,
}

impl DerivedLevel {
    fn sync_derived(&mut self, context: &mut HookContext) -> Result<(), Error> {
        note(if context.is_restoring() { "derived restore" } else { "derived collect" });
        Ok(())
    }

    fn shared_name(&mut self, _context: &mut HookContext) -> Result<(), Error> {
        note("derived shared_name");
        Ok(())
    }
}

#[test]
fn test_base_hooks_run_first_and_overrides_are_excluded() {
    let schema = TypeCatalog::global().schema_of::<DerivedLevel>();
    let hooks: Vec<_> = schema
        .hooks()
        .iter()
        .map(|h| (h.declaring_type(), h.name()))
        .collect();
    assert_eq!(hooks.len(), 3);
    assert!(hooks[0].0.ends_with("BaseLevel") && hooks[0].1 == "sync_base");
    assert!(hooks[1].0.ends_with("BaseLevel") && hooks[1].1 == "shared_name");
    assert!(hooks[2].0.ends_with("DerivedLevel") && hooks[2].1 == "sync_derived");

    let snapshotter = Snapshotter::default();
    take_journal();
    let form = snapshotter.encode(&shared(DerivedLevel {
        derived_value: 1,
        base: BaseLevel { base_value: 2 },
    }))
    .unwrap();
    assert_eq!(
        take_journal(),
        vec!["base collect", "base shared_name", "derived collect"]
    );

    // the base type is registered as the declaring type of its hooks
    assert_eq!(form.types().len(), 2);

    let restored: Shared<DerivedLevel> = snapshotter.decode_as(&form).unwrap();
    assert_eq!(
        take_journal(),
        vec!["base restore", "base shared_name", "derived restore"]
    );
    assert_eq!(restored.borrow().base.base_value, 2);
    assert_eq!(restored.borrow().derived_value, 1);
}

#[derive(GraphObject, Default)]
#[graph(hook = "keep_self")]
struct SelfAware {
    #[graph(skip)]
    me: Option<Shared<SelfAware>>,
    #[graph(skip)]
    payload: Value,
}

impl SelfAware {
    fn keep_self(&mut self, context: &mut HookContext) -> Result<(), Error> {
        self.me = context.exchange_as(self.me.take())?;
        self.payload = context.exchange(std::mem::take(&mut self.payload))?;
        Ok(())
    }
}

#[test]
fn test_hook_values_take_part_in_identity() {
    let node = shared(SelfAware::default());
    {
        let mut n = node.borrow_mut();
        n.me = Some(node.clone());
        n.payload = Value::from("payload");
    }

    let snapshotter = Snapshotter::default();
    let restored: Shared<SelfAware> = snapshotter
        .decode_as(&snapshotter.encode(&node).unwrap())
        .unwrap();
    let me = restored.borrow().me.clone().unwrap();
    assert!(std::rc::Rc::ptr_eq(&me, &restored));
    assert_eq!(restored.borrow().payload, Value::String("payload".to_string()));

    node.borrow_mut().me = None;
    restored.borrow_mut().me = None;
}
