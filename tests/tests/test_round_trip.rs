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

use graphsnap::{shared, GraphObject, ObjectRef, Shared, Snapshotter, Value};
use graphsnap_core::arena::SerialHandle;
use graphsnap_core::types::PrimitiveKind;

#[derive(GraphObject, Default, Debug, PartialEq)]
struct Primitives {
    flag: bool,
    small: i8,
    byte: u8,
    short: i16,
    ushort: u16,
    int: i32,
    uint: u32,
    long: i64,
    ulong: u64,
    single: f32,
    double: f64,
    letter: char,
    text: String,
    maybe: Option<i32>,
    missing: Option<String>,
    words: Vec<String>,
}

fn sample_primitives() -> Primitives {
    Primitives {
        flag: true,
        small: -8,
        byte: 200,
        short: -1234,
        ushort: 65000,
        int: -123_456,
        uint: 4_000_000_000,
        long: i64::MIN,
        ulong: u64::MAX,
        single: 1.5,
        double: -2.25e100,
        letter: 'λ',
        text: "hello, snapshot".to_string(),
        maybe: Some(7),
        missing: None,
        words: vec!["a".to_string(), String::new(), "ccc".to_string()],
    }
}

#[test]
fn test_primitive_fields() {
    tests::init_logger();
    let snapshotter = Snapshotter::default();
    let original = shared(sample_primitives());

    let form = snapshotter.encode(&original).unwrap();
    let restored: Shared<Primitives> = snapshotter.decode_as(&form).unwrap();

    assert_eq!(*restored.borrow(), sample_primitives());
    assert!(!std::rc::Rc::ptr_eq(&restored, &original));
}

#[test]
fn test_primitives_are_not_deduplicated() {
    #[derive(GraphObject, Default)]
    struct Pair {
        a: String,
        b: String,
    }

    let form = Snapshotter::default()
        .encode(&shared(Pair {
            a: "same".to_string(),
            b: "same".to_string(),
        }))
        .unwrap();

    let (SerialHandle::Primitive { kind: ka, offset: a }, SerialHandle::Primitive { kind: kb, offset: b }) =
        (form.arena().get(2).unwrap(), form.arena().get(3).unwrap())
    else {
        panic!("expected two primitive slots, got {:?}", form.arena());
    };
    assert_eq!(ka, PrimitiveKind::String);
    assert_eq!(kb, PrimitiveKind::String);
    assert_ne!(a, b);
    // one length byte plus four bytes each
    assert_eq!(form.primitives().len(), 10);
}

#[test]
fn test_same_form_decodes_into_independent_graphs() {
    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode(&shared(sample_primitives())).unwrap();

    let first: Shared<Primitives> = snapshotter.decode_as(&form).unwrap();
    let second: Shared<Primitives> = snapshotter.decode_as(&form).unwrap();
    assert!(!std::rc::Rc::ptr_eq(&first, &second));

    first.borrow_mut().int = 0;
    assert_eq!(second.borrow().int, -123_456);
}

#[derive(GraphObject, Default)]
struct Session {
    user: String,
    #[graph(skip)]
    token: String,
    #[graph(skip)]
    retries: u32,
}

#[test]
fn test_skipped_fields_restore_as_default() {
    let snapshotter = Snapshotter::default();
    let session = shared(Session {
        user: "ada".to_string(),
        token: "secret".to_string(),
        retries: 3,
    });

    let form = snapshotter.encode(&session).unwrap();
    // header + one field
    assert_eq!(form.arena().len(), 3);

    let restored: Shared<Session> = snapshotter.decode_as(&form).unwrap();
    let restored = restored.borrow();
    assert_eq!(restored.user, "ada");
    assert_eq!(restored.token, "");
    assert_eq!(restored.retries, 0);
}

#[derive(GraphObject, Default)]
struct Defaults {
    label: Option<String>,
}

#[test]
fn test_null_field_keeps_blank_value() {
    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode(&shared(Defaults { label: None })).unwrap();
    assert_eq!(form.arena().get(2).unwrap(), SerialHandle::Null);

    let restored: Shared<Defaults> = snapshotter.decode_as(&form).unwrap();
    assert_eq!(restored.borrow().label, None);
}

#[derive(GraphObject, Default)]
struct Camera {
    fov: f32,
}

#[derive(GraphObject, Default)]
struct Light {
    intensity: f64,
}

#[derive(GraphObject, Default)]
struct Scene {
    components: Vec<ObjectRef>,
    focus: Option<ObjectRef>,
}

#[test]
fn test_polymorphic_fields() {
    let snapshotter = Snapshotter::default();
    let camera = shared(Camera { fov: 60.0 });
    let scene = shared(Scene {
        components: vec![
            ObjectRef::from(&camera),
            ObjectRef::new(Light { intensity: 0.5 }),
        ],
        focus: Some(ObjectRef::from(&camera)),
    });

    let form = snapshotter.encode(&scene).unwrap();
    let restored: Shared<Scene> = snapshotter.decode_as(&form).unwrap();
    let restored = restored.borrow();

    assert_eq!(restored.components.len(), 2);
    let camera = restored.components[0].downcast::<Camera>().unwrap();
    assert_eq!(camera.borrow().fov, 60.0);
    let light = restored.components[1].downcast::<Light>().unwrap();
    assert_eq!(light.borrow().intensity, 0.5);
    assert!(restored.components[1].downcast::<Camera>().is_none());

    let focus = restored.focus.as_ref().unwrap();
    assert!(focus.ptr_eq(&restored.components[0]));
}

#[derive(GraphObject, Default)]
struct Node {
    name: String,
    visible: bool,
}

#[derive(GraphObject, Default)]
struct MeshNode {
    vertex_count: u32,
    #[graph(base)]
    node: Node,
}

#[test]
fn test_base_fields_round_trip() {
    let snapshotter = Snapshotter::default();
    let mesh = shared(MeshNode {
        vertex_count: 3,
        node: Node {
            name: "triangle".to_string(),
            visible: true,
        },
    });

    let form = snapshotter.encode(&mesh).unwrap();
    // header + own field + two base fields
    assert_eq!(form.arena().len(), 5);
    assert_eq!(
        form.arena().get(2).unwrap(),
        SerialHandle::Primitive {
            kind: PrimitiveKind::U32,
            offset: 0
        }
    );

    let restored: Shared<MeshNode> = snapshotter.decode_as(&form).unwrap();
    let restored = restored.borrow();
    assert_eq!(restored.vertex_count, 3);
    assert_eq!(restored.node.name, "triangle");
    assert!(restored.node.visible);
}

#[test]
fn test_decode_as_wrong_type() {
    if !tests::errors_are_values() {
        return;
    }
    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode(&shared(Camera { fov: 1.0 })).unwrap();
    assert!(snapshotter.decode_as::<Light>(&form).is_err());
    assert!(matches!(snapshotter.decode(&form).unwrap(), Value::Object(_)));
}
