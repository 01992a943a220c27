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

use graphsnap::{shared, ArrayRef, Error, GraphArray, GraphObject, Shared, Snapshotter, Value};
use graphsnap_core::arena::SerialHandle;

#[derive(GraphObject, Default)]
struct Inventory {
    slots: Option<ArrayRef>,
    spare: Option<ArrayRef>,
}

#[derive(GraphObject, Default, Debug, PartialEq)]
struct Item {
    weight: u16,
}

#[test]
fn test_array_with_null_hole() {
    tests::init_logger();
    let items = ArrayRef::from_items(vec![
        Value::from(shared(Item { weight: 1 })),
        Value::from(2i64),
        Value::Null,
        Value::from("four"),
        Value::from(shared(Item { weight: 5 })),
    ]);
    let inventory = shared(Inventory {
        slots: Some(items),
        spare: None,
    });

    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode(&inventory).unwrap();
    assert_eq!(form.arena().get(2).unwrap(), SerialHandle::Array { block: 4 });
    assert_eq!(form.arena().get(4).unwrap(), SerialHandle::ArrayRank { rank: 1 });
    assert_eq!(
        form.arena().get(5).unwrap(),
        SerialHandle::ArrayCount { length: 5 }
    );
    assert_eq!(form.arena().get(8).unwrap(), SerialHandle::Null);

    let restored: Shared<Inventory> = snapshotter.decode_as(&form).unwrap();
    let restored = restored.borrow();
    let slots = restored.slots.as_ref().unwrap().borrow();
    assert_eq!(slots.len(), 5);
    assert_eq!(slots.lengths(), &[5]);
    assert_eq!(slots.get(0).unwrap().downcast::<Item>().unwrap().borrow().weight, 1);
    assert_eq!(slots.get(1), Some(&Value::I64(2)));
    assert!(slots.get(2).unwrap().is_null());
    assert_eq!(slots.get(3), Some(&Value::String("four".to_string())));
    assert_eq!(slots.get(4).unwrap().downcast::<Item>().unwrap().borrow().weight, 5);
    assert!(restored.spare.is_none());
}

#[test]
fn test_shared_array_identity() {
    let array = ArrayRef::from_items(vec![Value::from(1u8), Value::from(2u8)]);
    let inventory = shared(Inventory {
        slots: Some(array.clone()),
        spare: Some(array),
    });

    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode(&inventory).unwrap();
    assert_eq!(
        form.arena().get(3).unwrap(),
        SerialHandle::ReferenceToPrevious { block: 4 }
    );

    let restored: Shared<Inventory> = snapshotter.decode_as(&form).unwrap();
    let restored = restored.borrow();
    let slots = restored.slots.as_ref().unwrap();
    let spare = restored.spare.as_ref().unwrap();
    assert!(slots.ptr_eq(spare));
    slots.borrow_mut().set(0, Value::from(9u8)).unwrap();
    assert_eq!(spare.borrow().get(0), Some(&Value::U8(9)));
}

#[test]
fn test_array_containing_itself() {
    let array = ArrayRef::from_items(vec![Value::Null]);
    array
        .borrow_mut()
        .set(0, Value::Array(array.clone()))
        .unwrap();
    let inventory = shared(Inventory {
        slots: Some(array.clone()),
        spare: None,
    });

    let snapshotter = Snapshotter::default();
    let restored: Shared<Inventory> = snapshotter
        .decode_as(&snapshotter.encode(&inventory).unwrap())
        .unwrap();
    let restored = restored.borrow();
    let slots = restored.slots.clone().unwrap();
    let inner = slots.borrow().get(0).unwrap().as_array().unwrap().clone();
    assert!(inner.ptr_eq(&slots));

    array.borrow_mut().set(0, Value::Null).unwrap();
    slots.borrow_mut().set(0, Value::Null).unwrap();
}

#[test]
fn test_multi_dimensional_array_rejected() {
    if !tests::errors_are_values() {
        return;
    }
    let grid = GraphArray::with_dimensions(
        vec![2, 2],
        vec![Value::from(1i32), Value::from(2i32), Value::from(3i32), Value::from(4i32)],
    )
    .unwrap();
    let inventory = shared(Inventory {
        slots: Some(ArrayRef::new(grid)),
        spare: None,
    });

    let err = Snapshotter::default().encode(&inventory).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)), "{err}");
}

#[derive(GraphObject, Default, Debug, PartialEq)]
struct Polyline {
    xs: Vec<f64>,
    labels: Vec<Option<String>>,
    points: Vec<Shared<Item>>,
}

#[test]
fn test_vec_fields() {
    let weight = shared(Item { weight: 3 });
    let line = shared(Polyline {
        xs: vec![0.0, 0.5, 1.0],
        labels: vec![Some("start".to_string()), None],
        points: vec![weight.clone(), weight],
    });

    let snapshotter = Snapshotter::default();
    let restored: Shared<Polyline> = snapshotter
        .decode_as(&snapshotter.encode(&line).unwrap())
        .unwrap();
    let restored = restored.borrow();
    assert_eq!(restored.xs, vec![0.0, 0.5, 1.0]);
    assert_eq!(restored.labels, vec![Some("start".to_string()), None]);
    assert_eq!(restored.points.len(), 2);
    assert!(std::rc::Rc::ptr_eq(&restored.points[0], &restored.points[1]));
}

#[test]
fn test_empty_array() {
    let inventory = shared(Inventory {
        slots: Some(ArrayRef::from_items(Vec::new())),
        spare: None,
    });
    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode(&inventory).unwrap();
    assert_eq!(form.arena().len(), 1 + 3 + 2);

    let restored: Shared<Inventory> = snapshotter.decode_as(&form).unwrap();
    assert!(restored.borrow().slots.as_ref().unwrap().borrow().is_empty());
}
