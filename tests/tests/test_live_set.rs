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

//! Objects that belong to the running scene are cut out of snapshots.

use graphsnap::{shared, Error, GraphObject, LiveSet, ObjectRef, Shared, Snapshotter};
use graphsnap_core::arena::SerialHandle;

#[derive(GraphObject, Default)]
struct World {
    name: String,
}

#[derive(GraphObject, Default)]
struct Prefab {
    label: String,
    world: Option<Shared<World>>,
    template: Option<Shared<Prefab>>,
}

/// Everything that is a `World` is live.
struct WorldsAreLive;

impl LiveSet for WorldsAreLive {
    fn is_live(&self, object: &ObjectRef) -> bool {
        object.is::<World>()
    }
}

#[test]
fn test_live_reference_becomes_outside_reference() {
    tests::init_logger();
    let prefab = shared(Prefab {
        label: "crate".to_string(),
        world: Some(shared(World {
            name: "level-1".to_string(),
        })),
        template: None,
    });

    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode_with(&prefab, &WorldsAreLive).unwrap();
    assert_eq!(form.arena().get(3).unwrap(), SerialHandle::OutsideReference);
    // only the prefab's own block
    assert_eq!(form.arena().len(), 1 + 4);

    let restored: Shared<Prefab> = snapshotter.decode_as(&form).unwrap();
    let restored = restored.borrow();
    assert_eq!(restored.label, "crate");
    assert!(restored.world.is_none());
}

#[test]
fn test_live_root_is_refused() {
    if !tests::errors_are_values() {
        return;
    }
    let world = shared(World {
        name: "level-1".to_string(),
    });
    let err = Snapshotter::default()
        .encode_with(&world, &WorldsAreLive)
        .unwrap_err();
    assert!(matches!(err, Error::RootIsLive(_)), "{err}");
}

#[test]
fn test_closure_live_set() {
    let live_template = shared(Prefab {
        label: "template".to_string(),
        world: None,
        template: None,
    });
    let instance = shared(Prefab {
        label: "instance".to_string(),
        world: None,
        template: Some(live_template.clone()),
    });

    let live = ObjectRef::from(&live_template);
    let is_live = move |object: &ObjectRef| object.ptr_eq(&live);

    let snapshotter = Snapshotter::default();
    let form = snapshotter.encode_with(&instance, &is_live).unwrap();
    assert_eq!(form.arena().get(4).unwrap(), SerialHandle::OutsideReference);

    let restored: Shared<Prefab> = snapshotter.decode_as(&form).unwrap();
    assert!(restored.borrow().template.is_none());

    // without a live set the template is captured
    let form = snapshotter.encode(&instance).unwrap();
    let restored: Shared<Prefab> = snapshotter.decode_as(&form).unwrap();
    let template = restored.borrow().template.clone().unwrap();
    assert_eq!(template.borrow().label, "template");
}
