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

//! Dynamic values exchanged between live objects and the encoder/decoder.
//!
//! Live graph nodes are shared, interior-mutable cells ([`Shared<T>`]). An
//! [`ObjectRef`] is the type-erased form of such a cell; both point at the
//! same allocation, so pointer identity survives the erasure and the encoder
//! can use it as the object's identity.

use crate::error::Error;
use crate::reflect::{GraphObject, Reflect};
use crate::resolver::type_catalog::{schema_fn, TypeSchema};
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// A live, shareable graph node.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value into a fresh [`Shared`] node.
pub fn shared<T: Reflect>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Type-erased handle to a live graph node.
#[derive(Clone)]
pub struct ObjectRef {
    node: Rc<RefCell<dyn GraphObject>>,
    any: Rc<dyn Any>,
    schema: fn() -> Arc<TypeSchema>,
}

impl ObjectRef {
    pub fn new<T: Reflect>(value: T) -> ObjectRef {
        ObjectRef::from_shared(shared(value))
    }

    pub fn from_shared<T: Reflect>(shared: Shared<T>) -> ObjectRef {
        let node: Rc<RefCell<dyn GraphObject>> = shared.clone();
        let any: Rc<dyn Any> = shared;
        ObjectRef {
            node,
            any,
            schema: schema_fn::<T>,
        }
    }

    /// Recovers the typed node, `None` if this object is of another type.
    pub fn downcast<T: Reflect>(&self) -> Option<Shared<T>> {
        self.any.clone().downcast::<RefCell<T>>().ok()
    }

    pub fn is<T: Reflect>(&self) -> bool {
        self.any.is::<RefCell<T>>()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.addr() == other.addr()
    }

    /// Thin address of the shared allocation.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.any) as *const () as usize
    }

    pub fn schema(&self) -> Arc<TypeSchema> {
        (self.schema)()
    }

    pub fn type_name(&self) -> &'static str {
        self.schema().name()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, dyn GraphObject>, Error> {
        self.node.try_borrow().map_err(|_| {
            Error::not_allowed(format!(
                "{} is mutably borrowed during a graph walk",
                self.type_name()
            ))
        })
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, dyn GraphObject>, Error> {
        self.node.try_borrow_mut().map_err(|_| {
            Error::not_allowed(format!(
                "{} is already borrowed during a graph walk",
                self.type_name()
            ))
        })
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} @ {:#x})", self.type_name(), self.addr())
    }
}

impl<T: Reflect> From<Shared<T>> for ObjectRef {
    fn from(shared: Shared<T>) -> Self {
        ObjectRef::from_shared(shared)
    }
}

impl<T: Reflect> From<&Shared<T>> for ObjectRef {
    fn from(shared: &Shared<T>) -> Self {
        ObjectRef::from_shared(shared.clone())
    }
}

/// Array payload. `lengths` holds one entry per dimension; only rank-1
/// arrays can be snapshotted.
#[derive(Clone, Debug, Default)]
pub struct GraphArray {
    lengths: Vec<usize>,
    items: Vec<Value>,
}

impl GraphArray {
    pub fn new(items: Vec<Value>) -> GraphArray {
        GraphArray {
            lengths: vec![items.len()],
            items,
        }
    }

    /// Multi-dimensional array stored in row-major order.
    pub fn with_dimensions(lengths: Vec<usize>, items: Vec<Value>) -> Result<GraphArray, Error> {
        let expected = lengths.iter().product::<usize>();
        if expected != items.len() {
            return Err(Error::invalid_data(format!(
                "array dimensions {:?} need {} items, got {}",
                lengths,
                expected,
                items.len()
            )));
        }
        Ok(GraphArray { lengths, items })
    }

    pub fn rank(&self) -> usize {
        self.lengths.len()
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<(), Error> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or_else(|| Error::invalid_data(format!("array index {index} out of {len}")))?;
        *slot = value;
        Ok(())
    }
}

/// Shared handle to a [`GraphArray`]; arrays carry identity like objects.
#[derive(Clone, Debug)]
pub struct ArrayRef(Rc<RefCell<GraphArray>>);

impl ArrayRef {
    pub fn new(array: GraphArray) -> ArrayRef {
        ArrayRef(Rc::new(RefCell::new(array)))
    }

    pub fn from_items(items: Vec<Value>) -> ArrayRef {
        ArrayRef::new(GraphArray::new(items))
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn borrow(&self) -> Ref<'_, GraphArray> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, GraphArray> {
        self.0.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, GraphArray>, Error> {
        self.0
            .try_borrow()
            .map_err(|_| Error::not_allowed("array is mutably borrowed during a graph walk"))
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, GraphArray>, Error> {
        self.0
            .try_borrow_mut()
            .map_err(|_| Error::not_allowed("array is already borrowed during a graph walk"))
    }
}

/// Dynamic value of a field, array element, hook payload or key descriptor.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    Object(ObjectRef),
    Array(ArrayRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Downcasts an object value to its typed node.
    pub fn downcast<T: Reflect>(&self) -> Option<Shared<T>> {
        self.as_object().and_then(|obj| obj.downcast::<T>())
    }
}

/// Primitives compare by value, objects and arrays by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Converts a field's current value into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Converts a decoded [`Value`] back into a field's type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, Error>;
}

fn mismatch<T: ?Sized>(found: &Value) -> Error {
    Error::type_mismatch(std::any::type_name::<T>(), found.kind_name())
}

macro_rules! impl_primitive_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ToValue for $ty {
                #[inline(always)]
                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }
            }

            impl FromValue for $ty {
                #[inline(always)]
                fn from_value(value: Value) -> Result<Self, Error> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch::<$ty>(&other)),
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_primitive_value!(
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
);

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch::<String>(&other)),
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl From<ArrayRef> for Value {
    fn from(v: ArrayRef) -> Self {
        Value::Array(v)
    }
}

impl<T: Reflect> From<Shared<T>> for Value {
    fn from(v: Shared<T>) -> Self {
        Value::Object(ObjectRef::from_shared(v))
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, Error> {
        Ok(value)
    }
}

impl ToValue for ObjectRef {
    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(mismatch::<ObjectRef>(&other)),
        }
    }
}

impl ToValue for ArrayRef {
    fn to_value(&self) -> Value {
        Value::Array(self.clone())
    }
}

impl FromValue for ArrayRef {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Array(arr) => Ok(arr),
            other => Err(mismatch::<ArrayRef>(&other)),
        }
    }
}

impl<T: Reflect> ToValue for Shared<T> {
    fn to_value(&self) -> Value {
        Value::Object(ObjectRef::from_shared(self.clone()))
    }
}

impl<T: Reflect> FromValue for Shared<T> {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(obj) => obj
                .downcast::<T>()
                .ok_or_else(|| Error::type_mismatch(T::type_name(), obj.type_name())),
            other => Err(mismatch::<Shared<T>>(&other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// A `Vec` has no identity of its own: each conversion yields a fresh array.
impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Array(ArrayRef::from_items(
            self.iter().map(ToValue::to_value).collect(),
        ))
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Array(arr) => {
                let items = arr.try_borrow()?.items().to_vec();
                items.into_iter().map(T::from_value).collect()
            }
            other => Err(mismatch::<Vec<T>>(&other)),
        }
    }
}
