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

// `HandleTag::Primitive` shares its name with num_enum's `Primitive` associated type.
#![allow(ambiguous_associated_items)]
use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};

/// Magic bytes opening every serialized envelope.
pub const MAGIC: [u8; 4] = *b"GSNP";

/// Envelope layout version. No schema evolution: a different version is rejected.
pub const FORMAT_VERSION: u32 = 1;

/// Exact kind of a value stored in the primitive buffer.
///
/// Kinds read back from bytes that this build does not know land in
/// [`PrimitiveKind::Unsupported`] and decode to null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool = 1,
    I8 = 2,
    U8 = 3,
    I16 = 4,
    U16 = 5,
    I32 = 6,
    U32 = 7,
    I64 = 8,
    U64 = 9,
    F32 = 10,
    F64 = 11,
    Char = 12,
    String = 13,
    #[num_enum(catch_all)]
    Unsupported(u8),
}

impl PrimitiveKind {
    pub fn tag(self) -> u8 {
        match self {
            PrimitiveKind::Bool => 1,
            PrimitiveKind::I8 => 2,
            PrimitiveKind::U8 => 3,
            PrimitiveKind::I16 => 4,
            PrimitiveKind::U16 => 5,
            PrimitiveKind::I32 => 6,
            PrimitiveKind::U32 => 7,
            PrimitiveKind::I64 => 8,
            PrimitiveKind::U64 => 9,
            PrimitiveKind::F32 => 10,
            PrimitiveKind::F64 => 11,
            PrimitiveKind::Char => 12,
            PrimitiveKind::String => 13,
            PrimitiveKind::Unsupported(tag) => tag,
        }
    }

    /// Fixed byte width, `None` for variable-length kinds.
    pub fn width(self) -> Option<usize> {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => Some(1),
            PrimitiveKind::I16 | PrimitiveKind::U16 => Some(2),
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => Some(4),
            PrimitiveKind::Char => Some(4),
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => Some(8),
            PrimitiveKind::String | PrimitiveKind::Unsupported(_) => None,
        }
    }
}

/// On-wire tag of each [`crate::arena::SerialHandle`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum HandleTag {
    Null = 0,
    Primitive = 1,
    Reference = 2,
    ReferenceToPrevious = 3,
    Array = 4,
    OutsideReference = 5,
    SerializedFromKey = 6,
    CustomSerializedObjects = 7,
    ObjectType = 8,
    ArrayRank = 9,
    ArrayCount = 10,
    KeyType = 11,
    CustomSerializedObjectsCount = 12,
}
