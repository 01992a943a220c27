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

//! Error type shared by every encode, decode and catalog operation.
//!
//! Errors are created through the static constructors on [`Error`] rather
//! than the enum variants, so that the `GRAPHSNAP_PANIC_ON_ERROR` switch can
//! turn any error into a panic at the exact site where it was raised.

use std::borrow::Cow;

use thiserror::Error;

/// Set `GRAPHSNAP_PANIC_ON_ERROR=1` at compile time to panic where errors are created.
pub const PANIC_ON_ERROR: bool = option_env!("GRAPHSNAP_PANIC_ON_ERROR").is_some();

#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for snapshot and restore operations.
///
/// **Always** use the static constructor functions (`Error::invalid_data`,
/// `Error::hook_mismatch`, ...) instead of the variants.
///
/// ```rust
/// use graphsnap_core::error::Error;
///
/// let err = Error::invalid_data("slot 7 points past the arena end");
/// let err = Error::type_mismatch("game::Player", "game::Camera");
/// ```
///
/// ## Debug Mode: GRAPHSNAP_PANIC_ON_ERROR
///
/// ```bash
/// RUST_BACKTRACE=1 GRAPHSNAP_PANIC_ON_ERROR=1 cargo test
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The root handed to the encoder is part of the live container.
    #[error("{0}")]
    RootIsLive(Cow<'static, str>),

    /// Two type descriptions disagree (names, field counts, downcasts).
    #[error("Type mismatch: expected {0}, found {1}")]
    TypeMismatch(Cow<'static, str>, Cow<'static, str>),

    /// Buffer boundary violation while reading.
    #[error("Buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// Invalid or corrupted data encountered.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// A back reference points at a block that was never built.
    #[error("{0}")]
    InvalidRef(Cow<'static, str>),

    /// A hook read or wrote a different number of values than were recorded.
    #[error("{0}")]
    HookMismatch(Cow<'static, str>),

    /// General type-related error.
    #[error("{0}")]
    TypeError(Cow<'static, str>),

    /// Maximum graph depth exceeded.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    /// Unsupported shape, such as a multi-dimensional array.
    #[error("{0}")]
    Unsupported(Cow<'static, str>),

    /// Operation not allowed in current context.
    #[error("{0}")]
    NotAllowed(Cow<'static, str>),

    /// Generic unknown error.
    #[error("{0}")]
    Unknown(Cow<'static, str>),
}

impl Error {
    /// Creates a new [`Error::RootIsLive`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn root_is_live<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::RootIsLive(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::TypeMismatch`] from the expected and found type names.
    ///
    /// ```
    /// use graphsnap_core::error::Error;
    ///
    /// let err = Error::type_mismatch("Player", "Camera");
    /// assert_eq!(err.to_string(), "Type mismatch: expected Player, found Camera");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_mismatch<A, B>(expected: A, found: B) -> Self
    where
        A: Into<Cow<'static, str>>,
        B: Into<Cow<'static, str>>,
    {
        let err = Error::TypeMismatch(expected.into(), found.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::InvalidData`] from a string or static message.
    ///
    /// ```
    /// use graphsnap_core::error::Error;
    ///
    /// let err = Error::invalid_data("bad magic");
    /// let err = Error::invalid_data(format!("unknown handle tag {}", 42));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::InvalidData(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::InvalidRef`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_ref<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::InvalidRef(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::HookMismatch`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn hook_mismatch<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::HookMismatch(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::TypeError`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_error<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::TypeError(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::DepthExceed`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn depth_exceed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::DepthExceed(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Unsupported`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unsupported<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::Unsupported(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::NotAllowed`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn not_allowed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::NotAllowed(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Unknown`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::Unknown(s.into());
        if PANIC_ON_ERROR {
            panic!("GRAPHSNAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Appends the Rust type name to a [`Error::TypeError`] message.
    ///
    /// ```
    /// use graphsnap_core::error::Error;
    ///
    /// let err = Error::enhance_type_error::<String>(Error::type_error("not a string"));
    /// assert_eq!(err.to_string(), "not a string (type: alloc::string::String)");
    /// ```
    #[inline(never)]
    pub fn enhance_type_error<T: ?Sized + 'static>(err: Error) -> Error {
        if let Error::TypeError(s) = err {
            let mut msg = s.to_string();
            msg.push_str(" (type: ");
            msg.push_str(std::any::type_name::<T>());
            msg.push(')');
            Error::type_error(msg)
        } else {
            err
        }
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// ```
/// use graphsnap_core::ensure;
/// use graphsnap_core::error::Error;
///
/// fn check_rank(rank: u32) -> Result<(), Error> {
///     ensure!(rank == 1, Error::unsupported("only rank-1 arrays"));
///     ensure!(rank > 0, "rank must be positive");
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::unknown($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::unknown(format!($fmt, $($arg)*)));
        }
    };
}
