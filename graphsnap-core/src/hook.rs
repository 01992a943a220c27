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

//! Symmetric custom payloads.
//!
//! A hook runs once per object in both directions with the same code. While
//! encoding, every [`HookContext::exchange`] records its argument and hands
//! it back. While decoding, each call ignores its argument and returns the
//! next recorded value instead, so a hook written as
//!
//! ```rust
//! use graphsnap_core::error::Error;
//! use graphsnap_core::hook::HookContext;
//!
//! struct Texture {
//!     pixels: Vec<u8>,
//!     uploaded: bool,
//! }
//!
//! impl Texture {
//!     fn sync_pixels(&mut self, context: &mut HookContext) -> Result<(), Error> {
//!         self.pixels = context.exchange_as(std::mem::take(&mut self.pixels))?;
//!         if context.is_restoring() {
//!             self.uploaded = false;
//!         }
//!         Ok(())
//!     }
//! }
//! ```
//!
//! persists and restores `pixels` without a field accessor. Both directions
//! must exchange the same number of values.

use crate::error::Error;
use crate::value::{FromValue, ToValue, Value};
use std::fmt;

/// Deferred work queued by a hook during decode.
pub type AfterRestore = Box<dyn FnOnce()>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Collect,
    Replay,
}

/// What a hook sees while it runs.
pub struct HookContext {
    mode: Mode,
    owner: &'static str,
    hook: &'static str,
    values: Vec<Value>,
    cursor: usize,
    after_restore: Vec<AfterRestore>,
}

impl HookContext {
    pub(crate) fn collecting(owner: &'static str, hook: &'static str) -> HookContext {
        HookContext {
            mode: Mode::Collect,
            owner,
            hook,
            values: Vec::new(),
            cursor: 0,
            after_restore: Vec::new(),
        }
    }

    pub(crate) fn replaying(
        owner: &'static str,
        hook: &'static str,
        values: Vec<Value>,
    ) -> HookContext {
        HookContext {
            mode: Mode::Replay,
            owner,
            hook,
            values,
            cursor: 0,
            after_restore: Vec::new(),
        }
    }

    /// `true` while decoding.
    pub fn is_restoring(&self) -> bool {
        self.mode == Mode::Replay
    }

    /// Records `value` when encoding and returns it; returns the next
    /// persisted value when decoding.
    pub fn exchange(&mut self, value: impl Into<Value>) -> Result<Value, Error> {
        match self.mode {
            Mode::Collect => {
                let value = value.into();
                self.values.push(value.clone());
                Ok(value)
            }
            Mode::Replay => {
                let Some(value) = self.values.get_mut(self.cursor) else {
                    return Err(Error::hook_mismatch(format!(
                        "hook {}::{} asked for value #{} but only {} were persisted",
                        self.owner,
                        self.hook,
                        self.cursor + 1,
                        self.values.len()
                    )));
                };
                self.cursor += 1;
                Ok(std::mem::replace(value, Value::Null))
            }
        }
    }

    /// Typed [`exchange`](Self::exchange). Encoding returns `value` untouched.
    pub fn exchange_as<T: ToValue + FromValue>(&mut self, value: T) -> Result<T, Error> {
        match self.mode {
            Mode::Collect => {
                self.values.push(value.to_value());
                Ok(value)
            }
            Mode::Replay => {
                let persisted = self.exchange(Value::Null)?;
                T::from_value(persisted).map_err(|e| {
                    Error::hook_mismatch(format!(
                        "hook {}::{} value #{}: {e}",
                        self.owner, self.hook, self.cursor
                    ))
                })
            }
        }
    }

    /// Queues `callback` to run once the whole graph is restored. Callbacks
    /// run in the order they were queued. Ignored while encoding.
    pub fn run_after_restore<F>(&mut self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        if self.mode == Mode::Replay {
            self.after_restore.push(Box::new(callback));
        }
    }

    pub(crate) fn into_collected(self) -> Vec<Value> {
        self.values
    }

    /// Checks that the hook consumed everything it was given.
    pub(crate) fn finish_replay(self) -> Result<Vec<AfterRestore>, Error> {
        if self.cursor != self.values.len() {
            return Err(Error::hook_mismatch(format!(
                "hook {}::{} read {} of {} persisted values",
                self.owner,
                self.hook,
                self.cursor,
                self.values.len()
            )));
        }
        Ok(self.after_restore)
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("mode", &self.mode)
            .field("hook", &format_args!("{}::{}", self.owner, self.hook))
            .field("values", &self.values.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
