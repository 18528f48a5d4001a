// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Traps for errors that cannot be reported through a channel.

use std::fmt;
use std::sync::Arc;

use crate::Error;

mod default;

pub use self::default::DefaultTrap;

/// A trap receives errors raised where no caller can receive them, for example while a sink
/// is dropped or while the rotator runs inside a sink's write path.
///
/// A trap must never write to a channel.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error.
    fn trap(&self, err: &Error);
}

impl<T: Trap + ?Sized> Trap for Arc<T> {
    fn trap(&self, err: &Error) {
        (**self).trap(err);
    }
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
