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


//! Sinks receiving the entries of channels.

use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::Arg;
use crate::Channel;
use crate::Error;
use crate::LogEntry;

pub mod file;
mod filtered;
mod memory;
mod stdio;
mod testing;

pub use self::file::FileSink;
pub use self::filtered::Filtered;
pub use self::memory::Memory;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;
pub use self::testing::Testing;

/// An output adapter that can be attached to one or more channels.
///
/// A sink must not hold any lock of its own while writing back into a channel.
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// Write an entry of the given channel.
    ///
    /// `context` is the argument the entry is about, if any; its interpretation is up to the
    /// sink. Errors are ignored by the channel.
    fn write(&self, channel: &Channel, entry: &LogEntry, context: Option<&Arg>)
    -> Result<(), Error>;

    /// Indent subsequent entries by one more level.
    ///
    /// Default to a no-op.
    fn push_indent(&self) {}

    /// Indent subsequent entries by one level less.
    ///
    /// Default to a no-op.
    fn pop_indent(&self) {}

    /// Flush any buffered output.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// The indentation level of a sink. Never drops below zero.
#[derive(Debug, Default)]
pub(crate) struct Indent(AtomicUsize);

impl Indent {
    pub(crate) fn push(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn pop(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}
