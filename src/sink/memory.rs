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


use parking_lot::Mutex;
use parking_lot::MutexGuard;

use crate::Arg;
use crate::Channel;
use crate::Error;
use crate::LogEntry;
use crate::sink::Indent;
use crate::sink::Sink;

/// A sink that keeps every entry in memory, together with the name of its channel.
///
/// Useful to inspect what was logged, for example in tests or in a log viewer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use logchan::Channel;
/// use logchan::args;
/// use logchan::sink::Memory;
///
/// let memory = Arc::new(Memory::default());
/// let channel = Channel::builder("Default").sink(memory.clone()).build();
/// channel.warn("{0} retries left", args![2]);
///
/// let entries = memory.entries();
/// assert_eq!(entries[0].0, "Default");
/// assert_eq!(entries[0].1.message(), "2 retries left");
/// ```
#[derive(Debug, Default)]
pub struct Memory {
    entries: Mutex<Vec<(String, LogEntry)>>,
    indent: Indent,
}

impl Memory {
    fn entries_mut(&self) -> MutexGuard<'_, Vec<(String, LogEntry)>> {
        self.entries.lock()
    }

    /// A copy of all entries written so far, with the name of their channel.
    pub fn entries(&self) -> Vec<(String, LogEntry)> {
        self.entries_mut().clone()
    }

    /// The messages of all entries written so far.
    pub fn messages(&self) -> Vec<String> {
        self.entries_mut()
            .iter()
            .map(|(_, entry)| entry.message().to_string())
            .collect()
    }

    /// The number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries_mut().len()
    }

    /// Whether no entry was written.
    pub fn is_empty(&self) -> bool {
        self.entries_mut().is_empty()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries_mut().clear();
    }

    /// The current indentation level.
    pub fn indent(&self) -> usize {
        self.indent.get()
    }
}

impl Sink for Memory {
    fn write(&self, channel: &Channel, entry: &LogEntry, _: Option<&Arg>) -> Result<(), Error> {
        let record = (channel.name().to_string(), entry.clone());
        self.entries_mut().push(record);
        Ok(())
    }

    fn push_indent(&self) {
        self.indent.push();
    }

    fn pop_indent(&self) {
        self.indent.pop();
    }
}
