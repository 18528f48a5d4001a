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


//! Named log channels.

use std::cell::RefCell;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::Arg;
use crate::Kind;
use crate::LogEntry;
use crate::bridge::FrameCounter;
use crate::format::Formatter;
use crate::sink::Sink;

type SinkList = Arc<Vec<Arc<dyn Sink>>>;

/// A builder to configure and create a [`Channel`].
#[derive(Debug)]
pub struct ChannelBuilder {
    name: String,
    prefix: Option<String>,
    formatter: Option<Arc<Formatter>>,
    frames: Option<FrameCounter>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl ChannelBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            formatter: None,
            frames: None,
            sinks: vec![],
        }
    }

    /// Set the display prefix.
    ///
    /// Default to the channel name.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the formatter shared with other channels.
    ///
    /// Default to a [`Formatter`] with the default renderers.
    #[must_use]
    pub fn formatter(mut self, formatter: Arc<Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Stamp entries with the given frame counter.
    ///
    /// Without a frame counter, entries carry no sequence stamp.
    #[must_use]
    pub fn frames(mut self, frames: FrameCounter) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Attach a sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build the [`Channel`].
    pub fn build(self) -> Channel {
        let ChannelBuilder {
            name,
            prefix,
            formatter,
            frames,
            sinks,
        } = self;

        let prefix = prefix.unwrap_or_else(|| name.clone());
        let formatted_prefix = format_prefix(&prefix);
        Channel {
            name,
            prefix,
            formatted_prefix,
            formatter: formatter.unwrap_or_default(),
            frames,
            sinks: ReentrantMutex::new(RefCell::new(Arc::new(sinks))),
        }
    }
}

/// A named dispatcher fanning entries out to its sinks.
///
/// All writes to one channel are serialized, so every sink observes the entries of a channel in
/// the same order. A sink that writes back into the channel it is serving, on the same thread,
/// has its entry delivered immediately instead of deadlocking.
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
/// let channel = Channel::builder("Network").prefix("Net").sink(memory.clone()).build();
///
/// channel.info("Connected to {0}", args!["localhost"]);
/// assert_eq!(memory.messages(), vec!["Connected to localhost"]);
/// ```
pub struct Channel {
    name: String,
    prefix: String,
    formatted_prefix: String,
    formatter: Arc<Formatter>,
    frames: Option<FrameCounter>,
    sinks: ReentrantMutex<RefCell<SinkList>>,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("sinks", &self.sinks().len())
            .finish()
    }
}

impl Channel {
    /// Create a channel without sinks, using the name as prefix.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Create a builder for a channel with the given name.
    pub fn builder(name: impl Into<String>) -> ChannelBuilder {
        ChannelBuilder::new(name)
    }

    /// The channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The display prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The display prefix as written in front of each line, such as `"[Default]"`.
    pub fn formatted_prefix(&self) -> &str {
        &self.formatted_prefix
    }

    /// The frame counter stamping entries of this channel, if any.
    pub fn frames(&self) -> Option<&FrameCounter> {
        self.frames.as_ref()
    }

    /// Attach a sink. Sinks receive entries in the order they were attached.
    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        let guard = self.sinks.lock();
        let mut sinks = guard.borrow_mut();
        let mut next: Vec<_> = sinks.iter().cloned().collect();
        next.push(sink);
        *sinks = Arc::new(next);
    }

    /// Detach a sink, returning whether it was attached.
    pub fn remove_sink(&self, sink: &Arc<dyn Sink>) -> bool {
        let guard = self.sinks.lock();
        let mut sinks = guard.borrow_mut();
        let Some(index) = sinks.iter().position(|s| same_sink(s, sink)) else {
            return false;
        };
        let mut next: Vec<_> = sinks.iter().cloned().collect();
        next.remove(index);
        *sinks = Arc::new(next);
        true
    }

    /// A snapshot of the attached sinks.
    pub fn sinks(&self) -> Vec<Arc<dyn Sink>> {
        let guard = self.sinks.lock();
        let sinks = guard.borrow();
        sinks.iter().cloned().collect()
    }

    /// Increase the indentation of every attached sink.
    pub fn push_indent(&self) {
        self.for_each_sink(|sink| sink.push_indent());
    }

    /// Decrease the indentation of every attached sink.
    pub fn pop_indent(&self) {
        self.for_each_sink(|sink| sink.pop_indent());
    }

    /// Flush every attached sink, ignoring failures.
    pub fn flush(&self) {
        self.for_each_sink(|sink| {
            let _ = sink.flush();
        });
    }

    /// Write a debug-only message.
    pub fn debug(&self, template: &str, args: &[Arg]) {
        self.write(Kind::Debug, template, args);
    }

    /// Write a regular message.
    pub fn info(&self, template: &str, args: &[Arg]) {
        self.write(Kind::Info, template, args);
    }

    /// Write a warning.
    pub fn warn(&self, template: &str, args: &[Arg]) {
        self.write(Kind::Warning, template, args);
    }

    /// Write a recoverable error.
    pub fn error(&self, template: &str, args: &[Arg]) {
        self.write(Kind::Error, template, args);
    }

    /// Write a non-recoverable error.
    pub fn fatal(&self, template: &str, args: &[Arg]) {
        self.write(Kind::Fatal, template, args);
    }

    /// Format the template and fan the resulting entry out to every sink.
    ///
    /// Never fails: formatting falls back to a plain rendering of the call, and sink failures
    /// and panics are swallowed.
    pub fn write(&self, kind: Kind, template: &str, args: &[Arg]) {
        let _guard = self.sinks.lock();
        let message = self.formatter.format(template, args);
        let entry = LogEntry::new(kind, message).with_sequence(self.sequence());
        self.dispatch(entry, find_context(args));
    }

    /// Fan a prepared entry out to every sink.
    ///
    /// The message is used as is, without formatting. This is how entries received from another
    /// logging facility are replayed.
    pub fn write_entry(&self, entry: LogEntry, context: Option<&Arg>) {
        let _guard = self.sinks.lock();
        self.dispatch(entry, context);
    }

    fn sequence(&self) -> Option<u64> {
        self.frames.as_ref().and_then(FrameCounter::current)
    }

    fn dispatch(&self, mut entry: LogEntry, context: Option<&Arg>) {
        entry.sanitize();
        let entry = &entry;
        self.for_each_sink(|sink| {
            // a failing sink must not be reported through the logs it failed to write
            let _ = sink.write(self, entry, context);
        });
    }

    fn for_each_sink(&self, mut f: impl FnMut(&dyn Sink)) {
        let guard = self.sinks.lock();
        let sinks: SinkList = guard.borrow().clone();
        for sink in sinks.iter() {
            let _ = panic::catch_unwind(AssertUnwindSafe(|| f(sink.as_ref())));
        }
    }
}

/// Whether two sink handles refer to the same sink.
pub(crate) fn same_sink(a: &Arc<dyn Sink>, b: &Arc<dyn Sink>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn format_prefix(prefix: &str) -> String {
    format!("{:<9}", format!("[{prefix}]"))
}

/// The first handle among the arguments, otherwise the first argument.
fn find_context(args: &[Arg]) -> Option<&Arg> {
    args.iter()
        .find(|arg| arg.as_handle().is_some())
        .or_else(|| args.first())
}
