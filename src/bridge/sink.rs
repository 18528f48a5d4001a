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


use std::sync::Arc;

use crate::Arg;
use crate::Channel;
use crate::Error;
use crate::LogEntry;
use crate::Origin;
use crate::bridge::Bridge;
use crate::context::SYSTEM_CHANNEL;
use crate::layout::INDENT_WIDTH;
use crate::layout::split_lines;
use crate::sink::Indent;
use crate::sink::Sink;

/// A sink emitting entries to the host's native log through a [`Bridge`].
///
/// The first line of an entry is prefixed with the channel prefix, and every line is indented.
/// Entries replayed from the native log are skipped. Entries of the `System` channel are skipped
/// as well when the host is a development console.
#[derive(Debug)]
pub struct HostSink {
    bridge: Arc<Bridge>,
    indent: Indent,
}

impl HostSink {
    /// Create a sink emitting through the given bridge.
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self {
            bridge,
            indent: Indent::default(),
        }
    }

    /// The bridge entries are emitted through.
    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }
}

impl Sink for HostSink {
    fn write(&self, channel: &Channel, entry: &LogEntry, _: Option<&Arg>) -> Result<(), Error> {
        if entry.origin() == Origin::Host {
            return Ok(());
        }
        if channel.name() == SYSTEM_CHANNEL && self.bridge.host().is_development_console() {
            return Ok(());
        }

        let text = render(channel.formatted_prefix(), entry.message(), self.indent.get());
        if !text.is_empty() {
            self.bridge.forward(entry, &text);
        }
        Ok(())
    }

    fn push_indent(&self) {
        self.indent.push();
    }

    fn pop_indent(&self) {
        self.indent.pop();
    }
}

fn render(prefix: &str, message: &str, indent: usize) -> String {
    let indent = " ".repeat(indent * INDENT_WIDTH);
    split_lines(message)
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{indent}{prefix} {line}")
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_indents_every_line() {
        assert_eq!(render("[Default]", "a\nb", 0), "[Default] a\nb");
        assert_eq!(render("[Net]    ", "a\r\nb", 1), "  [Net]     a\n  b");
        assert_eq!(render("[Default]", "\n", 0), "");
    }
}
