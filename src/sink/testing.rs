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


use crate::Arg;
use crate::Channel;
use crate::Error;
use crate::LogEntry;
use crate::layout::TextLayout;
use crate::sink::Indent;
use crate::sink::Sink;

/// A sink that writes entries that can be captured by a test harness (like `cargo test`), and
/// thus the outputs are suppressed unless `--nocapture` or `--show-output` is specified.
///
/// # Examples
///
/// ```
/// use logchan::sink::Testing;
///
/// let test_sink = Testing::default();
/// ```
#[derive(Debug, Default)]
pub struct Testing {
    layout: TextLayout,
    indent: Indent,
}

impl Testing {
    /// Set the layout for the [`Testing`] sink.
    pub fn with_layout(mut self, layout: TextLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Sink for Testing {
    fn write(&self, channel: &Channel, entry: &LogEntry, _: Option<&Arg>) -> Result<(), Error> {
        for line in self.layout.format(channel, entry, self.indent.get())? {
            eprintln!("{line}");
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
