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


use std::io::Write;

use crate::Arg;
use crate::Channel;
use crate::Error;
use crate::LogEntry;
use crate::layout::TextLayout;
use crate::sink::Indent;
use crate::sink::Sink;

/// A sink that prints entries to stdout.
///
/// # Examples
///
/// ```
/// use logchan::sink::Stdout;
///
/// let stdout_sink = Stdout::default();
/// ```
#[derive(Debug)]
pub struct Stdout {
    layout: TextLayout,
    indent: Indent,
}

impl Default for Stdout {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            indent: Indent::default(),
        }
    }
}

impl Stdout {
    /// Set the layout for the [`Stdout`] sink.
    ///
    /// # Examples
    ///
    /// ```
    /// use logchan::layout::TextLayout;
    /// use logchan::sink::Stdout;
    ///
    /// let stdout_sink = Stdout::default().with_layout(TextLayout::default().timestamps(false));
    /// ```
    pub fn with_layout(mut self, layout: TextLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Sink for Stdout {
    fn write(&self, channel: &Channel, entry: &LogEntry, _: Option<&Arg>) -> Result<(), Error> {
        let bytes = render(&self.layout, channel, entry, self.indent.get())?;
        std::io::stdout()
            .write_all(&bytes)
            .map_err(|err| Error::io("failed to write to stdout", err))?;
        Ok(())
    }

    fn push_indent(&self) {
        self.indent.push();
    }

    fn pop_indent(&self) {
        self.indent.pop();
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stdout()
            .flush()
            .map_err(|err| Error::io("failed to flush stdout", err))?;
        Ok(())
    }
}

/// A sink that prints entries to stderr.
///
/// # Examples
///
/// ```
/// use logchan::sink::Stderr;
///
/// let stderr_sink = Stderr::default();
/// ```
#[derive(Debug)]
pub struct Stderr {
    layout: TextLayout,
    indent: Indent,
}

impl Default for Stderr {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            indent: Indent::default(),
        }
    }
}

impl Stderr {
    /// Set the layout for the [`Stderr`] sink.
    pub fn with_layout(mut self, layout: TextLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Sink for Stderr {
    fn write(&self, channel: &Channel, entry: &LogEntry, _: Option<&Arg>) -> Result<(), Error> {
        let bytes = render(&self.layout, channel, entry, self.indent.get())?;
        std::io::stderr()
            .write_all(&bytes)
            .map_err(|err| Error::io("failed to write to stderr", err))?;
        Ok(())
    }

    fn push_indent(&self) {
        self.indent.push();
    }

    fn pop_indent(&self) {
        self.indent.pop();
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stderr()
            .flush()
            .map_err(|err| Error::io("failed to flush stderr", err))?;
        Ok(())
    }
}

#[cfg(feature = "colored")]
fn default_layout() -> TextLayout {
    TextLayout::default().colored()
}

#[cfg(not(feature = "colored"))]
fn default_layout() -> TextLayout {
    TextLayout::default()
}

// All lines of an entry in one buffer, so a single write keeps them together.
fn render(
    layout: &TextLayout,
    channel: &Channel,
    entry: &LogEntry,
    indent: usize,
) -> Result<Vec<u8>, Error> {
    let mut bytes = vec![];
    for line in layout.format(channel, entry, indent)? {
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
    }
    Ok(bytes)
}
