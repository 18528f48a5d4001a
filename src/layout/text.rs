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


use std::fmt::Write;

#[cfg(feature = "colored")]
use colored::Color;
#[cfg(feature = "colored")]
use colored::Colorize;
use jiff::tz::TimeZone;

use crate::Channel;
use crate::Error;
use crate::Kind;
use crate::LogEntry;
use crate::sink::file::TextFileConfig;

/// Width of one indentation level, in spaces.
pub(crate) const INDENT_WIDTH: usize = 2;

/// A layout that renders an entry as one or more lines of text.
///
/// Output format:
///
/// ```text
/// (17:12:52.014) (   1024) [Default] ERROR: Failed to load scene 'Main'
///                                            Stacktrace:
/// (17:12:52.015) (   1024) [Net]      WARN: Connection lost
/// ```
///
/// The first line of a message carries the header, continuation lines are aligned with the
/// message text. Empty lines are dropped.
///
/// # Examples
///
/// ```
/// use logchan::Channel;
/// use logchan::Kind;
/// use logchan::LogEntry;
/// use logchan::layout::TextLayout;
///
/// let layout = TextLayout::default().timestamps(false).sequence_stamps(false);
/// let channel = Channel::new("Default");
/// let entry = LogEntry::new(Kind::Info, "Hello\nworld");
/// let lines = layout.format(&channel, &entry, 0).unwrap();
/// assert_eq!(lines, vec!["[Default]  INFO: Hello", "                 world"]);
/// ```
#[derive(Debug, Clone)]
pub struct TextLayout {
    standard_labels: bool,
    timestamps: bool,
    sequence_stamps: bool,
    timestamp_format: String,
    sequence_width: usize,
    timezone: TimeZone,
    #[cfg(feature = "colored")]
    colors: Option<KindColor>,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            standard_labels: true,
            timestamps: true,
            sequence_stamps: true,
            timestamp_format: TextFileConfig::DEFAULT_TIMESTAMP_FORMAT.to_string(),
            sequence_width: TextFileConfig::DEFAULT_SEQUENCE_WIDTH,
            timezone: TimeZone::UTC,
            #[cfg(feature = "colored")]
            colors: None,
        }
    }
}

impl TextLayout {
    /// Create a layout following the text options of a file configuration.
    pub fn from_config(config: &TextFileConfig) -> Self {
        Self::default()
            .standard_labels(config.use_standard_severity_labels)
            .timestamps(config.write_timestamps)
            .sequence_stamps(config.write_sequence_stamps)
            .timestamp_format(config.timestamp_format.clone())
            .sequence_width(config.sequence_width)
    }

    /// Use `DEBUG`, ` INFO`, ... instead of `Dbg`, `Msg`, ... as severity labels.
    ///
    /// Default to `true`.
    #[must_use]
    pub fn standard_labels(mut self, yes: bool) -> Self {
        self.standard_labels = yes;
        self
    }

    /// Write the entry timestamp in front of each entry.
    ///
    /// Default to `true`.
    #[must_use]
    pub fn timestamps(mut self, yes: bool) -> Self {
        self.timestamps = yes;
        self
    }

    /// Write the sequence stamp in front of each entry.
    ///
    /// Default to `true`.
    #[must_use]
    pub fn sequence_stamps(mut self, yes: bool) -> Self {
        self.sequence_stamps = yes;
        self
    }

    /// Set the timestamp format, see [`jiff::fmt::strtime`].
    ///
    /// Default to `"(%H:%M:%S%.3f)"`.
    #[must_use]
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Set the width the sequence stamp is right aligned to.
    ///
    /// Default to `7`.
    #[must_use]
    pub fn sequence_width(mut self, width: usize) -> Self {
        self.sequence_width = width;
        self
    }

    /// Set the timezone for timestamps.
    ///
    /// Default to UTC.
    #[must_use]
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    /// Color the severity label.
    #[cfg(feature = "colored")]
    #[must_use]
    pub fn colored(mut self) -> Self {
        self.colors = Some(KindColor::default());
        self
    }

    /// Render the entry into lines, with the message indented by `indent` levels.
    ///
    /// # Errors
    ///
    /// Return an error if the timestamp format is invalid.
    pub fn format(
        &self,
        channel: &Channel,
        entry: &LogEntry,
        indent: usize,
    ) -> Result<Vec<String>, Error> {
        let mut header = String::new();
        if self.timestamps {
            let time = entry.timestamp().to_zoned(self.timezone.clone());
            write!(&mut header, "{} ", time.strftime(&self.timestamp_format)).map_err(|err| {
                Error::new("failed to format timestamp")
                    .with_context("format", &self.timestamp_format)
                    .with_source(err)
            })?;
        }
        if self.sequence_stamps {
            let width = self.sequence_width;
            // SAFETY: write to a string always succeeds
            write!(&mut header, "({:>width$}) ", entry.sequence_stamp()).unwrap();
        }
        header.push_str(channel.formatted_prefix());
        header.push(' ');

        let label = self.label(entry.kind());
        let width = header.chars().count() + label.chars().count() + 2 + indent * INDENT_WIDTH;
        header.push_str(&self.colorize(entry.kind(), label));
        header.push_str(": ");
        header.extend(std::iter::repeat_n(' ', indent * INDENT_WIDTH));

        let lines = split_lines(entry.message())
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("{header}{line}")
                } else {
                    format!("{:width$}{line}", "")
                }
            })
            .collect();
        Ok(lines)
    }

    fn label(&self, kind: Kind) -> &'static str {
        if self.standard_labels {
            kind.standard_label()
        } else {
            kind.short_label()
        }
    }

    #[cfg(feature = "colored")]
    fn colorize(&self, kind: Kind, label: &str) -> String {
        match &self.colors {
            Some(colors) => label.color(colors.of(kind)).to_string(),
            None => label.to_string(),
        }
    }

    #[cfg(not(feature = "colored"))]
    fn colorize(&self, _: Kind, label: &str) -> String {
        label.to_string()
    }
}

/// Split a message into its non-empty lines.
pub(crate) fn split_lines(message: &str) -> impl Iterator<Item = &str> {
    message
        .split(['\n', '\r', '\0'])
        .filter(|line| !line.is_empty())
}

/// Colors for different kinds.
#[cfg(feature = "colored")]
#[derive(Debug, Clone)]
struct KindColor {
    fatal: Color,
    error: Color,
    warning: Color,
    info: Color,
    debug: Color,
}

#[cfg(feature = "colored")]
impl Default for KindColor {
    fn default() -> Self {
        Self {
            fatal: Color::BrightRed,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Blue,
            debug: Color::Cyan,
        }
    }
}

#[cfg(feature = "colored")]
impl KindColor {
    fn of(&self, kind: Kind) -> Color {
        match kind {
            Kind::Fatal => self.fatal,
            Kind::Error => self.error,
            Kind::Warning => self.warning,
            Kind::Info => self.info,
            Kind::Debug => self.debug,
        }
    }
}
