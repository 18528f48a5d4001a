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

//! Log entries and their severities.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;

use crate::Error;

/// The severity of a [`LogEntry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// A debug-only message that should be absent in non-development builds.
    Debug,
    /// A regular log message.
    Info,
    /// Something might be wrong, though the application can continue as intended.
    Warning,
    /// A recoverable failure that may limit functionality.
    Error,
    /// A non-recoverable failure.
    Fatal,
}

impl Kind {
    /// All kinds, from the least to the most severe.
    pub const ALL: [Kind; 5] = [
        Kind::Debug,
        Kind::Info,
        Kind::Warning,
        Kind::Error,
        Kind::Fatal,
    ];

    /// The standard label, right aligned to five characters.
    pub fn standard_label(&self) -> &'static str {
        match self {
            Kind::Debug => "DEBUG",
            Kind::Info => " INFO",
            Kind::Warning => " WARN",
            Kind::Error => "ERROR",
            Kind::Fatal => "FATAL",
        }
    }

    /// The abbreviated label.
    pub fn short_label(&self) -> &'static str {
        match self {
            Kind::Debug => "Dbg",
            Kind::Info => "Msg",
            Kind::Warning => "Wrn",
            Kind::Error => "ERR",
            Kind::Fatal => "FAT",
        }
    }

    /// The closest level of the `log` crate.
    pub fn to_log_level(&self) -> log::Level {
        match self {
            Kind::Debug => log::Level::Debug,
            Kind::Info => log::Level::Info,
            Kind::Warning => log::Level::Warn,
            Kind::Error | Kind::Fatal => log::Level::Error,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.standard_label().trim_start())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "dbg" => Ok(Kind::Debug),
            "info" | "msg" | "message" => Ok(Kind::Info),
            "warn" | "warning" | "wrn" => Ok(Kind::Warning),
            "error" | "err" => Ok(Kind::Error),
            "fatal" | "fat" => Ok(Kind::Fatal),
            _ => Err(Error::new("unknown log kind").with_context("kind", s)),
        }
    }
}

/// Where an entry was first written.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Written through a channel of this process.
    #[default]
    Local,
    /// Received from the host's native log and replayed into a channel.
    Host,
}

/// A single log message, created once per write call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    kind: Kind,
    message: String,
    timestamp: Timestamp,
    sequence: Option<u64>,
    origin: Origin,
}

const BROKEN_MESSAGE_PREFIX: usize = 50;
const BROKEN_MESSAGE_MARKER: &str = " | Contains '\\0' and is likely broken.";

impl LogEntry {
    /// Create an entry observed now, without a sequence stamp.
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Timestamp::now(),
            sequence: None,
            origin: Origin::Local,
        }
    }

    /// Set the sequence stamp.
    pub fn with_sequence(mut self, sequence: Option<u64>) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set the observed time.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// The severity.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The formatted message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The observed time, in UTC.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The frame or sequence stamp. `None` when the entry was written off the main thread.
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// The sequence stamp as displayed, `-1` when unavailable.
    pub fn sequence_stamp(&self) -> i64 {
        self.sequence
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(-1)
    }

    /// Where the entry came from.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Crop a message containing a null character; it is most likely a binary payload.
    pub(crate) fn sanitize(&mut self) {
        let Some(null_at) = self.message.chars().position(|c| c == '\0') else {
            return;
        };

        let mut cropped: String = self
            .message
            .chars()
            .take(null_at.min(BROKEN_MESSAGE_PREFIX))
            .collect();
        cropped.push_str(BROKEN_MESSAGE_MARKER);
        self.message = cropped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_crops_before_null() {
        let mut entry = LogEntry::new(Kind::Info, "abc\0def");
        entry.sanitize();
        assert_eq!(entry.message(), "abc | Contains '\\0' and is likely broken.");
    }

    #[test]
    fn test_sanitize_keeps_at_most_fifty_chars() {
        let message = format!("{}\0tail", "x".repeat(80));
        let mut entry = LogEntry::new(Kind::Warning, message);
        entry.sanitize();
        assert_eq!(
            entry.message(),
            format!("{}{}", "x".repeat(50), BROKEN_MESSAGE_MARKER)
        );
        assert!(!entry.message().contains('\0'));
    }

    #[test]
    fn test_sanitize_leaves_clean_messages() {
        let mut entry = LogEntry::new(Kind::Error, "clean");
        entry.sanitize();
        assert_eq!(entry.message(), "clean");
    }

    #[test]
    fn test_sequence_stamp() {
        let entry = LogEntry::new(Kind::Debug, "x");
        assert_eq!(entry.sequence_stamp(), -1);
        assert_eq!(entry.with_sequence(Some(42)).sequence_stamp(), 42);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("warn".parse::<Kind>().unwrap(), Kind::Warning);
        assert_eq!("FATAL".parse::<Kind>().unwrap(), Kind::Fatal);
        assert!("loud".parse::<Kind>().is_err());
    }
}
