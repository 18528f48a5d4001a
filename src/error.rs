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

//! The error type shared by sinks, hosts and channel setup.

use std::fmt;
use std::io;

/// An error raised while writing, rotating or wiring up logs.
///
/// An error carries a message, key/value details such as the affected path, and an optional
/// cause. The plain [`Display`](fmt::Display) form shows the message and details; the alternate
/// form `{:#}` appends the chain of causes, as used when an error cannot be logged to a channel.
///
/// # Examples
///
/// ```
/// use logchan::Error;
///
/// let err = Error::io("failed to open log file", std::io::Error::other("disk full"))
///     .with_context("path", "Logs/log.txt");
/// assert_eq!(err.to_string(), "failed to open log file (path: Logs/log.txt)");
/// assert_eq!(
///     format!("{err:#}"),
///     "failed to open log file (path: Logs/log.txt): disk full"
/// );
/// ```
pub struct Error {
    message: String,
    context: Vec<(&'static str, String)>,
    cause: Option<anyhow::Error>,
}

impl Error {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: vec![],
            cause: None,
        }
    }

    /// Create an error for an I/O operation that failed while doing what `message` says.
    pub fn io(message: impl Into<String>, err: io::Error) -> Self {
        Error::new(message).with_source(err)
    }

    /// Attach a detail, such as the path of the file involved.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Set the error that caused this one, replacing any previous cause.
    pub fn with_source(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// The message of this error, without details and cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The value of the first detail attached under `key`.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn causes(&self) -> impl Iterator<Item = &(dyn std::error::Error + 'static)> {
        std::iter::successors(std::error::Error::source(self), |&err| {
            std::error::Error::source(err)
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;

        if !self.context.is_empty() {
            f.write_str(" (")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key}: {value}")?;
            }
            f.write_str(")")?;
        }

        if f.alternate() {
            for cause in self.causes() {
                write!(f, ": {cause}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f
                .debug_struct("Error")
                .field("message", &self.message)
                .field("context", &self.context)
                .field("cause", &self.cause)
                .finish();
        }

        write!(f, "{self}")?;
        if self.cause.is_some() {
            write!(f, "\n\nCaused by:")?;
            for (i, cause) in self.causes().enumerate() {
                write!(f, "\n    {i}: {cause}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|cause| cause.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_context() {
        let err = Error::io("failed to delete log file", io::Error::other("permission denied"))
            .with_context("path", "Logs/log 1980.txt")
            .with_context("size", 42);

        assert_eq!(
            err.to_string(),
            "failed to delete log file (path: Logs/log 1980.txt, size: 42)"
        );
        assert_eq!(err.message(), "failed to delete log file");
        assert_eq!(err.context("size"), Some("42"));
        assert_eq!(err.context("missing"), None);
    }

    #[test]
    fn test_alternate_display_walks_causes() {
        let inner = Error::io("failed to open", io::Error::other("disk full"));
        let err = Error::new("rotation stopped").with_source(inner);

        assert_eq!(format!("{err:#}"), "rotation stopped: failed to open: disk full");
        assert_eq!(err.causes().count(), 2);
        assert_eq!(
            format!("{err:?}"),
            "rotation stopped\n\nCaused by:\n    0: failed to open\n    1: disk full"
        );
    }

    #[test]
    fn test_display_plain() {
        let err = Error::new("closed");
        assert_eq!(err.to_string(), "closed");
        assert_eq!(format!("{err:#}"), "closed");
        assert_eq!(format!("{err:?}"), "closed");
        assert!(std::error::Error::source(&err).is_none());
    }
}
