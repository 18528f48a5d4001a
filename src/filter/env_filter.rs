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


//! Provides [`env_filter`](https://crates.io/crates/env_filter) based filter for log entries.
//!
//! Channel names are used as targets, so `LOGCHAN=warn,Network=debug` keeps warnings and worse
//! everywhere and everything from the `Network` channel.

use std::borrow::Cow;

use log::LevelFilter;

use crate::Channel;
use crate::Error;
use crate::Filter;
use crate::LogEntry;
use crate::filter::FilterResult;

/// The default environment variable for filtering entries.
pub const DEFAULT_FILTER_ENV: &str = "LOGCHAN";

/// A filter consulting directives in the `env_logger` syntax.
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    /// Initializes the filter from the [`EnvFilterBuilder`].
    pub fn new(mut builder: EnvFilterBuilder) -> Self {
        EnvFilter(builder.0.build())
    }

    /// Initializes the filter from the environment using the default variable name `LOGCHAN`.
    /// If the variable is not set, the default value will be used.
    ///
    /// # Examples
    ///
    /// ```
    /// use logchan::filter::EnvFilter;
    /// let filter = EnvFilter::from_default_env_or("info");
    /// ```
    pub fn from_default_env_or<'a, V>(default: V) -> Self
    where
        V: Into<Cow<'a, str>>,
    {
        EnvFilter::from_env_or(DEFAULT_FILTER_ENV, default)
    }

    /// Initializes the filter from the environment using a specific variable name.
    /// If the variable is not set, the default value will be used.
    pub fn from_env_or<'a, 'b, E, V>(name: E, default: V) -> Self
    where
        E: Into<Cow<'a, str>>,
        V: Into<Cow<'b, str>>,
    {
        let name = name.into();
        let default = default.into();

        let builder = EnvFilterBuilder::new();
        match std::env::var(&*name) {
            Ok(s) => EnvFilter::new(builder.parse(&s)),
            Err(_) => EnvFilter::new(builder.parse(&default)),
        }
    }
}

impl Filter for EnvFilter {
    fn matches(&self, channel: &Channel, entry: &LogEntry) -> FilterResult {
        let metadata = log::Metadata::builder()
            .level(entry.kind().to_log_level())
            .target(channel.name())
            .build();

        if self.0.enabled(&metadata) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

impl From<EnvFilterBuilder> for EnvFilter {
    fn from(builder: EnvFilterBuilder) -> Self {
        EnvFilter::new(builder)
    }
}

/// A builder for [`EnvFilter`].
#[derive(Debug, Default)]
pub struct EnvFilterBuilder(env_filter::Builder);

impl EnvFilterBuilder {
    /// Create an empty builder. Without directives only errors are enabled.
    pub fn new() -> Self {
        EnvFilterBuilder(env_filter::Builder::new())
    }

    /// Set the level of one channel.
    pub fn filter_channel(mut self, channel: &str, level: LevelFilter) -> Self {
        self.0.filter_module(channel, level);
        self
    }

    /// Set the level of every channel without a directive of its own.
    pub fn filter_level(mut self, level: LevelFilter) -> Self {
        self.0.filter_level(level);
        self
    }

    /// Parse directives, failing on malformed input.
    pub fn try_parse(mut self, filters: &str) -> Result<Self, Error> {
        self.0.try_parse(filters).map_err(|err| {
            Error::new("failed to parse filter directives")
                .with_context("directives", filters)
                .with_source(err)
        })?;
        Ok(self)
    }

    /// Parse directives, ignoring malformed parts.
    pub fn parse(mut self, filters: &str) -> Self {
        self.0.parse(filters);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kind;

    #[test]
    fn test_channel_directives() {
        let filter = EnvFilter::new(EnvFilterBuilder::new().parse("warn,Network=debug"));
        let default = Channel::new("Default");
        let network = Channel::new("Network");

        let info = LogEntry::new(Kind::Info, "hello");
        let warning = LogEntry::new(Kind::Warning, "hello");
        assert_eq!(filter.matches(&default, &info), FilterResult::Reject);
        assert_eq!(filter.matches(&default, &warning), FilterResult::Neutral);
        assert_eq!(filter.matches(&network, &info), FilterResult::Neutral);
    }

    #[test]
    fn test_fatal_counts_as_error() {
        let filter = EnvFilter::new(EnvFilterBuilder::new().filter_level(LevelFilter::Error));
        let channel = Channel::new("System");
        let fatal = LogEntry::new(Kind::Fatal, "boom");
        assert_eq!(filter.matches(&channel, &fatal), FilterResult::Neutral);
    }
}
