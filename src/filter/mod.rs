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


//! Filters that let a sink decide which entries it accepts.

use std::fmt;

use crate::Channel;
use crate::LogEntry;

mod env_filter;
mod kind;

pub use self::env_filter::EnvFilter;
pub use self::env_filter::EnvFilterBuilder;
pub use self::kind::KindFilter;

/// The result of a filter check.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FilterResult {
    /// The entry will be written without further checks.
    Accept,
    /// The entry will not be written.
    Reject,
    /// Let the next filter decide.
    Neutral,
}

/// A filter that checks if an entry should be written by a sink.
pub trait Filter: fmt::Debug + Send + Sync + 'static {
    /// Whether the entry written to the given channel should be accepted.
    fn matches(&self, channel: &Channel, entry: &LogEntry) -> FilterResult;
}

impl<T: Filter> From<T> for Box<dyn Filter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Evaluate filters in order; the first non-neutral result wins and everything neutral passes.
pub(crate) fn accepts(filters: &[Box<dyn Filter>], channel: &Channel, entry: &LogEntry) -> bool {
    for filter in filters {
        match filter.matches(channel, entry) {
            FilterResult::Reject => return false,
            FilterResult::Accept => return true,
            FilterResult::Neutral => {}
        }
    }
    true
}
