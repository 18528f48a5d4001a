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
use crate::filter;
use crate::filter::Filter;
use crate::sink::Sink;

/// A sink that only forwards entries accepted by its filters.
///
/// Filters are evaluated in order; the first one that accepts or rejects the entry decides.
/// Indentation always reaches the inner sink.
///
/// # Examples
///
/// ```
/// use logchan::filter::KindFilter;
/// use logchan::sink::Filtered;
/// use logchan::sink::Stderr;
///
/// let errors_only = Filtered::new(Stderr::default()).filter(KindFilter::ERRONEOUS);
/// ```
#[derive(Debug)]
pub struct Filtered<S> {
    inner: S,
    filters: Vec<Box<dyn Filter>>,
}

impl<S: Sink> Filtered<S> {
    /// Wrap a sink without any filter.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            filters: vec![],
        }
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<Box<dyn Filter>>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// The wrapped sink.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Sink> Sink for Filtered<S> {
    fn write(
        &self,
        channel: &Channel,
        entry: &LogEntry,
        context: Option<&Arg>,
    ) -> Result<(), Error> {
        if filter::accepts(&self.filters, channel, entry) {
            self.inner.write(channel, entry, context)
        } else {
            Ok(())
        }
    }

    fn push_indent(&self) {
        self.inner.push_indent();
    }

    fn pop_indent(&self) {
        self.inner.pop_indent();
    }

    fn flush(&self) -> Result<(), Error> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::args;
    use crate::filter::EnvFilter;
    use crate::filter::EnvFilterBuilder;
    use crate::filter::KindFilter;
    use crate::sink::Memory;

    #[test]
    fn test_kind_filter() {
        let sink = Arc::new(Filtered::new(Memory::default()).filter(KindFilter::IRREGULAR));
        let channel = Channel::builder("Default").sink(sink.clone()).build();
        channel.debug("noise", args![]);
        channel.info("regular", args![]);
        channel.warn("odd", args![]);
        channel.fatal("broken", args![]);
        assert_eq!(sink.inner().messages(), vec!["odd", "broken"]);
    }

    #[test]
    fn test_env_filter_by_channel() {
        let filter = EnvFilter::new(EnvFilterBuilder::new().parse("Net=error,info"));
        let sink = Arc::new(Filtered::new(Memory::default()).filter(filter));
        let network = Channel::builder("Net").sink(sink.clone()).build();
        let default = Channel::builder("Default").sink(sink.clone()).build();

        network.info("connected", args![]);
        network.error("disconnected", args![]);
        default.debug("hidden", args![]);
        default.info("shown", args![]);
        assert_eq!(sink.inner().messages(), vec!["disconnected", "shown"]);
    }
}
