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


use std::fmt;
use std::ops::BitAnd;
use std::ops::BitOr;

use crate::Channel;
use crate::Filter;
use crate::Kind;
use crate::LogEntry;
use crate::filter::FilterResult;

/// A set of [`Kind`]s, combined like bit flags.
///
/// # Examples
///
/// ```
/// use logchan::Kind;
/// use logchan::filter::KindFilter;
///
/// let filter = KindFilter::WARNING | KindFilter::ERRONEOUS;
/// assert!(filter.contains_kind(Kind::Fatal));
/// assert!(!filter.contains_kind(Kind::Info));
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct KindFilter(u8);

impl KindFilter {
    /// Matches nothing.
    pub const NONE: KindFilter = KindFilter(0x00);
    /// Debug entries.
    pub const DEBUG: KindFilter = KindFilter(0x01);
    /// Info entries.
    pub const INFO: KindFilter = KindFilter(0x02);
    /// Warning entries.
    pub const WARNING: KindFilter = KindFilter(0x04);
    /// Error entries.
    pub const ERROR: KindFilter = KindFilter(0x08);
    /// Fatal entries.
    pub const FATAL: KindFilter = KindFilter(0x10);
    /// Every kind that indicates an error.
    pub const ERRONEOUS: KindFilter = KindFilter(0x10 | 0x08);
    /// Errors and warnings.
    pub const IRREGULAR: KindFilter = KindFilter(0x10 | 0x08 | 0x04);
    /// Everything used as part of regular operation.
    pub const REGULAR: KindFilter = KindFilter(0x10 | 0x08 | 0x04 | 0x02);
    /// Every kind, debug included.
    pub const ALL: KindFilter = KindFilter(0x1f);

    /// Whether this set matches the given kind.
    pub const fn contains_kind(&self, kind: Kind) -> bool {
        self.0 & kind.to_filter().0 != 0
    }

    /// Whether this set matches nothing.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Kind {
    /// The single-kind [`KindFilter`] of this kind.
    pub const fn to_filter(self) -> KindFilter {
        match self {
            Kind::Debug => KindFilter::DEBUG,
            Kind::Info => KindFilter::INFO,
            Kind::Warning => KindFilter::WARNING,
            Kind::Error => KindFilter::ERROR,
            Kind::Fatal => KindFilter::FATAL,
        }
    }
}

impl Default for KindFilter {
    fn default() -> Self {
        KindFilter::ALL
    }
}

impl BitOr for KindFilter {
    type Output = KindFilter;

    fn bitor(self, rhs: Self) -> Self::Output {
        KindFilter(self.0 | rhs.0)
    }
}

impl BitAnd for KindFilter {
    type Output = KindFilter;

    fn bitand(self, rhs: Self) -> Self::Output {
        KindFilter(self.0 & rhs.0)
    }
}

impl From<Kind> for KindFilter {
    fn from(kind: Kind) -> Self {
        kind.to_filter()
    }
}

impl fmt::Debug for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = Kind::ALL
            .iter()
            .filter(|kind| self.contains_kind(**kind))
            .collect::<Vec<_>>();
        f.debug_tuple("KindFilter").field(&kinds).finish()
    }
}

impl Filter for KindFilter {
    fn matches(&self, _: &Channel, entry: &LogEntry) -> FilterResult {
        if self.contains_kind(entry.kind()) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups() {
        assert!(KindFilter::ERRONEOUS.contains_kind(Kind::Error));
        assert!(!KindFilter::ERRONEOUS.contains_kind(Kind::Warning));
        assert!(KindFilter::IRREGULAR.contains_kind(Kind::Warning));
        assert!(!KindFilter::IRREGULAR.contains_kind(Kind::Info));
        assert!(KindFilter::REGULAR.contains_kind(Kind::Info));
        assert!(!KindFilter::REGULAR.contains_kind(Kind::Debug));
        for kind in Kind::ALL {
            assert!(KindFilter::ALL.contains_kind(kind));
            assert!(!KindFilter::NONE.contains_kind(kind));
        }
    }

    #[test]
    fn test_combine() {
        let filter = KindFilter::DEBUG | KindFilter::FATAL;
        assert!(filter.contains_kind(Kind::Debug));
        assert!(filter.contains_kind(Kind::Fatal));
        assert!(!filter.contains_kind(Kind::Info));
        assert_eq!(filter & KindFilter::ERRONEOUS, KindFilter::FATAL);
        assert!((KindFilter::DEBUG & KindFilter::INFO).is_empty());
    }
}
