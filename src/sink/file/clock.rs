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

use jiff::SignedDuration;
use jiff::Timestamp;
use parking_lot::Mutex;

/// The source of "now" for rotation decisions.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    /// The system clock.
    #[default]
    System,
    /// A clock that only moves when told to.
    Manual(ManualClock),
}

impl Clock {
    /// The current time.
    pub fn now(&self) -> Timestamp {
        match self {
            Clock::System => Timestamp::now(),
            Clock::Manual(clock) => clock.now(),
        }
    }
}

/// The time could be reset. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Create a clock standing at the given time.
    pub fn new(now: Timestamp) -> ManualClock {
        ManualClock {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// The time the clock stands at.
    pub fn now(&self) -> Timestamp {
        *self.now.lock()
    }

    /// Move the clock to the given time.
    pub fn set_now(&self, now: Timestamp) {
        *self.now.lock() = now;
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: SignedDuration) {
        let mut now = self.now.lock();
        let next = now.saturating_add(duration).unwrap_or(*now);
        *now = next;
    }
}

impl From<ManualClock> for Clock {
    fn from(clock: ManualClock) -> Self {
        Clock::Manual(clock)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_manual_clock_adjusting() {
        let now = Timestamp::from_str("2024-08-10T09:12:52Z").unwrap();
        let clock = ManualClock::new(now);
        let shared = Clock::from(clock.clone());
        assert_eq!(shared.now(), now);

        let now = Timestamp::from_str("2024-01-01T04:00:00Z").unwrap();
        clock.set_now(now);
        assert_eq!(shared.now(), now);

        clock.advance(SignedDuration::from_secs(60));
        assert_eq!(
            shared.now(),
            Timestamp::from_str("2024-01-01T04:01:00Z").unwrap()
        );
    }
}
