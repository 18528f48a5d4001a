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


//! Forwarding between channels and a host application's native log.
//!
//! Messages of the native log are replayed into a target channel, tagged with
//! [`Origin::Host`](crate::Origin::Host), and entries of channels are emitted to the native log
//! through a [`HostSink`]. Neither direction forwards a message twice:
//!
//! * entries tagged as coming from the host are never emitted back;
//! * the text of every emitted entry is remembered until the host reports it, and that report is
//!   dropped instead of being replayed.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use parking_lot::MutexGuard;
use parking_lot::RwLock;

use crate::Arg;
use crate::Channel;
use crate::Error;
use crate::LogEntry;
use crate::Origin;

mod frame;
mod host;
mod log_crate;
mod sink;

pub use self::frame::FrameCounter;
pub use self::host::Host;
pub use self::host::HostEvent;
pub use self::host::HostLevel;
pub use self::host::HostListener;
pub use self::log_crate::EMIT_TARGET;
pub use self::log_crate::LogCrateHost;
pub use self::sink::HostSink;

/// The maximum number of emitted messages awaiting their echo.
const ECHO_CAPACITY: usize = 1024;

/// A two-way connection to a host's native log.
pub struct Bridge {
    host: Arc<dyn Host>,
    shared: Arc<Shared>,
}

struct Shared {
    target: RwLock<Option<Weak<Channel>>>,
    echoes: Mutex<Echoes>,
    installed: AtomicBool,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("host", &self.host)
            .field("installed", &self.is_installed())
            .field("pending_echoes", &self.pending_echoes())
            .finish()
    }
}

impl Bridge {
    /// Create a bridge to the given host. Nothing is forwarded until it is installed.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            shared: Arc::new(Shared {
                target: RwLock::new(None),
                echoes: Mutex::new(Echoes::default()),
                installed: AtomicBool::new(false),
            }),
        }
    }

    /// The host.
    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Subscribe to the native log, replaying its messages into `target`.
    ///
    /// Installing an installed bridge only changes the target.
    ///
    /// # Errors
    ///
    /// Return an error if the host cannot be subscribed to.
    pub fn install(&self, target: &Arc<Channel>) -> Result<(), Error> {
        self.set_target(Some(target));
        if self.is_installed() {
            return Ok(());
        }

        let shared = Arc::downgrade(&self.shared);
        let listener: HostListener = Arc::new(move |event| {
            if let Some(shared) = shared.upgrade() {
                shared.receive(event);
            }
        });
        self.host.install(listener).map_err(|err| {
            Error::new("failed to subscribe to the host log").with_source(err)
        })?;
        self.shared.installed.store(true, Ordering::Release);
        Ok(())
    }

    /// Unsubscribe from the native log. Does nothing if the bridge is not installed.
    pub fn uninstall(&self) {
        if self.shared.installed.swap(false, Ordering::AcqRel) {
            self.host.uninstall();
            self.shared.echoes().clear();
        }
    }

    /// Whether the bridge is subscribed to the native log.
    pub fn is_installed(&self) -> bool {
        self.shared.installed.load(Ordering::Acquire)
    }

    /// The number of emitted messages whose echo has not been reported yet.
    pub fn pending_echoes(&self) -> usize {
        self.shared.echoes().len()
    }

    /// The channel native messages are replayed into.
    pub fn target(&self) -> Option<Arc<Channel>> {
        self.shared.target()
    }

    /// Replay native messages into another channel, or drop them.
    pub fn set_target(&self, target: Option<&Arc<Channel>>) {
        *self.shared.target.write() = target.map(Arc::downgrade);
    }

    /// Emit the rendered text of an entry to the native log, returning whether it was emitted.
    ///
    /// Entries that came from the native log are not emitted again.
    pub fn forward(&self, entry: &LogEntry, text: &str) -> bool {
        if entry.origin() == Origin::Host {
            return false;
        }

        if self.is_installed() {
            self.shared.echoes().push(text.to_string());
        }
        self.host.emit(HostLevel::from_kind(entry.kind()), text);
        true
    }

    /// Handle a message of the native log, as the installed listener does.
    pub fn receive(&self, event: HostEvent) {
        self.shared.receive(event);
    }
}

impl Shared {
    fn echoes(&self) -> MutexGuard<'_, Echoes> {
        self.echoes.lock()
    }

    fn target(&self) -> Option<Arc<Channel>> {
        self.target.read().as_ref().and_then(Weak::upgrade)
    }

    fn receive(&self, event: HostEvent) {
        if self.echoes().consume(&event.message) {
            return;
        }
        let Some(target) = self.target() else {
            return;
        };

        let HostEvent {
            level,
            message,
            stack_trace,
        } = event;
        let message = match (level, &stack_trace) {
            (HostLevel::Assert | HostLevel::Exception, Some(trace)) => {
                format!("{message}\nStacktrace:\n{trace}")
            }
            _ => message,
        };

        let sequence = target.frames().and_then(FrameCounter::current);
        let entry = LogEntry::new(level.to_kind(), message)
            .with_sequence(sequence)
            .with_origin(Origin::Host);
        let context = stack_trace.map(Arg::from);
        target.write_entry(entry, context.as_ref());
    }
}

/// Emitted messages awaiting their echo, oldest first.
#[derive(Debug, Default)]
struct Echoes(VecDeque<String>);

impl Echoes {
    fn push(&mut self, text: String) {
        if self.0.len() == ECHO_CAPACITY {
            self.0.pop_front();
        }
        self.0.push_back(text);
    }

    fn consume(&mut self, text: &str) -> bool {
        match self.0.iter().position(|pending| pending == text) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kind;
    use crate::args;
    use crate::sink::Memory;

    /// A host that reports everything emitted to it back to its listener.
    #[derive(Default)]
    struct EchoHost {
        listener: Mutex<Option<HostListener>>,
        emitted: Mutex<Vec<(HostLevel, String)>>,
    }

    impl fmt::Debug for EchoHost {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("EchoHost")
                .field("emitted", &self.emitted.lock().len())
                .finish_non_exhaustive()
        }
    }

    impl EchoHost {
        fn raise(&self, event: HostEvent) {
            let listener = self.listener.lock().clone();
            if let Some(listener) = listener {
                listener(event);
            }
        }

        fn emitted(&self) -> Vec<(HostLevel, String)> {
            self.emitted.lock().clone()
        }
    }

    impl Host for EchoHost {
        fn install(&self, listener: HostListener) -> Result<(), Error> {
            *self.listener.lock() = Some(listener);
            Ok(())
        }

        fn uninstall(&self) {
            *self.listener.lock() = None;
        }

        fn emit(&self, level: HostLevel, message: &str) {
            self.emitted.lock().push((level, message.to_string()));
            self.raise(HostEvent::new(level, message));
        }
    }

    struct Fixture {
        host: Arc<EchoHost>,
        bridge: Arc<Bridge>,
        host_channel: Arc<Channel>,
        host_memory: Arc<Memory>,
        default: Channel,
    }

    fn fixture() -> Fixture {
        let host = Arc::new(EchoHost::default());
        let bridge = Arc::new(Bridge::new(host.clone()));
        let sink = Arc::new(HostSink::new(bridge.clone()));
        let host_memory = Arc::new(Memory::default());
        let host_channel = Arc::new(
            Channel::builder("Host")
                .sink(host_memory.clone())
                .sink(sink.clone())
                .build(),
        );
        let default = Channel::builder("Default").sink(sink).build();
        bridge.install(&host_channel).unwrap();
        Fixture {
            host,
            bridge,
            host_channel,
            host_memory,
            default,
        }
    }

    #[test]
    fn test_outbound_echo_is_dropped() {
        let fixture = fixture();
        fixture.default.warn("disk at {0}%", args![93]);

        assert_eq!(
            fixture.host.emitted(),
            vec![(HostLevel::Warning, "[Default] disk at 93%".to_string())]
        );
        assert!(fixture.host_memory.is_empty());
        assert_eq!(fixture.bridge.shared.echoes().len(), 0);
    }

    #[test]
    fn test_inbound_is_not_emitted_back() {
        let fixture = fixture();
        fixture
            .host
            .raise(HostEvent::new(HostLevel::Warning, "native {warning}"));

        let entries = fixture.host_memory.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "Host");
        assert_eq!(entries[0].1.kind(), Kind::Warning);
        assert_eq!(entries[0].1.message(), "native {warning}");
        assert_eq!(entries[0].1.origin(), Origin::Host);
        assert!(fixture.host.emitted().is_empty());
    }

    #[test]
    fn test_exceptions_carry_stack_trace() {
        let fixture = fixture();
        fixture.host.raise(
            HostEvent::new(HostLevel::Exception, "NullReference").with_stack_trace("at Main()"),
        );
        fixture.host.raise(HostEvent::new(HostLevel::Log, "plain"));

        let entries = fixture.host_memory.entries();
        assert_eq!(entries[0].1.kind(), Kind::Error);
        assert_eq!(
            entries[0].1.message(),
            "NullReference\nStacktrace:\nat Main()"
        );
        assert_eq!(entries[1].1.kind(), Kind::Info);
    }

    #[test]
    fn test_uninstall_stops_forwarding() {
        let fixture = fixture();
        fixture.bridge.uninstall();
        fixture.bridge.uninstall();
        assert!(!fixture.bridge.is_installed());

        fixture.host.raise(HostEvent::new(HostLevel::Log, "ignored"));
        assert!(fixture.host_memory.is_empty());

        // still emitted, but no echo is awaited
        fixture.default.info("outbound", args![]);
        assert_eq!(fixture.host.emitted().len(), 1);
        assert_eq!(fixture.bridge.shared.echoes().len(), 0);
        drop(fixture.host_channel);
    }

    #[test]
    fn test_echoes_are_bounded() {
        let mut echoes = Echoes::default();
        for i in 0..ECHO_CAPACITY + 10 {
            echoes.push(format!("message {i}"));
        }
        assert_eq!(echoes.len(), ECHO_CAPACITY);
        assert!(!echoes.consume("message 0"));
        assert!(echoes.consume("message 10"));
        assert!(!echoes.consume("message 10"));
    }

    #[test]
    fn test_duplicate_texts_are_consumed_once_each() {
        let mut echoes = Echoes::default();
        echoes.push("same".to_string());
        echoes.push("same".to_string());
        assert!(echoes.consume("same"));
        assert!(echoes.consume("same"));
        assert!(!echoes.consume("same"));
    }
}
