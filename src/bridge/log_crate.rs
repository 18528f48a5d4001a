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
use std::sync::Arc;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::Error;
use crate::bridge::Host;
use crate::bridge::HostEvent;
use crate::bridge::HostLevel;
use crate::bridge::HostListener;

/// The target of records emitted by [`LogCrateHost`].
pub const EMIT_TARGET: &str = "logchan";

static ACTIVE_HOST: RwLock<Option<Arc<Inner>>> = RwLock::new(None);

struct LogCrateProxy(());

impl log::Log for LogCrateProxy {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let Some(inner) = active_host() else {
            return false;
        };

        inner.listener().is_some()
            || inner
                .downstream
                .as_ref()
                .is_some_and(|downstream| downstream.enabled(metadata))
    }

    fn log(&self, record: &log::Record) {
        let Some(inner) = active_host() else {
            return;
        };

        if let Some(downstream) = &inner.downstream {
            if downstream.enabled(record.metadata()) {
                downstream.log(record);
            }
        }
        if let Some(listener) = inner.listener() {
            let level = match record.level() {
                log::Level::Error => HostLevel::Error,
                log::Level::Warn => HostLevel::Warning,
                log::Level::Info | log::Level::Debug | log::Level::Trace => HostLevel::Log,
            };
            listener(HostEvent::new(level, record.args().to_string()));
        }
    }

    fn flush(&self) {
        let Some(inner) = active_host() else {
            return;
        };

        if let Some(downstream) = &inner.downstream {
            downstream.flush();
        }
    }
}

fn active_host() -> Option<Arc<Inner>> {
    ACTIVE_HOST
        .read().clone()
}

/// Set up the log crate global logger, once per process.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
fn try_setup_log_crate() -> Result<(), Error> {
    static PROXY: LogCrateProxy = LogCrateProxy(());
    static SETUP: OnceLock<bool> = OnceLock::new();

    let installed = *SETUP.get_or_init(|| {
        let installed = log::set_logger(&PROXY).is_ok();
        if installed {
            log::set_max_level(log::LevelFilter::Trace);
        }
        installed
    });

    if installed {
        Ok(())
    } else {
        Err(Error::new("the log crate global logger has already been set"))
    }
}

struct Inner {
    downstream: Option<Box<dyn log::Log>>,
    listener: RwLock<Option<HostListener>>,
}

impl Inner {
    fn listener(&self) -> Option<HostListener> {
        self.listener
            .read().clone()
    }

    fn set_listener(&self, listener: Option<HostListener>) {
        *self.listener.write() = listener;
    }
}

/// The [`log`] crate as host logging facility.
///
/// Installing the host sets up the log crate global logger. Every record logged through the
/// `log` macros is passed to the downstream logger, if any, and then to the bridge. Messages
/// emitted by the bridge are logged through the same global logger with the target
/// [`EMIT_TARGET`], so the downstream logger sees them as well.
///
/// Only one `LogCrateHost` is active at a time; installing another one replaces it.
///
/// # Examples
///
/// ```
/// use logchan::Context;
/// use logchan::bridge::LogCrateHost;
///
/// let context = Context::builder().host(LogCrateHost::new()).build();
/// log::warn!("reaches the Host channel");
/// ```
pub struct LogCrateHost {
    inner: Arc<Inner>,
}

impl fmt::Debug for LogCrateHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogCrateHost")
            .field("downstream", &self.inner.downstream.is_some())
            .field("installed", &self.inner.listener().is_some())
            .finish()
    }
}

impl Default for LogCrateHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCrateHost {
    /// Create a host without downstream logger.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a host passing every record on to the given logger, such as a console logger.
    pub fn with_downstream(logger: impl log::Log + 'static) -> Self {
        Self::build(Some(Box::new(logger)))
    }

    fn build(downstream: Option<Box<dyn log::Log>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                downstream,
                listener: RwLock::new(None),
            }),
        }
    }
}

impl Host for LogCrateHost {
    fn install(&self, listener: HostListener) -> Result<(), Error> {
        try_setup_log_crate()?;
        self.inner.set_listener(Some(listener));
        *ACTIVE_HOST.write() = Some(self.inner.clone());
        Ok(())
    }

    fn uninstall(&self) {
        self.inner.set_listener(None);
        let mut active = ACTIVE_HOST.write();
        if active
            .as_ref()
            .is_some_and(|inner| Arc::ptr_eq(inner, &self.inner))
        {
            *active = None;
        }
    }

    fn emit(&self, level: HostLevel, message: &str) {
        let level = match level {
            HostLevel::Log => log::Level::Info,
            HostLevel::Warning => log::Level::Warn,
            HostLevel::Assert | HostLevel::Exception | HostLevel::Error => log::Level::Error,
        };

        // format_args! borrows temporaries, so the record is built and logged in one statement
        log::logger().log(
            &log::Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target(EMIT_TARGET)
                .build(),
        );
    }
}
