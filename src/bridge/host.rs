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

use crate::Error;
use crate::Kind;

/// The severity levels of a host's native log.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostLevel {
    /// A plain message.
    Log,
    /// A warning.
    Warning,
    /// A failed assertion.
    Assert,
    /// An uncaught exception or panic.
    Exception,
    /// An error.
    Error,
}

impl HostLevel {
    /// The host level entries of the given kind are emitted at.
    pub fn from_kind(kind: Kind) -> Self {
        match kind {
            Kind::Debug | Kind::Info => HostLevel::Log,
            Kind::Warning => HostLevel::Warning,
            Kind::Error | Kind::Fatal => HostLevel::Error,
        }
    }

    /// The kind messages of this level are replayed as.
    pub fn to_kind(self) -> Kind {
        match self {
            HostLevel::Log => Kind::Info,
            HostLevel::Warning => Kind::Warning,
            HostLevel::Assert | HostLevel::Exception | HostLevel::Error => Kind::Error,
        }
    }
}

/// A message observed in the host's native log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEvent {
    /// The severity.
    pub level: HostLevel,
    /// The message text.
    pub message: String,
    /// The stack trace the host attached, if any.
    pub stack_trace: Option<String>,
}

impl HostEvent {
    /// Create an event without a stack trace.
    pub fn new(level: HostLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            stack_trace: None,
        }
    }

    /// Attach a stack trace.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }
}

/// The callback a host invokes for every message of its native log.
pub type HostListener = Arc<dyn Fn(HostEvent) + Send + Sync>;

/// A host application's native logging facility.
///
/// The listener may be invoked from any thread, including synchronously from within
/// [`emit`](Host::emit).
pub trait Host: fmt::Debug + Send + Sync + 'static {
    /// Start reporting native log messages to the listener, replacing any previous one.
    fn install(&self, listener: HostListener) -> Result<(), Error>;

    /// Stop reporting native log messages.
    fn uninstall(&self);

    /// Write a message to the native log.
    fn emit(&self, level: HostLevel, message: &str);

    /// Whether the native log is a development console that should not be cluttered with
    /// system messages.
    ///
    /// Default to `false`.
    fn is_development_console(&self) -> bool {
        false
    }
}
