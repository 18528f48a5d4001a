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


//! Logchan is a structured logging core built around named channels.
//!
//! # Overview
//!
//! Each [`Channel`] formats messages from a template and positional arguments and fans the
//! resulting [`LogEntry`] out to its [`Sink`]s, such as standard output, a rotating log file or
//! an in-memory collector. A [`Context`] owns the well-known `System`, `Default` and `Host`
//! channels, creates custom channels on first use, and attaches global sinks to all of them.
//! With a [`Host`](bridge::Host), messages are mirrored to and from a host application's native
//! log without ever echoing a message back.
//!
//! # Examples
//!
//! Simple setup writing every channel to stdout:
//!
//! ```
//! use std::sync::Arc;
//!
//! use logchan::Context;
//! use logchan::args;
//! use logchan::sink::Stdout;
//!
//! let context = Context::new();
//! context.add_global_sink(Arc::new(Stdout::default()));
//!
//! context.default().info("Loaded {0} assets in {1,6} ms.", args![128, 42]);
//! ```
//!
//! Custom channels and filtered sinks:
//!
//! ```
//! use std::sync::Arc;
//!
//! use logchan::Context;
//! use logchan::CustomChannel;
//! use logchan::args;
//! use logchan::filter::KindFilter;
//! use logchan::sink::Filtered;
//! use logchan::sink::Stderr;
//!
//! #[derive(Default)]
//! struct Physics;
//!
//! impl CustomChannel for Physics {}
//!
//! let context = Context::new();
//! let errors = Filtered::new(Stderr::default()).filter(KindFilter::ERRONEOUS);
//! context.add_global_sink(Arc::new(errors));
//!
//! context.channel::<Physics>().warn("Simulation step took too long.", args![]);
//! context.default().error("Failed to open {0}.", args!["settings.toml"]);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod filter;
pub mod format;
pub mod layout;
pub mod sink;
pub mod trap;
pub mod utility;

mod channel;
mod context;
mod entry;
mod error;

pub use self::channel::Channel;
pub use self::channel::ChannelBuilder;
pub use self::context::Context;
pub use self::context::ContextBuilder;
pub use self::context::CustomChannel;
pub use self::context::context;
pub use self::entry::Kind;
pub use self::entry::LogEntry;
pub use self::entry::Origin;
pub use self::error::Error;
pub use self::filter::Filter;
pub use self::format::Arg;
pub use self::format::Handle;
pub use self::sink::Sink;
