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


//! The registry of well-known and custom channels.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use jiff::Timestamp;
use parking_lot::Mutex;

use crate::Arg;
use crate::Channel;
use crate::ChannelBuilder;
use crate::Error;
use crate::bridge::Bridge;
use crate::bridge::FrameCounter;
use crate::bridge::Host;
use crate::bridge::HostSink;
use crate::channel::same_sink;
use crate::format::Formatter;
use crate::format::panic_message;
use crate::sink::FileSink;
use crate::sink::Sink;
use crate::sink::file::TextFileConfig;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// Name of the channel for messages of the logging system itself.
pub(crate) const SYSTEM_CHANNEL: &str = "System";
/// Name of the channel for general purpose messages.
pub(crate) const DEFAULT_CHANNEL: &str = "Default";
/// Name of the channel mirroring the host's native log.
pub(crate) const HOST_CHANNEL: &str = "Host";

const DEFAULT_LOG_DIRECTORY: &str = "Logs";

static CONTEXT: OnceLock<Context> = OnceLock::new();

/// The process-global context, if one was [installed](Context::install).
pub fn context() -> Option<&'static Context> {
    CONTEXT.get()
}

/// Describes a custom channel that is created on first use by [`Context::channel`].
///
/// # Examples
///
/// ```
/// use logchan::Channel;
/// use logchan::Context;
/// use logchan::CustomChannel;
/// use logchan::args;
///
/// #[derive(Default)]
/// struct Networking;
///
/// impl CustomChannel for Networking {}
///
/// let context = Context::new();
/// let channel = context.channel::<Networking>();
/// assert_eq!(channel.name(), "Networking");
/// assert_eq!(channel.prefix(), "Network");
/// ```
pub trait CustomChannel: 'static {
    /// The channel name.
    ///
    /// Default to the name of the implementing type, without its module path.
    fn name(&self) -> String {
        let name = std::any::type_name::<Self>();
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name).to_string()
    }

    /// The display prefix, given the prefix of the `Default` channel.
    ///
    /// Default to the name, cut to the length of the default prefix.
    fn prefix(&self, default_prefix: &str) -> String {
        self.name()
            .chars()
            .take(default_prefix.chars().count())
            .collect()
    }

    /// Initialize the new channel, for example by attaching sinks specific to it.
    ///
    /// On failure the channel is replaced by one without sinks and the error is written to the
    /// `Default` channel.
    fn init(&self, channel: &Channel) -> Result<(), Error> {
        let _ = channel;
        Ok(())
    }
}

/// A builder to configure and create a [`Context`].
#[derive(Debug, Default)]
pub struct ContextBuilder {
    host: Option<Arc<dyn Host>>,
    forward_to_host: Option<bool>,
    frames: Option<FrameCounter>,
    formatter: Option<Arc<Formatter>>,
    trap: Option<Arc<dyn Trap>>,
}

impl ContextBuilder {
    /// Bridge the context to a host's native log.
    ///
    /// Native messages are replayed into the `Host` channel.
    #[must_use]
    pub fn host(mut self, host: impl Host) -> Self {
        self.host = Some(Arc::new(host));
        self
    }

    /// Set whether entries of every channel are emitted to the host's native log.
    ///
    /// Default to `true` when a host is set.
    #[must_use]
    pub fn forward_to_host(mut self, yes: bool) -> Self {
        self.forward_to_host = Some(yes);
        self
    }

    /// Set the frame counter stamping entries of every channel.
    ///
    /// Default to a counter whose main thread is the one building the context.
    #[must_use]
    pub fn frames(mut self, frames: FrameCounter) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Set the formatter shared by every channel.
    #[must_use]
    pub fn formatter(mut self, formatter: Arc<Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Set the trap for errors of the log file that cannot be reported through a channel.
    ///
    /// Default to [`DefaultTrap`].
    #[must_use]
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Some(Arc::new(trap));
        self
    }

    /// Build the [`Context`], subscribing to the host's native log if a host is set.
    ///
    /// A failed subscription is written as a warning to the `System` channel.
    pub fn build(self) -> Context {
        let ContextBuilder {
            host,
            forward_to_host,
            frames,
            formatter,
            trap,
        } = self;

        let frames = frames.unwrap_or_default();
        let formatter = formatter.unwrap_or_default();
        let make = |name: &str| {
            Arc::new(
                Channel::builder(name)
                    .formatter(formatter.clone())
                    .frames(frames.clone())
                    .build(),
            )
        };

        let bridge = host.map(|host| Arc::new(Bridge::new(host)));
        let host_sink = bridge
            .as_ref()
            .map(|bridge| Arc::new(HostSink::new(bridge.clone())) as Arc<dyn Sink>);

        let context = Context {
            system: make(SYSTEM_CHANNEL),
            default: make(DEFAULT_CHANNEL),
            host: make(HOST_CHANNEL),
            frames,
            formatter,
            globals: Mutex::new(vec![]),
            customs: Mutex::new(vec![]),
            custom_cells: Mutex::new(HashMap::new()),
            bridge,
            host_sink,
            log_file: Mutex::new(None),
            trap: trap.unwrap_or_else(|| Arc::new(DefaultTrap::default())),
            shut_down: AtomicBool::new(false),
        };

        if let Some(bridge) = &context.bridge {
            if let Err(err) = bridge.install(&context.host) {
                context.system.warn(
                    "Rerouting host log messages failed: {0}",
                    &[Arg::error(err)],
                );
            }
        }
        if forward_to_host.unwrap_or(true) {
            context.set_forward_to_host(true);
        }
        context
    }
}

/// The registry of channels of an application.
///
/// A context owns three well-known channels:
///
/// * `System` for messages of the logging system itself;
/// * `Default` for general purpose messages;
/// * `Host` mirroring the host's native log, if a host is bridged.
///
/// Custom channels are created on first use. Global sinks are attached to every channel, including
/// those created later.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use logchan::Context;
/// use logchan::args;
/// use logchan::sink::Memory;
///
/// let context = Context::new();
/// let memory = Arc::new(Memory::default());
/// context.add_global_sink(memory.clone());
///
/// context.default().info("Hello {0}!", args!["world"]);
/// context.system().debug("Hello system!", args![]);
/// assert_eq!(memory.messages(), vec!["Hello world!", "Hello system!"]);
///
/// context.shutdown();
/// ```
pub struct Context {
    system: Arc<Channel>,
    default: Arc<Channel>,
    host: Arc<Channel>,
    frames: FrameCounter,
    formatter: Arc<Formatter>,
    globals: Mutex<Vec<Arc<dyn Sink>>>,
    customs: Mutex<Vec<Arc<Channel>>>,
    custom_cells: Mutex<HashMap<TypeId, Arc<OnceLock<Arc<Channel>>>>>,
    bridge: Option<Arc<Bridge>>,
    host_sink: Option<Arc<dyn Sink>>,
    log_file: Mutex<Option<Arc<FileSink>>>,
    trap: Arc<dyn Trap>,
    shut_down: AtomicBool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("channels", &self.channels())
            .field("global_sinks", &self.globals.lock().len())
            .field("bridge", &self.bridge)
            .field("log_file", &self.log_file.lock())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[allow(clippy::new_without_default)]
impl Context {
    /// Create a context without a host.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder to configure a context.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Make this context the process-global one returned by [`context()`](crate::context()).
    ///
    /// A process-global context is never dropped; call [`shutdown`](Context::shutdown) before the
    /// process exits.
    ///
    /// # Errors
    ///
    /// Return the context back if another one was installed before.
    pub fn install(self) -> Result<&'static Context, Context> {
        CONTEXT.set(self)?;
        match CONTEXT.get() {
            Some(context) => Ok(context),
            None => unreachable!("the context was installed above"),
        }
    }

    /// The channel for messages of the logging system itself.
    pub fn system(&self) -> &Arc<Channel> {
        &self.system
    }

    /// The channel for general purpose messages.
    pub fn default(&self) -> &Arc<Channel> {
        &self.default
    }

    /// The channel mirroring the host's native log.
    pub fn host(&self) -> &Arc<Channel> {
        &self.host
    }

    /// The frame counter stamping entries of every channel.
    pub fn frames(&self) -> &FrameCounter {
        &self.frames
    }

    /// The bridge to the host's native log, if a host is set.
    pub fn bridge(&self) -> Option<&Arc<Bridge>> {
        self.bridge.as_ref()
    }

    /// The well-known channels followed by the custom channels in creation order.
    pub fn channels(&self) -> Vec<Arc<Channel>> {
        let mut channels = vec![
            self.system.clone(),
            self.default.clone(),
            self.host.clone(),
        ];
        channels.extend(self.customs.lock().iter().cloned());
        channels
    }

    /// The custom channel described by `T`, creating it on first use.
    ///
    /// The channel is created exactly once, even when first requested by several threads at
    /// the same time. It must not be requested from its own [`CustomChannel::init`].
    pub fn channel<T: CustomChannel + Default>(&self) -> Arc<Channel> {
        let cell = self
            .custom_cells
            .lock()
            .entry(TypeId::of::<T>())
            .or_default()
            .clone();
        cell.get_or_init(|| self.create_custom::<T>()).clone()
    }

    /// Attach a sink to every channel, present and future. Does nothing if it is attached already.
    pub fn add_global_sink(&self, sink: Arc<dyn Sink>) {
        let mut globals = self.globals.lock();
        if globals.iter().any(|s| same_sink(s, &sink)) {
            return;
        }
        globals.push(sink.clone());
        for channel in self.channels() {
            channel.add_sink(sink.clone());
        }
    }

    /// Detach a global sink from every channel, returning whether it was attached.
    pub fn remove_global_sink(&self, sink: &Arc<dyn Sink>) -> bool {
        let mut globals = self.globals.lock();
        let Some(index) = globals.iter().position(|s| same_sink(s, sink)) else {
            return false;
        };
        globals.remove(index);
        for channel in self.channels() {
            channel.remove_sink(sink);
        }
        true
    }

    /// A snapshot of the global sinks.
    pub fn global_sinks(&self) -> Vec<Arc<dyn Sink>> {
        self.globals.lock().clone()
    }

    /// Set whether entries of every channel are emitted to the host's native log.
    ///
    /// Does nothing without a host.
    pub fn set_forward_to_host(&self, yes: bool) {
        let Some(sink) = &self.host_sink else {
            return;
        };
        if yes {
            self.add_global_sink(sink.clone());
        } else {
            self.remove_global_sink(sink);
        }
    }

    /// Whether entries of every channel are emitted to the host's native log.
    pub fn forwards_to_host(&self) -> bool {
        match &self.host_sink {
            Some(sink) => self.globals.lock().iter().any(|s| same_sink(s, sink)),
            None => false,
        }
    }

    /// The global log file, if one was opened.
    pub fn log_file(&self) -> Option<Arc<FileSink>> {
        self.log_file.lock().clone()
    }

    /// Open a global log file, replacing the previous one.
    ///
    /// The file is created in the first writable location of:
    ///
    /// 1. `directory`, default to `Logs`;
    /// 2. `Logs`;
    /// 3. `Logs` in the platform data directory.
    ///
    /// The file name defaults to `log <UTC time>.txt`. Every attempt is reported on the `Default`
    /// channel. Return `None` if no location was writable.
    pub fn init_log_file(
        &self,
        directory: Option<&Path>,
        name: Option<&str>,
        config: TextFileConfig,
    ) -> Option<Arc<FileSink>> {
        self.shutdown_log_file();

        let name = name.map_or_else(default_log_file_name, str::to_string);
        let preferred = directory
            .unwrap_or(Path::new(DEFAULT_LOG_DIRECTORY))
            .join(&name);
        if let Some(sink) = self.create_log_file(&preferred, &config) {
            return Some(sink);
        }

        let fallback = Path::new(DEFAULT_LOG_DIRECTORY).join(&name);
        if fallback != preferred {
            if let Some(sink) = self.create_log_file(&fallback, &config) {
                return Some(sink);
            }
        }

        let Some(data_dir) = dirs::data_dir() else {
            self.default
                .warn("Unable to retrieve the platform data directory.", &[]);
            return None;
        };
        let alternative: PathBuf = data_dir.join(DEFAULT_LOG_DIRECTORY).join(&name);
        if let Some(sink) = self.create_log_file(&alternative, &config) {
            return Some(sink);
        }

        self.default.warn(
            "Text log file unavailable, because no logging location was accessible.",
            &[],
        );
        None
    }

    /// Uninstall the bridge and close the global log file.
    ///
    /// Idempotent, and writes nothing to any channel.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(bridge) = &self.bridge {
            bridge.uninstall();
        }
        self.shutdown_log_file();
    }

    /// Whether [`shutdown`](Context::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn channel_builder(&self, name: impl Into<String>) -> ChannelBuilder {
        Channel::builder(name)
            .formatter(self.formatter.clone())
            .frames(self.frames.clone())
    }

    fn create_custom<T: CustomChannel + Default>(&self) -> Arc<Channel> {
        let info = T::default();
        let globals = self.global_sinks();
        let mut builder = self
            .channel_builder(info.name())
            .prefix(info.prefix(self.default.prefix()));
        for sink in &globals {
            builder = builder.sink(sink.clone());
        }
        let channel = Arc::new(builder.build());

        let result = panic::catch_unwind(AssertUnwindSafe(|| info.init(&channel)))
            .unwrap_or_else(|payload| {
                Err(Error::new("custom channel initialization panicked")
                    .with_context("panic", panic_message(payload.as_ref())))
            });
        if let Err(err) = result {
            self.default.error(
                "Error initializing custom channel '{0}': {1}",
                &[Arg::from(std::any::type_name::<T>()), Arg::error(err)],
            );
            return Arc::new(Channel::builder("").prefix("").build());
        }

        // global sinks may have changed while the channel was initialized
        let current = self.globals.lock();
        for sink in current.iter() {
            if !globals.iter().any(|s| same_sink(s, sink)) {
                channel.add_sink(sink.clone());
            }
        }
        for sink in &globals {
            if !current.iter().any(|s| same_sink(s, sink)) {
                channel.remove_sink(sink);
            }
        }
        self.customs.lock().push(channel.clone());
        channel
    }

    fn create_log_file(&self, path: &Path, config: &TextFileConfig) -> Option<Arc<FileSink>> {
        let result = FileSink::builder(path)
            .config(config.clone())
            .reporter(&self.default)
            .trap(self.trap.clone())
            .build();

        match result {
            Ok(sink) => {
                self.default.info(
                    "Created log stream at path '{0}'.",
                    &[Arg::from(path.display().to_string())],
                );
                let sink = Arc::new(sink);
                *self.log_file.lock() = Some(sink.clone());
                self.add_global_sink(sink.clone());
                Some(sink)
            }
            Err(err) => {
                self.default.warn(
                    "Failed to create log stream at path '{0}': {1}",
                    &[Arg::from(path.display().to_string()), Arg::error(err)],
                );
                None
            }
        }
    }

    fn shutdown_log_file(&self) {
        let Some(sink) = self.log_file.lock().take() else {
            return;
        };
        let global: Arc<dyn Sink> = sink.clone();
        self.remove_global_sink(&global);
        if let Err(err) = sink.flush() {
            self.trap.trap(&err);
        }
    }
}

fn default_log_file_name() -> String {
    format!("log {}.txt", Timestamp::now().strftime("%Y-%m-%dT%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::Kind;
    use crate::args;
    use crate::sink::Memory;

    #[derive(Default)]
    struct Networking;

    impl CustomChannel for Networking {}

    #[derive(Default)]
    struct Audio;

    impl CustomChannel for Audio {
        fn prefix(&self, _: &str) -> String {
            "Snd".to_string()
        }

        fn init(&self, channel: &Channel) -> Result<(), Error> {
            channel.info("Audio ready", args![]);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Broken;

    impl CustomChannel for Broken {
        fn init(&self, _: &Channel) -> Result<(), Error> {
            Err(Error::new("no device"))
        }
    }

    #[test]
    fn test_well_known_channels() {
        let context = Context::new();
        let names: Vec<_> = context
            .channels()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["System", "Default", "Host"]);
        assert_eq!(context.default().formatted_prefix(), "[Default]");
        assert!(context.bridge().is_none());
        assert!(!context.forwards_to_host());
    }

    #[test]
    fn test_global_sinks_reach_present_and_future_channels() {
        let context = Context::new();
        let memory = Arc::new(Memory::default());
        context.add_global_sink(memory.clone());
        context.add_global_sink(memory.clone());
        assert_eq!(context.global_sinks().len(), 1);

        context.system().info("one", args![]);
        context.channel::<Networking>().info("two", args![]);
        assert_eq!(memory.messages(), vec!["one", "two"]);
        assert_eq!(memory.entries()[1].0, "Networking");

        let global: Arc<dyn Sink> = memory.clone();
        assert!(context.remove_global_sink(&global));
        assert!(!context.remove_global_sink(&global));
        context.channel::<Networking>().info("three", args![]);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_custom_channels() {
        let context = Context::new();
        let memory = Arc::new(Memory::default());
        context.add_global_sink(memory.clone());

        let networking = context.channel::<Networking>();
        assert_eq!(networking.prefix(), "Network");
        assert!(Arc::ptr_eq(&networking, &context.channel::<Networking>()));

        let audio = context.channel::<Audio>();
        assert_eq!(audio.name(), "Audio");
        assert_eq!(audio.prefix(), "Snd");
        assert_eq!(memory.messages(), vec!["Audio ready"]);

        let names: Vec<_> = context
            .channels()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["System", "Default", "Host", "Networking", "Audio"]);
    }

    #[test]
    fn test_failing_custom_channel() {
        let context = Context::new();
        let memory = Arc::new(Memory::default());
        context.add_global_sink(memory.clone());

        let broken = context.channel::<Broken>();
        assert_eq!(broken.name(), "");
        assert!(broken.sinks().is_empty());

        let entries = memory.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "Default");
        assert_eq!(entries[0].1.kind(), Kind::Error);
        assert!(entries[0].1.message().contains("Broken"));
        assert!(entries[0].1.message().contains("no device"));

        // created once, even when it failed
        let _ = context.channel::<Broken>();
        assert_eq!(memory.len(), 1);
        assert_eq!(context.channels().len(), 3);
    }

    #[test]
    fn test_custom_channel_created_once_under_contention() {
        static INITS: AtomicUsize = AtomicUsize::new(0);

        #[derive(Default)]
        struct Counted;

        impl CustomChannel for Counted {
            fn init(&self, _: &Channel) -> Result<(), Error> {
                INITS.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(10));
                Ok(())
            }
        }

        let context = Context::new();
        let channels: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| context.channel::<Counted>()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(INITS.load(Ordering::SeqCst), 1);
        assert!(channels.iter().all(|c| Arc::ptr_eq(c, &channels[0])));
    }

    #[test]
    fn test_log_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let context = Context::new();
        let memory = Arc::new(Memory::default());
        context.add_global_sink(memory.clone());

        let sink = context
            .init_log_file(Some(dir.path()), Some("first.txt"), TextFileConfig::default())
            .unwrap();
        assert_eq!(sink.path(), dir.path().join("first.txt"));
        assert_eq!(context.global_sinks().len(), 2);
        assert!(memory.messages()[0].starts_with("Created log stream at path"));

        context.default().info("into the file", args![]);
        let text = std::fs::read_to_string(dir.path().join("first.txt")).unwrap();
        assert!(text.contains("into the file"));
        assert!(!text.contains("Created log stream"));

        // a second file replaces the first one
        context.init_log_file(Some(dir.path()), Some("second.txt"), TextFileConfig::default());
        context.default().info("into the second file", args![]);
        let first = std::fs::read_to_string(dir.path().join("first.txt")).unwrap();
        assert!(!first.contains("into the second file"));
        assert_eq!(context.global_sinks().len(), 2);

        context.shutdown();
        context.shutdown();
        assert!(context.is_shut_down());
        assert!(context.log_file().is_none());
        assert_eq!(context.global_sinks().len(), 1);

        let messages = memory.len();
        context.default().info("after shutdown", args![]);
        let second = std::fs::read_to_string(dir.path().join("second.txt")).unwrap();
        assert!(second.contains("into the second file"));
        assert!(!second.contains("after shutdown"));
        assert_eq!(memory.len(), messages + 1);
    }

    #[test]
    fn test_default_log_file_name() {
        let name = default_log_file_name();
        assert!(name.starts_with("log "));
        assert!(name.ends_with(".txt"));
        assert!(!name.contains(':'));
    }
}
