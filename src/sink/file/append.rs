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


use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use parking_lot::MutexGuard;

use crate::Arg;
use crate::Channel;
use crate::Error;
use crate::LogEntry;
use crate::args;
use crate::layout::TextLayout;
use crate::sink::Indent;
use crate::sink::Sink;
use crate::sink::file::Clock;
use crate::sink::file::Rotator;
use crate::sink::file::TextFileConfig;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// A builder to configure and create a [`FileSink`].
#[derive(Debug)]
pub struct FileSinkBuilder {
    path: PathBuf,
    config: TextFileConfig,
    layout: Option<TextLayout>,
    clock: Clock,
    reporter: Option<Arc<Channel>>,
    trap: Box<dyn Trap>,
}

impl FileSinkBuilder {
    /// Create a new file sink builder writing to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: TextFileConfig::default(),
            layout: None,
            clock: Clock::System,
            reporter: None,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the text and rotation options.
    ///
    /// Default to [`TextFileConfig::default`], which does not rotate.
    #[must_use]
    pub fn config(mut self, config: TextFileConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the layout, overriding the text options of the configuration.
    #[must_use]
    pub fn layout(mut self, layout: TextLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Set the clock that drives rotation checks.
    ///
    /// Default to the system clock.
    #[must_use]
    pub fn clock(mut self, clock: impl Into<Clock>) -> Self {
        self.clock = clock.into();
        self
    }

    /// Set the channel rotation reports are written to.
    #[must_use]
    pub fn reporter(mut self, channel: &Arc<Channel>) -> Self {
        self.reporter = Some(channel.clone());
        self
    }

    /// Set the trap for errors that cannot be reported through a channel.
    ///
    /// Default to [`DefaultTrap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use logchan::sink::file::FileSinkBuilder;
    /// use logchan::trap::DefaultTrap;
    ///
    /// let builder = FileSinkBuilder::new("Logs/app.txt").trap(DefaultTrap::default());
    /// ```
    #[must_use]
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Build the [`FileSink`].
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * The log directory cannot be created.
    /// * The log file cannot be opened.
    /// * The rotation file pattern is not a valid regex.
    pub fn build(self) -> Result<FileSink, Error> {
        let FileSinkBuilder {
            path,
            mut config,
            layout,
            clock,
            reporter,
            trap,
        } = self;

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| {
                Error::new("failed to create log directory")
                    .with_context("path", dir.display())
                    .with_source(err)
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                Error::new("failed to open log file")
                    .with_context("path", path.display())
                    .with_source(err)
            })?;

        config.logging_path = Some(path.clone());
        let rotator = if config.rotation_enabled {
            let mut rotator = Rotator::new(&path, &config)?.with_clock(clock);
            if let Some(reporter) = &reporter {
                rotator = rotator.with_reporter(reporter);
            }
            Some(Mutex::new(rotator))
        } else {
            None
        };

        Ok(FileSink {
            layout: layout.unwrap_or_else(|| TextLayout::from_config(&config)),
            path,
            writer: Mutex::new(BufWriter::new(file)),
            rotator,
            rotation_stopped: AtomicBool::new(false),
            indent: Indent::default(),
            trap,
        })
    }
}

/// A sink that writes entries as text lines to a file, flushing after every entry.
///
/// With rotation enabled, every write gives the [`Rotator`] a chance to trim old log files in the
/// same directory. A failing rotation is reported once and disables rotation for this sink.
///
/// # Examples
///
/// ```no_run
/// use logchan::sink::FileSink;
/// use logchan::sink::file::TextFileConfig;
///
/// let sink = FileSink::builder("Logs/log 2024-08-10T17-12-52.txt")
///     .config(TextFileConfig {
///         rotation_enabled: true,
///         ..TextFileConfig::default()
///     })
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    layout: TextLayout,
    writer: Mutex<BufWriter<File>>,
    rotator: Option<Mutex<Rotator>>,
    rotation_stopped: AtomicBool,
    indent: Indent,
    trap: Box<dyn Trap>,
}

impl FileSink {
    /// Create a builder writing to the given path.
    pub fn builder(path: impl Into<PathBuf>) -> FileSinkBuilder {
        FileSinkBuilder::new(path)
    }

    /// The path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The rotator, if rotation is enabled.
    ///
    /// Holding the guard skips rotation checks of concurrent writes.
    pub fn rotator(&self) -> Option<MutexGuard<'_, Rotator>> {
        self.rotator.as_ref().map(Mutex::lock)
    }

    /// Whether the log file alone exceeds the rotation size budget.
    pub fn current_overflow(&self) -> bool {
        self.rotator()
            .is_some_and(|rotator| rotator.current_overflow())
    }

    fn writer(&self) -> MutexGuard<'_, BufWriter<File>> {
        self.writer.lock()
    }

    fn check_rotation(&self) {
        let Some(rotator) = &self.rotator else {
            return;
        };
        if self.rotation_stopped.load(Ordering::Relaxed) {
            return;
        }

        // a check in progress on this or another thread covers this write
        let Some(mut rotator) = rotator.try_lock() else {
            return;
        };
        let Err(err) = rotator.check() else {
            return;
        };

        self.rotation_stopped.store(true, Ordering::Relaxed);
        let reporter = rotator.reporter();
        drop(rotator);

        let err = Error::new("failed to rotate log files, rotation stopped").with_source(err);
        self.trap.trap(&err);
        if let Some(channel) = reporter {
            channel.warn("Log rotation failed and is stopped: {0}", args![err]);
        }
    }
}

impl Sink for FileSink {
    fn write(&self, channel: &Channel, entry: &LogEntry, _: Option<&Arg>) -> Result<(), Error> {
        let lines = self.layout.format(channel, entry, self.indent.get())?;
        {
            let mut writer = self.writer();
            for line in lines {
                writer
                    .write_all(line.as_bytes())
                    .and_then(|()| writer.write_all(b"\n"))
                    .map_err(|err| Error::io("failed to write log file", err))?;
            }
            writer
                .flush()
                .map_err(|err| Error::io("failed to flush log file", err))?;
        }

        self.check_rotation();
        Ok(())
    }

    fn push_indent(&self) {
        self.indent.push();
    }

    fn pop_indent(&self) {
        self.indent.pop();
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer();
        writer
            .flush()
            .map_err(|err| Error::io("failed to flush log file", err))?;
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let writer = self.writer.get_mut();
        if let Err(err) = writer.flush() {
            let err = Error::new("failed to flush log file on dropped").with_source(err);
            self.trap.trap(&err);
        }
    }
}
