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
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use jiff::SignedDuration;
use jiff::Timestamp;
use regex::Regex;

use crate::Arg;
use crate::Channel;
use crate::Error;
use crate::Kind;
use crate::args;
use crate::sink::file::Clock;
use crate::sink::file::FileStamp;
use crate::sink::file::TextFileConfig;

const MIB: f64 = 1024.0 * 1024.0;

/// Enforces count, age and size limits on the log files next to an active log file.
///
/// The rotator never deletes the active file. When the active file alone exceeds the size budget,
/// the rotator reports an overflow instead.
///
/// Files are tracked newest first; the list is built on the first [`check`](Rotator::check) and
/// kept up to date by the trimming passes afterwards.
#[derive(Debug)]
pub struct Rotator {
    logging_path: PathBuf,
    pattern: Regex,
    max_total_bytes: u64,
    fatal_single_file_bytes: u64,
    allow_crash_on_fatal_size: bool,
    max_file_count: i64,
    check_interval: Duration,
    max_file_age: Option<Duration>,
    file_stamp: FileStamp,
    clock: Clock,
    reporter: Option<Weak<Channel>>,

    observed: Vec<LogFile>,
    overflow: bool,
    initialized: bool,
    last_check: Timestamp,
}

#[derive(Debug)]
struct LogFile {
    path: PathBuf,
    len: u64,
    stamp: Timestamp,
}

impl Rotator {
    /// Create a rotator for the directory of `logging_path`, the active log file.
    ///
    /// # Errors
    ///
    /// Return an error if the file pattern of the configuration is not a valid regex.
    pub fn new(logging_path: impl Into<PathBuf>, config: &TextFileConfig) -> Result<Self, Error> {
        let pattern = Regex::new(&config.file_pattern).map_err(|err| {
            Error::new("invalid log file pattern")
                .with_context("pattern", &config.file_pattern)
                .with_source(err)
        })?;

        let clock = Clock::System;
        Ok(Self {
            logging_path: logging_path.into(),
            pattern,
            max_total_bytes: config.max_total_bytes,
            fatal_single_file_bytes: config.fatal_single_file_bytes,
            allow_crash_on_fatal_size: config.allow_crash_on_fatal_size,
            max_file_count: config.max_file_count,
            check_interval: config.rotation_check_interval,
            max_file_age: config.max_file_age,
            file_stamp: config.file_stamp,
            last_check: clock.now(),
            clock,
            reporter: None,
            observed: vec![],
            overflow: false,
            initialized: false,
        })
    }

    /// Use the given clock. The check interval starts anew.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Into<Clock>) -> Self {
        self.clock = clock.into();
        self.last_check = self.clock.now();
        self
    }

    /// Report trimming, overflows and fatal sizes to the given channel.
    #[must_use]
    pub fn with_reporter(mut self, channel: &Arc<Channel>) -> Self {
        self.reporter = Some(Arc::downgrade(channel));
        self
    }

    /// The active log file.
    pub fn logging_path(&self) -> &Path {
        &self.logging_path
    }

    /// The tracked files, newest first.
    pub fn observed_files(&self) -> impl Iterator<Item = &Path> {
        self.observed.iter().map(|file| file.path.as_path())
    }

    /// Whether the active file alone exceeds the size budget.
    pub fn current_overflow(&self) -> bool {
        self.overflow
    }

    /// Trim by size, then set the overflow state.
    pub fn set_current_overflow(&mut self, overflow: bool) -> Result<(), Error> {
        self.trim_size()?;
        self.overflow = overflow;
        Ok(())
    }

    /// Apply the rotation policies if the check interval has elapsed.
    ///
    /// The first time, the directory is scanned and every policy applies. Later checks only trim
    /// by size.
    pub fn check(&mut self) -> Result<(), Error> {
        let now = self.clock.now();
        let interval = SignedDuration::try_from(self.check_interval).unwrap_or(SignedDuration::MAX);
        if now.duration_since(self.last_check) < interval {
            return Ok(());
        }
        self.last_check = now;

        if !self.initialized {
            self.refresh()?;
            self.initialized = true;
            self.trim_count()?;
            self.trim_age()?;
        }
        self.trim_size()?;
        Ok(())
    }

    /// Rescan the log directory.
    pub fn refresh(&mut self) -> Result<(), Error> {
        let mut files = self.list_log_files()?;
        files.sort_by(|a, b| b.stamp.cmp(&a.stamp).then_with(|| b.path.cmp(&a.path)));
        self.observed = files;
        Ok(())
    }

    /// Delete the oldest files beyond the maximum file count, returning how many were deleted.
    pub fn trim_count(&mut self) -> Result<usize, Error> {
        let Ok(max_file_count) = usize::try_from(self.max_file_count) else {
            return Ok(0);
        };

        let original = self.observed.len();
        while self.observed.len() > max_file_count {
            let Some(oldest) = self.observed.last() else {
                break;
            };
            if self.is_active(oldest) {
                break;
            }
            delete_log_file(&oldest.path)?;
            self.observed.pop();
        }

        let deleted = original - self.observed.len();
        if deleted > 0 {
            self.report(
                Kind::Debug,
                "Log file count limit reached: deleted {0} log files.",
                args![deleted],
            );
        }
        Ok(deleted)
    }

    /// Delete files older than the maximum age, oldest first, returning how many were deleted.
    pub fn trim_age(&mut self) -> Result<usize, Error> {
        let Some(max_file_age) = self.max_file_age else {
            return Ok(0);
        };
        let cutoff = self
            .clock
            .now()
            .checked_sub(max_file_age)
            .unwrap_or(Timestamp::MIN);

        let original = self.observed.len();
        while let Some(oldest) = self.observed.last() {
            if oldest.stamp > cutoff || self.is_active(oldest) {
                break;
            }
            delete_log_file(&oldest.path)?;
            self.observed.pop();
        }

        let deleted = original - self.observed.len();
        if deleted > 0 {
            self.report(
                Kind::Debug,
                "Log file age limit reached: deleted {0} log files.",
                args![deleted],
            );
        }
        Ok(deleted)
    }

    /// Delete the oldest files until all files together fit the size budget, returning how many
    /// were deleted.
    ///
    /// If the active file is reached first, the overflow state is set instead. If the active file
    /// exceeds the fatal size, a fatal entry is reported and, when allowed, the process exits.
    pub fn trim_size(&mut self) -> Result<usize, Error> {
        let active_len = fs::metadata(&self.logging_path).ok().map(|m| m.len());
        if let Some(len) = active_len {
            let logging_path = &self.logging_path;
            if let Some(active) = self
                .observed
                .iter_mut()
                .find(|file| file.path.file_name() == logging_path.file_name())
            {
                active.len = len;
            }
            if len > self.fatal_single_file_bytes {
                self.fatal_size(len);
            }
        }

        let original_len: u64 = self.observed.iter().map(|file| file.len).sum();
        if original_len <= self.max_total_bytes {
            return Ok(0);
        }

        let original_count = self.observed.len();
        let mut total_len = original_len;
        while total_len > self.max_total_bytes {
            let Some(oldest) = self.observed.last() else {
                break;
            };
            if self.is_active(oldest) {
                self.overflow = true;
                self.report(
                    Kind::Warning,
                    "Current log file exceeds the maximum log size.",
                    args![],
                );
                break;
            }
            delete_log_file(&oldest.path)?;
            total_len -= oldest.len;
            self.observed.pop();
        }

        let deleted = original_count - self.observed.len();
        if deleted > 0 {
            self.report(
                Kind::Debug,
                "Log size limit reached: deleted {0} log files, from {1} MiB down to {2} MiB.",
                args![
                    deleted,
                    format!("{:.2}", original_len as f64 / MIB),
                    format!("{:.2}", total_len as f64 / MIB)
                ],
            );
        }
        Ok(deleted)
    }

    pub(crate) fn reporter(&self) -> Option<Arc<Channel>> {
        self.reporter.as_ref().and_then(Weak::upgrade)
    }

    fn fatal_size(&self, len: u64) {
        self.report(
            Kind::Fatal,
            "PANIC: log file is much larger ({0} MiB) than expected!",
            args![format!("{:.2}", len as f64 / MIB)],
        );
        if self.allow_crash_on_fatal_size {
            if let Some(channel) = self.reporter() {
                channel.flush();
            }
            std::process::exit(1);
        }
    }

    fn is_active(&self, file: &LogFile) -> bool {
        file.path.file_name() == self.logging_path.file_name()
    }

    fn report(&self, kind: Kind, template: &str, args: &[Arg]) {
        if let Some(channel) = self.reporter() {
            channel.write(kind, template, args);
        }
    }

    fn list_log_files(&self) -> Result<Vec<LogFile>, Error> {
        let log_dir = match self.logging_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let read_dir = match fs::read_dir(log_dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => {
                return Err(Error::new("failed to read log dir")
                    .with_context("path", log_dir.display())
                    .with_source(err));
            }
        };

        let files = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }

                // if the filename is not a UTF-8 string, skip it.
                let filename = entry.file_name();
                if !self.pattern.is_match(filename.to_str()?) {
                    return None;
                }

                let time = match self.file_stamp {
                    FileStamp::Created => metadata.created().or_else(|_| metadata.modified()),
                    FileStamp::Modified => metadata.modified(),
                };
                let stamp = time
                    .ok()
                    .and_then(|time| Timestamp::try_from(time).ok())
                    .unwrap_or(Timestamp::UNIX_EPOCH);

                Some(LogFile {
                    path: entry.path(),
                    len: metadata.len(),
                    stamp,
                })
            })
            .collect();

        Ok(files)
    }
}

// A file that is already gone needs no deletion.
fn delete_log_file(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::new("failed to delete log file")
            .with_context("path", path.display())
            .with_source(err)),
    }
}
