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


use std::path::PathBuf;
use std::time::Duration;

/// How the age of a log file is determined when ordering files for rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileStamp {
    /// The creation time, or the modification time where the filesystem does not record
    /// creation times.
    #[default]
    Created,
    /// The modification time.
    Modified,
}

/// Options of a text log file and its rotation.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use logchan::sink::file::TextFileConfig;
///
/// let config = TextFileConfig {
///     rotation_enabled: true,
///     max_file_count: 10,
///     max_file_age: Some(Duration::from_secs(7 * 24 * 60 * 60)),
///     ..TextFileConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TextFileConfig {
    /// Use `DEBUG`, ` INFO`, ` WARN`, `ERROR`, `FATAL` instead of abbreviations.
    pub use_standard_severity_labels: bool,
    /// Write the timestamp in front of each entry.
    pub write_timestamps: bool,
    /// Write the sequence stamp in front of each entry.
    pub write_sequence_stamps: bool,
    /// The jiff strftime format of timestamps.
    pub timestamp_format: String,
    /// The width sequence stamps are right aligned to.
    pub sequence_width: usize,
    /// The path of the active log file. Filled in by the file sink.
    pub logging_path: Option<PathBuf>,
    /// Delete old log files next to the active one.
    pub rotation_enabled: bool,
    /// A regex selecting the files in the log directory that take part in rotation.
    pub file_pattern: String,
    /// The size budget of all rotated files together, in bytes.
    pub max_total_bytes: u64,
    /// The size of the active file at which the process is considered broken, in bytes.
    pub fatal_single_file_bytes: u64,
    /// Whether to exit the process when the active file exceeds `fatal_single_file_bytes`.
    pub allow_crash_on_fatal_size: bool,
    /// The maximum number of rotated files. Negative for unlimited.
    pub max_file_count: i64,
    /// How often the rotation policies are checked.
    pub rotation_check_interval: Duration,
    /// The maximum age of rotated files. `None` for unlimited.
    pub max_file_age: Option<Duration>,
    /// How file ages are determined.
    pub file_stamp: FileStamp,
}

impl TextFileConfig {
    /// The default timestamp format, such as `(17:12:52.014)`.
    pub const DEFAULT_TIMESTAMP_FORMAT: &'static str = "(%H:%M:%S%.3f)";
    /// The default width of sequence stamps.
    pub const DEFAULT_SEQUENCE_WIDTH: usize = 7;
    /// Matches the default log file names, such as `log 2024-08-10T17-12-52.txt`.
    pub const DEFAULT_FILE_PATTERN: &'static str = r"log\W([\d\-T]*)\.txt";
}

impl Default for TextFileConfig {
    fn default() -> Self {
        Self {
            use_standard_severity_labels: true,
            write_timestamps: true,
            write_sequence_stamps: true,
            timestamp_format: Self::DEFAULT_TIMESTAMP_FORMAT.to_string(),
            sequence_width: Self::DEFAULT_SEQUENCE_WIDTH,
            logging_path: None,
            rotation_enabled: false,
            file_pattern: Self::DEFAULT_FILE_PATTERN.to_string(),
            max_total_bytes: 50 * 1024 * 1024,
            fatal_single_file_bytes: 1024 * 1024 * 1024,
            allow_crash_on_fatal_size: true,
            max_file_count: 50,
            rotation_check_interval: Duration::from_secs(60),
            max_file_age: None,
            file_stamp: FileStamp::Created,
        }
    }
}
