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
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use jiff::civil;
use jiff::tz::TimeZone;
use logchan::Context;
use logchan::Kind;
use logchan::args;
use logchan::sink::Memory;
use logchan::sink::file::FileStamp;
use logchan::sink::file::TextFileConfig;
use rand::Rng;
use rand::distr::Alphanumeric;
use tempfile::TempDir;

fn create_old_logs(dir: &Path, years: std::ops::Range<i16>, len: usize) {
    for year in years {
        let path = dir.join(format!("log {year}-01-01T00-00-00.txt"));
        fs::write(&path, vec![b'x'; len]).unwrap();
        let modified = civil::date(year, 1, 1)
            .at(0, 0, 0, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap()
            .timestamp();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::from(modified))
            .unwrap();
    }
}

fn count_log_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let filename = entry.file_name().to_str()?.to_string();
            if filename.starts_with("log ") {
                Some(filename)
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
}

fn random_payload(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn rotating_config(max_file_count: i64, max_total_bytes: u64) -> TextFileConfig {
    TextFileConfig {
        rotation_enabled: true,
        max_file_count,
        max_total_bytes,
        file_stamp: FileStamp::Modified,
        rotation_check_interval: Duration::ZERO,
        ..TextFileConfig::default()
    }
}

#[test]
fn test_global_file_count_limit() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let max_files = 10;
    create_old_logs(temp_dir.path(), 1990..2020, 16);

    let context = Context::new();
    let sink = context
        .init_log_file(
            Some(temp_dir.path()),
            Some("log 2024-08-10T17-12-52.txt"),
            rotating_config(max_files, 50 * 1024 * 1024),
        )
        .unwrap();

    for i in 0..50 {
        context
            .default()
            .info("Log entry {0}: {1}", args![i, random_payload(50)]);
    }

    let files = count_log_files(temp_dir.path());
    assert_eq!(
        files.len(),
        max_files as usize,
        "expected {max_files} files, but found {}: {files:?}",
        files.len()
    );
    assert!(sink.path().exists());
    assert!(files.contains(&"log 2019-01-01T00-00-00.txt".to_string()));
    assert!(!files.contains(&"log 2010-01-01T00-00-00.txt".to_string()));
}

#[test]
fn test_total_size_limit_keeps_active_file() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    create_old_logs(temp_dir.path(), 2000..2010, 1024);

    let context = Context::new();
    let memory = Arc::new(Memory::default());
    context.add_global_sink(memory.clone());
    let sink = context
        .init_log_file(
            Some(temp_dir.path()),
            Some("log 2024-08-10T17-12-52.txt"),
            rotating_config(-1, 512),
        )
        .unwrap();

    for i in 0..20 {
        context
            .default()
            .info("Log entry {0}: {1}", args![i, random_payload(64)]);
    }

    let files = count_log_files(temp_dir.path());
    assert_eq!(files, vec!["log 2024-08-10T17-12-52.txt".to_string()]);
    assert!(sink.current_overflow());
    assert!(
        memory
            .entries()
            .iter()
            .any(|(channel, entry)| channel == "Default" && entry.kind() == Kind::Warning),
        "the overflow is reported"
    );
}

#[test]
fn test_foreign_files_are_kept() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    create_old_logs(temp_dir.path(), 2000..2005, 16);
    fs::write(temp_dir.path().join("notes.txt"), "keep me").unwrap();

    let context = Context::new();
    context
        .init_log_file(
            Some(temp_dir.path()),
            Some("log 2024-08-10T17-12-52.txt"),
            rotating_config(2, 50 * 1024 * 1024),
        )
        .unwrap();
    context.default().info("rotate", args![]);

    assert!(temp_dir.path().join("notes.txt").exists());
    assert_eq!(count_log_files(temp_dir.path()).len(), 2);
}
