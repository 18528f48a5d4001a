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
use std::sync::Mutex;

use logchan::Context;
use logchan::Kind;
use logchan::Origin;
use logchan::args;
use logchan::bridge::EMIT_TARGET;
use logchan::bridge::LogCrateHost;
use logchan::sink::Memory;

#[derive(Debug, Clone, Default)]
struct Console {
    records: Arc<Mutex<Vec<(log::Level, String, String)>>>,
}

impl log::Log for Console {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.records.lock().unwrap().push((
            record.level(),
            record.target().to_string(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

// the log crate logger is process global, so this binary runs a single test
#[test]
fn test_log_crate_as_host() {
    let console = Console::default();
    let context = Context::builder()
        .host(LogCrateHost::with_downstream(console.clone()))
        .build();
    let memory = Arc::new(Memory::default());
    context.add_global_sink(memory.clone());

    // outbound: reaches the console once and is not mirrored back
    context.default().warn("Disk at {0}%", args![93]);
    assert_eq!(
        console.records.lock().unwrap().clone(),
        vec![(
            log::Level::Warn,
            EMIT_TARGET.to_string(),
            "[Default] Disk at 93%".to_string()
        )]
    );
    assert_eq!(memory.len(), 1);

    // inbound: mirrored into the Host channel and not emitted back
    log::error!("native failure");
    let entries = memory.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].0, "Host");
    assert_eq!(entries[1].1.kind(), Kind::Error);
    assert_eq!(entries[1].1.message(), "native failure");
    assert_eq!(entries[1].1.origin(), Origin::Host);
    assert_eq!(console.records.lock().unwrap().len(), 2);

    log::info!("native info");
    assert_eq!(memory.entries()[2].1.kind(), Kind::Info);

    context.shutdown();
    log::warn!("after shutdown");
    assert_eq!(memory.len(), 3);
    assert_eq!(console.records.lock().unwrap().len(), 3);
}
