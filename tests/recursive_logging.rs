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

use logchan::Arg;
use logchan::Channel;
use logchan::args;
use logchan::sink::FileSink;
use logchan::sink::Memory;
use logchan::sink::Stderr;
use logchan::sink::Stdout;

struct Thing {
    name: &'static str,
    channel: Arc<Channel>,
}

impl fmt::Display for Thing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.channel
            .debug("formatting wrapping ({0})", args![self.name]);
        f.write_str(self.name)
    }
}

// ensure a channel delivers entries written while one of its entries is being formatted
#[test]
fn test_meta_logging_in_format_works() {
    let dir = tempfile::tempdir().unwrap();
    let memory = Arc::new(Memory::default());
    let file = FileSink::builder(dir.path().join("log 2024-08-10T17-12-52.txt"))
        .build()
        .unwrap();

    let channel = Arc::new(
        Channel::builder("Default")
            .sink(Arc::new(Stdout::default()))
            .sink(Arc::new(Stderr::default()))
            .sink(Arc::new(file))
            .sink(memory.clone())
            .build(),
    );

    let thing = Thing {
        name: "aha",
        channel: channel.clone(),
    };
    channel.info("I'm logging {0}!", &[Arg::display(thing)]);

    assert_eq!(
        memory.messages(),
        vec!["formatting wrapping (aha)", "I'm logging aha!"]
    );

    let text =
        std::fs::read_to_string(dir.path().join("log 2024-08-10T17-12-52.txt")).unwrap();
    let wrapping = text.find("formatting wrapping (aha)").unwrap();
    let logging = text.find("I'm logging aha!").unwrap();
    assert!(wrapping < logging);
}

// ensure a sink writing back into the channel it serves does not deadlock
#[test]
fn test_sink_writing_into_its_channel() {
    #[derive(Debug)]
    struct Echo {
        channel: std::sync::OnceLock<std::sync::Weak<Channel>>,
    }

    impl logchan::Sink for Echo {
        fn write(
            &self,
            _: &Channel,
            entry: &logchan::LogEntry,
            _: Option<&Arg>,
        ) -> Result<(), logchan::Error> {
            if entry.message().starts_with("echo:") {
                return Ok(());
            }
            if let Some(channel) = self.channel.get().and_then(std::sync::Weak::upgrade) {
                channel.info("echo: {0}", args![entry.message()]);
            }
            Ok(())
        }
    }

    let memory = Arc::new(Memory::default());
    let echo = Arc::new(Echo {
        channel: std::sync::OnceLock::new(),
    });
    let channel = Arc::new(
        Channel::builder("Default")
            .sink(echo.clone())
            .sink(memory.clone())
            .build(),
    );
    echo.channel.set(Arc::downgrade(&channel)).unwrap();

    let writer = {
        let channel = channel.clone();
        std::thread::spawn(move || {
            for i in 0..100 {
                channel.info("from thread {0}", args![i]);
            }
        })
    };
    channel.info("hello", args![]);
    writer.join().unwrap();

    let messages = memory.messages();
    assert_eq!(messages.len(), 202);
    let hello = messages.iter().position(|m| m == "hello").unwrap();
    assert_eq!(messages[hello - 1], "echo: hello");
}
