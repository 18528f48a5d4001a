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


//! Entries describing the running process, useful at the top of a log file.

use std::env;
use std::ffi::OsString;
use std::thread;

use crate::Arg;
use crate::Channel;

/// Write every description of the running process to the channel.
pub fn write_all_specs(channel: &Channel) {
    write_system_specs(channel);
    write_environment_variables(channel);
}

/// Write one entry describing the process and the machine it runs on.
pub fn write_system_specs(channel: &Channel) {
    let command_line = env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let working_dir = match env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => format!("unavailable ({err})"),
    };
    let processors = match thread::available_parallelism() {
        Ok(n) => n.to_string(),
        Err(_) => "unknown".to_string(),
    };

    channel.info(
        "System Specs:\n  Command Line: {0}\n  Working Dir: {1}\n  Operating System: {2} ({3})\n  Architecture: {4}\n  64-Bit Process: {5}\n  Processor Count: {6}\n  Process Id: {7}",
        &[
            Arg::from(command_line),
            Arg::from(working_dir),
            Arg::from(env::consts::OS),
            Arg::from(env::consts::FAMILY),
            Arg::from(env::consts::ARCH),
            Arg::from(cfg!(target_pointer_width = "64")),
            Arg::from(processors),
            Arg::from(std::process::id()),
        ],
    );
}

/// Write one entry listing the environment variables of the process, sorted by name.
pub fn write_environment_variables(channel: &Channel) {
    let mut vars: Vec<(OsString, OsString)> = env::vars_os().collect();
    vars.sort();
    let listing = vars
        .iter()
        .map(|(key, value)| {
            format!("  {}: {}", key.to_string_lossy(), value.to_string_lossy())
        })
        .collect::<Vec<_>>()
        .join("\n");

    channel.info("Process Variables:\n{0}", &[Arg::from(listing)]);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sink::Memory;

    fn channel() -> (Channel, Arc<Memory>) {
        let memory = Arc::new(Memory::default());
        let channel = Channel::builder("System").sink(memory.clone()).build();
        (channel, memory)
    }

    #[test]
    fn test_system_specs() {
        let (channel, memory) = channel();
        write_system_specs(&channel);

        let messages = memory.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("System Specs:\n  Command Line: "));
        assert!(messages[0].contains(&format!("  Process Id: {}", std::process::id())));
        assert!(messages[0].contains(env::consts::ARCH));
    }

    #[test]
    fn test_environment_variables() {
        let (channel, memory) = channel();
        write_environment_variables(&channel);

        let messages = memory.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Process Variables:"));
    }

    #[test]
    fn test_all_specs() {
        let (channel, memory) = channel();
        write_all_specs(&channel);
        assert_eq!(memory.len(), 2);
    }
}
