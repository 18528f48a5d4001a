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

use logchan::Context;
use logchan::args;
use logchan::sink::Memory;
use logchan::utility;

// the global slot is process wide, so this binary runs a single test
#[test]
fn test_install_global_context() {
    assert!(logchan::context().is_none());

    let memory = Arc::new(Memory::default());
    let context = Context::new();
    context.add_global_sink(memory.clone());
    let installed = context.install().unwrap();
    assert!(std::ptr::eq(installed, logchan::context().unwrap()));

    let rejected = Context::new().install().unwrap_err();
    assert!(!rejected.is_shut_down());

    logchan::context()
        .unwrap()
        .default()
        .info("hello {0}", args!["global"]);
    utility::write_all_specs(installed.system());
    assert_eq!(memory.len(), 3);
    assert_eq!(memory.messages()[0], "hello global");

    installed.shutdown();
    assert!(installed.is_shut_down());
}
