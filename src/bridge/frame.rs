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
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::ThreadId;

/// A monotonic frame counter owned by the host's main thread.
///
/// The thread that creates the counter is considered the main thread. Only reads from that
/// thread yield a value; reads from any other thread report `None` instead of racing with the
/// main loop.
///
/// Clones share the same counter.
#[derive(Debug, Clone)]
pub struct FrameCounter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    main_thread: ThreadId,
    frame: AtomicU64,
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCounter {
    /// Create a counter at frame zero, owned by the current thread.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                main_thread: thread::current().id(),
                frame: AtomicU64::new(0),
            }),
        }
    }

    /// Whether the calling thread is the main thread.
    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.inner.main_thread
    }

    /// Move to the next frame, returning the new frame number.
    pub fn advance(&self) -> u64 {
        self.inner.frame.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The current frame, or `None` when called off the main thread.
    pub fn current(&self) -> Option<u64> {
        if self.is_main_thread() {
            Some(self.inner.frame.load(Ordering::Relaxed))
        } else {
            None
        }
    }
}
