// Copyright 2025 eraflo
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

//! The job scheduling contract consumed by the registry.
//!
//! The registry only needs to submit a unit of work and, occasionally, to
//! block until a specific unit finished. It never assumes FIFO ordering.

use std::{
    fmt,
    sync::{Arc, Condvar, Mutex},
    time::Duration,
};

/// A unit of work submitted to a [`Scheduler`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Completion {
    done: Mutex<bool>,
    signal: Condvar,
}

/// Completion state of one dispatched job. Cheap to clone.
#[derive(Clone, Default)]
pub struct JobHandle {
    completion: Arc<Completion>,
}

impl JobHandle {
    /// A handle that has not completed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that is already complete.
    pub fn completed() -> Self {
        let handle = Self::new();
        handle.complete();
        handle
    }

    /// Marks the job as finished and wakes every waiter.
    pub fn complete(&self) {
        let mut done = self
            .completion
            .done
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *done = true;
        self.completion.signal.notify_all();
    }

    /// Returns `true` once the job finished.
    pub fn is_complete(&self) -> bool {
        *self
            .completion
            .done
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Blocks until the job finished.
    pub fn wait(&self) {
        let mut done = self
            .completion
            .done
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while !*done {
            done = self
                .completion
                .signal
                .wait(done)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Blocks until the job finished or `timeout` elapsed. Returns whether the
    /// job finished.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let done = self
            .completion
            .done
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (done, _) = self
            .completion
            .signal
            .wait_timeout_while(done, timeout, |done| !*done)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *done
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Submits units of work and waits for them.
pub trait Scheduler: Send + Sync {
    /// Submits `job` for execution and returns its completion handle.
    fn dispatch(&self, job: Job) -> JobHandle;

    /// Blocks until the job behind `handle` finished.
    fn wait(&self, handle: &JobHandle) {
        handle.wait();
    }

    /// Blocks until every job in `handles` finished.
    fn wait_all(&self, handles: &[JobHandle]) {
        for handle in handles {
            self.wait(handle);
        }
    }
}

/// Runs every job on the dispatching thread, before `dispatch` returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn dispatch(&self, job: Job) -> JobHandle {
        job();
        JobHandle::completed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    #[test]
    fn waiters_wake_on_completion() {
        let handle = JobHandle::new();
        let remote = handle.clone();
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.complete();
        });

        assert!(!handle.wait_timeout(Duration::from_millis(0)));
        handle.wait();
        assert!(handle.is_complete());
        worker.join().unwrap();
    }

    #[test]
    fn inline_scheduler_runs_before_returning() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let handle = InlineScheduler.dispatch(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(handle.is_complete());
        InlineScheduler.wait_all(&[handle.clone(), handle]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
