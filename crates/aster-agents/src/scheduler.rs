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

//! A fixed pool of loader worker threads.

use aster_core::jobs::{Job, JobHandle, Scheduler};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::{
    io,
    panic::{self, AssertUnwindSafe},
    thread,
    time::Duration,
};

/// How long a helping waiter sleeps when the queue is empty.
const HELP_POLL_INTERVAL: Duration = Duration::from_millis(1);

struct Task {
    job: Job,
    handle: JobHandle,
}

impl Task {
    /// Runs the job. The handle completes even if the job panics.
    fn run(self) {
        let Task { job, handle } = self;
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            log::error!("A scheduled job panicked");
        }
        handle.complete();
    }
}

/// Runs jobs on a fixed set of threads fed by a shared queue.
///
/// [`Scheduler::wait`] does not just block: while the awaited job is not done,
/// the waiting thread pulls queued jobs and runs them itself. A worker that
/// waits on a job queued behind its own therefore cannot starve the pool.
pub struct ThreadPoolScheduler {
    sender: Option<Sender<Task>>,
    receiver: Receiver<Task>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl ThreadPoolScheduler {
    /// Spawns `threads` workers (at least one).
    pub fn new(threads: usize) -> io::Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Task>();
        let workers = (0..threads.max(1))
            .map(|index| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("aster-loader-{index}"))
                    .spawn(move || {
                        while let Ok(task) = receiver.recv() {
                            task.run();
                        }
                    })
            })
            .collect::<io::Result<Vec<_>>>()?;
        log::debug!("Started {} loader worker(s)", workers.len());

        Ok(Self {
            sender: Some(sender),
            receiver,
            workers,
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Scheduler for ThreadPoolScheduler {
    fn dispatch(&self, job: Job) -> JobHandle {
        let handle = JobHandle::new();
        let task = Task {
            job,
            handle: handle.clone(),
        };
        let rejected = match &self.sender {
            Some(sender) => sender.send(task).err().map(|e| e.into_inner()),
            None => Some(task),
        };
        if let Some(task) = rejected {
            log::warn!("Loader pool is shut down; running job on the calling thread");
            task.run();
        }
        handle
    }

    fn wait(&self, handle: &JobHandle) {
        while !handle.is_complete() {
            match self.receiver.try_recv() {
                Ok(task) => task.run(),
                Err(TryRecvError::Empty) => {
                    handle.wait_timeout(HELP_POLL_INTERVAL);
                }
                Err(TryRecvError::Disconnected) => {
                    handle.wait();
                    return;
                }
            }
        }
    }
}

impl Drop for ThreadPoolScheduler {
    fn drop(&mut self) {
        // Closing the queue lets each worker finish what is left, then exit.
        self.sender.take();
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            if worker.thread().id() == current {
                // Dropped from one of our own jobs; that worker exits on its own.
                continue;
            }
            if worker.join().is_err() {
                log::error!("A loader worker terminated abnormally");
            }
        }
    }
}
