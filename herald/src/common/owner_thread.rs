/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc as reply;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::*;

use crate::common::types::Job;
use crate::common::{HeraldError, CONFIG};
use crate::traits::ExecutionContext;

/// An [`ExecutionContext`] backed by one dedicated thread.
///
/// Jobs run on the owner thread in submission order. `run_on_owner` called on
/// the owner thread runs the job inline; called anywhere else, it queues the
/// job and blocks until it has run. A job that panics re-raises the panic on
/// the thread that submitted it. Dropping the context lets queued jobs finish
/// and joins the thread.
pub struct OwnerThread {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
    name: String,
}

impl fmt::Debug for OwnerThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerThread")
            .field("name", &self.name)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

impl OwnerThread {
    /// Spawns an owner thread named after `context.owner_thread_name`.
    pub fn spawn() -> Result<Self, HeraldError> {
        Self::with_name(CONFIG.context.owner_thread_name.clone())
    }

    #[instrument]
    pub fn with_name(name: String) -> Result<Self, HeraldError> {
        let (sender, mut jobs) = mpsc::unbounded_channel::<Job>();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Some(job) = jobs.blocking_recv() {
                    job();
                }
                trace!("owner thread drained its queue");
            })
            .map_err(|e| HeraldError::Context(format!("failed to spawn owner thread: {}", e)))?;
        let thread_id = handle.thread().id();
        debug!(?thread_id, "owner thread started");
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
            thread_id,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ExecutionContext for OwnerThread {
    fn is_owner(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn run_on_owner(&self, job: Box<dyn FnOnce() + Send + 'static>) -> Result<(), HeraldError> {
        if self.is_owner() {
            job();
            return Ok(());
        }

        // Callers may sit on a runtime worker, where tokio's blocking receive panics.
        let (done, outcome) = reply::sync_channel::<thread::Result<()>>(1);
        let wrapped: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job));
            let _ = done.send(result);
        });

        let sender = self.sender.lock().clone();
        let sender = sender.ok_or_else(|| HeraldError::Context("owner thread is shut down".into()))?;
        sender
            .send(wrapped)
            .map_err(|_| HeraldError::Context("owner thread is no longer running".into()))?;

        match outcome.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => Err(HeraldError::Context("owner thread dropped the job".into())),
        }
    }
}

impl Drop for OwnerThread {
    fn drop(&mut self) {
        self.sender.lock().take();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if self.is_owner() {
                return;
            }
            if handle.join().is_err() {
                warn!(name = %self.name, "owner thread ended with a panic");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn jobs_run_on_the_owner_thread() {
        let owner = Arc::new(OwnerThread::with_name("owner-under-test".to_string()).unwrap());
        assert!(!owner.is_owner());

        let seen_owner = Arc::new(AtomicBool::new(false));
        let flag = seen_owner.clone();
        let context = owner.clone();
        owner
            .run_on_owner(Box::new(move || {
                flag.store(context.is_owner(), Ordering::SeqCst);
            }))
            .unwrap();

        assert!(seen_owner.load(Ordering::SeqCst));
    }

    #[test]
    fn panicking_job_resurfaces_on_the_caller() {
        let owner = OwnerThread::with_name("owner-panics".to_string()).unwrap();
        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = owner.run_on_owner(Box::new(|| panic!("job failed")));
        }));
        assert!(caught.is_err());

        // The owner thread survives and keeps serving jobs.
        owner.run_on_owner(Box::new(|| {})).unwrap();
    }
}
