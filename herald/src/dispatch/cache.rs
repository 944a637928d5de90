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
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use std::thread;

use dashmap::DashMap;
use lazy_static::lazy_static;
use parking_lot::{Condvar, Mutex};
use static_assertions::assert_impl_all;
use tokio::sync::mpsc;
use tracing::*;

use crate::common::{DispatchConfig, CONFIG};
use crate::dispatch::{ArgType, MethodInfo, SpecializingCompiler, Thunk, ThunkCompiler};

lazy_static! {
    static ref GLOBAL: Arc<DispatchCache> = Arc::new(DispatchCache::from_config(&CONFIG.dispatch));
}

/// Identifies one compiled call shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    target: TypeId,
    method: String,
    argument: Option<TypeId>,
}

impl CacheKey {
    pub fn new(target: TypeId, method: impl Into<String>, argument: Option<ArgType>) -> Self {
        Self {
            target,
            method: method.into(),
            argument: argument.map(|argument| argument.id()),
        }
    }

    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn argument(&self) -> Option<TypeId> {
        self.argument
    }
}

#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
}

/// Counts one compilation from scheduling until it finished or was dropped.
struct PendingGuard(Arc<Pending>);

impl PendingGuard {
    fn enter(pending: &Arc<Pending>) -> Self {
        *pending.count.lock() += 1;
        Self(Arc::clone(pending))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut count = self.0.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.0.drained.notify_all();
        }
    }
}

/// One compilation queued for the worker; the guard keeps it counted as pending.
struct CompileJob {
    key: CacheKey,
    method: MethodInfo,
    _guard: PendingGuard,
}

/// Thunks shared by every binder, keyed by [`CacheKey`].
///
/// Reads never block writers of other keys. Two threads missing on the same
/// key may both compile it; the later insert replaces an equivalent thunk.
pub struct DispatchCache {
    thunks: Arc<DashMap<CacheKey, Thunk>>,
    compiler: Arc<dyn ThunkCompiler>,
    pending: Arc<Pending>,
    background: bool,
    thread_name: String,
    worker: Mutex<Option<mpsc::UnboundedSender<CompileJob>>>,
}

assert_impl_all!(DispatchCache: Send, Sync);

impl fmt::Debug for DispatchCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchCache")
            .field("thunks", &self.thunks.len())
            .field("pending", &self.pending_compilations())
            .field("background", &self.background)
            .finish()
    }
}

impl Default for DispatchCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchCache {
    /// A cache configured from [`CONFIG`] with the [`SpecializingCompiler`].
    pub fn new() -> Self {
        Self::from_config(&CONFIG.dispatch)
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            thunks: Arc::new(DashMap::new()),
            compiler: Arc::new(SpecializingCompiler),
            pending: Arc::new(Pending::default()),
            background: config.background_compilation,
            thread_name: config.compiler_thread_name.clone(),
            worker: Mutex::new(None),
        }
    }

    /// Replaces the compiler used for keys compiled from now on.
    pub fn with_compiler(mut self, compiler: impl ThunkCompiler) -> Self {
        self.compiler = Arc::new(compiler);
        self
    }

    /// The process-wide cache used by binders created with `new`.
    pub fn global() -> Arc<DispatchCache> {
        Arc::clone(&GLOBAL)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Thunk> {
        self.thunks.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.thunks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.thunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thunks.is_empty()
    }

    /// Drops every compiled thunk; pending compilations still publish theirs.
    pub fn clear(&self) {
        self.thunks.clear();
    }

    /// Compilations scheduled but not yet published.
    pub fn pending_compilations(&self) -> usize {
        *self.pending.count.lock()
    }

    /// Blocks until every scheduled compilation has published its thunk.
    pub fn wait_for_compilations(&self) {
        let mut count = self.pending.count.lock();
        while *count > 0 {
            self.pending.drained.wait(&mut count);
        }
    }

    /// Compiles `method` for `key` on the compiler worker, or inline when
    /// background compilation is disabled or the worker cannot be started.
    pub(crate) fn schedule(&self, key: CacheKey, method: MethodInfo) {
        let guard = PendingGuard::enter(&self.pending);
        if !self.background {
            publish(&*self.compiler, &self.thunks, key, &method);
            drop(guard);
            return;
        }

        let job = CompileJob {
            key,
            method,
            _guard: guard,
        };
        let rejected = match self.worker() {
            Some(worker) => match worker.send(job) {
                Ok(()) => return,
                Err(mpsc::error::SendError(job)) => job,
            },
            None => job,
        };
        warn!(method = rejected.key.method(), "compiler worker unavailable, compiling inline");
        publish(&*self.compiler, &self.thunks, rejected.key, &rejected.method);
    }

    /// The queue of the compiler worker, started on first use. All background
    /// compilations of this cache run on that one thread in scheduling order.
    fn worker(&self) -> Option<mpsc::UnboundedSender<CompileJob>> {
        let mut worker = self.worker.lock();
        if let Some(sender) = worker.as_ref().filter(|sender| !sender.is_closed()) {
            return Some(sender.clone());
        }

        let (sender, mut jobs) = mpsc::unbounded_channel::<CompileJob>();
        let thunks = Arc::clone(&self.thunks);
        let compiler = Arc::clone(&self.compiler);
        let spawned = thread::Builder::new().name(self.thread_name.clone()).spawn(move || {
            while let Some(job) = jobs.blocking_recv() {
                publish(&*compiler, &thunks, job.key, &job.method);
            }
            trace!("compiler worker stopped");
        });
        match spawned {
            Ok(_) => {
                debug!(name = %self.thread_name, "compiler worker started");
                *worker = Some(sender.clone());
                Some(sender)
            }
            Err(err) => {
                warn!(error = %err, "could not spawn the compiler worker");
                None
            }
        }
    }
}

fn publish(compiler: &dyn ThunkCompiler, thunks: &DashMap<CacheKey, Thunk>, key: CacheKey, method: &MethodInfo) {
    let thunk = compiler.compile(method);
    debug!(method = key.method(), action = thunk.is_action(), "thunk published");
    thunks.insert(key, thunk);
}
