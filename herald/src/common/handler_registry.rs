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

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::*;

use crate::common::HeraldError;

/// Slot index reserved for handlers registered without a key.
const CATCH_ALL: usize = 0;

type HandlerList<H> = Arc<Mutex<Vec<Arc<H>>>>;

/// A thread-safe, keyed collection of handler lists.
///
/// Handler lists live in an arena of slots. The key index maps a filter key to
/// its slot, and slot `0` always holds the catch-all list. The index and the
/// slot array each have their own lock, and every list has its own mutex, so
/// registering under one key never blocks a dispatch under another.
///
/// [`dispatch`](Self::dispatch) delivers to the list registered under the
/// given key first and to the catch-all list second. Within a list, handlers
/// run in registration order. Each list is snapshotted before its handlers run:
/// registrations racing with a dispatch are not observed by it, and handlers
/// may register further handlers without deadlocking.
pub struct HandlerRegistry<K, H: ?Sized> {
    index: RwLock<HashMap<K, usize>>,
    slots: RwLock<Vec<HandlerList<H>>>,
    disposed: AtomicBool,
    owner: &'static str,
}

impl<K, H: ?Sized> Debug for HandlerRegistry<K, H>
where
    K: Eq + Hash + Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("owner", &self.owner)
            .field("keys", &self.index.read().keys().collect::<Vec<_>>())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<K, H> HandlerRegistry<K, H>
where
    K: Eq + Hash + Debug,
    H: ?Sized,
{
    /// Creates an empty registry. `owner` names the component in `Disposed`
    /// errors.
    pub fn new(owner: &'static str) -> Self {
        Self {
            index: RwLock::new(HashMap::new()),
            slots: RwLock::new(vec![Arc::new(Mutex::new(Vec::new()))]),
            disposed: AtomicBool::new(false),
            owner,
        }
    }

    /// Registers `handler` under `key`.
    pub fn register(&self, key: K, handler: Arc<H>) -> Result<(), HeraldError> {
        self.register_many(key, std::iter::once(handler))
    }

    /// Registers `handler` on the catch-all list.
    pub fn register_all(&self, handler: Arc<H>) -> Result<(), HeraldError> {
        self.ensure_live()?;
        self.slot(CATCH_ALL).lock().push(handler);
        trace!(owner = self.owner, "catch-all handler registered");
        Ok(())
    }

    /// Registers every handler in `handlers` under `key`, in iteration order.
    pub fn register_many<I>(&self, key: K, handlers: I) -> Result<(), HeraldError>
    where
        I: IntoIterator<Item = Arc<H>>,
    {
        self.ensure_live()?;
        trace!(owner = self.owner, key = ?key, "registering handlers");
        let slot = self.slot_for(key);
        self.slot(slot).lock().extend(handlers);
        Ok(())
    }

    /// Delivers to the handlers registered under `key`, then to the catch-all
    /// handlers, and returns how many handlers ran.
    ///
    /// `None` delivers to the catch-all handlers only. A disposed registry
    /// delivers to nobody. The first failing handler stops the dispatch.
    pub fn dispatch<Q, F>(&self, key: Option<&Q>, mut invoke: F) -> anyhow::Result<usize>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        F: FnMut(&H) -> anyhow::Result<()>,
    {
        if self.is_disposed() {
            return Ok(0);
        }

        let filtered = key.and_then(|key| self.index.read().get(key).copied());
        let mut delivered = 0;
        for slot in filtered.into_iter().chain(std::iter::once(CATCH_ALL)) {
            let snapshot: Vec<Arc<H>> = self.slot(slot).lock().clone();
            for handler in &snapshot {
                invoke(&**handler)?;
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Total number of registered handlers, catch-all included.
    pub fn handler_count(&self) -> usize {
        self.slots.read().iter().map(|list| list.lock().len()).sum()
    }

    /// Number of handlers registered under `key`.
    pub fn handlers_for<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        match self.index.read().get(key).copied() {
            Some(slot) => self.slot(slot).lock().len(),
            None => 0,
        }
    }

    /// Number of handlers on the catch-all list.
    pub fn catch_all_count(&self) -> usize {
        self.slot(CATCH_ALL).lock().len()
    }

    /// Drops every handler and refuses further registrations.
    ///
    /// Returns `true` on the first call only.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        for list in self.slots.read().iter() {
            list.lock().clear();
        }
        trace!(owner = self.owner, "handler registry disposed");
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<(), HeraldError> {
        if self.is_disposed() {
            Err(HeraldError::Disposed(self.owner))
        } else {
            Ok(())
        }
    }

    fn slot(&self, slot: usize) -> HandlerList<H> {
        Arc::clone(&self.slots.read()[slot])
    }

    fn slot_for(&self, key: K) -> usize {
        if let Some(slot) = self.index.read().get(&key).copied() {
            return slot;
        }
        let mut index = self.index.write();
        *index.entry(key).or_insert_with(|| {
            let mut slots = self.slots.write();
            slots.push(Arc::new(Mutex::new(Vec::new())));
            slots.len() - 1
        })
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    type KeyHandler = dyn Fn(&str) -> anyhow::Result<()> + Send + Sync;

    fn recording(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Arc<KeyHandler> {
        let log = log.clone();
        Arc::new(move |_key: &str| {
            log.lock().push(name.to_string());
            Ok(())
        })
    }

    #[test]
    fn filtered_handlers_run_before_catch_all() {
        let registry: HandlerRegistry<String, KeyHandler> = HandlerRegistry::new("registry");
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register_all(recording(&log, "all")).unwrap();
        registry.register("A".to_string(), recording(&log, "a")).unwrap();

        let delivered = registry.dispatch(Some("A"), |h| h("A")).unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(*log.lock(), vec!["a", "all"]);

        log.lock().clear();
        registry.dispatch(Some("B"), |h| h("B")).unwrap();
        assert_eq!(*log.lock(), vec!["all"]);
    }

    #[test]
    fn registering_after_dispose_fails_and_dispatch_is_silent() {
        let registry: HandlerRegistry<String, KeyHandler> = HandlerRegistry::new("disposable registry");
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register("A".to_string(), recording(&log, "a")).unwrap();

        assert!(registry.dispose());
        assert!(!registry.dispose());
        assert!(matches!(
            registry.register("A".to_string(), recording(&log, "late")),
            Err(HeraldError::Disposed("disposable registry"))
        ));
        assert_eq!(registry.dispatch(Some("A"), |h| h("A")).unwrap(), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn handler_may_register_during_dispatch() {
        let registry: Arc<HandlerRegistry<String, KeyHandler>> = Arc::new(HandlerRegistry::new("registry"));
        let weak = Arc::downgrade(&registry);
        registry
            .register_all(Arc::new(move |_key: &str| {
                if let Some(registry) = weak.upgrade() {
                    registry.register("late".to_string(), Arc::new(|_key: &str| Ok(())))?;
                }
                Ok(())
            }))
            .unwrap();

        assert_eq!(registry.dispatch(Some("late"), |h| h("late")).unwrap(), 1);
        assert_eq!(registry.handlers_for("late"), 1);
    }

    #[test]
    fn register_many_keeps_order_under_one_key() {
        let registry: HandlerRegistry<String, KeyHandler> = HandlerRegistry::new("registry");
        let log = Arc::new(Mutex::new(Vec::new()));
        registry
            .register_many(
                "K".to_string(),
                vec![recording(&log, "first"), recording(&log, "second")],
            )
            .unwrap();

        registry.dispatch(Some("K"), |h| h("K")).unwrap();
        assert_eq!(*log.lock(), vec!["first", "second"]);
        assert_eq!(registry.handler_count(), 2);
        assert_eq!(registry.catch_all_count(), 0);
    }

    #[test]
    fn debug_lists_keys_and_disposal() {
        let registry: HandlerRegistry<String, KeyHandler> = HandlerRegistry::new("registry");
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register("A".to_string(), recording(&log, "a")).unwrap();

        let rendered = format!("{:?}", registry);
        assert!(rendered.contains("\"A\""));
        assert!(rendered.contains("disposed: false"));
    }
}
