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
use std::fmt::Debug;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::*;

use crate::common::types::same_handler;
use crate::common::{EventHandler, HandlerResult};
use crate::listener::{Subscription, WeakSubscription};

/// A thread-safe multicast event.
///
/// `EventSource` is the producer side of every notification channel in Herald:
/// [`NotificationObject`](crate::common::NotificationObject) raises property
/// changes through one, and [`Messenger`](crate::common::Messenger) raises
/// published messages through one.
///
/// `raise` works on a snapshot of the handler list, so a handler may add or
/// remove handlers (itself included) while the event is being raised. The
/// snapshot is taken before the first handler runs; handlers added during a
/// raise are not called by that raise.
pub struct EventSource<E: ?Sized + 'static> {
    handlers: RwLock<Vec<EventHandler<E>>>,
}

impl<E: ?Sized + 'static> Default for EventSource<E> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }
}

impl<E: ?Sized + 'static> Debug for EventSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl<E: ?Sized + 'static> EventSource<E> {
    /// Creates an event with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler`; the same handler may be added more than once.
    pub fn add(&self, handler: EventHandler<E>) {
        let mut handlers = self.handlers.write();
        handlers.push(handler);
        trace!(handler_count = handlers.len(), "handler added");
    }

    /// Removes the most recently added occurrence of `handler`.
    ///
    /// Returns `false` when the handler was not attached.
    pub fn remove(&self, handler: &EventHandler<E>) -> bool {
        let mut handlers = self.handlers.write();
        match handlers.iter().rposition(|h| same_handler(h, handler)) {
            Some(position) => {
                handlers.remove(position);
                trace!(handler_count = handlers.len(), "handler removed");
                true
            }
            None => false,
        }
    }

    /// Invokes every attached handler in the order they were added.
    ///
    /// The first handler returning an error stops the raise and the error is
    /// returned to the caller.
    pub fn raise(&self, args: &E) -> HandlerResult {
        let snapshot: Vec<EventHandler<E>> = self.handlers.read().clone();
        for handler in &snapshot {
            handler(args)?;
        }
        Ok(())
    }

    /// Number of handlers currently attached.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Attaches `handler` through an owned [`Subscription`].
    ///
    /// The subscription only holds a weak reference to the event, so it never
    /// keeps the producer alive.
    pub fn subscribe(self: &Arc<Self>, handler: EventHandler<E>) -> Subscription<E> {
        let (add, remove) = self.adapters();
        Subscription::attach(add, remove, handler)
    }

    /// Attaches `handler` through a [`WeakSubscription`] whose consumer is the
    /// subscription itself.
    pub fn subscribe_weak(self: &Arc<Self>, handler: EventHandler<E>) -> WeakSubscription<E> {
        let (add, remove) = self.adapters();
        WeakSubscription::attach(add, remove, handler)
    }

    /// Attaches `callback` on behalf of `consumer` without keeping it alive.
    pub fn subscribe_for<C, F>(self: &Arc<Self>, consumer: &Arc<C>, callback: F) -> WeakSubscription<E>
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &E) -> HandlerResult + Send + Sync + 'static,
    {
        let (add, remove) = self.adapters();
        WeakSubscription::attach_to(consumer, add, remove, callback)
    }

    #[allow(clippy::type_complexity)]
    fn adapters(
        self: &Arc<Self>,
    ) -> (
        impl FnOnce(EventHandler<E>),
        impl Fn(&EventHandler<E>) + Send + Sync + 'static,
    ) {
        let for_add: Weak<Self> = Arc::downgrade(self);
        let for_remove: Weak<Self> = Arc::downgrade(self);
        let add = move |handler: EventHandler<E>| {
            if let Some(source) = for_add.upgrade() {
                source.add(handler);
            }
        };
        let remove = move |handler: &EventHandler<E>| {
            if let Some(source) = for_remove.upgrade() {
                source.remove(handler);
            }
        };
        (add, remove)
    }
}
