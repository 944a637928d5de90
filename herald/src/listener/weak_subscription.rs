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
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::*;

use crate::common::types::{HandlerFn, RemoveFn};
use crate::common::{EventHandler, HandlerResult, HeraldError};
use crate::listener::subscription::Link;
use crate::traits::Disposable;

/// A link between an event and a consumer that the event never keeps alive.
///
/// The event only sees a trampoline. On every notification the trampoline
/// upgrades its weak reference to the consumer: while the consumer is alive
/// the callback runs, and the first notification after the consumer has been
/// dropped makes the trampoline remove itself from the event instead. No
/// error reaches the producer in that case.
///
/// [`attach_to`](Self::attach_to) observes an arbitrary consumer object.
/// [`attach`](Self::attach) makes the subscription itself the consumer, so the
/// handler lives exactly as long as the subscription. Both flavours detach
/// when disposed or dropped.
pub struct WeakSubscription<E: ?Sized + 'static> {
    link: Link<E>,
    retained: Mutex<Option<Arc<dyn Any + Send + Sync>>>,
}

impl<E: ?Sized + 'static> Default for WeakSubscription<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + 'static> fmt::Debug for WeakSubscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSubscription")
            .field("attached", &self.link.is_attached())
            .field("disposed", &self.link.is_disposed())
            .finish()
    }
}

impl<E: ?Sized + 'static> WeakSubscription<E> {
    pub fn new() -> Self {
        Self {
            link: Link::new("WeakSubscription"),
            retained: Mutex::new(None),
        }
    }

    /// Attaches `handler`, owned by the subscription.
    pub fn attach<A, R>(add: A, remove: R, handler: EventHandler<E>) -> Self
    where
        A: FnOnce(EventHandler<E>),
        R: Fn(&EventHandler<E>) + Send + Sync + 'static,
    {
        let owned: Arc<EventHandler<E>> = Arc::new(handler);
        let remove: RemoveFn<E> = Arc::new(remove);
        let trampoline = trampoline(&owned, remove.clone(), forward::<E>);
        add(trampoline.clone());
        let retained: Arc<dyn Any + Send + Sync> = owned;
        Self {
            link: Link::attached("WeakSubscription", trampoline, remove),
            retained: Mutex::new(Some(retained)),
        }
    }

    /// Attaches `callback` on behalf of `consumer`, which stays weakly held.
    pub fn attach_to<C, A, R, F>(consumer: &Arc<C>, add: A, remove: R, callback: F) -> Self
    where
        C: Send + Sync + 'static,
        A: FnOnce(EventHandler<E>),
        R: Fn(&EventHandler<E>) + Send + Sync + 'static,
        F: Fn(&C, &E) -> HandlerResult + Send + Sync + 'static,
    {
        let remove: RemoveFn<E> = Arc::new(remove);
        let trampoline = trampoline(consumer, remove.clone(), callback);
        add(trampoline.clone());
        Self {
            link: Link::attached("WeakSubscription", trampoline, remove),
            retained: Mutex::new(None),
        }
    }

    /// Attaches `handler` on a subscription created with [`new`](Self::new).
    pub fn initialize<A, R>(&self, add: A, remove: R, handler: EventHandler<E>) -> Result<(), HeraldError>
    where
        A: FnOnce(EventHandler<E>),
        R: Fn(&EventHandler<E>) + Send + Sync + 'static,
    {
        let owned: Arc<EventHandler<E>> = Arc::new(handler);
        let remove: RemoveFn<E> = Arc::new(remove);
        let trampoline = trampoline(&owned, remove.clone(), forward::<E>);
        self.link.attach(add, remove, trampoline)?;
        let retained: Arc<dyn Any + Send + Sync> = owned;
        *self.retained.lock() = Some(retained);
        Ok(())
    }

    /// Attaches `callback` for `consumer` on a subscription created with
    /// [`new`](Self::new).
    pub fn initialize_to<C, A, R, F>(
        &self,
        consumer: &Arc<C>,
        add: A,
        remove: R,
        callback: F,
    ) -> Result<(), HeraldError>
    where
        C: Send + Sync + 'static,
        A: FnOnce(EventHandler<E>),
        R: Fn(&EventHandler<E>) + Send + Sync + 'static,
        F: Fn(&C, &E) -> HandlerResult + Send + Sync + 'static,
    {
        let remove: RemoveFn<E> = Arc::new(remove);
        let trampoline = trampoline(consumer, remove.clone(), callback);
        self.link.attach(add, remove, trampoline)
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_attached()
    }
}

impl<E: ?Sized + 'static> Disposable for WeakSubscription<E> {
    fn dispose(&self) {
        if self.link.dispose() {
            self.retained.lock().take();
        }
    }

    fn is_disposed(&self) -> bool {
        self.link.is_disposed()
    }
}

impl<E: ?Sized + 'static> Drop for WeakSubscription<E> {
    fn drop(&mut self) {
        self.link.dispose();
    }
}

fn forward<E: ?Sized + 'static>(handler: &EventHandler<E>, args: &E) -> HandlerResult {
    handler(args)
}

/// Builds the handler the event actually holds: it calls `callback` while
/// `consumer` is alive and unhooks itself afterwards.
fn trampoline<E, C, F>(consumer: &Arc<C>, remove: RemoveFn<E>, callback: F) -> EventHandler<E>
where
    E: ?Sized + 'static,
    C: Send + Sync + 'static,
    F: Fn(&C, &E) -> HandlerResult + Send + Sync + 'static,
{
    let consumer: Weak<C> = Arc::downgrade(consumer);
    let this: Arc<OnceLock<Weak<HandlerFn<E>>>> = Arc::new(OnceLock::new());
    let own = Arc::clone(&this);
    let handler: EventHandler<E> = Arc::new(move |args: &E| {
        if let Some(consumer) = consumer.upgrade() {
            return callback(&*consumer, args);
        }
        if let Some(me) = own.get().and_then(Weak::upgrade) {
            debug!("consumer dropped, trampoline detaching itself");
            remove(&me);
        }
        Ok(())
    });
    let _ = this.set(Arc::downgrade(&handler));
    handler
}
