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
use std::sync::{Arc, Weak};

use tracing::*;

use crate::common::{EventHandler, HandlerRegistry, HandlerResult, HeraldError};
use crate::listener::{Subscription, WeakSubscription};
use crate::message::{CollectionChangeAction, CollectionChangedEventArgs};
use crate::traits::{Disposable, NotifyCollectionChanged};

type ChangeArgs<S> = CollectionChangedEventArgs<<S as NotifyCollectionChanged>::Item>;

/// A collection-change callback: receives the live source and the change.
pub type CollectionHandler<S> = dyn Fn(&S, &ChangeArgs<S>) -> HandlerResult + Send + Sync;

pub(crate) struct CollectionHandlers<S: NotifyCollectionChanged> {
    registry: HandlerRegistry<CollectionChangeAction, CollectionHandler<S>>,
}

impl<S: NotifyCollectionChanged> CollectionHandlers<S> {
    fn new(owner: &'static str) -> Self {
        Self {
            registry: HandlerRegistry::new(owner),
        }
    }

    fn deliver(&self, source: &S, args: &ChangeArgs<S>) -> HandlerResult {
        let action = args.action();
        let delivered = self
            .registry
            .dispatch(Some(&action), |handler| handler(source, args))?;
        trace!(?action, delivered, "collection change delivered");
        Ok(())
    }
}

fn attach_adapters<S: NotifyCollectionChanged>(
    source: &Arc<S>,
) -> (
    impl FnOnce(EventHandler<ChangeArgs<S>>),
    impl Fn(&EventHandler<ChangeArgs<S>>) + Send + Sync + 'static,
) {
    let add_to: Weak<S> = Arc::downgrade(source);
    let remove_from: Weak<S> = Arc::downgrade(source);
    (
        move |handler: EventHandler<ChangeArgs<S>>| {
            if let Some(source) = add_to.upgrade() {
                source.collection_changed().add(handler);
            }
        },
        move |handler: &EventHandler<ChangeArgs<S>>| {
            if let Some(source) = remove_from.upgrade() {
                source.collection_changed().remove(handler);
            }
        },
    )
}

macro_rules! collection_registration {
    () => {
        /// Registers `handler` for changes of kind `action`.
        pub fn register<F>(&self, action: CollectionChangeAction, handler: F) -> Result<(), HeraldError>
        where
            F: Fn(&S, &ChangeArgs<S>) -> HandlerResult + Send + Sync + 'static,
        {
            self.handlers.registry.register(action, Arc::new(handler))
        }

        /// Registers `handler` for every change.
        pub fn register_all<F>(&self, handler: F) -> Result<(), HeraldError>
        where
            F: Fn(&S, &ChangeArgs<S>) -> HandlerResult + Send + Sync + 'static,
        {
            self.handlers.registry.register_all(Arc::new(handler))
        }

        /// Registers several handlers for `action`, in order.
        pub fn register_many<I>(&self, action: CollectionChangeAction, handlers: I) -> Result<(), HeraldError>
        where
            I: IntoIterator<Item = Arc<CollectionHandler<S>>>,
        {
            self.handlers.registry.register_many(action, handlers)
        }

        /// Number of registered handlers, catch-all included.
        pub fn handler_count(&self) -> usize {
            self.handlers.registry.handler_count()
        }
    };
}

/// Receives collection changes from `S` and routes them by change kind.
///
/// Handlers registered for the change kind run first, catch-all handlers
/// second. The listener detaches when disposed or dropped.
pub struct CollectionChangedListener<S: NotifyCollectionChanged> {
    handlers: Arc<CollectionHandlers<S>>,
    subscription: Subscription<ChangeArgs<S>>,
}

impl<S: NotifyCollectionChanged> CollectionChangedListener<S> {
    pub fn new(source: &Arc<S>) -> Self {
        let handlers: Arc<CollectionHandlers<S>> = Arc::new(CollectionHandlers::new("CollectionChangedListener"));
        let producer: Weak<S> = Arc::downgrade(source);
        let registry = Arc::clone(&handlers);
        let forward: EventHandler<ChangeArgs<S>> = Arc::new(move |args: &ChangeArgs<S>| match producer.upgrade() {
            Some(source) => registry.deliver(&*source, args),
            None => Ok(()),
        });
        let (add, remove) = attach_adapters(source);
        Self {
            handlers,
            subscription: Subscription::attach(add, remove, forward),
        }
    }

    collection_registration!();
}

impl<S: NotifyCollectionChanged> Disposable for CollectionChangedListener<S> {
    fn dispose(&self) {
        self.subscription.dispose();
        self.handlers.registry.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.handlers.registry.is_disposed()
    }
}

/// Like [`CollectionChangedListener`], but the producer only holds a
/// trampoline that unhooks itself once the listener is gone.
pub struct CollectionChangedWeakListener<S: NotifyCollectionChanged> {
    handlers: Arc<CollectionHandlers<S>>,
    subscription: WeakSubscription<ChangeArgs<S>>,
}

impl<S: NotifyCollectionChanged> CollectionChangedWeakListener<S> {
    pub fn new(source: &Arc<S>) -> Self {
        let handlers = Arc::new(CollectionHandlers::new("CollectionChangedWeakListener"));
        let producer: Weak<S> = Arc::downgrade(source);
        let (add, remove) = attach_adapters(source);
        let subscription = WeakSubscription::attach_to(
            &handlers,
            add,
            remove,
            move |handlers: &CollectionHandlers<S>, args: &ChangeArgs<S>| match producer.upgrade() {
                Some(source) => handlers.deliver(&source, args),
                None => Ok(()),
            },
        );
        Self {
            handlers,
            subscription,
        }
    }

    collection_registration!();
}

impl<S: NotifyCollectionChanged> Disposable for CollectionChangedWeakListener<S> {
    fn dispose(&self) {
        self.subscription.dispose();
        self.handlers.registry.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.handlers.registry.is_disposed()
    }
}
