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
use crate::listener::{Property, Subscription, WeakSubscription};
use crate::message::PropertyChangedEventArgs;
use crate::traits::{Disposable, NotifyPropertyChanged};

/// A property-change callback: receives the live source and the change.
pub type PropertyHandler<S> = dyn Fn(&S, &PropertyChangedEventArgs) -> HandlerResult + Send + Sync;

/// Crate-internal: the registry shared by both property listener flavours,
/// keyed by property name.
pub(crate) struct PropertyHandlers<S> {
    registry: HandlerRegistry<String, PropertyHandler<S>>,
}

impl<S: NotifyPropertyChanged> PropertyHandlers<S> {
    fn new(owner: &'static str) -> Self {
        Self {
            registry: HandlerRegistry::new(owner),
        }
    }

    fn register<F>(&self, property_name: &str, handler: F) -> Result<(), HeraldError>
    where
        F: Fn(&S, &PropertyChangedEventArgs) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_many(property_name, vec![Arc::new(handler) as Arc<PropertyHandler<S>>])
    }

    fn register_many<I>(&self, property_name: &str, handlers: I) -> Result<(), HeraldError>
    where
        I: IntoIterator<Item = Arc<PropertyHandler<S>>>,
    {
        if property_name.is_empty() {
            for handler in handlers {
                self.registry.register_all(handler)?;
            }
            Ok(())
        } else {
            self.registry.register_many(property_name.to_string(), handlers)
        }
    }

    fn register_property<T, F>(&self, property: Property<S, T>, callback: F) -> Result<(), HeraldError>
    where
        T: 'static,
        F: Fn(&S, T) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(property.name(), move |source: &S, _args: &PropertyChangedEventArgs| {
            callback(source, property.get(source))
        })
    }

    /// Runs the handlers matching the changed property, then the catch-all ones.
    fn deliver(&self, source: &S, args: &PropertyChangedEventArgs) -> HandlerResult {
        let delivered = self
            .registry
            .dispatch(args.filter_key(), |handler| handler(source, args))?;
        trace!(property = args.property_name(), delivered, "property change delivered");
        Ok(())
    }
}

/// Attaches to the producer's event without keeping the producer alive.
fn attach_adapters<S: NotifyPropertyChanged>(
    source: &Arc<S>,
) -> (
    impl FnOnce(EventHandler<PropertyChangedEventArgs>),
    impl Fn(&EventHandler<PropertyChangedEventArgs>) + Send + Sync + 'static,
) {
    let add_to: Weak<S> = Arc::downgrade(source);
    let remove_from: Weak<S> = Arc::downgrade(source);
    (
        move |handler: EventHandler<PropertyChangedEventArgs>| {
            if let Some(source) = add_to.upgrade() {
                source.property_changed().add(handler);
            }
        },
        move |handler: &EventHandler<PropertyChangedEventArgs>| {
            if let Some(source) = remove_from.upgrade() {
                source.property_changed().remove(handler);
            }
        },
    )
}

macro_rules! property_registration {
    () => {
        /// Registers `handler` for changes of `property_name`; an empty name
        /// registers a catch-all handler.
        pub fn register<F>(&self, property_name: &str, handler: F) -> Result<(), HeraldError>
        where
            F: Fn(&S, &PropertyChangedEventArgs) -> HandlerResult + Send + Sync + 'static,
        {
            self.handlers.register(property_name, handler)
        }

        /// Registers `handler` for every property change.
        pub fn register_all<F>(&self, handler: F) -> Result<(), HeraldError>
        where
            F: Fn(&S, &PropertyChangedEventArgs) -> HandlerResult + Send + Sync + 'static,
        {
            self.handlers.register("", handler)
        }

        /// Registers several handlers for `property_name`, in order.
        pub fn register_many<I>(&self, property_name: &str, handlers: I) -> Result<(), HeraldError>
        where
            I: IntoIterator<Item = Arc<PropertyHandler<S>>>,
        {
            self.handlers.register_many(property_name, handlers)
        }

        /// Registers `callback` for changes of `property`, handing it the
        /// property's current value.
        pub fn register_property<T, F>(&self, property: Property<S, T>, callback: F) -> Result<(), HeraldError>
        where
            T: 'static,
            F: Fn(&S, T) -> HandlerResult + Send + Sync + 'static,
        {
            self.handlers.register_property(property, callback)
        }

        /// Number of registered handlers, catch-all included.
        pub fn handler_count(&self) -> usize {
            self.handlers.registry.handler_count()
        }
    };
}

/// Receives property changes from `S` and routes them by property name.
///
/// The producer holds the listener's forwarding handler strongly; the
/// listener detaches when disposed or dropped. Every delivery reads the live
/// producer through a weak reference, and a producer that is gone receives
/// nothing.
pub struct PropertyChangedListener<S: NotifyPropertyChanged> {
    handlers: Arc<PropertyHandlers<S>>,
    subscription: Subscription<PropertyChangedEventArgs>,
}

impl<S: NotifyPropertyChanged> PropertyChangedListener<S> {
    pub fn new(source: &Arc<S>) -> Self {
        let handlers: Arc<PropertyHandlers<S>> = Arc::new(PropertyHandlers::new("PropertyChangedListener"));
        let producer: Weak<S> = Arc::downgrade(source);
        let registry = Arc::clone(&handlers);
        let forward: EventHandler<PropertyChangedEventArgs> = Arc::new(move |args: &PropertyChangedEventArgs| {
            match producer.upgrade() {
                Some(source) => registry.deliver(&*source, args),
                None => Ok(()),
            }
        });
        let (add, remove) = attach_adapters(source);
        Self {
            handlers,
            subscription: Subscription::attach(add, remove, forward),
        }
    }

    property_registration!();
}

impl<S: NotifyPropertyChanged> Disposable for PropertyChangedListener<S> {
    fn dispose(&self) {
        self.subscription.dispose();
        self.handlers.registry.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.handlers.registry.is_disposed()
    }
}

/// Like [`PropertyChangedListener`], but the producer only holds a trampoline
/// and never keeps the listener's handlers alive.
pub struct PropertyChangedWeakListener<S: NotifyPropertyChanged> {
    handlers: Arc<PropertyHandlers<S>>,
    subscription: WeakSubscription<PropertyChangedEventArgs>,
}

impl<S: NotifyPropertyChanged> PropertyChangedWeakListener<S> {
    pub fn new(source: &Arc<S>) -> Self {
        let handlers = Arc::new(PropertyHandlers::new("PropertyChangedWeakListener"));
        let producer: Weak<S> = Arc::downgrade(source);
        let (add, remove) = attach_adapters(source);
        let subscription = WeakSubscription::attach_to(
            &handlers,
            add,
            remove,
            move |handlers: &PropertyHandlers<S>, args: &PropertyChangedEventArgs| match producer.upgrade() {
                Some(source) => handlers.deliver(&source, args),
                None => Ok(()),
            },
        );
        Self {
            handlers,
            subscription,
        }
    }

    property_registration!();
}

impl<S: NotifyPropertyChanged> Disposable for PropertyChangedWeakListener<S> {
    fn dispose(&self) {
        self.subscription.dispose();
        self.handlers.registry.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.handlers.registry.is_disposed()
    }
}
