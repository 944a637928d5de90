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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::*;

use crate::common::{EventHandler, HandlerRegistry, HandlerResult, HeraldError, Messenger, CONFIG};
use crate::listener::WeakSubscription;
use crate::traits::{Disposable, HeraldMessage};

/// A message callback: receives the frozen copy made for its listener.
pub type MessageHandler = dyn Fn(&dyn HeraldMessage) -> HandlerResult + Send + Sync;

/// Crate-internal: the keyed registry behind message listeners and triggers.
pub(crate) struct MessageHandlers {
    pub(crate) registry: HandlerRegistry<String, MessageHandler>,
}

impl MessageHandlers {
    pub(crate) fn new(owner: &'static str) -> Self {
        Self {
            registry: HandlerRegistry::new(owner),
        }
    }

    pub(crate) fn register(&self, message_key: &str, handler: Arc<MessageHandler>) -> Result<(), HeraldError> {
        if message_key.is_empty() {
            self.registry.register_all(handler)
        } else {
            self.registry.register(message_key.to_string(), handler)
        }
    }

    /// Runs the handlers for the message's key, then the catch-all handlers.
    pub(crate) fn deliver(&self, message: &dyn HeraldMessage) -> anyhow::Result<usize> {
        self.registry
            .dispatch(message.message_key(), |handler| handler(message))
    }
}

/// Typed adapter: runs `handler` for messages of type `M` and skips the rest.
pub(crate) fn typed<M, F>(handler: F) -> Arc<MessageHandler>
where
    M: HeraldMessage,
    F: Fn(&M) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(move |message: &dyn HeraldMessage| match message.as_any().downcast_ref::<M>() {
        Some(message) => handler(message),
        None => Ok(()),
    })
}

/// Makes the frozen copy a listener dispatches: structural fields are cloned,
/// the response slot starts empty.
pub(crate) fn dispatch_copy(message: &(dyn HeraldMessage + 'static)) -> Box<dyn HeraldMessage> {
    let mut copy: Box<dyn HeraldMessage> = dyn_clone::clone_box(message);
    if let Some(slot) = copy.response() {
        slot.clear();
    }
    copy.freeze();
    copy
}

/// Copies a handler's answer from the dispatched copy back onto the
/// published message.
pub(crate) fn merge_response(original: &dyn HeraldMessage, copy: &dyn HeraldMessage) {
    if let (Some(target), Some(answer)) = (original.response(), copy.response()) {
        if target.adopt(answer) {
            trace!("response copied back to the published message");
        }
    }
}

struct ListenerCore {
    handlers: MessageHandlers,
    disposed: AtomicBool,
}

impl ListenerCore {
    fn receive(&self, message: &(dyn HeraldMessage + 'static)) -> HandlerResult {
        if self.disposed.load(Ordering::Acquire) {
            return Ok(());
        }

        let copy = dispatch_copy(message);
        if CONFIG.behavior.trace_payloads {
            trace!(payload = ?copy, "message received");
        }

        let delivered = self.handlers.deliver(&*copy)?;
        trace!(message_key = ?copy.message_key(), delivered, "message delivered");
        merge_response(message, &*copy);
        Ok(())
    }
}

/// Receives messages from a [`Messenger`] and routes them by message key.
///
/// For every published message the listener makes one frozen copy, runs the
/// handlers registered under the message's key and then the catch-all
/// handlers, all with that copy, and finally copies any answer back onto the
/// published message. Handlers of other listeners get copies of their own.
///
/// The messenger only holds a weak link to the listener. A disposed listener
/// stops forwarding at once; dropping it detaches it.
pub struct MessageListener {
    core: Arc<ListenerCore>,
    subscription: WeakSubscription<dyn HeraldMessage>,
}

impl fmt::Debug for MessageListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageListener")
            .field("handlers", &self.core.handlers.registry.handler_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl MessageListener {
    #[instrument(skip(messenger))]
    pub fn new(messenger: &Messenger) -> Self {
        let core = Arc::new(ListenerCore {
            handlers: MessageHandlers::new("MessageListener"),
            disposed: AtomicBool::new(false),
        });
        let (add, remove) = attach_adapters(messenger);
        let subscription: WeakSubscription<dyn HeraldMessage> = WeakSubscription::attach_to(
            &core,
            add,
            remove,
            |core, message| core.receive(message),
        );
        trace!("message listener attached");
        Self { core, subscription }
    }

    /// Creates a listener with one handler, registered under `message_key`
    /// or as a catch-all handler when the key is `None`.
    pub fn with_handler<F>(messenger: &Messenger, message_key: Option<&str>, handler: F) -> Result<Self, HeraldError>
    where
        F: Fn(&dyn HeraldMessage) -> HandlerResult + Send + Sync + 'static,
    {
        let listener = Self::new(messenger);
        listener.register(message_key.unwrap_or_default(), handler)?;
        Ok(listener)
    }

    /// Registers `handler` under `message_key`; an empty key registers a
    /// catch-all handler.
    pub fn register<F>(&self, message_key: &str, handler: F) -> Result<(), HeraldError>
    where
        F: Fn(&dyn HeraldMessage) -> HandlerResult + Send + Sync + 'static,
    {
        self.core.handlers.register(message_key, Arc::new(handler))
    }

    /// Registers `handler` for every message.
    pub fn register_all<F>(&self, handler: F) -> Result<(), HeraldError>
    where
        F: Fn(&dyn HeraldMessage) -> HandlerResult + Send + Sync + 'static,
    {
        self.register("", handler)
    }

    /// Registers several handlers under `message_key`, in order.
    pub fn register_many<I>(&self, message_key: &str, handlers: I) -> Result<(), HeraldError>
    where
        I: IntoIterator<Item = Arc<MessageHandler>>,
    {
        for handler in handlers {
            self.core.handlers.register(message_key, handler)?;
        }
        Ok(())
    }

    /// Registers `handler` under `message_key` for messages of type `M` only.
    pub fn register_typed<M, F>(&self, message_key: &str, handler: F) -> Result<(), HeraldError>
    where
        M: HeraldMessage,
        F: Fn(&M) -> HandlerResult + Send + Sync + 'static,
    {
        self.core.handlers.register(message_key, typed::<M, F>(handler))
    }

    pub fn handler_count(&self) -> usize {
        self.core.handlers.registry.handler_count()
    }
}

impl Disposable for MessageListener {
    fn dispose(&self) {
        if self.core.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.subscription.dispose();
        self.core.handlers.registry.dispose();
        trace!("message listener disposed");
    }

    fn is_disposed(&self) -> bool {
        self.core.disposed.load(Ordering::Acquire)
    }
}

/// Attaches to the messenger's event without keeping the messenger alive.
#[allow(clippy::type_complexity)]
pub(crate) fn attach_adapters(
    messenger: &Messenger,
) -> (
    impl FnOnce(EventHandler<dyn HeraldMessage>),
    impl Fn(&EventHandler<dyn HeraldMessage>) + Send + Sync + 'static,
) {
    let add_to = messenger.downgrade();
    let remove_from = messenger.downgrade();
    (
        move |handler: EventHandler<dyn HeraldMessage>| {
            if let Some(messenger) = add_to.upgrade() {
                messenger.raised().add(handler);
            }
        },
        move |handler: &EventHandler<dyn HeraldMessage>| {
            if let Some(messenger) = remove_from.upgrade() {
                messenger.raised().remove(handler);
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, RequestMessage};

    #[test]
    fn dispatch_copy_starts_without_an_answer() {
        let request: RequestMessage<(), u32> = RequestMessage::new(());
        request.respond(5);

        let copy = dispatch_copy(&request);
        assert!(copy.is_frozen());
        assert!(copy.response().is_some_and(|slot| !slot.has_value()));
        assert_eq!(request.answer(), Some(5));
    }

    #[test]
    fn disposed_listener_stops_forwarding_and_rejects_registration() {
        let messenger = Messenger::new();
        let listener = MessageListener::new(&messenger);
        listener
            .register_all(|_| Err(anyhow::anyhow!("should not run")))
            .unwrap();

        listener.dispose();
        listener.dispose();
        assert!(messenger.publish(Message::new(1u8)).is_ok());
        assert!(matches!(
            listener.register_all(|_| Ok(())),
            Err(HeraldError::Disposed("MessageListener"))
        ));
        assert_eq!(messenger.listener_count(), 0);
    }

    #[test]
    fn dropping_the_listener_detaches_it() {
        let messenger = Messenger::new();
        let listener = MessageListener::new(&messenger);
        assert_eq!(messenger.listener_count(), 1);
        drop(listener);
        assert_eq!(messenger.listener_count(), 0);
    }
}
