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
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::*;

use crate::common::{HandlerResult, HeraldError, Messenger, WeakMessenger};
use crate::listener::message_listener::{attach_adapters, dispatch_copy, merge_response, typed, MessageHandlers};
use crate::listener::WeakSubscription;
use crate::traits::execution_context::on_owner;
use crate::traits::{Disposable, ExecutionContext, HeraldMessage, MessageAction};

struct TriggerCore {
    this: Weak<TriggerCore>,
    handlers: MessageHandlers,
    enabled: AtomicBool,
    disposed: AtomicBool,
    context: Option<Arc<dyn ExecutionContext>>,
}

impl TriggerCore {
    fn receive(&self, message: &(dyn HeraldMessage + 'static)) -> HandlerResult {
        if self.disposed.load(Ordering::Acquire) {
            return Ok(());
        }
        let Some(core) = self.this.upgrade() else {
            return Ok(());
        };

        let copy: Arc<dyn HeraldMessage> = Arc::from(dispatch_copy(message));
        let context = self.context.as_deref();

        let gate = Arc::clone(&core);
        let enabled = on_owner(context, move || gate.enabled.load(Ordering::Acquire))?;
        if !enabled {
            trace!(message_key = ?copy.message_key(), "trigger disabled, message ignored");
            return Ok(());
        }

        let dispatched = Arc::clone(&copy);
        let delivered = on_owner(context, move || core.handlers.deliver(&*dispatched))??;
        trace!(message_key = ?copy.message_key(), delivered, "trigger actions ran");
        merge_response(message, &*copy);
        Ok(())
    }
}

/// A [`MessageListener`](crate::listener::MessageListener) that runs its
/// actions on an owner [`ExecutionContext`].
///
/// When the trigger has a context and a message arrives on another thread,
/// both the enabled check and the actions are marshalled onto the owner and
/// the publishing thread blocks until they have run. Without a context, or
/// when the message arrives on the owner, everything runs inline.
///
/// The trigger can be re-pointed at another messenger, and disabled without
/// being detached.
pub struct MessageTrigger {
    core: Arc<TriggerCore>,
    subscription: Mutex<Option<WeakSubscription<dyn HeraldMessage>>>,
    messenger: Mutex<Option<WeakMessenger>>,
}

impl fmt::Debug for MessageTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageTrigger")
            .field("handlers", &self.core.handlers.registry.handler_count())
            .field("enabled", &self.is_enabled())
            .field("has_context", &self.core.context.is_some())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl MessageTrigger {
    /// A trigger on `messenger` that runs its actions inline.
    pub fn new(messenger: &Messenger) -> Self {
        let trigger = Self::unbound(None);
        trigger.bind(messenger);
        trigger
    }

    /// A trigger on `messenger` that runs its actions on `context`.
    pub fn with_context(messenger: &Messenger, context: Arc<dyn ExecutionContext>) -> Self {
        let trigger = Self::unbound(Some(context));
        trigger.bind(messenger);
        trigger
    }

    /// A trigger not attached to any messenger yet; see
    /// [`set_messenger`](Self::set_messenger).
    pub fn unbound(context: Option<Arc<dyn ExecutionContext>>) -> Self {
        let core = Arc::new_cyclic(|this| TriggerCore {
            this: this.clone(),
            handlers: MessageHandlers::new("MessageTrigger"),
            enabled: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
            context,
        });
        Self {
            core,
            subscription: Mutex::new(None),
            messenger: Mutex::new(None),
        }
    }

    /// Detaches from the current messenger, if any, and attaches to
    /// `messenger`, if given. Re-pointing at the current messenger does
    /// nothing.
    #[instrument(skip(self, messenger))]
    pub fn set_messenger(&self, messenger: Option<&Messenger>) -> Result<(), HeraldError> {
        if self.is_disposed() {
            return Err(HeraldError::Disposed("MessageTrigger"));
        }
        let current = self.messenger();
        match (current.as_ref(), messenger) {
            (Some(current), Some(next)) if current.same_as(next) => return Ok(()),
            (None, None) => return Ok(()),
            _ => {}
        }

        if let Some(previous) = self.subscription.lock().take() {
            previous.dispose();
            trace!("trigger detached from previous messenger");
        }
        self.messenger.lock().take();
        if let Some(next) = messenger {
            self.bind(next);
        }
        Ok(())
    }

    /// The messenger the trigger is attached to, while it is alive.
    pub fn messenger(&self) -> Option<Messenger> {
        self.messenger.lock().as_ref().and_then(WeakMessenger::upgrade)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.core.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.core.enabled.load(Ordering::Acquire)
    }

    /// Registers `handler` under `message_key`; an empty key registers a
    /// catch-all handler.
    pub fn register<F>(&self, message_key: &str, handler: F) -> Result<(), HeraldError>
    where
        F: Fn(&dyn HeraldMessage) -> HandlerResult + Send + Sync + 'static,
    {
        self.core.handlers.register(message_key, Arc::new(handler))
    }

    pub fn register_all<F>(&self, handler: F) -> Result<(), HeraldError>
    where
        F: Fn(&dyn HeraldMessage) -> HandlerResult + Send + Sync + 'static,
    {
        self.register("", handler)
    }

    /// Registers `action` under `message_key`.
    pub fn register_action<A: MessageAction>(&self, message_key: &str, action: A) -> Result<(), HeraldError> {
        let action = Arc::new(action);
        self.core.handlers.register(
            message_key,
            Arc::new(move |message: &dyn HeraldMessage| action.invoke(message)),
        )
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

    fn bind(&self, messenger: &Messenger) {
        let (add, remove) = attach_adapters(messenger);
        let subscription: WeakSubscription<dyn HeraldMessage> =
            WeakSubscription::attach_to(&self.core, add, remove, |core, message| core.receive(message));
        *self.subscription.lock() = Some(subscription);
        *self.messenger.lock() = Some(messenger.downgrade());
        trace!("trigger attached to messenger");
    }
}

impl Disposable for MessageTrigger {
    fn dispose(&self) {
        if self.core.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.dispose();
        }
        self.messenger.lock().take();
        self.core.handlers.registry.dispose();
        trace!("message trigger disposed");
    }

    fn is_disposed(&self) -> bool {
        self.core.disposed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::message::{Message, RequestMessage};

    #[test]
    fn each_trigger_sees_an_unanswered_copy() {
        let messenger = Messenger::new();
        let clean = Arc::new(AtomicUsize::new(0));
        let triggers: Vec<MessageTrigger> = (0..2u32)
            .map(|id| {
                let trigger = MessageTrigger::new(&messenger);
                let clean = clean.clone();
                trigger
                    .register_typed("ask", move |request: &RequestMessage<(), u32>| {
                        if request.answer().is_none() {
                            clean.fetch_add(1, Ordering::SeqCst);
                        }
                        request.respond(id);
                        Ok(())
                    })
                    .unwrap();
                trigger
            })
            .collect();

        let published = messenger
            .publish(RequestMessage::<(), u32>::with_key("ask", ()))
            .unwrap();
        assert_eq!(clean.load(Ordering::SeqCst), 2);
        assert!(published.answer().is_some());
        drop(triggers);
    }

    #[test]
    fn disabled_trigger_skips_its_actions() {
        let messenger = Messenger::new();
        let trigger = MessageTrigger::new(&messenger);
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        trigger
            .register_all(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        trigger.set_enabled(false);
        messenger.publish(Message::new(())).unwrap();
        trigger.set_enabled(true);
        messenger.publish(Message::new(())).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_messenger_moves_the_trigger() {
        let first = Messenger::new();
        let second = Messenger::new();
        let trigger = MessageTrigger::new(&first);
        assert_eq!(first.listener_count(), 1);

        trigger.set_messenger(Some(&first)).unwrap();
        assert_eq!(first.listener_count(), 1);

        trigger.set_messenger(Some(&second)).unwrap();
        assert_eq!(first.listener_count(), 0);
        assert_eq!(second.listener_count(), 1);
        assert!(trigger.messenger().is_some_and(|m| m.same_as(&second)));

        trigger.set_messenger(None).unwrap();
        assert_eq!(second.listener_count(), 0);
        assert!(trigger.messenger().is_none());
    }

    #[test]
    fn disposed_trigger_rejects_rebinding() {
        let messenger = Messenger::new();
        let trigger = MessageTrigger::new(&messenger);
        trigger.dispose();
        assert!(matches!(
            trigger.set_messenger(Some(&messenger)),
            Err(HeraldError::Disposed("MessageTrigger"))
        ));
        assert_eq!(messenger.listener_count(), 0);
    }
}
