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
use std::sync::{Arc, Weak};

use static_assertions::assert_impl_all;
use tracing::*;

use crate::common::{EventSource, HeraldError, CONFIG};
use crate::message::RequestMessage;
use crate::traits::HeraldMessage;

/// The central publish point.
///
/// A `Messenger` owns only the "message raised" event. Delivery fan-out
/// belongs to the [`MessageListener`](crate::listener::MessageListener)s and
/// [`MessageTrigger`](crate::listener::MessageTrigger)s attached to it, which
/// hold the messenger weakly. Cloning a `Messenger` yields another handle to
/// the same broker.
#[derive(Clone, Default)]
pub struct Messenger {
    inner: Arc<MessengerInner>,
}

#[derive(Default)]
pub(crate) struct MessengerInner {
    raised: EventSource<dyn HeraldMessage>,
}

assert_impl_all!(Messenger: Send, Sync);

/// A non-owning handle to a [`Messenger`].
#[derive(Clone, Default)]
pub struct WeakMessenger {
    inner: Weak<MessengerInner>,
}

impl fmt::Debug for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl fmt::Debug for WeakMessenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakMessenger")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `message` to every attached listener and returns it.
    ///
    /// An unfrozen message is frozen first. Every attached listener has run
    /// when this returns, and answers given by request handlers have been
    /// copied onto the returned message. Delivery order across listeners is
    /// unspecified. A failing handler aborts the publish with
    /// [`HeraldError::Handler`].
    #[instrument(skip(self, message), fields(message_key = ?message.message_key()))]
    pub fn publish<M: HeraldMessage>(&self, mut message: M) -> Result<M, HeraldError> {
        if !message.is_frozen() {
            message.freeze();
        }
        if CONFIG.behavior.trace_payloads {
            trace!(payload = ?message, "publishing");
        }
        trace!(listeners = self.listener_count(), "publishing message");
        self.inner.raised.raise(&message)?;
        Ok(message)
    }

    /// Runs [`publish`](Self::publish) on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn publish_async<M: HeraldMessage>(&self, message: M) -> Result<M, HeraldError> {
        let messenger = self.clone();
        tokio::task::spawn_blocking(move || messenger.publish(message)).await?
    }

    /// Publishes `request` and returns the answer a handler gave, if any.
    pub fn request<V, R>(&self, request: RequestMessage<V, R>) -> Result<Option<R>, HeraldError>
    where
        RequestMessage<V, R>: HeraldMessage,
        R: Clone,
    {
        Ok(self.publish(request)?.answer())
    }

    /// The event every listener attaches to.
    pub fn raised(&self) -> &EventSource<dyn HeraldMessage> {
        &self.inner.raised
    }

    pub fn listener_count(&self) -> usize {
        self.inner.raised.handler_count()
    }

    pub fn downgrade(&self) -> WeakMessenger {
        WeakMessenger {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same broker.
    pub fn same_as(&self, other: &Messenger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl WeakMessenger {
    pub fn upgrade(&self) -> Option<Messenger> {
        self.inner.upgrade().map(|inner| Messenger { inner })
    }
}
