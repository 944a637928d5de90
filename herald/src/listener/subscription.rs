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
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::*;

use crate::common::types::RemoveFn;
use crate::common::{EventHandler, HeraldError};
use crate::traits::Disposable;

enum LinkState<E: ?Sized + 'static> {
    Unattached,
    Attached {
        handler: EventHandler<E>,
        remove: RemoveFn<E>,
    },
    Disposed,
}

/// Crate-internal: the attach/detach state machine shared by both
/// subscription flavours.
///
/// A link attaches at most once and detaches at most once. Attaching a
/// disposed link fails, and attaching twice fails.
pub(crate) struct Link<E: ?Sized + 'static> {
    state: Mutex<LinkState<E>>,
    owner: &'static str,
}

impl<E: ?Sized + 'static> Link<E> {
    pub(crate) fn new(owner: &'static str) -> Self {
        Self {
            state: Mutex::new(LinkState::Unattached),
            owner,
        }
    }

    pub(crate) fn attached(owner: &'static str, handler: EventHandler<E>, remove: RemoveFn<E>) -> Self {
        trace!(owner, "attached");
        Self {
            state: Mutex::new(LinkState::Attached { handler, remove }),
            owner,
        }
    }

    pub(crate) fn attach<A>(
        &self,
        add: A,
        remove: RemoveFn<E>,
        handler: EventHandler<E>,
    ) -> Result<(), HeraldError>
    where
        A: FnOnce(EventHandler<E>),
    {
        let mut state = self.state.lock();
        match *state {
            LinkState::Attached { .. } => return Err(HeraldError::AlreadyInitialized(self.owner)),
            LinkState::Disposed => return Err(HeraldError::Disposed(self.owner)),
            LinkState::Unattached => {}
        }
        add(handler.clone());
        *state = LinkState::Attached { handler, remove };
        trace!(owner = self.owner, "attached");
        Ok(())
    }

    /// Detaches once; later calls return `false` and do nothing.
    pub(crate) fn dispose(&self) -> bool {
        let previous = std::mem::replace(&mut *self.state.lock(), LinkState::Disposed);
        match previous {
            LinkState::Attached { handler, remove } => {
                remove(&handler);
                trace!(owner = self.owner, "detached");
                true
            }
            LinkState::Unattached => true,
            LinkState::Disposed => false,
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        matches!(*self.state.lock(), LinkState::Attached { .. })
    }

    pub(crate) fn is_disposed(&self) -> bool {
        matches!(*self.state.lock(), LinkState::Disposed)
    }
}

/// An owned link between an event and one handler.
///
/// The subscription keeps the handler alive and detaches it exactly once:
/// on [`dispose`](Disposable::dispose) or when dropped.
///
/// `add` and `remove` are the producer's own subscribe and unsubscribe
/// primitives; the subscription keeps `remove` until it detaches.
pub struct Subscription<E: ?Sized + 'static> {
    link: Link<E>,
}

impl<E: ?Sized + 'static> Default for Subscription<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + 'static> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.link.is_attached())
            .field("disposed", &self.link.is_disposed())
            .finish()
    }
}

impl<E: ?Sized + 'static> Subscription<E> {
    /// An unattached subscription, to be completed with [`initialize`](Self::initialize).
    pub fn new() -> Self {
        Self {
            link: Link::new("Subscription"),
        }
    }

    /// Creates the subscription and attaches `handler` through `add`.
    pub fn attach<A, R>(add: A, remove: R, handler: EventHandler<E>) -> Self
    where
        A: FnOnce(EventHandler<E>),
        R: Fn(&EventHandler<E>) + Send + Sync + 'static,
    {
        add(handler.clone());
        Self {
            link: Link::attached("Subscription", handler, Arc::new(remove)),
        }
    }

    /// Attaches `handler` through `add`.
    ///
    /// Fails with `AlreadyInitialized` when the subscription is attached
    /// already and with `Disposed` after it has been disposed.
    pub fn initialize<A, R>(&self, add: A, remove: R, handler: EventHandler<E>) -> Result<(), HeraldError>
    where
        A: FnOnce(EventHandler<E>),
        R: Fn(&EventHandler<E>) + Send + Sync + 'static,
    {
        self.link.attach(add, Arc::new(remove), handler)
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_attached()
    }
}

impl<E: ?Sized + 'static> Disposable for Subscription<E> {
    fn dispose(&self) {
        self.link.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.link.is_disposed()
    }
}

impl<E: ?Sized + 'static> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.link.dispose();
    }
}
