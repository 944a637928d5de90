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

//! Type aliases shared by the event source, the subscriptions and the listeners.

use std::sync::Arc;

/// What every registered callback returns. An `Err` stops the dispatch pass
/// and travels back to whoever raised the event.
pub type HandlerResult = anyhow::Result<()>;

/// A shareable callback for events of type `E`.
///
/// Handlers are compared by `Arc` identity, so removing a handler requires the
/// same `Arc` that was added.
pub type EventHandler<E> = Arc<HandlerFn<E>>;

/// The unsized callback behind an [`EventHandler`].
pub type HandlerFn<E> = dyn Fn(&E) -> HandlerResult + Send + Sync;

/// Crate-internal: the producer-side "unsubscribe" primitive kept by a subscription.
pub(crate) type RemoveFn<E> = Arc<dyn Fn(&EventHandler<E>) + Send + Sync>;

/// Crate-internal: a unit of work queued on an owner thread.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Crate-internal: compares two handlers by the address of their shared allocation.
pub(crate) fn same_handler<E: ?Sized>(a: &EventHandler<E>, b: &EventHandler<E>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
