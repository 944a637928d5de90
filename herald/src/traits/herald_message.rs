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
use std::fmt::Debug;

use dyn_clone::DynClone;

/// A message that can be published through a [`Messenger`](crate::common::Messenger).
///
/// Listeners never hand the published value itself to their callbacks. They
/// clone it (through [`DynClone`]), empty the clone's response slot, freeze
/// it, and dispatch the clone, so implementations must make `clone` deep enough that one callback's
/// writes are invisible to callbacks of other listeners.
pub trait HeraldMessage: DynClone + Any + Send + Sync + Debug {
    /// The filter key for keyed registrations; `None` reaches catch-all
    /// handlers only.
    fn message_key(&self) -> Option<&str>;

    /// Whether the structural fields have been locked.
    fn is_frozen(&self) -> bool;

    /// Locks the structural fields against further writes.
    fn freeze(&mut self);

    /// The response slot of request messages.
    fn response(&self) -> Option<&dyn ResponseSlot> {
        None
    }

    /// Returns a reference to the message as `Any`.
    fn as_any(&self) -> &dyn Any;
}

dyn_clone::clone_trait_object!(HeraldMessage);

/// The type-erased side of a [`Response`](crate::message::Response) slot.
pub trait ResponseSlot: Send + Sync {
    /// Whether a response has been written.
    fn has_value(&self) -> bool;

    /// Copies the value held by `other` into `self`.
    ///
    /// Returns `false`, leaving `self` untouched, when `other` holds no value
    /// or is a slot of a different response type.
    fn adopt(&self, other: &dyn ResponseSlot) -> bool;

    /// Empties the slot.
    fn clear(&self);

    /// Returns a reference to the slot as `Any`.
    fn as_any(&self) -> &dyn Any;
}
