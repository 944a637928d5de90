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

use parking_lot::Mutex;

use crate::traits::ResponseSlot;

/// The answer slot of a request message.
///
/// The slot stays writable after its message has been frozen, which is how a
/// handler answers through the frozen copy it was given. Cloning copies the
/// current value, so clones evolve independently.
pub struct Response<R> {
    value: Mutex<Option<R>>,
}

impl<R> Default for Response<R> {
    fn default() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }
}

impl<R: Clone> Clone for Response<R> {
    fn clone(&self) -> Self {
        Self {
            value: Mutex::new(self.value.lock().clone()),
        }
    }
}

impl<R> fmt::Debug for Response<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("answered", &self.value.lock().is_some())
            .finish()
    }
}

impl<R: Clone> Response<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the response, replacing any earlier one.
    pub fn set(&self, value: R) {
        *self.value.lock() = Some(value);
    }

    pub fn get(&self) -> Option<R> {
        self.value.lock().clone()
    }

    pub fn take(&self) -> Option<R> {
        self.value.lock().take()
    }

    pub fn is_set(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<R> ResponseSlot for Response<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn has_value(&self) -> bool {
        self.is_set()
    }

    fn adopt(&self, other: &dyn ResponseSlot) -> bool {
        let answer = other
            .as_any()
            .downcast_ref::<Response<R>>()
            .and_then(Response::get);
        match answer {
            Some(value) => {
                self.set(value);
                true
            }
            None => false,
        }
    }

    fn clear(&self) {
        self.value.lock().take();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_evolve_independently() {
        let original: Response<String> = Response::new();
        let copy = original.clone();
        copy.set("answer".to_string());

        assert!(!original.is_set());
        assert_eq!(copy.get().as_deref(), Some("answer"));
    }

    #[test]
    fn adopt_ignores_empty_and_foreign_slots() {
        let target: Response<String> = Response::new();
        target.set("kept".to_string());

        let empty: Response<String> = Response::new();
        assert!(!target.adopt(&empty));

        let foreign: Response<u32> = Response::new();
        foreign.set(3);
        assert!(!target.adopt(&foreign));
        assert_eq!(target.get().as_deref(), Some("kept"));
    }

    #[test]
    fn clear_empties_the_slot() {
        let slot: Response<u32> = Response::new();
        slot.set(7);
        ResponseSlot::clear(&slot);
        assert!(!slot.has_value());
    }
}
