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

use crate::common::HeraldError;
use crate::message::message::normalize_key;
use crate::message::Response;
use crate::traits::{HeraldMessage, ResponseSlot};

/// A message that expects an answer of type `R`.
///
/// A handler answers with [`respond`](Self::respond) on the frozen copy it
/// receives; the listener copies the answer back onto the published message
/// after all of its handlers have run.
#[derive(Clone, Debug)]
pub struct RequestMessage<V, R> {
    key: Option<String>,
    value: V,
    response: Response<R>,
    frozen: bool,
}

impl<V, R: Clone> RequestMessage<V, R> {
    pub fn new(value: V) -> Self {
        Self {
            key: None,
            value,
            response: Response::new(),
            frozen: false,
        }
    }

    pub fn with_key(key: impl Into<String>, value: V) -> Self {
        Self {
            key: normalize_key(key.into()),
            value,
            response: Response::new(),
            frozen: false,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn set_value(&mut self, value: V) -> Result<(), HeraldError> {
        if self.frozen {
            return Err(HeraldError::Frozen("value"));
        }
        self.value = value;
        Ok(())
    }

    /// Answers the request. Allowed on frozen messages.
    pub fn respond(&self, answer: R) {
        self.response.set(answer);
    }

    /// The current answer, if any handler gave one.
    pub fn answer(&self) -> Option<R> {
        self.response.get()
    }
}

impl<V, R> HeraldMessage for RequestMessage<V, R>
where
    V: Clone + Debug + Send + Sync + 'static,
    R: Clone + Debug + Send + Sync + 'static,
{
    fn message_key(&self) -> Option<&str> {
        self.key()
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn response(&self) -> Option<&dyn ResponseSlot> {
        Some(&self.response)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_request_still_accepts_an_answer() {
        let mut request: RequestMessage<(), String> = RequestMessage::with_key("Ask", ());
        request.freeze();

        request.respond("X".to_string());
        assert_eq!(request.answer().as_deref(), Some("X"));
        assert!(matches!(request.set_value(()), Err(HeraldError::Frozen("value"))));
    }
}
