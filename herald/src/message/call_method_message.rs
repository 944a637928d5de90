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
use std::sync::Arc;

use crate::common::HeraldError;
use crate::dispatch::ArgType;
use crate::message::message::normalize_key;
use crate::message::Response;
use crate::traits::{HeraldMessage, ResponseSlot};

/// A type-erased value shared between threads.
pub type SharedValue = Arc<dyn Any + Send + Sync>;

/// Asks a [`CallMethodAction`](crate::dispatch::CallMethodAction) to invoke a
/// method by name, optionally with one argument.
///
/// The value returned by the method lands in the result slot, which behaves
/// like the response slot of a [`RequestMessage`](crate::message::RequestMessage).
#[derive(Clone)]
pub struct CallMethodMessage {
    key: Option<String>,
    method_name: Option<String>,
    parameter: Option<(ArgType, SharedValue)>,
    result: Response<SharedValue>,
    frozen: bool,
}

impl fmt::Debug for CallMethodMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallMethodMessage")
            .field("key", &self.key)
            .field("method_name", &self.method_name)
            .field("parameter", &self.parameter.as_ref().map(|(ty, _)| ty.name()))
            .field("result", &self.result)
            .field("frozen", &self.frozen)
            .finish()
    }
}

impl CallMethodMessage {
    /// Calls `method_name` without an argument.
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            key: None,
            method_name: normalize_key(method_name.into()),
            parameter: None,
            result: Response::new(),
            frozen: false,
        }
    }

    /// Calls `method_name` with `argument`.
    pub fn with_argument<A>(method_name: impl Into<String>, argument: A) -> Self
    where
        A: Any + Send + Sync,
    {
        let mut message = Self::new(method_name);
        message.parameter = Some((ArgType::of::<A>(), Arc::new(argument)));
        message
    }

    /// Leaves the method name to the action's configured default.
    pub fn unnamed() -> Self {
        Self::new(String::new())
    }

    /// Sets the message key; chainable before publishing.
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = normalize_key(key.into());
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    pub fn set_method_name(&mut self, method_name: impl Into<String>) -> Result<(), HeraldError> {
        if self.frozen {
            return Err(HeraldError::Frozen("method_name"));
        }
        self.method_name = normalize_key(method_name.into());
        Ok(())
    }

    /// The argument and the type it was supplied as.
    pub fn parameter(&self) -> Option<(ArgType, &(dyn Any + Send + Sync))> {
        self.parameter
            .as_ref()
            .map(|(ty, value)| (*ty, value.as_ref()))
    }

    pub fn set_result(&self, value: SharedValue) {
        self.result.set(value);
    }

    pub fn result(&self) -> Option<SharedValue> {
        self.result.get()
    }

    /// The result downcast to `T`.
    pub fn result_as<T: Any + Clone>(&self) -> Option<T> {
        let value = self.result.get()?;
        let value: &(dyn Any + Send + Sync) = value.as_ref();
        value.downcast_ref::<T>().cloned()
    }
}

impl HeraldMessage for CallMethodMessage {
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
        Some(&self.result)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
