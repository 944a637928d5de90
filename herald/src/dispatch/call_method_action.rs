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

use tracing::*;

use crate::common::{HandlerResult, HeraldError};
use crate::dispatch::{ArgType, DispatchCache, DispatchValue, MethodBinder, MethodBinderWithArgument};
use crate::message::{CallMethodMessage, SharedValue};
use crate::traits::{DispatchTarget, HeraldMessage, MessageAction};

/// Calls a method on a fixed target for every [`CallMethodMessage`] it
/// receives, and stores the method's return value in the message's result.
///
/// The method name and argument come from the message; the action's own
/// method name and parameter fill in what the message leaves out. Messages
/// of other types are ignored.
pub struct CallMethodAction {
    target: Arc<dyn DispatchTarget>,
    method_name: Option<String>,
    parameter: Option<(ArgType, SharedValue)>,
    binder: MethodBinder,
    binder_with_argument: MethodBinderWithArgument,
}

impl fmt::Debug for CallMethodAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallMethodAction")
            .field("target", &self.target.method_table().type_name())
            .field("method_name", &self.method_name)
            .field("parameter", &self.parameter.as_ref().map(|(ty, _)| ty.name()))
            .finish()
    }
}

impl CallMethodAction {
    pub fn new(target: Arc<dyn DispatchTarget>) -> Self {
        Self {
            target,
            method_name: None,
            parameter: None,
            binder: MethodBinder::new(),
            binder_with_argument: MethodBinderWithArgument::new(),
        }
    }

    /// The method to call when a message names none.
    pub fn with_method(mut self, method_name: impl Into<String>) -> Self {
        let method_name = method_name.into();
        self.method_name = (!method_name.is_empty()).then_some(method_name);
        self
    }

    /// The argument to pass when a message carries none.
    pub fn with_parameter<A: Any + Send + Sync>(mut self, parameter: A) -> Self {
        self.parameter = Some((ArgType::of::<A>(), Arc::new(parameter)));
        self
    }

    /// Binds through `cache` instead of the global cache.
    pub fn with_cache(mut self, cache: Arc<DispatchCache>) -> Self {
        self.binder = MethodBinder::with_cache(cache.clone());
        self.binder_with_argument = MethodBinderWithArgument::with_cache(cache);
        self
    }

    /// Performs the call `message` asks for without touching its result.
    pub fn call(&self, message: &CallMethodMessage) -> Result<Option<DispatchValue>, HeraldError> {
        let method_name = message
            .method_name()
            .or(self.method_name.as_deref())
            .ok_or_else(|| HeraldError::InvalidArgument("no method name on the message or the action".to_string()))?;
        let parameter = message
            .parameter()
            .or_else(|| self.parameter.as_ref().map(|(ty, value)| (*ty, value.as_ref())));

        match parameter {
            None => self.binder.invoke(&*self.target, method_name),
            Some((argument_type, argument)) => {
                self.binder_with_argument
                    .invoke_dyn(&*self.target, method_name, argument_type, argument)
            }
        }
    }
}

impl MessageAction for CallMethodAction {
    fn invoke(&self, message: &dyn HeraldMessage) -> HandlerResult {
        let Some(message) = message.as_any().downcast_ref::<CallMethodMessage>() else {
            trace!("not a call-method message, skipped");
            return Ok(());
        };
        if let Some(value) = self.call(message)? {
            let value: SharedValue = Arc::from(value);
            message.set_result(value);
        }
        Ok(())
    }
}
