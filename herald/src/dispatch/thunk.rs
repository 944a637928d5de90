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

use crate::common::HeraldError;
use crate::dispatch::MethodInfo;

/// A value returned by a method invoked through the dispatch cache.
pub type DispatchValue = Box<dyn Any + Send + Sync>;

pub(crate) type ActionFn = dyn Fn(&dyn Any, Option<&dyn Any>) -> Result<(), HeraldError> + Send + Sync;
pub(crate) type FunctionFn =
    dyn Fn(&dyn Any, Option<&dyn Any>) -> Result<DispatchValue, HeraldError> + Send + Sync;

/// A compiled invocation path for one `(target type, method, argument type)`.
///
/// Action-shaped thunks call methods without a return value and yield
/// `None`; function-shaped thunks yield the boxed return value.
#[derive(Clone)]
pub enum Thunk {
    Action(Arc<ActionFn>),
    Function(Arc<FunctionFn>),
}

impl Thunk {
    pub fn call(&self, target: &dyn Any, argument: Option<&dyn Any>) -> Result<Option<DispatchValue>, HeraldError> {
        match self {
            Thunk::Action(action) => action(target, argument).map(|()| None),
            Thunk::Function(function) => function(target, argument).map(Some),
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Thunk::Action(_))
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thunk::Action(_) => f.write_str("Thunk::Action"),
            Thunk::Function(_) => f.write_str("Thunk::Function"),
        }
    }
}

/// Strategy turning a resolved method into a [`Thunk`].
///
/// The dispatch cache runs the compiler off the calling thread unless
/// background compilation is disabled, and publishes the result for every
/// later call with the same cache key.
pub trait ThunkCompiler: Send + Sync + 'static {
    fn compile(&self, method: &MethodInfo) -> Thunk;
}

/// The default compiler: binds the method's monomorphized invoker directly,
/// dropping the shape checks the by-name path performs on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpecializingCompiler;

impl ThunkCompiler for SpecializingCompiler {
    fn compile(&self, method: &MethodInfo) -> Thunk {
        trace!(method = method.name(), returns_value = method.returns_value(), "specializing thunk");
        method.body().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_thunks_yield_no_value() {
        let action = Thunk::Action(Arc::new(
            |_: &dyn Any, _: Option<&dyn Any>| -> Result<(), HeraldError> { Ok(()) },
        ));
        assert!(action.is_action());
        assert!(action.call(&(), None).unwrap().is_none());

        let function = Thunk::Function(Arc::new(
            |_: &dyn Any, _: Option<&dyn Any>| -> Result<DispatchValue, HeraldError> { Ok(Box::new(7u8)) },
        ));
        let value = function.call(&(), None).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<u8>(), Some(&7));
    }
}
