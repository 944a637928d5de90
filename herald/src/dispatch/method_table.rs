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
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::common::HeraldError;
use crate::dispatch::{ArgType, DispatchValue, Thunk};

/// The declared parameter of a one-argument method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterInfo {
    /// Accepts arguments of exactly this type.
    Exact(ArgType),
    /// Takes `&dyn Any` and so accepts an argument of any type.
    Any,
}

impl ParameterInfo {
    pub fn accepts(&self, argument: ArgType) -> bool {
        match self {
            ParameterInfo::Exact(declared) => *declared == argument,
            ParameterInfo::Any => true,
        }
    }
}

impl fmt::Display for ParameterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterInfo::Exact(declared) => write!(f, "&{}", declared),
            ParameterInfo::Any => f.write_str("&dyn Any"),
        }
    }
}

/// One entry of a [`MethodTable`]: a method that can be called by name.
#[derive(Clone)]
pub struct MethodInfo {
    name: &'static str,
    parameter: Option<ParameterInfo>,
    body: Thunk,
}

impl MethodInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `None` for methods without an argument.
    pub fn parameter(&self) -> Option<ParameterInfo> {
        self.parameter
    }

    pub fn returns_value(&self) -> bool {
        !self.body.is_action()
    }

    /// Human readable signature, e.g. `greet(&self, &alloc::string::String) -> value`.
    pub fn signature(&self) -> String {
        let parameter = self
            .parameter
            .map(|parameter| format!(", {}", parameter))
            .unwrap_or_default();
        let returns = if self.returns_value() { " -> value" } else { "" };
        format!("{}(&self{}){}", self.name, parameter, returns)
    }

    /// Calls the method after checking the argument against its declared
    /// parameter. This is the uncached path taken on the first call for a key.
    pub fn invoke(&self, target: &dyn Any, argument: Option<&dyn Any>) -> Result<Option<DispatchValue>, HeraldError> {
        match (self.parameter, argument) {
            (None, Some(_)) => {
                return Err(HeraldError::InvalidArgument(format!("`{}` takes no argument", self.name)));
            }
            (Some(_), None) => {
                return Err(HeraldError::InvalidArgument(format!("`{}` takes one argument", self.name)));
            }
            (Some(ParameterInfo::Exact(declared)), Some(argument)) if !declared.matches(argument) => {
                return Err(HeraldError::TargetMismatch {
                    expected: declared.name(),
                    found: format!("{:?}", Any::type_id(argument)),
                });
            }
            _ => {}
        }
        self.body.call(target, argument)
    }

    pub(crate) fn body(&self) -> &Thunk {
        &self.body
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("parameter", &self.parameter)
            .field("returns_value", &self.returns_value())
            .finish()
    }
}

/// The methods of one type that may be invoked by name.
///
/// Usually generated by `#[dispatch_target]`; build one by hand with
/// [`MethodTable::builder`]. Several entries may share a name, which is how
/// overloads are expressed.
#[derive(Debug)]
pub struct MethodTable {
    type_name: &'static str,
    type_id: TypeId,
    methods: Vec<MethodInfo>,
}

impl MethodTable {
    pub fn builder<T: Any + Send + Sync>() -> MethodTableBuilder<T> {
        MethodTableBuilder {
            methods: Vec::new(),
            _target: PhantomData,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Finds the method called `name` whose shape fits `argument`.
    ///
    /// Without an argument only parameterless methods qualify. With one,
    /// methods declaring exactly that type win over methods taking
    /// `&dyn Any`. Several equally good candidates are an error.
    pub fn resolve(&self, name: &str, argument: Option<ArgType>) -> Result<&MethodInfo, HeraldError> {
        let named = self.methods.iter().filter(|method| method.name == name);
        let candidates: Vec<&MethodInfo> = match argument {
            None => named.filter(|method| method.parameter.is_none()).collect(),
            Some(argument) => {
                let assignable: Vec<&MethodInfo> = named
                    .filter(|method| method.parameter.is_some_and(|p| p.accepts(argument)))
                    .collect();
                let exact: Vec<&MethodInfo> = assignable
                    .iter()
                    .copied()
                    .filter(|method| method.parameter == Some(ParameterInfo::Exact(argument)))
                    .collect();
                if exact.is_empty() {
                    assignable
                } else {
                    exact
                }
            }
        };

        match candidates.as_slice() {
            [method] => Ok(*method),
            [] => Err(HeraldError::MethodNotFound {
                type_name: self.type_name,
                method_name: name.to_string(),
                shape: match argument {
                    None => "no parameters".to_string(),
                    Some(argument) => format!("one parameter accepting `{}`", argument),
                },
            }),
            _ => Err(HeraldError::AmbiguousMethod {
                type_name: self.type_name,
                method_name: name.to_string(),
                candidates: candidates.iter().map(|method| method.signature()).collect(),
            }),
        }
    }
}

/// Builds the [`MethodTable`] of `T`.
pub struct MethodTableBuilder<T> {
    methods: Vec<MethodInfo>,
    _target: PhantomData<fn(&T)>,
}

impl<T: Any + Send + Sync> MethodTableBuilder<T> {
    /// A method without argument or return value.
    pub fn action<F>(self, name: &'static str, method: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let body = Thunk::Action(Arc::new(
            move |target: &dyn Any, _: Option<&dyn Any>| -> Result<(), HeraldError> {
                method(downcast_target::<T>(target)?);
                Ok(())
            },
        ));
        self.push(name, None, body)
    }

    /// A method without argument returning a value.
    pub fn function<R, F>(self, name: &'static str, method: F) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let body = Thunk::Function(Arc::new(
            move |target: &dyn Any, _: Option<&dyn Any>| -> Result<DispatchValue, HeraldError> {
                Ok(Box::new(method(downcast_target::<T>(target)?)))
            },
        ));
        self.push(name, None, body)
    }

    /// A method taking a `&A` without return value.
    pub fn action_with_argument<A, F>(self, name: &'static str, method: F) -> Self
    where
        A: Any,
        F: Fn(&T, &A) + Send + Sync + 'static,
    {
        let body = Thunk::Action(Arc::new(
            move |target: &dyn Any, argument: Option<&dyn Any>| -> Result<(), HeraldError> {
                method(downcast_target::<T>(target)?, downcast_argument::<A>(name, argument)?);
                Ok(())
            },
        ));
        self.push(name, Some(ParameterInfo::Exact(ArgType::of::<A>())), body)
    }

    /// A method taking a `&A` and returning a value.
    pub fn function_with_argument<A, R, F>(self, name: &'static str, method: F) -> Self
    where
        A: Any,
        R: Any + Send + Sync,
        F: Fn(&T, &A) -> R + Send + Sync + 'static,
    {
        let body = Thunk::Function(Arc::new(
            move |target: &dyn Any, argument: Option<&dyn Any>| -> Result<DispatchValue, HeraldError> {
                let value = method(downcast_target::<T>(target)?, downcast_argument::<A>(name, argument)?);
                Ok(Box::new(value))
            },
        ));
        self.push(name, Some(ParameterInfo::Exact(ArgType::of::<A>())), body)
    }

    /// A method taking `&dyn Any` without return value.
    pub fn action_with_any<F>(self, name: &'static str, method: F) -> Self
    where
        F: Fn(&T, &dyn Any) + Send + Sync + 'static,
    {
        let body = Thunk::Action(Arc::new(
            move |target: &dyn Any, argument: Option<&dyn Any>| -> Result<(), HeraldError> {
                method(downcast_target::<T>(target)?, require_argument(name, argument)?);
                Ok(())
            },
        ));
        self.push(name, Some(ParameterInfo::Any), body)
    }

    /// A method taking `&dyn Any` and returning a value.
    pub fn function_with_any<R, F>(self, name: &'static str, method: F) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(&T, &dyn Any) -> R + Send + Sync + 'static,
    {
        let body = Thunk::Function(Arc::new(
            move |target: &dyn Any, argument: Option<&dyn Any>| -> Result<DispatchValue, HeraldError> {
                Ok(Box::new(method(downcast_target::<T>(target)?, require_argument(name, argument)?)))
            },
        ));
        self.push(name, Some(ParameterInfo::Any), body)
    }

    pub fn build(self) -> MethodTable {
        MethodTable {
            type_name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            methods: self.methods,
        }
    }

    fn push(mut self, name: &'static str, parameter: Option<ParameterInfo>, body: Thunk) -> Self {
        self.methods.push(MethodInfo { name, parameter, body });
        self
    }
}

fn downcast_target<T: Any>(target: &dyn Any) -> Result<&T, HeraldError> {
    target.downcast_ref::<T>().ok_or_else(|| HeraldError::TargetMismatch {
        expected: type_name::<T>(),
        found: format!("{:?}", Any::type_id(target)),
    })
}

fn require_argument<'a>(method: &'static str, argument: Option<&'a dyn Any>) -> Result<&'a dyn Any, HeraldError> {
    argument.ok_or_else(|| HeraldError::InvalidArgument(format!("`{}` takes one argument", method)))
}

fn downcast_argument<'a, A: Any>(method: &'static str, argument: Option<&'a dyn Any>) -> Result<&'a A, HeraldError> {
    let argument = require_argument(method, argument)?;
    argument.downcast_ref::<A>().ok_or_else(|| HeraldError::TargetMismatch {
        expected: type_name::<A>(),
        found: format!("{:?}", Any::type_id(argument)),
    })
}
