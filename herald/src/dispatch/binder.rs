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

use parking_lot::Mutex;
use tracing::*;

use crate::common::HeraldError;
use crate::dispatch::{ArgType, CacheKey, DispatchCache, DispatchValue, Thunk};
use crate::traits::DispatchTarget;

/// The last key a binder resolved, with the thunk that served it.
struct LocalBinding {
    key: CacheKey,
    thunk: Thunk,
}

/// Shared lookup used by both binders.
///
/// Order: the binder's own last binding, then the shared cache, then a
/// by-name resolution against the target's method table. A resolution
/// schedules compilation of the key and serves the call uncached.
struct Binding {
    cache: Arc<DispatchCache>,
    last: Mutex<Option<LocalBinding>>,
}

impl Binding {
    fn new(cache: Arc<DispatchCache>) -> Self {
        Self {
            cache,
            last: Mutex::new(None),
        }
    }

    fn call(
        &self,
        target: &dyn DispatchTarget,
        method_name: &str,
        argument: Option<(ArgType, &dyn Any)>,
    ) -> Result<Option<DispatchValue>, HeraldError> {
        if method_name.is_empty() {
            return Err(HeraldError::InvalidArgument("method name must not be empty".to_string()));
        }
        let receiver = target.as_any();
        let argument_type = argument.map(|(argument_type, _)| argument_type);
        let argument_value = argument.map(|(_, value)| value);
        let key = CacheKey::new(Any::type_id(receiver), method_name, argument_type);

        let local = self
            .last
            .lock()
            .as_ref()
            .filter(|binding| binding.key == key)
            .map(|binding| binding.thunk.clone());
        if let Some(thunk) = local {
            return thunk.call(receiver, argument_value);
        }

        if let Some(thunk) = self.cache.get(&key) {
            trace!(method = method_name, "shared cache hit");
            *self.last.lock() = Some(LocalBinding {
                key,
                thunk: thunk.clone(),
            });
            return thunk.call(receiver, argument_value);
        }

        let table = target.method_table();
        if table.type_id() != key.target() {
            return Err(HeraldError::TargetMismatch {
                expected: table.type_name(),
                found: format!("{:?}", key.target()),
            });
        }
        let method = table.resolve(method_name, argument_type)?;
        debug!(
            type_name = table.type_name(),
            method = method_name,
            argument = ?argument_type,
            "resolved by name, scheduling compilation"
        );
        self.cache.schedule(key, method.clone());
        method.invoke(receiver, argument_value)
    }
}

/// Invokes parameterless methods by name.
///
/// Each binder remembers the last key it served so repeated calls from the
/// same call site skip the shared map.
pub struct MethodBinder {
    binding: Binding,
}

impl fmt::Debug for MethodBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodBinder").field("cache", &self.binding.cache).finish()
    }
}

impl Default for MethodBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodBinder {
    /// A binder on [`DispatchCache::global`].
    pub fn new() -> Self {
        Self::with_cache(DispatchCache::global())
    }

    pub fn with_cache(cache: Arc<DispatchCache>) -> Self {
        Self {
            binding: Binding::new(cache),
        }
    }

    /// Calls `method_name` on `target`; `None` for methods without a
    /// return value.
    pub fn invoke(&self, target: &dyn DispatchTarget, method_name: &str) -> Result<Option<DispatchValue>, HeraldError> {
        self.binding.call(target, method_name, None)
    }
}

/// Invokes one-argument methods by name.
pub struct MethodBinderWithArgument {
    binding: Binding,
}

impl fmt::Debug for MethodBinderWithArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodBinderWithArgument")
            .field("cache", &self.binding.cache)
            .finish()
    }
}

impl Default for MethodBinderWithArgument {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodBinderWithArgument {
    /// A binder on [`DispatchCache::global`].
    pub fn new() -> Self {
        Self::with_cache(DispatchCache::global())
    }

    pub fn with_cache(cache: Arc<DispatchCache>) -> Self {
        Self {
            binding: Binding::new(cache),
        }
    }

    /// Calls `method_name` on `target` with `argument`.
    pub fn invoke<A: Any>(
        &self,
        target: &dyn DispatchTarget,
        method_name: &str,
        argument: &A,
    ) -> Result<Option<DispatchValue>, HeraldError> {
        self.binding
            .call(target, method_name, Some((ArgType::of::<A>(), argument)))
    }

    /// Calls `method_name` with a type-erased argument; `argument_type` must
    /// be the argument's runtime type.
    pub fn invoke_dyn(
        &self,
        target: &dyn DispatchTarget,
        method_name: &str,
        argument_type: ArgType,
        argument: &dyn Any,
    ) -> Result<Option<DispatchValue>, HeraldError> {
        if !argument_type.matches(argument) {
            return Err(HeraldError::InvalidArgument(format!(
                "argument is not a `{}`",
                argument_type.name()
            )));
        }
        self.binding.call(target, method_name, Some((argument_type, argument)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;

    use super::*;
    use crate::common::DispatchConfig;
    use crate::dispatch::MethodTable;

    #[derive(Default)]
    struct Counter {
        bumps: AtomicUsize,
    }

    impl DispatchTarget for Counter {
        fn method_table(&self) -> &'static MethodTable {
            static TABLE: OnceLock<MethodTable> = OnceLock::new();
            TABLE.get_or_init(|| {
                MethodTable::builder::<Counter>()
                    .action("bump", |counter: &Counter| {
                        counter.bumps.fetch_add(1, Ordering::SeqCst);
                    })
                    .function_with_argument("add", |counter: &Counter, by: &usize| {
                        counter.bumps.fetch_add(*by, Ordering::SeqCst) + *by
                    })
                    .build()
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn inline_cache() -> Arc<DispatchCache> {
        Arc::new(DispatchCache::from_config(&DispatchConfig {
            background_compilation: false,
            ..DispatchConfig::default()
        }))
    }

    #[test]
    fn first_call_compiles_and_later_calls_hit_the_cache() {
        let cache = inline_cache();
        let binder = MethodBinder::with_cache(cache.clone());
        let counter = Counter::default();

        assert!(binder.invoke(&counter, "bump").unwrap().is_none());
        assert_eq!(cache.len(), 1);
        assert!(binder.invoke(&counter, "bump").unwrap().is_none());
        assert!(binder.invoke(&counter, "bump").unwrap().is_none());
        assert_eq!(counter.bumps.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn argument_binder_returns_the_value() {
        let binder = MethodBinderWithArgument::with_cache(inline_cache());
        let counter = Counter::default();
        let total = binder.invoke(&counter, "add", &4usize).unwrap().unwrap();
        assert_eq!(total.downcast_ref::<usize>(), Some(&4));
        let total = binder.invoke_dyn(&counter, "add", ArgType::of::<usize>(), &2usize).unwrap().unwrap();
        assert_eq!(total.downcast_ref::<usize>(), Some(&6));
    }

    #[test]
    fn bad_requests_fail_before_compiling() {
        let cache = inline_cache();
        let binder = MethodBinderWithArgument::with_cache(cache.clone());
        let counter = Counter::default();

        assert!(matches!(
            binder.invoke(&counter, "", &1usize),
            Err(HeraldError::InvalidArgument(_))
        ));
        assert!(matches!(
            binder.invoke(&counter, "add", &1u8),
            Err(HeraldError::MethodNotFound { .. })
        ));
        assert!(matches!(
            binder.invoke_dyn(&counter, "add", ArgType::of::<usize>(), &1u8),
            Err(HeraldError::InvalidArgument(_))
        ));
        assert!(cache.is_empty());
    }
}
