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

use crate::dispatch::MethodTable;

/// An object whose methods can be invoked by name through
/// [`MethodBinder`](crate::dispatch::MethodBinder) and
/// [`MethodBinderWithArgument`](crate::dispatch::MethodBinderWithArgument).
///
/// Implement it with `#[dispatch_target]` on an inherent `impl` block, or by
/// hand with [`MethodTable::builder`].
pub trait DispatchTarget: Any + Send + Sync {
    /// The table describing the methods that may be invoked by name.
    fn method_table(&self) -> &'static MethodTable;

    /// Returns a reference to the target as `Any`.
    fn as_any(&self) -> &dyn Any;
}
