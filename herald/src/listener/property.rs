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
use std::fmt;

/// A typed accessor for one property of `S`.
///
/// Pairs the property's change-notification name with a getter, so a handler
/// registered through it receives the current value instead of re-reading
/// the source by hand.
///
/// ```rust
/// use herald::prelude::*;
///
/// struct Person {
///     name: String,
/// }
///
/// let name: Property<Person, String> = Property::new("name", |p| p.name.clone());
/// let person = Person { name: "Ada".to_string() };
/// assert_eq!(name.name(), "name");
/// assert_eq!(name.get(&person), "Ada");
/// ```
pub struct Property<S, T> {
    name: &'static str,
    getter: fn(&S) -> T,
}

impl<S, T> Property<S, T> {
    pub const fn new(name: &'static str, getter: fn(&S) -> T) -> Self {
        Self { name, getter }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, source: &S) -> T {
        (self.getter)(source)
    }
}

impl<S, T> Clone for Property<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for Property<S, T> {}

impl<S, T> fmt::Debug for Property<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&self.name).finish()
    }
}
