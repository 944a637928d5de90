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
use tracing::*;

use crate::common::{EventSource, HandlerResult};
use crate::message::PropertyChangedEventArgs;
use crate::traits::NotifyPropertyChanged;

/// A ready-made property-change producer.
///
/// Embed it in a model and forward [`NotifyPropertyChanged`] to it:
///
/// ```rust
/// use herald::prelude::*;
///
/// #[derive(Default)]
/// struct Person {
///     notifier: NotificationObject,
///     name: parking_lot::Mutex<String>,
/// }
///
/// impl NotifyPropertyChanged for Person {
///     fn property_changed(&self) -> &EventSource<PropertyChangedEventArgs> {
///         self.notifier.property_changed()
///     }
/// }
///
/// impl Person {
///     fn set_name(&self, name: &str) -> HandlerResult {
///         let mut current = self.name.lock();
///         let changed = NotificationObject::assign(&mut *current, name.to_string());
///         drop(current);
///         if changed {
///             self.notifier.raise_property_changed("name")?;
///         }
///         Ok(())
///     }
/// }
/// # Person::default().set_name("Ada").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct NotificationObject {
    property_changed: EventSource<PropertyChangedEventArgs>,
}

impl NotificationObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises a change of `property_name`; an empty name announces that every
    /// property changed.
    pub fn raise_property_changed(&self, property_name: &str) -> HandlerResult {
        trace!(property = property_name, "raising property change");
        self.property_changed
            .raise(&PropertyChangedEventArgs::new(property_name))
    }

    /// Stores `value` in `field` and raises a change of `property_name`, but
    /// only when the value actually changed. Returns whether it changed.
    pub fn set_property<T: PartialEq>(
        &self,
        field: &mut T,
        value: T,
        property_name: &str,
    ) -> anyhow::Result<bool> {
        if !Self::assign(field, value) {
            return Ok(false);
        }
        self.raise_property_changed(property_name)?;
        Ok(true)
    }

    /// Stores `value` in `field` when it differs; returns whether it did.
    pub fn assign<T: PartialEq>(field: &mut T, value: T) -> bool {
        if *field == value {
            return false;
        }
        *field = value;
        true
    }
}

impl NotifyPropertyChanged for NotificationObject {
    fn property_changed(&self) -> &EventSource<PropertyChangedEventArgs> {
        &self.property_changed
    }
}
