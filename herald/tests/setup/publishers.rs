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
use parking_lot::Mutex;

use herald::prelude::*;

/// A model raising property changes through an embedded [`NotificationObject`].
#[derive(Debug, Default)]
pub struct Person {
    notifier: NotificationObject,
    name: Mutex<String>,
    age: Mutex<u32>,
}

impl NotifyPropertyChanged for Person {
    fn property_changed(&self) -> &EventSource<PropertyChangedEventArgs> {
        self.notifier.property_changed()
    }
}

impl Person {
    pub const NAME: Property<Person, String> = Property::new("name", Person::name);
    pub const AGE: Property<Person, u32> = Property::new("age", Person::age);

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub fn age(&self) -> u32 {
        *self.age.lock()
    }

    pub fn set_name(&self, name: &str) -> HandlerResult {
        let changed = NotificationObject::assign(&mut *self.name.lock(), name.to_string());
        if changed {
            self.notifier.raise_property_changed(Self::NAME.name())?;
        }
        Ok(())
    }

    pub fn set_age(&self, age: u32) -> HandlerResult {
        let changed = NotificationObject::assign(&mut *self.age.lock(), age);
        if changed {
            self.notifier.raise_property_changed(Self::AGE.name())?;
        }
        Ok(())
    }

    /// Announces that every property changed.
    pub fn refresh(&self) -> HandlerResult {
        self.notifier.raise_property_changed("")
    }
}

/// A list raising collection changes for every mutation.
#[derive(Debug)]
pub struct ObservableList<T: Clone + Send + Sync + 'static> {
    items: Mutex<Vec<T>>,
    changed: EventSource<CollectionChangedEventArgs<T>>,
}

impl<T: Clone + Send + Sync + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            changed: EventSource::new(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> NotifyCollectionChanged for ObservableList<T> {
    type Item = T;

    fn collection_changed(&self) -> &EventSource<CollectionChangedEventArgs<T>> {
        &self.changed
    }
}

impl<T: Clone + Send + Sync + 'static> ObservableList<T> {
    pub fn items(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    pub fn push(&self, item: T) -> HandlerResult {
        let index = {
            let mut items = self.items.lock();
            items.push(item.clone());
            items.len() - 1
        };
        self.changed.raise(&CollectionChangedEventArgs::added(vec![item], index))
    }

    pub fn remove(&self, index: usize) -> HandlerResult {
        let removed = self.items.lock().remove(index);
        self.changed.raise(&CollectionChangedEventArgs::removed(vec![removed], index))
    }

    pub fn replace(&self, index: usize, item: T) -> HandlerResult {
        let old = std::mem::replace(&mut self.items.lock()[index], item.clone());
        self.changed
            .raise(&CollectionChangedEventArgs::replaced(vec![item], vec![old], index))
    }

    pub fn move_item(&self, from: usize, to: usize) -> HandlerResult {
        let item = {
            let mut items = self.items.lock();
            let item = items.remove(from);
            items.insert(to, item.clone());
            item
        };
        self.changed.raise(&CollectionChangedEventArgs::moved(vec![item], to, from))
    }

    pub fn clear(&self) -> HandlerResult {
        self.items.lock().clear();
        self.changed.raise(&CollectionChangedEventArgs::reset())
    }
}

/// A plain custom notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tick(pub u32);
