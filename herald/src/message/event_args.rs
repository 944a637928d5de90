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

//! Event arguments carried by property-change and collection-change notifications.

use derive_new::new;

/// Describes a property change.
///
/// An empty name means "every property changed" and reaches only the
/// catch-all handlers of a listener.
#[derive(new, Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyChangedEventArgs {
    #[new(into)]
    property_name: String,
}

impl PropertyChangedEventArgs {
    /// Arguments announcing that every property changed.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// The key a listener filters on, `None` for "every property".
    pub(crate) fn filter_key(&self) -> Option<&str> {
        Some(self.property_name.as_str()).filter(|name| !name.is_empty())
    }
}

/// The kind of change a collection went through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionChangeAction {
    Add,
    Remove,
    Replace,
    Move,
    /// The collection changed too much to describe item by item.
    Reset,
}

/// Describes a collection change.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionChangedEventArgs<T> {
    action: CollectionChangeAction,
    new_items: Vec<T>,
    old_items: Vec<T>,
    new_starting_index: Option<usize>,
    old_starting_index: Option<usize>,
}

impl<T> CollectionChangedEventArgs<T> {
    /// `items` were inserted starting at `index`.
    pub fn added(items: Vec<T>, index: usize) -> Self {
        Self {
            action: CollectionChangeAction::Add,
            new_items: items,
            old_items: Vec::new(),
            new_starting_index: Some(index),
            old_starting_index: None,
        }
    }

    /// `items` were removed starting at `index`.
    pub fn removed(items: Vec<T>, index: usize) -> Self {
        Self {
            action: CollectionChangeAction::Remove,
            new_items: Vec::new(),
            old_items: items,
            new_starting_index: None,
            old_starting_index: Some(index),
        }
    }

    /// `old_items` at `index` were overwritten by `new_items`.
    pub fn replaced(new_items: Vec<T>, old_items: Vec<T>, index: usize) -> Self {
        Self {
            action: CollectionChangeAction::Replace,
            new_items,
            old_items,
            new_starting_index: Some(index),
            old_starting_index: Some(index),
        }
    }

    /// `items` moved from `old_index` to `new_index`.
    pub fn moved(items: Vec<T>, new_index: usize, old_index: usize) -> Self
    where
        T: Clone,
    {
        Self {
            action: CollectionChangeAction::Move,
            new_items: items.clone(),
            old_items: items,
            new_starting_index: Some(new_index),
            old_starting_index: Some(old_index),
        }
    }

    pub fn reset() -> Self {
        Self {
            action: CollectionChangeAction::Reset,
            new_items: Vec::new(),
            old_items: Vec::new(),
            new_starting_index: None,
            old_starting_index: None,
        }
    }

    pub fn action(&self) -> CollectionChangeAction {
        self.action
    }

    pub fn new_items(&self) -> &[T] {
        &self.new_items
    }

    pub fn old_items(&self) -> &[T] {
        &self.old_items
    }

    pub fn new_starting_index(&self) -> Option<usize> {
        self.new_starting_index
    }

    pub fn old_starting_index(&self) -> Option<usize> {
        self.old_starting_index
    }
}
