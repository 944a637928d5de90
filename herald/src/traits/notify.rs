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

use crate::common::EventSource;
use crate::message::{CollectionChangedEventArgs, PropertyChangedEventArgs};

/// A producer that announces property changes.
pub trait NotifyPropertyChanged: Send + Sync + 'static {
    /// The event raised after a property changed.
    fn property_changed(&self) -> &EventSource<PropertyChangedEventArgs>;
}

/// A producer that announces changes to the collection it holds.
pub trait NotifyCollectionChanged: Send + Sync + 'static {
    /// Element type carried in change notifications.
    type Item: Clone + Send + Sync + 'static;

    /// The event raised after the collection changed.
    fn collection_changed(&self) -> &EventSource<CollectionChangedEventArgs<Self::Item>>;
}
