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
pub use collection_changed::{CollectionChangedListener, CollectionChangedWeakListener, CollectionHandler};
pub use message_listener::{MessageHandler, MessageListener};
pub use message_trigger::MessageTrigger;
pub use property::Property;
pub use property_changed::{PropertyChangedListener, PropertyChangedWeakListener, PropertyHandler};
pub use subscription::Subscription;
pub use weak_subscription::WeakSubscription;

mod collection_changed;
mod message_listener;
mod message_trigger;
mod property;
mod property_changed;
pub(crate) mod subscription;
mod weak_subscription;
