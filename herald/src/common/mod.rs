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
pub use config::{BehaviorConfig, ContextConfig, DispatchConfig, HeraldConfig, CONFIG};
pub use disposables::{DisposableBag, DisposeAction};
pub use error::HeraldError;
pub use event_source::EventSource;
pub use handler_registry::HandlerRegistry;
pub use messenger::{Messenger, WeakMessenger};
pub use notification_object::NotificationObject;
pub use owner_thread::OwnerThread;
pub(crate) use types::Job;
pub use types::{EventHandler, HandlerResult};

mod config;
mod disposables;
mod error;
mod event_source;
mod handler_registry;
mod messenger;
mod notification_object;
mod owner_thread;
pub(crate) mod types;
