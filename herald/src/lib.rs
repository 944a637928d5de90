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

#![forbid(unsafe_code)]
//! Herald Library
//!
//! In-process publish/subscribe and change notification. Herald provides:
//!
//! * weak subscriptions that never keep their consumer alive and unhook
//!   themselves once the consumer is gone,
//! * keyed handler registries behind property-change, collection-change and
//!   message listeners,
//! * a [`Messenger`](prelude::Messenger) broker with copy-on-dispatch isolation
//!   and request/response round trips,
//! * a by-name dispatch cache that resolves a method once and then serves a
//!   compiled thunk.

// Lets the `#[dispatch_target]` expansion refer to `::herald` from inside this crate.
extern crate self as herald;

/// Common utilities: errors, configuration, the event source, the broker.
pub(crate) mod common;

/// By-name method dispatch with a shared thunk cache.
pub(crate) mod dispatch;
pub(crate) mod listener;
pub(crate) mod message;
/// Trait definitions used across Herald.
pub(crate) mod traits;

/// Prelude module for convenient imports.
///
/// Re-exports every public type of the crate together with the
/// `#[dispatch_target]` attribute.
pub mod prelude {
    pub use herald_macro::dispatch_target;

    pub use crate::common::{
        BehaviorConfig, ContextConfig, DispatchConfig, DisposableBag, DisposeAction,
        EventHandler, EventSource, HandlerRegistry, HandlerResult, HeraldConfig, HeraldError,
        Messenger, NotificationObject, OwnerThread, WeakMessenger, CONFIG,
    };
    pub use crate::dispatch::{
        ArgType, CacheKey, CallMethodAction, DispatchCache, DispatchValue, MethodBinder,
        MethodBinderWithArgument, MethodInfo, MethodTable, MethodTableBuilder, ParameterInfo,
        SpecializingCompiler, Thunk, ThunkCompiler,
    };
    pub use crate::listener::{
        CollectionChangedListener, CollectionChangedWeakListener, CollectionHandler,
        MessageHandler, MessageListener, MessageTrigger, Property, PropertyChangedListener,
        PropertyChangedWeakListener, PropertyHandler, Subscription, WeakSubscription,
    };
    pub use crate::message::{
        CallMethodMessage, CollectionChangeAction, CollectionChangedEventArgs, Message,
        PropertyChangedEventArgs, RequestMessage, Response, SharedValue,
    };
    pub use crate::traits::{
        DispatchTarget, Disposable, ExecutionContext, HeraldMessage, MessageAction,
        NotifyCollectionChanged, NotifyPropertyChanged, ResponseSlot,
    };
}
