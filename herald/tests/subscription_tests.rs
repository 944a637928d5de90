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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::*;

use herald::prelude::*;
use herald_test::prelude::*;

use crate::setup::*;

mod setup;

struct Consumer {
    seen: AtomicUsize,
}

fn counting(counter: &Arc<AtomicUsize>) -> EventHandler<Tick> {
    let counter = counter.clone();
    Arc::new(move |_tick: &Tick| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[herald_test]
async fn test_owned_subscription_detaches_on_dispose_and_drop() -> anyhow::Result<()> {
    initialize_tracing();
    let ticks = Arc::new(EventSource::<Tick>::new());
    let counter = Arc::new(AtomicUsize::new(0));

    let first = ticks.subscribe(counting(&counter));
    let second = ticks.subscribe(counting(&counter));
    assert_eq!(ticks.handler_count(), 2);

    ticks.raise(&Tick(1))?;
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    first.dispose();
    first.dispose();
    assert!(first.is_disposed());
    assert_eq!(ticks.handler_count(), 1);

    drop(second);
    assert_eq!(ticks.handler_count(), 0);
    ticks.raise(&Tick(2))?;
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    Ok(())
}

#[herald_test]
async fn test_weak_subscription_unhooks_collected_consumer() -> anyhow::Result<()> {
    initialize_tracing();
    let ticks = Arc::new(EventSource::<Tick>::new());
    let consumer = Arc::new(Consumer {
        seen: AtomicUsize::new(0),
    });

    let subscription = ticks.subscribe_for(&consumer, |consumer: &Consumer, tick: &Tick| {
        consumer.seen.fetch_add(tick.0 as usize, Ordering::SeqCst);
        Ok(())
    });
    assert_eq!(Arc::strong_count(&consumer), 1, "the subscription must not own the consumer");

    ticks.raise(&Tick(3))?;
    assert_eq!(consumer.seen.load(Ordering::SeqCst), 3);

    drop(consumer);
    assert_eq!(ticks.handler_count(), 1);
    ticks.raise(&Tick(4))?;
    assert_eq!(ticks.handler_count(), 0, "the trampoline removes itself");
    ticks.raise(&Tick(5))?;

    info!(attached = subscription.is_attached(), "after self-removal");
    subscription.dispose();
    subscription.dispose();
    Ok(())
}

#[herald_test]
async fn test_subscriptions_never_keep_the_producer_alive() -> anyhow::Result<()> {
    initialize_tracing();
    let ticks = Arc::new(EventSource::<Tick>::new());
    let counter = Arc::new(AtomicUsize::new(0));
    let subscription = ticks.subscribe_weak(counting(&counter));

    let producer = Arc::downgrade(&ticks);
    drop(ticks);
    assert!(producer.upgrade().is_none());

    // Detaching from a producer that is gone is a silent no-op.
    subscription.dispose();
    assert!(subscription.is_disposed());
    Ok(())
}

#[herald_test]
async fn test_deferred_initialization() -> anyhow::Result<()> {
    initialize_tracing();
    let ticks = Arc::new(EventSource::<Tick>::new());
    let counter = Arc::new(AtomicUsize::new(0));
    let subscription: Subscription<Tick> = Subscription::new();
    assert!(!subscription.is_attached());

    let add_to = ticks.clone();
    let remove_from = ticks.clone();
    subscription.initialize(
        move |handler| add_to.add(handler),
        move |handler: &EventHandler<Tick>| {
            remove_from.remove(handler);
        },
        counting(&counter),
    )?;
    assert!(subscription.is_attached());
    ticks.raise(&Tick(1))?;

    let again = subscription.initialize(|_| {}, |_: &EventHandler<Tick>| {}, counting(&counter));
    assert!(matches!(again, Err(HeraldError::AlreadyInitialized(_))));

    drop(subscription);
    assert_eq!(ticks.handler_count(), 0);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    Ok(())
}

#[herald_test]
async fn test_disposable_bag_releases_every_member() -> anyhow::Result<()> {
    initialize_tracing();
    let ticks = Arc::new(EventSource::<Tick>::new());
    let counter = Arc::new(AtomicUsize::new(0));
    let cleanups = Arc::new(AtomicUsize::new(0));

    let bag = DisposableBag::new();
    bag.add(ticks.subscribe(counting(&counter)));
    bag.add(ticks.subscribe_weak(counting(&counter)));
    let cleanup = cleanups.clone();
    bag.add(DisposeAction::new(move || {
        cleanup.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(bag.len(), 3);
    assert_eq!(ticks.handler_count(), 2);

    bag.dispose();
    bag.dispose();
    assert_eq!(ticks.handler_count(), 0);
    assert_eq!(cleanups.load(Ordering::SeqCst), 1);

    bag.add(ticks.subscribe(counting(&counter)));
    assert_eq!(ticks.handler_count(), 0, "late members are disposed on arrival");
    Ok(())
}
