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

use parking_lot::Mutex;

use herald::prelude::*;
use herald_test::prelude::*;

use crate::setup::*;

mod setup;

fn thread_name() -> Option<String> {
    std::thread::current().name().map(str::to_string)
}

#[herald_test]
async fn test_actions_run_on_the_owner_thread() -> anyhow::Result<()> {
    initialize_tracing();
    let owner = Arc::new(OwnerThread::with_name("herald-owner-trigger".to_string())?);
    let messenger = Messenger::new();
    let seen_on: Arc<Mutex<Vec<Option<String>>>> = Arc::default();

    let trigger = MessageTrigger::with_context(&messenger, owner.clone());
    let sink = seen_on.clone();
    trigger.register_typed("ask", move |request: &RequestMessage<(), String>| {
        sink.lock().push(thread_name());
        request.respond("from owner".to_string());
        Ok(())
    })?;

    // Marshalled from a worker thread; blocks until the owner ran the action.
    let answer = messenger.request(RequestMessage::<(), String>::with_key("ask", ()))?;
    assert_eq!(answer.as_deref(), Some("from owner"));

    // Published from the owner itself; runs inline.
    let inline_messenger = messenger.clone();
    let (sender, receiver) = std::sync::mpsc::channel();
    owner.run_on_owner(Box::new(move || {
        let answer = inline_messenger.request(RequestMessage::<(), String>::with_key("ask", ()));
        let _ = sender.send(answer.map_err(|err| err.to_string()));
    }))?;
    let inline = receiver.recv()?;
    assert_eq!(inline.ok().flatten().as_deref(), Some("from owner"));

    let seen_on = seen_on.lock();
    assert_eq!(seen_on.len(), 2);
    assert!(seen_on
        .iter()
        .all(|name| name.as_deref() == Some("herald-owner-trigger")));
    Ok(())
}

#[herald_test]
async fn test_trigger_without_context_runs_inline() -> anyhow::Result<()> {
    initialize_tracing();
    let messenger = Messenger::new();
    let seen_on: Arc<Mutex<Option<Option<String>>>> = Arc::default();
    let trigger = MessageTrigger::new(&messenger);
    let sink = seen_on.clone();
    trigger.register_all(move |_message| {
        *sink.lock() = Some(thread_name());
        Ok(())
    })?;

    let publisher = thread_name();
    messenger.publish(Message::new(()))?;
    assert_eq!(*seen_on.lock(), Some(publisher));
    Ok(())
}

#[herald_test]
async fn test_disabled_trigger_ignores_messages() -> anyhow::Result<()> {
    initialize_tracing();
    let owner = Arc::new(OwnerThread::with_name("herald-owner-disabled".to_string())?);
    let messenger = Messenger::new();
    let runs = Arc::new(AtomicUsize::new(0));

    let trigger = MessageTrigger::with_context(&messenger, owner);
    let counter = runs.clone();
    trigger.register("tick", move |_message| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;

    trigger.set_enabled(false);
    assert!(!trigger.is_enabled());
    messenger.publish(Message::with_key("tick", Tick(1)))?;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    trigger.set_enabled(true);
    messenger.publish(Message::with_key("tick", Tick(2)))?;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    Ok(())
}

#[herald_test]
async fn test_trigger_can_be_repointed() -> anyhow::Result<()> {
    initialize_tracing();
    let first = Messenger::new();
    let second = Messenger::new();
    let runs = Arc::new(AtomicUsize::new(0));

    let trigger = MessageTrigger::unbound(None);
    let counter = runs.clone();
    trigger.register_all(move |_message| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;
    first.publish(Message::new(()))?;
    assert_eq!(runs.load(Ordering::SeqCst), 0, "an unbound trigger hears nothing");

    trigger.set_messenger(Some(&first))?;
    first.publish(Message::new(()))?;
    trigger.set_messenger(Some(&second))?;
    first.publish(Message::new(()))?;
    second.publish(Message::new(()))?;
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    trigger.dispose();
    second.publish(Message::new(()))?;
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert!(matches!(trigger.set_messenger(Some(&first)), Err(HeraldError::Disposed(_))));
    Ok(())
}

#[herald_test]
async fn test_call_method_action_through_a_trigger() -> anyhow::Result<()> {
    initialize_tracing();
    let owner = Arc::new(OwnerThread::with_name("herald-owner-calls".to_string())?);
    let calculator = Arc::new(Calculator::default());
    let messenger = Messenger::new();

    let trigger = MessageTrigger::with_context(&messenger, owner);
    trigger.register_action("calc", CallMethodAction::new(calculator.clone()).with_method("bump"))?;

    let bumped = messenger.publish(CallMethodMessage::unnamed().keyed("calc"))?;
    assert_eq!(bumped.result_as::<usize>(), Some(1));

    let squared = messenger.publish(CallMethodMessage::with_argument("square", 9i64).keyed("calc"))?;
    assert_eq!(squared.result_as::<i64>(), Some(81));

    let recorded = messenger.publish(CallMethodMessage::with_argument("record", "hello".to_string()).keyed("calc"))?;
    assert!(recorded.result().is_none(), "action-shaped methods leave the result empty");
    assert_eq!(calculator.log(), vec!["hello".to_string()]);
    assert_eq!(calculator.calls(), 2);
    Ok(())
}
