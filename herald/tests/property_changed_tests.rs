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
use std::sync::Arc;

use parking_lot::Mutex;

use herald::prelude::*;
use herald_test::prelude::*;

use crate::setup::*;

mod setup;

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log, tag: &'static str) -> impl Fn(&Person, &PropertyChangedEventArgs) -> HandlerResult + Send + Sync + 'static {
    let log = log.clone();
    move |_person: &Person, args: &PropertyChangedEventArgs| {
        log.lock().push(format!("{}:{}", tag, args.property_name()));
        Ok(())
    }
}

#[herald_test]
async fn test_filtered_handlers_run_before_catch_all() -> anyhow::Result<()> {
    initialize_tracing();
    let person = Arc::new(Person::default());
    let log: Log = Arc::default();

    let listener = PropertyChangedListener::new(&person);
    listener.register("name", recorder(&log, "name"))?;
    listener.register_all(recorder(&log, "any"))?;
    listener.register("age", recorder(&log, "age"))?;

    person.set_name("Ada")?;
    person.set_age(36)?;
    person.set_age(36)?;
    person.refresh()?;

    assert_eq!(
        *log.lock(),
        vec!["name:name", "any:name", "age:age", "any:age", "any:"],
        "an unchanged value raises nothing; an empty name reaches only catch-all handlers"
    );
    assert_eq!(listener.handler_count(), 3);
    Ok(())
}

#[herald_test]
async fn test_typed_property_registration_reads_the_live_value() -> anyhow::Result<()> {
    initialize_tracing();
    let person = Arc::new(Person::default());
    let names: Arc<Mutex<Vec<String>>> = Arc::default();

    let listener = PropertyChangedWeakListener::new(&person);
    let seen = names.clone();
    listener.register_property(Person::NAME, move |_person, name| {
        seen.lock().push(name);
        Ok(())
    })?;

    person.set_name("Ada")?;
    person.set_age(1)?;
    person.set_name("Grace")?;

    assert_eq!(*names.lock(), vec!["Ada".to_string(), "Grace".to_string()]);
    Ok(())
}

#[herald_test]
async fn test_register_many_keeps_registration_order() -> anyhow::Result<()> {
    initialize_tracing();
    let person = Arc::new(Person::default());
    let log: Log = Arc::default();

    let listener = PropertyChangedListener::new(&person);
    let handlers: Vec<Arc<PropertyHandler<Person>>> = vec![
        Arc::new(recorder(&log, "first")),
        Arc::new(recorder(&log, "second")),
    ];
    listener.register_many("age", handlers)?;

    person.set_age(2)?;
    assert_eq!(*log.lock(), vec!["first:age", "second:age"]);
    Ok(())
}

#[herald_test]
async fn test_weak_listener_detaches_when_dropped() -> anyhow::Result<()> {
    initialize_tracing();
    let person = Arc::new(Person::default());
    let log: Log = Arc::default();

    let listener = PropertyChangedWeakListener::new(&person);
    listener.register_all(recorder(&log, "any"))?;
    assert_eq!(person.property_changed().handler_count(), 1);

    person.set_name("Ada")?;
    drop(listener);
    person.set_name("Grace")?;

    assert_eq!(*log.lock(), vec!["any:name"]);
    assert_eq!(person.property_changed().handler_count(), 0);
    Ok(())
}

#[herald_test]
async fn test_disposed_listener_is_silent_and_rejects_registration() -> anyhow::Result<()> {
    initialize_tracing();
    let person = Arc::new(Person::default());
    let log: Log = Arc::default();

    let listener = PropertyChangedListener::new(&person);
    listener.register_all(recorder(&log, "any"))?;

    listener.dispose();
    listener.dispose();
    assert!(listener.is_disposed());
    assert_eq!(person.property_changed().handler_count(), 0);

    person.set_name("Ada")?;
    assert!(log.lock().is_empty());
    assert!(matches!(
        listener.register_all(recorder(&log, "late")),
        Err(HeraldError::Disposed("PropertyChangedListener"))
    ));
    Ok(())
}

#[herald_test]
async fn test_failing_handler_reaches_the_producer() -> anyhow::Result<()> {
    initialize_tracing();
    let person = Arc::new(Person::default());
    let log: Log = Arc::default();

    let listener = PropertyChangedListener::new(&person);
    listener.register("name", |_person, _args| Err(anyhow::anyhow!("rejected")))?;
    listener.register_all(recorder(&log, "any"))?;

    let result = person.set_name("Ada");
    assert!(result.is_err());
    assert!(log.lock().is_empty(), "a failure stops the remaining handlers");
    Ok(())
}
