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
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use herald::prelude::*;

/// A dispatch target with one method of every shape.
#[derive(Debug, Default)]
pub struct Calculator {
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

#[dispatch_target]
impl Calculator {
    fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.log.lock().push("reset".to_string());
    }

    fn bump(&self) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn square(&self, value: i64) -> i64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        value * value
    }

    fn record(&self, entry: String) {
        self.log.lock().push(entry);
    }

    #[dispatch(name = "describe")]
    fn describe_number(&self, value: &i64) -> String {
        format!("number {}", value)
    }

    #[dispatch(name = "describe")]
    fn describe_anything(&self, _value: &dyn Any) -> String {
        "something".to_string()
    }

    #[dispatch(name = "poke")]
    fn poke_gently(&self, _value: &dyn Any) {}

    #[dispatch(name = "poke")]
    fn poke_firmly(&self, _value: &dyn Any) {}

    #[dispatch(skip)]
    fn log_ref(&self) -> &Mutex<Vec<String>> {
        &self.log
    }
}

impl Calculator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<String> {
        self.log_ref().lock().clone()
    }
}
