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
use std::fmt;

use parking_lot::Mutex;
use tracing::*;

use crate::traits::Disposable;

/// Runs a release closure the first time it is disposed or dropped.
pub struct DisposeAction {
    action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl DisposeAction {
    pub fn new<F: FnOnce() + Send + 'static>(action: F) -> Self {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }
}

impl fmt::Debug for DisposeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeAction")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Disposable for DisposeAction {
    fn dispose(&self) {
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }

    fn is_disposed(&self) -> bool {
        self.action.lock().is_none()
    }
}

impl Drop for DisposeAction {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Disposes a group of resources together.
///
/// Members are disposed in the order they were added, each exactly once. A
/// member added after the bag has been disposed is disposed on the spot.
#[derive(Default)]
pub struct DisposableBag {
    state: Mutex<BagState>,
}

#[derive(Default)]
struct BagState {
    items: Vec<Box<dyn Disposable + Send + Sync>>,
    disposed: bool,
}

impl fmt::Debug for DisposableBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DisposableBag")
            .field("items", &state.items.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

impl DisposableBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<D: Disposable + Send + Sync + 'static>(&self, item: D) {
        let mut state = self.state.lock();
        if state.disposed {
            drop(state);
            trace!("bag already disposed, disposing new member");
            item.dispose();
            return;
        }
        state.items.push(Box::new(item));
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Disposable for DisposableBag {
    fn dispose(&self) {
        let items = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.items)
        };
        trace!(members = items.len(), "disposing bag");
        for item in &items {
            item.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }
}

impl Drop for DisposableBag {
    fn drop(&mut self) {
        self.dispose();
    }
}
