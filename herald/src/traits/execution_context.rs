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

use crate::common::HeraldError;
use crate::common::Job;

/// The host execution context a [`MessageTrigger`](crate::listener::MessageTrigger)
/// marshals its work onto, typically a UI thread.
pub trait ExecutionContext: Send + Sync {
    /// Returns `true` when called from the owner context.
    fn is_owner(&self) -> bool;

    /// Runs `job` on the owner context and blocks until it has finished.
    ///
    /// A job that panics re-raises the panic on the calling thread.
    fn run_on_owner(&self, job: Box<dyn FnOnce() + Send + 'static>) -> Result<(), HeraldError>;
}

/// Runs `job` on `context` when one is given and the caller is not its owner,
/// otherwise inline, and hands the job's output back to the caller.
pub(crate) fn on_owner<T, F>(context: Option<&dyn ExecutionContext>, job: F) -> Result<T, HeraldError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match context {
        Some(context) if !context.is_owner() => {
            let slot = std::sync::Arc::new(parking_lot::Mutex::new(None));
            let output = slot.clone();
            let marshalled: Job = Box::new(move || {
                *output.lock() = Some(job());
            });
            context.run_on_owner(marshalled)?;
            let value = slot.lock().take();
            value.ok_or_else(|| HeraldError::Context("the owner context did not run the job".into()))
        }
        _ => Ok(job()),
    }
}
