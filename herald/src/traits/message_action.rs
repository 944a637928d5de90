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

use crate::common::HandlerResult;
use crate::traits::HeraldMessage;

/// A reusable reaction to a delivered message, registered on a
/// [`MessageTrigger`](crate::listener::MessageTrigger).
pub trait MessageAction: Send + Sync + 'static {
    /// Runs the action against the frozen copy of a published message.
    fn invoke(&self, message: &dyn HeraldMessage) -> HandlerResult;
}

impl<F> MessageAction for F
where
    F: Fn(&dyn HeraldMessage) -> HandlerResult + Send + Sync + 'static,
{
    fn invoke(&self, message: &dyn HeraldMessage) -> HandlerResult {
        self(message)
    }
}
