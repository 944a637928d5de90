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
use std::fmt::Debug;

use static_assertions::assert_impl_all;

use crate::common::HeraldError;
use crate::traits::HeraldMessage;

/// A keyed message carrying a payload value.
///
/// Both the key and the value become read-only once the message is frozen,
/// which the [`Messenger`](crate::common::Messenger) does at publish time.
#[derive(Clone, Debug, Default)]
pub struct Message<V = ()> {
    key: Option<String>,
    value: V,
    frozen: bool,
}

assert_impl_all!(Message<u32>: HeraldMessage, Send, Sync);

impl<V> Message<V> {
    /// An unkeyed message, delivered to catch-all handlers only.
    pub fn new(value: V) -> Self {
        Self {
            key: None,
            value,
            frozen: false,
        }
    }

    /// A message delivered to handlers registered under `key` and to
    /// catch-all handlers. An empty key behaves like no key.
    pub fn with_key(key: impl Into<String>, value: V) -> Self {
        Self {
            key: normalize_key(key.into()),
            value,
            frozen: false,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn set_key(&mut self, key: impl Into<String>) -> Result<(), HeraldError> {
        self.ensure_thawed("key")?;
        self.key = normalize_key(key.into());
        Ok(())
    }

    pub fn set_value(&mut self, value: V) -> Result<(), HeraldError> {
        self.ensure_thawed("value")?;
        self.value = value;
        Ok(())
    }

    fn ensure_thawed(&self, field: &'static str) -> Result<(), HeraldError> {
        if self.frozen {
            Err(HeraldError::Frozen(field))
        } else {
            Ok(())
        }
    }
}

impl<V> HeraldMessage for Message<V>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    fn message_key(&self) -> Option<&str> {
        self.key()
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn normalize_key(key: String) -> Option<String> {
    Some(key).filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_message_rejects_writes() {
        let mut message = Message::with_key("Greeting", "hello".to_string());
        message.set_value("hi".to_string()).unwrap();
        message.freeze();

        assert!(matches!(
            message.set_value("bye".to_string()),
            Err(HeraldError::Frozen("value"))
        ));
        assert!(matches!(message.set_key("Other"), Err(HeraldError::Frozen("key"))));
        assert_eq!(message.value(), "hi");
        assert_eq!(message.message_key(), Some("Greeting"));
    }

    #[test]
    fn empty_key_is_unkeyed() {
        let message = Message::with_key("", 1u8);
        assert_eq!(message.message_key(), None);
    }
}
