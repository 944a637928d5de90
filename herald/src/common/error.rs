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

/// Errors raised by Herald's subscriptions, listeners, broker and dispatch cache.
#[derive(Debug)]
pub enum HeraldError {
    /// A precondition on an argument was violated.
    InvalidArgument(String),
    /// The named component was used after it had been disposed.
    Disposed(&'static str),
    /// The named component was attached a second time.
    AlreadyInitialized(&'static str),
    /// No method on the target matches the requested name and shape.
    MethodNotFound {
        type_name: &'static str,
        method_name: String,
        shape: String,
    },
    /// More than one method matches and none is a better fit than the others.
    AmbiguousMethod {
        type_name: &'static str,
        method_name: String,
        candidates: Vec<String>,
    },
    /// A target or argument did not have the runtime type a method expects.
    TargetMismatch {
        expected: &'static str,
        found: String,
    },
    /// A field of a frozen message was written to.
    Frozen(&'static str),
    /// A registered callback failed.
    Handler(anyhow::Error),
    /// The owner execution context could not run a job.
    Context(String),
    /// A background publish did not complete.
    Join(String),
    /// Configuration could not be parsed.
    Config(String),
}

impl fmt::Display for HeraldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeraldError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            HeraldError::Disposed(component) => write!(f, "{} has been disposed", component),
            HeraldError::AlreadyInitialized(component) => {
                write!(f, "{} is already initialized", component)
            }
            HeraldError::MethodNotFound {
                type_name,
                method_name,
                shape,
            } => write!(
                f,
                "No method `{}` with {} was found on type `{}`",
                method_name, shape, type_name
            ),
            HeraldError::AmbiguousMethod {
                type_name,
                method_name,
                candidates,
            } => write!(
                f,
                "Method `{}` on type `{}` is ambiguous between: {}",
                method_name,
                type_name,
                candidates.join(", ")
            ),
            HeraldError::TargetMismatch { expected, found } => {
                write!(f, "Expected a value of type `{}`, found `{}`", expected, found)
            }
            HeraldError::Frozen(field) => {
                write!(f, "Cannot set `{}` on a frozen message", field)
            }
            HeraldError::Handler(err) => write!(f, "Handler failed: {}", err),
            HeraldError::Context(msg) => write!(f, "Execution context error: {}", msg),
            HeraldError::Join(msg) => write!(f, "Background publish failed: {}", msg),
            HeraldError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for HeraldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeraldError::Handler(err) => Some(&**err),
            _ => None,
        }
    }
}

/// Wraps a failed callback so it can travel back to the publisher.
impl From<anyhow::Error> for HeraldError {
    fn from(err: anyhow::Error) -> Self {
        HeraldError::Handler(err)
    }
}

impl From<tokio::task::JoinError> for HeraldError {
    fn from(err: tokio::task::JoinError) -> Self {
        HeraldError::Join(err.to_string())
    }
}

impl From<toml::de::Error> for HeraldError {
    fn from(err: toml::de::Error) -> Self {
        HeraldError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_not_found_names_type_method_and_shape() {
        let err = HeraldError::MethodNotFound {
            type_name: "Counter",
            method_name: "bump".to_string(),
            shape: "no parameters".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("Counter"));
        assert!(text.contains("bump"));
        assert!(text.contains("no parameters"));
    }

    #[test]
    fn handler_error_exposes_its_source() {
        let err = HeraldError::from(anyhow::anyhow!("boom"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
    }
}
