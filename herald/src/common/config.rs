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

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::common::HeraldError;

/// Configuration for Herald
///
/// Loaded from `config.toml` in the XDG configuration directory for
/// `herald`. Any section or key left out takes its default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    /// Dispatch cache configuration
    pub dispatch: DispatchConfig,
    /// Owner execution context configuration
    pub context: ContextConfig,
    /// Behavioral configuration switches
    pub behavior: BehaviorConfig,
}

/// Dispatch cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Compile thunks on a background thread; when `false` they are compiled
    /// on the calling thread before the call returns.
    pub background_compilation: bool,
    /// Name given to background compiler threads
    pub compiler_thread_name: String,
}

/// Owner execution context configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Name given to the thread spawned by `OwnerThread::spawn`
    pub owner_thread_name: String,
}

/// Behavioral configuration switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Include Debug-formatted message payloads in publish trace events
    pub trace_payloads: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            background_compilation: true,
            compiler_thread_name: "herald-thunk-compiler".to_string(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            owner_thread_name: "herald-owner".to_string(),
        }
    }
}

impl HeraldConfig {
    /// Parses a configuration document.
    pub fn from_toml_str(document: &str) -> Result<Self, HeraldError> {
        Ok(toml::from_str::<Self>(document)?)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `herald/config.toml` under `$XDG_CONFIG_HOME` (falling back
    /// to `~/.config`) and the XDG system directories. A missing file yields
    /// the defaults. A file that cannot be read or parsed is logged and the
    /// defaults are used.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("herald") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| HeraldError::Config(e.to_string()))
            .and_then(|document| Self::from_toml_str(&document));
        match parsed {
            Ok(config) => {
                info!("Successfully loaded configuration");
                config
            }
            Err(e) => {
                error!("Failed to load configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: HeraldConfig = HeraldConfig::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = HeraldConfig::from_toml_str(
            r#"
            [dispatch]
            background_compilation = false
            "#,
        )
        .unwrap();

        assert!(!config.dispatch.background_compilation);
        assert_eq!(config.dispatch.compiler_thread_name, "herald-thunk-compiler");
        assert_eq!(config.context, ContextConfig::default());
        assert!(!config.behavior.trace_payloads);
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let parsed = HeraldConfig::from_toml_str("[dispatch]\nbackground_compilation = \"sometimes\"");
        assert!(matches!(parsed, Err(HeraldError::Config(_))));
    }
}
