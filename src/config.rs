// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Server configuration read from a TOML file. Every section and field is optional.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8989
//!
//! [sessions]
//! ttl_secs = 3600
//! evict_interval_secs = 60
//! registry_scope = "per_session"
//! style = "annotated"
//!
//! [diff]
//! distance = "euclidean_support"
//! options = { support = true, jobs = 4 }
//!
//! [actions]
//! builtin = ["change_style", "toggle_highlight", "delete_node"]
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actions::{register_builtins, ActionRegistry, BuiltinAction};
use crate::diff::DiffRequest;
use crate::logging::LogConfig;
use crate::model::{SessionDefaults, StylePreset};
use crate::render::{RenderSettings, SvgRenderer};
use crate::service::{CompareService, RegistryScope};
use crate::store::SessionStore;

pub const DEFAULT_PORT: u16 = 8989;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_owned(), port: DEFAULT_PORT }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Idle time after which a session is dropped. Unset keeps sessions for the process lifetime.
    pub ttl_secs: Option<u64>,
    pub evict_interval_secs: u64,
    pub registry_scope: RegistryScope,
    pub style: StylePreset,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            evict_interval_secs: 60,
            registry_scope: RegistryScope::default(),
            style: StylePreset::default(),
        }
    }
}

impl SessionsConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Built-in actions registered in the default registry, in menu order.
    pub builtin: Vec<BuiltinAction>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self { builtin: BuiltinAction::ALL.to_vec() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sessions: SessionsConfig,
    pub diff: DiffRequest,
    pub render: RenderSettings,
    pub actions: ActionsConfig,
    pub logging: LogConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text, path)
    }

    /// The default action registry with the configured built-ins.
    pub fn action_registry(&self) -> Arc<ActionRegistry> {
        let registry = ActionRegistry::new();
        register_builtins(&registry, &self.actions.builtin);
        Arc::new(registry)
    }

    pub fn build_service(&self) -> CompareService {
        let defaults = SessionDefaults::new(self.action_registry()).with_style(self.sessions.style);
        CompareService::new(defaults)
            .with_store(SessionStore::new(self.sessions.ttl()))
            .with_scope(self.sessions.registry_scope)
            .with_diff_request(self.diff.clone())
            .with_renderer(Arc::new(SvgRenderer::new(self.render)))
    }
}
