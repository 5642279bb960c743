//! Engine configuration plus shared JSON load/save helpers.
//!
//! Loading falls back to defaults on a missing or unparsable file; the
//! engine always comes up in a working state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Tunable engine knobs. Defaults match the observed production behavior;
/// most deployments never override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cooldown between per-sample facial analyses, in milliseconds.
    pub analysis_cooldown_ms: u64,
    /// Conversation history cap: system prompt + the most recent messages.
    pub max_history_messages: usize,
    /// Pattern similarity a knowledge entry must exceed to match.
    pub similarity_threshold: f32,
    /// Sampling temperature passed to the completion provider.
    pub temperature: f32,
    /// Token budget per reply.
    pub max_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analysis_cooldown_ms: 1000,
            max_history_messages: 10,
            similarity_threshold: 0.7,
            temperature: 0.7,
            max_tokens: 150,
        }
    }
}

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                debug!("[{}] loaded config from {}", label, path.display());
                config
            }
            Err(e) => {
                warn!(
                    "[{}] failed to parse config {}: {} — using defaults",
                    label,
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => {
            debug!(
                "[{}] no config file at {} — using defaults",
                label,
                path.display()
            );
            T::default()
        }
    }
}

/// Generic save for any Serde config type.
pub fn save_json_config<T: Serialize>(path: &Path, config: &T, label: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    debug!("[{}] saved config to {}", label, path.display());
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────
