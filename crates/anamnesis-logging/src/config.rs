//! Logging presets for hosts embedding the memory engine
//!
//! The engine logs under the [`MEMORY_TARGET`] target: `debug` for every
//! creation, witness and anchor, `warn` for clamped reputations and content
//! that no longer matches its anchors. Presets differ mainly in how much of
//! that stream they keep and where it goes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tracing target of the memory engine's events.
pub const MEMORY_TARGET: &str = "anamnesis_memory";

/// Where log output goes and how much of it is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for everything without a target override; `RUST_LOG` wins
    /// over the whole filter when set
    pub default_level: String,

    /// Per-target levels, e.g. `anamnesis_memory = "debug"`
    pub targets: BTreeMap<String, String>,

    pub console: ConsoleConfig,

    /// JSONL file sink, off unless set
    pub file: Option<FileConfig>,

    pub jsonl: JsonlConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            targets: BTreeMap::new(),
            console: ConsoleConfig::default(),
            file: None,
            jsonl: JsonlConfig::default(),
        }
    }
}

impl LogConfig {
    /// Pretty console; engine events at `debug`, dependencies at `info`
    pub fn development() -> Self {
        Self {
            console: ConsoleConfig {
                enabled: true,
                pretty: true,
                ansi: true,
                level: None,
            },
            ..Default::default()
        }
        .with_target(MEMORY_TARGET, "debug")
    }

    /// JSONL files only, rotated daily, at `info`
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            console: ConsoleConfig::disabled(),
            file: Some(FileConfig::in_dir(log_dir)),
            ..Default::default()
        }
    }

    /// Keeps every attestation event: JSONL files with the engine at
    /// `debug` and everything else at `warn`
    pub fn audit(log_dir: PathBuf) -> Self {
        Self {
            default_level: "warn".to_string(),
            console: ConsoleConfig::disabled(),
            file: Some(FileConfig {
                prefix: "anamnesis-audit".to_string(),
                ..FileConfig::in_dir(log_dir)
            }),
            ..Default::default()
        }
        .with_target(MEMORY_TARGET, "debug")
    }

    /// Warnings only, plain JSONL on the console
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            ..Default::default()
        }
    }

    /// Override the level for one target
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.targets.insert(target.into(), level.into());
        self
    }

    /// `EnvFilter` directive string: the default level followed by the
    /// target overrides in name order
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![self.default_level.clone()];
        directives.extend(
            self.targets
                .iter()
                .map(|(target, level)| format!("{target}={level}")),
        );
        directives.join(",")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Human-readable instead of JSONL
    pub pretty: bool,
    pub ansi: bool,
    /// Extra filter applied to the console only
    pub level: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty: false,
            ansi: false,
            level: None,
        }
    }
}

impl ConsoleConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name stem; rolling files get a date suffix
    pub prefix: String,
    pub rotation: RotationStrategy,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self::in_dir(PathBuf::from("./logs"))
    }
}

impl FileConfig {
    /// Daily-rotated `anamnesis.*` files under `directory`
    pub fn in_dir(directory: PathBuf) -> Self {
        Self {
            directory,
            prefix: "anamnesis".to_string(),
            rotation: RotationStrategy::Daily,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One file, truncated on start
    Never,
}

/// Shape of JSONL records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Event fields (memory_id, score, ...) at the top level of each record
    pub flatten_events: bool,
    pub include_spans: bool,
    pub include_current_span: bool,
    /// Source file and line
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_current_span: true,
            include_location: true,
        }
    }
}
