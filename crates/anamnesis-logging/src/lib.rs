//! Structured logging setup for Anamnesis
//!
//! The memory engine only emits `tracing` events under [`MEMORY_TARGET`];
//! this crate decides which of them are kept and where they go.
//!
//! - **JSONL console** by default, pretty output in development
//! - **Audit files**: every witness, anchor and supersession kept as JSONL
//!   via [`LogConfig::audit`]
//! - **Per-target levels** layered over the default level
//!
//! # Quick Start
//!
//! ```no_run
//! use anamnesis_logging::{AnamnesisSubscriberBuilder, LogConfig};
//!
//! // Engine events at debug, everything else at warn
//! let _guard = AnamnesisSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .with_level("warn")
//!     .init();
//! ```

pub mod config;

pub use config::{
    ConsoleConfig, FileConfig, JsonlConfig, LogConfig, MEMORY_TARGET, RotationStrategy,
};

use std::fs::{self, File};
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("global subscriber already set: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

type Base = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync>;

/// Builder for configuring and initializing the logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::development()`
/// for human-readable pretty output during development.
pub struct AnamnesisSubscriberBuilder {
    config: LogConfig,
}

impl AnamnesisSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the level for targets without an override
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Set the level of one target, e.g. [`MEMORY_TARGET`]
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.config = self.config.with_target(target, level);
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns the file writer guard, if file output is configured; it must
    /// be kept alive for as long as logs should be flushed.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LogError> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(self.config.filter_directives())?,
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if self.config.console.enabled {
            layers.push(console_layer(&self.config)?);
        }
        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            guard = Some(file_guard);
            layers.push(jsonl_layer(&self.config.jsonl, writer));
        }

        Registry::default()
            .with(env_filter)
            .with(layers)
            .try_init()?;
        Ok(guard)
    }

    /// Initialize the subscriber globally
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been set or the
    /// configuration cannot be applied.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => panic!("failed to initialize logging: {e}"),
        }
    }
}

impl Default for AnamnesisSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn console_layer(config: &LogConfig) -> Result<BoxedLayer, LogError> {
    let layer: BoxedLayer = if config.console.pretty {
        tracing_subscriber::fmt::layer()
            .with_ansi(config.console.ansi)
            .with_target(true)
            .boxed()
    } else {
        let jsonl = &config.jsonl;
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(jsonl.include_current_span)
            .with_span_list(jsonl.include_spans)
            .flatten_event(jsonl.flatten_events)
            .with_file(jsonl.include_location)
            .with_line_number(jsonl.include_location)
            .boxed()
    };

    match &config.console.level {
        Some(level) => Ok(layer.with_filter(EnvFilter::try_new(level)?).boxed()),
        None => Ok(layer),
    }
}

fn jsonl_layer(jsonl: &JsonlConfig, writer: NonBlocking) -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(jsonl.include_current_span)
        .with_span_list(jsonl.include_spans)
        .flatten_event(jsonl.flatten_events)
        .with_file(jsonl.include_location)
        .with_line_number(jsonl.include_location)
        .with_writer(writer)
        .boxed()
}

/// Non-blocking writer for file output. `Never` truncates a single file;
/// the others append to rolling files.
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LogError> {
    fs::create_dir_all(&config.directory)?;
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };
    let appender = RollingFileAppender::new(rotation, &config.directory, &config.prefix);
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging with default settings (JSONL to console)
pub fn init_default() {
    AnamnesisSubscriberBuilder::new().init();
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() {
    AnamnesisSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init();
}

/// Initialize audit logging into `log_dir`; keep the guard alive
pub fn init_audit(log_dir: impl Into<PathBuf>) -> Result<Option<WorkerGuard>, LogError> {
    AnamnesisSubscriberBuilder::new()
        .with_config(LogConfig::audit(log_dir.into()))
        .try_init()
}

/// Initialize logging for testing (warnings only)
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_testing() {
    let _ = AnamnesisSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
