//! Global subscriber installation.

use std::str::FromStr;
use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::memory::{InMemoryEventLayer, SharedEventStorage};

/// Directive used when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const DEFAULT_DIRECTIVE: &str = "info";

static INSTALLED: OnceLock<String> = OnceLock::new();

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directive}': {message}")]
    Filter { directive: String, message: String },

    #[error("unknown log format '{0}' (expected 'text' or 'json')")]
    Format(String),

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::Format(other.to_string())),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service: String,
    /// `EnvFilter` directive, e.g. `info` or `advisor_model=debug,warn`.
    pub directive: String,
    pub format: LogFormat,
}

impl TelemetryConfig {
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into(), directive: DEFAULT_DIRECTIVE.to_string(), format: LogFormat::Text }
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = directive.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Settings from `RUST_LOG`, `LOG_LEVEL` and `LOG_FORMAT`.
    pub fn from_env(service: impl Into<String>) -> Result<Self, TelemetryError> {
        let rust_log = std::env::var("RUST_LOG").ok();
        let log_level = std::env::var("LOG_LEVEL").ok();
        let format = std::env::var("LOG_FORMAT").ok().unwrap_or_default().parse()?;

        Ok(Self::new(service)
            .with_directive(resolve_directive(rust_log.as_deref(), log_level.as_deref()))
            .with_format(format))
    }
}

/// Pick the filter directive: `RUST_LOG` first, then `LOG_LEVEL`, then
/// [`DEFAULT_DIRECTIVE`]. Blank values count as unset.
pub fn resolve_directive(rust_log: Option<&str>, log_level: Option<&str>) -> String {
    [rust_log, log_level]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter {
        directive: directive.to_string(),
        message: e.to_string(),
    })
}

/// Install the global subscriber from the environment.
///
/// Later calls are no-ops.
pub fn init_telemetry(service: &str) -> Result<(), TelemetryError> {
    init_with_config(&TelemetryConfig::from_env(service)?)
}

/// Install the global subscriber with explicit settings.
///
/// Only the first successful call in a process installs anything.
pub fn init_with_config(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    install(config, None)
}

/// Install the global subscriber and also record every event into `storage`.
pub fn init_with_storage(
    config: &TelemetryConfig,
    storage: SharedEventStorage,
) -> Result<(), TelemetryError> {
    install(config, Some(storage))
}

/// The service name of the installed subscriber, if any.
pub fn installed_service() -> Option<&'static str> {
    INSTALLED.get().map(String::as_str)
}

fn install(config: &TelemetryConfig, storage: Option<SharedEventStorage>) -> Result<(), TelemetryError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let filter = build_filter(&config.directive)?;
    let capture = storage.map(InMemoryEventLayer::new);

    let result = match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(capture)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .with(capture)
            .try_init(),
    };

    match result {
        Ok(()) => {
            let _ = INSTALLED.set(config.service.clone());
            tracing::debug!(service = %config.service, directive = %config.directive, "telemetry initialized");
            Ok(())
        }
        // Another subscriber got there first; keep it.
        Err(_) if INSTALLED.get().is_some() => Ok(()),
        Err(e) => Err(TelemetryError::Install(e.to_string())),
    }
}
