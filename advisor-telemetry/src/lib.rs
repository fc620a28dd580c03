//! # advisor-telemetry
//!
//! Logging for the schema advisor.
//!
//! - [`init_telemetry`] installs a `tracing-subscriber` fmt layer filtered by
//!   `RUST_LOG` (or `LOG_LEVEL`, default `info`), as text or JSON
//!   (`LOG_FORMAT=json`). Repeated calls are no-ops.
//! - [`capture_events`] and [`InMemoryEventLayer`] record events in memory so
//!   tests can assert on what was logged.
//!
//! ```rust,no_run
//! advisor_telemetry::init_telemetry("schema-advisor").expect("telemetry");
//! tracing::info!(corpus = "summaries/", "ready");
//! ```

mod init;
pub mod memory;

pub use init::{
    DEFAULT_DIRECTIVE, LogFormat, TelemetryConfig, TelemetryError, init_telemetry,
    init_with_config, init_with_storage, installed_service, resolve_directive,
};
pub use memory::{EventData, InMemoryEventLayer, SharedEventStorage, capture_events};

#[cfg(test)]
mod test_capture;
#[cfg(test)]
mod test_init;
