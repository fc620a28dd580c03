use crate::init::{LogFormat, TelemetryConfig, TelemetryError, resolve_directive};
use crate::memory::SharedEventStorage;

#[test]
fn test_directive_precedence() {
    assert_eq!(resolve_directive(Some("advisor_model=debug"), Some("warn")), "advisor_model=debug");
    assert_eq!(resolve_directive(None, Some("WARN")), "warn");
    assert_eq!(resolve_directive(Some("  "), Some("error")), "error");
    assert_eq!(resolve_directive(None, None), "info");
}

#[test]
fn test_log_format_parsing() {
    assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert!(matches!("xml".parse::<LogFormat>(), Err(TelemetryError::Format(f)) if f == "xml"));
}

#[test]
fn test_invalid_directive_is_rejected_before_install() {
    let config = TelemetryConfig::new("test-service").with_directive("advisor_model=[");
    let result = crate::init_with_config(&config);
    // A previous test may already own the global subscriber.
    if crate::installed_service().is_none() {
        assert!(matches!(result, Err(TelemetryError::Filter { .. })));
    }
}

#[tokio::test]
async fn test_init_is_idempotent_and_captures() {
    let storage = SharedEventStorage::new();
    let config = TelemetryConfig::new("test-service").with_directive("debug");

    crate::init_with_storage(&config, storage.clone()).unwrap();
    crate::init_with_storage(&config, SharedEventStorage::new()).unwrap();
    crate::init_with_config(&config.clone().with_format(LogFormat::Json)).unwrap();

    assert_eq!(crate::installed_service(), Some("test-service"));

    tracing::info!(marker = "idempotent-init", "global event");
    assert_eq!(storage.with_message("global event").len(), 1);
}
