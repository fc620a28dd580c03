use crate::memory::{EventData, capture_events};
use tracing::info_span;

#[test]
fn test_captures_message_level_and_fields() {
    let (storage, _guard) = capture_events();

    tracing::warn!(attempt = 2u32, endpoint = "chat", retry = true, "transient failure, backing off");

    let events = storage.with_message("transient failure, backing off");
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event.level, "WARN");
    assert_eq!(event.field("attempt"), Some(&serde_json::json!(2)));
    assert_eq!(event.field("endpoint"), Some(&serde_json::json!("chat")));
    assert_eq!(event.field("retry"), Some(&serde_json::json!(true)));
    assert!(event.field("message").is_none());
    assert!(event.timestamp > 0);
}

#[test]
fn test_records_enclosing_span() {
    let (storage, _guard) = capture_events();

    let span = info_span!("advisor.ask", question = "revenue?");
    span.in_scope(|| tracing::info!("retrieved summary"));
    tracing::info!("outside");

    let inside = storage.with_message("retrieved summary");
    assert_eq!(inside[0].span.as_deref(), Some("advisor.ask"));
    assert!(storage.with_message("outside")[0].span.is_none());
}

#[test]
fn test_display_fields_and_level_queries() {
    let (storage, _guard) = capture_events();

    let error = std::io::Error::other("connection reset");
    tracing::error!(error = %error, "request failed");
    tracing::debug!(delay = ?std::time::Duration::from_millis(500), "sleeping");

    assert_eq!(storage.len(), 2);
    assert_eq!(storage.at_level("error").len(), 1);
    assert_eq!(storage.at_level("ERROR")[0].field("error"), Some(&serde_json::json!("connection reset")));
    assert_eq!(storage.at_level("debug")[0].field("delay"), Some(&serde_json::json!("500ms")));

    storage.clear();
    assert!(storage.is_empty());
}

#[test]
fn test_capture_is_scoped_to_guard() {
    let (storage, guard) = capture_events();
    tracing::info!("kept");
    drop(guard);
    tracing::info!("dropped");

    let messages: Vec<_> = storage.events().into_iter().filter_map(|e: EventData| e.message).collect();
    assert_eq!(messages, vec!["kept".to_string()]);
}

#[test]
fn test_event_serialization_skips_empty_options() {
    let (storage, _guard) = capture_events();
    tracing::info!(count = 3i64, "loaded");

    let json = serde_json::to_value(&storage.events()[0]).unwrap();
    assert_eq!(json["level"], "INFO");
    assert_eq!(json["message"], "loaded");
    assert_eq!(json["fields"]["count"], 3);
    assert!(json.get("span").is_none());
}
