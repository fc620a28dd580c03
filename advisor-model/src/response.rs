//! Answer extraction across provider response layouts.

use serde_json::Value;

use crate::config::ResponseShape;
use crate::error::{CompletionError, Result};

impl ResponseShape {
    /// Read the answer from `raw` if it has this shape.
    ///
    /// Only a string value counts; `null` content (e.g. a tool-call-only
    /// message) does not match.
    pub fn extract<'a>(&self, raw: &'a Value) -> Option<&'a str> {
        let pointer = match self {
            ResponseShape::Chat => "/choices/0/message/content",
            ResponseShape::Text => "/choices/0/text",
        };
        raw.pointer(pointer).and_then(Value::as_str)
    }
}

/// Return the answer text using the first shape in `priority` that matches.
///
/// # Errors
///
/// Returns [`CompletionError::UnexpectedResponseShape`] carrying the raw
/// body when no shape matches.
pub fn extract_text(raw: &Value, priority: &[ResponseShape]) -> Result<String> {
    priority
        .iter()
        .find_map(|shape| shape.extract(raw))
        .map(str::to_string)
        .ok_or_else(|| CompletionError::UnexpectedResponseShape { body: raw.to_string() })
}
