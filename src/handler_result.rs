// src/handler_result.rs
//! Result type returned by every registered handler.
//!
//! Mirrors the original `HandlerResult`: a handler either succeeds with a small
//! bag of named JSON values, or fails with a message. `resultId` and `resultJson`
//! (see `executor::GenericCommandExecutor::drain_pending_callbacks`) are read out
//! of the `data` map by well-known keys rather than being dedicated fields, so a
//! handler that doesn't need them pays nothing.

use serde_json::Value;
use std::collections::HashMap;

/// Well-known key a handler may set to populate `CallbackData::result_id`.
pub const RESULT_ID_KEY: &str = "resultId";
/// Well-known key a handler may set to populate `CallbackData::result_json`.
pub const RESULT_JSON_KEY: &str = "resultJson";

#[derive(Debug, Clone, Default)]
pub struct HandlerResult {
    data: HashMap<String, Value>,
    error: Option<String>,
}

impl HandlerResult {
    pub fn success(data: HashMap<String, Value>) -> Self {
        Self { data, error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { data: HashMap::new(), error: Some(message.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn result_id(&self) -> u64 {
        self.get(RESULT_ID_KEY).and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn result_json(&self) -> Option<String> {
        self.get(RESULT_JSON_KEY).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}
