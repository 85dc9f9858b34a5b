//! Debug event wire model

use std::backtrace::Backtrace;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single debug event, the atomic unit shipped to the backend
///
/// Wire field names are camelCase and optional fields are omitted when
/// absent, so a batch serializes to the compact form collection backends
/// expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEvent {
    /// Unique identifier for this event
    pub id: String,

    /// Session this event belongs to
    pub session_id: String,

    /// Kind of occurrence this event records
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// ISO-8601 timestamp
    pub timestamp: DateTime<Utc>,

    /// Display label (log events use the message or `function()` form)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Name of the traced or logging function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    /// Source file of the call site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Line of the call site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,

    /// Column of the call site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,

    /// Links an exit/error event to its enter event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<String>,

    /// Nesting level; manual traces use a flat model and record 0
    pub depth: u32,

    /// Elapsed milliseconds, set on exit/error events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    /// Sanitized return value of a traced operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Value>,

    /// Failure captured by a function_error event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    /// Sanitized call arguments, stored in compact JSON string form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,

    /// Free-form structured context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl DebugEvent {
    /// Create an event with a fresh id and the current timestamp
    pub fn new(session_id: impl Into<String>, event_type: EventType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            event_type,
            timestamp: Utc::now(),
            name: None,
            function_name: None,
            file_path: None,
            line_number: None,
            column_number: None,
            parent_event_id: None,
            depth: 0,
            duration: None,
            return_value: None,
            error: None,
            arguments: None,
            metadata: None,
        }
    }

    /// Set the display label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the function name
    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    /// Link this event to its enter event
    pub fn with_parent(mut self, parent_event_id: impl Into<String>) -> Self {
        self.parent_event_id = Some(parent_event_id.into());
        self
    }

    /// Set the elapsed time in milliseconds
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    /// Attach a sanitized return value
    pub fn with_return_value(mut self, value: Value) -> Self {
        self.return_value = Some(value);
        self
    }

    /// Attach failure details
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Attach sanitized arguments
    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = Some(arguments);
        self
    }

    /// Attach structured metadata
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach caller source-location fields
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.file_path = location.file_path;
        self.line_number = location.line_number;
        self.column_number = location.column_number;
        if location.function_name.is_some() {
            self.function_name = location.function_name;
        }
        self
    }
}

/// Failure details carried by a function_error event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error message
    pub message: String,

    /// Stack trace captured where the failure was observed
    pub stack: String,
}

impl ErrorInfo {
    /// Build from a message, capturing the stack at the call site
    pub fn capture(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: Backtrace::force_capture().to_string(),
        }
    }
}

/// Caller source location, resolved by the instrumentation call site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
}

impl SourceLocation {
    /// Location with file, line, and column
    pub fn new(file_path: impl Into<String>, line_number: u32, column_number: u32) -> Self {
        Self {
            file_path: Some(file_path.into()),
            line_number: Some(line_number),
            column_number: Some(column_number),
            function_name: None,
        }
    }

    /// Set the enclosing function name
    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }
}

/// Event types understood by the collection backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStart,
    SessionEnd,
    FunctionEnter,
    FunctionExit,
    FunctionError,
    HttpRequest,
    HttpResponse,
    ConsoleLog,
    Error,
}

impl EventType {
    /// Get the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionStart => "session_start",
            EventType::SessionEnd => "session_end",
            EventType::FunctionEnter => "function_enter",
            EventType::FunctionExit => "function_exit",
            EventType::FunctionError => "function_error",
            EventType::HttpRequest => "http_request",
            EventType::HttpResponse => "http_response",
            EventType::ConsoleLog => "console_log",
            EventType::Error => "error",
        }
    }

    /// Check if this is a session lifecycle event
    pub fn is_session_event(&self) -> bool {
        matches!(self, EventType::SessionStart | EventType::SessionEnd)
    }

    /// Check if this is a function boundary event
    pub fn is_function_event(&self) -> bool {
        matches!(
            self,
            EventType::FunctionEnter | EventType::FunctionExit | EventType::FunctionError
        )
    }

    /// Check if this is an HTTP activity event
    pub fn is_http_event(&self) -> bool {
        matches!(self, EventType::HttpRequest | EventType::HttpResponse)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session_start" => Ok(EventType::SessionStart),
            "session_end" => Ok(EventType::SessionEnd),
            "function_enter" => Ok(EventType::FunctionEnter),
            "function_exit" => Ok(EventType::FunctionExit),
            "function_error" => Ok(EventType::FunctionError),
            "http_request" => Ok(EventType::HttpRequest),
            "http_response" => Ok(EventType::HttpResponse),
            "console_log" => Ok(EventType::ConsoleLog),
            "error" => Ok(EventType::Error),
            _ => Err(format!("Unknown event type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_creation() {
        let event = DebugEvent::new("session-1", EventType::ConsoleLog);

        assert!(!event.id.is_empty());
        assert_eq!(event.session_id, "session-1");
        assert!(matches!(event.event_type, EventType::ConsoleLog));
        assert_eq!(event.depth, 0);
        assert!(event.parent_event_id.is_none());
    }

    #[test]
    fn test_fresh_ids_differ() {
        let first = DebugEvent::new("s", EventType::FunctionEnter);
        let second = DebugEvent::new("s", EventType::FunctionEnter);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_wire_field_names() {
        let event = DebugEvent::new("session-1", EventType::FunctionExit)
            .with_function_name("load_user")
            .with_parent("parent-42")
            .with_duration(17)
            .with_return_value(json!({"ok": true}));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "function_exit");
        assert_eq!(value["sessionId"], "session-1");
        assert_eq!(value["functionName"], "load_user");
        assert_eq!(value["parentEventId"], "parent-42");
        assert_eq!(value["duration"], 17);
        assert_eq!(value["returnValue"]["ok"], true);
        assert_eq!(value["depth"], 0);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let event = DebugEvent::new("session-1", EventType::ConsoleLog);
        let value = serde_json::to_value(&event).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("parentEventId"));
        assert!(!object.contains_key("returnValue"));
        assert!(!object.contains_key("error"));
        assert!(!object.contains_key("functionName"));
        assert!(!object.contains_key("filePath"));
    }

    #[test]
    fn test_location_fields() {
        let location = SourceLocation::new("src/checkout.rs", 42, 8).with_function_name("charge");
        let event = DebugEvent::new("session-1", EventType::ConsoleLog).with_location(location);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["filePath"], "src/checkout.rs");
        assert_eq!(value["lineNumber"], 42);
        assert_eq!(value["columnNumber"], 8);
        assert_eq!(value["functionName"], "charge");
    }

    #[test]
    fn test_event_round_trip() {
        let event = DebugEvent::new("session-1", EventType::FunctionError)
            .with_function_name("save")
            .with_parent("enter-1")
            .with_duration(3)
            .with_error(ErrorInfo {
                message: "disk full".to_string(),
                stack: String::new(),
            });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: DebugEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, event.id);
        assert!(matches!(parsed.event_type, EventType::FunctionError));
        assert_eq!(parsed.parent_event_id.as_deref(), Some("enter-1"));
        assert_eq!(parsed.error.unwrap().message, "disk full");
    }

    #[test]
    fn test_error_info_capture() {
        let info = ErrorInfo::capture("boom");
        assert_eq!(info.message, "boom");
        assert!(!info.stack.is_empty());
    }

    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(EventType::SessionStart.as_str(), "session_start");
        assert_eq!(EventType::FunctionEnter.as_str(), "function_enter");
        assert_eq!(EventType::ConsoleLog.as_str(), "console_log");
        assert_eq!(EventType::HttpRequest.as_str(), "http_request");
        assert_eq!(EventType::Error.as_str(), "error");

        assert_eq!(
            serde_json::to_value(EventType::FunctionError).unwrap(),
            json!("function_error")
        );
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(
            "function_enter".parse::<EventType>().unwrap(),
            EventType::FunctionEnter
        );
        assert_eq!(
            "session_end".parse::<EventType>().unwrap(),
            EventType::SessionEnd
        );
        assert!("unknown_event".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_type_categories() {
        assert!(EventType::SessionStart.is_session_event());
        assert!(EventType::FunctionError.is_function_event());
        assert!(EventType::HttpResponse.is_http_event());
        assert!(!EventType::ConsoleLog.is_function_event());
    }
}
