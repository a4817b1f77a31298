//! JSON serialization of finished spans.
//!
//! Each span becomes a self-contained object carrying the resource attributes,
//! so a single line of the span file can be read without its neighbours. Field
//! names and value encodings follow the OTLP JSON mapping.

use opentelemetry::trace::{SpanId, SpanKind, Status};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::resource::Resource;
use serde_json::{json, Map, Value as JsonValue};
use std::time::{SystemTime, UNIX_EPOCH};

use super::init::SERVICE_NAME;

/// Turns [`SpanData`] into one JSON object per span.
#[derive(Debug, Clone)]
pub struct SpanFormatter {
    /// Resource attributes flattened to `key → value`.
    resource: Map<String, JsonValue>,
}

impl SpanFormatter {
    pub fn new(resource: &Resource) -> Self {
        let resource = resource
            .iter()
            .map(|(key, value)| (key.to_string(), Self::format_value(value)))
            .collect();
        Self { resource }
    }

    /// Formats a single span.
    ///
    /// ```json
    /// {
    ///   "resource": {"service.name": "bolsas-queue"},
    ///   "scope": "bolsas-queue",
    ///   "traceId": "4bf92f3577b34da6a3ce929d0e0e4736",
    ///   "spanId": "00f067aa0ba902b7",
    ///   "parentSpanId": "",
    ///   "name": "handle_event",
    ///   "kind": 1,
    ///   "startTimeUnixNano": "1729000000000000000",
    ///   "endTimeUnixNano": "1729000000000450000",
    ///   "attributes": {"event": "NextPage"},
    ///   "events": [],
    ///   "status": {"code": 0, "message": ""}
    /// }
    /// ```
    pub fn format_span(&self, span: &SpanData) -> JsonValue {
        let (status_code, status_message) = Self::format_status(&span.status);
        let parent_span_id = if span.parent_span_id == SpanId::INVALID {
            String::new()
        } else {
            format!("{:016x}", span.parent_span_id)
        };

        json!({
            "resource": self.resource,
            "scope": SERVICE_NAME,
            "traceId": format!("{:032x}", span.span_context.trace_id()),
            "spanId": format!("{:016x}", span.span_context.span_id()),
            "parentSpanId": parent_span_id,
            "name": span.name,
            "kind": Self::kind_code(&span.span_kind),
            "startTimeUnixNano": Self::unix_nanos(span.start_time),
            "endTimeUnixNano": Self::unix_nanos(span.end_time),
            "attributes": Self::format_attributes(&span.attributes),
            "events": span.events.iter().map(|event| json!({
                "timeUnixNano": Self::unix_nanos(event.timestamp),
                "name": event.name,
                "attributes": Self::format_attributes(&event.attributes),
            })).collect::<Vec<_>>(),
            "status": {
                "code": status_code,
                "message": status_message,
            },
        })
    }

    const fn kind_code(kind: &SpanKind) -> u8 {
        match kind {
            SpanKind::Internal => 1,
            SpanKind::Server => 2,
            SpanKind::Client => 3,
            SpanKind::Producer => 4,
            SpanKind::Consumer => 5,
        }
    }

    fn unix_nanos(time: SystemTime) -> String {
        time.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos().to_string()
    }

    fn format_attributes(attributes: &[KeyValue]) -> Map<String, JsonValue> {
        attributes
            .iter()
            .map(|kv| (kv.key.to_string(), Self::format_value(&kv.value)))
            .collect()
    }

    /// Integers are strings so 64-bit ids survive JavaScript readers.
    fn format_value(value: &Value) -> JsonValue {
        match value {
            Value::Bool(b) => json!(b),
            Value::I64(i) => json!(i.to_string()),
            Value::F64(f) => json!(f),
            Value::String(s) => json!(s.as_str()),
            Value::Array(_) => json!(value.to_string()),
        }
    }

    fn format_status(status: &Status) -> (u8, String) {
        match status {
            Status::Unset => (0, String::new()),
            Status::Ok => (1, String::new()),
            Status::Error { description } => (2, description.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_attributes_flatten_to_a_map() {
        let resource = Resource::new(vec![KeyValue::new("service.name", "bolsas-queue")]);
        let formatter = SpanFormatter::new(&resource);
        assert_eq!(formatter.resource["service.name"], json!("bolsas-queue"));
    }

    #[test]
    fn values_follow_json_types() {
        assert_eq!(SpanFormatter::format_value(&Value::I64(734)), json!("734"));
        assert_eq!(SpanFormatter::format_value(&Value::Bool(true)), json!(true));
        assert_eq!(SpanFormatter::format_value(&Value::from("Pediatría")), json!("Pediatría"));
        assert_eq!(SpanFormatter::format_status(&Status::error("timeout")), (2, "timeout".to_string()));
    }
}
