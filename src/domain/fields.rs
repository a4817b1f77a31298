//! Field lookup over loosely-typed backend JSON.
//!
//! The solicitud API has shipped the same logical field under several names over
//! its lifetime (`idSolicitud`, `id_solicitud`, `id`, ...) and sends numbers as
//! either JSON numbers or strings. Every key list lives next to the type that
//! owns it; this module only knows how to pick the first usable value. Nothing
//! outside `domain` looks at raw JSON.

use serde_json::{Map, Value};

/// Returns the first non-null value among `keys`.
fn pick<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// Reads a text field, accepting numbers and booleans as text.
///
/// Blank strings count as absent so they fall through to the display fallback.
pub fn pick_str(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
}

/// Reads an integer field given as a number or a numeric string.
pub fn pick_i64(object: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(|value| match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
}

/// Reads a non-negative count.
pub fn pick_u64(object: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    pick_i64(object, keys).and_then(|n| u64::try_from(n).ok())
}

/// Reads a nested array.
pub fn pick_array<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
    pick(object, keys).and_then(Value::as_array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn first_present_spelling_wins() {
        let map = object(json!({"id_solicitud": 7, "id": 9}));
        assert_eq!(pick_i64(&map, &["idSolicitud", "id_solicitud", "id"]), Some(7));
    }

    #[test]
    fn numbers_and_strings_are_interchangeable() {
        let map = object(json!({"edad": "42", "dni": 12345678}));
        assert_eq!(pick_i64(&map, &["edad"]), Some(42));
        assert_eq!(pick_str(&map, &["dni"]).as_deref(), Some("12345678"));
    }

    #[test]
    fn blank_and_null_values_fall_through() {
        let map = object(json!({"telefono": "  ", "telefonoPrincipal": null, "telefono_principal": "999"}));
        assert_eq!(
            pick_str(&map, &["telefono", "telefonoPrincipal", "telefono_principal"]).as_deref(),
            Some("999")
        );
    }

    #[test]
    fn negative_counts_are_rejected() {
        let map = object(json!({"count": -3}));
        assert_eq!(pick_u64(&map, &["count"]), None);
    }
}
