//! Extraction of display text from chatbot responses.
//!
//! The chatbot does not commit to a response shape.  Depending on how it is
//! deployed it answers with a bare string, an object keyed by one of several
//! names, or an envelope whose `body` or `data` field holds the real answer,
//! sometimes JSON-encoded as a string.  [`extract`] tries each reading in a
//! fixed order and never fails.

use serde_json::{Map, Value};

use crate::observability::{CHAT_FALLBACKS, CHAT_PARSE_FAILURES};

/// Shown when no reading of a response yields text.
pub const FALLBACK_MESSAGE: &str = "Sorry, I can't process this request right now.";

/// Keys probed for the answer text, in priority order.
pub const ANSWER_KEYS: [&str; 5] = ["answer", "message", "response", "reply", "text"];

/// The contents of an envelope field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wrapped<'a> {
    /// A JSON document encoded as a string.
    Encoded(&'a str),
    /// An object embedded directly.
    Nested(&'a Map<String, Value>),
}

impl<'a> Wrapped<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(raw) if !raw.is_empty() => Some(Wrapped::Encoded(raw)),
            Value::Object(map) => Some(Wrapped::Nested(map)),
            _ => None,
        }
    }

    fn resolve(&self, field: &str) -> Option<String> {
        match self {
            Wrapped::Nested(map) => probe_keys(map),
            Wrapped::Encoded(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => probe_keys(&map),
                Ok(Value::String(text)) => non_empty(&text),
                Ok(_) => None,
                Err(err) => {
                    CHAT_PARSE_FAILURES.click();
                    tracing::warn!(field, error = %err, "could not parse chat response envelope");
                    None
                }
            },
        }
    }
}

/// One way of reading a chatbot response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseEnvelope<'a> {
    /// The response is the text itself.
    Text(&'a str),
    /// The text sits under one of [`ANSWER_KEYS`].
    Keyed(&'a Map<String, Value>),
    /// The answer is wrapped in a `body` field.
    BodyWrapped(Wrapped<'a>),
    /// The answer is wrapped in a `data` field.
    DataWrapped(Wrapped<'a>),
}

impl<'a> ResponseEnvelope<'a> {
    /// Every reading `response` admits, in the order they are tried.
    ///
    /// Values that are neither strings nor objects admit no reading.
    pub fn readings(response: &'a Value) -> Vec<Self> {
        match response {
            Value::String(text) => vec![ResponseEnvelope::Text(text)],
            Value::Object(map) => {
                let mut readings = vec![ResponseEnvelope::Keyed(map)];
                if let Some(body) = map.get("body").and_then(Wrapped::from_value) {
                    readings.push(ResponseEnvelope::BodyWrapped(body));
                }
                if let Some(data) = map.get("data").and_then(Wrapped::from_value) {
                    readings.push(ResponseEnvelope::DataWrapped(data));
                }
                readings
            }
            _ => Vec::new(),
        }
    }

    /// The display text under this reading, if any.
    pub fn resolve(&self) -> Option<String> {
        match self {
            ResponseEnvelope::Text(text) => non_empty(text),
            ResponseEnvelope::Keyed(map) => probe_keys(map),
            ResponseEnvelope::BodyWrapped(wrapped) => wrapped.resolve("body"),
            ResponseEnvelope::DataWrapped(wrapped) => wrapped.resolve("data"),
        }
    }
}

/// Extract display text from a chatbot response.
///
/// Always returns non-empty text; falls back to [`FALLBACK_MESSAGE`].
pub fn extract(response: &Value) -> String {
    ResponseEnvelope::readings(response)
        .iter()
        .find_map(ResponseEnvelope::resolve)
        .unwrap_or_else(|| {
            CHAT_FALLBACKS.click();
            FALLBACK_MESSAGE.to_string()
        })
}

fn probe_keys(map: &Map<String, Value>) -> Option<String> {
    ANSWER_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .find_map(non_empty)
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_string() {
        assert_eq!(extract(&json!("Hello")), "Hello");
        assert_eq!(extract(&json!("  Hello \n")), "Hello");
    }

    #[test]
    fn blank_string_falls_back() {
        assert_eq!(extract(&json!("")), FALLBACK_MESSAGE);
        assert_eq!(extract(&json!("   ")), FALLBACK_MESSAGE);
    }

    #[test]
    fn keyed_object_is_trimmed() {
        assert_eq!(extract(&json!({"answer": " Hi there "})), "Hi there");
    }

    #[test]
    fn key_priority() {
        let response = json!({
            "text": "last",
            "reply": "fourth",
            "message": "second",
        });
        assert_eq!(extract(&response), "second");
        assert_eq!(extract(&json!({"reply": "r", "text": "t"})), "r");
        assert_eq!(extract(&json!({"response": "r", "reply": "x"})), "r");
    }

    #[test]
    fn non_string_and_blank_values_are_absent() {
        let response = json!({
            "answer": 42,
            "message": "   ",
            "response": null,
            "reply": {"text": "nested"},
            "text": "fine",
        });
        assert_eq!(extract(&response), "fine");
    }

    #[test]
    fn encoded_body() {
        assert_eq!(extract(&json!({"body": r#"{"message":"Hola"}"#})), "Hola");
        assert_eq!(
            extract(&json!({"statusCode": 200, "body": r#"{"answer":"  Xin chào  "}"#})),
            "Xin chào"
        );
    }

    #[test]
    fn encoded_body_holding_a_string() {
        assert_eq!(extract(&json!({"body": r#"" Plain answer ""#})), "Plain answer");
        assert_eq!(extract(&json!({"body": r#""  ""#})), FALLBACK_MESSAGE);
    }

    #[test]
    fn unparseable_body_falls_back() {
        assert_eq!(extract(&json!({"body": "not json"})), FALLBACK_MESSAGE);
    }

    #[test]
    fn unparseable_body_falls_through_to_data() {
        let response = json!({"body": "not json", "data": {"reply": "from data"}});
        assert_eq!(extract(&response), "from data");
    }

    #[test]
    fn nested_body() {
        assert_eq!(extract(&json!({"body": {"reply": "nested"}})), "nested");
    }

    #[test]
    fn direct_keys_win_over_envelopes() {
        let response = json!({"message": "direct", "body": r#"{"message":"wrapped"}"#});
        assert_eq!(extract(&response), "direct");
    }

    #[test]
    fn body_wins_over_data() {
        let response = json!({
            "body": {"answer": "from body"},
            "data": {"answer": "from data"},
        });
        assert_eq!(extract(&response), "from body");
    }

    #[test]
    fn data_envelope() {
        assert_eq!(extract(&json!({"data": {"reply": "ok"}})), "ok");
        assert_eq!(extract(&json!({"data": r#"{"text":"encoded"}"#})), "encoded");
        assert_eq!(extract(&json!({"data": {"reply": ""}})), FALLBACK_MESSAGE);
    }

    #[test]
    fn envelopes_are_probed_one_level_deep() {
        let response = json!({"body": r#"{"body": "{\"answer\": \"too deep\"}"}"#});
        assert_eq!(extract(&response), FALLBACK_MESSAGE);
    }

    #[test]
    fn empty_and_odd_shapes_fall_back() {
        assert_eq!(extract(&json!({})), FALLBACK_MESSAGE);
        assert_eq!(extract(&Value::Null), FALLBACK_MESSAGE);
        assert_eq!(extract(&json!(17)), FALLBACK_MESSAGE);
        assert_eq!(extract(&json!(["answer"])), FALLBACK_MESSAGE);
        assert_eq!(extract(&json!({"body": 5, "data": [1]})), FALLBACK_MESSAGE);
        assert_eq!(extract(&json!({"body": r#"[1, 2]"#})), FALLBACK_MESSAGE);
    }

    #[test]
    fn readings_follow_resolution_order() {
        let response = json!({"data": {}, "body": "{}"});
        let readings = ResponseEnvelope::readings(&response);
        assert_eq!(readings.len(), 3);
        assert!(matches!(readings[0], ResponseEnvelope::Keyed(_)));
        assert_eq!(readings[1], ResponseEnvelope::BodyWrapped(Wrapped::Encoded("{}")));
        assert!(matches!(
            readings[2],
            ResponseEnvelope::DataWrapped(Wrapped::Nested(_))
        ));
        assert_eq!(
            ResponseEnvelope::readings(&json!("hi")),
            vec![ResponseEnvelope::Text("hi")]
        );
        assert!(ResponseEnvelope::readings(&json!(true)).is_empty());
    }
}
