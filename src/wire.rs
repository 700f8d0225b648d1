use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The event handed to the handler by the HTTP trigger.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// The raw request body. This is expected to be a JSON object carrying
    /// an `incrementBy` field, but nothing is assumed until it is parsed.
    /// The trigger sends `null` when the request had no body.
    #[serde(default)]
    pub body: Option<String>,
    /// Parameters captured from the request path. The trigger sends `null`
    /// when the route had none.
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
}

impl Request {
    pub fn new(counter_id: &str, body: &str) -> Self {
        Self::default()
            .with_body(body)
            .with_path_parameter("counterId", counter_id)
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the body from raw transport bytes. Empty or non-UTF-8 payloads
    /// leave the body unset, which the handler rejects as unparsable.
    pub fn with_raw_body(mut self, raw: &[u8]) -> Self {
        self.body = std::str::from_utf8(raw)
            .ok()
            .filter(|text| !text.is_empty())
            .map(Into::into);
        self
    }

    pub fn with_path_parameter(mut self, name: &str, value: &str) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }
}

/// The response handed back to the HTTP trigger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    /// JSON-encoded [SuccessBody] or [ErrorBody].
    pub body: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessBody {
    /// The counter's value after the increment was applied.
    pub count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl Response {
    /// A `201 Created` carrying the updated count.
    pub fn created(count: i64) -> Self {
        Self {
            status_code: 201,
            body: serde_json::json!({ "count": count }).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

pub fn format_error_response(status_code: u16, message: &str) -> Response {
    Response {
        status_code,
        body: serde_json::json!({ "error": message }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_wraps_message() {
        let response = format_error_response(400, "nope");
        assert_eq!(response.status_code, 400);
        let body: ErrorBody = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body.error, "nope");
    }

    #[test]
    fn created_serializes_count_as_plain_integer() {
        let response = Response::created(8);
        assert_eq!(response.status_code, 201);
        assert_eq!(response.body, r#"{"count":8}"#);
    }

    #[test]
    fn request_reads_trigger_event_shape() {
        let event = r#"{
            "body": "{\"incrementBy\": 3}",
            "pathParameters": { "counterId": "visits" },
            "headers": { "content-type": "application/json" }
        }"#;
        let request: Request = serde_json::from_str(event).unwrap();
        assert_eq!(request.path_parameter("counterId"), Some("visits"));
        assert_eq!(request.body.as_deref(), Some(r#"{"incrementBy": 3}"#));
    }

    #[test]
    fn request_tolerates_null_fields() {
        let request: Request =
            serde_json::from_str(r#"{ "body": null, "pathParameters": null }"#).unwrap();
        assert_eq!(request.body, None);
        assert_eq!(request.path_parameter("counterId"), None);
    }

    #[test]
    fn raw_body_must_be_utf8() {
        let request = Request::default().with_raw_body(br#"{"incrementBy": 1}"#);
        assert_eq!(request.body.as_deref(), Some(r#"{"incrementBy": 1}"#));

        let mut raw = br#"{"incrementBy": 1, "x": ""#.to_vec();
        raw.push(0xff);
        raw.extend_from_slice(br#""}"#);
        assert_eq!(Request::default().with_raw_body(&raw).body, None);

        assert_eq!(Request::default().with_raw_body(b"").body, None);
    }

    #[test]
    fn response_serializes_camel_case() {
        let value = serde_json::to_value(Response::created(1)).unwrap();
        assert_eq!(value["statusCode"], 201);
    }
}
