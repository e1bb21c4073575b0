//! Request execution against the Bot API.
//!
//! # Design
//! `Api` holds the bot credential and a transport handle and nothing else —
//! no request history, no retry or timeout policy, no shared state between
//! calls. Each execution is one synchronous round-trip split into three
//! steps that can be exercised independently: [`Api::build_request`]
//! produces the wire request, the [`Transport`] runs it, and
//! [`parse_response`] decodes the response envelope down to its `result`
//! value. [`Api::execute`] chains the three and types the result through
//! the method's `Output`.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::methods::Method;
use crate::multipart;
use crate::types::ResponseParameters;

/// Production API host.
pub const BASE_URL: &str = "https://api.telegram.org";

/// Synchronous Bot API client.
pub struct Api {
    token: String,
    base_url: String,
    transport: Box<dyn Transport>,
}

impl Api {
    /// Client with the default [`UreqTransport`].
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_transport(token, Box::new(UreqTransport::new()))
    }

    /// Client over a caller-supplied transport, for tests and embedders.
    pub fn with_transport(token: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            token: token.into(),
            base_url: BASE_URL.to_string(),
            transport,
        }
    }

    /// Point the client at a different host (mock server, local gateway).
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Run a method and decode its `result` into the method's output type.
    pub fn execute<M: Method>(&self, method: &M) -> Result<M::Output> {
        let result = self.execute_raw(method)?;
        serde_json::from_value(result).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Run a method and return the envelope's raw `result` value.
    pub fn execute_raw<M: Method>(&self, method: &M) -> Result<Value> {
        let request = self.build_request(method)?;
        log::debug!(
            "POST {} ({} bytes)",
            request.url,
            request.body.as_ref().map_or(0, Vec::len)
        );
        let response = self.transport.send(&request)?;
        log::debug!("{} <- {}", response.status, M::NAME);
        parse_response(response)
    }

    /// Build the wire request for a method without sending it.
    ///
    /// Plain methods go out as a JSON body. A method with uploads goes out
    /// as `multipart/form-data`: its serialized fields are flattened into
    /// text parts and the binary parts are appended after them.
    pub fn build_request<M: Method>(&self, method: &M) -> Result<HttpRequest> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, M::NAME);
        let uploads = method.uploads();

        if uploads.is_empty() {
            let body = serde_json::to_string(method)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            return Ok(HttpRequest {
                method: HttpMethod::Post,
                url,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: Some(body.into_bytes()),
            });
        }

        let params =
            serde_json::to_value(method).map_err(|e| Error::Serialization(e.to_string()))?;
        let Value::Object(map) = params else {
            return Err(Error::Serialization(
                "method did not serialize to an object".to_string(),
            ));
        };
        let mut parts = multipart::flatten(&map).unwrap_or_default();
        parts.extend(uploads);

        let boundary = multipart::boundary();
        let body = multipart::encode(&parts, &boundary);
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![(
                "content-type".to_string(),
                format!("multipart/form-data; boundary={boundary}"),
            )],
            body: Some(body),
        })
    }
}

/// Response envelope shared by every method.
#[derive(Debug, serde::Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

/// Decode a response envelope and extract its `result` value.
///
/// The envelope is authoritative over the HTTP status: the server reports
/// semantic errors as `ok: false` bodies on 4xx/5xx responses, so those
/// decode to [`Error::Api`]. Only a non-envelope body falls back to the
/// status code.
pub fn parse_response(response: HttpResponse) -> Result<Value> {
    let envelope: ApiResponse = match serde_json::from_str(&response.body) {
        Ok(envelope) => envelope,
        Err(_) if !(200..300).contains(&response.status) => {
            return Err(Error::Http {
                status: response.status,
                body: response.body,
            });
        }
        Err(e) => return Err(Error::Deserialization(e.to_string())),
    };

    if !envelope.ok {
        return Err(Error::Api {
            error_code: envelope.error_code,
            description: envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
            retry_after: envelope.parameters.and_then(|p| p.retry_after),
        });
    }
    envelope.result.ok_or(Error::MissingResult)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::methods::{AnswerCallbackQuery, GetMe, SendDocument, SendMessage};
    use crate::types::InputFile;

    /// Transport that records requests and replays a canned body.
    struct StubTransport {
        body: String,
        seen: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl Transport for StubTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: self.body.clone(),
            })
        }
    }

    fn stub_api(body: &str) -> (Api, Arc<Mutex<Vec<HttpRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let transport = StubTransport {
            body: body.to_string(),
            seen: Arc::clone(&seen),
        };
        (Api::with_transport("123:TEST", Box::new(transport)), seen)
    }

    fn api() -> Api {
        stub_api(r#"{"ok":true,"result":true}"#).0
    }

    #[test]
    fn build_request_targets_the_method_url() {
        let request = api().build_request(&GetMe::new()).unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.telegram.org/bot123:TEST/getMe");
        assert_eq!(
            request.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn base_url_override_strips_trailing_slash() {
        let api = api().base_url("http://127.0.0.1:9999/");
        let request = api.build_request(&GetMe::new()).unwrap();
        assert_eq!(request.url, "http://127.0.0.1:9999/bot123:TEST/getMe");
    }

    #[test]
    fn json_body_is_the_minimal_mapping() {
        let request = api()
            .build_request(&AnswerCallbackQuery::new("q1"))
            .unwrap();
        let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"callback_query_id": "q1"}));
    }

    #[test]
    fn json_body_keeps_unicode_literal() {
        let request = api()
            .build_request(&SendMessage::new(7, "héllo → 日本語"))
            .unwrap();
        let body = String::from_utf8(request.body.unwrap()).unwrap();
        assert!(body.contains("héllo → 日本語"));
        assert!(!body.contains("\\u"));
    }

    #[test]
    fn upload_switches_to_multipart() {
        let method = SendDocument::new(7, InputFile::upload("report.pdf", vec![1, 2, 3]))
            .caption("quarterly");
        let request = api().build_request(&method).unwrap();

        let content_type = &request.headers[0].1;
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let boundary = content_type.split("boundary=").nth(1).unwrap();

        let body = String::from_utf8_lossy(request.body.as_deref().unwrap()).into_owned();
        assert!(body.contains(&format!("--{boundary}\r\n")));
        assert!(body.contains("name=\"chat_id\"\r\n\r\n7"));
        assert!(body.contains("name=\"caption\"\r\n\r\nquarterly"));
        assert!(body.contains("name=\"document\"\r\n\r\nattach://report.pdf"));
        assert!(body.contains("name=\"report.pdf\"; filename=\"report.pdf\""));
    }

    #[test]
    fn parse_response_returns_the_result_value() {
        let value = parse_response(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"ok":true,"result":{"id":42}}"#.to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"id": 42}));
    }

    #[test]
    fn parse_response_surfaces_the_error_envelope() {
        let err = parse_response(HttpResponse {
            status: 400,
            headers: Vec::new(),
            body: r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#
                .to_string(),
        })
        .unwrap_err();
        match err {
            Error::Api {
                error_code,
                description,
                retry_after,
            } => {
                assert_eq!(error_code, Some(400));
                assert_eq!(description, "Bad Request: chat not found");
                assert_eq!(retry_after, None);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn parse_response_reads_retry_after() {
        let err = parse_response(HttpResponse {
            status: 429,
            headers: Vec::new(),
            body: r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 14","parameters":{"retry_after":14}}"#.to_string(),
        })
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Api {
                retry_after: Some(14),
                ..
            }
        ));
    }

    #[test]
    fn parse_response_missing_result_is_explicit() {
        let err = parse_response(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"ok":true}"#.to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::MissingResult));
    }

    #[test]
    fn parse_response_non_envelope_body_falls_back_to_status() {
        let err = parse_response(HttpResponse {
            status: 502,
            headers: Vec::new(),
            body: "<html>bad gateway</html>".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Http { status: 502, .. }));
    }

    #[test]
    fn parse_response_garbage_on_success_status_is_deserialization() {
        let err = parse_response(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "not json".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn execute_decodes_the_typed_result() {
        let (api, seen) = stub_api(
            r#"{"ok":true,"result":{"id":42,"is_bot":true,"first_name":"mock","username":"mock_bot"}}"#,
        );
        let user = api.execute(&GetMe::new()).unwrap();
        assert_eq!(user.id, 42);
        assert!(user.is_bot);
        assert_eq!(user.username.as_deref(), Some("mock_bot"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].url.ends_with("/getMe"));
    }

    #[test]
    fn execute_raw_skips_typed_decoding() {
        let (api, _) = stub_api(r#"{"ok":true,"result":{"id":42}}"#);
        let raw = api.execute_raw(&GetMe::new()).unwrap();
        assert_eq!(raw, json!({"id": 42}));
    }

    #[test]
    fn execute_reports_result_shape_mismatches() {
        let (api, _) = stub_api(r#"{"ok":true,"result":"not a user"}"#);
        let err = api.execute(&GetMe::new()).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }
}
