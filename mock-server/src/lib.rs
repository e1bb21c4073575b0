//! In-process stand-in for the Bot API, used by integration tests.
//!
//! # Design
//! Every method lives under `POST /bot<token>/<method>` and answers with
//! the standard `{ok, result}` / `{ok, error_code, description}` envelope.
//! The handlers work on raw JSON values — the point is to exercise the
//! client's wire behavior, not to re-model the domain types. Bodies are
//! accepted both as JSON and as `multipart/form-data` with `attach://`
//! references, mirroring how the real server takes uploads. A message-id
//! counter behind an `RwLock` makes send responses sequential and lets
//! tests assert ordering.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Debug)]
pub struct BotState {
    next_message_id: i64,
    sent: Vec<Value>,
}

pub type SharedState = Arc<RwLock<BotState>>;

pub fn app() -> Router {
    let state: SharedState = Arc::new(RwLock::new(BotState {
        next_message_id: 1,
        sent: Vec::new(),
    }));
    Router::new()
        .route("/health", get(health))
        .route("/{bot}/{method}", post(call_method))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn call_method(
    State(state): State<SharedState>,
    Path((bot_segment, method)): Path<(String, String)>,
    request: Request,
) -> (StatusCode, Json<Value>) {
    let Some(token) = bot_segment.strip_prefix("bot") else {
        return error_response(StatusCode::NOT_FOUND, "Not Found");
    };
    if token.is_empty() || token == "revoked" {
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let params = match read_params(request).await {
        Ok(params) => params,
        Err(response) => return response,
    };

    match method.as_str() {
        "getMe" => ok_response(json!({
            "id": 42,
            "is_bot": true,
            "first_name": "mock",
            "username": "mock_bot",
        })),
        "sendMessage" => send_message(&state, &params).await,
        "sendDocument" => send_document(&state, &params).await,
        "editMessageText" => edit_message_text(&params),
        "banChatMember" => {
            require(&params, &["chat_id", "user_id"]).unwrap_or_else(|| ok_response(json!(true)))
        }
        "answerCallbackQuery" => require(&params, &["callback_query_id"])
            .unwrap_or_else(|| ok_response(json!(true))),
        "deleteMessage" => require(&params, &["chat_id", "message_id"])
            .unwrap_or_else(|| ok_response(json!(true))),
        _ => error_response(StatusCode::NOT_FOUND, "Not Found: method not found"),
    }
}

/// Request parameters, decoded from either body shape.
struct RawParams {
    fields: Map<String, Value>,
    files: Vec<UploadedFile>,
}

struct UploadedFile {
    part_name: String,
    file_name: String,
    size: usize,
}

async fn read_params(request: Request) -> Result<RawParams, (StatusCode, Json<Value>)> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| bad_request("Bad Request: invalid multipart body"))?;
        let mut fields = Map::new();
        let mut files = Vec::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| bad_request("Bad Request: invalid multipart body"))?
        {
            let part_name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|_| bad_request("Bad Request: invalid multipart body"))?;
                    files.push(UploadedFile {
                        part_name,
                        file_name,
                        size: bytes.len(),
                    });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|_| bad_request("Bad Request: invalid multipart body"))?;
                    fields.insert(part_name, Value::String(text));
                }
            }
        }
        return Ok(RawParams { fields, files });
    }

    let bytes = axum::body::to_bytes(request.into_body(), 1 << 20)
        .await
        .map_err(|_| bad_request("Bad Request: unreadable body"))?;
    if bytes.is_empty() {
        return Ok(RawParams {
            fields: Map::new(),
            files: Vec::new(),
        });
    }
    let fields: Map<String, Value> = serde_json::from_slice(&bytes)
        .map_err(|_| bad_request("Bad Request: body is not valid JSON"))?;
    Ok(RawParams {
        fields,
        files: Vec::new(),
    })
}

async fn send_message(state: &SharedState, params: &RawParams) -> (StatusCode, Json<Value>) {
    let Some(chat) = chat_object(params) else {
        return bad_request("Bad Request: chat_id is empty");
    };
    let Some(text) = params.fields.get("text").and_then(Value::as_str) else {
        return bad_request("Bad Request: text is empty");
    };

    let mut guard = state.write().await;
    let message_id = guard.next_message_id;
    guard.next_message_id += 1;
    let message = json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": chat,
        "text": text,
    });
    guard.sent.push(message.clone());
    ok_response(message)
}

async fn send_document(state: &SharedState, params: &RawParams) -> (StatusCode, Json<Value>) {
    let Some(chat) = chat_object(params) else {
        return bad_request("Bad Request: chat_id is empty");
    };
    let document = if let Some(file) = attached_file(params, "document") {
        json!({
            "file_id": "mock-document",
            "file_unique_id": "u-mock-document",
            "file_name": file.file_name,
            "file_size": file.size,
        })
    } else if let Some(reference) = params.fields.get("document").and_then(Value::as_str) {
        json!({
            "file_id": reference,
            "file_unique_id": "u-mock-document",
        })
    } else {
        return bad_request("Bad Request: document is empty");
    };

    let mut guard = state.write().await;
    let message_id = guard.next_message_id;
    guard.next_message_id += 1;
    let mut message = json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "chat": chat,
        "document": document,
    });
    if let Some(caption) = params.fields.get("caption").and_then(Value::as_str) {
        message["caption"] = json!(caption);
    }
    guard.sent.push(message.clone());
    ok_response(message)
}

fn edit_message_text(params: &RawParams) -> (StatusCode, Json<Value>) {
    let Some(text) = params.fields.get("text").and_then(Value::as_str) else {
        return bad_request("Bad Request: text is empty");
    };
    // Inline-message edits are acknowledged with a bare `true`.
    if params.fields.contains_key("inline_message_id") {
        return ok_response(json!(true));
    }
    let Some(chat) = chat_object(params) else {
        return bad_request("Bad Request: chat_id is empty");
    };
    let Some(message_id) = message_id_of(params) else {
        return bad_request("Bad Request: message_id is empty");
    };
    ok_response(json!({
        "message_id": message_id,
        "date": 1_700_000_000,
        "edit_date": 1_700_000_100,
        "chat": chat,
        "text": text,
    }))
}

/// Chat stub for a `chat_id` parameter, which arrives as a JSON number, a
/// numeric string (multipart), or an `@username`.
fn chat_object(params: &RawParams) -> Option<Value> {
    match params.fields.get("chat_id")? {
        Value::Number(number) => number
            .as_i64()
            .map(|id| json!({"id": id, "type": "private"})),
        Value::String(text) => {
            if let Some(username) = text.strip_prefix('@') {
                Some(json!({
                    "id": 1_000_000,
                    "type": "supergroup",
                    "title": username,
                    "username": username,
                }))
            } else {
                text.parse::<i64>()
                    .ok()
                    .map(|id| json!({"id": id, "type": "private"}))
            }
        }
        _ => None,
    }
}

fn message_id_of(params: &RawParams) -> Option<i64> {
    match params.fields.get("message_id")? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

/// Resolve a file field: an `attach://<part>` reference to a binary part,
/// or a binary part named like the field itself.
fn attached_file<'a>(params: &'a RawParams, field: &str) -> Option<&'a UploadedFile> {
    if let Some(reference) = params.fields.get(field).and_then(Value::as_str) {
        if let Some(part_name) = reference.strip_prefix("attach://") {
            return params.files.iter().find(|file| file.part_name == part_name);
        }
    }
    params.files.iter().find(|file| file.part_name == field)
}

fn require(params: &RawParams, keys: &[&str]) -> Option<(StatusCode, Json<Value>)> {
    keys.iter()
        .find(|key| !params.fields.contains_key(**key))
        .map(|key| bad_request(&format!("Bad Request: {key} is empty")))
}

fn ok_response(result: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"ok": true, "result": result})))
}

fn error_response(status: StatusCode, description: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "ok": false,
            "error_code": status.as_u16(),
            "description": description,
        })),
    )
}

fn bad_request(description: &str) -> (StatusCode, Json<Value>) {
    error_response(StatusCode::BAD_REQUEST, description)
}
