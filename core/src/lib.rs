//! Synchronous, typed client for the Telegram Bot API.
//!
//! # Overview
//! One struct per remote method (a builder that accumulates optional
//! fields), one struct per remote data type (bidirectional serde mapping to
//! the wire shape), and a single [`Api`] executor that serializes a method,
//! performs the HTTPS POST, and decodes the response envelope.
//!
//! # Design
//! - `Api` is stateless across calls — it holds only the bot token, the
//!   base URL, and a transport handle.
//! - The HTTP round-trip lives behind the [`Transport`] trait; request
//!   building and response parsing are separate steps, so everything up to
//!   the socket is deterministic and testable without a network.
//! - Unset optional fields are omitted from payloads entirely, never sent
//!   as `null`, and empty lists stay distinct from absent ones.
//! - Requests carrying a file upload switch transparently from JSON to
//!   `multipart/form-data`, flattening nested fields into bracketed part
//!   names.
//! - No retries, no rate limiting, no concurrency management: each call is
//!   one blocking round-trip, and policy belongs to the caller or the
//!   transport implementation.

pub mod api;
pub mod error;
pub mod http;
pub mod methods;
pub mod multipart;
pub mod types;

pub use api::{Api, BASE_URL};
pub use error::{Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use methods::Method;
pub use multipart::{Part, PartValue};
pub use types::{ChatId, InputFile, Message, MessageOrBool, ParseMode, ReplyMarkup, Update, User};
