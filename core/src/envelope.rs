//! The normalized `{code, message, data}` envelope.
//!
//! # Design
//! Remote endpoints are expected to answer with a JSON object carrying
//! optional `code`, `message` and `data` keys. Whatever they actually send,
//! `ResponseEnvelope::from_body` produces an envelope whose `code` is exactly
//! `Code::Success` or `Code::Failure`:
//!
//! - a body that is not a JSON object becomes a format error envelope that
//!   embeds the raw body in `message`;
//! - missing keys fall back to `Failure` / `null` / `null`;
//! - any `code` other than the integer `0` collapses to `Failure`.
//!
//! `-0` is an integer zero too. serde_json turns it into a float, so the
//! code is read from its source token rather than from the parsed `Value`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

/// Prefix of the message stored for bodies that are not a JSON object.
pub const MALFORMED_RESPONSE: &str = "malformed response format";

/// Raw body bytes kept in a format error message before truncation.
pub const MAX_RAW_BODY_IN_MESSAGE: usize = 1024;

/// Binary outcome of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "u8")]
pub enum Code {
    Success = 0,
    #[default]
    Failure = 1,
}

impl Code {
    /// Coerce a remote `code` value. Only the JSON integer `0` is success.
    pub fn from_wire(value: &Value) -> Self {
        match value {
            Value::Number(n) if n.as_u64() == Some(0) => Code::Success,
            _ => Code::Failure,
        }
    }

    /// Coerce a remote `code` from its JSON source text.
    ///
    /// Unlike [`Code::from_wire`] this sees the difference between the
    /// integer `-0` (success) and the float `-0.0` (failure).
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "0" | "-0" => Code::Success,
            _ => Code::Failure,
        }
    }

    pub fn is_success(self) -> bool {
        self == Code::Success
    }
}

/// The `code` member of a body, borrowed as source text.
#[derive(Deserialize)]
struct CodeToken<'a> {
    #[serde(borrow, default)]
    code: Option<&'a RawValue>,
}

impl From<Code> for u8 {
    fn from(code: Code) -> Self {
        code as u8
    }
}

/// A normalized response.
///
/// Returned by every `RequestClient` verb and also stored as the client's
/// last response.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResponseEnvelope {
    pub code: Code,
    pub message: Option<String>,
    pub data: Value,
}

impl ResponseEnvelope {
    /// Normalize a raw response body.
    pub fn from_body(body: &str) -> Self {
        Self::parse(body).unwrap_or_else(|| Self::malformed(body))
    }

    /// Normalize `body`, or `None` when it is not a JSON object.
    pub(crate) fn parse(body: &str) -> Option<Self> {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
            return None;
        };
        // Duplicate keys fail the token pass; the parsed map keeps the last.
        let code = match serde_json::from_str::<CodeToken<'_>>(body) {
            Ok(token) => token.code.map(|raw| Code::from_token(raw.get())).unwrap_or_default(),
            Err(_) => map.get("code").map(Code::from_wire).unwrap_or_default(),
        };
        Some(Self::from_map(code, map))
    }

    /// Envelope for a body that is not a JSON object.
    pub fn malformed(body: &str) -> Self {
        Self {
            code: Code::Failure,
            message: Some(format!("{MALFORMED_RESPONSE}: {}", truncate_raw_body(body))),
            data: Value::Null,
        }
    }

    fn from_map(code: Code, mut map: Map<String, Value>) -> Self {
        let message = match map.remove("message") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };
        let data = map.remove("data").unwrap_or(Value::Null);
        Self { code, message, data }
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    pub fn has_error(&self) -> bool {
        !self.is_success()
    }

    /// Error detail sent by the remote side, or the format error message.
    pub fn error(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Payload, `None` when absent or JSON `null`.
    pub fn data(&self) -> Option<&Value> {
        match &self.data {
            Value::Null => None,
            value => Some(value),
        }
    }

    pub fn into_data(self) -> Option<Value> {
        match self.data {
            Value::Null => None,
            value => Some(value),
        }
    }

    /// Deserialize the payload into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.data()
            .map(|value| T::deserialize(value))
            .transpose()
    }
}

/// Cut `body` to at most `MAX_RAW_BODY_IN_MESSAGE` bytes on a char boundary.
fn truncate_raw_body(body: &str) -> String {
    if body.len() <= MAX_RAW_BODY_IN_MESSAGE {
        return body.to_string();
    }
    let mut end = MAX_RAW_BODY_IN_MESSAGE;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
