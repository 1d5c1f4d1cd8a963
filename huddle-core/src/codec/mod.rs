//! JSON codec for [`ControlMessage`].
//!
//! Decode failures are never fatal to a connection: callers log the error and
//! drop the frame. Unknown extra fields are ignored.

use crate::model::{ControlMessage, MessageKind};
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed control message: {0}")]
    Malformed(String),
    #[error("unknown control message type `{0}`")]
    UnknownType(String),
}

#[derive(Debug, Error)]
#[error("failed to encode control message: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

pub fn encode(message: &ControlMessage) -> Result<Bytes, EncodeError> {
    Ok(Bytes::from(serde_json::to_vec(message)?))
}

pub fn encode_text(message: &ControlMessage) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode(bytes: &[u8]) -> Result<ControlMessage, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let Some(object) = value.as_object() else {
        return Err(DecodeError::Malformed("expected a JSON object".into()));
    };
    let Some(tag) = object.get("type").and_then(Value::as_str) else {
        return Err(DecodeError::Malformed("missing `type` tag".into()));
    };
    if MessageKind::from_tag(tag).is_none() {
        return Err(DecodeError::UnknownType(tag.to_owned()));
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))
}

pub fn decode_text(text: &str) -> Result<ControlMessage, DecodeError> {
    decode(text.as_bytes())
}
