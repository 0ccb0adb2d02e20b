use anyhow::{anyhow, Context};
use serde_json::json;

use crate::{ReplyId, TopicId};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Topic not found {0:?}")]
    TopicNotFound(TopicId),

    #[error("Reply not found {0:?}")]
    ReplyNotFound(ReplyId),

    #[error("Parent comment not found {0:?}")]
    ParentNotFound(ReplyId),

    #[error("Missing required field {0:?}")]
    MissingField(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Invalid identity header {0:?}")]
    InvalidIdentity(String),

    #[error("Unknown route {0:?}")]
    UnknownRoute(String),

    #[error("Replying to {0:?} would nest too deep")]
    ReplyTooDeep(ReplyId),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::TopicNotFound(_) | Error::ReplyNotFound(_) | Error::ParentNotFound(_)
        )
    }

    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::TopicNotFound(_) => StatusCode::NOT_FOUND,
            Error::ReplyNotFound(_) => StatusCode::NOT_FOUND,
            Error::ParentNotFound(_) => StatusCode::NOT_FOUND,
            Error::MissingField(_) => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::InvalidIdentity(_) => StatusCode::BAD_REQUEST,
            Error::UnknownRoute(_) => StatusCode::NOT_FOUND,
            Error::ReplyTooDeep(_) => StatusCode::BAD_REQUEST,
            Error::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "success": false,
                "message": msg,
                "type": "unknown",
            }),
            Error::TopicNotFound(id) => json!({
                "success": false,
                "message": "Topic not found",
                "type": "topic-not-found",
                "id": id.0,
            }),
            Error::ReplyNotFound(id) => json!({
                "success": false,
                "message": "Reply not found",
                "type": "reply-not-found",
                "id": id.0,
            }),
            Error::ParentNotFound(id) => json!({
                "success": false,
                "message": "Parent comment not found",
                "type": "parent-not-found",
                "id": id.0,
            }),
            Error::MissingField(field) => json!({
                "success": false,
                "message": "a required field is missing",
                "type": "missing-field",
                "field": field,
            }),
            Error::NullByteInString(s) => json!({
                "success": false,
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::InvalidIdentity(header) => json!({
                "success": false,
                "message": "the identity headers are malformed",
                "type": "invalid-identity",
                "header": header,
            }),
            Error::UnknownRoute(path) => json!({
                "success": false,
                "message": "Route not found",
                "type": "unknown-route",
                "path": path,
            }),
            Error::ReplyTooDeep(parent) => json!({
                "success": false,
                "message": "Replies cannot be nested any deeper",
                "type": "reply-too-deep",
                "id": parent.0,
            }),
            Error::InvalidBody(reason) => json!({
                "success": false,
                "message": "the request body is malformed",
                "type": "invalid-body",
                "reason": reason,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let field = |name: &str| -> anyhow::Result<String> {
            data.get(name)
                .and_then(|v| v.as_str())
                .map(String::from)
                .ok_or_else(|| anyhow!("error contents lacks the {name:?} string field"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(field("message").unwrap_or_default()),
                "topic-not-found" => Error::TopicNotFound(TopicId(field("id")?)),
                "reply-not-found" => Error::ReplyNotFound(ReplyId(field("id")?)),
                "parent-not-found" => Error::ParentNotFound(ReplyId(field("id")?)),
                "missing-field" => Error::MissingField(field("field")?),
                "null-byte" => Error::NullByteInString(field("string")?),
                "invalid-identity" => Error::InvalidIdentity(field("header")?),
                "unknown-route" => Error::UnknownRoute(field("path")?),
                "reply-too-deep" => Error::ReplyTooDeep(ReplyId(field("id")?)),
                "invalid-body" => Error::InvalidBody(field("reason")?),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
