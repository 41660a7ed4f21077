use anyhow::{anyhow, Context};
use serde_json::json;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::InvalidCredentials => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Serialize the error the way the gateway does
    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "INTERNAL_ERROR",
            }),
            Error::PermissionDenied => json!({
                "message": "Permission denied.",
                "type": "PERMISSION_DENIED",
            }),
            Error::InvalidCredentials => json!({
                "message": "Invalid login.",
                "type": "INVALID_CREDENTIALS",
            }),
            Error::NotFound(msg) => json!({
                "message": msg,
                "type": "NOT_FOUND",
            }),
            Error::BadRequest(msg) => json!({
                "message": msg,
                "type": "BAD_REQUEST",
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let message = String::from(
            data.get("message")
                .and_then(|msg| msg.as_str())
                .unwrap_or(""),
        );
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "PERMISSION_DENIED" | "INSUFFICIENT_CREDENTIALS" => Error::PermissionDenied,
                "INVALID_CREDENTIALS" => Error::InvalidCredentials,
                "NOT_FOUND" => Error::NotFound(message),
                "BAD_REQUEST" => Error::BadRequest(message),
                "INTERNAL_ERROR" | "UNSUPPORTED" => Error::Unknown(message),
                t => return Err(anyhow!("error contents has unknown type {t:?}")),
            },
        )
    }
}
