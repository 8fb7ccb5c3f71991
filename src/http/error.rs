//! Errors a handler can return, and how each maps onto a response.

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::codec::CodecError;
use crate::http::Response;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required query parameter is absent or empty.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// Input failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// The body could not be decoded, or the payload could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The addressed resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure inside the handler.
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::MissingParameter(_)
            | HandlerError::BadRequest(_)
            | HandlerError::Codec(CodecError::MalformedBody(_)) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Codec(CodecError::Encode(_)) | HandlerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Faults that are the server's problem rather than the client's.
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }

    pub fn into_response(self) -> Response {
        Response::error(self.status(), self.to_string())
    }
}
