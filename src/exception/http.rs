use crate::common::ErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// The generic response used whenever nothing more specific is available:
/// HTTP 500 with a minimal JSON body.
pub fn default_response() -> Response {
    ErrorBody::internal_server_error().into_response()
}

/// An exception that already knows which response to send.
///
/// When a request is in flight, the handler writes the carried response as-is,
/// ahead of any factory registered for this type.
pub struct HttpException {
    status: StatusCode,
    // Response bodies are not `Sync`; the mutex lets the exception be shared.
    response: Mutex<Option<Response>>,
}

impl HttpException {
    pub fn new(response: Response) -> Self {
        Self {
            status: response.status(),
            response: Mutex::new(Some(response)),
        }
    }

    /// Build an exception whose response is a JSON error body with `status`
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(ErrorBody::new(status, message).into_response())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Take the carried response, or the default response if it was already taken
    pub fn into_response(self) -> Response {
        self.response
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or_else(default_response)
    }
}

impl fmt::Debug for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpException")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP exception with status {}", self.status)
    }
}

impl std::error::Error for HttpException {}
