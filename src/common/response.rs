use axum::{
    Json,
    http::StatusCode as HttpStatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Minimal JSON error body
///
/// Serializes as `{"statusCode": 500, "message": "...", "timestamp": "<rfc3339>"}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,

    #[serde(skip)]
    pub http_status: HttpStatusCode,
}

impl ErrorBody {
    pub fn new(status: HttpStatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now(),
            http_status: status,
        }
    }

    /// The body used when no better response can be produced
    pub fn internal_server_error() -> Self {
        Self::new(HttpStatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        // Json sets `content-type: application/json`
        (self.http_status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_without_http_status() {
        let body = ErrorBody::new(HttpStatusCode::NOT_FOUND, "missing");
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["message"], "missing");
        assert!(value["timestamp"].is_string());
        assert!(value.get("httpStatus").is_none());
    }
}
