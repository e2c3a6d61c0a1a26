//! Mapping from service errors to HTTP responses.
//!
//! Every handler returns `Result<_, ApiError>`; the error is logged once,
//! here, on its way out.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ecfr_core::Error;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {}", self.message);
        } else {
            tracing::warn!(status = status.as_u16(), "request rejected: {}", self.message);
        }
        (status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(Error::FetchTimeout("u".into())).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ApiError::from(Error::HttpError("u".into())).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::from(Error::Xml("bad".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::from(Error::TaskFailed("panic".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        let err = ApiError::bad_request("Title is required");
        assert_eq!(err.message, "Title is required");

        let err = ApiError::from(Error::Xml("unexpected end".into()));
        assert_eq!(err.message, "XML_PARSE_FAILED: unexpected end");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
