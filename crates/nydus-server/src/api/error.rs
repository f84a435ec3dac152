use gotcha::axum::http::StatusCode;
use gotcha::axum::response::{IntoResponse, Response};
use gotcha::Json;

use nydus_protocol::ErrorBody;

use crate::bot::BotApiError;
use crate::github::GithubError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<crate::NydusError> for ApiError {
    fn from(e: crate::NydusError) -> Self {
        Self {
            status: e.to_status_code(),
            message: e.to_string(),
        }
    }
}

impl From<BotApiError> for ApiError {
    fn from(e: BotApiError) -> Self {
        crate::NydusError::from(e).into()
    }
}

impl From<GithubError> for ApiError {
    fn from(e: GithubError) -> Self {
        crate::NydusError::from(e).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_client_errors_pass_through() {
        let err: ApiError = BotApiError::Status {
            status: 404,
            message: "Deployment not found".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Deployment not found");
    }

    #[test]
    fn test_bot_server_errors_become_bad_gateway() {
        let err: ApiError = BotApiError::Status {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);

        let err: ApiError = BotApiError::Network("connection refused".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_missing_pat_is_bad_request() {
        let err: ApiError = GithubError::MissingToken.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Missing GitHub PAT");
    }
}
