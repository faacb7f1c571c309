use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::ENCODING_FAILED_BODY;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error_code: u32,
}

impl ErrorBody {
    #[inline]
    pub fn new(message: String, error_code: u32) -> Self {
        Self {
            message,
            error_code,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Server service panicked: {0:?}")]
    ServicePanicked(Option<String>),
    #[error("Oops, something went wrong while listing the users")]
    UserListFailed,
    #[error("ID must be numeric")]
    InvalidUserId,
    #[error("The user could not be written: {0}")]
    UserWriteFailed(String),
    #[error("Username already exists")]
    UserNameAlreadyExists,
}

impl From<&ApiError> for StatusCode {
    fn from(value: &ApiError) -> Self {
        match value {
            ApiError::ServicePanicked(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UserListFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidUserId => StatusCode::BAD_REQUEST,
            ApiError::UserWriteFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::UserNameAlreadyExists => StatusCode::CONFLICT,
        }
    }
}

impl From<&ApiError> for u32 {
    fn from(value: &ApiError) -> Self {
        match value {
            ApiError::ServicePanicked(_) => 50001,
            ApiError::UserListFailed => 50002,
            ApiError::InvalidUserId => 40001,
            ApiError::UserWriteFailed(_) => 40002,
            ApiError::UserNameAlreadyExists => 40901,
        }
    }
}

/// The rendered form of an error, shared by [`ApiError`] and extractor
/// rejections that have no `ApiError` counterpart.
#[derive(Debug)]
pub struct ErrorResponse {
    pub status_code: StatusCode,
    pub error_code: u32,
    pub message: String,
}

impl From<ApiError> for ErrorResponse {
    fn from(value: ApiError) -> Self {
        Self {
            status_code: (&value).into(),
            error_code: (&value).into(),
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let err_body = ErrorBody::new(self.message, self.error_code);

        let tuple = match serde_json::to_vec(&err_body) {
            Ok(buf) => (
                self.status_code,
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(mime::APPLICATION_JSON.as_ref()),
                )],
                buf,
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(mime::APPLICATION_JSON.as_ref()),
                )],
                ENCODING_FAILED_BODY.to_vec(),
            ),
        };

        tuple.into_response()
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_codes() {
        let cases = [
            (ApiError::UserListFailed, StatusCode::INTERNAL_SERVER_ERROR, 50002),
            (ApiError::InvalidUserId, StatusCode::BAD_REQUEST, 40001),
            (
                ApiError::UserWriteFailed("boom".into()),
                StatusCode::BAD_REQUEST,
                40002,
            ),
            (ApiError::UserNameAlreadyExists, StatusCode::CONFLICT, 40901),
        ];

        for (err, status, code) in cases {
            let message = err.to_string();
            let res = ErrorResponse::from(err);

            assert_eq!(res.status_code, status);
            assert_eq!(res.error_code, code);
            assert_eq!(res.message, message);
        }
    }

    #[test]
    fn test_into_response_is_json() {
        let res = ApiError::UserNameAlreadyExists.into_response();

        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            mime::APPLICATION_JSON.as_ref()
        );
    }
}
