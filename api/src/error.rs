use almanac_common::{
    caller::CallerError, params::ParamsError, range::RangeError, views::ApiErrorResponse,
};
use almanac_db::{password::PasswordError, storage::StoreError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use thiserror::Error;

const INTERNAL_MESSAGE: &str = "Something went wrong on our end. Please try again later.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Unable to log in with provided credentials.")]
    InvalidLogin,

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    CallerError(#[from] CallerError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidLogin => StatusCode::BAD_REQUEST,
            Self::Storage(se) => match se {
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::PermissionDenied => StatusCode::FORBIDDEN,
                StoreError::Conflict(_) | StoreError::Constraint(_) | StoreError::Invalid(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::CallerError(ce) => match ce {
                CallerError::Forbidden { .. } => StatusCode::FORBIDDEN,
                CallerError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            },
            Self::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "ValidationError",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "NotFound",
            _ => "InternalError",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::InvalidLogin => self.to_string(),
            Self::Storage(StoreError::Conflict(_)) => {
                "A record with these details already exists.".into()
            }
            Self::Storage(StoreError::Invalid(err)) => err.to_string(),
            Self::Storage(StoreError::Constraint(_)) => {
                "The request violates a data constraint.".into()
            }
            _ => match self.status_code() {
                StatusCode::UNAUTHORIZED => {
                    "You are not authenticated to perform this action.".into()
                }
                StatusCode::FORBIDDEN => {
                    "You do not have permission to perform this action.".into()
                }
                StatusCode::NOT_FOUND => "The requested resource was not found.".into(),
                _ => INTERNAL_MESSAGE.into(),
            },
        }
    }
}

impl From<ParamsError> for ApiError {
    fn from(err: ParamsError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RangeError> for ApiError {
    fn from(err: RangeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        ApiErrorResponse {
            code: Some(err.code().into()),
            message: err.message(),

            #[cfg(debug_assertions)]
            details: Some(err.to_string()),

            #[cfg(not(debug_assertions))]
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!("Error returned by handler: {self}");
        } else {
            tracing::debug!(status = %status_code, "Request rejected: {self}");
        }

        let mut response =
            (status_code, Json(Into::<ApiErrorResponse>::into(self))).into_response();

        if status_code == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let err: ApiError = ParamsError::new("title", "This field may not be blank.").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "title: This field may not be blank.");

        let err: ApiError = RangeError::MissingDate.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_map_to_status() {
        let cases = [
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (StoreError::PermissionDenied, StatusCode::FORBIDDEN),
            (StoreError::Conflict("users_email_key".into()), StatusCode::BAD_REQUEST),
            (
                StoreError::Invalid(ParamsError::new("end_at", "Ends before it starts.")),
                StatusCode::BAD_REQUEST,
            ),
            (StoreError::Pool("timed out".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn unauthorized_sets_challenge_header() {
        let response =
            ApiError::CallerError(CallerError::unauthorized(None)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = ApiError::from(StoreError::Pool("connection refused".into()));
        assert_eq!(err.message(), INTERNAL_MESSAGE);
        assert_eq!(err.code(), "InternalError");
    }
}
