use axum::{
    Json,
    extract::{
        FromRequest, Request,
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    errors::{RepoError, ValidationError},
    http::schema::ErrorResponse,
};

/// Error returned by every handler; renders as an [`ErrorResponse`] body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Repo(err) => match err {
                RepoError::Validation(_) => StatusCode::BAD_REQUEST,
                RepoError::Unauthorized => StatusCode::UNAUTHORIZED,
                RepoError::Forbidden { .. } => StatusCode::FORBIDDEN,
                RepoError::NotFound { .. } => StatusCode::NOT_FOUND,
                RepoError::UniqueConstraintViolation { .. } | RepoError::VersionConflict { .. } => StatusCode::CONFLICT,
                RepoError::Redis(_) | RepoError::Other { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn body(&self) -> ErrorResponse {
        match self {
            ApiError::MalformedRequest(message) => ErrorResponse::new("malformed_request", message.clone(), None),
            ApiError::Repo(err) => {
                let message = match err {
                    RepoError::Validation(ValidationError { issues }) => issues
                        .first()
                        .map(|issue| issue.message.clone())
                        .unwrap_or_else(|| "validation failed".to_string()),
                    RepoError::Unauthorized => "please sign in".to_string(),
                    RepoError::Forbidden { action } => format!("you are not allowed to {action}"),
                    RepoError::NotFound { .. } => "not found".to_string(),
                    RepoError::UniqueConstraintViolation { fields, .. } => {
                        format!("{} already in use", fields.join(", "))
                    }
                    RepoError::VersionConflict { .. } => "record changed concurrently, retry".to_string(),
                    RepoError::Redis(_) | RepoError::Other { .. } => "internal server error".to_string(),
                };
                let issues = match err {
                    RepoError::Validation(validation) => Some(validation.issues.clone()),
                    _ => None,
                };
                ErrorResponse::new(err.reason(), message, issues)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::MalformedRequest(err.body_text())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Repo(RepoError::Validation(err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `Json` extractor whose rejection renders as an [`ApiError`].
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
