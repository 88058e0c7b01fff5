//! API error type and [`axum::response::IntoResponse`] implementation.

use armis_cv::UploadRejection;
use axum::{
  Json,
  extract::multipart::MultipartError,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] armis_core::Error),

  #[error("upload rejected: {0}")]
  Upload(#[from] UploadRejection),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Map a multipart read failure. A body cut off at the router's limit is
  /// an oversize upload, not a malformed request.
  pub(crate) fn multipart(e: MultipartError, max_bytes: usize) -> Self {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
      Self::Upload(UploadRejection::ExceedsLimit { max: max_bytes })
    } else {
      Self::BadRequest(e.body_text())
    }
  }
}

impl From<std::io::Error> for ApiError {
  fn from(e: std::io::Error) -> Self { Self::Internal(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use armis_core::Error as Core;

    let (status, body) = match &self {
      ApiError::Core(Core::NotFound(id)) => (
        StatusCode::NOT_FOUND,
        json!({ "error": format!("profile {id} not found"), "state": "profile_not_available" }),
      ),
      ApiError::Core(Core::Validation(errors)) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": "validation failed", "fields": errors }),
      ),
      ApiError::Core(Core::InvalidIdentifier(_)) | ApiError::BadRequest(_) => {
        (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
      }
      ApiError::Core(Core::Store(e)) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "store unavailable" }))
      }
      ApiError::Upload(rejection) => {
        let status = match rejection {
          UploadRejection::TooLarge { .. } | UploadRejection::ExceedsLimit { .. } => {
            StatusCode::PAYLOAD_TOO_LARGE
          }
          UploadRejection::Empty | UploadRejection::UnsupportedType(_) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
          }
        };
        let message = rejection.to_string();
        (status, json!({ "success": false, "error": message, "message": message }))
      }
      ApiError::Internal(message) => {
        tracing::error!(error = %message, "internal failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal error" }))
      }
    };
    (status, Json(body)).into_response()
  }
}

/// Box a backend error into the core taxonomy.
pub(crate) fn store_error<E>(e: E) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  ApiError::Core(armis_core::Error::store(e))
}
