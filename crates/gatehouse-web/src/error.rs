//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use gatehouse_core::guard::{Denial, Forbidden};
use serde_json::json;
use thiserror::Error;

/// An error returned by a handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No one is signed in; the client should send the user to `login_url`.
  #[error("sign-in required: {message}")]
  SignIn { message: String, login_url: String },

  #[error("forbidden: {}", .0.message)]
  Forbidden(Forbidden),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self { Self::Store(Box::new(e)) }

  /// Translate a guard denial, pointing sign-in prompts at `login_url`.
  pub fn denied(denial: Denial, login_url: &str) -> Self {
    match denial {
      Denial::SignIn(prompt) => Self::SignIn {
        message:   prompt.message,
        login_url: login_url.to_owned(),
      },
      Denial::Forbidden(f) => Self::Forbidden(f),
    }
  }
}

impl From<gatehouse_core::Error> for ApiError {
  fn from(e: gatehouse_core::Error) -> Self { Self::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::SignIn { message, login_url } => (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": message, "login_url": login_url })),
      )
        .into_response(),
      ApiError::Forbidden(f) => (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": f.message, "role": f.role, "required": f.required })),
      )
        .into_response(),
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
          .into_response()
      }
    }
  }
}
