//! The [`Ctx`] extractor.

use std::convert::Infallible;

use armis_core::context::RequestContext;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;

/// The request's [`RequestContext`], as inserted by the authentication layer.
/// Requests that reach the API without one act as `anonymous` with today's
/// UTC date.
pub struct Ctx(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let ctx = parts
      .extensions
      .get::<RequestContext>()
      .cloned()
      .unwrap_or_else(|| RequestContext::new("anonymous", Utc::now().date_naive()));
    Ok(Ctx(ctx))
  }
}
