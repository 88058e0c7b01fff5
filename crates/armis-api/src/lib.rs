//! JSON REST API for ARMIS personnel profiles.
//!
//! Exposes an axum [`Router`] backed by any [`PersonnelStore`]. Auth, TLS
//! and transport concerns are the caller's responsibility; an upstream layer
//! may insert a [`armis_core::context::RequestContext`] into the request
//! extensions to identify the actor.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", armis_api::api_router(state))
//! ```

pub mod context;
pub mod cv;
pub mod error;
pub mod files;
pub mod photo;
pub mod profiles;
pub mod reports;

use std::{path::PathBuf, sync::Arc};

use armis_core::{
  aggregate::ProfileAggregator, apply::ProfileDataApplier, scoring::ScoringPolicy,
  store::PersonnelStore,
};
use armis_cv::{
  CvExtractor, DocumentExtractors, ExtractorConfig, UploadPolicy,
  upload::{CV_MAX_BYTES, PHOTO_MAX_BYTES},
};
use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use serde::{Deserialize, Serialize};

pub use error::ApiError;
use files::UploadStore;

/// Multipart framing allowance on top of the largest file cap.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
  pub cv_max_bytes:    usize,
  pub photo_max_bytes: usize,
}

impl Default for UploadLimits {
  fn default() -> Self { Self { cv_max_bytes: CV_MAX_BYTES, photo_max_bytes: PHOTO_MAX_BYTES } }
}

/// Everything the API needs besides the store.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// CV and photo files are written under `cv/` and `photo/` here.
  pub upload_dir: PathBuf,
  pub scoring:    ScoringPolicy,
  pub uploads:    UploadLimits,
  pub extractors: ExtractorConfig,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:        Arc<S>,
  pub aggregator:   ProfileAggregator<S>,
  pub applier:      ProfileDataApplier<S>,
  pub extractor:    CvExtractor,
  pub files:        UploadStore,
  pub cv_policy:    UploadPolicy,
  pub photo_policy: UploadPolicy,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:        self.store.clone(),
      aggregator:   self.aggregator.clone(),
      applier:      self.applier.clone(),
      extractor:    self.extractor.clone(),
      files:        self.files.clone(),
      cv_policy:    self.cv_policy.clone(),
      photo_policy: self.photo_policy.clone(),
    }
  }
}

impl<S: PersonnelStore> ApiState<S> {
  pub fn new(store: Arc<S>, config: ApiConfig) -> Self {
    Self {
      aggregator:   ProfileAggregator::new(store.clone(), config.scoring),
      applier:      ProfileDataApplier::new(store.clone()),
      extractor:    CvExtractor::new(Arc::new(DocumentExtractors::from_config(
        &config.extractors,
      ))),
      files:        UploadStore::new(config.upload_dir),
      cv_policy:    UploadPolicy::cv(config.uploads.cv_max_bytes),
      photo_policy: UploadPolicy::photo(config.uploads.photo_max_bytes),
      store,
    }
  }

  fn body_limit(&self) -> usize {
    self.cv_policy.max_bytes.max(self.photo_policy.max_bytes) + MULTIPART_OVERHEAD
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: PersonnelStore + 'static,
{
  let body_limit = state.body_limit();
  Router::new()
    // Profiles
    .route(
      "/profiles/{id}",
      get(profiles::get_one::<S>).delete(profiles::delete_one::<S>),
    )
    .route("/profiles/{id}/readiness", get(profiles::readiness::<S>))
    .route("/profiles/{id}/personal", axum::routing::put(profiles::update_personal::<S>))
    .route(
      "/profiles/{id}/family",
      post(profiles::add_family::<S>).put(profiles::replace_family::<S>),
    )
    // Uploads
    .route("/profiles/{id}/cv", post(cv::upload::<S>))
    .route("/profiles/{id}/cv/apply", post(cv::apply::<S>))
    .route("/profiles/{id}/photo", post(photo::upload::<S>))
    // Reports
    .route("/reports/staff", get(reports::staff::<S>))
    .route("/reports/readiness", get(reports::readiness::<S>))
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}
