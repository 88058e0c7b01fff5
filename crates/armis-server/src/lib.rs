//! HTTP server wiring for ARMIS.
//!
//! Mounts the [`armis_api`] router under `/api` behind HTTP Basic
//! authentication, plus an unauthenticated `/health` check.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use armis_api::{ApiConfig, ApiState, UploadLimits, api_router};
use armis_core::{scoring::ScoringPolicy, store::PersonnelStore};
use armis_cv::ExtractorConfig;
use axum::{Json, Router, middleware, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ARMIS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  pub upload_dir:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  #[serde(default)]
  pub scoring:            ScoringPolicy,
  #[serde(default)]
  pub uploads:            UploadLimits,
  #[serde(default)]
  pub extractors:         ExtractorConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

impl ServerConfig {
  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }

  /// API settings, with `upload_dir` replaced by its resolved form.
  pub fn api_config(&self, upload_dir: PathBuf) -> ApiConfig {
    ApiConfig {
      upload_dir,
      scoring: self.scoring.clone(),
      uploads: self.uploads,
      extractors: self.extractors.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S>(api: ApiState<S>, auth: AuthConfig) -> Router
where
  S: PersonnelStore + 'static,
{
  let api = api_router(api).route_layer(middleware::from_fn_with_state(Arc::new(auth), require_auth));
  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Integration tests ───────────────────────────────────────────────────────
