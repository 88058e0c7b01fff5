//! Request-scoped context passed explicitly into core operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Who is asking, and what "today" means for every date derivation made on
/// their behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
  /// Authenticated principal, or `"anonymous"` / `"system"`.
  pub actor: String,
  pub today: NaiveDate,
}

impl RequestContext {
  pub fn new(actor: impl Into<String>, today: NaiveDate) -> Self {
    Self { actor: actor.into(), today }
  }

  /// Context for internal jobs and tests that act without a user.
  pub fn system(today: NaiveDate) -> Self { Self::new("system", today) }
}
