//! Profile completion and deployment-readiness scoring.
//!
//! The whole policy lives in [`ScoringPolicy`]: required fields, the weight
//! of each collection, the readiness threshold and the expiry bands. It
//! deserialises from configuration. The defaults below are the canonical
//! policy:
//!
//! | Component | Points |
//! |-----------|--------|
//! | required fields (9, equal weight) | 80 × present / 9 |
//! | ≥1 education record | +10 |
//! | ≥1 training record | +10 |
//! | ≥1 family member | +10 |
//! | ≥1 contact method | +5 |
//! | ≥1 address | +5 |
//!
//! The total is clamped to `[0, 100]` and rounded to the nearest integer.
//! Deployment readiness additionally requires completion ≥ 80.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  expiry::ExpiryBands,
  profile::{Assignment, Identity, PersonProfile, is_filled},
};

// ─── Policy table ────────────────────────────────────────────────────────────

/// A field counted toward the base completion score.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequiredField {
  /// Both first and last name.
  Name,
  DateOfBirth,
  Gender,
  Email,
  Phone,
  NationalId,
  Rank,
  Unit,
  MaritalStatus,
  ServiceNumber,
  Nationality,
  Religion,
  Corps,
  EnlistmentDate,
  /// Rank and unit together, for tables that weigh the posting as one field.
  Assignment,
}

impl RequiredField {
  pub fn is_present(self, identity: &Identity, assignment: &Assignment) -> bool {
    match self {
      Self::Name => is_filled(&identity.first_name) && is_filled(&identity.last_name),
      Self::DateOfBirth => identity.date_of_birth.is_some(),
      Self::Gender => identity.gender.is_some(),
      Self::Email => is_filled(&identity.email),
      Self::Phone => is_filled(&identity.phone),
      Self::NationalId => is_filled(&identity.national_id),
      Self::Rank => assignment.has_rank(),
      Self::Unit => assignment.has_unit(),
      Self::MaritalStatus => identity.marital_status.is_some(),
      Self::ServiceNumber => is_filled(&identity.service_number),
      Self::Nationality => is_filled(&identity.nationality),
      Self::Religion => is_filled(&identity.religion),
      Self::Corps => is_filled(&assignment.corps),
      Self::EnlistmentDate => assignment.enlistment_date.is_some(),
      Self::Assignment => assignment.has_rank() && assignment.has_unit(),
    }
  }
}

/// A child collection whose non-emptiness earns bonus points.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BonusSource {
  Education,
  Training,
  FamilyMembers,
  ContactMethods,
  Addresses,
  Skills,
  Certifications,
  Awards,
  Deployments,
  ServiceHistory,
}

impl BonusSource {
  pub fn count(self, profile: &PersonProfile) -> usize {
    match self {
      Self::Education => profile.education.len(),
      Self::Training => profile.training.len(),
      Self::FamilyMembers => profile.family_members.len(),
      Self::ContactMethods => profile.contact_methods.len(),
      Self::Addresses => profile.addresses.len(),
      Self::Skills => profile.skills.len(),
      Self::Certifications => profile.certifications.len(),
      Self::Awards => profile.awards.len(),
      Self::Deployments => profile.deployments.len(),
      Self::ServiceHistory => profile.service_history.len(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bonus {
  pub source: BonusSource,
  pub points: f64,
}

/// The complete, substitutable scoring table.
///
/// The default weighs rank and unit as two fields, so an identity with name,
/// date of birth, gender, rank and unit scores 5 of 9 (44%). A table that
/// counts the posting once and adds the service number scores the same
/// identity 4 of 9 (36%):
///
/// ```toml
/// [scoring]
/// required_fields = [
///   "name", "date_of_birth", "gender", "email", "phone",
///   "national_id", "assignment", "marital_status", "service_number",
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
  pub required_fields:      Vec<RequiredField>,
  /// Points shared equally among `required_fields`.
  pub required_weight:      f64,
  pub bonuses:              Vec<Bonus>,
  /// Minimum completion percentage for deployment readiness.
  pub deployment_threshold: u8,
  pub expiry:               ExpiryBands,
}

impl Default for ScoringPolicy {
  fn default() -> Self {
    use BonusSource as B;
    use RequiredField as F;
    Self {
      required_fields:      vec![
        F::Name,
        F::DateOfBirth,
        F::Gender,
        F::Email,
        F::Phone,
        F::NationalId,
        F::Rank,
        F::Unit,
        F::MaritalStatus,
      ],
      required_weight:      80.0,
      bonuses:              vec![
        Bonus { source: B::Education, points: 10.0 },
        Bonus { source: B::Training, points: 10.0 },
        Bonus { source: B::FamilyMembers, points: 10.0 },
        Bonus { source: B::ContactMethods, points: 5.0 },
        Bonus { source: B::Addresses, points: 5.0 },
      ],
      deployment_threshold: 80,
      expiry:               ExpiryBands::default(),
    }
  }
}

// ─── Assessment ──────────────────────────────────────────────────────────────

/// Why a person is not deployment ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReadinessBlocker {
  IncompleteProfile { completion: u8, threshold: u8 },
  NoMedicalRecord,
  MedicallyIneligible,
  NoSecurityClearance,
  ClearanceExpired,
  OverdueMandatoryTraining { courses: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
  pub completion_percent: u8,
  pub deployment_ready:   bool,
  pub blockers:           Vec<ReadinessBlocker>,
}

// ─── Scorer ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CompletionScorer {
  policy: ScoringPolicy,
}

impl Default for CompletionScorer {
  fn default() -> Self { Self::new(ScoringPolicy::default()) }
}

impl CompletionScorer {
  /// Build a scorer. Repeated required fields count once; negative or
  /// non-finite weights count as zero.
  pub fn new(mut policy: ScoringPolicy) -> Self {
    let mut seen = Vec::with_capacity(policy.required_fields.len());
    policy.required_fields.retain(|field| {
      let first = !seen.contains(field);
      seen.push(*field);
      first
    });
    policy.required_weight = sanitize(policy.required_weight);
    for bonus in &mut policy.bonuses {
      bonus.points = sanitize(bonus.points);
    }
    Self { policy }
  }

  pub fn policy(&self) -> &ScoringPolicy { &self.policy }

  /// Unrounded completion score in `[0, 100]`.
  pub fn completion_score(&self, profile: &PersonProfile) -> f64 {
    let required = &self.policy.required_fields;
    let base = if required.is_empty() {
      0.0
    } else {
      let present = required
        .iter()
        .filter(|field| field.is_present(&profile.identity, &profile.assignment))
        .count();
      present as f64 / required.len() as f64 * self.policy.required_weight
    };

    let bonus: f64 = self
      .policy
      .bonuses
      .iter()
      .filter(|bonus| bonus.source.count(profile) > 0)
      .map(|bonus| bonus.points)
      .sum();

    let total = base + bonus;
    if total.is_finite() { total.clamp(0.0, 100.0) } else { 0.0 }
  }

  pub fn completion_percent(&self, profile: &PersonProfile) -> u8 {
    self.completion_score(profile).round() as u8
  }

  /// Completion plus deployment readiness as of `today`.
  pub fn assess(&self, profile: &PersonProfile, today: NaiveDate) -> Assessment {
    let completion = self.completion_percent(profile);
    let mut blockers = Vec::new();

    if completion < self.policy.deployment_threshold {
      blockers.push(ReadinessBlocker::IncompleteProfile {
        completion,
        threshold: self.policy.deployment_threshold,
      });
    }

    match &profile.medical_readiness {
      None => blockers.push(ReadinessBlocker::NoMedicalRecord),
      Some(medical) if !medical.deployment_eligible => {
        blockers.push(ReadinessBlocker::MedicallyIneligible)
      }
      Some(_) => {}
    }

    match &profile.security_clearance {
      None => blockers.push(ReadinessBlocker::NoSecurityClearance),
      Some(clearance) if clearance.is_expired(today) => {
        blockers.push(ReadinessBlocker::ClearanceExpired)
      }
      Some(_) => {}
    }

    let overdue: Vec<String> = profile
      .training
      .iter()
      .filter(|t| t.mandatory && t.is_overdue(today))
      .map(|t| t.course_name.clone())
      .collect();
    if !overdue.is_empty() {
      blockers.push(ReadinessBlocker::OverdueMandatoryTraining { courses: overdue });
    }

    Assessment {
      completion_percent: completion,
      deployment_ready: blockers.is_empty(),
      blockers,
    }
  }
}

fn sanitize(points: f64) -> f64 {
  if points.is_finite() { points.max(0.0) } else { 0.0 }
}
