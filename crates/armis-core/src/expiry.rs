//! Day-count countdowns to expiry/due dates, bucketed into severity bands.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Severity of an upcoming (or past) expiry.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpiryBand {
  /// Within the urgent window, or already past.
  Urgent,
  Warning,
  Fine,
}

/// Band thresholds in calendar days (inclusive upper bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryBands {
  pub urgent_days:  i64,
  pub warning_days: i64,
}

impl Default for ExpiryBands {
  fn default() -> Self { Self { urgent_days: 30, warning_days: 90 } }
}

/// Whole calendar days until a target date and the band they fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
  /// Negative once the target date has passed.
  pub days_remaining: i64,
  pub band:           ExpiryBand,
}

impl Countdown {
  pub fn is_overdue(&self) -> bool { self.days_remaining < 0 }
}

/// Pure `(today, target) → Countdown` calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiryTracker {
  bands: ExpiryBands,
}

impl ExpiryTracker {
  pub fn new(bands: ExpiryBands) -> Self { Self { bands } }

  pub fn track(&self, today: NaiveDate, target: NaiveDate) -> Countdown {
    let days_remaining = target.signed_duration_since(today).num_days();
    Countdown { days_remaining, band: self.band_for(days_remaining) }
  }

  pub fn band_for(&self, days_remaining: i64) -> ExpiryBand {
    if days_remaining <= self.bands.urgent_days {
      ExpiryBand::Urgent
    } else if days_remaining <= self.bands.warning_days {
      ExpiryBand::Warning
    } else {
      ExpiryBand::Fine
    }
  }
}

// ─── Tracked items ───────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExpiryItem {
  SecurityClearance,
  MedicalExam,
  Certification,
}

/// A countdown attached to a specific profile item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryStatus {
  pub item:           ExpiryItem,
  /// Human-readable name, e.g. the certification title.
  pub label:          String,
  pub target_date:    NaiveDate,
  pub days_remaining: i64,
  pub band:           ExpiryBand,
}

impl ExpiryStatus {
  pub fn new(
    tracker: &ExpiryTracker,
    today: NaiveDate,
    item: ExpiryItem,
    label: impl Into<String>,
    target_date: NaiveDate,
  ) -> Self {
    let countdown = tracker.track(today, target_date);
    Self {
      item,
      label: label.into(),
      target_date,
      days_remaining: countdown.days_remaining,
      band: countdown.band,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 15).unwrap() }

  #[test]
  fn five_days_past_is_minus_five_and_urgent() {
    let tracker = ExpiryTracker::default();
    let countdown = tracker.track(today(), today() - Duration::days(5));
    assert_eq!(countdown.days_remaining, -5);
    assert_eq!(countdown.band, ExpiryBand::Urgent);
    assert!(countdown.is_overdue());
  }

  #[test]
  fn today_is_zero_and_urgent() {
    let countdown = ExpiryTracker::default().track(today(), today());
    assert_eq!(countdown.days_remaining, 0);
    assert_eq!(countdown.band, ExpiryBand::Urgent);
    assert!(!countdown.is_overdue());
  }

  #[test]
  fn band_boundaries_are_inclusive() {
    let tracker = ExpiryTracker::default();
    let band = |days| tracker.track(today(), today() + Duration::days(days)).band;
    assert_eq!(band(30), ExpiryBand::Urgent);
    assert_eq!(band(31), ExpiryBand::Warning);
    assert_eq!(band(90), ExpiryBand::Warning);
    assert_eq!(band(91), ExpiryBand::Fine);
    assert_eq!(band(3650), ExpiryBand::Fine);
  }

  #[test]
  fn distant_past_never_panics() {
    let ancient = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
    let countdown = ExpiryTracker::default().track(today(), ancient);
    assert!(countdown.days_remaining < 0);
    assert_eq!(countdown.band, ExpiryBand::Urgent);
  }

  #[test]
  fn custom_bands_are_respected() {
    let tracker = ExpiryTracker::new(ExpiryBands { urgent_days: 7, warning_days: 14 });
    assert_eq!(tracker.band_for(8), ExpiryBand::Warning);
    assert_eq!(tracker.band_for(15), ExpiryBand::Fine);
  }
}
