//! Read-only aggregate reports for the administrative dashboards.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  PersonId,
  expiry::{ExpiryBand, ExpiryItem, ExpiryTracker},
  profile::{Gender, MaritalStatus, ServiceStatus},
};

/// Dimension for staff head-count reports.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupBy {
  Rank,
  Unit,
  Corps,
  Gender,
  ServiceStatus,
  MaritalStatus,
}

impl GroupBy {
  /// Report label for a stored value. Enumerated dimensions are normalised
  /// (`"F"` and `"Female"` both count as `female`); blank or unrecognised
  /// values are [`UNSPECIFIED`].
  pub fn label(self, value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
      return UNSPECIFIED.to_owned();
    };
    let label = match self {
      Self::Rank | Self::Unit | Self::Corps => Some(value.to_owned()),
      Self::Gender => value.parse::<Gender>().ok().map(|v| v.to_string()),
      Self::ServiceStatus => value.parse::<ServiceStatus>().ok().map(|v| v.to_string()),
      Self::MaritalStatus => value.parse::<MaritalStatus>().ok().map(|v| v.to_string()),
    };
    label.unwrap_or_else(|| UNSPECIFIED.to_owned())
  }
}

/// Fold raw `(value, count)` groups into report rows ordered by count
/// descending, then label.
pub fn tally(
  group: GroupBy,
  groups: impl IntoIterator<Item = (Option<String>, u64)>,
) -> Vec<ReportRow> {
  let mut counts: BTreeMap<String, u64> = BTreeMap::new();
  for (value, count) in groups {
    *counts.entry(group.label(value.as_deref())).or_default() += count;
  }
  let mut rows: Vec<ReportRow> =
    counts.into_iter().map(|(label, count)| ReportRow { label, count }).collect();
  rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
  rows
}

/// One row of a head-count report. Missing values are labelled
/// [`UNSPECIFIED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
  pub label: String,
  pub count: u64,
}

pub const UNSPECIFIED: &str = "Unspecified";

/// A dated item that expires, as listed by a [`crate::store::ReportStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryEntry {
  pub person_id: PersonId,
  pub item:      ExpiryItem,
  pub date:      NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
  pub overdue: u64,
  pub urgent:  u64,
  pub warning: u64,
  pub fine:    u64,
}

/// Expiry band counts per tracked item type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessSummary {
  pub as_of:              Option<NaiveDate>,
  pub security_clearance: BandCounts,
  pub medical_exam:       BandCounts,
  pub certification:      BandCounts,
}

impl ReadinessSummary {
  /// Bucket `entries` by item type and band as of `today`. Overdue entries
  /// are also counted as urgent.
  pub fn build(tracker: &ExpiryTracker, today: NaiveDate, entries: &[ExpiryEntry]) -> Self {
    let mut summary = Self { as_of: Some(today), ..Self::default() };
    for entry in entries {
      let countdown = tracker.track(today, entry.date);
      let counts = match entry.item {
        ExpiryItem::SecurityClearance => &mut summary.security_clearance,
        ExpiryItem::MedicalExam => &mut summary.medical_exam,
        ExpiryItem::Certification => &mut summary.certification,
      };
      if countdown.is_overdue() {
        counts.overdue += 1;
      }
      match countdown.band {
        ExpiryBand::Urgent => counts.urgent += 1,
        ExpiryBand::Warning => counts.warning += 1,
        ExpiryBand::Fine => counts.fine += 1,
      }
    }
    summary
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  #[test]
  fn buckets_entries_by_item_and_band() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let entry = |item, days| ExpiryEntry { person_id: 1, item, date: today + Duration::days(days) };
    let entries = vec![
      entry(ExpiryItem::SecurityClearance, -3),
      entry(ExpiryItem::SecurityClearance, 10),
      entry(ExpiryItem::SecurityClearance, 60),
      entry(ExpiryItem::MedicalExam, 400),
    ];

    let summary = ReadinessSummary::build(&ExpiryTracker::default(), today, &entries);
    assert_eq!(
      summary.security_clearance,
      BandCounts { overdue: 1, urgent: 2, warning: 1, fine: 0 }
    );
    assert_eq!(summary.medical_exam, BandCounts { fine: 1, ..BandCounts::default() });
    assert_eq!(summary.certification, BandCounts::default());
  }

  #[test]
  fn tally_merges_spellings_and_orders_rows() {
    let rows = tally(GroupBy::Gender, [
      (Some("F".to_owned()), 2),
      (Some("female".to_owned()), 1),
      (Some("Male".to_owned()), 4),
      (None, 1),
      (Some("unknown".to_owned()), 2),
    ]);
    let rows: Vec<(&str, u64)> = rows.iter().map(|r| (r.label.as_str(), r.count)).collect();
    assert_eq!(rows, [("male", 4), (UNSPECIFIED, 3), ("female", 3)]);
  }

  #[test]
  fn free_text_dimensions_keep_their_values() {
    assert_eq!(GroupBy::Corps.label(Some(" Signals ")), "Signals");
    assert_eq!(GroupBy::Rank.label(Some("")), UNSPECIFIED);
  }

  #[test]
  fn group_by_parses_query_values() {
    assert_eq!("service_status".parse::<GroupBy>().unwrap(), GroupBy::ServiceStatus);
    assert!("shoe_size".parse::<GroupBy>().is_err());
  }
}
