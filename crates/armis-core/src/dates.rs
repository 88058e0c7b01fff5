//! Date derivations shared by the aggregator and scorer.

use chrono::NaiveDate;

/// Average Gregorian year length used for age and service computations.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// `floor(elapsed days / 365.25)` between `from` and `today`.
///
/// A `from` date after `today` yields `0`; durations are never negative.
pub fn whole_years(from: NaiveDate, today: NaiveDate) -> u32 {
  let days = today.signed_duration_since(from).num_days();
  if days <= 0 {
    return 0;
  }
  (days as f64 / DAYS_PER_YEAR).floor() as u32
}

/// [`whole_years`] for an optional source date; `None` means "N/A".
pub fn years_since(from: Option<NaiveDate>, today: NaiveDate) -> Option<u32> {
  from.map(|d| whole_years(d, today))
}

/// Accepted textual date layouts, most common first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Parse a date in any of the layouts found in legacy records.
///
/// Zero dates (`0000-00-00`) and blanks are treated as absent.
pub fn parse_loose_date(input: &str) -> Option<NaiveDate> {
  let trimmed = input.trim();
  if trimmed.is_empty() || trimmed.starts_with("0000") {
    return None;
  }
  // Drop a trailing time component, e.g. "1990-01-01 00:00:00".
  let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}
