//! Core types and services for the ARMIS personnel-records portal.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the unified `PersonProfile` read model, the store capability traits that
//! backends implement, and the pure logic layered on top of them: field-name
//! normalisation, date derivations, expiry tracking, completion scoring,
//! profile aggregation and the user-gated CV data applier.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod apply;
pub mod canonical;
pub mod context;
pub mod dates;
pub mod draft;
pub mod error;
pub mod expiry;
pub mod profile;
pub mod report;
pub mod scoring;
pub mod store;
pub mod validate;

#[cfg(test)]
mod mock;

pub use error::{Error, Result};

/// Identifier of a person record (the `staff` row id in relational backends).
pub type PersonId = i64;

/// Parse a person identifier as it arrives from a URL or form field.
pub fn parse_person_id(raw: &str) -> Result<PersonId> {
  raw
    .trim()
    .parse::<PersonId>()
    .ok()
    .filter(|id| *id > 0)
    .ok_or_else(|| Error::InvalidIdentifier(raw.to_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn person_ids_must_be_positive_integers() {
    assert_eq!(parse_person_id(" 42 ").unwrap(), 42);
    assert!(matches!(parse_person_id("abc"), Err(Error::InvalidIdentifier(_))));
    assert!(matches!(parse_person_id("0"), Err(Error::InvalidIdentifier(_))));
    assert!(matches!(parse_person_id("1.5"), Err(Error::InvalidIdentifier(_))));
  }
}
