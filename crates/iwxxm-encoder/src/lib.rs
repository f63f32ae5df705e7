//! IWXXM 3.0 encoders for decoded TAC reports.
//!
//! The encoders walk a decoded report record into a schema-rooted XML
//! document. Three rules hold throughout:
//!
//! - Element order is fixed by the target schema, and mandatory elements
//!   are always emitted — a missing source datum becomes a nil-reason
//!   attribute, never an omission.
//! - Code-registry elements resolve their TAC token against the WMO
//!   vocabulary tables loaded at encoder construction; unmatched tokens
//!   fall back to a generic entry that preserves the original text.
//! - Every timestamp comes from the caller-supplied clock or the decoded
//!   record, never from the wall clock.

pub mod codes;
pub mod config;
pub mod fmh1;
pub mod metar;
pub mod taf;

pub use codes::{CodeEntry, CodeRegistry};
pub use config::TranslationConfig;
pub use metar::MetarEncoder;
pub use taf::TafEncoder;
