//! Dialect-polymorphic decoders for TAC aviation weather reports.
//!
//! Three decoders share one architecture: an ordered-choice token scanner
//! drives a hand-written grammar whose semantic actions fill a typed report
//! record. Decoding never fails — a report that cannot be fully parsed is
//! returned with its `err_msg` field describing the expected-token set and
//! the furthest offset reached.
//!
//! - [`metar::decode_annex3`]: ICAO Annex 3 international METAR/SPECI.
//!   Remarks are stripped before parsing; unidentified content renders the
//!   report invalid.
//! - [`metar::decode_fmh1`]: US FMH-1 METAR/SPECI with a first-class
//!   remarks grammar and an unparsed/additive text split.
//! - [`taf::decode`]: TAF forecasts with FM/BECMG/TEMPO/PROB change groups.
//!
//! Each decode call builds a fresh parser; no state crosses calls, so
//! independent reports may be decoded concurrently.

pub mod locations;
pub mod metar;
pub mod report;
mod remarks;
mod scanner;
pub mod taf;
mod tokens;

pub use metar::{decode_annex3, decode_fmh1};
pub use report::Report;
pub use taf::TafReport;
