//! Common types and utilities shared across the TAC → IWXXM translation crates.

pub mod error;
pub mod ids;
pub mod span;
pub mod station;
pub mod time;
pub mod units;
pub mod xml;

pub use error::{TacError, TacResult};
pub use ids::gml_id;
pub use span::{Position, Span};
pub use station::Station;
pub use units::{cardinal_to_degrees, rvr_in_metres, visibility_in_metres, LengthUnit};
pub use xml::XmlElement;
