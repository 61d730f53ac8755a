//! Field extraction from delivery-note text.

mod fields;
pub mod patterns;

pub use fields::FieldExtractor;
