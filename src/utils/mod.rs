pub mod label;
pub mod pattern;
pub mod sparse;
