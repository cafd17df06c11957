//! Decision scheduling.
//!
//! - [`Frequency`]: Period granularity and period start dates

mod frequency;

pub use frequency::Frequency;
