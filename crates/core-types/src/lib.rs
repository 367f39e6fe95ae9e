//! # Footfall Core Types
//!
//! The Layer 0 vocabulary of the system: the raw sales observations that
//! every other crate consumes, and the small date-range helper used by
//! filtering and period resolution.
//!
//! ## Architectural Principles
//!
//! - **No I/O:** This crate performs no file, network, or database access.
//!   It only defines data.
//! - **Nullable measures:** Every numeric measure on a [`SalesRecord`] is
//!   optional. A spreadsheet cell that failed numeric coercion arrives here
//!   as `None` and is reduced to zero at aggregation time, so one dirty cell
//!   never poisons a whole batch.

pub mod structs;

// Re-export the core types to provide a clean public API.
pub use structs::{DateRange, SalesRecord};
