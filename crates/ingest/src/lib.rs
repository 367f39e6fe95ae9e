//! # Footfall Ingest Pipeline
//!
//! Reads spreadsheet exports of daily sales and turns them into batches of
//! `SalesRecord` tagged with a caller-supplied year label.
//!
//! ## Architectural Principles
//!
//! - **Validate the shape, tolerate the cells:** a workbook missing any
//!   required column, or carrying an unparseable date, fails the whole batch
//!   with a specific error. A single malformed *numeric* cell never does; it
//!   coerces to `None` and contributes zero downstream.
//! - **No persistence:** this crate only parses. Appending the batch to the
//!   archive is the repository's job.
//!
//! ## Public API
//!
//! - `ingest_file` / `ingest_bytes`: open a workbook from disk or from an
//!   uploaded body and parse its rows.
//! - `records_from_range`: the parsing core, exposed for callers that already
//!   hold a cell range.
//! - `IngestError`: the specific error types that can be returned from this
//!   crate.

// Declare the modules that constitute this crate.
pub mod coerce;
pub mod error;
pub mod workbook;

// Re-export the key components to create a clean, public-facing API.
pub use error::IngestError;
pub use workbook::{REQUIRED_COLUMNS, ingest_bytes, ingest_file, records_from_range};
