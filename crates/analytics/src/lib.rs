//! # Footfall Analytics Engine
//!
//! This crate turns raw daily sales records into year-over-year comparative
//! metrics: period snapshots, relative deltas, per-section breakdowns, and
//! the chart series the presentation layer renders.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   storage or HTTP. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `MetricsEngine` is a stateless calculator.
//!   It takes in-memory record collections as input and produces snapshot and
//!   comparison structs as output. Each call is independent, which makes it
//!   highly reliable and easy to test.
//! - **Total Functions:** No operation here raises. Empty partitions become
//!   zero-valued snapshots, missing denominators become zero ratios, and a
//!   zero baseline becomes an explicit "no baseline" (`None`) delta.
//!
//! ## Public API
//!
//! - `MetricsEngine`: aggregation and comparison of record partitions.
//! - `MetricSnapshot` / `ComparisonResult` / `SectionComparison`: the derived
//!   metric structs, numeric-only; all formatting belongs to the caller.
//! - `period`: the equivalent-period resolver that selects the two partitions
//!   a comparison runs over.
//! - `series`: the monthly, daily, and heatmap series computations.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod period;
pub mod report;
pub mod series;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsEngine;
pub use period::{
    PartitionedRecords, PeriodFilter, PeriodMode, ResolvedPeriod, partition_equivalent_period,
    resolve_period,
};
pub use report::{ComparisonResult, MetricSnapshot, SectionComparison};
pub use series::{
    DailySummary, DayValue, HeatmapCell, MonthlyPoint, TopDays, daily_summaries,
    monthly_average_ticket, monthly_revenue, section_month_revenue, top_days,
};
