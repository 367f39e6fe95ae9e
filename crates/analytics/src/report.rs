use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The aggregated metric values for one partition of sales records.
///
/// This struct is the output of `MetricsEngine::aggregate` and serves as the
/// data transfer object for period metrics throughout the system. Values are
/// plain numbers; currency symbols, separators, and percentage signs belong
/// to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    // I. Partition shape
    pub record_count: usize,
    /// Count of distinct calendar dates with at least one record.
    pub days_with_data: usize,

    // II. Sums
    pub total_revenue: Decimal,
    pub total_visitors: i64,
    pub total_transactions: i64,
    pub total_items: i64,

    // III. Derived ratios
    /// `total_revenue / total_transactions`; zero when there are no
    /// transactions.
    pub average_transaction_value: Decimal,
    /// `total_items / total_transactions`; zero when there are no
    /// transactions.
    pub items_per_transaction: Decimal,
    /// Mean of the per-record conversion percentages over records that carry
    /// one. Deliberately not recomputed from the visitor/transaction sums;
    /// the source dashboards averaged the per-row column.
    pub conversion_rate: Decimal,
}

impl MetricSnapshot {
    /// Creates a new, zeroed-out snapshot. This is the defined result for an
    /// empty partition.
    pub fn new() -> Self {
        Self {
            record_count: 0,
            days_with_data: 0,
            total_revenue: Decimal::ZERO,
            total_visitors: 0,
            total_transactions: 0,
            total_items: 0,
            average_transaction_value: Decimal::ZERO,
            items_per_transaction: Decimal::ZERO,
            conversion_rate: Decimal::ZERO,
        }
    }
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Two snapshots paired with the signed change of every metric.
///
/// Changes are relative percentages, except the conversion rate, which is an
/// absolute difference in percentage points. A `None` change means the base
/// value was zero and there is no baseline to express the change against;
/// it is never reported as infinity or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub base: MetricSnapshot,
    pub comparison: MetricSnapshot,

    pub revenue_change_pct: Option<Decimal>,
    pub visitors_change_pct: Option<Decimal>,
    pub transactions_change_pct: Option<Decimal>,
    pub items_change_pct: Option<Decimal>,
    pub average_transaction_value_change_pct: Option<Decimal>,
    pub items_per_transaction_change_pct: Option<Decimal>,
    /// Point difference, not percent-of-percent.
    pub conversion_rate_change_points: Decimal,
}

/// One entry of the by-section revenue breakdown.
///
/// Only sections with data in both year partitions are emitted, so the
/// revenue values are always real sums, never placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionComparison {
    pub section: String,
    pub base_revenue: Decimal,
    pub comparison_revenue: Decimal,
    /// `None` when the base revenue is zero.
    pub revenue_change_pct: Option<Decimal>,
}
