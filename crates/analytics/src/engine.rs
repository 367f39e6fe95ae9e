use crate::report::{ComparisonResult, MetricSnapshot, SectionComparison};
use core_types::SalesRecord;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// A stateless calculator for deriving comparative metrics from daily sales
/// records.
#[derive(Debug, Default)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregates a pre-filtered collection of records into one snapshot.
    ///
    /// The caller is responsible for partition selection (year label, date
    /// range, sections); this function only sums and derives. A record whose
    /// measure is `None` contributes zero to that sum.
    pub fn aggregate(&self, records: &[SalesRecord]) -> MetricSnapshot {
        let mut snapshot = MetricSnapshot::new();

        if records.is_empty() {
            // An empty partition is a defined, all-zero result.
            return snapshot;
        }

        snapshot.record_count = records.len();

        let mut dates: BTreeSet<chrono::NaiveDate> = BTreeSet::new();
        let mut conversion_sum = Decimal::ZERO;
        let mut conversion_samples: u32 = 0;

        for record in records {
            snapshot.total_revenue += record.revenue.unwrap_or(Decimal::ZERO);
            snapshot.total_visitors += record.visitor_count.unwrap_or(0);
            snapshot.total_transactions += record.transaction_count.unwrap_or(0);
            snapshot.total_items += record.item_count.unwrap_or(0);

            if let Some(rate) = record.conversion_rate {
                conversion_sum += rate;
                conversion_samples += 1;
            }

            dates.insert(record.date);
        }

        snapshot.days_with_data = dates.len();

        if snapshot.total_transactions > 0 {
            let transactions = Decimal::from(snapshot.total_transactions);
            snapshot.average_transaction_value = snapshot.total_revenue / transactions;
            snapshot.items_per_transaction =
                Decimal::from(snapshot.total_items) / transactions;
        }

        if conversion_samples > 0 {
            // Mean of the per-record rates, not a ratio of the sums.
            snapshot.conversion_rate = conversion_sum / Decimal::from(conversion_samples);
        }

        snapshot
    }

    /// Compares two snapshots. Order matters: the first argument is the
    /// reference the changes are expressed against.
    pub fn compare(
        &self,
        base: &MetricSnapshot,
        comparison: &MetricSnapshot,
    ) -> ComparisonResult {
        ComparisonResult {
            revenue_change_pct: relative_change(base.total_revenue, comparison.total_revenue),
            visitors_change_pct: relative_change(
                Decimal::from(base.total_visitors),
                Decimal::from(comparison.total_visitors),
            ),
            transactions_change_pct: relative_change(
                Decimal::from(base.total_transactions),
                Decimal::from(comparison.total_transactions),
            ),
            items_change_pct: relative_change(
                Decimal::from(base.total_items),
                Decimal::from(comparison.total_items),
            ),
            average_transaction_value_change_pct: relative_change(
                base.average_transaction_value,
                comparison.average_transaction_value,
            ),
            items_per_transaction_change_pct: relative_change(
                base.items_per_transaction,
                comparison.items_per_transaction,
            ),
            conversion_rate_change_points: comparison.conversion_rate - base.conversion_rate,
            base: base.clone(),
            comparison: comparison.clone(),
        }
    }

    /// Revenue comparison per section between two year labels.
    ///
    /// Emits one entry per section that has records in *both* partitions,
    /// sorted by section label. Sections present in only one partition are
    /// dropped from the breakdown.
    pub fn compare_by_section(
        &self,
        records: &[SalesRecord],
        base_year: i32,
        comparison_year: i32,
    ) -> Vec<SectionComparison> {
        let mut groups: BTreeMap<String, (Vec<SalesRecord>, Vec<SalesRecord>)> = BTreeMap::new();

        for record in records {
            let group = groups.entry(record.section.clone()).or_default();
            // Two independent checks so a shared label lands in both
            // partitions when the years are equal.
            if record.year == base_year {
                group.0.push(record.clone());
            }
            if record.year == comparison_year {
                group.1.push(record.clone());
            }
        }

        groups
            .into_iter()
            .filter(|(_, (base, comparison))| !base.is_empty() && !comparison.is_empty())
            .map(|(section, (base, comparison))| {
                let base_snapshot = self.aggregate(&base);
                let comparison_snapshot = self.aggregate(&comparison);
                SectionComparison {
                    section,
                    base_revenue: base_snapshot.total_revenue,
                    comparison_revenue: comparison_snapshot.total_revenue,
                    revenue_change_pct: relative_change(
                        base_snapshot.total_revenue,
                        comparison_snapshot.total_revenue,
                    ),
                }
            })
            .collect()
    }
}

/// Signed relative percentage change of `comparison` against `base`.
///
/// A zero base has no baseline to express the change against, so the result
/// is `None` rather than infinity.
fn relative_change(base: Decimal, comparison: Decimal) -> Option<Decimal> {
    if base.is_zero() {
        None
    } else {
        Some((comparison - base) / base * Decimal::from(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(section: &str, year: i32, revenue: Decimal) -> SalesRecord {
        SalesRecord {
            date: date(2024, 3, 1),
            section: section.to_string(),
            visitor_count: Some(50),
            revenue: Some(revenue),
            transaction_count: Some(10),
            item_count: Some(20),
            average_transaction_value: Some(revenue / dec!(10)),
            items_per_transaction: Some(dec!(2)),
            conversion_rate: Some(dec!(20)),
            year,
        }
    }

    #[test]
    fn aggregate_sums_revenue() {
        let engine = MetricsEngine::new();
        let records = vec![
            record("A", 2024, dec!(100)),
            record("A", 2024, dec!(250)),
            record("B", 2024, dec!(50)),
        ];
        let snapshot = engine.aggregate(&records);
        assert_eq!(snapshot.total_revenue, dec!(400));
        assert_eq!(snapshot.record_count, 3);
    }

    #[test]
    fn aggregate_of_empty_input_is_all_zero() {
        let snapshot = MetricsEngine::new().aggregate(&[]);
        assert_eq!(snapshot, MetricSnapshot::new());
        assert_eq!(snapshot.total_revenue, Decimal::ZERO);
        assert_eq!(snapshot.average_transaction_value, Decimal::ZERO);
        assert_eq!(snapshot.conversion_rate, Decimal::ZERO);
    }

    #[test]
    fn zero_transactions_yield_zero_ratios_without_panicking() {
        let mut r = record("A", 2024, dec!(100));
        r.transaction_count = Some(0);
        let snapshot = MetricsEngine::new().aggregate(&[r]);
        assert_eq!(snapshot.average_transaction_value, Decimal::ZERO);
        assert_eq!(snapshot.items_per_transaction, Decimal::ZERO);
    }

    #[test]
    fn none_measures_contribute_zero() {
        let mut dirty = record("A", 2024, dec!(100));
        dirty.revenue = None;
        dirty.visitor_count = None;
        dirty.conversion_rate = None;
        let clean = record("A", 2024, dec!(200));

        let snapshot = MetricsEngine::new().aggregate(&[dirty, clean]);
        assert_eq!(snapshot.total_revenue, dec!(200));
        assert_eq!(snapshot.total_visitors, 50);
        // Only the record carrying a rate participates in the mean.
        assert_eq!(snapshot.conversion_rate, dec!(20));
    }

    #[test]
    fn days_with_data_counts_distinct_dates() {
        let engine = MetricsEngine::new();
        let mut a = record("A", 2024, dec!(100));
        let mut b = record("B", 2024, dec!(100));
        let mut c = record("A", 2024, dec!(100));
        a.date = date(2024, 3, 1);
        b.date = date(2024, 3, 1);
        c.date = date(2024, 3, 2);
        let snapshot = engine.aggregate(&[a, b, c]);
        assert_eq!(snapshot.days_with_data, 2);
    }

    #[test]
    fn single_record_scenario_from_the_source() {
        let engine = MetricsEngine::new();
        let records = vec![record("A", 2024, dec!(100))];
        let snapshot = engine.aggregate(&records);

        assert_eq!(snapshot.total_revenue, dec!(100));
        assert_eq!(snapshot.average_transaction_value, dec!(10));
        assert_eq!(snapshot.items_per_transaction, dec!(2));
        assert_eq!(snapshot.conversion_rate, dec!(20));

        let result = engine.compare(&snapshot, &snapshot);
        assert_eq!(result.revenue_change_pct, Some(Decimal::ZERO));
        assert_eq!(result.visitors_change_pct, Some(Decimal::ZERO));
        assert_eq!(result.transactions_change_pct, Some(Decimal::ZERO));
        assert_eq!(result.items_change_pct, Some(Decimal::ZERO));
        assert_eq!(
            result.average_transaction_value_change_pct,
            Some(Decimal::ZERO)
        );
        assert_eq!(result.items_per_transaction_change_pct, Some(Decimal::ZERO));
        assert_eq!(result.conversion_rate_change_points, Decimal::ZERO);
    }

    #[test]
    fn fifty_percent_revenue_growth() {
        let engine = MetricsEngine::new();
        let mut base = MetricSnapshot::new();
        base.total_revenue = dec!(1000);
        let mut comparison = MetricSnapshot::new();
        comparison.total_revenue = dec!(1500);

        let result = engine.compare(&base, &comparison);
        assert_eq!(result.revenue_change_pct, Some(dec!(50)));
    }

    #[test]
    fn conversion_rate_uses_point_difference() {
        let engine = MetricsEngine::new();
        let mut base = MetricSnapshot::new();
        base.conversion_rate = dec!(20);
        let mut comparison = MetricSnapshot::new();
        comparison.conversion_rate = dec!(25);

        let result = engine.compare(&base, &comparison);
        // +5 points, not +25%.
        assert_eq!(result.conversion_rate_change_points, dec!(5));
    }

    #[test]
    fn zero_base_reports_no_baseline_instead_of_infinity() {
        let engine = MetricsEngine::new();
        let base = MetricSnapshot::new();
        let mut comparison = MetricSnapshot::new();
        comparison.total_revenue = dec!(1500);

        let result = engine.compare(&base, &comparison);
        assert_eq!(result.revenue_change_pct, None);
    }

    #[test]
    fn relative_change_is_antisymmetric_in_sign() {
        let engine = MetricsEngine::new();
        let mut a = MetricSnapshot::new();
        a.total_revenue = dec!(1000);
        let mut b = MetricSnapshot::new();
        b.total_revenue = dec!(1500);

        let forward = engine.compare(&a, &b).revenue_change_pct.unwrap();
        let backward = engine.compare(&b, &a).revenue_change_pct.unwrap();
        assert!(forward > Decimal::ZERO);
        assert!(backward < Decimal::ZERO);
        // Differing denominators: the magnitudes are not equal.
        assert_ne!(forward, -backward);
    }

    #[test]
    fn sections_in_one_partition_only_are_excluded() {
        let engine = MetricsEngine::new();
        let records = vec![
            record("Both", 2023, dec!(100)),
            record("Both", 2024, dec!(150)),
            record("BaseOnly", 2023, dec!(100)),
            record("ComparisonOnly", 2024, dec!(100)),
        ];

        let breakdown = engine.compare_by_section(&records, 2023, 2024);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].section, "Both");
        assert_eq!(breakdown[0].base_revenue, dec!(100));
        assert_eq!(breakdown[0].comparison_revenue, dec!(150));
        assert_eq!(breakdown[0].revenue_change_pct, Some(dec!(50)));
    }

    #[test]
    fn equal_year_labels_compare_a_partition_against_itself() {
        let engine = MetricsEngine::new();
        let records = vec![record("A", 2024, dec!(100))];
        let breakdown = engine.compare_by_section(&records, 2024, 2024);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].revenue_change_pct, Some(Decimal::ZERO));
    }

    #[test]
    fn breakdown_is_sorted_by_section_label() {
        let engine = MetricsEngine::new();
        let records = vec![
            record("Zapatos", 2023, dec!(10)),
            record("Zapatos", 2024, dec!(10)),
            record("Abrigos", 2023, dec!(10)),
            record("Abrigos", 2024, dec!(10)),
        ];
        let breakdown = engine.compare_by_section(&records, 2023, 2024);
        let labels: Vec<&str> = breakdown.iter().map(|s| s.section.as_str()).collect();
        assert_eq!(labels, vec!["Abrigos", "Zapatos"]);
    }
}
