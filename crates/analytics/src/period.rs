//! Equivalent-period resolution.
//!
//! A comparison runs over two partitions of the record set: the comparison
//! year's records in the selected range, and the base year's records in the
//! *equivalent* period. When the selected range falls within one calendar
//! month, the whole month is compared; otherwise the range is transposed
//! onto the base year's calendar.

use chrono::{Datelike, NaiveDate};
use core_types::{DateRange, SalesRecord};
use serde::{Deserialize, Serialize};

/// How the equivalent period was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodMode {
    /// The requested range fell within a single calendar month. Partition
    /// membership matches on the month number alone, wherever that month
    /// appears on the date axis; year labels and calendar years may
    /// deliberately diverge.
    Month(u32),
    /// An arbitrary range. The comparison partition uses the range as given;
    /// the base partition uses the range transposed onto the base year's
    /// calendar.
    CustomRange,
}

/// The resolved period, echoed back to callers so they can describe the
/// comparison to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPeriod {
    pub mode: PeriodMode,
    /// Effective range on the base year's calendar.
    pub base_range: DateRange,
    /// Effective range on the comparison year's calendar.
    pub comparison_range: DateRange,
}

/// The user-driven filter state behind one comparison pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFilter {
    pub base_year: i32,
    pub comparison_year: i32,
    /// Range expressed on the comparison year's timeline.
    pub range: DateRange,
    /// `None` selects every section.
    pub sections: Option<Vec<String>>,
}

/// The two partitions a comparison runs over, plus the period that selected
/// them.
#[derive(Debug, Clone)]
pub struct PartitionedRecords {
    pub base: Vec<SalesRecord>,
    pub comparison: Vec<SalesRecord>,
    pub period: ResolvedPeriod,
}

/// Decides between month mode and custom-range mode for the given selection.
pub fn resolve_period(base_year: i32, comparison_year: i32, range: DateRange) -> ResolvedPeriod {
    if let Some(month) = range.single_month() {
        ResolvedPeriod {
            mode: PeriodMode::Month(month),
            base_range: full_month(base_year, month),
            comparison_range: full_month(comparison_year, month),
        }
    } else {
        ResolvedPeriod {
            mode: PeriodMode::CustomRange,
            base_range: DateRange::new(
                transpose_to_year(range.start, base_year),
                transpose_to_year(range.end, base_year),
            ),
            comparison_range: range,
        }
    }
}

/// Splits `records` into the base and comparison partitions for the filter.
///
/// The section filter applies to both partitions. When the year labels are
/// equal, both partitions hold the same records.
pub fn partition_equivalent_period(
    records: &[SalesRecord],
    filter: &PeriodFilter,
) -> PartitionedRecords {
    let period = resolve_period(filter.base_year, filter.comparison_year, filter.range);

    let section_selected = |record: &SalesRecord| match &filter.sections {
        Some(sections) => sections.iter().any(|s| s == &record.section),
        None => true,
    };

    let mut base = Vec::new();
    let mut comparison = Vec::new();

    for record in records {
        if !section_selected(record) {
            continue;
        }
        match period.mode {
            PeriodMode::Month(month) => {
                let in_month = record.date.month() == month;
                if in_month && record.year == filter.base_year {
                    base.push(record.clone());
                }
                if in_month && record.year == filter.comparison_year {
                    comparison.push(record.clone());
                }
            }
            PeriodMode::CustomRange => {
                if record.year == filter.base_year && period.base_range.contains(record.date) {
                    base.push(record.clone());
                }
                if record.year == filter.comparison_year
                    && period.comparison_range.contains(record.date)
                {
                    comparison.push(record.clone());
                }
            }
        }
    }

    tracing::debug!(
        mode = ?period.mode,
        base_records = base.len(),
        comparison_records = comparison.len(),
        "resolved equivalent period"
    );

    PartitionedRecords {
        base,
        comparison,
        period,
    }
}

/// Moves a date to another calendar year. February 29 transposed into a
/// non-leap year clamps to February 28.
fn transpose_to_year(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
        .unwrap_or(date)
}

fn full_month(year: i32, month: u32) -> DateRange {
    let start = NaiveDate::from_ymd_opt(year, month, 1);
    let end = start
        .and_then(|d| {
            // First day of the next month, stepped back one day.
            let (next_year, next_month) = if month == 12 {
                (year + 1, 1)
            } else {
                (year, month + 1)
            };
            NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|n| n.pred_opt())
        })
        .or(start);
    match (start, end) {
        (Some(start), Some(end)) => DateRange::new(start, end),
        // Out-of-range year/month input; fall back to a degenerate range.
        _ => DateRange::new(NaiveDate::MIN, NaiveDate::MIN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(section: &str, year: i32, when: NaiveDate) -> SalesRecord {
        SalesRecord {
            date: when,
            section: section.to_string(),
            visitor_count: Some(10),
            revenue: Some(dec!(100)),
            transaction_count: Some(5),
            item_count: Some(7),
            average_transaction_value: Some(dec!(20)),
            items_per_transaction: Some(Decimal::from(1)),
            conversion_rate: Some(dec!(50)),
            year,
        }
    }

    #[test]
    fn range_within_one_month_resolves_to_month_mode() {
        let period = resolve_period(2023, 2024, DateRange::new(date(2024, 3, 5), date(2024, 3, 20)));
        assert_eq!(period.mode, PeriodMode::Month(3));
        assert_eq!(period.base_range, DateRange::new(date(2023, 3, 1), date(2023, 3, 31)));
        assert_eq!(
            period.comparison_range,
            DateRange::new(date(2024, 3, 1), date(2024, 3, 31))
        );
    }

    #[test]
    fn spanning_months_resolves_to_custom_range() {
        let period = resolve_period(2023, 2024, DateRange::new(date(2024, 1, 15), date(2024, 2, 15)));
        assert_eq!(period.mode, PeriodMode::CustomRange);
        assert_eq!(period.base_range, DateRange::new(date(2023, 1, 15), date(2023, 2, 15)));
    }

    #[test]
    fn february_29_clamps_to_28_in_a_non_leap_base_year() {
        let period = resolve_period(2023, 2024, DateRange::new(date(2024, 2, 29), date(2024, 3, 15)));
        assert_eq!(period.mode, PeriodMode::CustomRange);
        assert_eq!(period.base_range.start, date(2023, 2, 28));
        assert_eq!(period.base_range.end, date(2023, 3, 15));
    }

    #[test]
    fn month_mode_matches_month_number_on_any_calendar_year() {
        // Year labels diverge from the calendar years on the date axis.
        let records = vec![
            record("A", 2023, date(2024, 3, 10)),
            record("A", 2024, date(2024, 3, 12)),
            record("A", 2024, date(2024, 4, 1)),
        ];
        let filter = PeriodFilter {
            base_year: 2023,
            comparison_year: 2024,
            range: DateRange::new(date(2024, 3, 1), date(2024, 3, 31)),
            sections: None,
        };

        let partitioned = partition_equivalent_period(&records, &filter);
        assert_eq!(partitioned.base.len(), 1);
        assert_eq!(partitioned.comparison.len(), 1);
        assert_eq!(partitioned.comparison[0].date, date(2024, 3, 12));
    }

    #[test]
    fn custom_range_partitions_by_transposed_base_range() {
        let records = vec![
            record("A", 2023, date(2023, 1, 20)),
            record("A", 2023, date(2023, 3, 1)),
            record("A", 2024, date(2024, 2, 1)),
        ];
        let filter = PeriodFilter {
            base_year: 2023,
            comparison_year: 2024,
            range: DateRange::new(date(2024, 1, 15), date(2024, 2, 15)),
            sections: None,
        };

        let partitioned = partition_equivalent_period(&records, &filter);
        assert_eq!(partitioned.base.len(), 1);
        assert_eq!(partitioned.base[0].date, date(2023, 1, 20));
        assert_eq!(partitioned.comparison.len(), 1);
        assert_eq!(partitioned.comparison[0].date, date(2024, 2, 1));
    }

    #[test]
    fn section_filter_applies_to_both_partitions() {
        let records = vec![
            record("Keep", 2023, date(2023, 3, 1)),
            record("Drop", 2023, date(2023, 3, 1)),
            record("Keep", 2024, date(2024, 3, 1)),
            record("Drop", 2024, date(2024, 3, 1)),
        ];
        let filter = PeriodFilter {
            base_year: 2023,
            comparison_year: 2024,
            range: DateRange::new(date(2024, 3, 1), date(2024, 3, 31)),
            sections: Some(vec!["Keep".to_string()]),
        };

        let partitioned = partition_equivalent_period(&records, &filter);
        assert!(partitioned.base.iter().all(|r| r.section == "Keep"));
        assert!(partitioned.comparison.iter().all(|r| r.section == "Keep"));
    }

    #[test]
    fn equal_year_labels_put_the_same_records_in_both_partitions() {
        let records = vec![record("A", 2024, date(2024, 3, 1))];
        let filter = PeriodFilter {
            base_year: 2024,
            comparison_year: 2024,
            range: DateRange::new(date(2024, 3, 1), date(2024, 3, 31)),
            sections: None,
        };

        let partitioned = partition_equivalent_period(&records, &filter);
        assert_eq!(partitioned.base, partitioned.comparison);
        assert_eq!(partitioned.base.len(), 1);
    }
}
