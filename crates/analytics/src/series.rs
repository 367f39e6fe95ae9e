//! Chart and table series derived from record collections.
//!
//! Everything here follows the same contract as the engine: pure functions,
//! numeric-only outputs, and defined results for empty input.

use chrono::{Datelike, NaiveDate};
use core_types::SalesRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One point of a monthly series: a value for one month of one year label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub value: Decimal,
}

/// One cell of the section/month revenue matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub section: String,
    pub month: u32,
    pub revenue: Decimal,
}

/// Per-day sums for the day-by-day comparison tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub visitors: i64,
    pub transactions: i64,
    /// `revenue / transactions` for the day; zero when there are no
    /// transactions.
    pub average_transaction_value: Decimal,
}

/// A dated maximum within one partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayValue {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// The standout days of one partition. Each field is `None` when the
/// partition is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDays {
    pub revenue: Option<DayValue>,
    pub visitors: Option<DayValue>,
    pub average_transaction_value: Option<DayValue>,
}

/// Revenue summed per `(year, month)`, one point per populated month,
/// ordered by year then month.
pub fn monthly_revenue(records: &[SalesRecord]) -> Vec<MonthlyPoint> {
    let mut buckets: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for record in records {
        *buckets
            .entry((record.year, record.date.month()))
            .or_insert(Decimal::ZERO) += record.revenue.unwrap_or(Decimal::ZERO);
    }
    buckets
        .into_iter()
        .map(|((year, month), value)| MonthlyPoint { year, month, value })
        .collect()
}

/// Mean of the per-record `average_transaction_value` per `(year, month)`,
/// over records that carry one. Months where no record carries the value are
/// omitted, matching how the source charts left gaps for all-null groups.
pub fn monthly_average_ticket(records: &[SalesRecord]) -> Vec<MonthlyPoint> {
    let mut buckets: BTreeMap<(i32, u32), (Decimal, u32)> = BTreeMap::new();
    for record in records {
        if let Some(ticket) = record.average_transaction_value {
            let bucket = buckets
                .entry((record.year, record.date.month()))
                .or_insert((Decimal::ZERO, 0));
            bucket.0 += ticket;
            bucket.1 += 1;
        }
    }
    buckets
        .into_iter()
        .map(|((year, month), (sum, samples))| MonthlyPoint {
            year,
            month,
            value: sum / Decimal::from(samples),
        })
        .collect()
}

/// Revenue summed per `(section, month)` cell for one year label.
///
/// The grid covers every observed section crossed with every observed month;
/// a cell with no records is zero rather than absent. Cells are ordered by
/// section label, then month.
pub fn section_month_revenue(records: &[SalesRecord], year: i32) -> Vec<HeatmapCell> {
    let mut sums: BTreeMap<(String, u32), Decimal> = BTreeMap::new();
    let mut sections: BTreeSet<String> = BTreeSet::new();
    let mut months: BTreeSet<u32> = BTreeSet::new();

    for record in records.iter().filter(|r| r.year == year) {
        let month = record.date.month();
        sections.insert(record.section.clone());
        months.insert(month);
        *sums
            .entry((record.section.clone(), month))
            .or_insert(Decimal::ZERO) += record.revenue.unwrap_or(Decimal::ZERO);
    }

    let mut cells = Vec::with_capacity(sections.len() * months.len());
    for section in &sections {
        for &month in &months {
            let revenue = sums
                .get(&(section.clone(), month))
                .copied()
                .unwrap_or(Decimal::ZERO);
            cells.push(HeatmapCell {
                section: section.clone(),
                month,
                revenue,
            });
        }
    }
    cells
}

/// Per-day sums over the given records, ordered by date.
pub fn daily_summaries(records: &[SalesRecord]) -> Vec<DailySummary> {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, i64, i64)> = BTreeMap::new();
    for record in records {
        let bucket = buckets.entry(record.date).or_insert((Decimal::ZERO, 0, 0));
        bucket.0 += record.revenue.unwrap_or(Decimal::ZERO);
        bucket.1 += record.visitor_count.unwrap_or(0);
        bucket.2 += record.transaction_count.unwrap_or(0);
    }
    buckets
        .into_iter()
        .map(|(date, (revenue, visitors, transactions))| {
            let average_transaction_value = if transactions > 0 {
                revenue / Decimal::from(transactions)
            } else {
                Decimal::ZERO
            };
            DailySummary {
                date,
                revenue,
                visitors,
                transactions,
                average_transaction_value,
            }
        })
        .collect()
}

/// The days with the highest summed revenue, highest summed visitor count,
/// and highest daily average transaction value. Ties keep the earliest date.
pub fn top_days(records: &[SalesRecord]) -> TopDays {
    let summaries = daily_summaries(records);

    let pick = |value_of: &dyn Fn(&DailySummary) -> Decimal| -> Option<DayValue> {
        let mut best: Option<DayValue> = None;
        for summary in &summaries {
            let value = value_of(summary);
            let better = match &best {
                Some(current) => value > current.value,
                None => true,
            };
            if better {
                best = Some(DayValue {
                    date: summary.date,
                    value,
                });
            }
        }
        best
    };

    TopDays {
        revenue: pick(&|s| s.revenue),
        visitors: pick(&|s| Decimal::from(s.visitors)),
        average_transaction_value: pick(&|s| s.average_transaction_value),
    }
}
