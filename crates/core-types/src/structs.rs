use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of observed sales activity for a single day and a single section.
///
/// Every measure is optional: a spreadsheet cell that failed numeric coercion
/// on ingest arrives here as `None`. The aggregation layer reduces `None` to a
/// zero contribution, so a dirty cell degrades a single value instead of
/// failing the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Calendar day of the observation.
    pub date: NaiveDate,
    /// Department/category label. Free text; the set of known values grows
    /// as batches are loaded. Empty when the source cell was blank.
    pub section: String,
    /// Footfall count ("entradas").
    pub visitor_count: Option<i64>,
    /// Monetary sales amount for the day.
    pub revenue: Option<Decimal>,
    /// Completed purchases ("tickets").
    pub transaction_count: Option<i64>,
    /// Items sold.
    pub item_count: Option<i64>,
    /// Per-row average ticket value as supplied by the export.
    pub average_transaction_value: Option<Decimal>,
    /// Per-row items-per-ticket ratio as supplied by the export.
    pub items_per_transaction: Option<Decimal>,
    /// Per-row conversion percentage as supplied by the export.
    pub conversion_rate: Option<Decimal>,
    /// Year label attached at ingest time. Deliberately independent of the
    /// calendar year implied by `date`; users may attribute a batch to an
    /// arbitrary comparison year.
    pub year: i32,
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, swapping the endpoints when they arrive inverted.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The calendar month this range covers, if it starts and ends within
    /// the same month of the same year.
    pub fn single_month(&self) -> Option<u32> {
        if self.start.month() == self.end.month() && self.start.year() == self.end.year() {
            Some(self.start.month())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inverted_endpoints_are_swapped() {
        let range = DateRange::new(date(2024, 3, 15), date(2024, 3, 1));
        assert_eq!(range.start, date(2024, 3, 1));
        assert_eq!(range.end, date(2024, 3, 15));
    }

    #[test]
    fn contains_is_inclusive() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 15));
        assert!(range.contains(date(2024, 3, 1)));
        assert!(range.contains(date(2024, 3, 15)));
        assert!(!range.contains(date(2024, 3, 16)));
    }

    #[test]
    fn single_month_requires_same_month_and_year() {
        assert_eq!(
            DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).single_month(),
            Some(3)
        );
        assert_eq!(
            DateRange::new(date(2024, 3, 15), date(2024, 4, 15)).single_month(),
            None
        );
        // Same month number in different years is not a single month.
        assert_eq!(
            DateRange::new(date(2023, 3, 1), date(2024, 3, 31)).single_month(),
            None
        );
    }
}
