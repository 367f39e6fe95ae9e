use crate::coerce::{coerce_count, coerce_date, coerce_decimal, coerce_section, is_blank};
use crate::error::IngestError;
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use core_types::SalesRecord;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// The column headers a workbook must carry, matching the daily sales
/// exports this tool ingests. Header matching trims whitespace; extra
/// columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Fecha",
    "Secciones",
    "Entradas",
    "Venta",
    "Tickets",
    "Artículos",
    "Ticket promedio",
    "Artículos por ticket",
    "Tasa de conversión",
];

static EMPTY_CELL: Data = Data::Empty;

/// Parses a workbook from disk. The first worksheet is used unless `sheet`
/// names another one.
pub fn ingest_file(
    path: impl AsRef<Path>,
    year: i32,
    sheet: Option<&str>,
) -> Result<Vec<SalesRecord>, IngestError> {
    validate_year(year)?;
    let mut workbook = open_workbook_auto(path)?;
    let range = select_sheet(&mut workbook, sheet)?;
    records_from_range(&range, year)
}

/// Parses a workbook from an in-memory body, e.g. a multipart upload.
pub fn ingest_bytes(
    bytes: &[u8],
    year: i32,
    sheet: Option<&str>,
) -> Result<Vec<SalesRecord>, IngestError> {
    validate_year(year)?;
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = select_sheet(&mut workbook, sheet)?;
    records_from_range(&range, year)
}

/// Turns a cell range into records tagged with `year`.
///
/// The first row is the header. Blank rows are skipped; an unparseable date
/// fails the whole batch, while a malformed numeric cell only nulls its own
/// field.
pub fn records_from_range(range: &Range<Data>, year: i32) -> Result<Vec<SalesRecord>, IngestError> {
    let header = range
        .rows()
        .next()
        .ok_or_else(|| IngestError::MissingColumns(REQUIRED_COLUMNS.join(", ")))?;
    let positions = column_positions(header)?;

    let mut records = Vec::new();
    for (index, row) in range.rows().enumerate().skip(1) {
        if row.iter().all(is_blank) {
            // Trailing blank spreadsheet rows.
            continue;
        }

        let cell = |column: &str| cell_at(row, &positions, column);

        let date_cell = cell("Fecha");
        let date = coerce_date(date_cell).ok_or_else(|| IngestError::InvalidDate {
            // 1-based spreadsheet row number.
            row: index + 1,
            value: date_cell.to_string(),
        })?;

        records.push(SalesRecord {
            date,
            section: coerce_section(cell("Secciones")),
            visitor_count: coerce_count(cell("Entradas")),
            revenue: coerce_decimal(cell("Venta")),
            transaction_count: coerce_count(cell("Tickets")),
            item_count: coerce_count(cell("Artículos")),
            average_transaction_value: coerce_decimal(cell("Ticket promedio")),
            items_per_transaction: coerce_decimal(cell("Artículos por ticket")),
            conversion_rate: coerce_decimal(cell("Tasa de conversión")),
            year,
        });
    }

    tracing::info!(rows = records.len(), year, "parsed workbook rows");
    Ok(records)
}

fn cell_at<'a>(
    row: &'a [Data],
    positions: &HashMap<&'static str, usize>,
    column: &str,
) -> &'a Data {
    // A row shorter than the header reads as empty cells.
    row.get(positions[column]).unwrap_or(&EMPTY_CELL)
}

fn validate_year(year: i32) -> Result<(), IngestError> {
    if (2000..=2100).contains(&year) {
        Ok(())
    } else {
        Err(IngestError::YearOutOfRange(year))
    }
}

fn select_sheet<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    sheet: Option<&str>,
) -> Result<Range<Data>, IngestError> {
    let name = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|n| n == name) {
                return Err(IngestError::SheetNotFound(name.to_string()));
            }
            name.to_string()
        }
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(IngestError::EmptyWorkbook)?,
    };
    Ok(workbook.worksheet_range(&name)?)
}

/// Maps every required column name to its position in the header row.
/// Reports *all* missing names at once so a user can fix the export in one
/// pass.
fn column_positions(header: &[Data]) -> Result<HashMap<&'static str, usize>, IngestError> {
    let mut positions: HashMap<&'static str, usize> = HashMap::new();
    for (index, cell) in header.iter().enumerate() {
        let name = match cell {
            Data::String(text) => text.trim().to_string(),
            other => other.to_string(),
        };
        if let Some(required) = REQUIRED_COLUMNS.iter().find(|column| **column == name) {
            positions.entry(*required).or_insert(index);
        }
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !positions.contains_key(column))
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing.join(", ")));
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn header_row(range: &mut Range<Data>) {
        for (column, name) in REQUIRED_COLUMNS.iter().enumerate() {
            range.set_value((0, column as u32), Data::String(name.to_string()));
        }
    }

    fn data_row(range: &mut Range<Data>, row: u32, date: &str, section: &str, revenue: Data) {
        range.set_value((row, 0), Data::String(date.to_string()));
        range.set_value((row, 1), Data::String(section.to_string()));
        range.set_value((row, 2), Data::Int(50));
        range.set_value((row, 3), revenue);
        range.set_value((row, 4), Data::Int(10));
        range.set_value((row, 5), Data::Int(20));
        range.set_value((row, 6), Data::Float(10.0));
        range.set_value((row, 7), Data::Float(2.0));
        range.set_value((row, 8), Data::Float(20.0));
    }

    #[test]
    fn parses_a_well_formed_sheet() {
        let mut range = Range::new((0, 0), (2, 8));
        header_row(&mut range);
        data_row(&mut range, 1, "2024-03-01", "Perfumería", Data::Float(1500.0));
        data_row(&mut range, 2, "02/03/2024", "Zapatos", Data::Float(800.0));

        let records = records_from_range(&range, 2024).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(records[0].section, "Perfumería");
        assert_eq!(records[0].revenue, Some(dec!(1500)));
        assert_eq!(records[0].year, 2024);
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn missing_columns_fail_the_batch_listing_every_name() {
        let mut range = Range::new((0, 0), (1, 8));
        header_row(&mut range);
        // Break two headers.
        range.set_value((0, 0), Data::String("Dia".to_string()));
        range.set_value((0, 3), Data::String("Importe".to_string()));

        let error = records_from_range(&range, 2024).unwrap_err();
        match error {
            IngestError::MissingColumns(names) => {
                assert!(names.contains("Fecha"));
                assert!(names.contains("Venta"));
                assert!(!names.contains("Tickets"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn a_bad_numeric_cell_nulls_the_field_but_keeps_the_row() {
        let mut range = Range::new((0, 0), (1, 8));
        header_row(&mut range);
        data_row(
            &mut range,
            1,
            "2024-03-01",
            "Perfumería",
            Data::String("sin datos".to_string()),
        );

        let records = records_from_range(&range, 2024).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].revenue, None);
        assert_eq!(records[0].visitor_count, Some(50));
    }

    #[test]
    fn an_unparseable_date_fails_the_whole_batch() {
        let mut range = Range::new((0, 0), (2, 8));
        header_row(&mut range);
        data_row(&mut range, 1, "2024-03-01", "Perfumería", Data::Float(100.0));
        data_row(&mut range, 2, "not a date", "Zapatos", Data::Float(100.0));

        let error = records_from_range(&range, 2024).unwrap_err();
        match error {
            IngestError::InvalidDate { row, value } => {
                assert_eq!(row, 3);
                assert_eq!(value, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_rows_are_skipped() {
        let mut range = Range::new((0, 0), (3, 8));
        header_row(&mut range);
        data_row(&mut range, 1, "2024-03-01", "Perfumería", Data::Float(100.0));
        // Row 2 left entirely empty.
        data_row(&mut range, 3, "2024-03-02", "Zapatos", Data::Float(100.0));

        let records = records_from_range(&range, 2024).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn a_blank_section_cell_becomes_the_empty_label() {
        let mut range = Range::new((0, 0), (1, 8));
        header_row(&mut range);
        data_row(&mut range, 1, "2024-03-01", "  ", Data::Float(100.0));

        let records = records_from_range(&range, 2024).unwrap();
        assert_eq!(records[0].section, "");
    }

    #[test]
    fn the_year_label_is_bounded() {
        let error = ingest_bytes(&[], 1999, None).unwrap_err();
        assert!(matches!(error, IngestError::YearOutOfRange(1999)));
        let error = ingest_bytes(&[], 2101, None).unwrap_err();
        assert!(matches!(error, IngestError::YearOutOfRange(2101)));
    }
}
