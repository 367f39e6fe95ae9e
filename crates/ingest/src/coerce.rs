//! Cell-level coercion rules.
//!
//! Numeric cells coerce fail-to-null: a value that cannot be read as the
//! target type becomes `None` instead of failing the row or the batch.

use calamine::{Data, DataType};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Reads a monetary or ratio cell. Floats and integers convert directly,
/// numeric text parses after trimming, everything else is `None`.
pub fn coerce_decimal(cell: &Data) -> Option<Decimal> {
    match cell {
        Data::Float(value) => Decimal::from_f64_retain(*value),
        Data::Int(value) => Some(Decimal::from(*value)),
        Data::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a count cell. A float with a fractional part is malformed for a
/// count and coerces to `None`.
pub fn coerce_count(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(value) => Some(*value),
        Data::Float(value) if value.is_finite() && value.fract() == 0.0 => Some(*value as i64),
        Data::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a date cell: Excel serial dates directly, text as `YYYY-MM-DD` or
/// `DD/MM/YYYY`. Unlike the numeric coercions, `None` here fails the batch;
/// the caller raises the error.
pub fn coerce_date(cell: &Data) -> Option<NaiveDate> {
    if let Some(date) = cell.as_date() {
        return Some(date);
    }
    if let Data::String(text) = cell {
        let text = text.trim();
        for format in ["%Y-%m-%d", "%d/%m/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Some(date);
            }
        }
    }
    None
}

/// Reads a section label. A blank cell becomes the empty label rather than
/// failing the row.
pub fn coerce_section(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// True when the cell holds nothing worth parsing.
pub fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(text) => text.trim().is_empty(),
        _ => false,
    }
}
