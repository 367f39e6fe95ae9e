use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to open the workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("The workbook contains no worksheets")]
    EmptyWorkbook,

    #[error("Worksheet '{0}' not found in the workbook")]
    SheetNotFound(String),

    #[error("The file must contain the columns: {0}")]
    MissingColumns(String),

    #[error("Row {row}: cannot parse '{value}' as a date")]
    InvalidDate { row: usize, value: String },

    #[error("Year label {0} is outside the supported range 2000..=2100")]
    YearOutOfRange(i32),
}
