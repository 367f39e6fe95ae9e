use crate::{AppState, error::AppError};
use analytics::{
    ComparisonResult, DailySummary, MetricsEngine, MonthlyPoint, PeriodFilter, ResolvedPeriod,
    SectionComparison, TopDays, partition_equivalent_period,
};
use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use chrono::NaiveDate;
use core_types::{DateRange, SalesRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ComparisonParams {
    pub base_year: i32,
    pub comparison_year: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Comma-separated section labels; absent selects every section.
    pub sections: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    /// Comma-separated year labels, e.g. `2023,2024`.
    pub years: String,
    pub sections: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartitionParams {
    pub year: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sections: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub base_year: i32,
    pub comparison_year: i32,
    pub period: ResolvedPeriod,
    pub result: ComparisonResult,
}

#[derive(Debug, Serialize)]
pub struct SectionComparisonResponse {
    pub base_year: i32,
    pub comparison_year: i32,
    pub period: ResolvedPeriod,
    pub sections: Vec<SectionComparison>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub inserted: usize,
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: u64,
}

/// # GET /api/years
pub async fn get_years(State(state): State<Arc<AppState>>) -> Result<Json<Vec<i32>>, AppError> {
    let years = state.repository.distinct_years().await?;
    Ok(Json(years))
}

/// # GET /api/sections
pub async fn get_sections(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    let sections = state.repository.distinct_sections().await?;
    Ok(Json(sections))
}

/// # GET /api/comparison
/// Resolves the equivalent period for the two year labels, aggregates both
/// partitions, and returns the full comparison. An empty partition yields a
/// zero snapshot, not an error.
pub async fn get_comparison(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<ComparisonResponse>, AppError> {
    let records = state.repository.fetch_all().await?;
    let filter = comparison_filter(&state, &params).await?;
    let partitioned = partition_equivalent_period(&records, &filter);

    let engine = MetricsEngine::new();
    let base = engine.aggregate(&partitioned.base);
    let comparison = engine.aggregate(&partitioned.comparison);
    let result = engine.compare(&base, &comparison);

    Ok(Json(ComparisonResponse {
        base_year: params.base_year,
        comparison_year: params.comparison_year,
        period: partitioned.period,
        result,
    }))
}

/// # GET /api/comparison/sections
/// The by-section revenue breakdown over the same equivalent period. Only
/// sections with data in both partitions appear.
pub async fn get_section_comparison(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<SectionComparisonResponse>, AppError> {
    let records = state.repository.fetch_all().await?;
    let filter = comparison_filter(&state, &params).await?;
    let partitioned = partition_equivalent_period(&records, &filter);

    // The breakdown runs over the two partitions combined, grouped back by
    // year label inside the engine.
    let mut combined = partitioned.base.clone();
    combined.extend(partitioned.comparison.iter().cloned());

    let engine = MetricsEngine::new();
    let sections = engine.compare_by_section(&combined, params.base_year, params.comparison_year);

    Ok(Json(SectionComparisonResponse {
        base_year: params.base_year,
        comparison_year: params.comparison_year,
        period: partitioned.period,
        sections,
    }))
}

/// # GET /api/series/monthly-revenue
pub async fn get_monthly_revenue(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> Result<Json<Vec<MonthlyPoint>>, AppError> {
    let filtered = series_records(&state, &params).await?;
    Ok(Json(analytics::monthly_revenue(&filtered)))
}

/// # GET /api/series/monthly-average-ticket
pub async fn get_monthly_average_ticket(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> Result<Json<Vec<MonthlyPoint>>, AppError> {
    let filtered = series_records(&state, &params).await?;
    Ok(Json(analytics::monthly_average_ticket(&filtered)))
}

#[derive(Debug, Deserialize)]
pub struct HeatmapParams {
    pub year: i32,
    pub sections: Option<String>,
}

/// # GET /api/heatmap
/// The section/month revenue matrix for one year label; absent cells are
/// zero.
pub async fn get_heatmap(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HeatmapParams>,
) -> Result<Json<Vec<analytics::HeatmapCell>>, AppError> {
    let sections = parse_sections(&params.sections);
    let records = state.repository.fetch_all().await?;
    let filtered: Vec<SalesRecord> = records
        .into_iter()
        .filter(|r| section_selected(&sections, r))
        .collect();
    Ok(Json(analytics::section_month_revenue(
        &filtered,
        params.year,
    )))
}

/// # GET /api/days
/// Per-day sums for one year label, optionally restricted to a date range.
pub async fn get_daily_summaries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PartitionParams>,
) -> Result<Json<Vec<DailySummary>>, AppError> {
    let filtered = partition_records(&state, &params).await?;
    Ok(Json(analytics::daily_summaries(&filtered)))
}

/// # GET /api/days/top
/// The standout-day cards for one year label.
pub async fn get_top_days(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PartitionParams>,
) -> Result<Json<TopDays>, AppError> {
    let filtered = partition_records(&state, &params).await?;
    Ok(Json(analytics::top_days(&filtered)))
}

/// # POST /api/uploads
/// Multipart upload: `file` (the workbook), `year` (the label to attribute
/// the batch to), optional `sheet`. Parses the workbook and appends the
/// batch in one transaction.
pub async fn upload_workbook(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<Vec<u8>> = None;
    let mut year: Option<i32> = None;
    let mut sheet: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => file = Some(field.bytes().await?.to_vec()),
            Some("year") => {
                let text = field.text().await?;
                let parsed = text.trim().parse::<i32>().map_err(|_| {
                    AppError::BadRequest(format!("invalid year '{}'", text.trim()))
                })?;
                year = Some(parsed);
            }
            Some("sheet") => sheet = Some(field.text().await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("missing 'file' field".to_string()))?;
    let year = year.ok_or_else(|| AppError::BadRequest("missing 'year' field".to_string()))?;

    let records = ingest::ingest_bytes(&file, year, sheet.as_deref())?;
    state.repository.append_batch(&records).await?;
    tracing::info!(rows = records.len(), year, "workbook uploaded");

    Ok(Json(UploadResponse {
        inserted: records.len(),
        year,
    }))
}

/// # DELETE /api/records
/// The administrative reset: removes every stored record.
pub async fn clear_records(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearResponse>, AppError> {
    let deleted = state.repository.clear().await?;
    Ok(Json(ClearResponse { deleted }))
}

// ==============================================================================
// Parameter plumbing
// ==============================================================================

fn parse_sections(raw: &Option<String>) -> Option<Vec<String>> {
    raw.as_ref()
        .map(|text| {
            text.split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect::<Vec<String>>()
        })
        .filter(|sections| !sections.is_empty())
}

fn parse_years(raw: &str) -> Result<Vec<i32>, AppError> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| AppError::BadRequest(format!("invalid year '{}'", part.trim())))
        })
        .collect()
}

fn section_selected(sections: &Option<Vec<String>>, record: &SalesRecord) -> bool {
    match sections {
        Some(sections) => sections.iter().any(|s| s == &record.section),
        None => true,
    }
}

/// Builds the period filter for a comparison request. When no explicit range
/// is given, the archive's date bounds stand in for it, falling back to the
/// comparison year's full calendar when the archive is empty.
async fn comparison_filter(
    state: &Arc<AppState>,
    params: &ComparisonParams,
) -> Result<PeriodFilter, AppError> {
    let range = resolve_range(
        state,
        params.start_date,
        params.end_date,
        params.comparison_year,
    )
    .await?;
    Ok(PeriodFilter {
        base_year: params.base_year,
        comparison_year: params.comparison_year,
        range,
        sections: parse_sections(&params.sections),
    })
}

async fn resolve_range(
    state: &Arc<AppState>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    fallback_year: i32,
) -> Result<DateRange, AppError> {
    match (start, end) {
        (Some(start), Some(end)) => Ok(DateRange::new(start, end)),
        (None, None) => match state.repository.date_bounds().await? {
            Some((min, max)) => Ok(DateRange::new(min, max)),
            None => full_year_range(fallback_year),
        },
        _ => Err(AppError::BadRequest(
            "start_date and end_date must be supplied together".to_string(),
        )),
    }
}

fn full_year_range(year: i32) -> Result<DateRange, AppError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => Ok(DateRange::new(start, end)),
        _ => Err(AppError::BadRequest(format!("invalid year '{year}'"))),
    }
}

async fn series_records(
    state: &Arc<AppState>,
    params: &SeriesParams,
) -> Result<Vec<SalesRecord>, AppError> {
    let years = parse_years(&params.years)?;
    let sections = parse_sections(&params.sections);
    let records = state.repository.fetch_all().await?;
    Ok(records
        .into_iter()
        .filter(|r| years.contains(&r.year))
        .filter(|r| section_selected(&sections, r))
        .collect())
}

async fn partition_records(
    state: &Arc<AppState>,
    params: &PartitionParams,
) -> Result<Vec<SalesRecord>, AppError> {
    let range = match (params.start_date, params.end_date) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "start_date and end_date must be supplied together".to_string(),
            ));
        }
    };
    let sections = parse_sections(&params.sections);
    let records = state.repository.fetch_all().await?;
    Ok(records
        .into_iter()
        .filter(|r| r.year == params.year)
        .filter(|r| range.map_or(true, |range| range.contains(r.date)))
        .filter(|r| section_selected(&sections, r))
        .collect())
}
