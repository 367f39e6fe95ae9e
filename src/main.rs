use analytics::{MetricsEngine, PeriodFilter, PeriodMode, partition_equivalent_period};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use core_types::{DateRange, SalesRecord};
use database::connection::{connect, run_migrations};
use database::repository::SalesRepository;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the Footfall sales-comparison application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => {
            let config = configuration::load_config()?;
            web_server::run_server(&config).await?;
        }
        Commands::Ingest(args) => handle_ingest(args, repository().await?).await?,
        Commands::Report(args) => handle_report(args, repository().await?).await?,
        Commands::Years => handle_years(repository().await?).await?,
        Commands::Clear => handle_clear(repository().await?).await?,
    }

    Ok(())
}

async fn repository() -> anyhow::Result<SalesRepository> {
    let db_pool = connect().await?;
    run_migrations(&db_pool).await?;
    Ok(SalesRepository::new(db_pool))
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Year-over-year comparison engine for daily sales exports.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a spreadsheet export into the archive under a year label.
    Ingest(IngestArgs),
    /// Print a year-over-year comparison for the equivalent period.
    Report(ReportArgs),
    /// List the year labels present in the archive.
    Years,
    /// Run the HTTP API server.
    Serve,
    /// Delete every stored record.
    Clear,
}

#[derive(Parser)]
struct IngestArgs {
    /// Path to the .xlsx/.xls export.
    #[arg(long)]
    file: PathBuf,

    /// Year label to attribute the batch to.
    #[arg(long)]
    year: i32,

    /// Worksheet name (the first sheet when omitted).
    #[arg(long)]
    sheet: Option<String>,
}

#[derive(Parser)]
struct ReportArgs {
    /// The reference year label.
    #[arg(long)]
    base_year: i32,

    /// The year label compared against the base.
    #[arg(long)]
    comparison_year: i32,

    /// Start of the comparison period (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the comparison period (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Comma-separated section filter.
    #[arg(long)]
    sections: Option<String>,
}

// ==============================================================================
// Ingest Command Logic
// ==============================================================================

/// Parses the workbook, then appends it in chunks behind a progress bar.
async fn handle_ingest(args: IngestArgs, repository: SalesRepository) -> anyhow::Result<()> {
    println!(
        "Ingesting {} under year label {}",
        args.file.display(),
        args.year
    );

    let records = ingest::ingest_file(&args.file, args.year, args.sheet.as_deref())?;
    if records.is_empty() {
        println!("The workbook contained no data rows.");
        return Ok(());
    }

    let chunks: Vec<&[SalesRecord]> = records.chunks(500).collect();

    // Set up the progress bar
    let progress_bar = ProgressBar::new(chunks.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    for chunk in chunks {
        repository.append_batch(chunk).await?;
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message("Ingest complete!");
    println!("Inserted {} records for year {}", records.len(), args.year);

    Ok(())
}

// ==============================================================================
// Report Command Logic
// ==============================================================================

async fn handle_report(args: ReportArgs, repository: SalesRepository) -> anyhow::Result<()> {
    let records = repository.fetch_all().await?;

    let range = match (args.from, args.to) {
        (Some(from), Some(to)) => DateRange::new(from, to),
        (None, None) => match repository.date_bounds().await? {
            Some((min, max)) => DateRange::new(min, max),
            None => full_year_range(args.comparison_year)?,
        },
        _ => anyhow::bail!("--from and --to must be supplied together"),
    };

    let sections = args.sections.as_ref().map(|raw| {
        raw.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect::<Vec<String>>()
    });

    let filter = PeriodFilter {
        base_year: args.base_year,
        comparison_year: args.comparison_year,
        range,
        sections,
    };
    let partitioned = partition_equivalent_period(&records, &filter);

    match partitioned.period.mode {
        PeriodMode::Month(month) => println!(
            "Comparing calendar month {} of {} against {}",
            month, args.base_year, args.comparison_year
        ),
        PeriodMode::CustomRange => println!(
            "Comparing {} to {} ({}) against {} to {} ({})",
            partitioned.period.base_range.start,
            partitioned.period.base_range.end,
            args.base_year,
            partitioned.period.comparison_range.start,
            partitioned.period.comparison_range.end,
            args.comparison_year
        ),
    }

    let engine = MetricsEngine::new();
    let base = engine.aggregate(&partitioned.base);
    let comparison = engine.aggregate(&partitioned.comparison);
    let result = engine.compare(&base, &comparison);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Metric".to_string(),
        args.base_year.to_string(),
        args.comparison_year.to_string(),
        "Change".to_string(),
    ]);
    table.add_row(vec![
        "Revenue".to_string(),
        base.total_revenue.round_dp(2).to_string(),
        comparison.total_revenue.round_dp(2).to_string(),
        format_pct(result.revenue_change_pct),
    ]);
    table.add_row(vec![
        "Visitors".to_string(),
        base.total_visitors.to_string(),
        comparison.total_visitors.to_string(),
        format_pct(result.visitors_change_pct),
    ]);
    table.add_row(vec![
        "Transactions".to_string(),
        base.total_transactions.to_string(),
        comparison.total_transactions.to_string(),
        format_pct(result.transactions_change_pct),
    ]);
    table.add_row(vec![
        "Items".to_string(),
        base.total_items.to_string(),
        comparison.total_items.to_string(),
        format_pct(result.items_change_pct),
    ]);
    table.add_row(vec![
        "Average ticket".to_string(),
        base.average_transaction_value.round_dp(2).to_string(),
        comparison.average_transaction_value.round_dp(2).to_string(),
        format_pct(result.average_transaction_value_change_pct),
    ]);
    table.add_row(vec![
        "Items per ticket".to_string(),
        base.items_per_transaction.round_dp(2).to_string(),
        comparison.items_per_transaction.round_dp(2).to_string(),
        format_pct(result.items_per_transaction_change_pct),
    ]);
    table.add_row(vec![
        "Conversion rate".to_string(),
        base.conversion_rate.round_dp(2).to_string(),
        comparison.conversion_rate.round_dp(2).to_string(),
        format_points(result.conversion_rate_change_points),
    ]);
    table.add_row(vec![
        "Records / days".to_string(),
        format!("{} / {}", base.record_count, base.days_with_data),
        format!("{} / {}", comparison.record_count, comparison.days_with_data),
        String::new(),
    ]);
    println!("{table}");

    // The by-section breakdown runs over both partitions combined.
    let mut combined = partitioned.base.clone();
    combined.extend(partitioned.comparison.iter().cloned());
    let breakdown = engine.compare_by_section(&combined, args.base_year, args.comparison_year);

    if !breakdown.is_empty() {
        let mut section_table = Table::new();
        section_table.load_preset(UTF8_FULL);
        section_table.set_header(vec![
            "Section".to_string(),
            args.base_year.to_string(),
            args.comparison_year.to_string(),
            "Change".to_string(),
        ]);
        for entry in breakdown {
            section_table.add_row(vec![
                entry.section,
                entry.base_revenue.round_dp(2).to_string(),
                entry.comparison_revenue.round_dp(2).to_string(),
                format_pct(entry.revenue_change_pct),
            ]);
        }
        println!("{section_table}");
    }

    Ok(())
}

fn full_year_range(year: i32) -> anyhow::Result<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => Ok(DateRange::new(start, end)),
        _ => anyhow::bail!("invalid year {year}"),
    }
}

fn format_pct(change: Option<Decimal>) -> String {
    match change {
        Some(value) if value.is_sign_negative() => format!("{}%", value.round_dp(1)),
        Some(value) => format!("+{}%", value.round_dp(1)),
        None => "no baseline".to_string(),
    }
}

fn format_points(points: Decimal) -> String {
    if points.is_sign_negative() {
        format!("{} pp", points.round_dp(2))
    } else {
        format!("+{} pp", points.round_dp(2))
    }
}

// ==============================================================================
// Administrative Commands
// ==============================================================================

async fn handle_years(repository: SalesRepository) -> anyhow::Result<()> {
    let years = repository.distinct_years().await?;
    if years.is_empty() {
        println!("No data loaded yet.");
    } else {
        for year in years {
            println!("{year}");
        }
    }
    Ok(())
}

async fn handle_clear(repository: SalesRepository) -> anyhow::Result<()> {
    let deleted = repository.clear().await?;
    println!("Deleted {deleted} records.");
    Ok(())
}
