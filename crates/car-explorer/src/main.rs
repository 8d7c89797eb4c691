//! CLI entry point for the used-car listing explorer.

use anyhow::{Context, Result, anyhow};
use car_explorer::{
    BarGrouping, Dashboard, DashboardConfig, DashboardConfigBuilder, DashboardReport,
    HistogramSplit, Pipeline, ReportGenerator, ScatterAxis, Selection, load_listings,
};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use std::path::Path;
use tracing::{error, info, warn};

/// CLI-compatible bar grouping enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBarGrouping {
    Manufacturer,
    Type,
    Condition,
}

impl From<CliBarGrouping> for BarGrouping {
    fn from(cli: CliBarGrouping) -> Self {
        match cli {
            CliBarGrouping::Manufacturer => BarGrouping::Manufacturer,
            CliBarGrouping::Type => BarGrouping::Type,
            CliBarGrouping::Condition => BarGrouping::Condition,
        }
    }
}

/// CLI-compatible histogram split enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliHistogramSplit {
    Fuel,
    Transmission,
    Cylinders,
    #[value(name = "is-4wd")]
    Is4wd,
    PaintColor,
}

impl From<CliHistogramSplit> for HistogramSplit {
    fn from(cli: CliHistogramSplit) -> Self {
        match cli {
            CliHistogramSplit::Fuel => HistogramSplit::Fuel,
            CliHistogramSplit::Transmission => HistogramSplit::Transmission,
            CliHistogramSplit::Cylinders => HistogramSplit::Cylinders,
            CliHistogramSplit::Is4wd => HistogramSplit::Is4wd,
            CliHistogramSplit::PaintColor => HistogramSplit::PaintColor,
        }
    }
}

/// CLI-compatible scatter axis enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliScatterAxis {
    Condition,
    Odometer,
    Age,
    Manufacturer,
    PaintColor,
    Cylinders,
    DaysListed,
}

impl From<CliScatterAxis> for ScatterAxis {
    fn from(cli: CliScatterAxis) -> Self {
        match cli {
            CliScatterAxis::Condition => ScatterAxis::Condition,
            CliScatterAxis::Odometer => ScatterAxis::Odometer,
            CliScatterAxis::Age => ScatterAxis::Age,
            CliScatterAxis::Manufacturer => ScatterAxis::Manufacturer,
            CliScatterAxis::PaintColor => ScatterAxis::PaintColor,
            CliScatterAxis::Cylinders => ScatterAxis::Cylinders,
            CliScatterAxis::DaysListed => ScatterAxis::DaysListed,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Explore used-car listings: fill gaps, filter, chart",
    long_about = "Loads a used-car listing CSV, imputes missing model years, cylinders, \
                  odometer readings and 4WD flags, then renders a filtered table and three \
                  charts for the chosen widgets.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  RUST_LOG    Overrides --log-level (a .env file is read too)\n\n\
                  EXAMPLES:\n  \
                  # Defaults: first manufacturer, all years\n  \
                  car-explorer -i vehicles_us.csv\n\n  \
                  # One manufacturer and a year window\n  \
                  car-explorer -i vehicles_us.csv --manufacturer ford --year-from 2005 --year-to 2015\n\n  \
                  # Machine-readable output\n  \
                  car-explorer -i vehicles_us.csv --all-manufacturers --hist-by paint-color --json"
)]
struct Args {
    /// Path to the listing CSV file
    #[arg(short, long)]
    input: String,

    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<String>,

    /// Manufacturer shown in the table (default: the first one in the file)
    #[arg(long)]
    manufacturer: Option<String>,

    /// First model year shown in the table
    #[arg(long)]
    year_from: Option<i32>,

    /// Last model year shown in the table
    #[arg(long)]
    year_to: Option<i32>,

    /// Show every manufacturer in the table
    #[arg(long)]
    all_manufacturers: bool,

    /// Grouping of the average price chart
    #[arg(long, value_enum, default_value = "manufacturer")]
    bar_by: CliBarGrouping,

    /// Color split of the price histogram
    #[arg(long, value_enum, default_value = "fuel")]
    hist_by: CliHistogramSplit,

    /// Leave sales above the high price threshold out of the histogram
    #[arg(long)]
    remove_high_hist: bool,

    /// Y axis of the price scatter chart
    #[arg(long, value_enum, default_value = "condition")]
    scatter_y: CliScatterAxis,

    /// Leave sales above the high price threshold out of the scatter chart
    #[arg(long)]
    remove_high_scatter: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only the dashboard report is printed.
    #[arg(long)]
    json: bool,

    /// Write the dashboard report to the output directory
    ///
    /// The report will be saved as <input_name>_dashboard.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output directory for reports (overrides the config file)
    #[arg(short, long)]
    output: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Read .env before the subscriber so RUST_LOG from it applies
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    let data = load_listings(&args.input)?;

    let mut builder = Pipeline::builder().config(config.clone());
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    let enriched = builder.build()?.process(data).map_err(|e| {
        error!("Enrichment failed: {}", e);
        anyhow!("Enrichment failed: {}", e)
    })?;

    let dashboard = Dashboard::new(enriched.data, config.clone())?;
    let selection = build_selection(&args, &dashboard);
    let view = dashboard.render(&selection)?;

    let report = DashboardReport::new(
        &args.input,
        enriched.summary,
        dashboard.controls().clone(),
        view,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let generator = ReportGenerator::new(&config.output_dir);
        let report_path = generator.write_report_to_file(&report, &extract_file_stem(&args.input))?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report);
    Ok(())
}

/// Read the optional JSON config and apply CLI overrides.
fn build_config(args: &Args) -> Result<DashboardConfig> {
    let base: DashboardConfig = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read config file {path}"))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid config file {path}"))?
        }
        None => DashboardConfig::default(),
    };

    let mut builder = DashboardConfigBuilder::from_config(base);
    if let Some(output) = &args.output {
        builder = builder.output_dir(output);
    }
    Ok(builder.build()?)
}

/// Start from the dashboard defaults and apply the widget flags.
fn build_selection(args: &Args, dashboard: &Dashboard) -> Selection {
    let mut selection = dashboard.default_selection();
    let controls = dashboard.controls();

    if let Some(manufacturer) = &args.manufacturer {
        if !controls.manufacturers.contains(manufacturer) {
            warn!("Manufacturer '{}' not found; the table will be empty", manufacturer);
        }
        selection.manufacturer = Some(manufacturer.clone());
    }

    if args.year_from.is_some() || args.year_to.is_some() {
        let (min_year, max_year) = controls.year_bounds.unwrap_or((i32::MIN, i32::MAX));
        selection.year_range = Some((
            args.year_from.unwrap_or(min_year),
            args.year_to.unwrap_or(max_year),
        ));
    }

    selection.show_all = args.all_manufacturers;
    selection.bar_by = args.bar_by.into();
    selection.hist_by = args.hist_by.into();
    selection.remove_high_hist = args.remove_high_hist;
    selection.scatter_y = args.scatter_y.into();
    selection.remove_high_scatter = args.remove_high_scatter;
    selection
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print a human-readable summary of the enrichment and the rendered view.
fn print_human_readable_summary(report: &DashboardReport) {
    let summary = &report.summary;
    let view = &report.view;

    println!();
    println!("{}", "=".repeat(80));
    println!("USED CAR DATA");
    println!("{}", "=".repeat(80));
    println!();

    println!("Input: {} ({} rows)", report.input_file, summary.rows);
    println!("Enrichment: {}ms", summary.duration_ms);
    for fill in &summary.column_fills {
        println!(
            "  {:<12} {} filled ({}), {} left missing",
            fill.name,
            fill.filled(),
            fill.method,
            fill.missing_after
        );
    }
    println!();

    println!("Actions:");
    for action in &summary.actions {
        println!(
            "  [{}] {}: {}",
            action.action_type.display_name(),
            action.target,
            action.description
        );
    }
    println!();

    let selection = &view.selection;
    let who = if selection.show_all {
        "all manufacturers".to_string()
    } else {
        selection.manufacturer.clone().unwrap_or_else(|| "-".to_string())
    };
    let years = selection
        .year_range
        .map(|(from, to)| format!("{from}-{to}"))
        .unwrap_or_else(|| "all years".to_string());
    println!(
        "Table: {}, {} ({} rows, showing {})",
        who,
        years,
        view.table.total_rows,
        view.table.rows.len()
    );
    println!();

    println!("{}", view.bar.title);
    for bar in &view.bar.bars {
        match bar.mean_price {
            Some(mean) => println!("  {:<20} {:>12.2}  (n={})", bar.label, mean, bar.count),
            None => println!("  {:<20} {:>12}  (n={})", bar.label, "-", bar.count),
        }
    }
    println!();

    println!("{}", view.histogram.title);
    println!(
        "  {} bins, {} listings, colors: {}",
        view.histogram.bins.len(),
        view.histogram.total(),
        view.histogram.colors.join(", ")
    );
    println!();

    println!("{}", view.scatter.title);
    for series in &view.scatter.series {
        println!("  {:<6} {} points", series.category.as_str(), series.points.len());
    }
    println!();

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save the dashboard report");
    println!("{}", "=".repeat(80));
}
