// Entry point and high-level CLI flow.
//
// `run` loads whichever of the three exports were given, prints a Markdown
// preview of every derived table and writes the full tables to the output
// directory. `detect` only shows the column mapping each file would get, so
// it can be confirmed or overridden with `--map-*` before a real run.
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use style_report::columns::{suggest_columns, ColumnMapping, Role, TableKind};
use style_report::importer::{ImportReport, RawTable};
use style_report::master::zero_sale_styles;
use style_report::output::{preview_table, write_report};
use style_report::util::{format_int, format_number, format_pct};
use style_report::{Params, ReportContext, ReportError, Result};

#[derive(Parser)]
#[command(name = "style_report", about = "Per-style sales, returns and inventory report")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import the exports and generate every report.
    Run {
        #[arg(long)]
        sales: Option<PathBuf>,
        #[arg(long)]
        returns: Option<PathBuf>,
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// JSON file with parameter overrides.
        #[arg(long)]
        params: Option<PathBuf>,
        /// Single parameter override, `key=value`; repeatable.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
        /// Explicit sales column binding, `role=Header`; repeatable.
        #[arg(long = "map-sales", value_name = "ROLE=HEADER")]
        map_sales: Vec<String>,
        #[arg(long = "map-returns", value_name = "ROLE=HEADER")]
        map_returns: Vec<String>,
        #[arg(long = "map-catalog", value_name = "ROLE=HEADER")]
        map_catalog: Vec<String>,
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
        /// Rows shown per table preview.
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
    /// Show the suggested column mapping for each export.
    Detect {
        #[arg(long)]
        sales: Option<PathBuf>,
        #[arg(long)]
        returns: Option<PathBuf>,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn parse_mapping(pairs: &[String]) -> Result<Option<ColumnMapping>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut mapping = ColumnMapping::new();
    for pair in pairs {
        let (role, column) = pair.split_once('=').ok_or_else(|| bad_arg(pair))?;
        let role = Role::parse(role).ok_or_else(|| bad_arg(pair))?;
        mapping = mapping.with(role, column.trim());
    }
    Ok(Some(mapping))
}

fn bad_arg(pair: &str) -> ReportError {
    ReportError::InvalidParameter {
        name: pair.to_string(),
        reason: "expected ROLE=HEADER with role one of \
                 date, style, quantity, price, type, reason, brand, size"
            .to_string(),
    }
}

fn load_params(file: Option<&Path>, overrides: &[String]) -> Result<Params> {
    let mut params = match file {
        Some(path) => Params::from_json_file(path)?,
        None => Params::default(),
    };
    for kv in overrides {
        let (key, value) = kv.split_once('=').ok_or_else(|| ReportError::InvalidParameter {
            name: kv.clone(),
            reason: "expected KEY=VALUE".to_string(),
        })?;
        params.set(key, value)?;
    }
    params.validate()?;
    Ok(params)
}

fn print_import(path: &Path, report: &ImportReport) {
    println!(
        "{} import: {} ({} rows read, {} kept)",
        report.table,
        path.display(),
        format_int(report.total_rows as u64),
        format_int(report.kept_rows as u64)
    );
    if report.degraded_dates + report.degraded_numbers > 0 {
        println!(
            "Note: {} unreadable dates and {} unreadable numbers were kept as blanks/defaults.",
            format_int(report.degraded_dates as u64),
            format_int(report.degraded_numbers as u64)
        );
    }
    if report.dropped_empty_keys > 0 {
        println!(
            "Note: {} rows skipped because the style was blank.",
            format_int(report.dropped_empty_keys as u64)
        );
    }
    for (role, column) in report.mapping.iter() {
        println!("  {:<8} <- {}", role, column);
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_run(
    sales: Option<PathBuf>,
    returns: Option<PathBuf>,
    catalog: Option<PathBuf>,
    params: Option<PathBuf>,
    overrides: Vec<String>,
    maps: [Vec<String>; 3],
    out_dir: PathBuf,
    preview: usize,
) -> Result<()> {
    let params = load_params(params.as_deref(), &overrides)?;
    let mut ctx = ReportContext::new(params)?;
    let [map_sales, map_returns, map_catalog] = maps;

    // A failed table is reported and skipped; the other tables still load.
    if let Some(path) = &sales {
        let mapping = parse_mapping(&map_sales)?;
        match ctx.load_sales_file(path, mapping.as_ref()) {
            Ok(report) => print_import(path, &report),
            Err(e) => eprintln!("Failed to load sales file: {}", e),
        }
    }
    if let Some(path) = &returns {
        let mapping = parse_mapping(&map_returns)?;
        match ctx.load_returns_file(path, mapping.as_ref()) {
            Ok(report) => print_import(path, &report),
            Err(e) => eprintln!("Failed to load returns file: {}", e),
        }
    }
    if let Some(path) = &catalog {
        let mapping = parse_mapping(&map_catalog)?;
        match ctx.load_catalog_file(path, mapping.as_ref()) {
            Ok(report) => print_import(path, &report),
            Err(e) => eprintln!("Failed to load catalog file: {}", e),
        }
    }

    let report = ctx.run();
    let k = &report.kpis;
    println!(
        "\nKPIs ({} to {}): orders {}, GMV {}, return rate {}, RTO share {}",
        k.window_start,
        k.window_end,
        format_int(k.total_orders),
        format_number(k.total_gmv, 2),
        format_pct(k.return_pct),
        format_pct(k.rto_pct)
    );

    preview_table("Master Styles", Some("one row per style"), &report.master, preview);
    preview_table(
        "Zero-Sale Styles",
        Some(format!("no orders after {} days", ctx.params.zero_sale_age_days).as_str()),
        &zero_sale_styles(&report.master, ctx.params.zero_sale_age_days),
        preview,
    );
    preview_table(
        "Watchlist",
        Some(format!("{} to {} vs the period before", k.window_start, k.window_end).as_str()),
        &report.watchlist,
        preview,
    );
    preview_table("Returns Split", Some("RTO vs customer returns"), &report.returns_split, preview);
    preview_table("Inventory Forecast", None, &report.forecast, preview);
    preview_table(
        "Size Allocation",
        Some("required units split by recent size mix"),
        &report.size_allocation,
        preview,
    );
    preview_table("Ads Recommendation", None, &report.ads, preview);

    let files = write_report(&out_dir, &report)?;
    println!("Outputs saved to {} ({} files)", out_dir.display(), files.len());
    Ok(())
}

fn handle_detect(files: [(TableKind, Option<PathBuf>); 3]) -> Result<()> {
    for (kind, path) in files {
        let Some(path) = path else { continue };
        let table = RawTable::from_path(&path)?;
        let mapping = suggest_columns(kind, &table.headers);
        println!("{} ({}):", kind, path.display());
        for &role in kind.roles() {
            let required = if kind.required_roles().contains(&role) { " (required)" } else { "" };
            match mapping.get(role) {
                Some(col) => println!("  {:<8} <- {}", role, col),
                None => println!("  {:<8} <- (not found){}", role, required),
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "style_report=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run {
            sales,
            returns,
            catalog,
            params,
            overrides,
            map_sales,
            map_returns,
            map_catalog,
            out_dir,
            preview,
        } => handle_run(
            sales,
            returns,
            catalog,
            params,
            overrides,
            [map_sales, map_returns, map_catalog],
            out_dir,
            preview,
        ),
        Command::Detect {
            sales,
            returns,
            catalog,
        } => handle_detect([
            (TableKind::Sales, sales),
            (TableKind::Returns, returns),
            (TableKind::Catalog, catalog),
        ]),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
