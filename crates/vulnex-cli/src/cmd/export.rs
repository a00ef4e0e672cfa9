//! Export subcommand - run the VM / WAS / Assets export suite

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use vulnex_core::{FlatTable, SharedProgress, cleanup_tmp_files, fmt_num};
use vulnex_tenable::{Credentials, Dataset, DatasetStats, TenableClient, export_dataset};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output formats to produce (comma-separated)
    #[arg(
        short = 'o',
        long = "outputs",
        value_enum,
        value_delimiter = ',',
        default_values = ["excel", "parquet"]
    )]
    pub outputs: Vec<OutputFormat>,

    /// Output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Skip the WAS findings export
    #[arg(long)]
    pub disable_was: bool,

    /// DuckDB database filename (default: tenable_export_{timestamp}.duckdb)
    #[arg(long)]
    pub duckdb_name: Option<String>,

    /// Zstd compression level for Parquet output (1-22)
    #[arg(short, long)]
    pub zstd_level: Option<i32>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    Excel,
    Parquet,
    Duckdb,
}

pub fn run(args: ExportArgs, config: &Config, progress: &SharedProgress, ts: &str) -> Result<()> {
    let credentials = credentials_from(config)?;
    let client = TenableClient::new(&config.api.base_url, &credentials, config.api.verify_ssl)?;
    let settings = config.export.to_settings();

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.default_dir.clone());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("cannot create output directory {}", output_dir.display()))?;
    if let Err(e) = cleanup_tmp_files(&output_dir) {
        log::warn!("tmp file cleanup failed: {e}");
    }

    let zstd_level = args.zstd_level.unwrap_or(config.output.compression_level);

    let plan = export_plan(args.disable_was);

    log::info!("Starting Tenable export suite");
    log::info!("  Base URL: {}", config.api.base_url);
    log::info!("  Datasets: {plan:?}");
    log::info!("  Outputs: {:?}", args.outputs);
    log::info!("  Output dir: {}", output_dir.display());

    let mut tables = Vec::new();
    let mut all_stats = Vec::new();
    for (dataset, enabled) in plan {
        if !enabled {
            // An empty table keeps the dataset's workbook sheet in place
            log::info!("{dataset} export disabled");
            tables.push((dataset.table_name().to_string(), FlatTable::new()));
            continue;
        }
        let (table, stats) = export_dataset(&client, dataset, &settings, progress)?;
        log::info!(
            "{} columns ({}): {:?}",
            dataset,
            table.num_columns(),
            table.columns()
        );
        report_dataset(&stats, table.num_columns(), progress);
        tables.push((dataset.table_name().to_string(), table));
        all_stats.push(stats);
    }

    write_outputs(&args, &tables, &output_dir, ts, zstd_level)?;

    let skipped: Vec<_> = all_stats.iter().filter(|s| s.skipped).collect();
    for stats in &skipped {
        log::warn!("{} export was skipped", stats.dataset);
    }
    if progress.is_tty() {
        eprintln!("\nExport completed.");
    } else {
        log::info!("Export completed");
    }
    Ok(())
}

/// Datasets in run order, flagged enabled or not.
///
/// A disabled dataset still gets a slot so the output writers see its
/// (empty) table and the workbook keeps all expected sheets.
fn export_plan(disable_was: bool) -> Vec<(Dataset, bool)> {
    vec![
        (Dataset::VmVulns, true),
        (Dataset::WasFindings, !disable_was),
        (Dataset::Assets, true),
    ]
}

fn credentials_from(config: &Config) -> Result<Credentials> {
    let access_key = config.api.access_key.clone().context(
        "Tenable access key not configured (set TENABLE_ACCESS_KEY or [api].access_key)",
    )?;
    let secret_key = config.api.secret_key.clone().context(
        "Tenable secret key not configured (set TENABLE_SECRET_KEY or [api].secret_key)",
    )?;
    Ok(Credentials {
        access_key,
        secret_key,
    })
}

fn report_dataset(stats: &DatasetStats, num_columns: usize, progress: &SharedProgress) {
    if progress.is_tty() {
        let rows = if stats.skipped {
            vec![("Status", "skipped".to_string())]
        } else {
            vec![
                ("Status", stats.status.clone()),
                (
                    "Chunks",
                    format!("{}/{}", stats.chunks_fetched, stats.chunks_total),
                ),
                (
                    "Rows",
                    format!(
                        "{} ({} parse errors)",
                        fmt_num(stats.rows),
                        stats.parse_errors
                    ),
                ),
                ("Columns", num_columns.to_string()),
                ("Time", format!("{:.1}s", stats.elapsed.as_secs_f64())),
            ]
        };
        print_summary(stats.dataset.label(), &rows);
    } else {
        stats.log();
        log::info!("  Columns: {num_columns}");
    }
}

/// Print a key-value summary table on stderr
fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}

fn write_outputs(
    args: &ExportArgs,
    tables: &[(String, FlatTable)],
    output_dir: &PathBuf,
    ts: &str,
    zstd_level: i32,
) -> Result<()> {
    if args.outputs.contains(&OutputFormat::Parquet) {
        let written = vulnex_output::write_parquet(tables, output_dir, ts, zstd_level)?;
        log::info!("Wrote {} Parquet file(s)", written.len());
    }
    if args.outputs.contains(&OutputFormat::Excel) {
        let path = vulnex_output::write_excel(tables, output_dir, ts)?;
        log::info!("Wrote Excel workbook {}", path.display());
    }
    if args.outputs.contains(&OutputFormat::Duckdb) {
        let path =
            vulnex_output::write_duckdb(tables, output_dir, ts, args.duckdb_name.as_deref())?;
        log::info!("Wrote DuckDB database {}", path.display());
    }
    Ok(())
}
