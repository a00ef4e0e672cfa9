//! vulnex - Tenable.io vulnerability and asset export suite
//!
//! Runs the VM, WAS, and Assets bulk exports, flattens the NDJSON
//! results, and writes Excel, Parquet, and DuckDB outputs.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "vulnex")]
#[command(about = "Tenable.io vulnerability and asset export suite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./vulnex.toml or ~/.config/vulnex/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Seconds between export status polls
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    /// Maximum number of status polls before giving up
    #[arg(long, global = true)]
    max_poll_attempts: Option<u32>,

    /// Read timeout in seconds for stall detection
    #[arg(long, global = true)]
    read_timeout: Option<u64>,

    /// Maximum retry attempts for transient failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the export suite (VM, WAS, Assets)
    Export(cmd::export::ExportArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(vulnex_core::ProgressContext::new());

    // Load configuration (before logging is up, so keep it silent on success)
    let mut config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Export runs leave a log file next to the exported data
    let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let log_file = match &cli.command {
        Command::Export(args) => {
            let dir = args
                .output_dir
                .clone()
                .unwrap_or_else(|| config.output.default_dir.clone());
            std::fs::create_dir_all(&dir)?;
            Some(dir.join(format!("tenable_export_{ts}.log")))
        }
        Command::Config => None,
    };

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    vulnex_core::init_logging(quiet, cli.debug, multi, log_file.as_deref());

    vulnex_core::install_signal_handlers()?;

    // Apply HTTP settings (config file defaults, CLI overrides)
    let http_config = vulnex_core::HttpConfig {
        read_timeout: std::time::Duration::from_secs(
            cli.read_timeout.unwrap_or(config.http.read_timeout),
        ),
        max_retries: cli.max_retries.unwrap_or(config.http.max_retries),
    };
    vulnex_core::set_http_config(http_config);

    // Polling overrides
    if let Some(secs) = cli.poll_interval {
        config.export.poll_interval_secs = secs;
    }
    if let Some(attempts) = cli.max_poll_attempts {
        config.export.max_poll_attempts = attempts;
    }

    match cli.command {
        Command::Export(args) => cmd::export::run(args, &config, &progress, &ts),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["Base URL", &config.api.base_url]);
            table.add_row(vec![
                "Access key",
                if config.api.access_key.is_some() {
                    "configured"
                } else {
                    "not set"
                },
            ]);
            table.add_row(vec![
                "Secret key",
                if config.api.secret_key.is_some() {
                    "configured"
                } else {
                    "not set"
                },
            ]);
            table.add_row(vec!["Verify SSL", &config.api.verify_ssl.to_string()]);
            table.add_row(vec![
                "Poll interval",
                &format!("{}s", config.export.poll_interval_secs),
            ]);
            table.add_row(vec![
                "Max poll attempts",
                &config.export.max_poll_attempts.to_string(),
            ]);
            table.add_row(vec![
                "Output directory",
                &config.output.default_dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Compression level",
                &config.output.compression_level.to_string(),
            ]);
            table.add_row(vec![
                "Read timeout",
                &format!("{}s", config.http.read_timeout),
            ]);
            table.add_row(vec!["Max retries", &config.http.max_retries.to_string()]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
