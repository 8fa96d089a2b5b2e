//! Diplo Explorer - Main entry point
//!
//! Usage:
//!   diplo-explorer --data-dir ./data --query 'filterFamily=Julidae'
//!   diplo-explorer --events interactions.jsonl
//!   event-source | diplo-explorer --events -

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use diplo_core::{Language, codec, load_store, try_load_store};
use diplo_explorer::events::{StreamConfig, start_stream};
use diplo_explorer::{AppState, ExplorerConfig, SnapshotWriter, run_events};
use diplo_logging::DiploSubscriberBuilder;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "diplo-explorer")]
#[command(about = "Filter the millipede distribution atlas and print derived views as JSON")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the five CSV tables
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Display language (ja or en)
    #[arg(short, long, value_parser = parse_language)]
    lang: Option<Language>,

    /// Initial state as a query string, with or without the leading '?'
    #[arg(short, long, default_value = "")]
    query: String,

    /// JSONL user events; '-' reads stdin
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Quiescence window for continuous inputs
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Indent each snapshot
    #[arg(long)]
    pretty: bool,

    /// Fail when any table cannot be loaded instead of skipping it
    #[arg(long)]
    strict: bool,
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::parse(value).ok_or_else(|| format!("unsupported language: {value}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ExplorerConfig::load_or_default(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(lang) = args.lang {
        config = config.with_language(lang);
    }
    if let Some(ms) = args.debounce_ms {
        config = config.with_debounce_ms(ms);
    }
    if let Some(level) = args.log_level {
        config.log.default_level = level;
    }

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = DiploSubscriberBuilder::new()
        .with_config(config.log.clone())
        .init();

    let paths = config.data.table_paths();
    let store = if args.strict {
        try_load_store(&paths).context("failed to load tables")?
    } else {
        load_store(&paths)
    };
    let state = codec::decode(args.query.trim_start_matches('?'));
    let mut app = AppState::new(store, state, config.language, &config.marker);

    let mut writer = SnapshotWriter::new(io::stdout().lock()).pretty(args.pretty);
    writer.publish(&app)?;

    let Some(events) = args.events else {
        return Ok(());
    };

    let stream_config = if events.as_os_str() == "-" {
        StreamConfig::stdin()
    } else {
        StreamConfig::file(events)
    };
    info!(debounce_ms = config.debounce_ms, "Reading user events");
    let rx = start_stream(stream_config);

    run_events(&mut app, rx, config.debounce(), |app| writer.publish(app)).await?;
    Ok(())
}
