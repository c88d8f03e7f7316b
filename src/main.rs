use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use ddlift::config::RunConfig;
use ddlift::extract::RunSummary;
use ddlift::introspect::TableFilter;
use ddlift::logging;

#[derive(Parser, Debug)]
#[command(name = "ddlift")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database connection string (overrides DATABASE_URL and DB_* variables)
    #[arg(long)]
    connection_string: Option<String>,

    /// Directory the SQL scripts are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Database schema to introspect
    #[arg(long, default_value = "public")]
    schema: String,

    /// Run log path (default: <output-dir>/ddlift.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Read every catalog query from one read-only snapshot
    #[arg(long)]
    snapshot: bool,

    /// Comma-separated list of tables to include (default: all)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Comma-separated list of tables to exclude
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| logging::default_log_path(&cli.output_dir));
    logging::init(cli.verbose, &log_path);

    info!("ddlift v{}", env!("CARGO_PKG_VERSION"));
    info!(
        output_dir = ?cli.output_dir,
        schema = ?cli.schema,
        snapshot = cli.snapshot,
        log_file = ?log_path,
        "Starting schema extraction"
    );

    let filter = TableFilter {
        include: cli.tables,
        exclude: cli.exclude,
    };
    if filter.is_active() {
        debug!(filter = ?filter, "Table filter configured");
    }

    let config = RunConfig::load(&cli.env_file, cli.connection_string)
        .context("Failed to load database configuration")?
        .with_output_dir(cli.output_dir)
        .with_schema(cli.schema)
        .with_snapshot(cli.snapshot)
        .with_filter(filter);
    debug!(connection = ?config.redacted_connection_string(), "Loaded configuration");

    let summary = extract_postgres(&config)?;

    if !summary.skipped.is_empty() {
        warn!(
            skipped = summary.skipped.len(),
            "Some objects were skipped, see errors above"
        );
    }
    info!(files = ?summary.files, "Done");

    Ok(())
}

#[cfg(feature = "postgres")]
fn extract_postgres(config: &RunConfig) -> Result<RunSummary> {
    use chrono::Utc;
    use ddlift::extract::run_extraction;
    use ddlift::introspect::connect;
    use ddlift::PostgresCatalog;
    use postgres::IsolationLevel;

    let redacted = config.redacted_connection_string();
    let mut client = connect(&config.connection_string, &redacted)?;

    let generated_at = Utc::now();
    let summary = if config.snapshot {
        let mut tx = client
            .build_transaction()
            .isolation_level(IsolationLevel::RepeatableRead)
            .read_only(true)
            .start()
            .context("Failed to start read-only transaction")?;
        debug!("Reading catalog from a single snapshot");

        let mut source = PostgresCatalog::new(&mut tx, config.schema.clone());
        let summary = run_extraction(&mut source, &config.filter, &config.output_dir, generated_at)
            .context("Schema extraction failed")?;
        tx.commit().context("Failed to end read-only transaction")?;
        summary
    } else {
        let mut source = PostgresCatalog::new(&mut client, config.schema.clone());
        run_extraction(&mut source, &config.filter, &config.output_dir, generated_at)
            .context("Schema extraction failed")?
    };

    if let Err(e) = client.close() {
        warn!(error = ?e, "Error while closing database connection");
    } else {
        debug!("Database connection closed");
    }

    Ok(summary)
}

#[cfg(not(feature = "postgres"))]
fn extract_postgres(_config: &RunConfig) -> Result<RunSummary> {
    anyhow::bail!("PostgreSQL support not enabled. Rebuild with --features postgres")
}
