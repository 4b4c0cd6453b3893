// Main entry point for the vocabdb server
// Serves read-only queries over HTTP, or runs a single query and exits

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vocabdb::http::HttpServer;
use vocabdb::query::format_empty;
use vocabdb::{ClassificationMode, QueryExecutor, QueryGate, ServerConfig};

/// vocabdb - Read-only SQL over HTTP for a SQLite vocabulary store
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file (flags below override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path of the SQLite store
    #[arg(long)]
    db: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    port: Option<u16>,

    /// Require SELECT or PRAGMA as the leading keyword
    #[arg(long)]
    strict: bool,

    /// Open the store read-write (creates it if missing)
    #[arg(long)]
    writable: bool,

    /// Execute a single SQL query, print the result and exit
    #[arg(short, long)]
    execute: Option<String>,

    /// Print the --execute result as a table instead of JSON
    #[arg(long, requires = "execute")]
    table: bool,
}

impl Args {
    fn to_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.strict {
            config.classification = ClassificationMode::Strict;
        }
        if self.writable {
            config.read_only = false;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = args.to_config()?;

    let executor = QueryExecutor::open_with(&config.db_path, config.open_options())?;
    let gate = Arc::new(QueryGate::new(executor));

    match &args.execute {
        Some(sql) => execute_query(&gate, sql, args.table),
        None => run_server(config, gate),
    }
}

fn init_tracing() {
    // Logs go to stderr so --execute output stays clean on stdout
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Execute one query through the gate and print it
fn execute_query(gate: &QueryGate<QueryExecutor>, sql: &str, as_table: bool) -> Result<()> {
    let token = gate.issue_token();
    let result = gate.execute(sql, token)?;

    if as_table && result.row_count() == 0 {
        // No row to read column names from, ask the statement instead
        let columns = gate.runner().column_names_of(sql)?;
        println!("{}", format_empty(&columns));
    } else if as_table {
        println!("{}", result.format());
    } else {
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}

/// Serve HTTP until Ctrl-C
fn run_server(config: ServerConfig, gate: Arc<QueryGate<QueryExecutor>>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(HttpServer::new(config, gate).start())
}
