//! oxide-sync CLI
//!
//! Command-line tool for checking sync rule queries and resolving the
//! buckets of a session.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_sync_cli::error::CliError;
use oxide_sync_cli::report::format_diagnostics;
use oxide_sync_cli::source::{load_sql, parse_parameters};
use oxide_sync_rules::{SqlDataQuery, SqlRuleError, StaticSqlParameterQuery};

/// Checks sync rule queries and resolves bucket ids.
#[derive(Parser)]
#[command(name = "oxide-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the rule comes from and what it is called.
#[derive(Args)]
struct QueryArgs {
    /// Rule SQL.
    #[arg(long, conflicts_with = "file")]
    sql: Option<String>,

    /// File containing the rule SQL.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Bucket descriptor name.
    #[arg(short, long, env = "OXIDE_SYNC_DESCRIPTOR", default_value = "global")]
    descriptor: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query and report every problem found.
    Check {
        #[command(flatten)]
        query: QueryArgs,

        /// Check as a data query with these bucket parameters. Without it
        /// the query is checked as a static parameter query.
        #[arg(short, long = "bucket-parameter", value_name = "NAME")]
        bucket_parameters: Vec<String>,

        /// Check as a data query that has no bucket parameters.
        #[arg(long)]
        data: bool,
    },

    /// Print the bucket ids a session gets from a static parameter query.
    Buckets {
        #[command(flatten)]
        query: QueryArgs,

        /// Session parameters as JSON.
        #[arg(short, long, default_value = "{}")]
        parameters: String,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Check {
            query,
            bucket_parameters,
            data,
        } => {
            let sql = load_sql(query.sql.as_deref(), query.file.as_deref())?;
            let errors: Vec<SqlRuleError> = if data || !bucket_parameters.is_empty() {
                SqlDataQuery::from_sql(&query.descriptor, &bucket_parameters, &sql)?
                    .errors()
                    .to_vec()
            } else {
                StaticSqlParameterQuery::from_sql(&query.descriptor, &sql)?
                    .errors()
                    .to_vec()
            };

            if errors.is_empty() {
                info!("{}: OK", query.descriptor);
                return Ok(ExitCode::SUCCESS);
            }
            eprintln!("{}", format_diagnostics(&errors));
            eprintln!("\n{}", CliError::Diagnostics(errors.len()));
            Ok(ExitCode::FAILURE)
        }

        Commands::Buckets { query, parameters } => {
            let sql = load_sql(query.sql.as_deref(), query.file.as_deref())?;
            let parameters = parse_parameters(&parameters)?;
            let compiled = StaticSqlParameterQuery::from_sql(&query.descriptor, &sql)?;
            if compiled.has_errors() {
                eprintln!("{}", format_diagnostics(compiled.errors()));
                return Err(CliError::Diagnostics(compiled.errors().len()).into());
            }

            let ids = compiled.get_static_bucket_ids(&parameters)?;
            if ids.is_empty() {
                info!("No buckets");
            }
            for id in ids {
                println!("{id}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
