//! micro-mobile - Run a scripted session against the main app's root store

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use libmicro::logging::{LogFormat, LoggingConfig};
use libmicro::session::{run_session, HostKind, SessionOptions};
use libmicro::MicroError;

#[derive(Parser, Debug)]
#[command(name = "micro-mobile")]
#[command(version, about = "Run a scripted session against the main app store")]
#[command(long_about = r#"Compose the main app's root store (mobile, user, payments and support
slices plus their cache clients), run a script of steps against it and
print each step's outcome followed by the final state tree.

Requests are answered by an in-process mock transport built from the
fixtures file; without fixtures every request fails with "No route".

EXAMPLES:
    # Run a script with fixtures
    micro-mobile session.json --fixtures fixtures.json

    # JSON report for scripting
    micro-mobile session.json --fixtures fixtures.json --format json | jq '.state.tickets'

    # Read the script from stdin
    cat session.json | micro-mobile --fixtures fixtures.json

    # Watch every dispatched action
    micro-mobile session.json --fixtures fixtures.json --verbose

EXIT CODES:
    0 - Success
    1 - Configuration or transport error
    2 - Store composition failed
    3 - Invalid input (script, fixtures, unknown API or endpoint)
"#)]
struct Cli {
    /// Script of steps to run (reads from stdin if not provided)
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Mock transport fixtures (JSON)
    #[arg(long, value_name = "FILE")]
    fixtures: Option<PathBuf>,

    /// Configuration file (defaults to MICRO_CONFIG or the user config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Log format (text, json, pretty)
    #[arg(long, default_value = "text", env = "MICRO_LOG_FORMAT")]
    log_format: String,

    /// Log level
    #[arg(long, default_value = "warn", env = "MICRO_LOG_LEVEL")]
    log_level: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_format = cli.log_format.parse::<LogFormat>().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(3);
    });
    LoggingConfig::new(log_format, cli.log_level.clone(), cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e.downcast_ref::<MicroError>().map(MicroError::exit_code).unwrap_or(1);
        process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    tracing::debug!("micro-mobile started with args: {:?}", cli);

    let mut options = SessionOptions::new(HostKind::Main);
    options.format = cli.format.parse()?;
    options.script = cli.script;
    options.fixtures = cli.fixtures;
    options.config = cli.config;

    print!("{}", run_session(&options).await?);
    Ok(())
}
