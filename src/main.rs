use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use mbt_runner::catalog::ActionRegistry;
use mbt_runner::cli::Cli;
use mbt_runner::config::bearer_token_from_env;
use mbt_runner::context::RunState;
use mbt_runner::error::ConfigError;
use mbt_runner::http::client::ReqwestTransport;
use mbt_runner::report::SinkSet;
use mbt_runner::report::console::ConsoleSink;
use mbt_runner::report::json::JsonReportSink;
use mbt_runner::report::logfile::LogFileSink;
use mbt_runner::report::sqlite::SqliteSink;
use mbt_runner::runner::SequentialRunner;
use mbt_runner::runner::outcome::RunSummary;
use mbt_runner::suite::load_suite;

const EXIT_CASES_FAILED: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(&cli.log) {
        eprintln!("warning: failed to init tracing: {err}");
    }

    match run(&cli).await {
        Ok(summary) if summary.all_passed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_CASES_FAILED),
        Err(err) => {
            error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
}

async fn run(cli: &Cli) -> Result<RunSummary, ConfigError> {
    let token = bearer_token_from_env()?;
    let config = cli.run_config(token)?;
    let suite = load_suite(&cli.suite)?;
    // Surface a label-count mismatch before any output file is created.
    suite.cases()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let registry = ActionRegistry::default_catalog(ActionRegistry::pick_search_term(&mut rng));
    let mut state = RunState::new(registry);

    let transport = ReqwestTransport::new(config.request_timeout)?;
    let runner = SequentialRunner::new(config, transport)?;

    let mut sinks = open_sinks(cli);
    let report = runner.run(&suite, &mut state, &mut rng, &mut sinks).await?;
    Ok(report.summary)
}

fn open_sinks(cli: &Cli) -> SinkSet {
    let mut sinks = SinkSet::new();
    sinks.push(Box::new(ConsoleSink::stdout(cli.format.into())));

    match LogFileSink::create(&cli.log_file) {
        Ok(sink) => sinks.push(Box::new(sink)),
        Err(err) => warn!("{err}"),
    }

    if let Some(path) = &cli.report {
        sinks.push(Box::new(JsonReportSink::new(path)));
    }

    if let Some(path) = &cli.db {
        let suite_name = cli.suite.display().to_string();
        match SqliteSink::open(path, &suite_name) {
            Ok(sink) => sinks.push(Box::new(sink)),
            Err(err) => warn!("{err}"),
        }
    }

    sinks
}
