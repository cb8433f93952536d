//! Command-line surface. Parsed with `clap`, then turned into a
//! [`RunConfig`] plus the list of sinks to open.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{
    CaptureWindow, DEFAULT_BASE_URL, DEFAULT_PACING_MS, DEFAULT_REFERENCE_PREFIX,
    DEFAULT_TIMEOUT_MS, RunConfig,
};
use crate::error::ConfigError;
use crate::report::console::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "mbt-runner")]
#[command(about = "run a model-based test suite against a live REST API")]
pub struct Cli {
    /// Test suite JSON with `test_suite.input_list` and `test_suite.output_list`.
    pub suite: PathBuf,

    /// Base URL of the system under test.
    #[arg(long, env = "MBT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Pause between cases, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PACING_MS)]
    pub delay_ms: u64,

    /// Per-request timeout in milliseconds (0 disables it).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Fewest search results a discovery step keeps.
    #[arg(long, default_value_t = 3)]
    pub capture_min: usize,

    /// Most search results a discovery step keeps.
    #[arg(long, default_value_t = 10)]
    pub capture_max: usize,

    /// Prefix turning a search result id into an item reference.
    #[arg(long, default_value = DEFAULT_REFERENCE_PREFIX)]
    pub reference_prefix: String,

    /// Seed for search-term and capture-size choices.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Persisted text log.
    #[arg(long, default_value = "test_results.txt")]
    pub log_file: PathBuf,

    /// Also write the full run report as JSON.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Also record results in this SQLite database.
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Interactive output format.
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    /// Log level (RUST_LOG overrides).
    #[arg(long, default_value = "info")]
    pub log: String,
}

impl Cli {
    pub fn run_config(&self, bearer_token: String) -> Result<RunConfig, ConfigError> {
        let mut config = RunConfig::new(self.base_url.clone(), bearer_token);
        config.pacing = Duration::from_millis(self.delay_ms);
        config.request_timeout = Duration::from_millis(self.timeout_ms);
        config.capture = CaptureWindow::new(self.capture_min, self.capture_max)?;
        config.reference_prefix = self.reference_prefix.clone();
        config.seed = self.seed;
        config.validate()?;
        Ok(config)
    }
}
