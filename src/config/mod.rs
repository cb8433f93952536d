//! Run configuration. Built by the CLI, validated once before the run.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::error::ConfigError;

pub const BEARER_TOKEN_VAR: &str = "BEARER_TOKEN";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_PACING_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REFERENCE_PREFIX: &str = "spotify:track:";

/// Inclusive bounds on how many search results a discovery step keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureWindow {
    pub min: usize,
    pub max: usize,
}

impl Default for CaptureWindow {
    fn default() -> Self {
        Self { min: 3, max: 10 }
    }
}

impl CaptureWindow {
    pub fn new(min: usize, max: usize) -> Result<Self, ConfigError> {
        let window = Self { min, max };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min == 0 || self.min > self.max {
            return Err(ConfigError::InvalidCaptureWindow {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub bearer_token: String,
    /// Sleep between cases; rate-limits the SUT.
    pub pacing: Duration,
    pub request_timeout: Duration,
    pub capture: CaptureWindow,
    pub reference_prefix: String,
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            capture: CaptureWindow::default(),
            reference_prefix: DEFAULT_REFERENCE_PREFIX.to_string(),
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bearer_token.trim().is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        self.capture.validate()
    }
}

/// Reads the bearer token, loading `.env` first if one exists.
pub fn bearer_token_from_env() -> Result<String, ConfigError> {
    if let Err(err) = dotenvy::dotenv() {
        if let Some(problem) = env_file_problem(&err) {
            debug!("{problem}");
        }
    }
    match std::env::var(BEARER_TOKEN_VAR) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ConfigError::MissingCredential),
    }
}

/// A missing `.env` is normal; anything else is worth a diagnostic.
fn env_file_problem(err: &dotenvy::Error) -> Option<String> {
    if err.not_found() {
        None
    } else {
        Some(format!("ignoring unreadable .env file: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn defaults_are_valid() {
        let config = RunConfig::new(DEFAULT_BASE_URL, "token");
        assert!(config.validate().is_ok());
        assert_eq!(config.capture, CaptureWindow { min: 3, max: 10 });
        assert_eq!(config.pacing, Duration::from_secs(1));
    }

    #[test]
    fn blank_token_is_missing_credential() {
        let config = RunConfig::new(DEFAULT_BASE_URL, "   ");
        assert!(matches!(config.validate(), Err(ConfigError::MissingCredential)));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let config = RunConfig::new("not a url", "token");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn capture_window_bounds() {
        assert!(CaptureWindow::new(0, 3).is_err());
        assert!(CaptureWindow::new(5, 4).is_err());
        assert!(CaptureWindow::new(4, 4).is_ok());
    }

    #[test]
    fn capture_window_pick_stays_in_range() {
        let window = CaptureWindow::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let n = window.pick(&mut rng);
            assert!((3..=10).contains(&n));
        }
    }

    #[test]
    fn missing_env_file_is_not_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = dotenvy::from_path(dir.path().join(".env")).expect_err("missing file");
        assert_eq!(env_file_problem(&err), None);
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(&path, "MBT_UNTERMINATED=\"no closing quote\n").expect("write");

        let err = dotenvy::from_path(&path).expect_err("parse error");
        let problem = env_file_problem(&err).expect("reported");
        assert!(problem.starts_with("ignoring unreadable .env file"));
    }
}
