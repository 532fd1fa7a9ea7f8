//! Orchestrator configuration
//!
//! Every tunable lives here: listen address, storage backend, driver
//! endpoint, worker pool sizing, poller pacing, callback delivery and
//! retry policies. Values come from the environment (optionally a `.env`
//! file) with defaults suited to a local deployment.

use std::path::PathBuf;
use std::time::Duration;

use crate::service::retry::RetryPolicy;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address
    pub bind_addr: String,

    /// Postgres URL; `None` selects the in-memory store
    pub database_url: Option<String>,

    /// Public base URL used to build `resultUrl` values
    pub base_url: String,

    /// W3C WebDriver endpoint
    pub webdriver_url: String,

    /// Run browsers without a visible window
    pub headless: bool,

    /// Where downloaded artifacts are written and served from
    pub artifact_dir: PathBuf,

    /// Parent directory of per-user browser profiles
    pub profile_root: PathBuf,

    /// Optional JSON file overriding the built-in site playbook
    pub playbook_path: Option<PathBuf>,

    /// Worker pool size
    pub max_parallel_jobs: usize,

    /// Accepted jobs waiting for a worker; beyond this, dispatch is rejected
    pub queue_capacity: usize,

    pub callback_timeout: Duration,

    pub poll: PollSettings,

    /// Used when a request carries `timeout: 0`
    pub default_job_timeout: Duration,

    /// Upper bound on any job deadline
    pub max_job_timeout: Duration,

    pub history_retention_days: u32,

    pub retry: RetryPolicies,

    pub timings: AutomationTimings,
}

/// Completion poller pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub grace: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

/// One retry policy per operation class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicies {
    pub session: RetryPolicy,
    pub login: RetryPolicy,
    pub navigation: RetryPolicy,
    pub callback: RetryPolicy,
}

/// Fixed pacing delays used while driving pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationTimings {
    /// Pause after a navigation before inspecting the page
    pub page_settle: Duration,
    /// Wait before re-checking an ambiguous location
    pub recheck_delay: Duration,
    /// Pause between UI actions (click, submit)
    pub action_pause: Duration,
    /// Bounds of the random per-character typing delay
    pub typing_delay_min: Duration,
    pub typing_delay_max: Duration,
}

impl AutomationTimings {
    /// No pacing at all
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            page_settle: Duration::ZERO,
            recheck_delay: Duration::ZERO,
            action_pause: Duration::ZERO,
            typing_delay_min: Duration::ZERO,
            typing_delay_max: Duration::ZERO,
        }
    }
}

impl Default for AutomationTimings {
    fn default() -> Self {
        Self {
            page_settle: Duration::from_secs(3),
            recheck_delay: Duration::from_secs(5),
            action_pause: Duration::from_secs(2),
            typing_delay_min: Duration::from_millis(50),
            typing_delay_max: Duration::from_millis(150),
        }
    }
}

impl RetryPolicies {
    fn with_callback_attempts(callback_attempts: u32) -> Self {
        Self {
            session: RetryPolicy::new(3, Duration::from_secs(2), Duration::from_secs(10)),
            login: RetryPolicy::new(2, Duration::from_secs(5), Duration::from_secs(15)),
            navigation: RetryPolicy::new(2, Duration::from_secs(3), Duration::from_secs(10)),
            callback: RetryPolicy::new(
                callback_attempts,
                Duration::from_secs(1),
                Duration::from_secs(8),
            ),
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Recognized variables (all optional):
    /// - RELAY_BIND_ADDR (default: 0.0.0.0:8080)
    /// - DATABASE_URL (unset: in-memory store)
    /// - BASE_URL (default: http://localhost:8080)
    /// - WEBDRIVER_URL (default: http://localhost:4444)
    /// - WEBDRIVER_HEADLESS (default: false)
    /// - ARTIFACT_DIR (default: ./artifacts)
    /// - PROFILE_ROOT (default: ./profiles)
    /// - PLAYBOOK_PATH (unset: built-in playbook)
    /// - MAX_PARALLEL_JOBS (default: 2)
    /// - QUEUE_CAPACITY (default: 32)
    /// - CALLBACK_TIMEOUT (seconds, default: 30)
    /// - CALLBACK_MAX_ATTEMPTS (default: 3)
    /// - POLL_GRACE / POLL_INTERVAL (seconds, default: 30 / 30)
    /// - POLL_MAX_ATTEMPTS (default: 10)
    /// - DEFAULT_JOB_TIMEOUT / MAX_JOB_TIMEOUT (seconds, default: 600 / 1800)
    /// - HISTORY_RETENTION_DAYS (default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let callback_attempts = env_parse("CALLBACK_MAX_ATTEMPTS")?.unwrap_or(3);

        Ok(Self {
            bind_addr: env_string("RELAY_BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: env_string("DATABASE_URL"),
            base_url: env_string("BASE_URL").unwrap_or(defaults.base_url),
            webdriver_url: env_string("WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
            headless: env_parse("WEBDRIVER_HEADLESS")?.unwrap_or(defaults.headless),
            artifact_dir: env_string("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            profile_root: env_string("PROFILE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.profile_root),
            playbook_path: env_string("PLAYBOOK_PATH").map(PathBuf::from),
            max_parallel_jobs: env_parse("MAX_PARALLEL_JOBS")?
                .unwrap_or(defaults.max_parallel_jobs),
            queue_capacity: env_parse("QUEUE_CAPACITY")?.unwrap_or(defaults.queue_capacity),
            callback_timeout: env_secs("CALLBACK_TIMEOUT")?.unwrap_or(defaults.callback_timeout),
            poll: PollSettings {
                grace: env_secs("POLL_GRACE")?.unwrap_or(defaults.poll.grace),
                interval: env_secs("POLL_INTERVAL")?.unwrap_or(defaults.poll.interval),
                max_attempts: env_parse("POLL_MAX_ATTEMPTS")?
                    .unwrap_or(defaults.poll.max_attempts),
            },
            default_job_timeout: env_secs("DEFAULT_JOB_TIMEOUT")?
                .unwrap_or(defaults.default_job_timeout),
            max_job_timeout: env_secs("MAX_JOB_TIMEOUT")?.unwrap_or(defaults.max_job_timeout),
            history_retention_days: env_parse("HISTORY_RETENTION_DAYS")?
                .unwrap_or(defaults.history_retention_days),
            retry: RetryPolicies::with_callback_attempts(callback_attempts),
            timings: AutomationTimings::default(),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        for (name, url) in [
            ("base_url", &self.base_url),
            ("webdriver_url", &self.webdriver_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.max_parallel_jobs == 0 {
            anyhow::bail!("max_parallel_jobs must be greater than 0");
        }

        if self.queue_capacity == 0 {
            anyhow::bail!("queue_capacity must be greater than 0");
        }

        if self.callback_timeout.is_zero() {
            anyhow::bail!("callback_timeout must be greater than 0");
        }

        if self.poll.max_attempts == 0 {
            anyhow::bail!("poll max_attempts must be greater than 0");
        }

        if self.default_job_timeout.is_zero() {
            anyhow::bail!("default_job_timeout must be greater than 0");
        }

        if self.default_job_timeout > self.max_job_timeout {
            anyhow::bail!("default_job_timeout cannot exceed max_job_timeout");
        }

        if self.retry.callback.max_attempts == 0 {
            anyhow::bail!("callback max attempts must be greater than 0");
        }

        Ok(())
    }

    /// Deadline for a job given the caller's `timeout` in seconds.
    ///
    /// Zero selects the default; anything larger than the maximum is clamped.
    pub fn job_timeout(&self, requested_secs: u64) -> Duration {
        if requested_secs == 0 {
            return self.default_job_timeout;
        }
        Duration::from_secs(requested_secs).min(self.max_job_timeout)
    }

    /// Public URL of an artifact served by `/videos`
    pub fn artifact_url(&self, filename: &str) -> String {
        format!("{}/videos/{}", self.base_url.trim_end_matches('/'), filename)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            base_url: "http://localhost:8080".to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            headless: false,
            artifact_dir: PathBuf::from("./artifacts"),
            profile_root: PathBuf::from("./profiles"),
            playbook_path: None,
            max_parallel_jobs: 2,
            queue_capacity: 32,
            callback_timeout: Duration::from_secs(30),
            poll: PollSettings {
                grace: Duration::from_secs(30),
                interval: Duration::from_secs(30),
                max_attempts: 10,
            },
            default_job_timeout: Duration::from_secs(600),
            max_job_timeout: Duration::from_secs(1800),
            history_retention_days: 30,
            retry: RetryPolicies::with_callback_attempts(3),
            timings: AutomationTimings::default(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional variable; a present but malformed value is an error.
fn env_parse<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {} ({})", name, raw, e)),
        None => Ok(None),
    }
}

fn env_secs(name: &str) -> anyhow::Result<Option<Duration>> {
    Ok(env_parse::<u64>(name)?.map(Duration::from_secs))
}
