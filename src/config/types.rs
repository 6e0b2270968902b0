use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Site-Indexer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Crawl bounds and loop cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// A record whose next hop would reach this distance finishes its job
    #[serde(rename = "max-distance")]
    pub max_distance: u32,

    /// Absolute wall-clock limit for a single job (seconds)
    #[serde(rename = "max-job-duration-secs")]
    pub max_job_duration_secs: u64,

    /// Time a job may go without frontier activity before it is finished (seconds)
    #[serde(rename = "idle-timeout-secs")]
    pub idle_timeout_secs: u64,

    /// Safety ceiling for the orchestrator loop itself (minutes)
    #[serde(rename = "max-run-minutes")]
    pub max_run_minutes: u64,

    /// Pause after an empty batch before polling again (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of frontier records drained per iteration
    #[serde(rename = "batch-size")]
    pub batch_size: usize,
}

impl CrawlerConfig {
    pub fn max_job_duration(&self) -> Duration {
        Duration::from_secs(self.max_job_duration_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_run_time(&self) -> Duration {
        Duration::from_secs(self.max_run_minutes.saturating_mul(60))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_distance: 10,
            max_job_duration_secs: 5 * 60,
            idle_timeout_secs: 10,
            max_run_minutes: 10,
            poll_interval_ms: 250,
            batch_size: 50,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "site-indexer".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database holding the frontier and the index
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./site-indexer.db".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        let config = CrawlerConfig::default();
        assert_eq!(config.max_job_duration(), Duration::from_secs(300));
        assert_eq!(config.idle_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_run_time(), Duration::from_secs(600));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_run_time_saturates() {
        let config = CrawlerConfig {
            max_run_minutes: u64::MAX,
            ..CrawlerConfig::default()
        };
        assert_eq!(config.max_run_time(), Duration::from_secs(u64::MAX));
    }
}
