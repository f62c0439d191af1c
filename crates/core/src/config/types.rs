use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cherga.db")
}

/// Ticket numbering and time zone settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// First segment of every ticket id (e.g., "TKT")
    #[serde(default = "default_ticket_prefix")]
    pub ticket_prefix: String,
    /// IANA zone used when an office has none or an unknown one
    #[serde(default = "default_system_timezone")]
    pub system_timezone: String,
}

impl QueueConfig {
    /// The parsed fallback zone, or `None` if the name is not a known zone.
    pub fn system_zone(&self) -> Option<Tz> {
        self.system_timezone.trim().parse().ok()
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ticket_prefix: default_ticket_prefix(),
            system_timezone: default_system_timezone(),
        }
    }
}

fn default_ticket_prefix() -> String {
    "TKT".to_string()
}

fn default_system_timezone() -> String {
    "UTC".to_string()
}

/// Daily counter retry policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SequenceConfig {
    /// Claim attempts before giving up (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff grows by this much per failed attempt (default: 100ms)
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
    /// Upper bound for a single backoff (default: 1000ms)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl SequenceConfig {
    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_step_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    1000
}

/// Next-ticket selection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Waiting tickets fetched per selection round
    #[serde(default = "default_candidate_batch")]
    pub candidate_batch: usize,
    /// Selection rounds before reporting that no ticket is available
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            candidate_batch: default_candidate_batch(),
            max_rounds: default_max_rounds(),
        }
    }
}

fn default_candidate_batch() -> usize {
    5
}

fn default_max_rounds() -> u32 {
    3
}

/// Display board sizes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_limit_called")]
    pub limit_called: usize,
    #[serde(default = "default_limit_waiting")]
    pub limit_waiting: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            limit_called: default_limit_called(),
            limit_waiting: default_limit_waiting(),
        }
    }
}

fn default_limit_called() -> usize {
    3
}

fn default_limit_waiting() -> usize {
    20
}
