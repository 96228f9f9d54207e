use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Desktop Chrome user agent sent with plain GETs and rendered pages.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub stores_path: PathBuf,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    /// When `false`, rendered stores are reported as unavailable without
    /// ever launching a browser.
    pub browser_enabled: bool,
    pub chrome_executable: Option<PathBuf>,
    pub navigation_timeout_secs: u64,
    pub ready_timeout_secs: u64,
    pub settle_delay_ms: u64,
    /// Fixed seed for the synthetic fallback catalog. `None` draws from the OS.
    pub mock_seed: Option<u64>,
}

