/// Engine configuration
///
/// # Environment variables
///
/// All settings can be overridden via environment variables:
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/comanda | Work directory (database, logs) |
/// | DUPLICATE_WINDOW_MS | 5000 | Trailing window for the duplicate guard |
/// | FANOUT_CAPACITY | 1024 | Broadcast channel capacity |
/// | LOG_LEVEL | info | Log level |
/// | ENVIRONMENT | development | development, staging or production |
#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory holding the order database and log files
    pub work_dir: String,
    /// Trailing window for duplicate-creation suppression, milliseconds
    pub duplicate_window_ms: i64,
    /// Capacity of the fanout broadcast channel
    pub fanout_capacity: usize,
    /// Log level
    pub log_level: String,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

/// Default duplicate suppression window (5 seconds)
pub const DEFAULT_DUPLICATE_WINDOW_MS: i64 = 5_000;

/// Default fanout channel capacity
pub const DEFAULT_FANOUT_CAPACITY: usize = 1024;

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/comanda".into()),
            duplicate_window_ms: std::env::var("DUPLICATE_WINDOW_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DUPLICATE_WINDOW_MS),
            fanout_capacity: std::env::var("FANOUT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_FANOUT_CAPACITY),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Path of the order database file inside the work directory
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("orders.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "/var/lib/comanda".into(),
            duplicate_window_ms: DEFAULT_DUPLICATE_WINDOW_MS,
            fanout_capacity: DEFAULT_FANOUT_CAPACITY,
            log_level: "info".into(),
            environment: "development".into(),
        }
    }
}
