use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/quickdine | Working directory (database, logs) |
/// | HTTP_PORT | 5000 | HTTP API port |
/// | MESSAGE_TCP_PORT | 5001 | Message-channel TCP port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | ADMIN_TOKEN | (unset) | Bearer token for privileged routes; unset = open |
/// | CHANNEL_CAPACITY | 1024 | Observer broadcast channel capacity |
/// | SEED_DEMO_DATA | true | Seed demo tables/menu into an empty store |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/quickdine HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Message-channel TCP port (client direct connect)
    pub message_tcp_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Bearer token for privileged routes; None means open access
    pub admin_token: Option<String>,
    /// Capacity of the observer broadcast channel
    pub channel_capacity: usize,
    /// Whether an empty store gets the demo dataset
    pub seed_demo_data: bool,
}

impl Config {
    /// Load configuration from the environment, with defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/quickdine".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            message_tcp_port: std::env::var("MESSAGE_TCP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            channel_capacity: std::env::var("CHANNEL_CAPACITY")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1024),
            seed_demo_data: std::env::var("SEED_DEMO_DATA")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }

    /// Override the filesystem and port settings; used by tests
    pub fn with_overrides(
        work_dir: impl Into<String>,
        http_port: u16,
        message_tcp_port: u16,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.message_tcp_port = message_tcp_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Path of the embedded database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("quickdine.redb")
    }

    /// Create the working directory if it does not exist yet
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
