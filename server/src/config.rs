//! Server configuration.

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Postgres connection string.
    pub database_url: String,
    /// Maximum connections in the database pool.
    pub db_pool_size: u32,
    /// Maximum entries held by the balance cache.
    pub cache_capacity: u64,
    /// Enable the /metrics endpoint.
    pub metrics_enabled: bool,
    /// Log level.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8080,
            database_url: "postgres://localhost/walletd".to_string(),
            db_pool_size: 16,
            cache_capacity: 100_000,
            metrics_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("WALLET_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(port) = std::env::var("WALLET_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(size) = std::env::var("WALLET_DB_POOL_SIZE") {
            if let Ok(size) = size.parse() {
                config.db_pool_size = size;
            }
        }

        if let Ok(capacity) = std::env::var("WALLET_CACHE_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                config.cache_capacity = capacity;
            }
        }

        if let Ok(enabled) = std::env::var("WALLET_METRICS_ENABLED") {
            config.metrics_enabled = enabled != "false" && enabled != "0";
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.db_pool_size == 0 {
            return Err("Database pool size cannot be 0".to_string());
        }

        if self.cache_capacity == 0 {
            return Err("Cache capacity cannot be 0".to_string());
        }

        Ok(())
    }
}
