use std::env;
use std::path::PathBuf;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
    /// Bind address for the web server
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = env::var("PRICE_TRACKER_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("prices.db"));

        let bind_addr =
            env::var("PRICE_TRACKER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Config { db_path, bind_addr }
    }
}
