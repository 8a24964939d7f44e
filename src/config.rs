//! Application configuration loaded from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Filter used with `--verbose`.
const VERBOSE_LOG_DIRECTIVES: &str = "classic_api=debug,tower_http=debug,info";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Save Credential ===
    /// Raw shared secret accepted by `/save`.
    #[serde(default)]
    pub save_password: Option<String>,

    /// SHA-256 hex digest of the shared secret.
    #[serde(default)]
    pub save_password_hash: Option<String>,

    // === Persistence ===
    /// Git working tree holding the tracked copy of the data file.
    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,

    /// Web server root holding the served copy of the data file.
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,

    /// File name of the document inside both directories.
    #[serde(default = "default_data_file")]
    pub data_file: String,

    // === Version Control ===
    /// Remote that receives pushes.
    #[serde(default = "default_git_remote")]
    pub git_remote: String,

    /// Remote branch pushed to as `HEAD:<branch>`.
    #[serde(default = "default_git_branch")]
    pub git_branch: String,

    /// Commit message for every save.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    // === Weather Proxy ===
    /// OpenWeatherMap API key. The proxy answers 500 when unset.
    #[serde(default)]
    pub weather_api_key: Option<String>,

    /// Current-weather endpoint.
    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    /// Location query (`q` parameter).
    #[serde(default = "default_weather_location")]
    pub weather_location: String,

    /// Unit system (`units` parameter).
    #[serde(default = "default_weather_units")]
    pub weather_units: String,

    /// Outbound request timeout in milliseconds.
    #[serde(default = "default_weather_timeout_ms")]
    pub weather_timeout_ms: u64,

    // === Server Configuration ===
    /// Single origin allowed by CORS.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Listen address.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_repo_dir() -> PathBuf {
    PathBuf::from("/root/projects/swclassic")
}

fn default_web_dir() -> PathBuf {
    PathBuf::from("/var/www/theclassicgolf.org")
}

fn default_data_file() -> String {
    "data.json".to_string()
}

fn default_git_remote() -> String {
    "origin".to_string()
}

fn default_git_branch() -> String {
    "Main".to_string()
}

fn default_commit_message() -> String {
    "Update tournament data".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_weather_location() -> String {
    "Lafayette,LA,US".to_string()
}

fn default_weather_units() -> String {
    "imperial".to_string()
}

fn default_weather_timeout_ms() -> u64 {
    5_000
}

fn default_allowed_origin() -> String {
    "https://theclassicgolf.org".to_string()
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    3001
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build a configuration from explicit key/value pairs, applying the same
    /// defaults as [`Config::load`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        envy::from_iter(pairs.into_iter().map(|(k, v)| (k.into(), v.into())))
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        let has_password = self.save_password.as_deref().is_some_and(|p| !p.is_empty());
        let has_hash = self
            .save_password_hash
            .as_deref()
            .is_some_and(|h| !h.is_empty());

        if !has_password && !has_hash {
            return Err("SAVE_PASSWORD or SAVE_PASSWORD_HASH is required".to_string());
        }

        if let Some(hash) = self.save_password_hash.as_deref().filter(|h| !h.is_empty()) {
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err("SAVE_PASSWORD_HASH must be a 64-character hex SHA-256 digest".to_string());
            }
        }

        if self.data_file.is_empty() || self.data_file.contains('/') {
            return Err("DATA_FILE must be a bare file name".to_string());
        }

        if self.git_branch.is_empty() || self.git_branch.starts_with('-') {
            return Err("GIT_BRANCH must be a branch name".to_string());
        }

        if self.git_remote.is_empty() || self.git_remote.starts_with('-') {
            return Err("GIT_REMOTE must be a remote name".to_string());
        }

        if self.weather_timeout_ms == 0 {
            return Err("WEATHER_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than 0".to_string());
        }

        if axum::http::HeaderValue::from_str(&self.allowed_origin).is_err() {
            return Err("ALLOWED_ORIGIN must be a valid header value".to_string());
        }

        if url::Url::parse(&self.weather_url).is_err() {
            return Err("WEATHER_URL must be an absolute URL".to_string());
        }

        Ok(())
    }

    /// Socket address the server binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the tracked copy inside the repository.
    pub fn repo_data_path(&self) -> PathBuf {
        self.repo_dir.join(&self.data_file)
    }

    /// Path of the served copy inside the web root.
    pub fn web_data_path(&self) -> PathBuf {
        self.web_dir.join(&self.data_file)
    }

    /// Refspec used for every push.
    pub fn push_refspec(&self) -> String {
        format!("HEAD:{}", self.git_branch)
    }

    /// `tracing` filter directives; `verbose` forces debug output for this crate.
    pub fn log_directives(&self, verbose: bool) -> &str {
        if verbose {
            VERBOSE_LOG_DIRECTIVES
        } else {
            &self.rust_log
        }
    }

    /// Outbound weather request timeout.
    pub fn weather_timeout(&self) -> Duration {
        Duration::from_millis(self.weather_timeout_ms)
    }
}
