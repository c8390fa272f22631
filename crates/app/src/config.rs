use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use liner_core::types::cursor::INITIAL_CURSOR;
use liner_core::types::{Cursor, Session};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub catalog_base_url: String,
    pub catalog_token: Option<String>,
    pub user_id: Option<String>,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub max_drain_pages: usize,
    pub poll_interval: Duration,
    pub data_dir: PathBuf,
    pub initial_cursor: Cursor,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("missing value for {0}")]
    Missing(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = read_url("LINER_API_BASE_URL", "http://127.0.0.1:8080/api")?;
        let catalog_base_url = read_url("LINER_CATALOG_BASE_URL", "https://api.spotify.com/v1")?;
        let catalog_token = read_optional_string("LINER_CATALOG_TOKEN");
        let user_id = read_optional_string("LINER_USER_ID");
        let token = read_optional_string("LINER_TOKEN");
        let request_timeout_secs = read_u64("LINER_REQUEST_TIMEOUT_SECS", 15)?;
        let max_drain_pages = read_usize("LINER_MAX_DRAIN_PAGES", 20)?;
        let poll_interval_secs = read_u64("LINER_POLL_INTERVAL_SECS", 30)?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "LINER_POLL_INTERVAL_SECS",
                poll_interval_secs.to_string(),
            ));
        }
        let data_dir = PathBuf::from(read_string("LINER_DATA_DIR", "./data"));
        let initial_cursor_raw = read_string("LINER_INITIAL_CURSOR", INITIAL_CURSOR);
        let initial_cursor = Cursor::parse(&initial_cursor_raw)
            .map_err(|_| ConfigError::InvalidValue("LINER_INITIAL_CURSOR", initial_cursor_raw))?;

        Ok(Self {
            api_base_url,
            catalog_base_url,
            catalog_token,
            user_id,
            token,
            request_timeout: Duration::from_secs(request_timeout_secs),
            max_drain_pages,
            poll_interval: Duration::from_secs(poll_interval_secs),
            data_dir,
            initial_cursor,
        })
    }

    pub fn session(&self) -> Result<Session, ConfigError> {
        let user_id = self.user_id.clone().ok_or(ConfigError::Missing("LINER_USER_ID"))?;
        let token = self.token.clone().ok_or(ConfigError::Missing("LINER_TOKEN"))?;
        Ok(Session::new(user_id, token))
    }
}

pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(());
    }
    let contents = std::fs::read_to_string(path)?;
    for (key, value) in parse_dotenv(&contents) {
        if std::env::var_os(&key).is_none() {
            // Safety: invoked during startup before any threads are spawned.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_url(key: &'static str, default: &'static str) -> Result<String, ConfigError> {
    let value = read_string(key, default);
    validate_url(key, value)
}

fn validate_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidValue(key, value));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn read_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter_map(parse_dotenv_line)
        .collect()
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = parse_dotenv_value(value.trim());
    Some((key.to_string(), value))
}

fn parse_dotenv_value(value: &str) -> String {
    if let Some(stripped) = value.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')) {
        return unescape_double_quoted(stripped);
    }
    if let Some(stripped) = value.strip_prefix('\'').and_then(|inner| inner.strip_suffix('\'')) {
        return stripped.to_string();
    }
    value.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => output.push('\n'),
                Some('r') => output.push('\r'),
                Some('t') => output.push('\t'),
                Some('\\') => output.push('\\'),
                Some('"') => output.push('"'),
                Some(other) => {
                    output.push('\\');
                    output.push(other);
                }
                None => output.push('\\'),
            }
        } else {
            output.push(ch);
        }
    }
    output
}
