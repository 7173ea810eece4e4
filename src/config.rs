use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::compliments::texts::{DEFAULT_BUTTON_TEXT, DEFAULT_USAGE_TEXT};
use crate::compliments::validate_text;

/// Environment variable holding the Telegram bot token.
pub const TOKEN_ENV: &str = "BOT_TOKEN";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file '{}': {source}", path.display())]
    ParseJson { path: PathBuf, source: serde_json::Error },
    #[error("BOT_TOKEN is not set")]
    MissingToken,
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    /// Directory for the queue, the admin record and logs.
    data_dir: Option<String>,
    /// Minimum minutes between two dispatches.
    cooldown_minutes: Option<u32>,
    button_text: Option<String>,
    usage_text: Option<String>,
}

fn default_cooldown_minutes() -> u32 {
    60
}

pub struct Config {
    pub telegram_bot_token: String,
    pub data_dir: PathBuf,
    pub cooldown_minutes: u32,
    pub button_text: String,
    pub usage_text: String,
}

impl Config {
    /// Load `path` if it exists, otherwise use defaults. The token comes from the environment.
    pub fn load<P: AsRef<Path>>(path: P, token: Option<String>) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let file = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
            serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?
        } else {
            info!("No config file at {:?}, using defaults", config_path);
            ConfigFile::default()
        };

        let telegram_bot_token = token.filter(|t| !t.is_empty()).ok_or(ConfigError::MissingToken)?;
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(format!(
                "{TOKEN_ENV} appears invalid (expected format: 123456789:ABCdefGHI...)"
            )));
        }

        let button_text = checked_text("button_text", file.button_text, DEFAULT_BUTTON_TEXT)?;
        let usage_text = checked_text("usage_text", file.usage_text, DEFAULT_USAGE_TEXT)?;

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        Ok(Self {
            telegram_bot_token,
            data_dir,
            cooldown_minutes: file.cooldown_minutes.unwrap_or_else(default_cooldown_minutes),
            button_text,
            usage_text,
        })
    }

    pub fn queue_path(&self) -> PathBuf {
        self.data_dir.join("data.json")
    }

    pub fn admin_path(&self) -> PathBuf {
        self.data_dir.join("admin.yar")
    }
}

fn checked_text(field: &str, value: Option<String>, default: &str) -> Result<String, ConfigError> {
    match value {
        None => Ok(default.to_string()),
        Some(value) => validate_text(&value).map(str::to_string).map_err(|_| {
            ConfigError::Validation(format!("{field} must be non-empty and must not start with '/'"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TOKEN: &str = "123456789:ABCdefGHIjklMNOpqrsTUVwxyz";

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn token() -> Option<String> {
        Some(TOKEN.to_string())
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/path/lovebot.json", token()).expect("defaults");
        assert_eq!(config.telegram_bot_token, TOKEN);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.cooldown_minutes, 60);
        assert_eq!(config.button_text, DEFAULT_BUTTON_TEXT);
        assert_eq!(config.usage_text, DEFAULT_USAGE_TEXT);
        assert_eq!(config.queue_path(), PathBuf::from("data/data.json"));
        assert_eq!(config.admin_path(), PathBuf::from("data/admin.yar"));
    }

    #[test]
    fn test_valid_config() {
        let file = write_config(r#"{
            "data_dir": "/var/lib/lovebot",
            "cooldown_minutes": 30,
            "button_text": "  Хочу комплимент ",
            "usage_text": "Жми кнопку"
        }"#);
        let config = Config::load(file.path(), token()).expect("should load valid config");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/lovebot"));
        assert_eq!(config.cooldown_minutes, 30);
        assert_eq!(config.button_text, "Хочу комплимент");
        assert_eq!(config.usage_text, "Жми кнопку");
    }

    #[test]
    fn test_missing_token() {
        let err = assert_err(Config::load("/nonexistent/lovebot.json", None));
        assert!(matches!(err, ConfigError::MissingToken));
        let err = assert_err(Config::load("/nonexistent/lovebot.json", Some(String::new())));
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let err = assert_err(Config::load("/nonexistent/lovebot.json", Some("invalid_token".into())));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_format_non_numeric_id() {
        let err = assert_err(Config::load("/nonexistent/lovebot.json", Some("bot:ABCdef".into())));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_token_format_empty_secret() {
        let err = assert_err(Config::load("/nonexistent/lovebot.json", Some("123456789:".into())));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_command_like_button_text_rejected() {
        let file = write_config(r#"{ "button_text": "/admin" }"#);
        let err = assert_err(Config::load(file.path(), token()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("button_text"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let file = write_config(r#"{ "cooldown": 5 }"#);
        let err = assert_err(Config::load(file.path(), token()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path(), token()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
