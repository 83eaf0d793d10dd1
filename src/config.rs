use std::path::PathBuf;

use thiserror::Error;

use crate::constants::{POSTS_PER_PAGE, TOPICS_PER_PAGE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Forum configuration loaded from environment variables.
///
/// All variables have defaults so an embedding application can construct a
/// working forum without any environment setup.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Presentation
    pub posts_per_page: i64,
    pub topics_per_page: i64,

    // Demo web server (only used by the standalone binary)
    pub web_host: String,
    pub web_port: u16,

    // Follow policy
    pub auto_follow_on_post: bool,

    /// Whether topic pages display the follower count. An explicit value
    /// threaded into the rendering layer rather than a process-wide toggle.
    pub show_followers: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_path: PathBuf::from(env_or_default(
                "FORUM_DATABASE_PATH",
                "./data/forum.sqlite",
            )),

            posts_per_page: parse_env_i64("FORUM_POSTS_PER_PAGE", POSTS_PER_PAGE)?,
            topics_per_page: parse_env_i64("FORUM_TOPICS_PER_PAGE", TOPICS_PER_PAGE)?,

            web_host: env_or_default("FORUM_WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("FORUM_WEB_PORT", 8080)?,

            auto_follow_on_post: parse_env_bool("FORUM_AUTO_FOLLOW_ON_POST", true)?,

            show_followers: parse_env_bool("FORUM_SHOW_FOLLOWERS", true)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.posts_per_page < 1 {
            return Err(ConfigError::InvalidValue {
                name: "FORUM_POSTS_PER_PAGE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.topics_per_page < 1 {
            return Err(ConfigError::InvalidValue {
                name: "FORUM_TOPICS_PER_PAGE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_i64(name: &str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_defaults_validate() {
        let config = Config::from_env().expect("defaults should parse");
        config.validate().expect("defaults should validate");
        assert_eq!(config.posts_per_page, POSTS_PER_PAGE);
        assert_eq!(config.topics_per_page, TOPICS_PER_PAGE);
    }
}
