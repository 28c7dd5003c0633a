use std::path::PathBuf;
use std::time::Duration;

use chatgpt::config::ChatGPTEngine;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DATABASE_PATH: &str = "db.sqlite";
const DEFAULT_PROGRESS_DATABASE_PATH: &str = "progress.sqlite";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub chatgpt_api_key: String,
    pub chatgpt_engine: ChatGPTEngine,
    pub chatgpt_timeout: Duration,
    pub database_path: PathBuf,
    /// Kept apart from the dialogue file, both stores key their rows by chat.
    pub progress_database_path: PathBuf,
}

impl Config {
    /// Reads the configuration from the environment, loading `.env` first if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let telegram_token = required("TELOXIDE_TOKEN")?;
        let chatgpt_api_key = required("CHATGPT_API_KEY")?;

        let chatgpt_engine = match lookup("CHATGPT_ENGINE") {
            None => ChatGPTEngine::Gpt35Turbo,
            Some(value) => parse_engine(&value).ok_or(ConfigError::Invalid {
                name: "CHATGPT_ENGINE",
                value,
            })?,
        };

        let chatgpt_timeout = match lookup("CHATGPT_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "CHATGPT_TIMEOUT_SECS",
                        value,
                    })
                }
            },
        };

        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        let progress_database_path = lookup("PROGRESS_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRESS_DATABASE_PATH));
        if progress_database_path == database_path {
            return Err(ConfigError::Invalid {
                name: "PROGRESS_DATABASE_PATH",
                value: progress_database_path.display().to_string(),
            });
        }

        Ok(Self {
            telegram_token,
            chatgpt_api_key,
            chatgpt_engine,
            chatgpt_timeout,
            database_path,
            progress_database_path,
        })
    }
}

fn parse_engine(value: &str) -> Option<ChatGPTEngine> {
    match value.trim() {
        "gpt-3.5-turbo" => Some(ChatGPTEngine::Gpt35Turbo),
        "gpt-4" => Some(ChatGPTEngine::Gpt4),
        "gpt-4-32k" => Some(ChatGPTEngine::Gpt4_32k),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const TOKENS: [(&str, &str); 2] = [("TELOXIDE_TOKEN", "123:abc"), ("CHATGPT_API_KEY", "sk-test")];

    fn from_vars(extra: &[(&'static str, &'static str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<&str, String> = TOKENS
            .iter()
            .chain(extra)
            .map(|(name, value)| (*name, value.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn applies_defaults() {
        let config = from_vars(&[]).unwrap();

        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.chatgpt_api_key, "sk-test");
        assert!(matches!(config.chatgpt_engine, ChatGPTEngine::Gpt35Turbo));
        assert_eq!(config.chatgpt_timeout, Duration::from_secs(15));
        assert_eq!(config.database_path, PathBuf::from("db.sqlite"));
        assert_eq!(config.progress_database_path, PathBuf::from("progress.sqlite"));
    }

    #[test]
    fn reads_overrides() {
        let config = from_vars(&[
            ("CHATGPT_ENGINE", "gpt-4"),
            ("CHATGPT_TIMEOUT_SECS", " 30 "),
            ("DATABASE_PATH", "/var/lib/bot/state.sqlite"),
            ("PROGRESS_DATABASE_PATH", "/var/lib/bot/progress.sqlite"),
        ])
        .unwrap();

        assert!(matches!(config.chatgpt_engine, ChatGPTEngine::Gpt4));
        assert_eq!(config.chatgpt_timeout, Duration::from_secs(30));
        assert_eq!(config.database_path, PathBuf::from("/var/lib/bot/state.sqlite"));
        assert_eq!(
            config.progress_database_path,
            PathBuf::from("/var/lib/bot/progress.sqlite")
        );
    }

    #[test]
    fn tokens_are_required() {
        assert_eq!(
            Config::from_lookup(|_| None).unwrap_err(),
            ConfigError::Missing("TELOXIDE_TOKEN")
        );
        // Later entries win when collected, so this blanks the key.
        assert_eq!(
            from_vars(&[("CHATGPT_API_KEY", "  ")]).unwrap_err(),
            ConfigError::Missing("CHATGPT_API_KEY")
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            from_vars(&[("CHATGPT_ENGINE", "llama")]).unwrap_err(),
            ConfigError::Invalid {
                name: "CHATGPT_ENGINE",
                value: "llama".to_string()
            }
        );
        assert_eq!(
            from_vars(&[("CHATGPT_TIMEOUT_SECS", "0")]).unwrap_err(),
            ConfigError::Invalid {
                name: "CHATGPT_TIMEOUT_SECS",
                value: "0".to_string()
            }
        );
        assert_eq!(
            from_vars(&[("PROGRESS_DATABASE_PATH", "db.sqlite")]).unwrap_err(),
            ConfigError::Invalid {
                name: "PROGRESS_DATABASE_PATH",
                value: "db.sqlite".to_string()
            }
        );
    }
}
