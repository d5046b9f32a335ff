use std::env;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_DAILY_SESSION_LIMIT, DEFAULT_TIMEZONE, DEFAULT_TOLERANCE_WINDOW_MINUTES,
};

#[derive(Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub default_timezone: String,
    pub tolerance_window_minutes: i64,
    pub daily_session_limit: u32,
    pub worker: WorkerConfig,
    pub push: PushConfig,
    pub eval: EvalConfig,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub is_leader: bool,
    pub enable_reminders: bool,
    pub enable_deadline_sweep: bool,
}

/// Web-push credentials and switches. The private key is a secret; Debug
/// output redacts it.
#[derive(Clone)]
pub struct PushConfig {
    pub enabled: bool,
    pub mock: bool,
    pub subject: String,
    pub public_key: String,
    pub private_key: String,
    pub timeout_secs: u64,
}

/// Evaluation-provider credentials and switches. The API key is a secret.
#[derive(Clone)]
pub struct EvalConfig {
    pub enabled: bool,
    pub mock: bool,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("sled_path", &self.sled_path)
            .field("default_timezone", &self.default_timezone)
            .field("tolerance_window_minutes", &self.tolerance_window_minutes)
            .field("daily_session_limit", &self.daily_session_limit)
            .field("worker", &self.worker)
            .field("push", &self.push)
            .field("eval", &self.eval)
            .finish()
    }
}

impl fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("subject", &self.subject)
            .field("public_key", &self.public_key)
            .field("private_key", &"***REDACTED***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for EvalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/espanhol.sled"),
            default_timezone: env_or("DEFAULT_TIMEZONE", DEFAULT_TIMEZONE),
            tolerance_window_minutes: env_or_parse(
                "TOLERANCE_WINDOW_MINUTES",
                DEFAULT_TOLERANCE_WINDOW_MINUTES,
            ),
            daily_session_limit: env_or_parse("DAILY_SESSION_LIMIT", DEFAULT_DAILY_SESSION_LIMIT),
            worker: WorkerConfig {
                is_leader: env_or_bool("WORKER_LEADER", true),
                enable_reminders: env_or_bool("ENABLE_REMINDER_WORKER", true),
                enable_deadline_sweep: env_or_bool("ENABLE_DEADLINE_WORKER", true),
            },
            push: PushConfig {
                enabled: env_or_bool("PUSH_ENABLED", false),
                mock: env_or_bool("PUSH_MOCK", true),
                subject: env_or("WEB_PUSH_SUBJECT", "mailto:no-reply@espanhol.local"),
                public_key: env_or("WEB_PUSH_PUBLIC_KEY", ""),
                private_key: env_or("WEB_PUSH_PRIVATE_KEY", ""),
                timeout_secs: env_or_parse("PUSH_TIMEOUT_SECS", 10_u64),
            },
            eval: EvalConfig {
                enabled: env_or_bool("EVAL_ENABLED", false),
                mock: env_or_bool("EVAL_MOCK", true),
                api_url: env_or(
                    "EVAL_API_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                api_key: env_or("EVAL_API_KEY", ""),
                model: env_or("EVAL_MODEL", "gemini-3-flash-preview"),
                timeout_secs: env_or_parse("EVAL_TIMEOUT_SECS", 30_u64),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
