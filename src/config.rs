use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{DEFAULT_BANK_CACHE_TTL_SECS, DEFAULT_QUIZ_COUNT, MAX_QUIZ_COUNT};
use crate::store::tables::DEFAULT_QUESTION_TAB;

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: u64,
    pub cors_origin: String,
    pub bank_cache_ttl_secs: u64,
    pub quiz: QuizConfig,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub default_count: u64,
    pub max_count: u64,
}

#[derive(Clone)]
pub struct SheetsConfig {
    /// In-memory store instead of the Sheets API; for local runs and tests.
    pub mock: bool,
    pub spreadsheet_id: String,
    pub service_account_email: String,
    pub private_key: String,
    pub question_tab: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("jwt_secret", &"***REDACTED***")
            .field("jwt_expires_in_hours", &self.jwt_expires_in_hours)
            .field("cors_origin", &self.cors_origin)
            .field("bank_cache_ttl_secs", &self.bank_cache_ttl_secs)
            .field("quiz", &self.quiz)
            .field("sheets", &self.sheets)
            .finish()
    }
}

impl fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("mock", &self.mock)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("service_account_email", &self.service_account_email)
            .field("private_key", &"***REDACTED***")
            .field("question_tab", &self.question_tab)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3001_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            jwt_secret: env_or(
                "JWT_SECRET",
                "change_me_to_random_64_chars_change_me_to_random_64_chars",
            ),
            // 30 days, matching the token lifetime the frontend expects
            jwt_expires_in_hours: env_or_parse("JWT_EXPIRES_IN_HOURS", 720_u64),
            cors_origin: env_or("CORS_ORIGIN", "*"),
            bank_cache_ttl_secs: env_or_parse("BANK_CACHE_TTL_SECS", DEFAULT_BANK_CACHE_TTL_SECS),
            quiz: QuizConfig {
                default_count: env_or_parse("QUIZ_DEFAULT_COUNT", DEFAULT_QUIZ_COUNT),
                max_count: env_or_parse("QUIZ_MAX_COUNT", MAX_QUIZ_COUNT),
            },
            sheets: SheetsConfig {
                mock: env_or_bool("SHEETS_MOCK", false),
                spreadsheet_id: env_or("SHEETS_SPREADSHEET_ID", ""),
                service_account_email: env_or("SHEETS_SERVICE_ACCOUNT_EMAIL", ""),
                // 环境变量里的 PEM 换行通常是转义过的
                private_key: env_or("SHEETS_PRIVATE_KEY", "").replace("\\n", "\n"),
                question_tab: env_or("SHEETS_QUESTION_TAB", DEFAULT_QUESTION_TAB),
                timeout_secs: env_or_parse("SHEETS_TIMEOUT_SECS", 15_u64),
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
                tracing::warn!(key, value = %raw, "Failed to parse env var, using default");
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
