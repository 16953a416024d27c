use std::{env, time::Duration};

use chrono_tz::Tz;
use url::Url;

use super::env::{
    AppConfig, CalendarConfig, ConfigError, DirectoryConfig, LoggingConfig, MailConfig,
    RegionConfig, ServerConfig, SpamConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = parse_int::<u16>("PORT").unwrap_or(8080);
        let public_base_url = match env::var("PUBLIC_BASE_URL") {
            Ok(raw) => parse_url("PUBLIC_BASE_URL", &raw)?,
            Err(_) => parse_url("PUBLIC_BASE_URL", &format!("http://localhost:{port}"))?,
        };
        let server = ServerConfig {
            port,
            public_base_url,
        };

        let mail = MailConfig {
            host: require("MAIL_HOST")?,
            port: parse_int::<u16>("MAIL_PORT").unwrap_or(465),
            secure: parse_bool("MAIL_SECURE").unwrap_or(true),
            user: require("MAIL_USER")?,
            pass: require("MAIL_PASS")?,
            to_submission: require("MAIL_TO_FORM_SUBMISSION")?,
            to_spam: require("MAIL_TO_FORM_SPAM")?,
        };

        let region = RegionConfig {
            lookup_base_url: match env::var("REGION_LOOKUP_URL") {
                Ok(raw) => parse_url("REGION_LOOKUP_URL", &raw)?,
                Err(_) => parse_url("REGION_LOOKUP_URL", "https://ipapi.co")?,
            },
            lookup_timeout: Duration::from_millis(
                parse_int::<u64>("REGION_LOOKUP_TIMEOUT_MS").unwrap_or(5_000),
            ),
        };

        let calendar = CalendarConfig {
            feed_url: match env::var("CALENDAR_FEED_URL").ok().filter(|v| !v.is_empty()) {
                Some(raw) => Some(parse_url("CALENDAR_FEED_URL", &raw)?),
                None => None,
            },
            sync_cron: env::var("CALENDAR_SYNC_CRON").unwrap_or_else(|_| "0 * * * * *".to_string()),
        };

        let spam = SpamConfig {
            reject_threshold: parse_int::<u32>("SPAM_REJECT_THRESHOLD").unwrap_or(5),
            flag_threshold: parse_int::<u32>("SPAM_FLAG_THRESHOLD").unwrap_or(2),
            reset_cron: env::var("TRACKER_RESET_CRON").unwrap_or_else(|_| "0 0 0 * * *".to_string()),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            store_filename: env::var("STORE_FILENAME")
                .unwrap_or_else(|_| "held_spam.json".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let timezone = env::var("TIMEZONE")
            .unwrap_or_else(|_| "Europe/Berlin".to_string())
            .parse::<Tz>()
            .map_err(|err| ConfigError::Invalid {
                key: "TIMEZONE",
                message: err.to_string(),
            })?;

        Ok(Self {
            server,
            mail,
            region,
            calendar,
            spam,
            directories,
            logging,
            timezone,
        })
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_int<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse::<T>().ok())
}

fn parse_bool(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        )
    })
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|err| ConfigError::Invalid {
        key,
        message: err.to_string(),
    })
}
