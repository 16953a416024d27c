use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mail: MailConfig,
    pub region: RegionConfig,
    pub calendar: CalendarConfig,
    pub spam: SpamConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub timezone: Tz,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL under which the service is reachable from outside; used to
    /// build the accept/reject links in spam report mails.
    pub public_base_url: Url,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub pass: String,
    pub to_submission: String,
    pub to_spam: String,
}

#[derive(Debug, Clone)]
pub struct RegionConfig {
    pub lookup_base_url: Url,
    pub lookup_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// ICS feed with the booked events; sync is skipped entirely when unset.
    pub feed_url: Option<Url>,
    pub sync_cron: String,
}

#[derive(Debug, Clone)]
pub struct SpamConfig {
    pub reject_threshold: u32,
    pub flag_threshold: u32,
    pub reset_cron: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub store_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid {
        key: &'static str,
        message: String,
    },
}
