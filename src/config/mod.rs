pub mod env;
mod loader;

pub use env::{
    AppConfig, CalendarConfig, ConfigError, DirectoryConfig, MailConfig, RegionConfig,
    ServerConfig, SpamConfig,
};
pub use loader::load_config;
