//! Handles settings for the application. Configuration is written in
//! `settings.toml`; see `settings.example.toml` for the layout.
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
    /// Owner attached to every movement recorded in this session.
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAi {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub openai: OpenAi,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
