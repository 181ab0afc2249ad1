use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Config {
    /// Load the shared settings.
    ///
    /// Sources, lowest precedence first: built-in defaults, an optional
    /// `configuration` file, `APP__*` environment variables, then the bare
    /// `PORT` variable most hosting platforms inject.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .set_default("port", i64::from(DEFAULT_PORT))?
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", std::env::var("PORT").ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
