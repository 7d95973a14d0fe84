//! Configuration module for the Animals API.
//!
//! Loads configuration from YAML files and environment variables.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Port used when `PORT` is unset or not a valid port number.
pub const DEFAULT_PORT: u16 = 3333;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which datastore the router talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Managed Supabase project, reached over its REST interface.
    Supabase,
    /// Local SQLite database.
    Sqlite,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Supabase => write!(f, "supabase"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Datastore configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: Backend,
    /// Supabase project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub supabase_url: String,
    /// Supabase API key (anon or service role).
    #[serde(default)]
    pub supabase_key: String,
    /// Table holding the animals.
    pub table: String,
    /// Per-request timeout for the Supabase client.
    pub timeout_secs: u64,
    /// Connection string for the SQLite backend.
    pub sqlite_url: String,
}

/// Plain process variables that take precedence over everything else.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub port: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl EnvOverrides {
    /// Read `PORT`, `SUPABASE_URL` and `SUPABASE_KEY` from the process.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT").ok(),
            supabase_url: std::env::var("SUPABASE_URL").ok(),
            supabase_key: std::env::var("SUPABASE_KEY").ok(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. PORT, SUPABASE_URL, SUPABASE_KEY
    /// 2. Environment variables (ANIMALS__*)
    /// 3. config/local.yaml (if exists)
    /// 4. config/default.yaml (if exists)
    /// 5. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(&EnvOverrides::from_env())
    }

    /// Same as [`Config::load`] with the plain variables supplied by the caller.
    pub fn load_with(overrides: &EnvOverrides) -> Result<Self, ConfigError> {
        Self::load_from(overrides, prefixed_env())
    }

    fn load_from(overrides: &EnvOverrides, env: Environment) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("database.backend", "supabase")?
            .set_default("database.table", "animals")?
            .set_default("database.timeout_secs", 10_i64)?
            .set_default("database.sqlite_url", "sqlite::memory:")?
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with ANIMALS__ prefix
            .add_source(env)
            .set_override_option(
                "server.port",
                parse_port(overrides.port.as_deref()).map(i64::from),
            )?
            .set_override_option("database.supabase_url", overrides.supabase_url.clone())?
            .set_override_option("database.supabase_key", overrides.supabase_key.clone())?
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend == Backend::Supabase {
            if self.database.supabase_url.trim().is_empty() {
                return Err(ConfigError::Message(
                    "SUPABASE_URL is required for the supabase backend".to_string(),
                ));
            }
            if self.database.supabase_key.trim().is_empty() {
                return Err(ConfigError::Message(
                    "SUPABASE_KEY is required for the supabase backend".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn prefixed_env() -> Environment {
    Environment::with_prefix("ANIMALS")
        .separator("__")
        .try_parsing(true)
}

/// Parse a `PORT` value. Anything that is not a port number is ignored.
pub fn parse_port(raw: Option<&str>) -> Option<u16> {
    raw.and_then(|p| p.trim().parse::<u16>().ok())
}
