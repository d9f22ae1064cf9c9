use crate::error::{BlockchainError, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

const DEFAULT_DIFFICULTY: u32 = 4;
const DEFAULT_WORKERS: usize = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_RELAY_PROBABILITY: f64 = 0.9;

const DIFFICULTY_KEY: &str = "SIMPLECOIN_DIFFICULTY";
const WORKERS_KEY: &str = "SIMPLECOIN_WORKERS";
const LOG_LEVEL_KEY: &str = "SIMPLECOIN_LOG";
const RELAY_PROBABILITY_KEY: &str = "SIMPLECOIN_RELAY_PROBABILITY";

/// Tunable values, loadable from a TOML file such as:
///
/// ```toml
/// difficulty = 4
/// workers = 2
/// log_level = "debug"
/// relay_probability = 0.9
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Leading zero hex characters a mined block hash must have
    pub difficulty: u32,
    /// Threads used for the nonce search
    pub workers: usize,
    /// Log filter passed to env_logger
    pub log_level: String,
    /// Chance that a peer ledger accepts a relayed transaction in the demo
    pub relay_probability: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            workers: DEFAULT_WORKERS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            relay_probability: DEFAULT_RELAY_PROBABILITY,
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Applies `SIMPLECOIN_*` overrides from a lookup function.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(DIFFICULTY_KEY) {
            self.difficulty = parse_value(DIFFICULTY_KEY, &value)?;
        }
        if let Some(value) = lookup(WORKERS_KEY) {
            self.workers = parse_value(WORKERS_KEY, &value)?;
        }
        if let Some(value) = lookup(LOG_LEVEL_KEY) {
            self.log_level = value;
        }
        if let Some(value) = lookup(RELAY_PROBABILITY_KEY) {
            self.relay_probability = parse_value(RELAY_PROBABILITY_KEY, &value)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(BlockchainError::Config(
                "workers must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.relay_probability) {
            return Err(BlockchainError::Config(format!(
                "relay_probability must be within 0..=1, got {}",
                self.relay_probability
            )));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| BlockchainError::Config(format!("Invalid value for {key}: {e}")))
}

pub struct Config {
    inner: RwLock<Settings>,
    // Environment overrides rejected at startup. Kept until the logger is up.
    env_error: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Defaults plus any valid environment overrides.
    pub fn new() -> Config {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Any bad override discards all of them; the reason is kept for `env_error`
    fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let env_error = match settings.apply_overrides(lookup) {
            Ok(()) => None,
            Err(e) => {
                settings = Settings::default();
                Some(e.to_string())
            }
        };
        Config {
            inner: RwLock::new(settings),
            env_error,
        }
    }

    /// Why the environment overrides were ignored, if they were.
    ///
    /// The global config is built before any logger exists, so the binary
    /// reports this once logging is initialised.
    pub fn env_error(&self) -> Option<&str> {
        self.env_error.as_deref()
    }

    /// Replaces the settings with a TOML file, then reapplies environment overrides.
    pub fn load_file(&self, path: &Path) -> Result<()> {
        let mut settings = Settings::from_file(path)?;
        settings.apply_overrides(|key| env::var(key).ok())?;
        self.set(settings);
        Ok(())
    }

    pub fn get(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, settings: Settings) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn get_difficulty(&self) -> u32 {
        self.get().difficulty
    }

    pub fn set_difficulty(&self, difficulty: u32) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .difficulty = difficulty;
    }

    pub fn get_workers(&self) -> usize {
        self.get().workers
    }

    pub fn set_workers(&self, workers: usize) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .workers = workers.max(1);
    }
}
