use std::{env, path::PathBuf, str::FromStr};

/// Deployment configuration, read from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_width: u32,
    pub input_height: u32,
    pub plant_common_name: String,
    pub plant_scientific_name: String,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            port: parse_or("PORT", 5000)?,
            model_path: required_path("MODEL_PATH")?,
            labels_path: required_path("LABELS_PATH")?,
            input_width: parse_or("INPUT_WIDTH", 224)?,
            input_height: parse_or("INPUT_HEIGHT", 224)?,
            plant_common_name: env::var("PLANT_COMMON_NAME")
                .unwrap_or_else(|_| "Apple".to_string()),
            plant_scientific_name: env::var("PLANT_SCIENTIFIC_NAME")
                .unwrap_or_else(|_| "Malus domestica".to_string()),
            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 30)?,
            max_concurrent_requests: parse_or("MAX_CONCURRENT_REQUESTS", 8)?,
        })
    }
}

fn required_path(var: &'static str) -> Result<PathBuf, ConfigError> {
    env::var(var)
        .map(PathBuf::from)
        .map_err(|_| ConfigError::MissingVar(var))
}

fn parse_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string())),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(var) => write!(f, "Invalid value for: {}", var),
        }
    }
}

impl std::error::Error for ConfigError {}
