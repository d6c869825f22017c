use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::allocation::eligibility::EligibilityPolicy;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the allocation engine and its command line.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub eligibility: EligibilityPolicy,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_dir = env::var("HOUSING_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = EligibilityPolicy::default();
        let single_min_age = age_var("HOUSING_SINGLE_MIN_AGE", defaults.single_min_age)?;
        let married_min_age = age_var("HOUSING_MARRIED_MIN_AGE", defaults.married_min_age)?;

        Ok(Self {
            environment,
            storage: StorageConfig {
                data_dir: PathBuf::from(data_dir),
            },
            telemetry: TelemetryConfig { log_level },
            eligibility: EligibilityPolicy {
                single_min_age,
                married_min_age,
            },
        })
    }
}

fn age_var(var: &'static str, default: u8) -> Result<u8, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u8>()
            .map_err(|_| ConfigError::InvalidAge { var }),
        Err(_) => Ok(default),
    }
}

/// Location of the CSV record store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidAge { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAge { var } => {
                write!(f, "{var} must be a whole number of years between 0 and 255")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
