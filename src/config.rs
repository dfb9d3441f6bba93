use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the pipeline.
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

/// Top-level runtime configuration, read from the environment once.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            environment,
            telemetry: TelemetryConfig { log_level },
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Immutable description of one batch run: every input path and processing
/// knob, constructed once from the CLI and passed by reference.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub registry_path: PathBuf,
    pub crosswalk_path: PathBuf,
    pub area_weights_path: PathBuf,
    pub area_counties_path: PathBuf,
    pub nri_path: PathBuf,
    pub svi_path: PathBuf,
    pub wildfire_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub batch_size: usize,
    pub top_n: usize,
    pub expected_min_counties: usize,
}

impl BuildConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBatchSize,
    InvalidTopN,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBatchSize => write!(f, "batch size must be at least 1"),
            ConfigError::InvalidTopN => write!(f, "top-N size must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_config() -> BuildConfig {
        BuildConfig {
            registry_path: PathBuf::from("registry.json"),
            crosswalk_path: PathBuf::from("crosswalk.json"),
            area_weights_path: PathBuf::from("weights.json"),
            area_counties_path: PathBuf::from("relations.json"),
            nri_path: PathBuf::from("nri.csv"),
            svi_path: PathBuf::from("svi.csv"),
            wildfire_path: None,
            output_dir: PathBuf::from("out"),
            batch_size: 25,
            top_n: 5,
            expected_min_counties: 1,
        }
    }

    #[test]
    fn environment_parses_known_stages() {
        assert_eq!(AppEnvironment::from_str("production"), AppEnvironment::Production);
        assert_eq!(AppEnvironment::from_str("CI"), AppEnvironment::Test);
        assert_eq!(AppEnvironment::from_str("anything"), AppEnvironment::Development);
    }

    #[test]
    fn zero_knobs_fail_validation() {
        let mut config = build_config();
        assert!(config.validate().is_ok());

        config.batch_size = 0;
        assert!(config.validate().is_err());

        config.batch_size = 25;
        config.top_n = 0;
        assert!(config.validate().is_err());
    }
}
