use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::recruitment::{StageRegistry, STANDARD_STAGE_NAMES};

/// Distinguishes runtime behavior for different deployments of the service.
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

/// Top-level configuration for the recruitment service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub recruitment: RecruitmentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let recruitment = match env::var("APP_RECRUITMENT_STAGES") {
            Ok(raw) => RecruitmentConfig::from_list(&raw)?,
            Err(_) => RecruitmentConfig::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            recruitment,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Names of the recruitment pipeline stages, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecruitmentConfig {
    pub stage_names: Vec<String>,
}

impl Default for RecruitmentConfig {
    fn default() -> Self {
        Self {
            stage_names: STANDARD_STAGE_NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl RecruitmentConfig {
    /// Parse a comma-separated stage list such as `Reception, Interview, Contract`.
    pub fn from_list(raw: &str) -> Result<Self, ConfigError> {
        let stage_names: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if stage_names.is_empty() {
            return Err(ConfigError::EmptyStageList);
        }
        if let Some(duplicate) = stage_names
            .iter()
            .enumerate()
            .find(|(idx, name)| stage_names[..*idx].contains(*name))
            .map(|(_, name)| name.clone())
        {
            return Err(ConfigError::DuplicateStage(duplicate));
        }

        Ok(Self { stage_names })
    }

    pub fn registry(&self) -> StageRegistry {
        StageRegistry::from_names(self.stage_names.iter().cloned())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyStageList,
    DuplicateStage(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyStageList => {
                write!(f, "APP_RECRUITMENT_STAGES must name at least one stage")
            }
            ConfigError::DuplicateStage(name) => {
                write!(f, "APP_RECRUITMENT_STAGES lists '{name}' more than once")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
