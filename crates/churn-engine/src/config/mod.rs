use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Wall-clock budget for one external scorer invocation.
pub const DEFAULT_SCORER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SCORER_COMMAND: &str = "python ml/model_store.py";
pub const DEFAULT_METRICS_PATH: &str = "./models/metrics.json";

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

/// Top-level configuration for the prediction service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scorer: ScorerConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let kind = env::var("CHURN_SCORER")
            .unwrap_or_else(|_| ScorerKind::Rules.label().to_string())
            .parse::<ScorerKind>()?;

        let command =
            env::var("CHURN_SCORER_COMMAND").unwrap_or_else(|_| DEFAULT_SCORER_COMMAND.to_string());
        let (program, args) = split_command(&command)?;

        let working_dir = env::var("CHURN_SCORER_WORKDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let timeout = match env::var("CHURN_SCORER_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            Err(_) => DEFAULT_SCORER_TIMEOUT,
        };

        let metrics_path = env::var("CHURN_METRICS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_METRICS_PATH));

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            scorer: ScorerConfig {
                kind,
                process: ProcessScorerConfig {
                    program,
                    args,
                    working_dir,
                    timeout,
                },
            },
            metrics: MetricsConfig { metrics_path },
        })
    }
}

fn split_command(command: &str) -> Result<(String, Vec<String>), ConfigError> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next().ok_or(ConfigError::EmptyScorerCommand)?;
    Ok((program, parts.collect()))
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
    pub ansi: bool,
}

/// Which scorer implementation backs the prediction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    Rules,
    Process,
}

impl ScorerKind {
    pub const fn label(self) -> &'static str {
        match self {
            ScorerKind::Rules => "rules",
            ScorerKind::Process => "process",
        }
    }
}

impl FromStr for ScorerKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rules" | "rule" => Ok(Self::Rules),
            "process" | "external" => Ok(Self::Process),
            other => Err(ConfigError::UnknownScorer(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub kind: ScorerKind,
    pub process: ProcessScorerConfig,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            kind: ScorerKind::Rules,
            process: ProcessScorerConfig::default(),
        }
    }
}

/// Launch settings for the external scoring program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessScorerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl ProcessScorerConfig {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: PathBuf::from("."),
            timeout: DEFAULT_SCORER_TIMEOUT,
        }
    }

    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ProcessScorerConfig {
    fn default() -> Self {
        let (program, args) = split_command(DEFAULT_SCORER_COMMAND)
            .unwrap_or_else(|_| ("python".to_string(), Vec::new()));
        Self::new(program, args)
    }
}

/// Location of the side-loaded evaluation metrics artifact.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub metrics_path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnknownScorer(String),
    EmptyScorerCommand,
    InvalidTimeout(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnknownScorer(value) => write!(
                f,
                "CHURN_SCORER must be 'rules' or 'process' (found '{value}')"
            ),
            ConfigError::EmptyScorerCommand => {
                write!(f, "CHURN_SCORER_COMMAND must name a program to run")
            }
            ConfigError::InvalidTimeout(value) => write!(
                f,
                "CHURN_SCORER_TIMEOUT_SECS must be a positive integer (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::UnknownScorer(_)
            | ConfigError::EmptyScorerCommand
            | ConfigError::InvalidTimeout(_) => None,
        }
    }
}
