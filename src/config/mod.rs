//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "pulseboard";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RANKING_FAN_OUT: usize = 8;
const DEFAULT_LEADERBOARD_SIZE: usize = 5;

/// Command-line arguments for the Pulseboard binary.
#[derive(Debug, Parser)]
#[command(name = "pulseboard", version, about = "Pulseboard analytics server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PULSEBOARD_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the evaluation service base URL.
    #[arg(long = "upstream-base-url", value_name = "URL")]
    pub upstream_base_url: Option<String>,

    /// Override the per-call upstream timeout.
    #[arg(long = "upstream-timeout-seconds", value_name = "SECONDS")]
    pub upstream_timeout_seconds: Option<u64>,

    /// Override the maximum number of in-flight post fetches during ranking.
    #[arg(long = "ranking-fan-out", value_name = "COUNT")]
    pub ranking_fan_out: Option<usize>,

    /// Override the number of leaderboard entries the ranking keeps.
    #[arg(long = "ranking-leaderboard-size", value_name = "COUNT")]
    pub ranking_leaderboard_size: Option<usize>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub upstream: UpstreamSettings,
    pub ranking: RankingSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub credentials: Option<CredentialSet>,
}

/// Credential material presented to the upstream `/auth` endpoint.
///
/// Serialization uses the upstream wire field names; deserialization reads
/// the snake_case keys used in configuration files and environment
/// variables. Values are never compiled into the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub email: String,
    pub name: String,
    #[serde(rename(serialize = "rollNo"))]
    pub roll_no: String,
    #[serde(rename(serialize = "accessCode"))]
    pub access_code: String,
    #[serde(rename(serialize = "clientID"))]
    pub client_id: String,
    #[serde(rename(serialize = "clientSecret"))]
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct RankingSettings {
    pub fan_out: NonZeroUsize,
    pub leaderboard_size: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Parse the command line and load settings in one step.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("PULSEBOARD").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    upstream: RawUpstreamSettings,
    ranking: RawRankingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
    credentials: RawCredentialSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCredentialSettings {
    email: Option<String>,
    name: Option<String>,
    roll_no: Option<String>,
    access_code: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRankingSettings {
    fan_out: Option<usize>,
    leaderboard_size: Option<usize>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.upstream_base_url.as_ref() {
            self.upstream.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.upstream_timeout_seconds {
            self.upstream.timeout_seconds = Some(seconds);
        }
        if let Some(count) = overrides.ranking_fan_out {
            self.ranking.fan_out = Some(count);
        }
        if let Some(count) = overrides.ranking_leaderboard_size {
            self.ranking.leaderboard_size = Some(count);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            upstream,
            ranking,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let upstream = build_upstream_settings(upstream)?;
        let ranking = build_ranking_settings(ranking)?;

        Ok(Self {
            server,
            logging,
            upstream,
            ranking,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let listen_addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.listen_addr", reason))?;

    Ok(ServerSettings { listen_addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let base_url = upstream.base_url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.trim_end_matches('/').to_string())
    });

    let timeout_secs = upstream
        .timeout_seconds
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "upstream.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let credentials = build_credential_set(upstream.credentials)?;

    Ok(UpstreamSettings {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
        credentials,
    })
}

fn build_credential_set(
    raw: RawCredentialSettings,
) -> Result<Option<CredentialSet>, LoadError> {
    let RawCredentialSettings {
        email,
        name,
        roll_no,
        access_code,
        client_id,
        client_secret,
    } = raw;

    let fields = [
        &email,
        &name,
        &roll_no,
        &access_code,
        &client_id,
        &client_secret,
    ];
    let provided = fields.iter().filter(|value| value.is_some()).count();

    if provided == 0 {
        return Ok(None);
    }
    if provided < fields.len() {
        return Err(LoadError::invalid(
            "upstream.credentials",
            "all of email, name, roll_no, access_code, client_id and client_secret must be set together",
        ));
    }

    let require = |value: Option<String>, key: &'static str| {
        let value = value.unwrap_or_default();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Err(LoadError::invalid(key, "must not be empty"))
        } else {
            Ok(trimmed.to_string())
        }
    };

    Ok(Some(CredentialSet {
        email: require(email, "upstream.credentials.email")?,
        name: require(name, "upstream.credentials.name")?,
        roll_no: require(roll_no, "upstream.credentials.roll_no")?,
        access_code: require(access_code, "upstream.credentials.access_code")?,
        client_id: require(client_id, "upstream.credentials.client_id")?,
        client_secret: require(client_secret, "upstream.credentials.client_secret")?,
    }))
}

fn build_ranking_settings(ranking: RawRankingSettings) -> Result<RankingSettings, LoadError> {
    let fan_out = ranking.fan_out.unwrap_or(DEFAULT_RANKING_FAN_OUT);
    let fan_out = NonZeroUsize::new(fan_out)
        .ok_or_else(|| LoadError::invalid("ranking.fan_out", "must be greater than zero"))?;

    let leaderboard_size = ranking.leaderboard_size.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
    let leaderboard_size = NonZeroUsize::new(leaderboard_size).ok_or_else(|| {
        LoadError::invalid("ranking.leaderboard_size", "must be greater than zero")
    })?;

    Ok(RankingSettings {
        fan_out,
        leaderboard_size,
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    format!("{host}:{port}")
        .parse()
        .map_err(|err| format!("failed to parse `{host}:{port}`: {err}"))
}
