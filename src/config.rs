//! Process configuration read from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{Carrier, ValidationError};
use crate::verification::DEFAULT_CODE_TTL;

pub const HOST_VAR: &str = "SMS_GATEWAY_HOST";
pub const PORT_VAR: &str = "SMS_GATEWAY_PORT";
pub const AUTHORITY_URL_VAR: &str = "ACCOUNT_AUTHORITY_URL";
pub const CARRIER_VAR: &str = "SMS_CARRIER";
pub const HTTP_TIMEOUT_VAR: &str = "SMS_HTTP_TIMEOUT_SECS";
pub const USER_AGENT_VAR: &str = "SMS_USER_AGENT";
pub const CODE_TTL_VAR: &str = "SMS_CODE_TTL_SECS";
pub const SEED_FILE_VAR: &str = "SMS_SEED_FILE";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: &'static str },

    #[error("{var} has an invalid value {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("{var}: {source}")]
    Carrier {
        var: &'static str,
        #[source]
        source: ValidationError,
    },
}

/// Gateway settings. Only the account authority URL is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Listen address. Env vars: `SMS_GATEWAY_HOST` (default `0.0.0.0`), `SMS_GATEWAY_PORT`
    /// (default 8080).
    pub listen: SocketAddr,
    /// Base URL of the account authority RPC endpoint. Env var: `ACCOUNT_AUTHORITY_URL`.
    pub authority_url: String,
    /// Carrier serving outbound traffic (default chuanglan). Env var: `SMS_CARRIER`.
    pub carrier: Carrier,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub code_ttl: Duration,
    /// JSON file with provider rows and templates for the in-memory store.
    pub seed_file: Option<PathBuf>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let host = parse_or(get(HOST_VAR), HOST_VAR, IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port = parse_or(get(PORT_VAR), PORT_VAR, DEFAULT_PORT)?;
        let authority_url = get(AUTHORITY_URL_VAR)
            .ok_or(ConfigError::Missing {
                var: AUTHORITY_URL_VAR,
            })?;
        if url::Url::parse(&authority_url).is_err() {
            return Err(ConfigError::Invalid {
                var: AUTHORITY_URL_VAR,
                value: authority_url,
            });
        }

        let carrier = match get(CARRIER_VAR) {
            Some(value) => value.parse().map_err(|source| ConfigError::Carrier {
                var: CARRIER_VAR,
                source,
            })?,
            None => Carrier::Chuanglan,
        };

        let http_timeout =
            seconds_or(get(HTTP_TIMEOUT_VAR), HTTP_TIMEOUT_VAR, DEFAULT_HTTP_TIMEOUT)?;
        let code_ttl = seconds_or(get(CODE_TTL_VAR), CODE_TTL_VAR, DEFAULT_CODE_TTL)?;
        let user_agent = get(USER_AGENT_VAR)
            .unwrap_or_else(|| concat!("sms-gateway/", env!("CARGO_PKG_VERSION")).to_owned());

        Ok(Self {
            listen: SocketAddr::new(host, port),
            authority_url,
            carrier,
            http_timeout,
            user_agent,
            code_ttl,
            seed_file: get(SEED_FILE_VAR).map(PathBuf::from),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

fn seconds_or(
    value: Option<String>,
    var: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::Invalid { var, value: raw }),
        },
        None => Ok(default),
    }
}
