use std::{env, net::SocketAddr};

use axum::http::HeaderValue;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Http,
    Stdio,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub transport: TransportKind,
    pub bind_addr: String,
    pub bind_port: u16,
    /// `None` allows any origin.
    pub cors_allow_origin: Option<HeaderValue>,
    pub hh_api_base_url: String,
    pub hh_area: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_TRANSPORT must be one of: http, stdio")]
    InvalidTransport,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("CORS_ALLOW_ORIGIN must be `*` or a valid origin header value")]
    InvalidCorsOrigin,
    #[error("HH_AREA must be a non-negative integer")]
    InvalidArea,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let transport = match var("MCP_TRANSPORT")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("http") => TransportKind::Http,
            Some("stdio") => TransportKind::Stdio,
            Some(_) => return Err(ConfigError::InvalidTransport),
        };
        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let bind_port = var("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8081);
        let cors_allow_origin = var("CORS_ALLOW_ORIGIN")
            .filter(|value| value != "*")
            .map(|value| {
                HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidCorsOrigin)
            })
            .transpose()?;
        let hh_api_base_url =
            var("HH_API_BASE_URL").unwrap_or_else(|| "https://api.hh.ru".to_string());
        let hh_area = var("HH_AREA")
            .map(|value| value.parse::<u32>().map_err(|_| ConfigError::InvalidArea))
            .transpose()?
            .unwrap_or(1);

        let config = Self {
            transport,
            bind_addr,
            bind_port,
            cors_allow_origin,
            hh_api_base_url,
            hh_area,
        };

        if config.transport == TransportKind::Http {
            let _ = config.bind_socket()?;
        }
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}
