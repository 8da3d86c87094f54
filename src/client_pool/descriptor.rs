//! Outbound client identity.
//!
//! # Responsibilities
//! - Represent a single egress identity (optionally bound source address)
//! - Own the HTTP client issuing every request made through that identity
//! - Apply per-request timeout, redirect policy, cookies and default headers

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use thiserror::Error;

use crate::config::ClientsConfig;

/// Errors raised while building clients from configuration.
#[derive(Debug, Error)]
pub enum ClientPoolError {
    #[error("invalid source address '{0}'")]
    InvalidAddress(String),

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("cannot build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// A single configured outbound client.
#[derive(Debug, Clone)]
pub struct ClientDescriptor {
    /// Bound local address, `None` lets the OS choose.
    pub source_address: Option<IpAddr>,
    /// HTTP client bound to that address.
    pub http: reqwest::Client,
}

impl ClientDescriptor {
    /// Build a client for the given source address.
    ///
    /// Redirects are never followed: a 302 is a classification signal.
    pub fn new(source_address: Option<IpAddr>, config: &ClientsConfig) -> Result<Self, ClientPoolError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::none())
            .cookie_store(config.enable_cookies)
            .default_headers(default_headers(config)?);

        if let Some(addr) = source_address {
            builder = builder.local_address(addr);
        }

        Ok(Self {
            source_address,
            http: builder.build()?,
        })
    }
}

impl fmt::Display for ClientDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source_address {
            Some(addr) => write!(f, "{}", addr),
            None => f.write_str("default"),
        }
    }
}

fn default_headers(config: &ClientsConfig) -> Result<HeaderMap, ClientPoolError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ClientPoolError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ClientPoolError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
