//! HTTP drivers for the systems the relay echo service talks to
//!
//! - `gatekeeper`: topology, access classification and relay test proposals
//! - `ping_monitor`: external ICMP measurement requests and event subscription

pub mod gatekeeper;
pub mod ping_monitor;

pub use gatekeeper::HttpGatekeeper;
pub use ping_monitor::HttpPingMonitor;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// List envelope used by the gatekeeper's responses
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub data: Vec<T>,
}

/// Build the base URL of a system
pub(crate) fn base_url(address: &str, port: u16, secure: bool) -> Result<Url> {
    let scheme = if secure { "https" } else { "http" };
    Url::parse(&format!("{scheme}://{address}:{port}/"))
        .with_context(|| format!("Invalid system address {address}:{port}"))
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}


#[cfg(test)]
mod driver_tests;
