use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Builds the shared client. Only the first call decides the timeout.
pub fn init_http_client(timeout_secs: u64) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(concat!("academy_roster/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")
    })
}

pub fn http_client() -> Result<&'static Client> {
    init_http_client(DEFAULT_TIMEOUT_SECS)
}
