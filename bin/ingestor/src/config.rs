//! Environment-driven process configuration (§4 ambient additions, §6
//! "Process interface"). Only the two transport secrets the spec names
//! are truly required from the environment (`API_KEY`, the RPC HTTP/WSS
//! URLs); everything else is a typed default a host may override the
//! same way, since no upstream config framework is in scope (§1).

use std::{env, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct IngestorConfig {
    /// Bearer credential for the transactions-API provider (§6).
    pub api_key: String,
    pub rpc_http_url: url::Url,
    pub rpc_ws_url: url::Url,
    pub transactions_api_base: url::Url,
    /// Bound on concurrent pool workers (§4.7); defaults to the spec's
    /// `max_workers = 3`.
    pub max_workers: usize,
    /// How often the supervisor attempts a new polling round.
    pub poll_interval: Duration,
}

impl IngestorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("API_KEY").context("API_KEY must be set")?;

        let rpc_http_url = env_url("RPC_HTTP_URL", "https://api.mainnet-beta.solana.com")?;
        let rpc_ws_url = env_url("RPC_WSS_URL", "wss://api.mainnet-beta.solana.com")?;
        let transactions_api_base = env_url("TRANSACTIONS_API_BASE", "https://api.example.com")?;

        let max_workers = env_parse("MAX_WORKERS", ingest_supervisor::MAX_WORKERS)?;
        let poll_interval_secs = env_parse("POLL_INTERVAL_SECS", 30u64)?;

        Ok(Self {
            api_key,
            rpc_http_url,
            rpc_ws_url,
            transactions_api_base,
            max_workers,
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }
}

fn env_url(key: &str, default: &str) -> anyhow::Result<url::Url> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    url::Url::parse(&raw).with_context(|| format!("{key} is not a valid URL: {raw}"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_url_falls_back_to_default_when_unset() {
        let url = env_url("INGESTOR_TEST_UNSET_URL", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_parse_rejects_malformed_override() {
        std::env::set_var("INGESTOR_TEST_BAD_NUMBER", "not-a-number");
        let result = env_parse::<u64>("INGESTOR_TEST_BAD_NUMBER", 30);
        std::env::remove_var("INGESTOR_TEST_BAD_NUMBER");
        assert!(result.is_err());
    }
}
