use std::time::Duration;

use ingest_types::{Address, EnhancedTransaction};

use crate::error::AdapterError;

/// Pagination/filter parameters for one page fetch (§6).
#[derive(Debug, Clone, Default)]
pub struct FetchPageParams {
    pub limit: u32,
    pub before: Option<String>,
    pub until: Option<String>,
    pub source: Option<String>,
    pub r#type: Option<String>,
}

/// Thin typed wrapper over the external "enhanced transactions" provider
/// (C9, §6). No pagination/dedup/ordering logic here — that lives in
/// `ingest-worker`.
#[derive(Debug, Clone)]
pub struct TransactionsApiClient {
    http: reqwest::Client,
    base_url: url::Url,
    api_key: String,
}

impl TransactionsApiClient {
    pub fn new(base_url: url::Url, api_key: impl Into<String>) -> Result<Self, AdapterError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AdapterError::Fatal(e.to_string()))?;
        Ok(Self { http, base_url, api_key: api_key.into() })
    }

    /// `GET /addresses/{address}/transactions` (§6).
    pub async fn fetch_page(
        &self,
        address: &Address,
        params: &FetchPageParams,
    ) -> Result<Vec<EnhancedTransaction>, AdapterError> {
        let mut url = self
            .base_url
            .join(&format!("addresses/{}/transactions", address.as_str()))
            .map_err(|e| AdapterError::Fatal(e.to_string()))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api-key", &self.api_key);
            query.append_pair("limit", &params.limit.to_string());
            if let Some(before) = &params.before {
                query.append_pair("before", before);
            }
            if let Some(until) = &params.until {
                query.append_pair("until", until);
            }
            if let Some(source) = &params.source {
                query.append_pair("source", source);
            }
            if let Some(kind) = &params.r#type {
                query.append_pair("type", kind);
            }
        }

        let response = self.http.get(url).send().await.map_err(|e| AdapterError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdapterError::Transient(format!("transactions API returned {}", response.status())));
        }

        response.json().await.map_err(|e| AdapterError::DataShape(e.to_string()))
    }
}
