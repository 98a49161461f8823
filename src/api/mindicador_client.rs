// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{CurrencyTable, HistoryResponse};

pub const DEFAULT_BASE_URL: &str = "https://mindicador.cl/api";

/// Read-only access to the indicator service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatesApi: Send + Sync {
    /// `GET <base>`: current value of every known currency.
    async fn fetch_currencies(&self) -> Result<CurrencyTable>;

    /// `GET <base>/<code>`: historical series for one currency.
    async fn fetch_history(&self, code: &str) -> Result<HistoryResponse>;
}

#[derive(Clone)]
pub struct MindicadorClient {
    client: Client,
    base_url: String,
}

impl MindicadorClient {
    /// No timeout is applied unless one is given; a hung request waits forever.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn history_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status(status));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            log::debug!("Raw response from {}: {}", url, text);
            AppError::from(e)
        })
    }
}

#[async_trait]
impl RatesApi for MindicadorClient {
    async fn fetch_currencies(&self) -> Result<CurrencyTable> {
        let body = self.get_json(&self.base_url).await?;
        CurrencyTable::from_json(body)
    }

    async fn fetch_history(&self, code: &str) -> Result<HistoryResponse> {
        if code.is_empty() {
            return Err(AppError::InvalidInput("currency code empty".to_string()));
        }

        let body = self.get_json(&self.history_url(code)).await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = MindicadorClient::new("https://mindicador.cl/api/", None).unwrap();
        assert_eq!(client.base_url(), "https://mindicador.cl/api");
        assert_eq!(client.history_url("dolar"), "https://mindicador.cl/api/dolar");
    }

    #[tokio::test]
    async fn test_empty_code_is_rejected_without_request() {
        let client = MindicadorClient::new(DEFAULT_BASE_URL, None).unwrap();
        let err = client.fetch_history("").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // Nothing listens on port 9 of the loopback interface.
        let client =
            MindicadorClient::new("http://127.0.0.1:9/api", Some(Duration::from_secs(2))).unwrap();
        let err = client.fetch_currencies().await.unwrap_err();
        assert!(err.is_network());
    }
}
