// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::RatesApi;
use crate::error::Result;
use crate::models::{CurrencyTable, HistoryResponse};

/// Session-wide history cache. Grows monotonically; no eviction or expiry.
#[derive(Debug, Default)]
pub struct RateCache {
    entries: HashMap<String, Arc<HistoryResponse>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<Arc<HistoryResponse>> {
        self.entries.get(code).cloned()
    }

    pub fn insert(&mut self, code: &str, response: HistoryResponse) -> Arc<HistoryResponse> {
        let response = Arc::new(response);
        self.entries.insert(code.to_string(), Arc::clone(&response));
        response
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Data access: the remote service fronted by the history cache.
pub struct RateService {
    api: Arc<dyn RatesApi>,
    cache: RateCache,
}

impl RateService {
    pub fn new(api: Arc<dyn RatesApi>) -> Self {
        Self {
            api,
            cache: RateCache::new(),
        }
    }

    /// One network read, no retry.
    pub async fn list_currencies(&self) -> Result<CurrencyTable> {
        self.api.fetch_currencies().await
    }

    /// Cache hit without touching the network.
    pub fn cached_history(&self, code: &str) -> Option<Arc<HistoryResponse>> {
        self.cache.get(code)
    }

    /// Returns the cached response when present; otherwise fetches it and
    /// stores the full response under `code`. A failed fetch leaves the cache
    /// untouched so the next call goes back to the network.
    pub async fn fetch_history(&mut self, code: &str) -> Result<Arc<HistoryResponse>> {
        if let Some(hit) = self.cached_history(code) {
            log::debug!("History cache hit for {}", code);
            return Ok(hit);
        }

        let response = self.history_request(code).await?;
        Ok(self.store_history(code, response))
    }

    /// The network read behind a cache miss, detached from the service so it
    /// can be awaited elsewhere. Hand a success back through `store_history`.
    pub fn history_request(&self, code: &str) -> BoxFuture<'static, Result<HistoryResponse>> {
        log::debug!("History cache miss for {}", code);
        let api = Arc::clone(&self.api);
        let code = code.to_string();
        Box::pin(async move { api.fetch_history(&code).await })
    }

    pub fn store_history(&mut self, code: &str, response: HistoryResponse) -> Arc<HistoryResponse> {
        self.cache.insert(code, response)
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockRatesApi;
    use crate::error::AppError;
    use crate::models::SeriesPoint;

    fn dolar_history() -> HistoryResponse {
        HistoryResponse {
            code: Some("dolar".to_string()),
            name: Some("Dólar observado".to_string()),
            unit: Some("Pesos".to_string()),
            series: vec![
                SeriesPoint {
                    date: "2024-05-10T04:00:00.000Z".to_string(),
                    value: 925.5,
                },
                SeriesPoint {
                    date: "2024-05-09T04:00:00.000Z".to_string(),
                    value: 930.1,
                },
            ],
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_second_fetch_hits_cache() {
        let mut api = MockRatesApi::new();
        api.expect_fetch_history()
            .withf(|code: &str| code == "dolar")
            .times(1)
            .returning(|_| Ok(dolar_history()));

        let mut service = RateService::new(Arc::new(api));
        let first = service.fetch_history("dolar").await.unwrap();
        let second = service.fetch_history("dolar").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.series.len(), 2);
        assert_eq!(service.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let mut api = MockRatesApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_fetch_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::Parse("expected value".to_string())));
        api.expect_fetch_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(dolar_history()));

        let mut service = RateService::new(Arc::new(api));
        assert!(service.fetch_history("dolar").await.is_err());
        assert!(!service.cache().contains("dolar"));

        let retried = service.fetch_history("dolar").await.unwrap();
        assert_eq!(retried.code.as_deref(), Some("dolar"));
        assert!(service.cache().contains("dolar"));
    }

    #[tokio::test]
    async fn test_codes_are_cached_independently() {
        let mut api = MockRatesApi::new();
        api.expect_fetch_history().times(2).returning(|code| {
            let mut history = dolar_history();
            history.code = Some(code.to_string());
            Ok(history)
        });

        let mut service = RateService::new(Arc::new(api));
        service.fetch_history("dolar").await.unwrap();
        let euro = service.fetch_history("euro").await.unwrap();

        assert_eq!(euro.code.as_deref(), Some("euro"));
        assert_eq!(service.cache().len(), 2);
        assert!(service.cached_history("uf").is_none());
    }

    #[tokio::test]
    async fn test_detached_request_only_caches_when_stored() {
        let mut api = MockRatesApi::new();
        api.expect_fetch_history()
            .times(1)
            .returning(|_| Ok(dolar_history()));

        let mut service = RateService::new(Arc::new(api));
        let response = service.history_request("dolar").await.unwrap();
        assert!(!service.cache().contains("dolar"));

        let stored = service.store_history("dolar", response);
        let hit = service.fetch_history("dolar").await.unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
    }
}
