use crate::error::ApiError;
use crate::responses::MarketChartResponse;
use crate::retry::{run_with_retry, Attempt, RetryPolicy};
use async_trait::async_trait;
use configuration::ProviderConfig;
use core_types::MarketHistory;
use reqwest::StatusCode;

pub mod error;
pub mod responses;
pub mod retry;

/// Longest slice of an upstream error body copied into the logs.
const MAX_LOGGED_BODY: usize = 512;

/// The abstract interface for a market-data provider.
/// The pipeline only depends on this trait, so the real client can be swapped
/// for an in-memory one in tests.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches `lookback_days` of daily price and volume history for `asset_id`,
    /// quoted in `currency`.
    async fn fetch_history(
        &self,
        asset_id: &str,
        lookback_days: u32,
        currency: &str,
    ) -> Result<MarketHistory, ApiError>;
}

/// A concrete implementation of `MarketDataClient` for the CoinGecko API.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl CoinGeckoClient {
    /// Builds a client whose every call is bounded by `provider.timeout_secs`.
    /// A call that exceeds it counts as a network failure and is retried.
    pub fn new(provider: &ProviderConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(provider.timeout())
            .timeout(provider.timeout())
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self::with_client(
            client,
            provider.base_url.clone(),
            RetryPolicy::from(provider),
        ))
    }

    pub fn with_client(client: reqwest::Client, base_url: String, policy: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    /// Performs one HTTP round trip and classifies the outcome for the retry loop.
    async fn attempt_market_chart(
        &self,
        url: &str,
        query: &[(&str, String)],
        attempt: u32,
    ) -> Attempt<MarketChartResponse> {
        tracing::debug!(url, attempt, "Requesting market chart.");

        let response = match self.client.get(url).query(query).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::failed(ApiError::Network(e.to_string())),
        };

        let status = response.status();
        if status == StatusCode::OK {
            return match response.json::<MarketChartResponse>().await {
                Ok(payload) => Attempt::Success(payload),
                Err(e) if e.is_decode() => Attempt::failed(ApiError::Deserialization(e.to_string())),
                Err(e) => Attempt::failed(ApiError::Network(e.to_string())),
            };
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::failed(ApiError::RateLimited);
        }

        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_LOGGED_BODY).collect();
        tracing::error!(
            status = status.as_u16(),
            body = %body,
            "Market-data provider rejected the request."
        );
        Attempt::failed(ApiError::Upstream {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl MarketDataClient for CoinGeckoClient {
    async fn fetch_history(
        &self,
        asset_id: &str,
        lookback_days: u32,
        currency: &str,
    ) -> Result<MarketHistory, ApiError> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, asset_id);
        let query = [
            ("vs_currency", currency.to_string()),
            ("days", lookback_days.to_string()),
        ];

        let payload = run_with_retry(
            self.policy,
            |attempt| self.attempt_market_chart(&url, &query, attempt),
            tokio::time::sleep,
        )
        .await
        .inspect_err(|e| {
            if let ApiError::UpstreamExhausted { attempts, .. } = e {
                tracing::error!(asset_id, attempts, "Giving up on market-data provider.");
            }
        })?;

        let history = payload.into_history()?;
        tracing::debug!(asset_id, points = history.len(), "Fetched market history.");
        Ok(history)
    }
}
