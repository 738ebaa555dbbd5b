use crate::error::ApiError;
use core_types::{MarketHistory, PricePoint, VolumePoint};
use serde::Deserialize;

/// The response from a successful `GET /coins/{id}/market_chart` request.
///
/// Every entry is a `[timestamp_ms, value]` pair. CoinGecko occasionally sends
/// `null` values; those are kept as NaN so the series stay aligned, and the
/// return-series builder discards them later.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChartResponse {
    #[serde(default)]
    pub prices: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, Option<f64>)>,
    // `market_caps` is also returned but unused.
}

impl MarketChartResponse {
    /// Validates the payload and converts it into a `MarketHistory`.
    pub fn into_history(self) -> Result<MarketHistory, ApiError> {
        if self.prices.is_empty() || self.total_volumes.is_empty() {
            return Err(ApiError::EmptyData);
        }

        let prices = self
            .prices
            .into_iter()
            .map(|(ts, price)| {
                Ok(PricePoint {
                    timestamp_ms: timestamp_ms(ts)?,
                    price: price.unwrap_or(f64::NAN),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        let volumes = self
            .total_volumes
            .into_iter()
            .map(|(ts, volume)| {
                Ok(VolumePoint {
                    timestamp_ms: timestamp_ms(ts)?,
                    volume: volume.unwrap_or(f64::NAN),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        MarketHistory::new(prices, volumes).map_err(|e| ApiError::InvalidData(e.to_string()))
    }
}

fn timestamp_ms(raw: f64) -> Result<i64, ApiError> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(ApiError::InvalidData(format!("Invalid timestamp: {raw}")));
    }
    Ok(raw as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<MarketHistory, ApiError> {
        serde_json::from_str::<MarketChartResponse>(json)
            .expect("valid json")
            .into_history()
    }

    #[test]
    fn converts_pairs_into_points() {
        let history = parse(
            r#"{"prices": [[1700000000000, 37000.5], [1700086400000, null]],
                "market_caps": [[1700000000000, 1.0]],
                "total_volumes": [[1700000000000, 12.0], [1700086400000, 13.0]]}"#,
        )
        .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.prices[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(history.prices[0].price, 37000.5);
        assert!(history.prices[1].price.is_nan());
        assert_eq!(history.volumes[1].volume, 13.0);
    }

    #[test]
    fn missing_or_empty_lists_are_empty_data() {
        assert!(matches!(parse(r#"{}"#), Err(ApiError::EmptyData)));
        assert!(matches!(
            parse(r#"{"prices": [[1, 2.0]], "total_volumes": []}"#),
            Err(ApiError::EmptyData)
        ));
    }

    #[test]
    fn misaligned_lists_are_invalid() {
        let result = parse(r#"{"prices": [[1, 2.0], [2, 3.0]], "total_volumes": [[1, 5.0]]}"#);
        assert!(matches!(result, Err(ApiError::InvalidData(_))));
    }
}
