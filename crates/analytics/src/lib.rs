//! # Analytics
//!
//! Turns raw market history into a return series and derives the risk
//! statistics reported for an asset.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` and `configuration`.
//! - **Stateless Calculation:** `ReturnSeriesBuilder` and `AnalyticsEngine` are stateless
//!   calculators. They take raw data as input and produce an `ObservationSeries` and a
//!   `RiskReport` as output.
//!
//! ## Public API
//!
//! - `ReturnSeriesBuilder`: cleans, orders and differences raw price/volume points.
//! - `AnalyticsEngine`: computes Sharpe, Sortino, skew and kurtosis.
//! - `RiskReport`: the immutable result of a risk computation.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;
pub mod returns;

#[cfg(test)]
mod test_util;

// Re-export the key components to create a clean, public-facing API.
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::RiskReport;
pub use returns::ReturnSeriesBuilder;
