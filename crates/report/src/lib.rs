//! # Report
//!
//! Assembles the final per-asset payload and renders its chart.
//!
//! - `ReportAssembler`: copies forecasts and risk statistics into a `ReportPayload`.
//! - `ReportRenderer`: the chart seam; `SvgReportRenderer` is the default.
//! - `ReportError`: the specific error types that can be returned from this crate.

pub mod assembler;
pub mod error;
pub mod payload;
pub mod renderer;

#[cfg(test)]
mod test_util;

pub use assembler::ReportAssembler;
pub use error::ReportError;
pub use payload::ReportPayload;
pub use renderer::{RenderInput, ReportRenderer, SvgReportRenderer};
