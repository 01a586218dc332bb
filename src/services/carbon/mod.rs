//! Carbon-emissions helper backed by the agency's Data Fair datasets.
//!
//! Everything here is best-effort: factor lines have no fixed schema, so the
//! value and unit of a factor are guessed and may be absent.

mod client;
mod heuristics;
mod units;

pub use client::{DataFairClient, LinesPage, DEFAULT_DATAFAIR_BASE};
pub use heuristics::{guess_factor_unit, guess_factor_value};
pub use units::{compute_emissions, convert_amount, normalize_unit, EMISSIONS_UNIT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {message}")]
    Response { url: String, message: String },

    #[error("unsupported conversion: {from} -> {to}")]
    UnsupportedConversion { from: String, to: String },
}
