//! Failure taxonomy for the pipeline
//!
//! Only two things are fatal: an unreachable/refusing upstream and a
//! response missing its expected top-level field. Everything below that
//! level (an unparseable cell, an unmapped code, a short key tuple)
//! degrades to an absent value during normalization and never produces an
//! error, so a broken record can't masquerade as "no data exists".

use thiserror::Error;

pub type StatResult<T> = Result<T, StatError>;

#[derive(Error, Debug)]
pub enum StatError {
    /// Network failure or a non-2xx status from the statistics API.
    /// Propagates to the render boundary; the chart shows an error state.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The response decoded as JSON but the expected top-level field is
    /// missing ("variables" for metadata, "data" for tables).
    #[error("malformed {context} response: missing \"{field}\"")]
    MalformedResponse {
        field: &'static str,
        context: &'static str,
    },
}

impl From<reqwest::Error> for StatError {
    fn from(err: reqwest::Error) -> Self {
        StatError::UpstreamUnavailable(err.to_string())
    }
}
