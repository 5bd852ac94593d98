//! Table fetching
//!
//! `POST {base}/{lang}/stat/{dataset}` with `{"query": [...], "response":
//! {"format": "json"}}` returns `{"data": [{"key": [...], "values":
//! [...]}, ...]}`. One call per render, no retries: an outer layer may
//! add a retry policy, the pipeline does not.

use serde::{Deserialize, Serialize};

use crate::error::{StatError, StatResult};
use crate::query::FilterQuery;

/// One raw table row: a key tuple (one component per dimension, in
/// dataset-declared order) plus the value payload. `values[0]` is the
/// measurement; cells stay untyped here because the API mixes numeric
/// strings with placeholder tokens.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawRow {
    #[serde(default)]
    pub key: Vec<String>,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct TableRequest<'a> {
    query: &'a FilterQuery,
    response: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    format: &'static str,
}

/// Decode a table body. Missing "data" is fatal; a malformed row inside
/// the array degrades to an empty row (which normalizes to absent fields).
pub fn parse_table(body: &serde_json::Value) -> StatResult<Vec<RawRow>> {
    let data = body
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or(StatError::MalformedResponse {
            field: "data",
            context: "table",
        })?;

    Ok(data
        .iter()
        .map(|row| serde_json::from_value(row.clone()).unwrap_or_default())
        .collect())
}

/// Execute one filter query against a dataset.
pub async fn fetch(
    client: &reqwest::Client,
    base_url: &str,
    dataset: &str,
    query: &FilterQuery,
    lang: &str,
) -> StatResult<Vec<RawRow>> {
    let url = format!("{base_url}/{lang}/stat/{dataset}");
    let body: serde_json::Value = client
        .post(&url)
        .json(&TableRequest {
            query,
            response: ResponseFormat { format: "json" },
        })
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    parse_table(&body)
}
