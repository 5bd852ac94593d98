//! Filter query construction
//!
//! The table endpoint expects `{"query": [{"code": ..., "selection":
//! {"filter": "item", "values": [...]}}, ...]}` with at most one entry per
//! dimension, in dimension-declaration order. Dimensions without a filter
//! are omitted entirely; the server treats omission as "all values".
//!
//! Positional mapping: the first declared dimension is the indicator, the
//! second the category, the third the period. When a dataset declares
//! fewer than three dimensions the builder falls back to the API's
//! Estonian default codes instead of failing; a query built that way still
//! reaches the server and lets it complain, which beats dropping the
//! filter silently.

use serde::Serialize;

use crate::metadata::DatasetMeta;

/// Default dimension codes used when metadata declares fewer than three
/// dimensions (degraded mode).
const FALLBACK_CODES: [&str; 3] = ["Näitaja", "Tegevusala", "Vaatlusperiood"];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Selection {
    pub filter: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryEntry {
    pub code: String,
    pub selection: Selection,
}

pub type FilterQuery = Vec<QueryEntry>;

/// A filter argument: one value or many. Callers pass `Option<Filter>`,
/// with `None` meaning "no constraint"; everything normalizes to a list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Vec<String>);

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_values(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        Filter(vec![value.to_string()])
    }
}

impl From<String> for Filter {
    fn from(value: String) -> Self {
        Filter(vec![value])
    }
}

impl From<Vec<String>> for Filter {
    fn from(values: Vec<String>) -> Self {
        Filter(values)
    }
}

impl From<Vec<&str>> for Filter {
    fn from(values: Vec<&str>) -> Self {
        Filter(values.into_iter().map(str::to_string).collect())
    }
}

impl FromIterator<String> for Filter {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Filter(iter.into_iter().collect())
    }
}

/// Build a filter query for the (indicator, category, period) slots.
/// Entries come out in declaration order, one per constrained dimension.
pub fn build(
    meta: &DatasetMeta,
    indicator: Option<Filter>,
    category: Option<Filter>,
    periods: Option<Filter>,
) -> FilterQuery {
    let mut query: FilterQuery = Vec::new();

    for (pos, filter) in [indicator, category, periods].into_iter().enumerate() {
        let Some(filter) = filter else { continue };
        let values = filter.into_values();
        if values.is_empty() {
            continue;
        }

        let code = meta
            .dimension(pos)
            .filter(|d| !d.code.is_empty())
            .map(|d| d.code.clone())
            .unwrap_or_else(|| FALLBACK_CODES[pos].to_string());

        // A fallback code can collide with a declared code on datasets with
        // unusual dimension layouts; never emit the same code twice.
        if query.iter().any(|entry| entry.code == code) {
            continue;
        }

        query.push(QueryEntry {
            code,
            selection: Selection {
                filter: "item".to_string(),
                values,
            },
        });
    }

    query
}
