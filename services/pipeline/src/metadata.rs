//! Dataset metadata resolution
//!
//! `GET {base}/{lang}/stat/{dataset}` returns the dataset's dimension
//! definitions: an ordered "variables" array where each entry carries a
//! language-specific code plus parallel `values`/`valueTexts` lists.
//! Dimension order is positional: the Nth dimension's values occupy the
//! Nth slot of every row's key tuple, so the order here drives both query
//! construction and row normalization.
//!
//! Codes differ between languages, which is why metadata is fetched fresh
//! per (dataset, language) and never cached across languages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{StatError, StatResult};

/// One axis of a dataset: indicator, category (economic sector, county...)
/// or observation period.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Dimension {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(rename = "valueTexts", default)]
    pub value_texts: Vec<String>,
}

impl Dimension {
    /// Raw value -> display text, zipped over the parallel lists. A values
    /// list longer than its texts list simply leaves the tail unmapped.
    pub fn label_map(&self) -> HashMap<&str, &str> {
        self.values
            .iter()
            .map(|v| v.as_str())
            .zip(self.value_texts.iter().map(|t| t.as_str()))
            .collect()
    }

    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.values
            .iter()
            .position(|v| v == value)
            .and_then(|i| self.value_texts.get(i))
            .map(|t| t.as_str())
    }
}

/// A dropdown option derived from one dimension value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

/// All options of one dimension, in declared value order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DimensionOptions {
    pub code: String,
    pub options: Vec<OptionItem>,
}

/// Ordered dimension metadata for one dataset in one language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetMeta {
    pub dimensions: Vec<Dimension>,
}

impl DatasetMeta {
    pub fn dimension(&self, index: usize) -> Option<&Dimension> {
        self.dimensions.get(index)
    }

    pub fn codes(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.code.as_str()).collect()
    }

    /// Find the dimension whose value set contains any of the given codes.
    /// The category dimension's code is language-specific and not known in
    /// advance, so probe each dimension in declaration order. Heuristic,
    /// not a guarantee.
    pub fn dimension_containing<'a, I>(&self, codes: I) -> Option<&Dimension>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let codes: Vec<&str> = codes.into_iter().collect();
        self.dimensions
            .iter()
            .find(|dim| codes.iter().any(|c| dim.values.iter().any(|v| v == c)))
    }

    /// Dropdown option lists, one per dimension in declared order.
    pub fn options(&self) -> Vec<DimensionOptions> {
        self.dimensions
            .iter()
            .map(|dim| DimensionOptions {
                code: dim.code.clone(),
                options: dim
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| OptionItem {
                        value: v.clone(),
                        label: dim
                            .value_texts
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| v.clone()),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Decode a metadata body. Missing "variables" is fatal; a malformed entry
/// inside the array degrades to an empty dimension so positions stay
/// intact for the remaining dimensions.
pub fn parse_metadata(body: &serde_json::Value) -> StatResult<DatasetMeta> {
    let variables = body
        .get("variables")
        .and_then(|v| v.as_array())
        .ok_or(StatError::MalformedResponse {
            field: "variables",
            context: "metadata",
        })?;

    let dimensions = variables
        .iter()
        .map(|var| serde_json::from_value(var.clone()).unwrap_or_default())
        .collect();

    Ok(DatasetMeta { dimensions })
}

/// Fetch and decode dimension metadata for one dataset in one language.
pub async fn resolve(
    client: &reqwest::Client,
    base_url: &str,
    dataset: &str,
    lang: &str,
) -> StatResult<DatasetMeta> {
    let url = format!("{base_url}/{lang}/stat/{dataset}");
    let body: serde_json::Value = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    parse_metadata(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_meta() -> DatasetMeta {
        parse_metadata(&json!({
            "title": "Average monthly gross wages",
            "variables": [
                {
                    "code": "Näitaja",
                    "values": ["GR_W_AVG", "GR_W_D5"],
                    "valueTexts": ["Keskmine brutokuupalk", "Mediaanpalk"]
                },
                {
                    "code": "Tegevusala",
                    "values": ["TOTAL", "A", "B"],
                    "valueTexts": ["Tegevusalad kokku", "Põllumajandus", "Mäetööstus"]
                },
                {
                    "code": "Vaatlusperiood",
                    "values": ["2022", "2023"],
                    "valueTexts": ["2022", "2023"]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn parses_dimensions_in_declared_order() {
        let meta = sample_meta();
        assert_eq!(meta.codes(), vec!["Näitaja", "Tegevusala", "Vaatlusperiood"]);
        assert_eq!(
            meta.dimension(0).unwrap().label_for("GR_W_D5"),
            Some("Mediaanpalk")
        );
    }

    #[test]
    fn missing_variables_is_malformed() {
        let err = parse_metadata(&json!({"title": "no variables here"})).unwrap_err();
        assert!(matches!(
            err,
            StatError::MalformedResponse { field: "variables", .. }
        ));
    }

    #[test]
    fn malformed_variable_entry_keeps_positions() {
        let meta = parse_metadata(&json!({
            "variables": [
                {"code": "Näitaja", "values": ["GR_W_AVG"], "valueTexts": ["Avg"]},
                42,
                {"code": "Vaatlusperiood", "values": ["2023"], "valueTexts": ["2023"]}
            ]
        }))
        .unwrap();
        assert_eq!(meta.dimensions.len(), 3);
        assert_eq!(meta.dimension(1).unwrap().code, "");
        assert_eq!(meta.dimension(2).unwrap().code, "Vaatlusperiood");
    }

    #[test]
    fn unmapped_value_has_no_label() {
        let meta = sample_meta();
        assert_eq!(meta.dimension(0).unwrap().label_for("GR_W_XXX"), None);
    }

    #[test]
    fn probes_for_dimension_by_value_membership() {
        let meta = sample_meta();
        let dim = meta.dimension_containing(["B", "ZZZ"]).unwrap();
        assert_eq!(dim.code, "Tegevusala");
        assert!(meta.dimension_containing(["ZZZ"]).is_none());
    }

    #[test]
    fn options_fall_back_to_value_when_text_missing() {
        let meta = parse_metadata(&json!({
            "variables": [
                {"code": "Näitaja", "values": ["A", "B"], "valueTexts": ["Only A"]}
            ]
        }))
        .unwrap();
        let opts = meta.options();
        assert_eq!(opts[0].options[0].label, "Only A");
        assert_eq!(opts[0].options[1].label, "B");
    }
}
