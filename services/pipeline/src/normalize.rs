//! Row normalization
//!
//! Maps raw rows into typed records by zipping the metadata's dimension
//! order against each row's key tuple, stopping at the shorter of the two.
//! Normalization is total: a short key yields absent trailing fields, a
//! placeholder or unparseable measurement yields an absent value, an
//! unmapped indicator code yields an absent label. Records are never
//! dropped, because downstream shaping needs to tell "no data" apart from
//! "zero".

use serde::Serialize;

use crate::fetch::RawRow;
use crate::metadata::DatasetMeta;

/// Placeholder tokens the API uses for a missing measurement.
const MISSING_TOKENS: [&str; 4] = ["", ".", "..", ":"];

/// Key tuple positions in the three-dimension datasets this dashboard
/// reads: indicator, category, period.
const CATEGORY_SLOT: usize = 1;
const PERIOD_SLOT: usize = 2;

/// A normalized observation. Every field is optional by design.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Record {
    pub indicator: Option<String>,
    pub category: Option<String>,
    pub period: Option<String>,
    pub value: Option<f64>,
    pub indicator_label: Option<String>,
}

/// Parse one measurement cell. Placeholder tokens and anything
/// non-numeric yield `None`, never zero.
pub fn parse_value(cell: &serde_json::Value) -> Option<f64> {
    match cell {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if MISSING_TOKENS.contains(&s) {
                return None;
            }
            s.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// Normalize raw rows against dataset metadata. `indicator_dim` names the
/// dimension whose value→text map supplies the indicator display label
/// (position 0 in every dataset this dashboard reads).
pub fn normalize(rows: &[RawRow], meta: &DatasetMeta, indicator_dim: usize) -> Vec<Record> {
    let labels = meta
        .dimension(indicator_dim)
        .map(|d| d.label_map())
        .unwrap_or_default();
    let declared = meta.dimensions.len();

    rows.iter()
        .map(|row| {
            // zip stops at the shorter side: key components beyond the
            // declared dimensions are ignored, missing trailing
            // components become absent fields
            let slot = |pos: usize| -> Option<String> {
                if pos < declared {
                    row.key.get(pos).cloned()
                } else {
                    None
                }
            };

            let indicator = slot(indicator_dim);
            let indicator_label = indicator
                .as_deref()
                .and_then(|code| labels.get(code))
                .map(|label| label.to_string());

            Record {
                category: slot(CATEGORY_SLOT),
                period: slot(PERIOD_SLOT),
                value: row.values.first().and_then(parse_value),
                indicator,
                indicator_label,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parse_metadata;
    use serde_json::json;

    fn meta() -> DatasetMeta {
        parse_metadata(&json!({
            "variables": [
                {"code": "Näitaja", "values": ["GR_W_AVG", "GR_W_D5"],
                 "valueTexts": ["Keskmine brutokuupalk", "Mediaanpalk"]},
                {"code": "Tegevusala", "values": ["TOTAL"], "valueTexts": ["Kokku"]},
                {"code": "Vaatlusperiood", "values": ["2022", "2023"], "valueTexts": ["2022", "2023"]}
            ]
        }))
        .unwrap()
    }

    fn row(key: &[&str], value: serde_json::Value) -> RawRow {
        RawRow {
            key: key.iter().map(|k| k.to_string()).collect(),
            values: vec![value],
        }
    }

    #[test]
    fn placeholder_tokens_normalize_to_absent_never_zero() {
        for token in [json!(""), json!("."), json!(".."), json!(":"), json!(null)] {
            assert_eq!(parse_value(&token), None, "token {token:?}");
        }
        assert_eq!(parse_value(&json!("0")), Some(0.0));
        assert_eq!(parse_value(&json!("2100.5")), Some(2100.5));
        assert_eq!(parse_value(&json!(1735.0)), Some(1735.0));
        assert_eq!(parse_value(&json!("not a number")), None);
    }

    #[test]
    fn normalizes_rows_keeping_absent_values() {
        let rows = vec![
            row(&["GR_W_AVG", "TOTAL", "2022"], json!("2100.5")),
            row(&["GR_W_AVG", "TOTAL", "2023"], json!("..")),
        ];
        let records = normalize(&rows, &meta(), 0);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, Some(2100.5));
        assert_eq!(records[0].period.as_deref(), Some("2022"));
        assert_eq!(
            records[0].indicator_label.as_deref(),
            Some("Keskmine brutokuupalk")
        );
        assert_eq!(records[1].value, None);
        assert_eq!(records[1].period.as_deref(), Some("2023"));
    }

    #[test]
    fn short_key_yields_absent_trailing_dimensions() {
        let records = normalize(&[row(&["GR_W_D5"], json!("1500"))], &meta(), 0);
        assert_eq!(records[0].indicator.as_deref(), Some("GR_W_D5"));
        assert_eq!(records[0].category, None);
        assert_eq!(records[0].period, None);
        assert_eq!(records[0].value, Some(1500.0));
    }

    #[test]
    fn key_longer_than_declared_dimensions_is_truncated() {
        let empty = DatasetMeta::default();
        let records = normalize(&[row(&["GR_W_AVG", "TOTAL", "2022"], json!("1"))], &empty, 0);
        assert_eq!(records[0].indicator, None);
        assert_eq!(records[0].period, None);
    }

    #[test]
    fn unmapped_indicator_code_gets_absent_label() {
        let records = normalize(&[row(&["GR_W_XXX", "TOTAL", "2022"], json!("1"))], &meta(), 0);
        assert_eq!(records[0].indicator.as_deref(), Some("GR_W_XXX"));
        assert_eq!(records[0].indicator_label, None);
    }

    #[test]
    fn row_without_values_keeps_absent_value() {
        let rows = vec![RawRow {
            key: vec!["GR_W_AVG".into(), "TOTAL".into(), "2022".into()],
            values: vec![],
        }];
        let records = normalize(&rows, &meta(), 0);
        assert_eq!(records[0].value, None);
        assert_eq!(records[0].period.as_deref(), Some("2022"));
    }
}
