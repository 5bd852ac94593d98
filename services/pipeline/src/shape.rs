//! Series shaping
//!
//! Two shapes, one per chart family:
//!
//! - Time series: one series per indicator, all series aligned on the
//!   sorted union of periods. Periods missing from one indicator become
//!   absent points, never interpolated and never dropped from the axis. The
//!   precomputed relative-difference indicator rides the secondary axis.
//! - Category comparison: restrict to the latest period, mean-aggregate
//!   duplicate cells, pivot to one row per category and rank by the
//!   primary indicator with absent values always sorted last.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::metadata::DatasetMeta;
use crate::normalize::Record;

/// Line width for wrapped category labels.
pub const DEFAULT_WRAP_WIDTH: usize = 50;

/// Which y-axis a series belongs to.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Point {
    pub period: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Series {
    pub indicator: String,
    pub label: Option<String>,
    pub axis: Axis,
    pub points: Vec<Point>,
}

/// Period-indexed series for one or more indicators.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TimeSeriesTable {
    pub periods: Vec<String>,
    pub series: Vec<Series>,
}

/// One ranked row of a category comparison; `values` is parallel to the
/// table's indicator list. `label` keeps the unwrapped text for lookups,
/// `wrapped_label` is what the chart axis shows.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryRow {
    pub category: String,
    pub label: String,
    pub wrapped_label: String,
    pub values: Vec<Option<f64>>,
}

/// Category-indexed comparison for a fixed period across indicators.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CategoryTable {
    pub period: Option<String>,
    pub indicators: Vec<String>,
    pub rows: Vec<CategoryRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Numeric-aware period ordering: year-like strings compare as numbers,
/// anything else falls back to lexicographic order.
pub fn cmp_periods(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

/// Maximum period across all records, input order irrelevant.
pub fn latest_period(records: &[Record]) -> Option<String> {
    records
        .iter()
        .filter_map(|r| r.period.as_deref())
        .max_by(|a, b| cmp_periods(a, b))
        .map(|p| p.to_string())
}

/// Group records into aligned per-indicator series. Indicators listed in
/// `secondary` land on the secondary axis.
pub fn time_series(records: &[Record], secondary: &[&str]) -> TimeSeriesTable {
    let mut periods: Vec<String> = records.iter().filter_map(|r| r.period.clone()).collect();
    periods.sort_by(|a, b| cmp_periods(a, b));
    periods.dedup();

    // first-seen indicator order keeps the output deterministic
    let mut order: Vec<String> = Vec::new();
    let mut labels: HashMap<String, String> = HashMap::new();
    let mut cells: HashMap<(String, String), f64> = HashMap::new();

    for record in records {
        let Some(indicator) = record.indicator.clone() else {
            continue;
        };
        if !order.contains(&indicator) {
            order.push(indicator.clone());
        }
        if let Some(label) = &record.indicator_label {
            labels.entry(indicator.clone()).or_insert_with(|| label.clone());
        }
        if let (Some(period), Some(value)) = (&record.period, record.value) {
            cells
                .entry((indicator, period.clone()))
                .or_insert(value);
        }
    }

    let series = order
        .into_iter()
        .map(|indicator| {
            let axis = if secondary.contains(&indicator.as_str()) {
                Axis::Secondary
            } else {
                Axis::Primary
            };
            let points = periods
                .iter()
                .map(|period| Point {
                    period: period.clone(),
                    value: cells.get(&(indicator.clone(), period.clone())).copied(),
                })
                .collect();
            Series {
                label: labels.get(&indicator).cloned(),
                indicator,
                axis,
                points,
            }
        })
        .collect();

    TimeSeriesTable { periods, series }
}

/// Mean-aggregate duplicate (category, indicator) cells. Duplicates arise
/// when several raw codes map onto one category. A cell whose every
/// observation is absent stays absent. Output is sorted by (category,
/// indicator), which makes the aggregation idempotent.
pub fn aggregate_mean(records: &[Record]) -> Vec<Record> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut sums: HashMap<(String, String), (f64, usize)> = HashMap::new();
    let mut template: HashMap<(String, String), Record> = HashMap::new();

    for record in records {
        let (Some(category), Some(indicator)) = (&record.category, &record.indicator) else {
            continue;
        };
        let cell = (category.clone(), indicator.clone());
        if !template.contains_key(&cell) {
            order.push(cell.clone());
            template.insert(cell.clone(), record.clone());
        }
        if let Some(value) = record.value {
            let entry = sums.entry(cell).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    order.sort();
    order
        .into_iter()
        .map(|cell| {
            let mut record = template.remove(&cell).unwrap_or(Record {
                indicator: Some(cell.1.clone()),
                category: Some(cell.0.clone()),
                period: None,
                value: None,
                indicator_label: None,
            });
            record.value = sums
                .get(&cell)
                .filter(|(_, n)| *n > 0)
                .map(|(sum, n)| sum / *n as f64);
            record
        })
        .collect()
}

/// Comparator that ranks present values by `direction` and always places
/// absent values last. Ascending uses a maximal sentinel in the key;
/// descending needs an explicit match because a single sentinel can't
/// serve both directions.
fn cmp_ranked(a: Option<f64>, b: Option<f64>, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => {
            let ka = a.unwrap_or(f64::INFINITY);
            let kb = b.unwrap_or(f64::INFINITY);
            ka.total_cmp(&kb)
        }
        SortDirection::Descending => match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => y.total_cmp(&x),
        },
    }
}

/// Break a label into lines of at most `width` characters at word
/// boundaries. A word longer than the width gets its own unbroken line.
pub fn wrap_label(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line.is_empty() {
            line.push_str(word);
            line_len = word_len;
        } else if line_len + 1 + word_len <= width {
            line.push(' ');
            line.push_str(word);
            line_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
            line_len = word_len;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}

/// Shape records into a ranked category comparison for the latest period.
///
/// Steps: restrict to the maximal period, mean-aggregate duplicates, pivot
/// to one row per category with one column per requested indicator, drop a
/// category only when every column is absent, rank by the primary
/// indicator (absent last regardless of direction), then attach display
/// labels via the metadata dimension whose value set contains the observed
/// category codes, word-wrapped at `wrap_width`.
pub fn category_comparison(
    records: &[Record],
    meta: &DatasetMeta,
    indicators: &[&str],
    primary: &str,
    direction: SortDirection,
    wrap_width: usize,
) -> CategoryTable {
    let period = latest_period(records);
    let in_period: Vec<Record> = records
        .iter()
        .filter(|r| r.period == period)
        .cloned()
        .collect();

    let aggregated = aggregate_mean(&in_period);

    // pivot: one row per category, columns in requested indicator order
    let mut category_order: Vec<String> = Vec::new();
    let mut cells: HashMap<(String, String), Option<f64>> = HashMap::new();
    for record in &aggregated {
        let (Some(category), Some(indicator)) = (&record.category, &record.indicator) else {
            continue;
        };
        if !category_order.contains(category) {
            category_order.push(category.clone());
        }
        cells.insert((category.clone(), indicator.clone()), record.value);
    }

    let primary_col = indicators.iter().position(|i| *i == primary).unwrap_or(0);
    let category_dim =
        meta.dimension_containing(category_order.iter().map(|c| c.as_str()));

    let mut rows: Vec<CategoryRow> = category_order
        .into_iter()
        .filter_map(|category| {
            let values: Vec<Option<f64>> = indicators
                .iter()
                .map(|indicator| {
                    cells
                        .get(&(category.clone(), indicator.to_string()))
                        .copied()
                        .flatten()
                })
                .collect();
            // partial data is kept; only a fully absent row is dropped
            if values.iter().all(|v| v.is_none()) {
                return None;
            }
            let label = category_dim
                .and_then(|dim| dim.label_for(&category))
                .unwrap_or(&category)
                .to_string();
            Some(CategoryRow {
                wrapped_label: wrap_label(&label, wrap_width),
                label,
                category,
                values,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        cmp_ranked(
            a.values.get(primary_col).copied().flatten(),
            b.values.get(primary_col).copied().flatten(),
            direction,
        )
    });

    CategoryTable {
        period,
        indicators: indicators.iter().map(|i| i.to_string()).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parse_metadata;
    use serde_json::json;

    fn record(
        indicator: &str,
        category: &str,
        period: &str,
        value: Option<f64>,
    ) -> Record {
        Record {
            indicator: Some(indicator.to_string()),
            category: Some(category.to_string()),
            period: Some(period.to_string()),
            value,
            indicator_label: None,
        }
    }

    #[test]
    fn latest_period_is_numeric_max_on_unsorted_input() {
        let records = vec![
            record("GR_W_AVG", "TOTAL", "2020", Some(1.0)),
            record("GR_W_AVG", "TOTAL", "2019", Some(1.0)),
            record("GR_W_AVG", "TOTAL", "2023", Some(1.0)),
            record("GR_W_AVG", "TOTAL", "2021", Some(1.0)),
        ];
        assert_eq!(latest_period(&records).as_deref(), Some("2023"));
    }

    #[test]
    fn single_indicator_series_keeps_absent_points() {
        let records = vec![
            record("GR_W_AVG", "TOTAL", "2022", Some(2100.5)),
            record("GR_W_AVG", "TOTAL", "2023", None),
        ];
        let table = time_series(&records, &[]);
        assert_eq!(table.series.len(), 1);
        assert_eq!(
            table.series[0].points,
            vec![
                Point { period: "2022".into(), value: Some(2100.5) },
                Point { period: "2023".into(), value: None },
            ]
        );
    }

    #[test]
    fn series_align_on_period_union_without_interpolation() {
        let records = vec![
            record("GR_W_AVG", "TOTAL", "2021", Some(1500.0)),
            record("GR_W_AVG", "TOTAL", "2022", Some(1600.0)),
            record("GR_W_D5", "TOTAL", "2022", Some(1400.0)),
            record("GR_W_AVG_SM", "TOTAL", "2022", Some(6.1)),
        ];
        let table = time_series(&records, &["GR_W_AVG_SM"]);
        assert_eq!(table.periods, vec!["2021", "2022"]);

        let change = table
            .series
            .iter()
            .find(|s| s.indicator == "GR_W_AVG_SM")
            .unwrap();
        assert_eq!(change.axis, Axis::Secondary);
        assert_eq!(change.points[0].value, None);
        assert_eq!(change.points[1].value, Some(6.1));

        let median = table.series.iter().find(|s| s.indicator == "GR_W_D5").unwrap();
        assert_eq!(median.axis, Axis::Primary);
        assert_eq!(median.points[0].value, None);
    }

    #[test]
    fn periods_sort_numerically_not_lexicographically() {
        let records = vec![
            record("X", "TOTAL", "10", Some(1.0)),
            record("X", "TOTAL", "9", Some(1.0)),
            record("X", "TOTAL", "2020", Some(1.0)),
        ];
        let table = time_series(&records, &[]);
        assert_eq!(table.periods, vec!["9", "10", "2020"]);
    }

    #[test]
    fn duplicates_aggregate_by_mean() {
        let records = vec![
            record("avg", "A", "2023", Some(1000.0)),
            record("avg", "A", "2023", Some(1200.0)),
        ];
        let aggregated = aggregate_mean(&records);
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].value, Some(1100.0));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = vec![
            record("avg", "B", "2023", Some(1000.0)),
            record("avg", "A", "2023", Some(1200.0)),
            record("avg", "A", "2023", None),
            record("med", "A", "2023", None),
        ];
        let once = aggregate_mean(&records);
        let twice = aggregate_mean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn absent_observations_do_not_drag_the_mean() {
        let records = vec![
            record("avg", "A", "2023", Some(1000.0)),
            record("avg", "A", "2023", None),
        ];
        let aggregated = aggregate_mean(&records);
        assert_eq!(aggregated[0].value, Some(1000.0));
    }

    #[test]
    fn pivoting_aggregated_records_changes_nothing() {
        let records = vec![
            record("avg", "A", "2023", Some(1000.0)),
            record("avg", "A", "2023", Some(1200.0)),
            record("med", "A", "2023", Some(1050.0)),
            record("avg", "B", "2023", Some(900.0)),
        ];
        let from_raw = category_comparison(
            &records,
            &DatasetMeta::default(),
            &["avg", "med"],
            "avg",
            SortDirection::Ascending,
            DEFAULT_WRAP_WIDTH,
        );
        let from_aggregated = category_comparison(
            &aggregate_mean(&records),
            &DatasetMeta::default(),
            &["avg", "med"],
            "avg",
            SortDirection::Ascending,
            DEFAULT_WRAP_WIDTH,
        );
        assert_eq!(from_raw, from_aggregated);
        assert_eq!(from_raw.rows[1].values[0], Some(1100.0));
    }

    fn comparison_records() -> Vec<Record> {
        vec![
            record("avg", "A", "2023", Some(1500.0)),
            record("med", "A", "2023", Some(1400.0)),
            record("avg", "B", "2023", None),
            record("med", "B", "2023", Some(1300.0)),
            record("avg", "C", "2023", Some(1200.0)),
            record("med", "C", "2023", None),
        ]
    }

    #[test]
    fn ranking_puts_absent_primary_last_ascending() {
        let table = category_comparison(
            &comparison_records(),
            &DatasetMeta::default(),
            &["avg", "med"],
            "avg",
            SortDirection::Ascending,
            DEFAULT_WRAP_WIDTH,
        );
        let order: Vec<&str> = table.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
        // B kept with partial data, its stored value untouched
        assert_eq!(table.rows[2].values, vec![None, Some(1300.0)]);
    }

    #[test]
    fn ranking_puts_absent_primary_last_descending_too() {
        let table = category_comparison(
            &comparison_records(),
            &DatasetMeta::default(),
            &["avg", "med"],
            "avg",
            SortDirection::Descending,
            DEFAULT_WRAP_WIDTH,
        );
        let order: Vec<&str> = table.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
    }

    #[test]
    fn comparison_restricts_to_latest_period() {
        let mut records = comparison_records();
        records.push(record("avg", "D", "2019", Some(1.0)));
        let table = category_comparison(
            &records,
            &DatasetMeta::default(),
            &["avg", "med"],
            "avg",
            SortDirection::Ascending,
            DEFAULT_WRAP_WIDTH,
        );
        assert_eq!(table.period.as_deref(), Some("2023"));
        assert!(table.rows.iter().all(|r| r.category != "D"));
    }

    #[test]
    fn fully_absent_category_is_dropped() {
        let records = vec![
            record("avg", "A", "2023", Some(1500.0)),
            record("avg", "B", "2023", None),
            record("med", "B", "2023", None),
        ];
        let table = category_comparison(
            &records,
            &DatasetMeta::default(),
            &["avg", "med"],
            "avg",
            SortDirection::Ascending,
            DEFAULT_WRAP_WIDTH,
        );
        let order: Vec<&str> = table.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["A"]);
    }

    #[test]
    fn labels_resolve_via_dimension_probe_and_wrap() {
        let meta = parse_metadata(&json!({
            "variables": [
                {"code": "Näitaja", "values": ["avg"], "valueTexts": ["Keskmine"]},
                {"code": "Tegevusala", "values": ["A"],
                 "valueTexts": ["Põllumajandus, metsamajandus ja kalapüük koos pikkade lisanditega"]}
            ]
        }))
        .unwrap();
        let records = vec![record("avg", "A", "2023", Some(1500.0))];
        let table = category_comparison(
            &records,
            &meta,
            &["avg"],
            "avg",
            SortDirection::Ascending,
            20,
        );
        let row = &table.rows[0];
        assert_eq!(
            row.label,
            "Põllumajandus, metsamajandus ja kalapüük koos pikkade lisanditega"
        );
        assert!(row.wrapped_label.contains('\n'));
        assert!(row
            .wrapped_label
            .lines()
            .all(|line| line.chars().count() <= 20));
    }

    #[test]
    fn unmapped_category_keeps_its_code_as_label() {
        let records = vec![record("avg", "ZZ", "2023", Some(1.0))];
        let table = category_comparison(
            &records,
            &DatasetMeta::default(),
            &["avg"],
            "avg",
            SortDirection::Ascending,
            DEFAULT_WRAP_WIDTH,
        );
        assert_eq!(table.rows[0].label, "ZZ");
    }

    #[test]
    fn wrap_respects_word_boundaries() {
        assert_eq!(wrap_label("one two three", 7), "one two\nthree");
        assert_eq!(wrap_label("short", 50), "short");
        // a word longer than the width stays unbroken
        assert_eq!(wrap_label("incomprehensibilities no", 10), "incomprehensibilities\nno");
    }
}
