//! High-level client
//!
//! `StatClient` couples a reqwest client with the statistics API base URL
//! and runs the whole pipeline per chart: resolve metadata → build query →
//! fetch table → normalize → shape. Metadata is resolved fresh on every
//! call because dimension codes are language-specific; there is no cache
//! and no shared mutable state, so renders are free to run in parallel.

use std::time::Duration;

use crate::error::StatResult;
use crate::fetch;
use crate::labels::Lang;
use crate::metadata::{self, DatasetMeta};
use crate::normalize::{self, Record};
use crate::query::{self, Filter};
use crate::shape::{self, CategoryTable, SortDirection, TimeSeriesTable};

pub const DEFAULT_BASE_URL: &str = "https://andmed.stat.ee/api/v1";

/// Annual gross salary by economic activity.
pub const SALARY_DATASET: &str = "PA103";
/// Short-term gross salary by county.
pub const SALARY_SHORT_DATASET: &str = "PA117";

/// Indicator codes shared by the salary datasets.
pub const AVERAGE_SALARY: &str = "GR_W_AVG";
pub const MEDIAN_SALARY: &str = "GR_W_D5";
/// Relative difference between average and median, precomputed upstream
/// and fetched like any other indicator.
pub const SALARY_CHANGE: &str = "GR_W_AVG_SM";

/// Category code for the whole-economy aggregate in PA103.
pub const TOTAL_SECTOR: &str = "TOTAL";
/// County code for the whole country in PA117.
pub const WHOLE_COUNTRY: &str = "EE";

/// Index of the indicator dimension in both salary datasets.
const INDICATOR_DIM: usize = 0;
/// Index of the category dimension (sector in PA103, county in PA117).
const CATEGORY_DIM: usize = 1;

pub struct StatClient {
    http: reqwest::Client,
    base_url: String,
}

impl StatClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> StatResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("stats-dashboard/0.1")
            .build()?;
        Ok(StatClient {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Dimension metadata for one dataset in one language.
    pub async fn resolve(&self, dataset: &str, lang: Lang) -> StatResult<DatasetMeta> {
        metadata::resolve(&self.http, &self.base_url, dataset, lang.as_str()).await
    }

    /// The full fetch half of the pipeline in one call: metadata, query,
    /// table, normalization.
    pub async fn dataset_records(
        &self,
        dataset: &str,
        indicator: Option<Filter>,
        category: Option<Filter>,
        periods: Option<Filter>,
        lang: Lang,
    ) -> StatResult<(DatasetMeta, Vec<Record>)> {
        let meta = self.resolve(dataset, lang).await?;
        let records = self
            .records_with_meta(dataset, &meta, indicator, category, periods, lang)
            .await?;
        Ok((meta, records))
    }

    /// Same as `dataset_records` but reuses already-resolved metadata, for
    /// charts that query the same dataset more than once per render.
    async fn records_with_meta(
        &self,
        dataset: &str,
        meta: &DatasetMeta,
        indicator: Option<Filter>,
        category: Option<Filter>,
        periods: Option<Filter>,
        lang: Lang,
    ) -> StatResult<Vec<Record>> {
        let query = query::build(meta, indicator, category, periods);
        let rows = fetch::fetch(&self.http, &self.base_url, dataset, &query, lang.as_str()).await?;
        Ok(normalize::normalize(&rows, meta, INDICATOR_DIM))
    }

    /// Salary time series (PA103). With no indicator constraint the table
    /// carries the average, the median and the precomputed change series,
    /// the last on the secondary axis. Sector defaults to the
    /// whole-economy aggregate.
    pub async fn salary_series(
        &self,
        indicator: Option<Filter>,
        sector: Option<Filter>,
        periods: Option<Filter>,
        lang: Lang,
    ) -> StatResult<TimeSeriesTable> {
        let sector = sector.or_else(|| Some(Filter::from(TOTAL_SECTOR)));
        let (_, records) = self
            .dataset_records(SALARY_DATASET, indicator, sector, periods, lang)
            .await?;
        Ok(shape::time_series(&records, &[SALARY_CHANGE]))
    }

    /// Latest-year sector comparison of average vs median salary, ranked
    /// ascending by average with long sector names wrapped for the axis.
    pub async fn sector_comparison(&self, lang: Lang) -> StatResult<CategoryTable> {
        let meta = self.resolve(SALARY_DATASET, lang).await?;

        // all sectors except the whole-economy aggregate
        let sectors: Vec<String> = meta
            .dimension(CATEGORY_DIM)
            .map(|d| {
                d.values
                    .iter()
                    .filter(|v| v.as_str() != TOTAL_SECTOR)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // probe the aggregate series first to learn the latest year, then
        // fetch only that year across sectors
        let probe = self
            .records_with_meta(
                SALARY_DATASET,
                &meta,
                Some(AVERAGE_SALARY.into()),
                Some(TOTAL_SECTOR.into()),
                None,
                lang,
            )
            .await?;
        let latest = shape::latest_period(&probe);

        let records = self
            .records_with_meta(
                SALARY_DATASET,
                &meta,
                Some(Filter::from(vec![AVERAGE_SALARY, MEDIAN_SALARY])),
                Some(Filter::from(sectors)),
                latest.map(Filter::from),
                lang,
            )
            .await?;

        Ok(shape::category_comparison(
            &records,
            &meta,
            &[AVERAGE_SALARY, MEDIAN_SALARY],
            AVERAGE_SALARY,
            SortDirection::Ascending,
            shape::DEFAULT_WRAP_WIDTH,
        ))
    }

    /// Short-term salary series (PA117) for one county, defaulting to the
    /// whole country.
    pub async fn short_term_series(
        &self,
        county: Option<Filter>,
        lang: Lang,
    ) -> StatResult<TimeSeriesTable> {
        let county = county.or_else(|| Some(Filter::from(WHOLE_COUNTRY)));
        let (_, records) = self
            .dataset_records(
                SALARY_SHORT_DATASET,
                Some(AVERAGE_SALARY.into()),
                county,
                None,
                lang,
            )
            .await?;
        Ok(shape::time_series(&records, &[]))
    }
}
