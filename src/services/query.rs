use url::form_urlencoded;

use crate::sample::Sample;
use crate::services::store::{SampleStore, StoreError};
use crate::services::summary::{self, Stretch, Summary};
use crate::time::{parse_timestamp, TimeRange};

/// Raw `start_time` / `end_time` query parameters, as sent by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeParams {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl RangeParams {
    pub fn new(start_time: Option<&str>, end_time: Option<&str>) -> Self {
        Self {
            start_time: start_time.map(str::to_string),
            end_time: end_time.map(str::to_string),
        }
    }

    /// Lenient parse: unknown keys are ignored and the last duplicate wins.
    pub fn from_raw_query(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        if let Some(raw) = raw {
            for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
                match key.as_ref() {
                    "start_time" => params.start_time = Some(value.into_owned()),
                    "end_time" => params.end_time = Some(value.into_owned()),
                    _ => {}
                }
            }
        }
        params
    }

    /// The window to filter on. Both bounds must be present and parse;
    /// anything else drops the filter so the caller gets every sample.
    pub fn resolve(&self) -> Option<TimeRange> {
        let start = non_blank(self.start_time.as_deref());
        let end = non_blank(self.end_time.as_deref());
        match (start, end) {
            (None, None) => None,
            (Some(start_raw), Some(end_raw)) => {
                match (parse_timestamp(start_raw), parse_timestamp(end_raw)) {
                    (Some(start), Some(end)) => Some(TimeRange::new(start, end)),
                    _ => {
                        tracing::debug!(
                            start_time = start_raw,
                            end_time = end_raw,
                            "unparsable range bound; returning unfiltered samples"
                        );
                        None
                    }
                }
            }
            (start, end) => {
                tracing::debug!(
                    start_time = ?start,
                    end_time = ?end,
                    "partial range; returning unfiltered samples"
                );
                None
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeResult {
    pub samples: Vec<Sample>,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StretchResult {
    pub stretches: Vec<Stretch>,
    pub summary: Summary,
}

pub async fn query_range(
    store: &SampleStore,
    params: &RangeParams,
) -> Result<RangeResult, StoreError> {
    let range = params.resolve();
    let samples = store.fetch(range.as_ref()).await?;
    let summary = summary::summarize(&samples);
    tracing::debug!(
        filtered = range.is_some(),
        count = samples.len(),
        active = summary.active_count,
        "range query"
    );
    Ok(RangeResult { samples, summary })
}

pub async fn query_all(store: &SampleStore) -> Result<Vec<Sample>, StoreError> {
    store.fetch_all().await
}

pub async fn query_stretches(
    store: &SampleStore,
    params: &RangeParams,
) -> Result<StretchResult, StoreError> {
    let range = params.resolve();
    let samples = store.fetch(range.as_ref()).await?;
    Ok(StretchResult {
        stretches: summary::stretches(&samples),
        summary: summary::summarize(&samples),
    })
}
