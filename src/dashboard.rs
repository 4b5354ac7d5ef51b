//! Dashboard pipeline: fetch, canonicalize, aggregate, assemble.
//!
//! Each request rebuilds all three metric bundles from scratch; the
//! domain pipelines are data-independent and run concurrently. Nothing
//! here holds state between requests.

use crate::analytics::{academic, evaluation, placement};
use crate::canonical::canonicalize;
use crate::models::{BundleSet, Domain, MetricBundle, RawRecord};
use crate::store::DatasetStore;
use crate::summarizer::Summarizer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// The payload served at `/api/data` and written by snapshot mode.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPayload {
    #[serde(flatten)]
    pub bundles: BundleSet,
    /// Optional LLM narrative; omitted when disabled or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Canonicalize and aggregate one domain's raw rows into its bundle.
///
/// Dataset-level failures (empty data, missing columns) collapse into a
/// bundle carrying a single top-level error.
pub fn domain_bundle(raw: &[RawRecord], domain: Domain, top_n: Option<usize>) -> MetricBundle {
    let schema = match domain {
        Domain::Academic => &academic::SCHEMA,
        Domain::Placement => &placement::SCHEMA,
        Domain::Evaluation => &evaluation::SCHEMA,
    };

    match canonicalize(raw, schema) {
        Ok(set) => match domain {
            Domain::Academic => academic::aggregate(&set, top_n),
            Domain::Placement => placement::aggregate(&set, top_n),
            Domain::Evaluation => evaluation::aggregate(&set, top_n),
        },
        Err(error) => error.into_bundle(),
    }
}

async fn build_domain(store: &DatasetStore, domain: Domain, top_n: Option<usize>) -> MetricBundle {
    let raw = store.fetch(domain).await;
    domain_bundle(&raw, domain, top_n)
}

/// Fetch and aggregate all three domains concurrently.
pub async fn build_bundles(store: &DatasetStore, top_n: Option<usize>) -> BundleSet {
    let (academic, placement, evaluation) = futures::join!(
        build_domain(store, Domain::Academic, top_n),
        build_domain(store, Domain::Placement, top_n),
        build_domain(store, Domain::Evaluation, top_n),
    );

    info!(
        academic_ok = !academic.is_dataset_error(),
        placement_ok = !placement.is_dataset_error(),
        evaluation_ok = !evaluation.is_dataset_error(),
        "built metric bundles"
    );

    BundleSet {
        academic,
        placement,
        evaluation,
    }
}

/// Build the full dashboard payload, with the narrative appended when
/// the summarizer is enabled. A summarizer failure never disturbs the
/// already-computed bundles.
pub async fn build_payload(
    store: &DatasetStore,
    summarizer: &Summarizer,
    top_n: Option<usize>,
) -> DashboardPayload {
    let bundles = build_bundles(store, top_n).await;
    let narrative = summarizer.narrate(&bundles).await;

    DashboardPayload {
        bundles,
        narrative,
        generated_at: Utc::now(),
    }
}
