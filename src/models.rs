//! Data models for the analytics dashboard.
//!
//! This module contains the core data structures shared across the
//! pipeline: raw records, metric values, metric bundles, and the
//! dataset-level error taxonomy.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The three dataset domains served by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Academic exam records (marks, subjects, exam types).
    Academic,
    /// Placement outcomes (status, packages, recruiters, skills).
    Placement,
    /// Faculty evaluations (ratings, courses, semesters).
    Evaluation,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Academic => write!(f, "academic"),
            Domain::Placement => write!(f, "placement"),
            Domain::Evaluation => write!(f, "evaluation"),
        }
    }
}

impl Domain {
    /// All domains, in the order they appear on the dashboard.
    pub fn all() -> [Domain; 3] {
        [Domain::Academic, Domain::Placement, Domain::Evaluation]
    }
}

/// A single raw row as read from a CSV object: column name to cell text.
///
/// Column names are kept exactly as read; the canonicalizer owns all
/// normalization. Missing cells are simply absent from the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cell. Empty values are kept; coercion decides their fate.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Look up a cell by exact column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Iterate over (column, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.fields.iter()
    }
}

/// One named entry of an order-significant metric (rankings, ordered series).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEntry {
    pub name: String,
    pub value: f64,
}

impl MetricEntry {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A fixed-bucket histogram in the shape the dashboard charts consume:
/// parallel label and count arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

/// Marker for a metric that could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMarker {
    pub error: String,
}

/// The value of one named metric inside a bundle.
///
/// Serialization is untagged so the dashboard payload reads naturally:
/// a scalar serializes as a number, maps as objects, rankings as arrays
/// of `{name, value}`, and failures as `{"error": reason}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// A single summary number (already rounded for display).
    Scalar(f64),
    /// Counts keyed by category, keys sorted lexicographically.
    Counts(BTreeMap<String, u64>),
    /// Per-group means, keys sorted lexicographically.
    Averages(BTreeMap<String, f64>),
    /// Order-significant entries: rankings and ordered series.
    Entries(Vec<MetricEntry>),
    /// Fixed-bucket histogram with chart-ready label/count arrays.
    Series(SeriesData),
    /// Cross tabulation: outer group to inner category counts.
    CrossTab(BTreeMap<String, BTreeMap<String, u64>>),
    /// The metric could not be computed; siblings are unaffected.
    Error(ErrorMarker),
}

impl MetricValue {
    /// Shorthand for an error marker.
    pub fn error(reason: impl Into<String>) -> Self {
        MetricValue::Error(ErrorMarker {
            error: reason.into(),
        })
    }

    /// True if this value is an error marker.
    pub fn is_error(&self) -> bool {
        matches!(self, MetricValue::Error(_))
    }

    /// The scalar value, if this is a scalar metric.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// The per-group means, if this is an averages metric.
    pub fn as_averages(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            MetricValue::Averages(map) => Some(map),
            _ => None,
        }
    }

    /// The ordered entries, if this is a ranking or ordered series.
    pub fn as_entries(&self) -> Option<&[MetricEntry]> {
        match self {
            MetricValue::Entries(entries) => Some(entries),
            _ => None,
        }
    }
}

/// The complete set of named aggregates produced for one domain.
///
/// A bundle is built once by an aggregator and read-only afterwards;
/// metric names map to values or per-metric error markers. Keys are kept
/// in a `BTreeMap` so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricBundle {
    pub domain: Domain,
    pub metrics: BTreeMap<String, MetricValue>,
}

impl MetricBundle {
    /// Create an empty bundle for a domain.
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            metrics: BTreeMap::new(),
        }
    }

    /// Bundle whose sole content is the dataset-level error for an empty
    /// or unloadable dataset.
    pub fn empty_dataset(domain: Domain) -> Self {
        Self::from_error(
            domain,
            format!("{domain} data is empty or could not be loaded"),
        )
    }

    /// Bundle whose sole content is a dataset-level error marker.
    pub fn from_error(domain: Domain, reason: impl Into<String>) -> Self {
        let mut bundle = Self::new(domain);
        bundle.insert("error", MetricValue::error(reason));
        bundle
    }

    /// Insert a metric. Used only during bundle construction.
    pub(crate) fn insert(&mut self, name: impl Into<String>, value: MetricValue) {
        self.metrics.insert(name.into(), value);
    }

    /// Look up a metric by name.
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.metrics.get(name)
    }

    /// True if the bundle carries only a dataset-level error.
    pub fn is_dataset_error(&self) -> bool {
        self.metrics.len() == 1 && self.metrics.get("error").is_some_and(|m| m.is_error())
    }

    /// Department keys of a per-department averages metric, if present.
    pub fn department_keys(&self, metric: &str) -> Vec<String> {
        self.get(metric)
            .and_then(MetricValue::as_averages)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// The three per-domain bundles built for one request.
///
/// This is the stable contract consumed by the dashboard payload, the
/// intent resolver, and the summarizer prompt builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleSet {
    pub academic: MetricBundle,
    pub placement: MetricBundle,
    pub evaluation: MetricBundle,
}

impl BundleSet {
    pub fn get(&self, domain: Domain) -> &MetricBundle {
        match domain {
            Domain::Academic => &self.academic,
            Domain::Placement => &self.placement,
            Domain::Evaluation => &self.evaluation,
        }
    }
}

/// Dataset-level failures that abort a whole bundle.
///
/// Metric-level degradation (unmapped values, insufficient cardinality,
/// computation failures) never surfaces here; it becomes a per-metric
/// error marker inside the bundle instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    /// No usable rows after fetch or after coercion.
    #[error("{domain} data is empty or could not be loaded")]
    EmptyDataset { domain: Domain },

    /// A required field is absent even after synonym mapping.
    #[error("{domain} data is missing required column(s): {columns}")]
    MissingColumns { domain: Domain, columns: String },
}

impl DatasetError {
    /// Collapse the error into a bundle carrying it as the sole entry.
    pub fn into_bundle(self) -> MetricBundle {
        let domain = match &self {
            DatasetError::EmptyDataset { domain } => *domain,
            DatasetError::MissingColumns { domain, .. } => *domain,
        };
        MetricBundle::from_error(domain, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::Academic.to_string(), "academic");
        assert_eq!(Domain::Placement.to_string(), "placement");
        assert_eq!(Domain::Evaluation.to_string(), "evaluation");
    }

    #[test]
    fn test_empty_dataset_bundle() {
        let bundle = MetricBundle::empty_dataset(Domain::Placement);
        assert!(bundle.is_dataset_error());
        assert_eq!(
            bundle.get("error"),
            Some(&MetricValue::error(
                "placement data is empty or could not be loaded"
            ))
        );
    }

    #[test]
    fn test_bundle_with_metrics_is_not_dataset_error() {
        let mut bundle = MetricBundle::new(Domain::Academic);
        bundle.insert("overall_average_marks", MetricValue::Scalar(72.5));
        bundle.insert("top_subjects", MetricValue::error("no usable rows"));
        assert!(!bundle.is_dataset_error());
        assert!(bundle.get("top_subjects").unwrap().is_error());
    }

    #[test]
    fn test_metric_value_serialization_shapes() {
        let scalar = serde_json::to_value(MetricValue::Scalar(0.75)).unwrap();
        assert_eq!(scalar, serde_json::json!(0.75));

        let error = serde_json::to_value(MetricValue::error("boom")).unwrap();
        assert_eq!(error, serde_json::json!({"error": "boom"}));

        let entries = serde_json::to_value(MetricValue::Entries(vec![
            MetricEntry::new("Google", 12.0),
            MetricEntry::new("Amazon", 9.0),
        ]))
        .unwrap();
        assert_eq!(
            entries,
            serde_json::json!([
                {"name": "Google", "value": 12.0},
                {"name": "Amazon", "value": 9.0}
            ])
        );
    }

    #[test]
    fn test_department_keys() {
        let mut bundle = MetricBundle::new(Domain::Academic);
        let mut map = BTreeMap::new();
        map.insert("CSE".to_string(), 81.2);
        map.insert("ECE".to_string(), 74.6);
        bundle.insert("performance_by_department", MetricValue::Averages(map));

        assert_eq!(
            bundle.department_keys("performance_by_department"),
            vec!["CSE".to_string(), "ECE".to_string()]
        );
        assert!(bundle.department_keys("missing_metric").is_empty());
    }

    #[test]
    fn test_dataset_error_messages() {
        let err = DatasetError::EmptyDataset {
            domain: Domain::Academic,
        };
        assert_eq!(
            err.to_string(),
            "academic data is empty or could not be loaded"
        );

        let err = DatasetError::MissingColumns {
            domain: Domain::Placement,
            columns: "department, placement_status".to_string(),
        };
        assert!(err.to_string().contains("missing required column(s)"));
    }
}
