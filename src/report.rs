//! Markdown and JSON snapshot generation.
//!
//! Snapshot mode renders the dashboard payload into a file so the
//! metrics can be inspected without running the HTTP server.

use crate::dashboard::DashboardPayload;
use crate::models::{Domain, MetricBundle, MetricValue};
use anyhow::{Context, Result};

/// Generate a complete Markdown report.
pub fn generate_markdown_report(payload: &DashboardPayload) -> String {
    let mut output = String::new();

    output.push_str("# CampusLens Dashboard Snapshot\n\n");
    output.push_str(&generate_metadata_section(payload));

    if let Some(narrative) = &payload.narrative {
        output.push_str("## Narrative\n\n");
        output.push_str(narrative);
        output.push_str("\n\n");
    }

    for domain in Domain::all() {
        output.push_str(&generate_domain_section(payload.bundles.get(domain)));
    }

    output.push_str("---\n\n*Generated by CampusLens*\n");
    output
}

/// Generate a JSON report (the same payload the HTTP API serves).
pub fn generate_json_report(payload: &DashboardPayload) -> Result<String> {
    serde_json::to_string_pretty(payload).context("Failed to serialize dashboard payload")
}

/// Generate the metadata section.
fn generate_metadata_section(payload: &DashboardPayload) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        payload.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for domain in Domain::all() {
        let bundle = payload.bundles.get(domain);
        let status = if bundle.is_dataset_error() {
            "unavailable"
        } else {
            "loaded"
        };
        section.push_str(&format!("- **{} data:** {}\n", bundle.domain, status));
    }
    section.push('\n');

    section
}

/// Generate the section for one domain bundle.
fn generate_domain_section(bundle: &MetricBundle) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title_case(&bundle.domain.to_string())));

    if bundle.is_dataset_error() {
        if let Some(MetricValue::Error(marker)) = bundle.get("error") {
            section.push_str(&format!("> {}\n\n", marker.error));
        }
        return section;
    }

    for (name, value) in &bundle.metrics {
        section.push_str(&render_metric(name, value));
    }

    section
}

/// Render one metric as a Markdown block.
fn render_metric(name: &str, value: &MetricValue) -> String {
    let mut block = String::new();
    block.push_str(&format!("### `{name}`\n\n"));

    match value {
        MetricValue::Scalar(v) => {
            block.push_str(&format!("{v}\n\n"));
        }
        MetricValue::Counts(map) => {
            block.push_str("| Category | Count |\n|:---|:---:|\n");
            for (key, count) in map {
                block.push_str(&format!("| {key} | {count} |\n"));
            }
            block.push('\n');
        }
        MetricValue::Averages(map) => {
            block.push_str("| Group | Mean |\n|:---|:---:|\n");
            for (key, mean) in map {
                block.push_str(&format!("| {key} | {mean} |\n"));
            }
            block.push('\n');
        }
        MetricValue::Entries(entries) => {
            for (rank, entry) in entries.iter().enumerate() {
                block.push_str(&format!("{}. {} — {}\n", rank + 1, entry.name, entry.value));
            }
            block.push('\n');
        }
        MetricValue::Series(series) => {
            block.push_str("| Range | Count |\n|:---|:---:|\n");
            for (label, count) in series.labels.iter().zip(series.data.iter()) {
                block.push_str(&format!("| {label} | {count} |\n"));
            }
            block.push('\n');
        }
        MetricValue::CrossTab(table) => {
            let columns: Vec<&String> = table
                .values()
                .flat_map(|row| row.keys())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();

            block.push_str("| Group |");
            for column in &columns {
                block.push_str(&format!(" {column} |"));
            }
            block.push_str("\n|:---|");
            for _ in &columns {
                block.push_str(":---:|");
            }
            block.push('\n');
            for (group, row) in table {
                block.push_str(&format!("| {group} |"));
                for column in &columns {
                    block.push_str(&format!(" {} |", row.get(*column).copied().unwrap_or(0)));
                }
                block.push('\n');
            }
            block.push('\n');
        }
        MetricValue::Error(marker) => {
            block.push_str(&format!("*Unavailable: {}*\n\n", marker.error));
        }
    }

    block
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BundleSet, Domain, MetricEntry, SeriesData};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn payload() -> DashboardPayload {
        let mut academic = MetricBundle::new(Domain::Academic);
        academic.insert("overall_average_marks", MetricValue::Scalar(72.4));
        academic.insert(
            "top_subjects",
            MetricValue::Entries(vec![MetricEntry::new("Algorithms", 88.5)]),
        );
        academic.insert(
            "marks_distribution",
            MetricValue::Series(SeriesData {
                labels: vec!["0-25".into(), "26-50".into()],
                data: vec![1, 2],
            }),
        );

        let mut placement = MetricBundle::new(Domain::Placement);
        let mut table = BTreeMap::new();
        let mut row = BTreeMap::new();
        row.insert("0".to_string(), 1u64);
        row.insert("1".to_string(), 3u64);
        table.insert("Female".to_string(), row);
        placement.insert("gender_placement_matrix", MetricValue::CrossTab(table));

        DashboardPayload {
            bundles: BundleSet {
                academic,
                placement,
                evaluation: MetricBundle::empty_dataset(Domain::Evaluation),
            },
            narrative: Some("All quiet on campus.".to_string()),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_markdown_report_sections() {
        let report = generate_markdown_report(&payload());
        assert!(report.contains("# CampusLens Dashboard Snapshot"));
        assert!(report.contains("## Academic"));
        assert!(report.contains("### `overall_average_marks`"));
        assert!(report.contains("1. Algorithms — 88.5"));
        assert!(report.contains("| 0-25 | 1 |"));
        assert!(report.contains("All quiet on campus."));
        // The failed domain renders its error, not metric tables.
        assert!(report.contains("> evaluation data is empty or could not be loaded"));
    }

    #[test]
    fn test_crosstab_rendering() {
        let report = generate_markdown_report(&payload());
        assert!(report.contains("| Group | 0 | 1 |"));
        assert!(report.contains("| Female | 1 | 3 |"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let json = generate_json_report(&payload()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["academic"]["metrics"]["overall_average_marks"],
            serde_json::json!(72.4)
        );
        assert_eq!(value["narrative"], serde_json::json!("All quiet on campus."));
    }
}
