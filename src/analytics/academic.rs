//! Aggregation for the academic exam dataset.

use crate::analytics::core::{mean, rank_desc, GroupedValues};
use crate::canonical::{CanonicalSet, DatasetSchema};
use crate::models::{Domain, MetricBundle, MetricValue, SeriesData};
use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::debug;

/// Minimal canonical columns the academic aggregator needs.
pub const SCHEMA: DatasetSchema = DatasetSchema {
    domain: Domain::Academic,
    required: &["department", "marks"],
    numeric: &["marks"],
    flags: &[],
    dates: &["exam_date"],
};

/// Score-to-letter thresholds, applied per row before grouping.
const GRADE_BANDS: &[(f64, &str)] = &[
    (90.0, "A+"),
    (80.0, "A"),
    (70.0, "B"),
    (60.0, "C"),
    (40.0, "D"),
];

/// Patterns mapping raw exam-type strings onto the Internal/External split.
const INTERNAL_PATTERNS: &[&str] = &["internal", "midterm", "mid"];
const EXTERNAL_PATTERNS: &[&str] = &["external", "final", "endterm"];

/// Fixed mark ranges for the dashboard histogram.
const MARKS_RANGE_LABELS: &[&str] = &["0-25", "26-50", "51-75", "76-100"];

fn grade_for(marks: f64) -> &'static str {
    for (threshold, letter) in GRADE_BANDS.iter().copied() {
        if marks >= threshold {
            return letter;
        }
    }
    "F"
}

/// Classify a raw exam-type string as Internal, External, or Other.
fn exam_type_class(raw: &str) -> &'static str {
    let lowered = raw.to_lowercase();
    if INTERNAL_PATTERNS.iter().any(|p| lowered.contains(p)) {
        "Internal"
    } else if EXTERNAL_PATTERNS.iter().any(|p| lowered.contains(p)) {
        "External"
    } else {
        "Other"
    }
}

/// Compute the academic metric bundle.
///
/// `top_n` caps ranking metrics; `None` keeps every entry. Per-metric
/// failures degrade only that metric; the rest of the bundle survives.
pub fn aggregate(set: &CanonicalSet, top_n: Option<usize>) -> MetricBundle {
    if set.is_empty() {
        return MetricBundle::empty_dataset(Domain::Academic);
    }

    let mut bundle = MetricBundle::new(Domain::Academic);

    let marks: Vec<f64> = set
        .records
        .iter()
        .filter_map(|r| r.number("marks"))
        .collect();

    bundle.insert(
        "overall_average_marks",
        match mean(&marks) {
            Some(value) => MetricValue::Scalar(value),
            None => MetricValue::error("no rows with marks values"),
        },
    );

    // Mean mark per department.
    let mut by_department = GroupedValues::new();
    for record in &set.records {
        if let (Some(dept), Some(marks)) = (record.text("department"), record.number("marks")) {
            by_department.add(dept, marks);
        }
    }
    bundle.insert(
        "performance_by_department",
        if by_department.is_empty() {
            MetricValue::error("no rows with both department and marks")
        } else {
            MetricValue::Averages(by_department.sorted_means())
        },
    );

    // Letter-grade histogram, thresholds applied per row.
    let mut grades: BTreeMap<String, u64> = BTreeMap::new();
    for value in &marks {
        *grades.entry(grade_for(*value).to_string()).or_insert(0) += 1;
    }
    bundle.insert(
        "grade_distribution",
        if grades.is_empty() {
            MetricValue::error("no rows with marks values")
        } else {
            MetricValue::Counts(grades)
        },
    );

    // Mean mark per subject, ranked.
    let mut by_subject = GroupedValues::new();
    for record in &set.records {
        if let (Some(subject), Some(marks)) = (record.text("subject"), record.number("marks")) {
            by_subject.add(subject, marks);
        }
    }
    bundle.insert(
        "top_subjects",
        if by_subject.is_empty() {
            MetricValue::error("no rows with both subject and marks")
        } else {
            MetricValue::Entries(rank_desc(by_subject.mean_entries(), top_n))
        },
    );

    // Internal/External comparison; Other is excluded but counted.
    let mut by_exam_class = GroupedValues::new();
    let mut other_exam_types = 0usize;
    for record in &set.records {
        if let (Some(exam_type), Some(marks)) = (record.text("exam_type"), record.number("marks")) {
            match exam_type_class(exam_type) {
                "Other" => other_exam_types += 1,
                class => by_exam_class.add(class, marks),
            }
        }
    }
    if other_exam_types > 0 {
        debug!(
            count = other_exam_types,
            "exam types outside the Internal/External split"
        );
    }
    bundle.insert(
        "exam_type_performance",
        if by_exam_class.is_empty() {
            MetricValue::error("no rows with recognized exam types")
        } else {
            MetricValue::Averages(by_exam_class.sorted_means())
        },
    );

    // Mean mark per calendar year of the exam date.
    let mut by_year = GroupedValues::new();
    for record in &set.records {
        if let (Some(date), Some(marks)) = (record.date("exam_date"), record.number("marks")) {
            by_year.add(&date.year().to_string(), marks);
        }
    }
    bundle.insert(
        "performance_by_year",
        if by_year.is_empty() {
            MetricValue::error("no rows with valid exam dates")
        } else {
            MetricValue::Averages(by_year.sorted_means())
        },
    );

    // Fixed-range marks histogram for the dashboard chart.
    let mut range_counts = [0u64; 4];
    for value in &marks {
        let idx = if *value <= 25.0 {
            0
        } else if *value <= 50.0 {
            1
        } else if *value <= 75.0 {
            2
        } else {
            3
        };
        range_counts[idx] += 1;
    }
    bundle.insert(
        "marks_distribution",
        MetricValue::Series(SeriesData {
            labels: MARKS_RANGE_LABELS.iter().map(|s| s.to_string()).collect(),
            data: range_counts.to_vec(),
        }),
    );

    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonicalize;
    use crate::models::RawRecord;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        let mut rec = RawRecord::new();
        for (k, v) in pairs {
            rec.insert(*k, *v);
        }
        rec
    }

    fn canonical(rows: &[RawRecord]) -> CanonicalSet {
        canonicalize(rows, &SCHEMA).unwrap()
    }

    #[test]
    fn test_grade_distribution_thresholds() {
        let rows: Vec<RawRecord> = [95, 85, 72, 61, 45, 10]
            .iter()
            .map(|m| record(&[("department", "CSE"), ("marks", &m.to_string())]))
            .collect();
        let bundle = aggregate(&canonical(&rows), None);

        let grades = match bundle.get("grade_distribution").unwrap() {
            MetricValue::Counts(map) => map,
            other => panic!("unexpected value: {other:?}"),
        };
        for letter in ["A+", "A", "B", "C", "D", "F"] {
            assert_eq!(grades.get(letter), Some(&1), "grade {letter}");
        }
    }

    #[test]
    fn test_department_keys_exactly_cover_filtered_rows() {
        let rows = vec![
            record(&[("department", "ECE"), ("marks", "70")]),
            record(&[("department", "CSE"), ("marks", "90")]),
            record(&[("department", "CSE"), ("marks", "80")]),
        ];
        let bundle = aggregate(&canonical(&rows), None);

        let means = bundle
            .get("performance_by_department")
            .and_then(MetricValue::as_averages)
            .unwrap();
        let keys: Vec<&String> = means.keys().collect();
        assert_eq!(keys, ["CSE", "ECE"]);
        assert_eq!(means["CSE"], 85.0);
    }

    #[test]
    fn test_exam_type_mapping() {
        assert_eq!(exam_type_class("Mid-Term"), "Internal");
        assert_eq!(exam_type_class("FINAL exam"), "External");
        assert_eq!(exam_type_class("endterm"), "External");
        assert_eq!(exam_type_class("viva"), "Other");

        let rows = vec![
            record(&[("department", "CSE"), ("marks", "80"), ("exam_type", "Midterm")]),
            record(&[("department", "CSE"), ("marks", "60"), ("exam_type", "Final")]),
            record(&[("department", "CSE"), ("marks", "99"), ("exam_type", "viva")]),
        ];
        let bundle = aggregate(&canonical(&rows), None);
        let means = bundle
            .get("exam_type_performance")
            .and_then(MetricValue::as_averages)
            .unwrap();
        assert_eq!(means.get("Internal"), Some(&80.0));
        assert_eq!(means.get("External"), Some(&60.0));
        // "viva" maps to Other, which stays out of the comparison.
        assert_eq!(means.len(), 2);
    }

    #[test]
    fn test_marks_distribution_ranges() {
        let rows: Vec<RawRecord> = [10, 25, 26, 50, 51, 75, 76, 100]
            .iter()
            .map(|m| record(&[("department", "CSE"), ("marks", &m.to_string())]))
            .collect();
        let bundle = aggregate(&canonical(&rows), None);

        let series = match bundle.get("marks_distribution").unwrap() {
            MetricValue::Series(series) => series,
            other => panic!("unexpected value: {other:?}"),
        };
        assert_eq!(series.labels, ["0-25", "26-50", "51-75", "76-100"]);
        assert_eq!(series.data, [2, 2, 2, 2]);
    }

    #[test]
    fn test_optional_metrics_degrade_independently() {
        // No subject, exam_type, or date columns: those metrics carry
        // error markers while the rest of the bundle is intact.
        let rows = vec![record(&[("department", "CSE"), ("marks", "82")])];
        let bundle = aggregate(&canonical(&rows), None);

        assert!(bundle.get("top_subjects").unwrap().is_error());
        assert!(bundle.get("exam_type_performance").unwrap().is_error());
        assert!(bundle.get("performance_by_year").unwrap().is_error());
        assert_eq!(
            bundle.get("overall_average_marks").unwrap().as_scalar(),
            Some(82.0)
        );
    }

    #[test]
    fn test_performance_by_year() {
        let rows = vec![
            record(&[("department", "CSE"), ("marks", "80"), ("exam_date", "2022-05-01")]),
            record(&[("department", "CSE"), ("marks", "90"), ("exam_date", "2023-05-01")]),
            record(&[("department", "CSE"), ("marks", "70"), ("exam_date", "2022-11-20")]),
        ];
        let bundle = aggregate(&canonical(&rows), None);
        let by_year = bundle
            .get("performance_by_year")
            .and_then(MetricValue::as_averages)
            .unwrap();
        assert_eq!(by_year.get("2022"), Some(&75.0));
        assert_eq!(by_year.get("2023"), Some(&90.0));
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let rows = vec![
            record(&[("department", "CSE"), ("marks", "91"), ("subject", "Algorithms")]),
            record(&[("department", "ECE"), ("marks", "64"), ("subject", "Circuits")]),
        ];
        let set = canonical(&rows);
        let first = serde_json::to_vec(&aggregate(&set, Some(5))).unwrap();
        let second = serde_json::to_vec(&aggregate(&set, Some(5))).unwrap();
        assert_eq!(first, second);
    }
}
