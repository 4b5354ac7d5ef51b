//! Aggregation for the faculty evaluation dataset.

use crate::analytics::core::{mean, rank_desc, GroupedValues};
use crate::canonical::{CanonicalRecord, CanonicalSet, DatasetSchema};
use crate::models::{Domain, MetricBundle, MetricEntry, MetricValue};
use std::collections::BTreeMap;
use tracing::debug;

/// Minimal canonical columns the evaluation aggregator needs.
pub const SCHEMA: DatasetSchema = DatasetSchema {
    domain: Domain::Evaluation,
    required: &["department", "rating"],
    numeric: &["rating"],
    flags: &[],
    dates: &[],
};

const RATING_MIN: i64 = 1;
const RATING_MAX: i64 = 5;

/// Round the review rating to the nearest integer on the 1-5 scale.
/// `None` when the rounded value falls outside the scale.
fn scale_rating(raw: f64) -> Option<i64> {
    let rounded = raw.round() as i64;
    (RATING_MIN..=RATING_MAX).contains(&rounded).then_some(rounded)
}

/// Trailing integer of a label ("Semester 3" -> 3), if any.
fn trailing_int(label: &str) -> Option<i64> {
    let digits: String = label
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// Order semester entries by trailing integer; when no label carries a
/// numeric suffix, fall back to a plain lexicographic sort. Mixed labels
/// put the numeric ones first.
fn sort_by_numeric_suffix(mut entries: Vec<MetricEntry>) -> Vec<MetricEntry> {
    if entries.iter().all(|e| trailing_int(&e.name).is_none()) {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        return entries;
    }
    entries.sort_by(|a, b| match (trailing_int(&a.name), trailing_int(&b.name)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
    entries
}

/// Order year entries numerically where the whole label parses as a
/// number, string-sorted otherwise; numeric labels come first.
fn sort_numeric_first(mut entries: Vec<MetricEntry>) -> Vec<MetricEntry> {
    entries.sort_by(|a, b| match (a.name.parse::<i64>(), b.name.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.name.cmp(&b.name),
    });
    entries
}

/// Compute the evaluation metric bundle.
pub fn aggregate(set: &CanonicalSet, top_n: Option<usize>) -> MetricBundle {
    if set.is_empty() {
        return MetricBundle::empty_dataset(Domain::Evaluation);
    }

    // Rows whose rounded rating leaves the 1-5 scale are excluded from
    // every metric, matching the coercion-exclusion contract.
    let rated: Vec<(&CanonicalRecord, i64)> = set
        .records
        .iter()
        .filter_map(|record| {
            record
                .number("rating")
                .and_then(scale_rating)
                .map(|rating| (record, rating))
        })
        .collect();

    let excluded = set.records.len() - rated.len();
    if excluded > 0 {
        debug!(count = excluded, "ratings outside the 1-5 scale excluded");
    }

    if rated.is_empty() {
        return MetricBundle::empty_dataset(Domain::Evaluation);
    }

    let mut bundle = MetricBundle::new(Domain::Evaluation);

    let ratings: Vec<f64> = rated.iter().map(|(_, r)| *r as f64).collect();
    bundle.insert(
        "overall_average_rating",
        match mean(&ratings) {
            Some(value) => MetricValue::Scalar(value),
            None => MetricValue::error("no rows with valid ratings"),
        },
    );

    // Histogram over the integer buckets, all five keys always present.
    let mut histogram: BTreeMap<String, u64> = (RATING_MIN..=RATING_MAX)
        .map(|bucket| (bucket.to_string(), 0))
        .collect();
    for (_, rating) in &rated {
        *histogram.entry(rating.to_string()).or_insert(0) += 1;
    }
    bundle.insert("rating_distribution", MetricValue::Counts(histogram));

    // Mean rating per department.
    let mut by_department = GroupedValues::new();
    for (record, rating) in &rated {
        if let Some(dept) = record.text("department") {
            by_department.add(dept, *rating as f64);
        }
    }
    bundle.insert(
        "rating_by_department",
        if by_department.is_empty() {
            MetricValue::error("no rows with both department and rating")
        } else {
            MetricValue::Averages(by_department.sorted_means())
        },
    );

    // Mean rating per semester, ordered by the label's numeric suffix.
    let mut by_semester = GroupedValues::new();
    for (record, rating) in &rated {
        if let Some(semester) = record.text("semester") {
            by_semester.add(semester, *rating as f64);
        }
    }
    bundle.insert(
        "rating_by_semester",
        if by_semester.is_empty() {
            MetricValue::error("no rows with semester values")
        } else {
            MetricValue::Entries(sort_by_numeric_suffix(by_semester.mean_entries()))
        },
    );

    // Mean rating per academic year, numeric labels first.
    let mut by_year = GroupedValues::new();
    for (record, rating) in &rated {
        if let Some(year) = record.text("academic_year") {
            by_year.add(year, *rating as f64);
        }
    }
    bundle.insert(
        "rating_by_year",
        if by_year.is_empty() {
            MetricValue::error("no rows with academic year values")
        } else {
            MetricValue::Entries(sort_numeric_first(by_year.mean_entries()))
        },
    );

    // Top-rated faculty and courses by mean rating.
    let mut by_faculty = GroupedValues::new();
    let mut by_course = GroupedValues::new();
    for (record, rating) in &rated {
        if let Some(faculty) = record.text("faculty") {
            by_faculty.add(faculty, *rating as f64);
        }
        if let Some(course) = record.text("course") {
            by_course.add(course, *rating as f64);
        }
    }
    bundle.insert(
        "top_faculty",
        if by_faculty.is_empty() {
            MetricValue::error("no rows with faculty values")
        } else {
            MetricValue::Entries(rank_desc(by_faculty.mean_entries(), top_n))
        },
    );
    bundle.insert(
        "top_courses",
        if by_course.is_empty() {
            MetricValue::error("no rows with course values")
        } else {
            MetricValue::Entries(rank_desc(by_course.mean_entries(), top_n))
        },
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
    fn test_rating_scale() {
        assert_eq!(scale_rating(4.4), Some(4));
        assert_eq!(scale_rating(4.5), Some(5));
        assert_eq!(scale_rating(0.4), None);
        assert_eq!(scale_rating(5.6), None);
    }

    #[test]
    fn test_histogram_zero_fills_all_buckets() {
        let rows = vec![
            record(&[("department", "CSE"), ("rating", "5")]),
            record(&[("department", "CSE"), ("rating", "5")]),
            record(&[("department", "CSE"), ("rating", "3")]),
        ];
        let bundle = aggregate(&canonical(&rows), None);

        let histogram = match bundle.get("rating_distribution").unwrap() {
            MetricValue::Counts(map) => map,
            other => panic!("unexpected value: {other:?}"),
        };
        assert_eq!(histogram.len(), 5);
        assert_eq!(histogram.get("1"), Some(&0));
        assert_eq!(histogram.get("3"), Some(&1));
        assert_eq!(histogram.get("5"), Some(&2));
    }

    #[test]
    fn test_out_of_scale_ratings_excluded() {
        let rows = vec![
            record(&[("department", "CSE"), ("rating", "4")]),
            record(&[("department", "CSE"), ("rating", "9.7")]),
        ];
        let bundle = aggregate(&canonical(&rows), None);
        assert_eq!(
            bundle.get("overall_average_rating").unwrap().as_scalar(),
            Some(4.0)
        );
    }

    #[test]
    fn test_semester_numeric_suffix_ordering() {
        let entries = vec![
            MetricEntry::new("Semester 10", 4.0),
            MetricEntry::new("Semester 2", 3.5),
            MetricEntry::new("Semester 1", 4.2),
        ];
        let sorted = sort_by_numeric_suffix(entries);
        let names: Vec<&str> = sorted.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Semester 1", "Semester 2", "Semester 10"]);
    }

    #[test]
    fn test_semester_lexicographic_fallback() {
        let entries = vec![
            MetricEntry::new("Winter", 4.0),
            MetricEntry::new("Autumn", 3.5),
        ];
        let sorted = sort_by_numeric_suffix(entries);
        assert_eq!(sorted[0].name, "Autumn");
    }

    #[test]
    fn test_year_numeric_first_ordering() {
        let entries = vec![
            MetricEntry::new("unknown", 3.0),
            MetricEntry::new("2023", 4.0),
            MetricEntry::new("2021", 3.8),
        ];
        let sorted = sort_numeric_first(entries);
        let names: Vec<&str> = sorted.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["2021", "2023", "unknown"]);
    }

    #[test]
    fn test_top_faculty_by_mean_rating() {
        let rows = vec![
            record(&[("department", "CSE"), ("rating", "5"), ("faculty", "Rao")]),
            record(&[("department", "CSE"), ("rating", "3"), ("faculty", "Iyer")]),
            record(&[("department", "CSE"), ("rating", "4"), ("faculty", "Rao")]),
        ];
        let bundle = aggregate(&canonical(&rows), Some(1));

        let faculty = bundle.get("top_faculty").and_then(MetricValue::as_entries).unwrap();
        assert_eq!(faculty.len(), 1);
        assert_eq!(faculty[0].name, "Rao");
        assert_eq!(faculty[0].value, 4.5);
    }

    #[test]
    fn test_all_ratings_out_of_scale_is_empty_dataset() {
        let rows = vec![record(&[("department", "CSE"), ("rating", "42")])];
        let bundle = aggregate(&canonical(&rows), None);
        assert!(bundle.is_dataset_error());
    }
}
