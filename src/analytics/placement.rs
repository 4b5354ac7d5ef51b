//! Aggregation for the placement outcomes dataset.

use crate::analytics::core::{mean, rank_desc, GroupedValues};
use crate::canonical::{CanonicalRecord, CanonicalSet, DatasetSchema};
use crate::models::{Domain, MetricBundle, MetricValue, SeriesData};
use std::collections::BTreeMap;

/// Minimal canonical columns the placement aggregator needs.
pub const SCHEMA: DatasetSchema = DatasetSchema {
    domain: Domain::Placement,
    required: &["department", "placement_status"],
    numeric: &["cgpa", "package_lpa"],
    flags: &["placement_status"],
    dates: &[],
};

/// Fixed CGPA buckets for the dashboard chart.
const CGPA_BUCKET_LABELS: &[&str] = &["<7", "7-8", "8-9", "9+"];

fn is_placed(record: &CanonicalRecord) -> bool {
    record.number("placement_status") == Some(1.0)
}

/// Split a raw skills cell on the normalized delimiter set (comma,
/// semicolon, pipe, runs of spaces) and lowercase each token.
fn split_skills(raw: &str) -> Vec<String> {
    raw.split([',', ';', '|', ' '])
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Compute the placement metric bundle.
pub fn aggregate(set: &CanonicalSet, top_n: Option<usize>) -> MetricBundle {
    if set.is_empty() {
        return MetricBundle::empty_dataset(Domain::Placement);
    }

    let mut bundle = MetricBundle::new(Domain::Placement);

    let indicators: Vec<f64> = set
        .records
        .iter()
        .filter_map(|r| r.number("placement_status"))
        .collect();

    bundle.insert(
        "placement_rate",
        match mean(&indicators) {
            Some(rate) => MetricValue::Scalar(rate),
            None => MetricValue::error("no rows with placement outcomes"),
        },
    );

    // Average package over placed students only.
    let placed_packages: Vec<f64> = set
        .records
        .iter()
        .filter(|r| is_placed(r))
        .filter_map(|r| r.number("package_lpa"))
        .collect();
    bundle.insert(
        "average_package_lpa",
        match mean(&placed_packages) {
            Some(value) => MetricValue::Scalar(value),
            None => MetricValue::error("no package data for placed students"),
        },
    );

    // Placement rate per department over the full filtered population.
    let mut rate_by_dept = GroupedValues::new();
    for record in &set.records {
        if let (Some(dept), Some(status)) =
            (record.text("department"), record.number("placement_status"))
        {
            rate_by_dept.add(dept, status);
        }
    }
    bundle.insert(
        "placement_rate_by_department",
        if rate_by_dept.is_empty() {
            MetricValue::error("no rows with both department and placement outcome")
        } else {
            MetricValue::Averages(rate_by_dept.sorted_means())
        },
    );

    // Average package per department, placed-only subset.
    let mut package_by_dept = GroupedValues::new();
    for record in set.records.iter().filter(|r| is_placed(r)) {
        if let (Some(dept), Some(package)) =
            (record.text("department"), record.number("package_lpa"))
        {
            package_by_dept.add(dept, package);
        }
    }
    bundle.insert(
        "average_package_by_department",
        if package_by_dept.is_empty() {
            MetricValue::error("no package data for placed students")
        } else {
            MetricValue::Averages(package_by_dept.sorted_means())
        },
    );

    // CGPA histogram over fixed ranges.
    let cgpas: Vec<f64> = set.records.iter().filter_map(|r| r.number("cgpa")).collect();
    bundle.insert(
        "cgpa_distribution",
        if cgpas.is_empty() {
            MetricValue::error("no rows with CGPA values")
        } else {
            let mut counts = [0u64; 4];
            for cgpa in &cgpas {
                let idx = if *cgpa < 7.0 {
                    0
                } else if *cgpa < 8.0 {
                    1
                } else if *cgpa < 9.0 {
                    2
                } else {
                    3
                };
                counts[idx] += 1;
            }
            MetricValue::Series(SeriesData {
                labels: CGPA_BUCKET_LABELS.iter().map(|s| s.to_string()).collect(),
                data: counts.to_vec(),
            })
        },
    );

    // Average CGPA split by placement outcome.
    let mut cgpa_by_outcome = GroupedValues::new();
    for record in &set.records {
        if let (Some(cgpa), Some(status)) = (record.number("cgpa"), record.number("placement_status"))
        {
            let label = if status == 1.0 { "placed" } else { "not placed" };
            cgpa_by_outcome.add(label, cgpa);
        }
    }
    bundle.insert(
        "average_cgpa_by_outcome",
        if cgpa_by_outcome.is_empty() {
            MetricValue::error("no rows with CGPA values")
        } else {
            MetricValue::Averages(cgpa_by_outcome.sorted_means())
        },
    );

    // Top recruiting companies, placed students only.
    let mut companies = GroupedValues::new();
    for record in set.records.iter().filter(|r| is_placed(r)) {
        if let Some(company) = record.text("company") {
            companies.add(company, 1.0);
        }
    }
    bundle.insert(
        "top_companies",
        if companies.is_empty() {
            MetricValue::error("no company data for placed students")
        } else {
            MetricValue::Entries(rank_desc(companies.count_entries(), top_n))
        },
    );

    // Top skills, placed students only.
    let mut skills = GroupedValues::new();
    for record in set.records.iter().filter(|r| is_placed(r)) {
        if let Some(raw) = record.text("skills") {
            for skill in split_skills(raw) {
                skills.add(&skill, 1.0);
            }
        }
    }
    bundle.insert(
        "top_skills",
        if skills.is_empty() {
            MetricValue::error("no skills data for placed students")
        } else {
            MetricValue::Entries(rank_desc(skills.count_entries(), top_n))
        },
    );

    bundle.insert("gender_placement_matrix", gender_placement_matrix(set));

    // Gender value counts for the dashboard pie chart.
    let mut genders = GroupedValues::new();
    for record in &set.records {
        if let Some(gender) = record.text("gender") {
            genders.add(gender, 1.0);
        }
    }
    bundle.insert(
        "gender_distribution",
        if genders.is_empty() {
            MetricValue::error("no rows with gender values")
        } else {
            MetricValue::Counts(genders.sorted_counts())
        },
    );

    bundle
}

/// Gender-vs-placement cross tabulation.
///
/// Both outcome keys are always present (zero-filled). Fewer than two
/// distinct valid genders after excluding "unknown" yields an error
/// marker instead of a degenerate table.
fn gender_placement_matrix(set: &CanonicalSet) -> MetricValue {
    let mut table: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

    for record in &set.records {
        if let (Some(gender), Some(status)) =
            (record.text("gender"), record.number("placement_status"))
        {
            let outcome = if status == 1.0 { "1" } else { "0" };
            let row = table.entry(gender.to_string()).or_insert_with(|| {
                let mut zeroed = BTreeMap::new();
                zeroed.insert("0".to_string(), 0);
                zeroed.insert("1".to_string(), 0);
                zeroed
            });
            *row.entry(outcome.to_string()).or_insert(0) += 1;
        }
    }

    if table.is_empty() {
        return MetricValue::error("no rows with both gender and placement outcome");
    }

    let distinct_valid = table
        .keys()
        .filter(|gender| !gender.eq_ignore_ascii_case("unknown"))
        .count();
    if distinct_valid < 2 {
        return MetricValue::error("insufficient distinct gender values");
    }

    MetricValue::CrossTab(table)
}
