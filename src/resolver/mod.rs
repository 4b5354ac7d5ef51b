//! Free-text question answering over precomputed metric bundles.
//!
//! The resolver extracts a department entity and a metric intent from a
//! question, looks the answer up in the bundles, and composes a short
//! factual summary. It never fails: every unmatched path returns a fixed
//! guidance string instead of an error.

pub mod intent;

use crate::models::{BundleSet, Domain, MetricBundle, MetricEntry, MetricValue};
use intent::{IntentKind, QueryIntent};
use std::collections::BTreeSet;

/// Deterministic guidance returned when no intent pattern matches.
pub const FALLBACK_GUIDANCE: &str = "I can answer questions about overall KPIs (placement rate, \
average package, average marks, average faculty rating), department-level averages, and top-N \
rankings (companies, skills, subjects, faculty, courses). Try naming a metric, optionally with \
a department code or a top-N count.";

/// The outcome of one question-answering call.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QueryAnswer {
    /// Factual summary, or the fixed guidance string when unmatched.
    pub summary: String,
    /// False only for the guidance fallback.
    pub matched: bool,
}

impl QueryAnswer {
    fn matched(summary: String) -> Self {
        Self {
            summary,
            matched: true,
        }
    }

    fn fallback() -> Self {
        Self {
            summary: FALLBACK_GUIDANCE.to_string(),
            matched: false,
        }
    }
}

/// Union of department tokens observed across all three bundles.
pub fn department_tokens(bundles: &BundleSet) -> Vec<String> {
    let mut tokens = BTreeSet::new();
    for (bundle, metric) in [
        (&bundles.academic, "performance_by_department"),
        (&bundles.placement, "placement_rate_by_department"),
        (&bundles.evaluation, "rating_by_department"),
    ] {
        tokens.extend(bundle.department_keys(metric));
    }
    tokens.into_iter().collect()
}

/// Answer a free-text question from the precomputed bundles.
pub fn answer(question: &str, bundles: &BundleSet) -> QueryAnswer {
    let departments = department_tokens(bundles);
    match intent::resolve(question, &departments) {
        Some(query) => compose(question, &query, bundles),
        None => QueryAnswer::fallback(),
    }
}

/// Format a value for a summary: counts print whole, means with 2 decimals.
fn fmt_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn fmt_rate(rate: f64) -> String {
    format!("{}%", fmt_value((rate * 100.0 * 100.0).round() / 100.0))
}

/// Ranked entries as a comma-joined "name (value)" list.
fn fmt_entries(entries: &[MetricEntry], top_n: Option<usize>) -> String {
    let shown = top_n.unwrap_or(entries.len()).min(entries.len());
    entries[..shown]
        .iter()
        .map(|e| format!("{} ({})", e.name, fmt_value(e.value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Phrase a scalar-or-per-department metric.
///
/// With an entity and no "overall" in the question, the per-department
/// mapping is consulted; a department missing from that mapping gets a
/// message distinct from the generic fallback. Metric-level error markers
/// surface their reason verbatim.
fn scalar_answer(
    question: &str,
    query: &QueryIntent,
    bundle: &MetricBundle,
    per_dept_metric: &str,
    overall_metric: &str,
    describe: impl Fn(Option<&str>, String) -> String,
    fmt: impl Fn(f64) -> String,
) -> QueryAnswer {
    let wants_overall = question.to_lowercase().contains("overall");

    if let Some(dept) = query.entity.as_deref().filter(|_| !wants_overall) {
        return match bundle.get(per_dept_metric) {
            Some(MetricValue::Averages(map)) => match map.get(dept) {
                Some(value) => QueryAnswer::matched(describe(Some(dept), fmt(*value))),
                None => QueryAnswer::matched(format!(
                    "No {} data recorded for department {dept}.",
                    bundle.domain
                )),
            },
            Some(MetricValue::Error(marker)) => QueryAnswer::matched(marker.error.clone()),
            _ => QueryAnswer::matched(format!(
                "No {} data recorded for department {dept}.",
                bundle.domain
            )),
        };
    }

    match bundle.get(overall_metric) {
        Some(MetricValue::Scalar(value)) => QueryAnswer::matched(describe(None, fmt(*value))),
        Some(MetricValue::Error(marker)) => QueryAnswer::matched(marker.error.clone()),
        _ => QueryAnswer::matched(format!(
            "{} data is empty or could not be loaded",
            bundle.domain
        )),
    }
}

/// Phrase a ranking metric, honoring an explicit top-N from the question.
fn ranking_answer(
    query: &QueryIntent,
    bundle: &MetricBundle,
    metric: &str,
    label: &str,
) -> QueryAnswer {
    match bundle.get(metric) {
        Some(MetricValue::Entries(entries)) if !entries.is_empty() => {
            let heading = match query.top_n {
                Some(n) => format!("Top {n} {label}"),
                None => format!("Top {label}"),
            };
            QueryAnswer::matched(format!("{heading}: {}.", fmt_entries(entries, query.top_n)))
        }
        Some(MetricValue::Error(marker)) => QueryAnswer::matched(marker.error.clone()),
        _ => QueryAnswer::matched(format!(
            "{} data is empty or could not be loaded",
            bundle.domain
        )),
    }
}

fn compose(question: &str, query: &QueryIntent, bundles: &BundleSet) -> QueryAnswer {
    match query.kind {
        IntentKind::PlacementRate => scalar_answer(
            question,
            query,
            bundles.get(Domain::Placement),
            "placement_rate_by_department",
            "placement_rate",
            |dept, value| match dept {
                Some(dept) => format!("Placement rate for {dept}: {value}."),
                None => format!("Overall placement rate: {value}."),
            },
            fmt_rate,
        ),
        IntentKind::AveragePackage => scalar_answer(
            question,
            query,
            bundles.get(Domain::Placement),
            "average_package_by_department",
            "average_package_lpa",
            |dept, value| match dept {
                Some(dept) => format!("Average package for {dept}: {value} LPA."),
                None => format!("Overall average package: {value} LPA."),
            },
            fmt_value,
        ),
        IntentKind::AverageMarks => scalar_answer(
            question,
            query,
            bundles.get(Domain::Academic),
            "performance_by_department",
            "overall_average_marks",
            |dept, value| match dept {
                Some(dept) => format!("Average marks for {dept}: {value}."),
                None => format!("Overall average marks: {value}."),
            },
            fmt_value,
        ),
        IntentKind::AverageRating => scalar_answer(
            question,
            query,
            bundles.get(Domain::Evaluation),
            "rating_by_department",
            "overall_average_rating",
            |dept, value| match dept {
                Some(dept) => format!("Average faculty rating for {dept}: {value}."),
                None => format!("Overall average faculty rating: {value}."),
            },
            fmt_value,
        ),
        IntentKind::TopCompanies => ranking_answer(
            query,
            bundles.get(Domain::Placement),
            "top_companies",
            "recruiting companies",
        ),
        IntentKind::TopSkills => ranking_answer(
            query,
            bundles.get(Domain::Placement),
            "top_skills",
            "skills in demand",
        ),
        IntentKind::TopSubjects => ranking_answer(
            query,
            bundles.get(Domain::Academic),
            "top_subjects",
            "subjects by average marks",
        ),
        IntentKind::TopFaculty => ranking_answer(
            query,
            bundles.get(Domain::Evaluation),
            "top_faculty",
            "rated faculty",
        ),
        IntentKind::TopCourses => ranking_answer(
            query,
            bundles.get(Domain::Evaluation),
            "top_courses",
            "rated courses",
        ),
    }
}
