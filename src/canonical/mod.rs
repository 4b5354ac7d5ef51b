//! Schema-tolerant normalization of raw tabular records.
//!
//! Source files name and type their columns inconsistently; this module
//! maps raw column names onto a fixed canonical schema (trim, lowercase,
//! synonym table) and coerces cell values into typed fields, tracking
//! every dropped or defaulted value for diagnostics.

use crate::models::{DatasetError, Domain, RawRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Column-name synonyms, applied after trimming and lowercasing.
///
/// Kept as data so schema variance across source files can be extended
/// without touching coercion or aggregation logic.
const COLUMN_SYNONYMS: &[(&str, &str)] = &[
    ("dept", "department"),
    ("dept_name", "department"),
    ("branch", "department"),
    ("mark", "marks"),
    ("score", "marks"),
    ("marks_obtained", "marks"),
    ("sub", "subject"),
    ("subjects", "subject"),
    ("subject_name", "subject"),
    ("exam_ty", "exam_type"),
    ("examtype", "exam_type"),
    ("exam_category", "exam_type"),
    ("date", "exam_date"),
    ("date_of_exam", "exam_date"),
    ("pkg_lpa", "package_lpa"),
    ("package", "package_lpa"),
    ("salary_lpa", "package_lpa"),
    ("ctc", "package_lpa"),
    ("placed", "placement_status"),
    ("placement", "placement_status"),
    ("is_placed", "placement_status"),
    ("placement_outcome", "placement_status"),
    ("gpa", "cgpa"),
    ("cgpa_score", "cgpa"),
    ("company_name", "company"),
    ("recruiter", "company"),
    ("skill", "skills"),
    ("skill_set", "skills"),
    ("key_skills", "skills"),
    ("sex", "gender"),
    ("review_rating", "rating"),
    ("review_score", "rating"),
    ("stars", "rating"),
    ("faculty_name", "faculty"),
    ("teacher", "faculty"),
    ("instructor", "faculty"),
    ("course_name", "course"),
    ("sem", "semester"),
    ("year_or_semester", "semester"),
    ("year", "academic_year"),
    ("ay", "academic_year"),
];

/// Recognized categorical flag values, matched after lowercasing/trimming.
/// Anything else defaults to the negative class and is counted.
const FLAG_VALUES: &[(&str, f64)] = &[
    ("yes", 1.0),
    ("no", 0.0),
    ("true", 1.0),
    ("false", 0.0),
    ("placed", 1.0),
    ("not placed", 0.0),
    ("unplaced", 0.0),
    ("y", 1.0),
    ("n", 0.0),
    ("1", 1.0),
    ("0", 0.0),
    ("1.0", 1.0),
    ("0.0", 0.0),
];

/// Accepted date layouts, tried in order; first parse wins.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d/%m/%Y"];

/// The canonical column expectations of one aggregator variant.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSchema {
    pub domain: Domain,
    /// Minimal column set; normalization fails without all of these.
    pub required: &'static [&'static str],
    /// Columns coerced to numbers; unparsable cells become absent.
    pub numeric: &'static [&'static str],
    /// Categorical 0/1 columns mapped through [`FLAG_VALUES`].
    pub flags: &'static [&'static str],
    /// Columns parsed to dates; invalid cells become absent.
    pub dates: &'static [&'static str],
}

/// A typed cell value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

/// A row after column-name normalization and value coercion.
///
/// Every field either exists with a typed value or is absent; consumers
/// never see a raw untyped string for a typed column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl CanonicalRecord {
    fn insert(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    /// Numeric field, if present and typed as a number.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            Some(FieldValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Text field, if present.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Date field, if present and valid.
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.fields.get(name) {
            Some(FieldValue::Date(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Counters for values dropped or defaulted during coercion.
///
/// Diagnostics only; they never fail a request on their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoercionStats {
    /// Rows received from the provider.
    pub rows_in: usize,
    /// Rows surviving coercion.
    pub rows_kept: usize,
    /// Rows excluded because a required value was absent or unparsable.
    pub rows_dropped: usize,
    /// Numeric cells that failed to parse.
    pub invalid_numbers: usize,
    /// Date cells that failed to parse.
    pub invalid_dates: usize,
    /// Categorical cells defaulted to the negative class.
    pub unmapped_values: usize,
}

/// The canonical records for one domain plus coercion diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSet {
    pub domain: Domain,
    pub records: Vec<CanonicalRecord>,
    pub stats: CoercionStats,
}

impl CanonicalSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalize a raw column name: trim, lowercase, then synonym-map.
pub fn canonical_column_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    for (alias, canonical) in COLUMN_SYNONYMS {
        if lowered == *alias {
            return (*canonical).to_string();
        }
    }
    lowered
}

/// Map a categorical flag value to 0/1. `None` means unrecognized.
fn map_flag_value(raw: &str) -> Option<f64> {
    let lowered = raw.trim().to_lowercase();
    FLAG_VALUES
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, v)| *v)
}

/// Parse a date trying each accepted layout in order.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Canonicalize a raw record set against one aggregator's schema.
///
/// Fails with `MissingColumns` when a required column is absent from the
/// data even after synonym mapping, and with `EmptyDataset` when the input
/// is empty or coercion excluded every row. Coercion is a pure function of
/// its input: the same raw rows always produce the same canonical set and
/// the same exclusion counts.
pub fn canonicalize(raw: &[RawRecord], schema: &DatasetSchema) -> Result<CanonicalSet, DatasetError> {
    if raw.is_empty() {
        return Err(DatasetError::EmptyDataset {
            domain: schema.domain,
        });
    }

    // Presence is checked against the union of observed columns so the
    // synonym table runs before any "missing column" verdict.
    let observed: BTreeSet<String> = raw
        .iter()
        .flat_map(|record| record.iter().map(|(name, _)| canonical_column_name(name)))
        .collect();

    let missing: Vec<&str> = schema
        .required
        .iter()
        .copied()
        .filter(|required| !observed.contains(*required))
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns {
            domain: schema.domain,
            columns: missing.join(", "),
        });
    }

    let mut stats = CoercionStats {
        rows_in: raw.len(),
        ..CoercionStats::default()
    };
    let mut records = Vec::with_capacity(raw.len());

    for row in raw {
        let mut canonical = CanonicalRecord::default();

        for (name, value) in row.iter() {
            let column = canonical_column_name(name);
            let cell = value.trim();
            if cell.is_empty() {
                continue;
            }

            if schema.numeric.contains(&column.as_str()) {
                match cell.parse::<f64>() {
                    Ok(v) => canonical.insert(&column, FieldValue::Number(v)),
                    Err(_) => stats.invalid_numbers += 1,
                }
            } else if schema.flags.contains(&column.as_str()) {
                let mapped = match map_flag_value(cell) {
                    Some(v) => v,
                    None => {
                        stats.unmapped_values += 1;
                        0.0
                    }
                };
                canonical.insert(&column, FieldValue::Number(mapped));
            } else if schema.dates.contains(&column.as_str()) {
                match parse_date(cell) {
                    Some(d) => canonical.insert(&column, FieldValue::Date(d)),
                    None => stats.invalid_dates += 1,
                }
            } else {
                canonical.insert(&column, FieldValue::Text(cell.to_string()));
            }
        }

        let complete = schema
            .required
            .iter()
            .all(|required| canonical.fields.contains_key(*required));
        if complete {
            records.push(canonical);
        } else {
            stats.rows_dropped += 1;
        }
    }

    stats.rows_kept = records.len();
    debug!(
        domain = %schema.domain,
        rows_in = stats.rows_in,
        rows_kept = stats.rows_kept,
        rows_dropped = stats.rows_dropped,
        invalid_numbers = stats.invalid_numbers,
        invalid_dates = stats.invalid_dates,
        unmapped_values = stats.unmapped_values,
        "canonicalized dataset"
    );

    if records.is_empty() {
        return Err(DatasetError::EmptyDataset {
            domain: schema.domain,
        });
    }

    Ok(CanonicalSet {
        domain: schema.domain,
        records,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SCHEMA: DatasetSchema = DatasetSchema {
        domain: Domain::Academic,
        required: &["department", "marks"],
        numeric: &["marks", "cgpa"],
        flags: &["placement_status"],
        dates: &["exam_date"],
    };

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        let mut rec = RawRecord::new();
        for (k, v) in pairs {
            rec.insert(*k, *v);
        }
        rec
    }

    #[test]
    fn test_column_synonyms_applied_before_presence_check() {
        let raw = vec![record(&[(" Dept ", "CSE"), ("Score", "88")])];
        let set = canonicalize(&raw, &TEST_SCHEMA).unwrap();
        assert_eq!(set.records[0].text("department"), Some("CSE"));
        assert_eq!(set.records[0].number("marks"), Some(88.0));
    }

    #[test]
    fn test_missing_column_names_the_column() {
        let raw = vec![record(&[("marks", "88")])];
        let err = canonicalize(&raw, &TEST_SCHEMA).unwrap_err();
        assert_eq!(
            err,
            DatasetError::MissingColumns {
                domain: Domain::Academic,
                columns: "department".to_string(),
            }
        );
    }

    #[test]
    fn test_numeric_round_trip_and_exclusion_count() {
        let raw = vec![
            record(&[("department", "CSE"), ("marks", "86.5")]),
            record(&[("department", "ECE"), ("marks", "not-a-number")]),
        ];
        let set = canonicalize(&raw, &TEST_SCHEMA).unwrap();

        // Valid numeric strings round-trip to the same float.
        assert_eq!(set.records[0].number("marks"), Some(86.5));
        // The unparsable row is excluded and counted exactly once.
        assert_eq!(set.len(), 1);
        assert_eq!(set.stats.rows_dropped, 1);
        assert_eq!(set.stats.invalid_numbers, 1);
    }

    #[test]
    fn test_unmapped_flag_defaults_to_negative_class() {
        let raw = vec![record(&[
            ("department", "CSE"),
            ("marks", "70"),
            ("placement_status", "maybe"),
        ])];
        let set = canonicalize(&raw, &TEST_SCHEMA).unwrap();
        // Defaulted, counted, but never dropped.
        assert_eq!(set.records[0].number("placement_status"), Some(0.0));
        assert_eq!(set.stats.unmapped_values, 1);
        assert_eq!(set.stats.rows_dropped, 0);
    }

    #[test]
    fn test_flag_value_table() {
        for (raw, expected) in [("Yes", 1.0), ("NO", 0.0), ("Placed", 1.0), ("not placed", 0.0)] {
            assert_eq!(map_flag_value(raw), Some(expected));
        }
        assert_eq!(map_flag_value("perhaps"), None);
    }

    #[test]
    fn test_invalid_date_excluded_but_row_kept() {
        let raw = vec![record(&[
            ("department", "CSE"),
            ("marks", "70"),
            ("exam_date", "31-31-2023"),
        ])];
        let set = canonicalize(&raw, &TEST_SCHEMA).unwrap();
        assert_eq!(set.records[0].date("exam_date"), None);
        assert_eq!(set.stats.invalid_dates, 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 4, 15).unwrap();
        for raw in ["2023-04-15", "15-04-2023", "2023/04/15", "15/04/2023"] {
            assert_eq!(parse_date(raw), Some(expected), "failed for {raw}");
        }
    }

    #[test]
    fn test_empty_input_is_empty_dataset() {
        let err = canonicalize(&[], &TEST_SCHEMA).unwrap_err();
        assert_eq!(
            err,
            DatasetError::EmptyDataset {
                domain: Domain::Academic
            }
        );
    }

    #[test]
    fn test_coercion_is_deterministic() {
        let raw = vec![
            record(&[("Dept", "CSE"), ("marks", "91"), ("exam_date", "bad")]),
            record(&[("Dept", "ECE"), ("marks", "oops")]),
            record(&[("Dept", "EEE"), ("marks", "64.25")]),
        ];
        let first = canonicalize(&raw, &TEST_SCHEMA).unwrap();
        let second = canonicalize(&raw, &TEST_SCHEMA).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.stats, second.stats);
    }
}
