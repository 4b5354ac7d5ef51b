//! Question classification: entity, intent, and top-N extraction.
//!
//! Matching is deliberately shallow keyword work over precomputed
//! aggregates; there is no language model anywhere in this path.

/// The metric-lookup paths a question can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    PlacementRate,
    AveragePackage,
    TopCompanies,
    TopSkills,
    AverageMarks,
    TopSubjects,
    AverageRating,
    TopFaculty,
    TopCourses,
}

/// One keyword pattern bound to a metric path.
///
/// A pattern matches when the lowercased question contains any phrase in
/// `any`, and (when `requires` is non-empty) also contains one of those
/// context phrases.
pub struct IntentPattern {
    pub kind: IntentKind,
    pub any: &'static [&'static str],
    pub requires: &'static [&'static str],
}

/// Ordered pattern list; the first match decides the intent.
///
/// Overlaps between patterns are resolved purely by this priority order.
pub const INTENT_PATTERNS: &[IntentPattern] = &[
    IntentPattern {
        kind: IntentKind::PlacementRate,
        any: &["placement rate", "placement percentage", "placed percentage"],
        requires: &[],
    },
    IntentPattern {
        kind: IntentKind::AveragePackage,
        any: &[
            "average package",
            "avg package",
            "average salary",
            "avg salary",
            "average ctc",
        ],
        requires: &[],
    },
    IntentPattern {
        kind: IntentKind::TopCompanies,
        any: &["top companies", "top company", "recruiters", "companies hiring"],
        requires: &[],
    },
    IntentPattern {
        kind: IntentKind::TopSkills,
        any: &["top skills", "top skill", "demand skills", "skills in demand"],
        requires: &[],
    },
    IntentPattern {
        kind: IntentKind::AverageMarks,
        any: &["average mark", "avg mark", "mean mark", "average score"],
        requires: &[],
    },
    IntentPattern {
        kind: IntentKind::TopSubjects,
        any: &["top subject"],
        requires: &[],
    },
    IntentPattern {
        kind: IntentKind::AverageRating,
        any: &["average rating", "avg rating", "mean rating"],
        requires: &["faculty", "teaching", "teacher", "evaluation"],
    },
    IntentPattern {
        kind: IntentKind::TopFaculty,
        any: &["top faculty", "top rated faculty", "top-rated faculty", "best faculty"],
        requires: &[],
    },
    IntentPattern {
        kind: IntentKind::TopCourses,
        any: &["top course", "top rated course", "top-rated course", "best course"],
        requires: &[],
    },
];

/// A resolved question: lives only for one answering call.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    pub entity: Option<String>,
    pub kind: IntentKind,
    pub top_n: Option<usize>,
}

/// Classify a question against the ordered pattern list.
///
/// Digits are stripped before matching so an embedded count never breaks
/// a phrase ("top 3 companies" still matches "top companies").
pub fn classify(question: &str) -> Option<IntentKind> {
    let lowered = question
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    for pattern in INTENT_PATTERNS {
        let hit = pattern.any.iter().any(|phrase| lowered.contains(phrase));
        if !hit {
            continue;
        }
        if pattern.requires.is_empty()
            || pattern.requires.iter().any(|phrase| lowered.contains(phrase))
        {
            return Some(pattern.kind);
        }
    }
    None
}

/// Whole-token containment: the needle must not be glued to adjacent
/// alphanumeric characters, so "CS" never matches inside "CSE".
fn contains_token(haystack: &str, needle: &str) -> bool {
    for (start, matched) in haystack.match_indices(needle) {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        let after_ok = haystack[start + matched.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

/// Pick the department token the question refers to, if any.
///
/// Candidates are scanned longest-first so a more specific code wins over
/// a shorter one it contains; the match is case-insensitive and
/// whole-token. The first hit wins.
pub fn extract_entity(question: &str, candidates: &[String]) -> Option<String> {
    let upper_question = question.to_uppercase();

    let mut ordered: Vec<&String> = candidates.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    ordered
        .into_iter()
        .find(|candidate| contains_token(&upper_question, &candidate.to_uppercase()))
        .cloned()
}

/// Extract an explicit "top N" count: a numeric token adjacent to the
/// word "top" ("top 3 companies", "top5 skills").
pub fn extract_top_n(question: &str) -> Option<usize> {
    let lowered = question.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .collect();

    for (idx, token) in tokens.iter().enumerate() {
        if *token == "top" {
            if let Some(n) = tokens.get(idx + 1).and_then(|t| t.parse::<usize>().ok()) {
                if n > 0 {
                    return Some(n);
                }
            }
        } else if let Some(rest) = token.strip_prefix("top") {
            if let Ok(n) = rest.parse::<usize>() {
                if n > 0 {
                    return Some(n);
                }
            }
        }
    }
    None
}

/// Resolve a question into an intent, or `None` when no pattern matches.
pub fn resolve(question: &str, departments: &[String]) -> Option<QueryIntent> {
    let kind = classify(question)?;
    Some(QueryIntent {
        entity: extract_entity(question, departments),
        kind,
        top_n: extract_top_n(question),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(
            classify("what is the placement rate for CSE"),
            Some(IntentKind::PlacementRate)
        );
        assert_eq!(
            classify("show top companies this year"),
            Some(IntentKind::TopCompanies)
        );
        assert_eq!(classify("average mark overall"), Some(IntentKind::AverageMarks));
        assert_eq!(classify("what is the weather today"), None);
    }

    #[test]
    fn test_classify_ignores_embedded_counts() {
        assert_eq!(classify("show top 2 companies"), Some(IntentKind::TopCompanies));
        assert_eq!(classify("top5 skills"), Some(IntentKind::TopSkills));
        assert_eq!(classify("top 10 subjects"), Some(IntentKind::TopSubjects));
    }

    #[test]
    fn test_average_rating_needs_context() {
        assert_eq!(classify("average rating of the canteen"), None);
        assert_eq!(
            classify("average rating of faculty in CSE"),
            Some(IntentKind::AverageRating)
        );
        assert_eq!(
            classify("avg rating for teaching quality"),
            Some(IntentKind::AverageRating)
        );
    }

    #[test]
    fn test_entity_prefers_longer_token() {
        let departments = vec!["CS".to_string(), "CSE".to_string()];
        assert_eq!(
            extract_entity("average package for CSE", &departments),
            Some("CSE".to_string())
        );
        assert_eq!(
            extract_entity("average package for CS", &departments),
            Some("CS".to_string())
        );
    }

    #[test]
    fn test_entity_is_whole_token() {
        let departments = vec!["CS".to_string()];
        // "CS" embedded in another word never matches.
        assert_eq!(extract_entity("show me the cse numbers", &departments), None);
        assert_eq!(
            extract_entity("numbers for cs please", &departments),
            Some("CS".to_string())
        );
    }

    #[test]
    fn test_top_n_extraction() {
        assert_eq!(extract_top_n("top 3 companies"), Some(3));
        assert_eq!(extract_top_n("top5 skills"), Some(5));
        assert_eq!(extract_top_n("top companies"), None);
        assert_eq!(extract_top_n("top 0 companies"), None);
    }

    #[test]
    fn test_resolve_fills_all_slots() {
        let departments = vec!["CSE".to_string(), "ECE".to_string()];
        let intent = resolve("top 2 companies recruiting from ECE", &departments).unwrap();
        assert_eq!(intent.kind, IntentKind::TopCompanies);
        assert_eq!(intent.entity, Some("ECE".to_string()));
        assert_eq!(intent.top_n, Some(2));
    }
}
