use serde::{Deserialize, Serialize};

use crate::types::JobRecord;

/// Weighted keyword rules. Each entry is a (keyword, weight) pair; `plus`
/// keywords add their weight when present in a record's text, `minus`
/// keywords subtract theirs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRules {
    #[serde(default)]
    pub plus: Vec<(String, i64)>,
    #[serde(default)]
    pub minus: Vec<(String, i64)>,
}

/// Lowercase text blob a record is scored and filtered against: title,
/// company, location, tags and description joined by single spaces.
pub fn text_blob(record: &JobRecord) -> String {
    [
        record.title.as_str(),
        record.company.as_str(),
        record.location.as_str(),
        record.tags.as_str(),
        record.description.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

/// Evaluate the rule set against a record. Matching is case-insensitive
/// substring presence: a keyword appearing several times still contributes
/// its weight once. No rule set scores 0. Pure, safe to call repeatedly.
pub fn score_record(record: &JobRecord, rules: Option<&ScoreRules>) -> i64 {
    let Some(rules) = rules else {
        return 0;
    };
    let text = text_blob(record);
    let mut score = 0;
    for (term, weight) in &rules.plus {
        if text.contains(&term.to_lowercase()) {
            score += weight;
        }
    }
    for (term, weight) in &rules.minus {
        if text.contains(&term.to_lowercase()) {
            score -= weight;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScoreRules {
        ScoreRules {
            plus: vec![("wcag".into(), 3), ("figma".into(), 2)],
            minus: vec![("senior".into(), 4)],
        }
    }

    fn record(title: &str, description: &str) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            description: description.to_string(),
            ..JobRecord::default()
        }
    }

    #[test]
    fn plus_and_minus_weights_sum() {
        let r = record("Product Designer", "Figma, WCAG required");
        assert_eq!(score_record(&r, Some(&rules())), 5);
    }

    #[test]
    fn minus_rules_go_negative() {
        let r = record("Senior UX", "");
        assert_eq!(score_record(&r, Some(&rules())), -4);
    }

    #[test]
    fn no_rules_scores_zero() {
        let r = record("Anything", "at all");
        assert_eq!(score_record(&r, None), 0);
        assert_eq!(score_record(&r, Some(&ScoreRules::default())), 0);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let r = record("figma figma figma", "figma");
        let rules = ScoreRules {
            plus: vec![("figma".into(), 2)],
            minus: vec![],
        };
        assert_eq!(score_record(&r, Some(&rules)), 2);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let r = record("FIGMA expert", "");
        let rules = ScoreRules {
            plus: vec![("Figma".into(), 2)],
            minus: vec![],
        };
        assert_eq!(score_record(&r, Some(&rules)), 2);
    }

    #[test]
    fn blob_spans_all_text_fields() {
        let r = JobRecord {
            company: "Figma Inc".to_string(),
            ..JobRecord::default()
        };
        let rules = ScoreRules {
            plus: vec![("figma".into(), 1)],
            minus: vec![],
        };
        assert_eq!(score_record(&r, Some(&rules)), 1);
    }
}
