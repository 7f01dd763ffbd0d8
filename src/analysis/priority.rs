use crate::models::feedback::{Owner, RationaleEntry, Sentiment, DEFAULT_SOURCE};
use serde::Serialize;

/// Phrase weights in declaration order. Order drives rationale ordering.
pub const KEYWORD_WEIGHTS: &[(&str, i64)] = &[
    ("canceling", 5),
    ("cancel", 4),
    ("refund", 4),
    ("money back", 3),
    ("charged twice", 5),
    ("billing", 3),
    ("bug", 3),
    ("crash", 4),
    ("error", 2),
    ("broken", 3),
    ("failed", 2),
    ("not working", 3),
    ("immediately", 2),
    ("urgent", 3),
    ("critical", 4),
    ("unacceptable", 2),
    ("terrible", 2),
    ("slow", 2),
    ("confusing", 1),
    ("feature request", 1),
    ("suggestion", 1),
];

/// First rule with any matched keyword owns the item.
const OWNERSHIP_RULES: &[(&[&str], Owner)] = &[
    (
        &["bug", "error", "failed", "crash", "broken", "not working"],
        Owner::Engineering,
    ),
    (
        &["money back", "charged twice", "canceling", "cancel", "refund", "billing"],
        Owner::BillingFinance,
    ),
    (
        &["immediately", "urgent", "critical", "unacceptable", "terrible"],
        Owner::SupportTriage,
    ),
];

const BOOSTED_SOURCES: &[&str] = &["Zendesk", "Slack"];

// Multipliers in tenths so rounding stays in integer arithmetic.
const BOOSTED_MULTIPLIER_TENTHS: i64 = 12;
const BASE_MULTIPLIER_TENTHS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityAssessment {
    pub priority: i64,
    pub owner: Owner,
    pub rationale: Vec<RationaleEntry>,
    pub matched_keywords: Vec<&'static str>,
}

pub fn base_score(sentiment: Sentiment) -> i64 {
    match sentiment {
        Sentiment::Negative => 6,
        Sentiment::Neutral => 3,
        Sentiment::Positive => 1,
    }
}

pub fn source_multiplier_tenths(source: &str) -> i64 {
    if BOOSTED_SOURCES.contains(&source) {
        BOOSTED_MULTIPLIER_TENTHS
    } else {
        BASE_MULTIPLIER_TENTHS
    }
}

/// Scores one feedback text. Total over its inputs: empty text simply
/// matches nothing, and a blank source is scored as the placeholder source.
pub fn score_feedback(text: &str, sentiment: Sentiment, source: &str) -> PriorityAssessment {
    let source = if source.trim().is_empty() { DEFAULT_SOURCE } else { source };
    let lower = text.to_lowercase();

    let base = base_score(sentiment);
    let mut rationale = vec![RationaleEntry::points(
        format!("Base Score (Sentiment: {sentiment})"),
        base,
    )];

    let mut boost = 0;
    let mut matched_keywords = Vec::new();
    for &(phrase, weight) in KEYWORD_WEIGHTS {
        if lower.contains(phrase) {
            boost += weight;
            matched_keywords.push(phrase);
            rationale.push(RationaleEntry::points(
                format!("Keyword Match: \"{phrase}\""),
                weight,
            ));
        }
    }

    let tenths = source_multiplier_tenths(source);
    let priority = apply_multiplier(base + boost, tenths);
    rationale.push(RationaleEntry::text(
        format!("Source Multiplier ({source})"),
        format!("x{:.1}", tenths as f64 / 10.0),
    ));

    let owner = assign_owner(&matched_keywords);
    log::debug!(
        "scored feedback: priority={priority} owner={owner} matched={matched_keywords:?}"
    );

    PriorityAssessment {
        priority,
        owner,
        rationale,
        matched_keywords,
    }
}

/// `raw * tenths / 10`, rounded half-up.
fn apply_multiplier(raw: i64, tenths: i64) -> i64 {
    (raw * tenths + 5).div_euclid(10)
}

pub fn assign_owner(matched_keywords: &[&str]) -> Owner {
    OWNERSHIP_RULES
        .iter()
        .find(|(keywords, _)| matched_keywords.iter().any(|m| keywords.contains(m)))
        .map(|(_, owner)| *owner)
        .unwrap_or(Owner::ProductUx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::RationaleValue;

    #[test]
    fn crashing_urgent_zendesk_ticket_scores_sixteen() {
        let result = score_feedback(
            "The app keeps crashing, this is urgent!",
            Sentiment::Negative,
            "Zendesk",
        );

        assert_eq!(result.matched_keywords, vec!["crash", "urgent"]);
        assert_eq!(result.priority, 16);
        assert_eq!(result.owner, Owner::Engineering);
        assert_eq!(
            result.rationale,
            vec![
                RationaleEntry::points("Base Score (Sentiment: Negative)", 6),
                RationaleEntry::points("Keyword Match: \"crash\"", 4),
                RationaleEntry::points("Keyword Match: \"urgent\"", 3),
                RationaleEntry::text("Source Multiplier (Zendesk)", "x1.2"),
            ]
        );
    }

    #[test]
    fn rationale_length_is_base_plus_matches_plus_multiplier() {
        let inputs = [
            ("", Sentiment::Neutral, "Unknown"),
            ("slow and confusing, feature request", Sentiment::Positive, "Email"),
            ("refund now, charged twice, billing is broken", Sentiment::Negative, "Slack"),
        ];

        for (text, sentiment, source) in inputs {
            let result = score_feedback(text, sentiment, source);
            assert_eq!(result.rationale.len(), result.matched_keywords.len() + 2);
            assert!(result.rationale[0].label.starts_with("Base Score"));
            assert!(result.rationale.last().unwrap().label.starts_with("Source Multiplier"));
            assert!(result.priority >= 0);
        }
    }

    #[test]
    fn overlapping_phrases_both_count() {
        let result = score_feedback("I am canceling my plan", Sentiment::Neutral, "Email");

        assert_eq!(result.matched_keywords, vec!["canceling", "cancel"]);
        assert_eq!(result.priority, 3 + 5 + 4);
        assert_eq!(result.owner, Owner::BillingFinance);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let result = score_feedback("bug bug bug", Sentiment::Neutral, "Web");
        assert_eq!(result.matched_keywords, vec!["bug"]);
        assert_eq!(result.priority, 6);
    }

    #[test]
    fn source_match_is_case_sensitive() {
        let boosted = score_feedback("slow", Sentiment::Neutral, "Slack");
        let plain = score_feedback("slow", Sentiment::Neutral, "slack");

        assert_eq!(boosted.priority, 6); // 5 * 1.2
        assert_eq!(plain.priority, 5);
        assert_eq!(
            plain.rationale.last().unwrap().value,
            RationaleValue::Text("x1.0".to_string())
        );
    }

    #[test]
    fn blank_source_scores_as_unknown() {
        let result = score_feedback("hello", Sentiment::Positive, "");
        assert_eq!(result.rationale.last().unwrap().label, "Source Multiplier (Unknown)");
        assert_eq!(result.priority, 1);
    }

    #[test]
    fn owner_chain_prefers_billing_over_triage() {
        let result = score_feedback(
            "Unacceptable, I want my money back immediately",
            Sentiment::Negative,
            "Email",
        );
        assert_eq!(result.owner, Owner::BillingFinance);
    }

    #[test]
    fn owner_falls_back_to_product() {
        assert_eq!(assign_owner(&["slow", "confusing"]), Owner::ProductUx);
        assert_eq!(assign_owner(&[]), Owner::ProductUx);
        assert_eq!(assign_owner(&["critical"]), Owner::SupportTriage);
    }

    #[test]
    fn multiplier_rounds_to_nearest() {
        assert_eq!(apply_multiplier(13, 12), 16); // 15.6
        assert_eq!(apply_multiplier(7, 12), 8); // 8.4
        assert_eq!(apply_multiplier(9, 10), 9);
    }

    #[test]
    fn scoring_is_deterministic() {
        let text = "Billing page is slow and the export failed";
        let first = score_feedback(text, Sentiment::Negative, "Slack");
        let second = score_feedback(text, Sentiment::Negative, "Slack");
        assert_eq!(first, second);
    }
}
