use crate::models::feedback::{ParseSentimentError, Sentiment, AUTO_SENTIMENT};

const NEGATIVE_TRIGGERS: &[&str] = &["bug", "error", "crash", "terrible", "unacceptable"];
const POSITIVE_TRIGGERS: &[&str] = &["love", "great", "excellent"];

/// Checked in order; the first trigger set with a hit decides.
const SENTIMENT_CHAIN: &[(&[&str], Sentiment)] = &[
    (NEGATIVE_TRIGGERS, Sentiment::Negative),
    (POSITIVE_TRIGGERS, Sentiment::Positive),
];

/// Uses the supplied label unless it is absent or the `auto` sentinel.
pub fn resolve_sentiment(text: &str, supplied: Option<&str>) -> Result<Sentiment, ParseSentimentError> {
    match supplied.map(str::trim) {
        None | Some("") => Ok(infer_sentiment(text)),
        Some(label) if label.eq_ignore_ascii_case(AUTO_SENTIMENT) => Ok(infer_sentiment(text)),
        Some(label) => label.parse(),
    }
}

/// Keyword heuristic, no model behind it.
pub fn infer_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();

    SENTIMENT_CHAIN
        .iter()
        .find(|(triggers, _)| triggers.iter().any(|t| lower.contains(t)))
        .map(|(_, sentiment)| *sentiment)
        .unwrap_or(Sentiment::Neutral)
}
