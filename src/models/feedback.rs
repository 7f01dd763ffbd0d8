use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_SOURCE: &str = "Unknown";
pub const DEFAULT_STATUS: &str = "NEW";
pub const AUTO_SENTIMENT: &str = "auto";

/// Placeholder written to both `urgency` and `impact` until they are derived.
pub const RESERVED_SIGNAL: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sentiment: {0}")]
pub struct ParseSentimentError(pub String);

impl FromStr for Sentiment {
    type Err = ParseSentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(ParseSentimentError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Engineering,
    #[serde(rename = "Billing/Finance")]
    BillingFinance,
    #[serde(rename = "Support/Triage")]
    SupportTriage,
    #[serde(rename = "Product/UX")]
    ProductUx,
}

impl Owner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Owner::Engineering => "Engineering",
            Owner::BillingFinance => "Billing/Finance",
            Owner::SupportTriage => "Support/Triage",
            Owner::ProductUx => "Product/UX",
        }
    }

    /// Stored labels outside the known set fall back to the default team.
    pub fn from_label(label: &str) -> Owner {
        match label {
            "Engineering" => Owner::Engineering,
            "Billing/Finance" => Owner::BillingFinance,
            "Support/Triage" => Owner::SupportTriage,
            _ => Owner::ProductUx,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RationaleValue {
    Points(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleEntry {
    pub label: String,
    pub value: RationaleValue,
}

impl RationaleEntry {
    pub fn points(label: impl Into<String>, points: i64) -> Self {
        Self {
            label: label.into(),
            value: RationaleValue::Points(points),
        }
    }

    pub fn text(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: RationaleValue::Text(text.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub source: String,
    pub sentiment: Sentiment,
    pub urgency: i64,
    pub impact: i64,
    pub priority: i64,
    pub owner: Owner,
    pub rationale: Vec<RationaleEntry>,
    pub status: String,
    pub created_at: i64, // epoch millis, UTC
}

/// A fully resolved record ready for insertion; the store assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub title: String,
    pub text: String,
    pub source: String,
    pub sentiment: Sentiment,
    pub priority: i64,
    pub owner: Owner,
    pub rationale: Vec<RationaleEntry>,
    pub status: String,
}

/// Replaces an absent or blank value with `default`.
pub fn or_placeholder(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
