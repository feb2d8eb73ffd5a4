use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single normalized article extracted from a feed.
///
/// `link` is the identity of an item: two items with the same link are the
/// same article, whatever their titles say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub source: String,
    /// Plain-text blurb, HTML already stripped.
    #[serde(default)]
    pub summary: String,
    /// Lowercased host of `link`.
    #[serde(default)]
    pub domain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Llm,
    Extractive,
}

impl SummaryMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "llm" => Some(SummaryMode::Llm),
            "extractive" => Some(SummaryMode::Extractive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMode::Llm => "llm",
            SummaryMode::Extractive => "extractive",
        }
    }
}

/// What a summarizer gets to look at.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub query: String,
    pub items: Vec<NewsItem>,
    pub finance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub summary: String,
    pub cached: bool,
    pub used_llm: bool,
}

// Object style note:
// Summarizers are expected to be stateless over a request. Anything that
// needs remembering between calls (cached summaries, cached feeds) lives in
// the aggregator crate, keyed by the request.
