use crate::clock::{ttl_from_secs, Clock, SystemClock};
use crate::types::{AggregatorError, NewsItem, Result, SummaryMode, SummaryOutput, SummaryRequest};
use crate::utils::text;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use interfaces::BaselineDigest;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const NO_SUMMARY: &str = "No summary.";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

const PROMPT_ITEMS: usize = 10;
const BLURB_CHARS: usize = 300;
const FINGERPRINT_ITEMS: usize = 8;
const FINGERPRINT_TITLE_CHARS: usize = 80;

const GENERAL_INSTRUCTIONS: &str = "\
Return a concise investor-style summary **in Markdown only** with the sections:

### What's new
- 1-3 bullets on the most material developments.

### Key drivers & numbers
- 3-6 bullets (earnings/guidance, margins/FCF, M&A/regulatory, upgrades/downgrades).

### Risks / Watch items
- 2-4 bullets, only if present.

### Calendar
- Upcoming catalysts if present.

### Notable links
- 3-5 bullets as \"Title — Domain\" taken from the context only.

No preamble, no HTML, no invented data.";

const FINANCE_INSTRUCTIONS: &str = "\
Return a 220-280 word investor brief **in Markdown only** with exactly these sections:

### What's new
- 1-3 bullets on the most material developments.

### Key drivers & numbers
- 3-6 bullets (earnings/guidance, margins/FCF, upgrades/downgrades/price targets, M&A/regulatory/labor).

### Risks / Watch items
- 2-4 bullets if present.

### Calendar
- Upcoming catalysts if present.

### Notable links
- 3-5 bullets as \"Title — Domain\" taken strictly from the context.

Prioritize Reuters/Bloomberg/FT/WSJ/CNBC/MarketWatch and official filings. \
Ignore retail-advice/opinion/blog sources. No HTML, no invented numbers.";

/// Turns a query and its matched items into Markdown.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> String;

    async fn summarize(&self, request: &SummaryRequest) -> Result<String>;
}

/// Frequency-scored sentence extraction; needs no network.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSummarizer;

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn name(&self) -> String {
        "extractive".to_string()
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        Ok(BaselineDigest::compose(&request.items))
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    temperature: f32,
}

#[derive(Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Client for an OpenAI-compatible `/responses` endpoint. Single attempt,
/// no retry; callers fall back to extraction on error.
pub struct OpenAiSummarizer {
    client: Client,
    config: LlmConfig,
}

impl OpenAiSummarizer {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    fn name(&self) -> String {
        format!("openai ({})", self.config.model)
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let prompt = build_prompt(request);
        let body = ResponsesRequest {
            model: &self.config.model,
            input: &prompt,
            temperature: temperature(request.finance),
        };
        debug!("Requesting summary for {} from {}", request.query, self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AggregatorError::Llm(format!(
                "{} returned {}: {}",
                self.endpoint(),
                status,
                text::clip(&detail, 200)
            )));
        }

        let reply: ResponsesReply = response.json().await?;
        let summary = reply
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text")
            .map(|part| part.text)
            .collect::<String>();

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(AggregatorError::Llm("empty completion".to_string()));
        }
        Ok(summary.to_string())
    }
}

pub fn temperature(finance: bool) -> f32 {
    if finance {
        0.15
    } else {
        0.25
    }
}

fn context_lines(items: &[NewsItem]) -> String {
    items
        .iter()
        .take(PROMPT_ITEMS)
        .map(|item| {
            format!(
                "- {} — {} — {}",
                item.title,
                item.domain,
                text::clip(&item.summary, BLURB_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(request: &SummaryRequest) -> String {
    let (subject, instructions) = if request.finance {
        (
            format!("You are a sell-side equity analyst. Company/topic: {}", request.query),
            FINANCE_INSTRUCTIONS,
        )
    } else {
        (format!("Topic: {}", request.query), GENERAL_INSTRUCTIONS)
    };
    format!(
        "{}\n\nContext (Title — Domain — Blurb):\n{}\n\n{}",
        subject,
        context_lines(&request.items),
        instructions
    )
}

/// Cache key: mode, finance flag, query and the leading items. A changed
/// result set therefore misses even within the TTL.
pub fn summary_key(request: &SummaryRequest, mode: SummaryMode) -> String {
    let fingerprint = request
        .items
        .iter()
        .take(FINGERPRINT_ITEMS)
        .map(|item| format!("{}{}", text::clip(&item.title, FINGERPRINT_TITLE_CHARS), item.domain))
        .collect::<Vec<_>>()
        .join("|");
    format!(
        "{}:{}:{}|{}",
        mode.as_str(),
        if request.finance { "fin" } else { "gen" },
        request.query.trim().to_lowercase(),
        fingerprint
    )
}

#[derive(Debug, Clone)]
struct CachedSummary {
    text: String,
    used_llm: bool,
    created_at: DateTime<Utc>,
}

/// Picks a summarizer per request and remembers the result for a while.
pub struct SummaryService<C = SystemClock> {
    llm: Option<Arc<dyn Summarizer>>,
    fallback: ExtractiveSummarizer,
    clock: C,
    ttl: Duration,
    cache: RwLock<HashMap<String, CachedSummary>>,
}

impl SummaryService<SystemClock> {
    pub fn new(llm: Option<Arc<dyn Summarizer>>, ttl_seconds: u64) -> Self {
        Self::with_clock(llm, ttl_seconds, SystemClock)
    }
}

impl<C: Clock> SummaryService<C> {
    pub fn with_clock(llm: Option<Arc<dyn Summarizer>>, ttl_seconds: u64, clock: C) -> Self {
        Self {
            llm,
            fallback: ExtractiveSummarizer,
            clock,
            ttl: ttl_from_secs(ttl_seconds),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn summarize(&self, request: &SummaryRequest, mode: SummaryMode) -> SummaryOutput {
        if request.query.trim().is_empty() {
            return SummaryOutput {
                summary: NO_SUMMARY.to_string(),
                cached: true,
                used_llm: false,
            };
        }

        let key = summary_key(request, mode);
        if let Some(hit) = self.fresh(&key).await {
            debug!("Summary cache hit for {}", request.query);
            return SummaryOutput {
                summary: hit.text,
                cached: true,
                used_llm: hit.used_llm,
            };
        }

        let (text, used_llm) = self.generate(request, mode).await;
        let entry = CachedSummary {
            text: text.clone(),
            used_llm,
            created_at: self.clock.now(),
        };
        self.cache.write().await.insert(key, entry);

        SummaryOutput {
            summary: text,
            cached: false,
            used_llm,
        }
    }

    async fn fresh(&self, key: &str) -> Option<CachedSummary> {
        let cache = self.cache.read().await;
        let hit = cache.get(key)?;
        let age = self.clock.now().signed_duration_since(hit.created_at);
        (age < self.ttl).then(|| hit.clone())
    }

    async fn generate(&self, request: &SummaryRequest, mode: SummaryMode) -> (String, bool) {
        if let (SummaryMode::Llm, Some(llm)) = (mode, &self.llm) {
            match llm.summarize(request).await {
                Ok(text) => {
                    info!("Summarized {} with {}", request.query, llm.name());
                    return (text, true);
                }
                Err(e) => warn!("LLM summarization failed, using extraction: {}", e),
            }
        }

        match self.fallback.summarize(request).await {
            Ok(text) => (text, false),
            Err(e) => {
                warn!("Extractive summary failed: {}", e);
                (NO_SUMMARY.to_string(), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedLlm {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Summarizer for ScriptedLlm {
        fn name(&self) -> String {
            "scripted".to_string()
        }

        async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AggregatorError::Llm("boom".to_string()));
            }
            Ok(format!("### What's new\n- {}", request.query))
        }
    }

    fn request(query: &str, finance: bool) -> SummaryRequest {
        SummaryRequest {
            query: query.to_string(),
            items: vec![NewsItem {
                title: "Chipmaker beats estimates".to_string(),
                link: "https://www.reuters.com/chips".to_string(),
                published: None,
                source: "Reuters".to_string(),
                summary: "Revenue rose sharply. Guidance was raised.".to_string(),
                domain: "www.reuters.com".to_string(),
            }],
            finance,
        }
    }

    fn service(fail: bool) -> (SummaryService<Arc<ManualClock>>, Arc<ScriptedLlm>, Arc<ManualClock>) {
        let llm = Arc::new(ScriptedLlm {
            calls: AtomicUsize::new(0),
            fail,
        });
        let clock = Arc::new(ManualClock::default());
        let dyn_llm: Arc<dyn Summarizer> = llm.clone();
        (SummaryService::with_clock(Some(dyn_llm), 1800, clock.clone()), llm, clock)
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt(&request("nvidia", true));
        assert!(prompt.starts_with("You are a sell-side equity analyst. Company/topic: nvidia"));
        assert!(prompt.contains("- Chipmaker beats estimates — www.reuters.com — Revenue rose sharply."));
        assert!(prompt.contains("### Risks / Watch items"));

        let general = build_prompt(&request("chips", false));
        assert!(general.starts_with("Topic: chips"));
        assert_eq!(temperature(false), 0.25);
    }

    #[tokio::test]
    async fn test_llm_result_is_cached_until_ttl() {
        let (service, llm, clock) = service(false);
        let req = request("nvidia", true);

        let first = service.summarize(&req, SummaryMode::Llm).await;
        assert!(first.used_llm && !first.cached);

        let second = service.summarize(&req, SummaryMode::Llm).await;
        assert!(second.used_llm && second.cached);
        assert_eq!(second.summary, first.summary);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::seconds(1800));
        assert!(!service.summarize(&req, SummaryMode::Llm).await.cached);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_extractive_mode_skips_llm() {
        let (service, llm, _clock) = service(false);
        let out = service.summarize(&request("nvidia", false), SummaryMode::Extractive).await;
        assert!(!out.used_llm);
        assert!(out.summary.starts_with("### What's new"));
        assert!(out.summary.contains("[Chipmaker beats estimates](https://www.reuters.com/chips)"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back() {
        let (service, _llm, _clock) = service(true);
        let out = service.summarize(&request("nvidia", false), SummaryMode::Llm).await;
        assert!(!out.used_llm);
        assert!(out.summary.contains("### Notable links"));
    }

    #[tokio::test]
    async fn test_empty_query() {
        let service = SummaryService::new(None, 60);
        let out = service.summarize(&request("  ", false), SummaryMode::Llm).await;
        assert_eq!(out.summary, NO_SUMMARY);
        assert!(out.cached);
    }

    #[test]
    fn test_key_tracks_mode_and_items() {
        let req = request("NVIDIA ", true);
        let llm_key = summary_key(&req, SummaryMode::Llm);
        assert!(llm_key.starts_with("llm:fin:nvidia|Chipmaker"));
        assert_ne!(llm_key, summary_key(&req, SummaryMode::Extractive));

        let mut other = req.clone();
        other.items.clear();
        assert_ne!(llm_key, summary_key(&other, SummaryMode::Llm));
    }
}
