use crate::focused::{SearchConfig, GOOGLE_NEWS_SEARCH, SEC_BROWSE_EDGAR};
use crate::summarizer::{LlmConfig, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL};
use crate::types::{FetchConfig, DEFAULT_USER_AGENT};
use clap::Parser;
use std::path::PathBuf;

/// Every setting can come from a flag or from the environment (or `.env`).
#[derive(Parser, Debug, Clone)]
#[command(about, version, author)]
pub struct Args {
    #[arg(long, env = "IP", default_value = "0.0.0.0")]
    pub ip: String,

    #[arg(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// tracing filter directive, e.g. `info` or `news_aggregator=debug`.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "CACHE_TTL_SECONDS", default_value = "3600")]
    pub cache_ttl_seconds: u64,

    #[arg(long, env = "MAX_ITEMS_PER_TOPIC", default_value = "10")]
    pub max_items_per_topic: usize,

    /// Per-request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "12")]
    pub request_timeout: u64,

    #[arg(long, env = "FETCH_MAX_RETRIES", default_value = "0")]
    pub fetch_max_retries: u32,

    #[arg(long, env = "FEED_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub feed_user_agent: String,

    /// JSON topic catalog replacing the built-in one.
    #[arg(long, env = "TOPICS_FILE")]
    pub topics_file: Option<PathBuf>,

    #[arg(long, env = "QUERY_DAYS", default_value = "7")]
    pub query_days: u32,

    #[arg(long, env = "MAX_QUERY_RESULTS", default_value = "25")]
    pub max_query_results: usize,

    #[arg(long, env = "FOCUSED_NEWS_TTL", default_value = "600")]
    pub focused_news_ttl: u64,

    #[arg(long, env = "SUMMARY_TTL", default_value = "1800")]
    pub summary_ttl: u64,

    /// Enables LLM summaries when set.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    pub llm_model: String,

    #[arg(long, env = "LLM_BASE_URL", default_value = DEFAULT_LLM_BASE_URL)]
    pub llm_base_url: String,

    #[arg(long, env = "SEC_USER_AGENT", default_value = "NewsAggregator/1.0 (contact@example.com)")]
    pub sec_user_agent: String,

    #[arg(long, env = "NEWS_SEARCH_URL", default_value = GOOGLE_NEWS_SEARCH, hide = true)]
    pub news_search_url: String,

    #[arg(long, env = "SEC_EDGAR_URL", default_value = SEC_BROWSE_EDGAR, hide = true)]
    pub sec_edgar_url: String,
}

impl Args {
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.feed_user_agent.clone(),
            timeout_seconds: self.request_timeout,
            max_retries: self.fetch_max_retries,
            ..FetchConfig::default()
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            news_base_url: self.news_search_url.clone(),
            sec_base_url: self.sec_edgar_url.clone(),
            days: self.query_days,
            max_results: self.max_query_results,
            sec_user_agent: self.sec_user_agent.clone(),
        }
    }

    /// `None` when no API key is configured (or it is blank).
    pub fn llm_config(&self) -> Option<LlmConfig> {
        let api_key = self.openai_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        Some(LlmConfig {
            api_key: api_key.to_string(),
            model: self.llm_model.clone(),
            base_url: self.llm_base_url.clone(),
            timeout_seconds: self.request_timeout.max(30),
        })
    }
}
