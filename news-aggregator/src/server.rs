use crate::aggregator::TopicFetcher;
use crate::cache::TopicCache;
use crate::catalog::TopicCatalog;
use crate::config::Args;
use crate::fetcher::Fetcher;
use crate::focused::{FocusedSearch, QuerySource};
use crate::summarizer::{OpenAiSummarizer, SummaryService, Summarizer, NO_SUMMARY};
use crate::types::{NewsItem, Result, SummaryMode, SummaryOutput, SummaryRequest};
use crate::utils::human_time;
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Results shown for a single search.
pub const SEARCH_PAGE_SIZE: usize = 12;

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub catalog: Arc<TopicCatalog>,
    pub topics: TopicCache<TopicFetcher>,
    pub search: FocusedSearch,
    pub summaries: SummaryService,
}

impl AppState {
    pub fn new(catalog: Arc<TopicCatalog>, args: &Args) -> Result<Self> {
        let fetcher = Fetcher::new(args.fetch_config())?;

        let topic_fetcher = TopicFetcher::new(fetcher.clone(), catalog.clone(), args.max_items_per_topic);
        let topics = TopicCache::new(topic_fetcher, args.cache_ttl_seconds);

        let search = FocusedSearch::new(
            QuerySource::new(fetcher, args.search_config()),
            args.focused_news_ttl,
        );

        let llm = match args.llm_config() {
            Some(config) => {
                let summarizer: Arc<dyn Summarizer> = Arc::new(OpenAiSummarizer::new(config)?);
                info!("LLM summaries enabled ({})", summarizer.name());
                Some(summarizer)
            }
            None => {
                info!("No OPENAI_API_KEY, summaries are extractive only");
                None
            }
        };
        let summaries = SummaryService::new(llm, args.summary_ttl);

        Ok(Self {
            catalog,
            topics,
            search,
            summaries,
        })
    }
}

/// A news item as the API shows it.
#[derive(Debug, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: NewsItem,
    pub age: String,
}

impl ItemView {
    fn from_items(items: Vec<NewsItem>, now: DateTime<Utc>) -> Vec<Self> {
        items
            .into_iter()
            .map(|item| ItemView {
                age: human_time(item.published, now),
                item,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct TopicsQuery {
    pub topics: Option<String>,
}

impl TopicsQuery {
    fn requested(&self) -> Vec<&str> {
        self.topics
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub finance: Option<String>,
    pub mode: Option<String>,
}

impl SearchQuery {
    /// Finance filtering is on unless explicitly turned off.
    fn finance(&self) -> bool {
        match self.finance.as_deref() {
            None => true,
            Some(flag) => matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        }
    }

    fn mode(&self) -> SummaryMode {
        self.mode
            .as_deref()
            .and_then(SummaryMode::parse)
            .unwrap_or(SummaryMode::Extractive)
    }
}

#[derive(Serialize)]
struct TopicsResponse {
    topics: Vec<String>,
    defaults: Vec<String>,
}

#[derive(Serialize)]
struct ArticlesResponse {
    topics: Vec<String>,
    articles: BTreeMap<String, Vec<ItemView>>,
    generated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct RefreshResponse {
    status: &'static str,
    refreshed: Vec<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    finance: bool,
    items: Vec<ItemView>,
}

#[get("/api/topics")]
async fn list_topics(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(TopicsResponse {
        topics: state.catalog.topics(),
        defaults: state.catalog.defaults(),
    })
}

#[get("/api/articles")]
async fn articles(query: web::Query<TopicsQuery>, state: web::Data<AppState>) -> impl Responder {
    let selected = state.catalog.select(&query.requested());
    let loaded = state.topics.ensure_fresh(&selected, false).await;

    let now = Utc::now();
    let articles = loaded
        .into_iter()
        .map(|(topic, items)| (topic, ItemView::from_items(items, now)))
        .collect();

    HttpResponse::Ok().json(ArticlesResponse {
        topics: selected,
        articles,
        generated_at: now,
    })
}

#[post("/refresh")]
async fn refresh(query: web::Query<TopicsQuery>, state: web::Data<AppState>) -> impl Responder {
    let selected = state.catalog.select(&query.requested());
    info!("Forced refresh of {:?}", selected);
    state.topics.ensure_fresh(&selected, true).await;

    HttpResponse::Ok().json(RefreshResponse {
        status: "ok",
        refreshed: selected,
    })
}

#[get("/api/search")]
async fn search_news(query: web::Query<SearchQuery>, state: web::Data<AppState>) -> impl Responder {
    let finance = query.finance();
    let mut items = state.search.search(&query.q, finance).await;
    items.truncate(SEARCH_PAGE_SIZE);

    HttpResponse::Ok().json(SearchResponse {
        query: query.q.trim().to_string(),
        finance,
        items: ItemView::from_items(items, Utc::now()),
    })
}

#[get("/api/summarize")]
async fn summarize(query: web::Query<SearchQuery>, state: web::Data<AppState>) -> impl Responder {
    let q = query.q.trim();
    if q.is_empty() {
        return HttpResponse::Ok().json(SummaryOutput {
            summary: NO_SUMMARY.to_string(),
            cached: true,
            used_llm: false,
        });
    }

    let finance = query.finance();
    let request = SummaryRequest {
        query: q.to_string(),
        items: state.search.search(q, finance).await,
        finance,
    };
    let output = state.summaries.summarize(&request, query.mode()).await;
    HttpResponse::Ok().json(output)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_topics)
        .service(articles)
        .service(refresh)
        .service(search_news)
        .service(summarize);
}
