use crate::aggregator::{dedupe_by_link, sort_newest_first, FeedSource};
use crate::cache::TopicCache;
use crate::clock::{Clock, SystemClock};
use crate::fetcher::Fetcher;
use crate::finance::{self, Company};
use crate::parser::FeedParser;
use crate::types::{AggregatorError, NewsItem, Result, DEFAULT_USER_AGENT};
use crate::utils::{text, url};
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub const GOOGLE_NEWS_SEARCH: &str = "https://news.google.com/rss/search";
pub const SEC_BROWSE_EDGAR: &str = "https://www.sec.gov/cgi-bin/browse-edgar";

const GOOGLE_NEWS_HOST: &str = "news.google.com";
const SEC_LABEL: &str = "SEC EDGAR";
const SEC_UNTITLED: &str = "SEC filing";
const SEC_MAX_FILINGS: usize = 25;

/// Finance results narrower than these widen to the next tier.
const FINANCE_TIER_MIN: usize = 6;
const WIDE_TIER_MIN: usize = 3;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub news_base_url: String,
    pub sec_base_url: String,
    /// How far back the news search looks.
    pub days: u32,
    pub max_results: usize,
    /// EDGAR rejects anonymous agents; this one should carry a contact address.
    pub sec_user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            news_base_url: GOOGLE_NEWS_SEARCH.to_string(),
            sec_base_url: SEC_BROWSE_EDGAR.to_string(),
            days: 7,
            max_results: 25,
            sec_user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Finance,
    General,
}

impl SearchMode {
    pub fn from_flag(finance: bool) -> Self {
        if finance {
            SearchMode::Finance
        } else {
            SearchMode::General
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            SearchMode::Finance => "fin",
            SearchMode::General => "gen",
        }
    }

    /// Cache key, e.g. `fin:nvidia`.
    pub fn key(self, query: &str) -> String {
        format!("{}:{}", self.prefix(), query)
    }

    pub fn parse_key(key: &str) -> Option<(SearchMode, &str)> {
        let (prefix, query) = key.split_once(':')?;
        let mode = match prefix {
            "fin" => SearchMode::Finance,
            "gen" => SearchMode::General,
            _ => return None,
        };
        Some((mode, query))
    }
}

/// Lowercased, whitespace collapsed.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn google_news_url(base: &str, query: &str, days: u32) -> String {
    let encoded: String = ::url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("{}?q={}+when:{}d&hl=en-US&gl=US&ceid=US:en", base, encoded, days)
}

/// Aggregator entries often link back to the aggregator; the publisher's
/// own URL is usually among the summary's anchors.
pub fn publisher_link(raw_summary: &str) -> Option<String> {
    text::hrefs(raw_summary)
        .into_iter()
        .find(|href| !href.is_empty() && !href.contains(GOOGLE_NEWS_HOST))
}

fn retain_where(items: &[NewsItem], keep: impl Fn(&str) -> bool) -> Vec<NewsItem> {
    items.iter().filter(|i| keep(&i.domain)).cloned().collect()
}

/// General mode keeps trusted and finance outlets. Finance mode starts at
/// finance outlets and widens until the result is usable, never admitting
/// opinion sites.
pub fn filter_by_domain(items: &[NewsItem], mode: SearchMode) -> Vec<NewsItem> {
    match mode {
        SearchMode::General => {
            retain_where(items, |d| finance::is_trusted_domain(d) || finance::is_finance_domain(d))
        }
        SearchMode::Finance => {
            let chosen = retain_where(items, |d| {
                finance::is_finance_domain(d) && !finance::is_opinion_domain(d)
            });
            if chosen.len() >= FINANCE_TIER_MIN {
                return chosen;
            }
            let chosen = retain_where(items, |d| {
                (finance::is_finance_domain(d) || finance::is_trusted_domain(d))
                    && !finance::is_opinion_domain(d)
            });
            if chosen.len() >= WIDE_TIER_MIN {
                return chosen;
            }
            retain_where(items, |d| !finance::is_opinion_domain(d))
        }
    }
}

/// Keyword search over a news search feed, plus EDGAR filings for known
/// companies in finance mode. Keys are `fin:<query>` or `gen:<query>`.
#[derive(Clone)]
pub struct QuerySource {
    fetcher: Fetcher,
    config: SearchConfig,
}

impl QuerySource {
    pub fn new(fetcher: Fetcher, config: SearchConfig) -> Self {
        Self { fetcher, config }
    }

    pub async fn search(&self, query: &str, mode: SearchMode) -> Result<Vec<NewsItem>> {
        let company = match mode {
            SearchMode::Finance => finance::lookup_company(query),
            SearchMode::General => None,
        };
        let search_terms = match mode {
            SearchMode::Finance => finance::finance_query(query),
            SearchMode::General => query.to_string(),
        };

        let (news, filings) = tokio::join!(self.news(&search_terms), self.filings(company));
        let news = news?;
        let filings = filings.unwrap_or_else(|e| {
            warn!("EDGAR filings unavailable for {}: {}", query, e);
            Vec::new()
        });
        let raw = news.len() + filings.len();

        let merged = dedupe_by_link(news.into_iter().chain(filings));
        let mut chosen = filter_by_domain(&merged, mode);
        sort_newest_first(&mut chosen);
        chosen.truncate(self.config.max_results);

        info!("Search {:?} {}: {} items (raw={})", mode, query, chosen.len(), raw);
        Ok(chosen)
    }

    async fn news(&self, search_terms: &str) -> Result<Vec<NewsItem>> {
        let feed_url = google_news_url(&self.config.news_base_url, search_terms, self.config.days);
        let body = self.fetcher.fetch_feed(&feed_url).await?;
        let parsed = FeedParser::parse_feed(&body)?;

        let items = parsed
            .entries
            .into_iter()
            .take(self.config.max_results)
            .filter_map(|mut entry| {
                if let Some(link) = entry.raw_summary.as_deref().and_then(publisher_link) {
                    entry.link = Some(link);
                }
                let label = entry.link.as_deref().map(url::domain_of).unwrap_or_default();
                entry.into_news_item(&label)
            })
            .collect();
        Ok(items)
    }

    async fn filings(&self, company: Option<Company>) -> Result<Vec<NewsItem>> {
        let Some(company) = company else {
            return Ok(Vec::new());
        };
        let feed_url = finance::sec_atom_url(&self.config.sec_base_url, company.cik);
        let body = self
            .fetcher
            .fetch_feed_as(&feed_url, Some(&self.config.sec_user_agent))
            .await?;
        let parsed = FeedParser::parse_feed(&body)?;
        debug!("EDGAR returned {} filings for {}", parsed.entries.len(), company.ticker);

        let items = parsed
            .entries
            .into_iter()
            .take(SEC_MAX_FILINGS)
            .filter_map(|mut entry| {
                entry.title.get_or_insert_with(|| SEC_UNTITLED.to_string());
                entry.into_news_item(SEC_LABEL)
            })
            .collect();
        Ok(items)
    }
}

#[async_trait]
impl FeedSource for QuerySource {
    async fn fetch(&self, key: &str) -> Result<Vec<NewsItem>> {
        let (mode, query) = SearchMode::parse_key(key)
            .ok_or_else(|| AggregatorError::General(format!("Malformed search key: {}", key)))?;
        self.search(query, mode).await
    }
}

/// Cached focused search. A finance search with no results falls back to
/// the general one.
pub struct FocusedSearch<C = SystemClock> {
    cache: TopicCache<QuerySource, C>,
}

impl FocusedSearch<SystemClock> {
    pub fn new(source: QuerySource, ttl_seconds: u64) -> Self {
        Self {
            cache: TopicCache::new(source, ttl_seconds),
        }
    }
}

impl<C: Clock> FocusedSearch<C> {
    pub fn with_clock(source: QuerySource, ttl_seconds: u64, clock: C) -> Self {
        Self {
            cache: TopicCache::with_clock(source, ttl_seconds, clock),
        }
    }

    pub async fn search(&self, query: &str, finance: bool) -> Vec<NewsItem> {
        let query = normalize_query(query);
        if query.is_empty() {
            return Vec::new();
        }

        if finance {
            let items = self.cache.get(&SearchMode::Finance.key(&query)).await;
            if !items.is_empty() {
                return items;
            }
            debug!("No finance results for {}, trying general search", query);
        }
        self.cache.get(&SearchMode::General.key(&query)).await
    }
}
