use crate::types::{Result, SourceSpec};
use crate::utils::url::is_valid_feed_url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Topics shown when the caller selects nothing valid.
pub const DEFAULT_TOPICS: &[&str] = &["politics", "markets", "finance", "sports", "entertainment", "tech"];

const BUILTIN_FEEDS: &[(&str, &[&str])] = &[
    (
        "politics",
        &[
            "https://feeds.bbci.co.uk/news/politics/rss.xml",
            "https://feeds.reuters.com/reuters/politicsNews",
            "https://www.politico.com/rss/politics08.xml",
            "https://apnews.com/hub/politics?utm_source=apnews.com&utm_medium=referral&utm_campaign=rss&output=atom",
            "https://feeds.bloomberg.com/politics/news.rss",
        ],
    ),
    (
        "markets",
        &[
            "https://feeds.reuters.com/reuters/marketsNews",
            "https://feeds.bbci.co.uk/news/business/rss.xml",
            "https://www.cnbc.com/id/100003114/device/rss/rss.html",
            "https://feeds.bloomberg.com/markets/news.rss",
        ],
    ),
    (
        "finance",
        &[
            "https://feeds.reuters.com/reuters/businessNews",
            "https://www.investopedia.com/feedbuilder/feedbuilder.ashx?type=most-read",
            "https://www.marketwatch.com/rss/topstories",
            "https://finance.yahoo.com/news/rssindex",
        ],
    ),
    (
        "sports",
        &[
            "https://www.espn.com/espn/rss/news",
            "https://feeds.bbci.co.uk/sport/rss.xml",
            "https://apnews.com/hub/apf-sports?utm_source=apnews.com&utm_medium=referral&utm_campaign=rss&output=atom",
        ],
    ),
    (
        "entertainment",
        &[
            "https://feeds.bbci.co.uk/news/entertainment_and_arts/rss.xml",
            "https://variety.com/feed/",
            "https://www.hollywoodreporter.com/feed/",
        ],
    ),
    (
        "tech",
        &[
            "https://feeds.arstechnica.com/arstechnica/technology-lab",
            "https://www.theverge.com/rss/index.xml",
            "https://feeds.bbci.co.uk/news/technology/rss.xml",
            "https://www.ft.com/technology?format=rss",
            "https://techcrunch.com/feed/",
            "https://www.theguardian.com/us/technology/rss",
            "https://feeds.a.dj.com/rss/RSSWSJD.xml",
            "https://feeds.bloomberg.com/technology/news.rss",
        ],
    ),
];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSource {
    Url(String),
    Spec(SourceSpec),
}

/// Topic name -> feed sources. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct TopicCatalog {
    topics: BTreeMap<String, Vec<SourceSpec>>,
    defaults: Vec<String>,
}

impl TopicCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (topic, urls) in BUILTIN_FEEDS {
            catalog.insert(*topic, urls.iter().map(|u| SourceSpec::new(*u)).collect());
        }
        catalog.defaults = DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect();
        catalog
    }

    /// Load `{ "topic": ["url", {"url": "...", "label": "..."}] }`.
    /// Every topic in the file becomes a default topic.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&contents)?;
        info!("Loaded {} topics from {}", catalog.topics.len(), path.display());
        Ok(catalog)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<RawSource>> = serde_json::from_str(contents)?;
        let mut catalog = Self::new();
        for (topic, sources) in raw {
            let specs = sources
                .into_iter()
                .map(|s| match s {
                    RawSource::Url(url) => SourceSpec::new(url),
                    RawSource::Spec(spec) => spec,
                })
                .collect();
            catalog.defaults.push(topic.clone());
            catalog.insert(topic, specs);
        }
        Ok(catalog)
    }

    /// Adds or replaces a topic. Invalid and repeated URLs are dropped.
    pub fn insert(&mut self, topic: impl Into<String>, sources: Vec<SourceSpec>) {
        let topic = topic.into();
        let mut kept: Vec<SourceSpec> = Vec::with_capacity(sources.len());
        for source in sources {
            if !is_valid_feed_url(&source.url) {
                warn!("Ignoring invalid feed URL for {}: {}", topic, source.url);
                continue;
            }
            if kept.iter().any(|k| k.url == source.url) {
                continue;
            }
            kept.push(source);
        }
        self.topics.insert(topic, kept);
    }

    pub fn sources(&self, topic: &str) -> Option<&[SourceSpec]> {
        self.topics.get(topic).map(|s| s.as_slice())
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.keys().cloned().collect()
    }

    pub fn defaults(&self) -> Vec<String> {
        self.defaults
            .iter()
            .filter(|t| self.contains(t))
            .cloned()
            .collect()
    }

    /// Keeps the requested topics we know about, in request order and
    /// without repeats; falls back to the defaults when none survive.
    pub fn select<S: AsRef<str>>(&self, requested: &[S]) -> Vec<String> {
        let mut selected: Vec<String> = Vec::new();
        for topic in requested {
            let topic = topic.as_ref().trim();
            if self.contains(topic) && !selected.iter().any(|s| s == topic) {
                selected.push(topic.to_string());
            }
        }
        if selected.is_empty() {
            self.defaults()
        } else {
            selected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = TopicCatalog::builtin();
        assert_eq!(catalog.defaults(), DEFAULT_TOPICS.to_vec());
        for topic in DEFAULT_TOPICS {
            assert!(!catalog.sources(topic).unwrap().is_empty());
        }
        assert!(catalog.sources("astrology").is_none());
    }

    #[test]
    fn test_insert_drops_duplicate_and_invalid_urls() {
        let mut catalog = TopicCatalog::new();
        catalog.insert(
            "tech",
            vec![
                SourceSpec::new("https://a.example/rss"),
                SourceSpec::new("https://a.example/rss"),
                SourceSpec::new("not-a-url"),
            ],
        );
        assert_eq!(catalog.sources("tech").unwrap().len(), 1);
    }

    #[test]
    fn test_select_filters_and_falls_back() {
        let catalog = TopicCatalog::builtin();
        assert_eq!(catalog.select(&["tech", "bogus", "tech", "sports"]), vec!["tech", "sports"]);
        assert_eq!(catalog.select(&["bogus"]), catalog.defaults());
        assert_eq!(catalog.select::<&str>(&[]), catalog.defaults());
    }

    #[test]
    fn test_from_json_accepts_both_source_shapes() {
        let catalog = TopicCatalog::from_json_str(
            r#"{"finance": ["https://a.example/rss", {"url": "https://b.example/rss", "label": "B"}]}"#,
        )
        .unwrap();
        let sources = catalog.sources("finance").unwrap();
        assert_eq!(sources[0], SourceSpec::new("https://a.example/rss"));
        assert_eq!(sources[1], SourceSpec::labelled("https://b.example/rss", "B"));
        assert_eq!(catalog.defaults(), vec!["finance"]);
    }
}
