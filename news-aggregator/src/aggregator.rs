use crate::catalog::TopicCatalog;
use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::types::{AggregatorError, NewsItem, Result, SourceSpec};
use async_trait::async_trait;
use futures::future::join_all;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Anything that can produce a fresh item list for a cache key.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Vec<NewsItem>>;
}

#[async_trait]
impl<T: FeedSource + ?Sized> FeedSource for Arc<T> {
    async fn fetch(&self, key: &str) -> Result<Vec<NewsItem>> {
        (**self).fetch(key).await
    }
}

/// Fetches every source of a catalog topic and merges them into one list.
#[derive(Clone)]
pub struct TopicFetcher {
    fetcher: Fetcher,
    catalog: Arc<TopicCatalog>,
    max_items: usize,
}

impl TopicFetcher {
    pub fn new(fetcher: Fetcher, catalog: Arc<TopicCatalog>, max_items: usize) -> Self {
        Self {
            fetcher,
            catalog,
            max_items,
        }
    }

    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    pub async fn fetch_topic(&self, topic: &str) -> Result<Vec<NewsItem>> {
        let sources = self
            .catalog
            .sources(topic)
            .ok_or_else(|| AggregatorError::UnknownTopic {
                topic: topic.to_string(),
            })?;

        let results = join_all(sources.iter().map(|s| self.fetch_source(s))).await;

        let mut batches = Vec::with_capacity(results.len());
        let mut failed = 0;
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(items) => batches.push(items),
                Err(e) => {
                    failed += 1;
                    warn!("Skipping source {} for {}: {}", source.url, topic, e);
                }
            }
        }

        if !sources.is_empty() && failed == sources.len() {
            return Err(AggregatorError::AllSourcesFailed {
                topic: topic.to_string(),
                failed,
            });
        }

        let items = merge_items(batches, self.max_items);
        info!(
            "Topic {}: {} items from {}/{} sources",
            topic,
            items.len(),
            sources.len() - failed,
            sources.len()
        );
        Ok(items)
    }

    async fn fetch_source(&self, source: &SourceSpec) -> Result<Vec<NewsItem>> {
        let body = self.fetcher.fetch_feed(&source.url).await?;
        let parsed = FeedParser::parse_feed(&body)?;
        let items = parsed.into_news_items(source, self.fetcher.config().max_entries_per_source);
        debug!("{} yielded {} items", source.url, items.len());
        Ok(items)
    }
}

#[async_trait]
impl FeedSource for TopicFetcher {
    async fn fetch(&self, key: &str) -> Result<Vec<NewsItem>> {
        self.fetch_topic(key).await
    }
}

/// Concatenate per-source batches in order, dedupe, sort, then cap.
pub fn merge_items(batches: Vec<Vec<NewsItem>>, max_items: usize) -> Vec<NewsItem> {
    let mut items = dedupe_by_link(batches.into_iter().flatten());
    sort_newest_first(&mut items);
    items.truncate(max_items);
    items
}

/// First occurrence of each link wins.
pub fn dedupe_by_link(items: impl IntoIterator<Item = NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.link.clone()))
        .collect()
}

/// Newest first; undated items go last and keep their relative order.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| match (a.published, b.published) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(link: &str, hour: Option<u32>) -> NewsItem {
        NewsItem {
            title: link.to_uppercase(),
            link: link.to_string(),
            published: hour.map(|h| Utc.with_ymd_and_hms(2025, 6, 10, h, 0, 0).unwrap()),
            source: "test".to_string(),
            summary: String::new(),
            domain: String::new(),
        }
    }

    fn links(items: &[NewsItem]) -> Vec<&str> {
        items.iter().map(|i| i.link.as_str()).collect()
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let mut dup = item("a1", Some(9));
        dup.source = "second".to_string();
        let items = dedupe_by_link(vec![item("a1", Some(8)), item("b1", None), dup]);
        assert_eq!(links(&items), vec!["a1", "b1"]);
        assert_eq!(items[0].source, "test");
    }

    #[test]
    fn test_sort_puts_undated_last_in_fetch_order() {
        let mut items = vec![
            item("u1", None),
            item("d1", Some(8)),
            item("u2", None),
            item("d2", Some(11)),
            item("u3", None),
        ];
        sort_newest_first(&mut items);
        assert_eq!(links(&items), vec!["d2", "d1", "u1", "u2", "u3"]);
    }

    #[test]
    fn test_merge_sorts_before_truncating() {
        let batches = vec![
            vec![item("old", Some(1)), item("undated", None)],
            vec![item("new", Some(20)), item("old", Some(23))],
        ];
        let items = merge_items(batches, 2);
        assert_eq!(links(&items), vec!["new", "old"]);
    }

    #[test]
    fn test_two_source_topic_drops_repeat_within_a_source() {
        let mut x = item("a1", None);
        x.title = "X".to_string();
        let mut dup = item("a1", None);
        dup.title = "dup".to_string();
        let mut y = item("b1", None);
        y.title = "Y".to_string();

        let items = merge_items(vec![vec![x, dup], vec![y]], 5);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["X", "Y"]);
    }

    #[test]
    fn test_merge_with_zero_cap() {
        assert!(merge_items(vec![vec![item("a", None)]], 0).is_empty());
    }
}
