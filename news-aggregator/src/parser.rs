use crate::types::{AggregatorError, NewsItem, Result, SourceSpec};
use crate::utils::{text, url};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use tracing::debug;

pub const UNTITLED: &str = "(no title)";

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

/// Every field is optional: a feed that omits one attribute should not cost
/// us the whole entry.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Summary as published, may contain HTML.
    pub raw_summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &[u8]) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed
            .title
            .map(|t| text::strip_html(&t.content))
            .filter(|t| !t.is_empty());
        let entries = feed.entries.into_iter().map(Self::parse_entry).collect();

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> ParsedEntry {
        let title = entry
            .title
            .map(|t| text::strip_html(&t.content))
            .filter(|t| !t.is_empty());

        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.trim().to_string())
            .filter(|href| !href.is_empty());

        let raw_summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        ParsedEntry {
            title,
            link,
            raw_summary,
            published: entry.published.or(entry.updated),
        }
    }
}

impl ParsedFeed {
    /// Normalize the first `max_entries` entries. Entries without a link
    /// have no identity and are dropped.
    pub fn into_news_items(self, source: &SourceSpec, max_entries: usize) -> Vec<NewsItem> {
        let label = source
            .label
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| url::domain_of(&source.url));

        self.entries
            .into_iter()
            .take(max_entries)
            .filter_map(|entry| entry.into_news_item(&label))
            .collect()
    }
}

impl ParsedEntry {
    pub fn into_news_item(self, source_label: &str) -> Option<NewsItem> {
        let link = self.link?;
        let summary = self
            .raw_summary
            .as_deref()
            .map(text::strip_html)
            .unwrap_or_default();

        Some(NewsItem {
            title: self.title.unwrap_or_else(|| UNTITLED.to_string()),
            domain: url::domain_of(&link),
            link,
            published: self.published,
            source: source_label.to_string(),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Wire</title>
    <link>https://example.com</link>
    <description>Test</description>
    <item>
      <title>Rates &amp; markets</title>
      <link>https://example.com/rates</link>
      <description>&lt;p&gt;Central bank &lt;b&gt;holds&lt;/b&gt;&lt;/p&gt;</description>
      <pubDate>Tue, 10 Jun 2025 09:30:00 GMT</pubDate>
    </item>
    <item>
      <link>https://example.com/untitled</link>
      <pubDate>not a date</pubDate>
    </item>
    <item>
      <title>No link here</title>
    </item>
    <item>
      <title>Inflation &lt; 3% for first time since 2021</title>
      <link>https://example.com/inflation</link>
      <description>Apple&amp;#8217;s suppliers &amp;#x2014; and &amp;eacute;lite funds</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_tolerates_missing_fields() {
        let parsed = FeedParser::parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Example Wire"));
        assert_eq!(parsed.entries.len(), 4);

        let items = parsed.into_news_items(&SourceSpec::new("https://example.com/rss"), 50);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title, "Rates & markets");
        assert_eq!(items[0].link, "https://example.com/rates");
        assert_eq!(items[0].summary, "Central bank holds");
        assert_eq!(items[0].source, "Example Wire");
        assert_eq!(items[0].domain, "example.com");
        assert_eq!(
            items[0].published,
            Some(Utc.with_ymd_and_hms(2025, 6, 10, 9, 30, 0).unwrap())
        );

        assert_eq!(items[1].title, UNTITLED);
        assert_eq!(items[1].published, None);

        assert_eq!(items[2].title, "Inflation < 3% for first time since 2021");
        assert_eq!(items[2].summary, "Apple\u{2019}s suppliers \u{2014} and \u{e9}lite funds");
    }

    #[test]
    fn test_configured_label_wins_over_feed_title() {
        let parsed = FeedParser::parse_feed(RSS.as_bytes()).unwrap();
        let items = parsed.into_news_items(&SourceSpec::labelled("https://example.com/rss", "Wire"), 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "Wire");
    }

    #[test]
    fn test_parse_atom() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Source</title>
  <id>urn:example</id>
  <updated>2025-06-10T10:00:00Z</updated>
  <entry>
    <title>Filing 8-K</title>
    <id>urn:example:1</id>
    <link rel="alternate" href="https://example.org/filing"/>
    <updated>2025-06-10T10:00:00Z</updated>
    <summary>Current report</summary>
  </entry>
</feed>"#;
        let items = FeedParser::parse_feed(atom.as_bytes())
            .unwrap()
            .into_news_items(&SourceSpec::new("https://example.org/atom"), 50);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://example.org/filing");
        assert_eq!(items[0].source, "Atom Source");
        assert!(items[0].published.is_some());
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = FeedParser::parse_feed(b"<html><body>nope</body></html>").unwrap_err();
        assert!(matches!(err, AggregatorError::Parse(_)));
    }
}
