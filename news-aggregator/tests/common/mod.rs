#![allow(dead_code)]

use news_aggregator::FetchConfig;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("news_aggregator=debug")
            .with_test_writer()
            .init();
    });
}

pub fn fetch_config() -> FetchConfig {
    FetchConfig {
        user_agent: "news-aggregator-tests/1.0".to_string(),
        timeout_seconds: 5,
        ..FetchConfig::default()
    }
}

/// One `<item>`: title, link, optional RFC 2822 date, optional raw description.
pub struct Item<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub pub_date: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl<'a> Item<'a> {
    pub fn new(title: &'a str, link: &'a str, pub_date: Option<&'a str>) -> Self {
        Self {
            title,
            link,
            pub_date,
            description: None,
        }
    }

    pub fn described(mut self, description: &'a str) -> Self {
        self.description = Some(description);
        self
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn rss(channel_title: &str, items: &[Item]) -> String {
    let body: String = items
        .iter()
        .map(|item| {
            let mut xml = format!(
                "<item><title>{}</title><link>{}</link>",
                escape(item.title),
                escape(item.link)
            );
            if let Some(date) = item.pub_date {
                xml.push_str(&format!("<pubDate>{}</pubDate>", date));
            }
            if let Some(description) = item.description {
                xml.push_str(&format!("<description>{}</description>", escape(description)));
            }
            xml.push_str("</item>");
            xml
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>{}</title><link>https://example.com</link><description>test</description>{}</channel></rss>"#,
        escape(channel_title),
        body
    )
}

pub fn atom(feed_title: &str, entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .enumerate()
        .map(|(i, (title, link, updated))| {
            format!(
                r#"<entry><title>{}</title><id>urn:test:{}</id><link rel="alternate" type="text/html" href="{}"/><updated>{}</updated></entry>"#,
                escape(title),
                i,
                escape(link),
                updated
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><feed xmlns="http://www.w3.org/2005/Atom"><title>{}</title><id>urn:test</id><updated>2025-06-10T12:00:00Z</updated>{}</feed>"#,
        escape(feed_title),
        body
    )
}

pub fn rss_response(body: String) -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(200)
        .insert_header("content-type", "application/rss+xml")
        .set_body_string(body)
}
