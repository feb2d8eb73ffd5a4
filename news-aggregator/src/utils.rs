use chrono::{DateTime, Utc};

/// Text processing utilities
pub mod text {
    use regex::Regex;
    use scraper::{Html, Selector};
    use std::sync::LazyLock;

    /// A complete tag: `<` straight followed by a name, `/` or `!`, up to the next `>`.
    /// A bare `<` in running text ("rates < 3%") is left alone.
    static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"</?[A-Za-z!][^<>]*>").ok());

    /// Strip complete tags, then decode entities and collapse whitespace.
    pub fn strip_html(html: &str) -> String {
        let stripped = match TAG.as_ref() {
            Some(tag) => tag.replace_all(html, " "),
            None => html.into(),
        };
        html_escape::decode_html_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Cut to at most `limit` characters without splitting a code point.
    pub fn clip(text: &str, limit: usize) -> &str {
        match text.char_indices().nth(limit) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }

    /// Every anchor `href` in an HTML fragment, in document order.
    pub fn hrefs(fragment: &str) -> Vec<String> {
        let Ok(anchors) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        let document = Html::parse_fragment(fragment);
        document
            .select(&anchors)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// Lowercased host of a URL, empty when it does not parse.
    pub fn domain_of(url_str: &str) -> String {
        Url::parse(url_str)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
            .unwrap_or_default()
    }

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        if let Ok(url) = Url::parse(url_str) {
            url.scheme() == "http" || url.scheme() == "https"
        } else {
            false
        }
    }
}

/// "just now", "5 min ago", "3 hr ago", "2 d ago".
pub fn human_time(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(published) = published else {
        return String::new();
    };
    let secs = now.signed_duration_since(published).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{} min ago", mins);
    }
    let hrs = mins / 60;
    if hrs < 24 {
        return format!("{} hr ago", hrs);
    }
    format!("{} d ago", hrs / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            text::strip_html("<p>Shares&nbsp;rose <b>5%</b></p>\n<p>after &amp; before</p>"),
            "Shares rose 5% after & before"
        );
        assert_eq!(text::strip_html(""), "");
    }

    #[test]
    fn test_strip_html_keeps_bare_angle_brackets() {
        assert_eq!(text::strip_html("Yields &lt; 4% as Fed holds rates"), "Yields < 4% as Fed holds rates");
        assert_eq!(text::strip_html("Inflation < 3% for first time"), "Inflation < 3% for first time");
        assert_eq!(text::strip_html("Q3 > Q2 <i>again</i>"), "Q3 > Q2 again");
        assert_eq!(text::strip_html("dangling <b tag"), "dangling <b tag");
    }

    #[test]
    fn test_strip_html_decodes_numeric_and_named_entities() {
        assert_eq!(
            text::strip_html("Apple&#8217;s earnings &#x2014; beat"),
            "Apple\u{2019}s earnings \u{2014} beat"
        );
        assert_eq!(text::strip_html("Caf&eacute; &copy; &hellip;"), "Caf\u{e9} \u{a9} \u{2026}");
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        assert_eq!(text::clip("héllo", 2), "hé");
        assert_eq!(text::clip("abc", 10), "abc");
    }

    #[test]
    fn test_hrefs() {
        let fragment = r#"<a href="https://news.google.com/x">G</a> <a href="https://www.reuters.com/a?b=1&amp;c=2">R</a>"#;
        assert_eq!(
            text::hrefs(fragment),
            vec!["https://news.google.com/x", "https://www.reuters.com/a?b=1&c=2"]
        );
        assert!(text::hrefs("no links").is_empty());
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(url::domain_of("https://WWW.Reuters.com/markets"), "www.reuters.com");
        assert_eq!(url::domain_of("not a url"), "");
        assert!(url::is_valid_feed_url("http://example.com/rss"));
        assert!(!url::is_valid_feed_url("ftp://example.com/rss"));
    }

    #[test]
    fn test_human_time() {
        let now = Utc::now();
        assert_eq!(human_time(None, now), "");
        assert_eq!(human_time(Some(now - Duration::seconds(10)), now), "just now");
        assert_eq!(human_time(Some(now - Duration::minutes(5)), now), "5 min ago");
        assert_eq!(human_time(Some(now - Duration::hours(3)), now), "3 hr ago");
        assert_eq!(human_time(Some(now - Duration::days(2)), now), "2 d ago");
    }
}
