use std::cmp::Ordering;
use std::collections::HashMap;

use crate::defs::NewsItem;

const MAX_CONTEXT_ITEMS: usize = 10;
const MAX_BULLETS: usize = 8;
const MAX_LINKS: usize = 5;

#[derive(Clone)]
struct ScoredSentence {
    position: usize,
    score: f64,
    text: String,
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_ascii_alphabetic() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let ends_sentence = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(false, |next| next.is_whitespace());
        if ends_sentence {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn word_frequencies(text: &str) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for word in words(text) {
        if word.len() > 2 && !is_stop_word(&word) {
            *freq.entry(word).or_insert(0) += 1;
        }
    }
    freq
}

fn score_sentences(text: &str, freq: &HashMap<String, usize>) -> Vec<ScoredSentence> {
    split_sentences(text)
        .into_iter()
        .enumerate()
        .filter_map(|(position, sentence)| {
            let ws = words(&sentence);
            if ws.is_empty() {
                return None;
            }
            let total: usize = ws.iter().map(|w| freq.get(w).copied().unwrap_or(0)).sum();
            let score = total as f64 / ws.len().max(8) as f64;
            Some(ScoredSentence {
                position,
                score,
                text: sentence,
            })
        })
        .collect()
}

/// Picks the highest scoring sentences and returns them in reading order.
pub fn extractive_bullets(texts: &[String], max_bullets: usize) -> Vec<String> {
    let text = texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return Vec::new();
    }

    let freq = word_frequencies(&text);
    if freq.is_empty() {
        return Vec::new();
    }

    let mut scored = score_sentences(&text, &freq);
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(max_bullets);
    scored.sort_by_key(|s| s.position);
    scored.into_iter().map(|s| s.text).collect()
}

/// Markdown digest built without any model: a frequency-scored extract of
/// the item blurbs followed by the top links.
pub struct BaselineDigest;

impl BaselineDigest {
    pub fn compose(items: &[NewsItem]) -> String {
        let texts: Vec<String> = items
            .iter()
            .take(MAX_CONTEXT_ITEMS)
            .map(|item| format!("{}. {}", item.title, item.summary))
            .collect();
        let bullets = extractive_bullets(&texts, MAX_BULLETS);

        let mut md = vec!["### What's new".to_string()];
        md.extend(bullets.iter().take(3).map(|b| format!("- {}", b)));
        if bullets.len() > 3 {
            md.push(String::new());
            md.push("### Key drivers & numbers".to_string());
            md.extend(bullets.iter().skip(3).map(|b| format!("- {}", b)));
        }

        md.push(String::new());
        md.push("### Notable links".to_string());
        for item in items.iter().take(MAX_LINKS) {
            let title = match item.title.trim() {
                "" => "(link)",
                t => t,
            };
            md.push(format!("- [{}]({}) — {}", title, item.link, item.domain));
        }

        md.join("\n").trim().to_string()
    }
}

/// Check if a word is a common stop word
pub fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "about" | "above" | "after" | "again" | "against" | "all" | "am" | "an" | "and" |
        "any" | "are" | "as" | "at" | "be" | "because" | "been" | "before" | "being" | "below" |
        "between" | "both" | "but" | "by" | "could" | "did" | "do" | "does" | "doing" | "down" |
        "during" | "each" | "few" | "for" | "from" | "further" | "had" | "has" | "have" |
        "having" | "he" | "her" | "here" | "hers" | "herself" | "him" | "himself" | "his" |
        "how" | "i" | "if" | "in" | "into" | "is" | "it" | "its" | "itself" | "just" | "me" |
        "more" | "most" | "my" | "myself" | "no" | "nor" | "not" | "of" | "off" | "on" |
        "once" | "only" | "or" | "other" | "our" | "ours" | "ourselves" | "out" | "over" |
        "own" | "same" | "she" | "should" | "so" | "some" | "such" | "than" | "that" | "the" |
        "their" | "theirs" | "them" | "themselves" | "then" | "there" | "these" | "they" |
        "this" | "those" | "through" | "to" | "too" | "under" | "until" | "up" | "very" |
        "was" | "we" | "were" | "what" | "when" | "where" | "which" | "while" | "who" |
        "whom" | "why" | "with" | "you" | "your" | "yours" | "yourself" | "yourselves"
    )
}
