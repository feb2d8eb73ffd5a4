pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod fetcher;
pub mod finance;
pub mod focused;
pub mod parser;
pub mod server;
pub mod summarizer;
pub mod types;
pub mod utils;

pub use aggregator::{FeedSource, TopicFetcher};
pub use cache::TopicCache;
pub use catalog::{TopicCatalog, DEFAULT_TOPICS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Args;
pub use fetcher::Fetcher;
pub use focused::{FocusedSearch, QuerySource, SearchConfig, SearchMode};
pub use parser::FeedParser;
pub use server::AppState;
pub use summarizer::{ExtractiveSummarizer, OpenAiSummarizer, SummaryService, Summarizer};
pub use types::*;
