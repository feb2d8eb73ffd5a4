pub mod baseline;
pub mod defs;

pub use baseline::BaselineDigest;
pub use defs::{NewsItem, SummaryMode, SummaryOutput, SummaryRequest};
