mod fetch;
mod parse;

pub use fetch::{FeedFetcher, RssFeedFetcher, is_url};
pub use parse::{FeedEntry, ParsedFeed, parse_feed};
