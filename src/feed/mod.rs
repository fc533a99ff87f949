//! Feed retrieval: HTTP fetch plus RSS/Atom parsing.
//!
//! - `parser` turns feed XML into an [`RssFeed`] using the `feed-rs` crate
//! - `fetcher` defines the [`FeedFetcher`] seam and its HTTP implementation
//!
//! Nothing here touches storage; fetched items are returned to the caller.

mod fetcher;
mod parser;

pub use fetcher::{FeedFetcher, FetchError, HttpFeedFetcher};
pub use parser::{parse_feed, RssFeed, RssItem};
