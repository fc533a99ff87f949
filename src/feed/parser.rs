use feed_rs::parser;

/// A fetched feed document: channel metadata plus its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RssFeed {
    pub title: String,
    pub link: Option<String>,
    pub description: Option<String>,
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RssItem {
    pub title: String,
    pub link: Option<String>,
    pub description: Option<String>,
    /// RFC 3339 publication (or last update) time, when the feed provides one.
    pub pub_date: Option<String>,
}

/// Parse RSS or Atom bytes into an [`RssFeed`].
///
/// Entity-escaped text (`&amp;`, `&#39;`) is decoded by the parser.
pub fn parse_feed(bytes: &[u8]) -> Result<RssFeed, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone());
            let pub_date = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.to_rfc3339());
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            RssItem {
                title,
                link,
                description,
                pub_date,
            }
        })
        .collect();

    Ok(RssFeed {
        title: feed
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string()),
        link: feed.links.first().map(|l| l.href.clone()),
        description: feed.description.map(|d| d.content),
        items,
    })
}
