use std::borrow::Cow;

use tracing::{debug, warn};
use url::Url;

use crate::document::{Document, Item, PropertyValue, H_CARD, H_ENTRY, H_FEED};
use crate::error::{AuthorshipError, FetchError};
use crate::fetch::PageFetcher;

/// Only the plain-http prefix marks an author-page URL; `https://` values
/// are kept as names.
const AUTHOR_PAGE_PREFIX: &str = "http://";

/// Which rule picked the card on a fetched author page, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `url` == `uid` == author-page URL.
    UidMatch,
    /// `url` is one of the page's rel=me links.
    RelMe,
    /// `url` == author-page URL.
    UrlMatch,
}

/// Determine the author of `entry`, an h-entry found in `doc`.
///
/// `Ok(None)` covers every way of not finding an author, including an
/// unreachable or unparsable author page. Only a non-entry is an error.
pub async fn resolve(
    doc: &Document,
    entry: &Item,
    base_url: &Url,
    fetcher: &dyn PageFetcher,
) -> Result<Option<Item>, AuthorshipError> {
    if !entry.has_type(H_ENTRY) {
        return Err(AuthorshipError::NotAnEntry(entry.types.clone()));
    }

    let author_page = match candidate(doc, entry).as_deref() {
        Some(PropertyValue::Item(card)) if card.has_type(H_CARD) => {
            debug!("Author is an embedded h-card");
            return Ok(Some(card.clone()));
        }
        Some(PropertyValue::Text(s)) if s.starts_with(AUTHOR_PAGE_PREFIX) => s.clone(),
        Some(PropertyValue::Text(name)) => return Ok(Some(name_record(name.as_str().into()))),
        Some(PropertyValue::Item(other)) => {
            let name = match &other.value {
                Some(v) => PropertyValue::from(v.as_str()),
                None => PropertyValue::Item(other.clone()),
            };
            return Ok(Some(name_record(name)));
        }
        None => match permalink_author_page(doc, entry, base_url) {
            Some(page) => page.to_string(),
            None => {
                debug!("No author signal for entry");
                return Ok(None);
            }
        },
    };

    Ok(fetch_author(&author_page, fetcher).await)
}

/// First author signal in priority order: the entry's own author property,
/// the page's rel=author, then the first h-feed carrying an author.
fn candidate<'a>(doc: &'a Document, entry: &'a Item) -> Option<Cow<'a, PropertyValue>> {
    entry
        .first("author")
        .map(Cow::Borrowed)
        .or_else(|| {
            doc.first_rel("author")
                .map(|rel| Cow::Owned(PropertyValue::from(rel)))
        })
        .or_else(|| {
            doc.items
                .iter()
                .filter(|item| item.has_type(H_FEED))
                .find_map(|feed| feed.first("author"))
                .map(Cow::Borrowed)
        })
}

/// rel=author of the page, when `entry` is the page's own permalink.
fn permalink_author_page<'a>(doc: &'a Document, entry: &Item, base_url: &Url) -> Option<&'a str> {
    if entry.first_str("url") != Some(base_url.as_str()) {
        return None;
    }
    doc.first_rel("author")
}

fn name_record(name: PropertyValue) -> Item {
    Item::new([H_CARD]).with("name", name)
}

async fn fetch_author(author_page: &str, fetcher: &dyn PageFetcher) -> Option<Item> {
    let url = match Url::parse(author_page) {
        Ok(url) => url,
        Err(source) => {
            let err = FetchError::MalformedUrl {
                url: author_page.to_string(),
                source,
            };
            warn!("Skipping author page: {:#}", anyhow::Error::new(err));
            return None;
        }
    };

    let remote = match fetcher.fetch(&url).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Author page unavailable: {:#}", anyhow::Error::new(e));
            return None;
        }
    };

    match select_card(&remote, author_page) {
        Some((tier, card)) => {
            debug!("Author page {} matched by {:?}", author_page, tier);
            Some(card.clone())
        }
        None => {
            debug!("No qualifying h-card on {}", author_page);
            None
        }
    }
}

/// Pick the author h-card from a fetched author page. Tiers are tried in
/// order and a lower tier is only scanned when every higher one came up empty.
pub fn select_card<'a>(remote: &'a Document, author_page: &str) -> Option<(Tier, &'a Item)> {
    let cards = || remote.items.iter().filter(|item| item.has_type(H_CARD));
    let me = remote.rel("me");

    cards()
        .find(|card| match (card.first_str("url"), card.first_str("uid")) {
            (Some(url), Some(uid)) => url == uid && url == author_page,
            _ => false,
        })
        .map(|card| (Tier::UidMatch, card))
        .or_else(|| {
            cards()
                .find(|card| {
                    card.first_str("url")
                        .is_some_and(|url| me.iter().any(|m| m == url))
                })
                .map(|card| (Tier::RelMe, card))
        })
        .or_else(|| {
            cards()
                .find(|card| card.first_str("url") == Some(author_page))
                .map(|card| (Tier::UrlMatch, card))
        })
}
