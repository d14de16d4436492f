//! IndieWeb authorship discovery (<https://indieweb.org/authorship>).
//!
//! [`resolve`] finds the author of one h-entry; [`resolve_all`] applies it
//! to every h-entry of a document and writes the results back.

pub mod batch;
pub mod resolve;

pub use batch::resolve_all;
pub use resolve::{resolve, select_card, Tier};

use url::Url;

use crate::document::Document;
use crate::error::ParseError;
use crate::fetch::PageFetcher;
use crate::parser::parse_html;

/// Parse `content` and fill in the author of every h-entry it contains.
pub async fn parse_and_resolve(
    content: &str,
    base_url: &Url,
    fetcher: &dyn PageFetcher,
    concurrency: usize,
) -> Result<Document, ParseError> {
    let mut doc = parse_html(content, base_url)?;
    resolve_all(&mut doc, base_url, fetcher, concurrency).await;
    Ok(doc)
}
