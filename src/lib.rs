//! Microformats2 parsing and IndieWeb authorship discovery.

pub mod authorship;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod parser;

pub use authorship::{parse_and_resolve, resolve, resolve_all};
pub use document::{Document, Item, PropertyValue};
pub use error::{AuthorshipError, FetchError, ParseError};
pub use fetch::{HttpFetcher, PageFetcher};
