use thiserror::Error;

/// Raised when authorship is requested for something that is not a post.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorshipError {
    #[error("item is not an h-entry (types: {0:?})")]
    NotAnEntry(Vec<String>),
}

/// Why an author page could not be retrieved. Only ever logged by the
/// resolver; callers of `resolve` see `None`.
///
/// Messages name the failing step only. The cause travels in `source()`,
/// so render with `{:#}` through anyhow to see the full chain.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("malformed url {url:?}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("could not parse {url}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("html tokenizer rejected input: {0}")]
    Html(String),
}
