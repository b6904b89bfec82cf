//! Match queries
//!
//! A query is a URI plus the domain derived from it. Domain extraction
//! is deliberately cheap and does not parse the URI properly: the domain
//! is whatever follows the first `:` and its slashes, up to the next `/`.

use std::ops::Range;

/// A URI to classify, with its derived domain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    uri: String,
    domain: Range<usize>,
}

impl Query {
    /// Create a query and derive its domain.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let domain = domain_range(&uri);
        Self { uri, domain }
    }

    /// Replace the URI and recompute the domain.
    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = uri.into();
        self.domain = domain_range(&self.uri);
    }

    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Derived domain; empty when the URI has none.
    #[inline]
    pub fn domain(&self) -> &str {
        &self.uri[self.domain.clone()]
    }
}

impl From<&str> for Query {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for Query {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

/// Locate the domain within a URI.
///
/// Returns an empty range when there is no `:` or nothing follows
/// the slashes after it.
pub fn domain_range(uri: &str) -> Range<usize> {
    let bytes = uri.as_bytes();

    let colon = match bytes.iter().position(|&b| b == b':') {
        Some(pos) => pos,
        None => return 0..0,
    };

    let mut begin = colon + 1;
    while begin < bytes.len() && bytes[begin] == b'/' {
        begin += 1;
    }

    if begin >= bytes.len() {
        return 0..0;
    }

    let end = bytes[begin..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(bytes.len(), |pos| begin + pos);

    begin..end
}
