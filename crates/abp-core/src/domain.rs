//! Domain constraint matching
//!
//! A `$domain=` token is tested as a plain substring of the query's
//! domain, so each token carries a prebuilt searcher.

use std::fmt;

use memchr::memmem::Finder;

/// One lower-cased domain token with its substring searcher.
#[derive(Clone)]
pub struct DomainMatcher {
    domain: String,
    finder: Finder<'static>,
}

impl DomainMatcher {
    /// Build a matcher for a domain token. The token is lower-cased.
    pub fn new(domain: &str) -> Self {
        let domain = domain.to_ascii_lowercase();
        let finder = Finder::new(domain.as_bytes()).into_owned();
        Self { domain, finder }
    }

    /// The lower-cased token.
    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Check if the token occurs anywhere in `haystack`.
    #[inline]
    pub fn is_found_in(&self, haystack: &str) -> bool {
        self.finder.find(haystack.as_bytes()).is_some()
    }
}

impl fmt::Debug for DomainMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DomainMatcher").field(&self.domain).finish()
    }
}

impl PartialEq for DomainMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
    }
}

impl Eq for DomainMatcher {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_token() {
        let matcher = DomainMatcher::new("Example.COM");
        assert_eq!(matcher.domain(), "example.com");
        assert!(matcher.is_found_in("www.example.com"));
    }

    #[test]
    fn test_substring_semantics() {
        let matcher = DomainMatcher::new("example.com");
        assert!(matcher.is_found_in("example.com"));
        assert!(matcher.is_found_in("ads.example.com"));
        assert!(matcher.is_found_in("notexample.com"));
        assert!(matcher.is_found_in("example.com.evil.net"));
        assert!(!matcher.is_found_in("other.com"));
        assert!(!matcher.is_found_in(""));
    }

    #[test]
    fn test_query_domain_is_not_case_folded() {
        let matcher = DomainMatcher::new("example.com");
        assert!(!matcher.is_found_in("EXAMPLE.COM"));
    }

    #[test]
    fn test_clone_keeps_searcher() {
        let matcher = DomainMatcher::new("ads.net");
        let cloned = matcher.clone();
        drop(matcher);
        assert!(cloned.is_found_in("cdn.ads.net"));
        assert_eq!(cloned, DomainMatcher::new("ADS.net"));
    }
}
