//! Core Matching Engine
//!
//! Holds the compiled rule collection and runs every rule against every
//! query. Rules are appended while loading and are read-only afterwards,
//! so one `Matcher` can serve any number of threads once loading is done.

use crate::query::Query;
use crate::types::{CompiledRule, RuleFlags};
use crate::vm;

// =============================================================================
// Configuration
// =============================================================================

/// How `~domain` exclusions in `$domain=` affect matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExclusionMode {
    /// Exclusions are evaluated but never reject a rule.
    #[default]
    Inert,
    /// A rule is rejected when any excluded domain occurs in the query domain.
    Enforced,
}

// =============================================================================
// Matcher
// =============================================================================

/// The core matching engine.
#[derive(Debug, Default)]
pub struct Matcher {
    rules: Vec<CompiledRule>,
    exclusion_mode: ExclusionMode,
}

impl Matcher {
    /// Create an empty matcher with inert exclusions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty matcher with the given exclusion handling.
    pub fn with_exclusion_mode(exclusion_mode: ExclusionMode) -> Self {
        Self {
            rules: Vec::new(),
            exclusion_mode,
        }
    }

    pub fn exclusion_mode(&self) -> ExclusionMode {
        self.exclusion_mode
    }

    /// Append a compiled rule. Insertion order is match order.
    pub fn insert(&mut self, rule: CompiledRule) {
        self.rules.push(rule);
    }

    /// Append several compiled rules in order.
    pub fn extend<I: IntoIterator<Item = CompiledRule>>(&mut self, rules: I) {
        self.rules.extend(rules);
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match a batch of queries.
    ///
    /// Returns the original text of every accepted rule, query by query
    /// and rule by rule. A rule that matches several queries appears once
    /// per query; nothing is deduplicated.
    pub fn match_all(&self, queries: &[Query]) -> Vec<&str> {
        let mut result = Vec::new();
        for query in queries {
            self.match_query_into(query, &mut result);
        }
        result
    }

    /// Match one query.
    pub fn match_query(&self, query: &Query) -> Vec<&str> {
        let mut result = Vec::new();
        self.match_query_into(query, &mut result);
        result
    }

    /// Match one query, appending accepted rule texts to `result`.
    pub fn match_query_into<'a>(&'a self, query: &Query, result: &mut Vec<&'a str>) {
        for rule in &self.rules {
            if self.rule_matches(rule, query) {
                result.push(rule.original());
            }
        }
    }

    /// Check one rule against one query, including domain constraints.
    pub fn rule_matches(&self, rule: &CompiledRule, query: &Query) -> bool {
        if !run_program(rule, query.uri().as_bytes()) {
            return false;
        }

        if !rule.flags().contains(RuleFlags::DOMAIN) {
            return true;
        }

        self.check_domain_constraints(rule, query.domain())
    }

    /// Check $domain= constraints against the query domain.
    fn check_domain_constraints(&self, rule: &CompiledRule, domain: &str) -> bool {
        let excluded = rule.exclude_domains().iter().any(|d| d.is_found_in(domain));
        if excluded {
            match self.exclusion_mode {
                ExclusionMode::Enforced => return false,
                ExclusionMode::Inert => {
                    log::trace!("ignoring excluded domain {:?} for {:?}", domain, rule.original());
                }
            }
        }

        rule.include_domains().iter().any(|d| d.is_found_in(domain))
    }
}

/// Run a rule's program at each start offset until one succeeds.
///
/// Head-anchored programs only get offset 0. An empty URI is never tried.
fn run_program(rule: &CompiledRule, uri: &[u8]) -> bool {
    let (anchored, program) = rule.program().entry();

    for start in 0..uri.len() {
        if vm::run(program, uri, start) {
            return true;
        }
        if anchored {
            break;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainMatcher;
    use crate::types::Instruction;

    fn rule(original: &str, instructions: Vec<Instruction>) -> CompiledRule {
        CompiledRule::new(original, original, instructions, RuleFlags::empty(), Vec::new(), Vec::new())
    }

    fn domain_rule(original: &str, include: &[&str], exclude: &[&str]) -> CompiledRule {
        CompiledRule::new(
            original,
            "ad",
            vec![Instruction::char(b'a'), Instruction::char(b'd'), Instruction::MATCH],
            RuleFlags::empty(),
            include.iter().map(|d| DomainMatcher::new(d)).collect(),
            exclude.iter().map(|d| DomainMatcher::new(d)).collect(),
        )
    }

    #[test]
    fn unanchored_rule_retries_later_offsets() {
        let mut matcher = Matcher::new();
        matcher.insert(rule("ad", vec![Instruction::char(b'a'), Instruction::char(b'd'), Instruction::MATCH]));

        assert_eq!(matcher.match_query(&Query::new("http://x.com/ad")), vec!["ad"]);
        assert!(matcher.match_query(&Query::new("http://x.com/a")).is_empty());
    }

    #[test]
    fn head_anchored_rule_only_tries_offset_zero() {
        let mut matcher = Matcher::new();
        matcher.insert(rule(
            "|ht",
            vec![Instruction::HEAD, Instruction::char(b'h'), Instruction::char(b't'), Instruction::MATCH],
        ));

        assert_eq!(matcher.match_query(&Query::new("http://a.com")).len(), 1);
        assert!(matcher.match_query(&Query::new("xhttp://a.com")).is_empty());
    }

    #[test]
    fn empty_uri_never_matches() {
        let mut matcher = Matcher::new();
        matcher.insert(rule("", vec![Instruction::MATCH]));

        assert!(matcher.match_query(&Query::new("")).is_empty());
        assert_eq!(matcher.match_query(&Query::new("x")), vec![""]);
    }

    #[test]
    fn results_follow_query_then_rule_order() {
        let mut matcher = Matcher::new();
        matcher.insert(rule("a", vec![Instruction::char(b'a'), Instruction::MATCH]));
        matcher.insert(rule("b", vec![Instruction::char(b'b'), Instruction::MATCH]));
        matcher.insert(rule("a", vec![Instruction::char(b'a'), Instruction::MATCH]));

        let queries = [Query::new("b"), Query::new("ab")];
        assert_eq!(matcher.match_all(&queries), vec!["b", "a", "b", "a"]);
    }

    #[test]
    fn domain_include_list_gates_acceptance() {
        let mut matcher = Matcher::new();
        matcher.insert(domain_rule("ad$domain=example.com|example.net", &["example.com", "example.net"], &[]));

        assert_eq!(matcher.match_query(&Query::new("http://example.com/ad")).len(), 1);
        assert_eq!(matcher.match_query(&Query::new("http://www.example.net/ad")).len(), 1);
        assert!(matcher.match_query(&Query::new("http://other.com/ad")).is_empty());
        // Pattern must still match.
        assert!(matcher.match_query(&Query::new("http://example.com/x")).is_empty());
    }

    #[test]
    fn exclusions_are_inert_by_default() {
        let mut matcher = Matcher::new();
        matcher.insert(domain_rule("ad$domain=example.com|~ads.example.com", &["example.com"], &["ads.example.com"]));

        assert_eq!(matcher.exclusion_mode(), ExclusionMode::Inert);
        assert_eq!(matcher.match_query(&Query::new("http://ads.example.com/ad")).len(), 1);
    }

    #[test]
    fn enforced_exclusions_reject_rule() {
        let mut matcher = Matcher::with_exclusion_mode(ExclusionMode::Enforced);
        matcher.insert(domain_rule("ad$domain=example.com|~ads.example.com", &["example.com"], &["ads.example.com"]));

        assert!(matcher.match_query(&Query::new("http://ads.example.com/ad")).is_empty());
        assert_eq!(matcher.match_query(&Query::new("http://www.example.com/ad")).len(), 1);
    }

    #[test]
    fn exclusion_only_rule_never_matches() {
        let mut matcher = Matcher::new();
        matcher.insert(domain_rule("ad$domain=~example.com", &[], &["example.com"]));

        assert!(matcher.match_query(&Query::new("http://other.com/ad")).is_empty());
        assert!(matcher.match_query(&Query::new("http://example.com/ad")).is_empty());
    }

    #[test]
    fn matcher_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Matcher>();

        let mut matcher = Matcher::new();
        matcher.insert(rule("ad", vec![Instruction::char(b'a'), Instruction::char(b'd'), Instruction::MATCH]));

        let batches = [
            vec![Query::new("http://a.com/ad"), Query::new("http://a.com/x")],
            vec![Query::new("http://b.com/x"), Query::new("http://b.com/ad/ad")],
        ];
        let sequential: Vec<Vec<&str>> = batches.iter().map(|b| matcher.match_all(b)).collect();

        let parallel: Vec<Vec<&str>> = std::thread::scope(|scope| {
            let handles: Vec<_> = batches
                .iter()
                .map(|batch| {
                    let matcher = &matcher;
                    scope.spawn(move || matcher.match_all(batch))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(sequential, parallel);
    }
}
