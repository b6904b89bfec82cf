use abp_core::types::RuleFlags;

/// What a single filter-list line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleLine<'a> {
    /// Empty line
    Blank,
    /// `!` comment
    Comment,
    /// `##` / `#@#` element hiding, not handled here
    ElementHiding,
    /// URL filter
    Filter(ParsedRule<'a>),
}

/// A URL filter split into its pattern and options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule<'a> {
    /// Rule text as given
    pub original: &'a str,
    /// Normalized URL pattern, still carrying any `@@` prefix
    pub pattern: String,
    pub flags: RuleFlags,
    /// Lower-cased `$domain=` tokens
    pub include_domains: Vec<String>,
    /// Lower-cased `$domain=~` tokens, without the `~`
    pub exclude_domains: Vec<String>,
}

/// Option tokens that map straight onto a flag.
const OPTION_FLAGS: &[(&str, RuleFlags)] = &[
    ("match-case", RuleFlags::MATCH_CASE),
    ("script", RuleFlags::SCRIPT),
    ("~script", RuleFlags::NOT_SCRIPT),
    ("image", RuleFlags::IMAGE),
    ("~image", RuleFlags::NOT_IMAGE),
    ("stylesheet", RuleFlags::STYLESHEET),
    ("~stylesheet", RuleFlags::NOT_STYLESHEET),
    ("object", RuleFlags::OBJECT),
    ("~object", RuleFlags::NOT_OBJECT),
    ("xmlhttprequest", RuleFlags::XMLHTTPREQUEST),
    ("~xmlhttprequest", RuleFlags::NOT_XMLHTTPREQUEST),
    ("object-subrequest", RuleFlags::OBJECT_SUBREQUEST),
    ("~object-subrequest", RuleFlags::NOT_OBJECT_SUBREQUEST),
    ("subdocument", RuleFlags::SUBDOCUMENT),
    ("~subdocument", RuleFlags::NOT_SUBDOCUMENT),
    ("document", RuleFlags::DOCUMENT),
    ("~document", RuleFlags::NOT_DOCUMENT),
    ("elemhide", RuleFlags::ELEMHIDE),
    ("~elemhide", RuleFlags::NOT_ELEMHIDE),
    ("other", RuleFlags::OTHER),
    ("~other", RuleFlags::NOT_OTHER),
    ("third-party", RuleFlags::THIRD_PARTY),
    ("~third-party", RuleFlags::NOT_THIRD_PARTY),
    ("collapse", RuleFlags::COLLAPSE),
    ("~collapse", RuleFlags::NOT_COLLAPSE),
];

pub fn parse_rule(line: &str) -> RuleLine<'_> {
    if line.is_empty() {
        return RuleLine::Blank;
    }

    if line.starts_with('!') {
        return RuleLine::Comment;
    }

    if line.contains("##") || line.contains("#@#") {
        log::debug!("skipping element hiding rule {:?}", line);
        return RuleLine::ElementHiding;
    }

    let (pattern_part, options_text) = split_rule_options(line);

    let mut options = ParsedOptions::default();
    if let Some(options_text) = options_text {
        parse_options(options_text, &mut options);
    }

    let mut flags = options.flags;
    if pattern_part.starts_with("@@") {
        flags |= RuleFlags::ALLOW;
    }
    if !options.include_domains.is_empty() || !options.exclude_domains.is_empty() {
        flags |= RuleFlags::DOMAIN;
    }

    RuleLine::Filter(ParsedRule {
        original: line,
        pattern: normalize_pattern(pattern_part),
        flags,
        include_domains: options.include_domains,
        exclude_domains: options.exclude_domains,
    })
}

#[derive(Default)]
struct ParsedOptions {
    flags: RuleFlags,
    include_domains: Vec<String>,
    exclude_domains: Vec<String>,
}

fn split_rule_options(line: &str) -> (&str, Option<&str>) {
    match line.find('$') {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    }
}

fn parse_options(text: &str, options: &mut ParsedOptions) {
    for opt in text.split(',') {
        if let Some(&(_, flag)) = OPTION_FLAGS.iter().find(|(name, _)| *name == opt) {
            options.flags |= flag;
            continue;
        }

        if let Some(domain_value) = opt.strip_prefix("domain=") {
            parse_domain_option(domain_value, options);
            continue;
        }

        log::debug!("ignoring unknown option {:?}", opt);
    }
}

fn parse_domain_option(value: &str, options: &mut ParsedOptions) {
    for raw in value.split('|') {
        match raw.strip_prefix('~') {
            Some(domain) if !domain.is_empty() => {
                options.exclude_domains.push(domain.to_ascii_lowercase());
            }
            Some(_) => {}
            None if !raw.is_empty() => {
                options.include_domains.push(raw.to_ascii_lowercase());
            }
            None => {}
        }
    }
}

/// Normalize the wildcard and anchor edges of a URL pattern.
///
/// In order: collapse `*` runs, strip a trailing `*`, strip a leading `*`,
/// strip a trailing `*|`, strip a leading `|*`, rewrite a trailing `^|`
/// to `^`.
pub fn normalize_pattern(pattern: &str) -> String {
    let mut collapsed = String::with_capacity(pattern.len());
    let mut prev_star = false;
    for ch in pattern.chars() {
        let is_star = ch == '*';
        if !(is_star && prev_star) {
            collapsed.push(ch);
        }
        prev_star = is_star;
    }

    let mut rest = collapsed.as_str();
    rest = rest.strip_suffix('*').unwrap_or(rest);
    rest = rest.strip_prefix('*').unwrap_or(rest);
    rest = rest.strip_suffix("*|").unwrap_or(rest);
    rest = rest.strip_prefix("|*").unwrap_or(rest);

    match rest.strip_suffix("^|") {
        Some(head) => format!("{head}^"),
        None => rest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(line: &str) -> ParsedRule<'_> {
        match parse_rule(line) {
            RuleLine::Filter(rule) => rule,
            other => panic!("expected a filter for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn skips_blank_comment_and_element_hiding() {
        assert_eq!(parse_rule(""), RuleLine::Blank);
        assert_eq!(parse_rule("! Title: EasyList"), RuleLine::Comment);
        assert_eq!(parse_rule("!"), RuleLine::Comment);
        assert_eq!(parse_rule("example.com##.ad-banner"), RuleLine::ElementHiding);
        assert_eq!(parse_rule("##.ad"), RuleLine::ElementHiding);
        assert_eq!(parse_rule("example.com#@#.ad"), RuleLine::ElementHiding);
    }

    #[test]
    fn normalizes_wildcards_and_anchors() {
        assert_eq!(normalize_pattern("a**b***c"), "a*b*c");
        assert_eq!(normalize_pattern("*ads*"), "ads");
        assert_eq!(normalize_pattern("**ads**"), "ads");
        assert_eq!(normalize_pattern("ads*|"), "ads");
        assert_eq!(normalize_pattern("|*ads"), "ads");
        assert_eq!(normalize_pattern("ads^|"), "ads^");
        assert_eq!(normalize_pattern("||ads.com^"), "||ads.com^");
        assert_eq!(normalize_pattern("*"), "");
        assert_eq!(normalize_pattern("|*"), "|");
        assert_eq!(normalize_pattern("@@*ads"), "@@*ads");
    }

    #[test]
    fn splits_on_first_dollar() {
        let rule = filter("/ads/*$script,image");
        assert_eq!(rule.pattern, "/ads/");
        assert_eq!(rule.flags, RuleFlags::SCRIPT | RuleFlags::IMAGE);
        assert_eq!(rule.original, "/ads/*$script,image");
    }

    #[test]
    fn maps_every_option_token() {
        for &(name, flag) in OPTION_FLAGS {
            let line = format!("ads${name}");
            assert_eq!(filter(&line).flags, flag, "option {name}");
        }
    }

    #[test]
    fn ignores_unknown_options() {
        let rule = filter("ads$popup,important,third-party,Script");
        assert_eq!(rule.flags, RuleFlags::THIRD_PARTY);
    }

    #[test]
    fn parses_domain_lists() {
        let rule = filter("ads$domain=Example.com|~Ads.Example.com||foo.net,script");
        assert_eq!(rule.include_domains, vec!["example.com", "foo.net"]);
        assert_eq!(rule.exclude_domains, vec!["ads.example.com"]);
        assert!(rule.flags.contains(RuleFlags::DOMAIN | RuleFlags::SCRIPT));
    }

    #[test]
    fn repeated_domain_options_accumulate() {
        let rule = filter("ads$domain=a.com,domain=~b.com");
        assert_eq!(rule.include_domains, vec!["a.com"]);
        assert_eq!(rule.exclude_domains, vec!["b.com"]);
    }

    #[test]
    fn empty_domain_option_sets_no_constraint() {
        let rule = filter("ads$domain=");
        assert!(rule.include_domains.is_empty());
        assert!(!rule.flags.contains(RuleFlags::DOMAIN));

        let rule = filter("ads$domain=~|");
        assert!(!rule.flags.contains(RuleFlags::DOMAIN));
    }

    #[test]
    fn records_allow_prefix() {
        let rule = filter("@@||example.com^$document");
        assert_eq!(rule.flags, RuleFlags::ALLOW | RuleFlags::DOCUMENT);
        assert_eq!(rule.pattern, "@@||example.com^");
    }
}
