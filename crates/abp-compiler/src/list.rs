use abp_core::matcher::Matcher;
use abp_core::types::CompiledRule;

use crate::builder::{build_rule, CompileError};
use crate::parser::{parse_rule, RuleLine};

/// What to do when a rule in a list fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first error and keep nothing from the list.
    #[default]
    Abort,
    /// Log the error, record it, and carry on with the next line.
    Skip,
}

/// Per-list counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListStats {
    pub lines: usize,
    pub blank: usize,
    pub comments: usize,
    pub element_hiding: usize,
    pub rules: usize,
    /// Errors skipped under `ErrorPolicy::Skip`
    pub errors: Vec<CompileError>,
}

/// Compile every line of a filter list. Lines are trimmed first.
pub fn compile_filter_list(text: &str, policy: ErrorPolicy) -> Result<(Vec<CompiledRule>, ListStats), CompileError> {
    let mut rules = Vec::new();
    let mut stats = ListStats::default();

    for raw_line in text.lines() {
        stats.lines += 1;

        let parsed = match parse_rule(raw_line.trim()) {
            RuleLine::Blank => {
                stats.blank += 1;
                continue;
            }
            RuleLine::Comment => {
                stats.comments += 1;
                continue;
            }
            RuleLine::ElementHiding => {
                stats.element_hiding += 1;
                continue;
            }
            RuleLine::Filter(parsed) => parsed,
        };

        match build_rule(parsed) {
            Ok(rule) => rules.push(rule),
            Err(e) if policy == ErrorPolicy::Skip => {
                log::warn!("line {}: {}", stats.lines, e);
                stats.errors.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    stats.rules = rules.len();
    Ok((rules, stats))
}

/// Compile a filter list and append its rules to `matcher`.
///
/// Under `ErrorPolicy::Abort` nothing is appended when any rule fails.
pub fn load_filter_list(matcher: &mut Matcher, text: &str, policy: ErrorPolicy) -> Result<ListStats, CompileError> {
    let (rules, stats) = compile_filter_list(text, policy)?;
    matcher.extend(rules);
    Ok(stats)
}
