//! abpvm Filter Rule Compiler
//!
//! This crate compiles Adblock Plus URL-filter rules into programs for
//! the `abp-core` VM and loads them into a `Matcher`.

pub mod builder;
pub mod list;
pub mod parser;

use abp_core::matcher::Matcher;
use abp_core::types::CompiledRule;

pub use builder::{build_program, build_rule, CompileError};
pub use list::{compile_filter_list, load_filter_list, ErrorPolicy, ListStats};
pub use parser::{normalize_pattern, parse_rule, ParsedRule, RuleLine};

/// Compile one rule line.
///
/// Returns `Ok(None)` for blank lines, comments and element-hiding rules.
pub fn compile_rule(rule: &str) -> Result<Option<CompiledRule>, CompileError> {
    match parse_rule(rule) {
        RuleLine::Filter(parsed) => build_rule(parsed).map(Some),
        RuleLine::Blank | RuleLine::Comment | RuleLine::ElementHiding => Ok(None),
    }
}

/// Compile one rule line and append it to `matcher`.
///
/// Skipped lines add nothing; on error nothing is added.
pub fn add_rule(matcher: &mut Matcher, rule: &str) -> Result<(), CompileError> {
    if let Some(compiled) = compile_rule(rule)? {
        matcher.insert(compiled);
    }
    Ok(())
}
