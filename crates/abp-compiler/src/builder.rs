use abp_core::charclass::is_url_char;
use abp_core::domain::DomainMatcher;
use abp_core::types::{CompiledRule, Instruction, RuleFlags, INST_MAX};

use crate::parser::ParsedRule;

/// Error type for rule compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Illegal byte in the pattern, illegal byte after `*`, or a `|`
    /// that is not a leading or trailing anchor. `offset` is 0-based
    /// into the normalized `pattern`.
    #[error("{rule}: invalid character at {offset} ({}) in pattern {pattern:?}", .byte.escape_ascii())]
    InvalidCharacter {
        rule: String,
        pattern: String,
        offset: usize,
        byte: u8,
    },
    #[error("{rule}: too many instructions (exceeded {limit})")]
    TooManyInstructions { rule: String, limit: usize },
}

impl CompileError {
    /// Rule text the error refers to.
    pub fn rule(&self) -> &str {
        match self {
            Self::InvalidCharacter { rule, .. } | Self::TooManyInstructions { rule, .. } => rule,
        }
    }
}

/// Compile a parsed rule into a ready-to-match rule.
pub fn build_rule(parsed: ParsedRule<'_>) -> Result<CompiledRule, CompileError> {
    let instructions = build_program(parsed.original, &parsed.pattern, parsed.flags)?;

    let include = parsed.include_domains.iter().map(|d| DomainMatcher::new(d)).collect();
    let exclude = parsed.exclude_domains.iter().map(|d| DomainMatcher::new(d)).collect();

    Ok(CompiledRule::new(
        parsed.original,
        parsed.pattern,
        instructions,
        parsed.flags,
        include,
        exclude,
    ))
}

/// Emit the instruction sequence for a normalized pattern.
///
/// `rule` is only used for error reporting. Literal bytes are
/// lower-cased unless `flags` has `MATCH_CASE`.
pub fn build_program(rule: &str, pattern: &str, flags: RuleFlags) -> Result<Vec<Instruction>, CompileError> {
    let bytes = pattern.as_bytes();
    let match_case = flags.contains(RuleFlags::MATCH_CASE);
    let fold = |c: u8| if match_case { c } else { c.to_ascii_lowercase() };
    let invalid = |offset: usize| CompileError::InvalidCharacter {
        rule: rule.to_string(),
        pattern: pattern.to_string(),
        offset,
        byte: bytes.get(offset).copied().unwrap_or(0),
    };

    let mut program = Vec::new();
    let mut pos = 0;

    if bytes.starts_with(b"@@") {
        pos = 2;
    }

    if bytes[pos..].starts_with(b"||") {
        program.push(Instruction::HEAD);
        program.push(Instruction::SKIP_SCHEME);
        pos += 2;
    } else if bytes[pos..].starts_with(b"|") {
        program.push(Instruction::HEAD);
        pos += 1;
    }

    while pos < bytes.len() {
        if program.len() >= INST_MAX - 1 {
            return Err(CompileError::TooManyInstructions {
                rule: rule.to_string(),
                limit: INST_MAX,
            });
        }

        let c = bytes[pos];
        match c {
            b'*' => {
                let next = bytes.get(pos + 1).copied().unwrap_or(0);
                if next == b'^' {
                    program.push(Instruction::skip_to_separator());
                } else if is_url_char(next) {
                    program.push(Instruction::skip_to(fold(next)));
                } else {
                    return Err(invalid(pos + 1));
                }
                pos += 2;
            }
            b'^' => {
                program.push(Instruction::SEPARATOR);
                pos += 1;
            }
            b'|' => {
                if pos + 1 != bytes.len() {
                    return Err(invalid(pos));
                }
                program.push(Instruction::TAIL);
                pos += 1;
            }
            _ if is_url_char(c) => {
                program.push(Instruction::char(fold(c)));
                pos += 1;
            }
            _ => return Err(invalid(pos)),
        }
    }

    program.push(Instruction::MATCH);
    Ok(program)
}
