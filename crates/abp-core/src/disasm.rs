//! Human-readable program listings
//!
//! Diagnostic only; matching never goes through here.

use std::fmt;

use crate::types::{CompiledRule, Instruction, Opcode, CHAR_HEAD, CHAR_SEPARATOR, CHAR_TAIL};

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::Char | Opcode::SkipTo => {
                write!(f, "{} ", self.opcode.mnemonic())?;
                match self.operand {
                    CHAR_HEAD => f.write_str("head"),
                    CHAR_TAIL => f.write_str("tail"),
                    CHAR_SEPARATOR => f.write_str("separator"),
                    c => write!(f, "{}", (c as u8).escape_ascii()),
                }
            }
            Opcode::SkipScheme | Opcode::Match => f.write_str(self.opcode.mnemonic()),
        }
    }
}

/// Aggregate instruction counts over a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProgramStats {
    pub rules: usize,
    pub instructions: usize,
    pub char: usize,
    pub skip_to: usize,
    pub skip_scheme: usize,
    #[cfg_attr(feature = "serde", serde(rename = "match"))]
    pub match_: usize,
}

impl ProgramStats {
    /// Count instructions without rendering anything.
    pub fn collect(rules: &[CompiledRule]) -> Self {
        let mut stats = Self::default();
        for rule in rules {
            stats.add_rule(rule);
        }
        stats
    }

    fn add_rule(&mut self, rule: &CompiledRule) {
        self.rules += 1;
        self.instructions += rule.program().header().num_inst as usize;
        for inst in rule.program().instructions() {
            match inst.opcode {
                Opcode::Char => self.char += 1,
                Opcode::SkipTo => self.skip_to += 1,
                Opcode::SkipScheme => self.skip_scheme += 1,
                Opcode::Match => self.match_ += 1,
            }
        }
    }
}

impl fmt::Display for ProgramStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#rule = {}", self.rules)?;
        writeln!(f, "#instruction = {}", self.instructions)?;
        writeln!(f, "#char = {}", self.char)?;
        writeln!(f, "#skip_to = {}", self.skip_to)?;
        writeln!(f, "#skip_scheme = {}", self.skip_scheme)?;
        writeln!(f, "#match = {}", self.match_)
    }
}

/// Write one block per rule (quoted original text, one instruction per
/// line, blank line) followed by the aggregate counts.
pub fn write_listing<W: fmt::Write>(out: &mut W, rules: &[CompiledRule]) -> Result<ProgramStats, fmt::Error> {
    let mut stats = ProgramStats::default();

    for rule in rules {
        writeln!(out, "\"{}\"", rule.original())?;
        for inst in rule.program().instructions() {
            writeln!(out, "{inst}")?;
        }
        writeln!(out)?;
        stats.add_rule(rule);
    }

    write!(out, "{stats}")?;
    Ok(stats)
}
