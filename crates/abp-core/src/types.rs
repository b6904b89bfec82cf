//! Core type definitions
//!
//! Instructions, programs and compiled rules shared by the compiler
//! and the matching engine.

use crate::domain::DomainMatcher;

// =============================================================================
// Limits and Operand Sentinels
// =============================================================================

/// Maximum number of instructions in one program, including the final `Match`.
pub const INST_MAX: usize = 4096;

/// `Char` operand: end of the URI (coincides with the terminator byte).
pub const CHAR_TAIL: i16 = 0;
/// `Char` operand: start of the URI. Only ever the first instruction.
pub const CHAR_HEAD: i16 = -1;
/// `Char`/`SkipTo` operand: any separator byte.
pub const CHAR_SEPARATOR: i16 = -2;

// =============================================================================
// Rule Flags
// =============================================================================

bitflags::bitflags! {
    /// Flags parsed from a rule's `$` options and `@@` prefix.
    ///
    /// Only `MATCH_CASE` (at compile time) and `DOMAIN` (at match time)
    /// change matching; the rest are recorded for callers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RuleFlags: u32 {
        /// $match-case
        const MATCH_CASE = 1 << 0;
        const SCRIPT = 1 << 1;
        const NOT_SCRIPT = 1 << 2;
        const IMAGE = 1 << 3;
        const NOT_IMAGE = 1 << 4;
        const STYLESHEET = 1 << 5;
        const NOT_STYLESHEET = 1 << 6;
        const OBJECT = 1 << 7;
        const NOT_OBJECT = 1 << 8;
        const XMLHTTPREQUEST = 1 << 9;
        const NOT_XMLHTTPREQUEST = 1 << 10;
        const OBJECT_SUBREQUEST = 1 << 11;
        const NOT_OBJECT_SUBREQUEST = 1 << 12;
        const SUBDOCUMENT = 1 << 13;
        const NOT_SUBDOCUMENT = 1 << 14;
        const DOCUMENT = 1 << 15;
        const NOT_DOCUMENT = 1 << 16;
        const ELEMHIDE = 1 << 17;
        const NOT_ELEMHIDE = 1 << 18;
        const OTHER = 1 << 19;
        const NOT_OTHER = 1 << 20;
        const THIRD_PARTY = 1 << 21;
        const NOT_THIRD_PARTY = 1 << 22;
        const COLLAPSE = 1 << 23;
        const NOT_COLLAPSE = 1 << 24;
        /// Rule carries a $domain= constraint
        const DOMAIN = 1 << 25;
        /// Exception rule (@@...)
        const ALLOW = 1 << 26;
    }
}

// =============================================================================
// Instructions
// =============================================================================

/// VM opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Compare the current byte, then advance one
    Char = 0,
    /// Advance until the operand byte (or a separator) is under the cursor
    SkipTo = 1,
    /// Skip `scheme:` and any following slashes
    SkipScheme = 2,
    /// Program complete
    Match = 3,
}

impl Opcode {
    /// Mnemonic used by the disassembler.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::SkipTo => "skip_to",
            Self::SkipScheme => "skip_scheme",
            Self::Match => "match",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Char),
            1 => Ok(Self::SkipTo),
            2 => Ok(Self::SkipScheme),
            3 => Ok(Self::Match),
            _ => Err(()),
        }
    }
}

/// One VM instruction.
///
/// The operand is a literal byte (0..=255) or one of the `CHAR_*`
/// sentinels. It is wider than a byte so sentinels never collide
/// with real input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: i16,
}

impl Instruction {
    pub const HEAD: Self = Self::new(Opcode::Char, CHAR_HEAD);
    pub const TAIL: Self = Self::new(Opcode::Char, CHAR_TAIL);
    pub const SEPARATOR: Self = Self::new(Opcode::Char, CHAR_SEPARATOR);
    pub const SKIP_SCHEME: Self = Self::new(Opcode::SkipScheme, 0);
    pub const MATCH: Self = Self::new(Opcode::Match, 0);

    #[inline]
    pub const fn new(opcode: Opcode, operand: i16) -> Self {
        Self { opcode, operand }
    }

    /// `Char` with a literal byte.
    #[inline]
    pub const fn char(c: u8) -> Self {
        Self::new(Opcode::Char, c as i16)
    }

    /// `SkipTo` with a literal byte.
    #[inline]
    pub const fn skip_to(c: u8) -> Self {
        Self::new(Opcode::SkipTo, c as i16)
    }

    /// `SkipTo` the next separator.
    #[inline]
    pub const fn skip_to_separator() -> Self {
        Self::new(Opcode::SkipTo, CHAR_SEPARATOR)
    }

    /// Is this the leading head anchor?
    #[inline]
    pub fn is_head(&self) -> bool {
        self.opcode == Opcode::Char && self.operand == CHAR_HEAD
    }
}

// =============================================================================
// Programs
// =============================================================================

/// Program header: instruction count and a copy of the rule flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader {
    pub num_inst: u32,
    pub flags: RuleFlags,
}

/// A compiled instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    header: ProgramHeader,
    instructions: Vec<Instruction>,
}

impl Program {
    /// Wrap an emitted instruction sequence.
    ///
    /// The sequence must end with exactly one `Match` and hold at most
    /// [`INST_MAX`] instructions.
    pub fn new(instructions: Vec<Instruction>, flags: RuleFlags) -> Self {
        debug_assert!(instructions.len() <= INST_MAX);
        debug_assert_eq!(instructions.last().map(|i| i.opcode), Some(Opcode::Match));
        debug_assert_eq!(
            instructions.iter().filter(|i| i.opcode == Opcode::Match).count(),
            1
        );

        Self {
            header: ProgramHeader {
                num_inst: instructions.len() as u32,
                flags,
            },
            instructions,
        }
    }

    #[inline]
    pub fn header(&self) -> &ProgramHeader {
        &self.header
    }

    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Split off a leading head anchor.
    ///
    /// Returns whether the program is head-anchored and the instructions
    /// the VM should run.
    #[inline]
    pub fn entry(&self) -> (bool, &[Instruction]) {
        match self.instructions.split_first() {
            Some((first, rest)) if first.is_head() => (true, rest),
            _ => (false, &self.instructions),
        }
    }
}

// =============================================================================
// Compiled Rules
// =============================================================================

/// A rule ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    program: Program,
    pattern: String,
    original: String,
    flags: RuleFlags,
    include_domains: Vec<DomainMatcher>,
    exclude_domains: Vec<DomainMatcher>,
}

impl CompiledRule {
    /// Bundle a compiled rule.
    ///
    /// `RuleFlags::DOMAIN` is derived from the domain lists: it is set
    /// exactly when at least one list is non-empty.
    pub fn new(
        original: impl Into<String>,
        pattern: impl Into<String>,
        instructions: Vec<Instruction>,
        mut flags: RuleFlags,
        include_domains: Vec<DomainMatcher>,
        exclude_domains: Vec<DomainMatcher>,
    ) -> Self {
        flags.set(
            RuleFlags::DOMAIN,
            !include_domains.is_empty() || !exclude_domains.is_empty(),
        );

        Self {
            program: Program::new(instructions, flags),
            pattern: pattern.into(),
            original: original.into(),
            flags,
            include_domains,
            exclude_domains,
        }
    }

    #[inline]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Normalized URL pattern the program was built from.
    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Rule text exactly as it was added.
    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn flags(&self) -> RuleFlags {
        self.flags
    }

    #[inline]
    pub fn include_domains(&self) -> &[DomainMatcher] {
        &self.include_domains
    }

    #[inline]
    pub fn exclude_domains(&self) -> &[DomainMatcher] {
        &self.exclude_domains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_do_not_collide_with_bytes() {
        assert_eq!(Instruction::char(0), Instruction::TAIL);
        for b in 1..=255u8 {
            assert_ne!(Instruction::char(b), Instruction::TAIL);
            assert_ne!(Instruction::char(b), Instruction::HEAD);
            assert_ne!(Instruction::char(b), Instruction::SEPARATOR);
        }
    }

    #[test]
    fn rule_flags_default_to_empty() {
        assert_eq!(RuleFlags::default(), RuleFlags::empty());
    }

    #[test]
    fn opcode_round_trips_through_u8() {
        for op in [Opcode::Char, Opcode::SkipTo, Opcode::SkipScheme, Opcode::Match] {
            assert_eq!(Opcode::try_from(op as u8), Ok(op));
        }
        assert_eq!(Opcode::try_from(4), Err(()));
    }

    #[test]
    fn program_header_tracks_instructions() {
        let program = Program::new(
            vec![Instruction::HEAD, Instruction::SKIP_SCHEME, Instruction::char(b'a'), Instruction::MATCH],
            RuleFlags::MATCH_CASE,
        );
        assert_eq!(program.header().num_inst, 4);
        assert_eq!(program.header().flags, RuleFlags::MATCH_CASE);

        let (anchored, body) = program.entry();
        assert!(anchored);
        assert_eq!(body.len(), 3);
        assert_eq!(body[0], Instruction::SKIP_SCHEME);
    }

    #[test]
    fn unanchored_entry_keeps_all_instructions() {
        let program = Program::new(vec![Instruction::char(b'a'), Instruction::MATCH], RuleFlags::empty());
        let (anchored, body) = program.entry();
        assert!(!anchored);
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn domain_flag_follows_domain_lists() {
        let with_domains = CompiledRule::new(
            "a$domain=example.com",
            "a",
            vec![Instruction::char(b'a'), Instruction::MATCH],
            RuleFlags::empty(),
            vec![DomainMatcher::new("example.com")],
            Vec::new(),
        );
        assert!(with_domains.flags().contains(RuleFlags::DOMAIN));
        assert!(with_domains.program().header().flags.contains(RuleFlags::DOMAIN));

        let without = CompiledRule::new(
            "a",
            "a",
            vec![Instruction::char(b'a'), Instruction::MATCH],
            RuleFlags::DOMAIN,
            Vec::new(),
            Vec::new(),
        );
        assert!(!without.flags().contains(RuleFlags::DOMAIN));
    }
}
