//! abpvm Core Library
//!
//! This crate provides the bytecode interpreter and matching engine for
//! Adblock Plus URL filters.
//!
//! # Architecture
//!
//! Each filter rule is compiled (by `abp-compiler`) into a short program
//! for a purpose-built VM whose instructions encode filter syntax directly:
//! literal bytes, `^` separators, `*` wildcards and the `|`/`||` anchors.
//! The matcher runs every program against every query URI, retrying at
//! successive start offsets, and reports the original text of each rule
//! that matched.
//!
//! # Modules
//!
//! - `charclass`: byte classification tables
//! - `types`: instructions, programs, compiled rules and flags
//! - `domain`: `$domain=` substring matchers
//! - `query`: URIs and their derived domains
//! - `vm`: the bytecode interpreter
//! - `matcher`: the rule collection and batch matching
//! - `disasm`: human-readable program listings

pub mod charclass;
pub mod disasm;
pub mod domain;
pub mod matcher;
pub mod query;
pub mod types;
pub mod vm;

// Re-export commonly used types
pub use disasm::{write_listing, ProgramStats};
pub use domain::DomainMatcher;
pub use matcher::{ExclusionMode, Matcher};
pub use query::Query;
pub use types::{CompiledRule, Instruction, Opcode, Program, ProgramHeader, RuleFlags, INST_MAX};
