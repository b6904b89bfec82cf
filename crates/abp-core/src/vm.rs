//! Bytecode interpreter
//!
//! Runs one program against one starting position of a URI. A run is a
//! single forward pass with no backtracking; retrying at later offsets
//! is the matcher's job.
//!
//! The cursor is an index into the URI bytes. Reading at or past the end
//! yields the terminator byte `0`, which the separator table classifies
//! as a separator and which equals `CHAR_TAIL`.

use crate::charclass::{is_scheme_char, is_separator};
use crate::types::{Instruction, Opcode, CHAR_SEPARATOR};

/// Byte under the cursor, or the terminator past the end.
#[inline]
fn byte_at(uri: &[u8], pos: usize) -> u8 {
    uri.get(pos).copied().unwrap_or(0)
}

/// Execute `program` against `uri` starting at byte offset `start`.
///
/// The program must not begin with the head anchor; strip it first
/// (see [`crate::types::Program::entry`]).
pub fn run(program: &[Instruction], uri: &[u8], start: usize) -> bool {
    let mut sp = start;

    for inst in program {
        match inst.opcode {
            Opcode::Char => {
                let c = byte_at(uri, sp);
                if inst.operand == CHAR_SEPARATOR {
                    if !is_separator(c) {
                        return false;
                    }
                } else if inst.operand != c as i16 {
                    return false;
                }
                sp += 1;
            }

            Opcode::SkipTo => {
                if inst.operand == CHAR_SEPARATOR {
                    // The terminator is a separator, so this stops at the end.
                    while !is_separator(byte_at(uri, sp)) {
                        sp += 1;
                    }
                } else {
                    loop {
                        let c = byte_at(uri, sp);
                        if inst.operand == c as i16 {
                            break;
                        }
                        if c == 0 {
                            return false;
                        }
                        sp += 1;
                    }
                }
            }

            Opcode::SkipScheme => {
                loop {
                    let c = byte_at(uri, sp);
                    if c == b':' {
                        break;
                    }
                    if !is_scheme_char(c) {
                        return false;
                    }
                    sp += 1;
                }

                sp += 1;
                while byte_at(uri, sp) == b'/' {
                    sp += 1;
                }
            }

            Opcode::Match => return true,
        }
    }

    // Well-formed programs always end in Match.
    true
}
