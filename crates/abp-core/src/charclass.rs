//! Byte classification tables
//!
//! Three read-only lookup tables drive both the compiler and the VM:
//! which bytes may appear in a filter pattern, which bytes satisfy the
//! ABP `^` separator, and which bytes may appear in a URL scheme.
//! Byte 0 doubles as the end-of-string terminator and is a separator.

// =============================================================================
// Tables
// =============================================================================

/// Legal URL characters (RFC 3986 printable ASCII).
pub static URL_CHAR: [bool; 256] = build_url_char();

/// ABP separator characters, including the terminator byte.
pub static SEPARATOR: [bool; 256] = build_separator();

/// Legal URL scheme characters.
pub static SCHEME_CHAR: [bool; 256] = build_scheme_char();

const fn build_url_char() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0x21;
    while b < 0x7f {
        table[b] = true;
        b += 1;
    }

    let excluded = b"\"<>\\^`{|}";
    let mut i = 0;
    while i < excluded.len() {
        table[excluded[i] as usize] = false;
        i += 1;
    }
    table
}

const fn build_separator() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0;
    while b < 0x80 {
        let c = b as u8;
        table[b] = !(c.is_ascii_alphanumeric() || c == b'_' || c == b'-' || c == b'.' || c == b'%');
        b += 1;
    }
    table
}

const fn build_scheme_char() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0;
    while b < 0x80 {
        let c = b as u8;
        table[b] = c.is_ascii_alphanumeric() || c == b'+' || c == b'-' || c == b'.';
        b += 1;
    }
    table
}

// =============================================================================
// Lookups
// =============================================================================

/// Check if a byte may appear in a filter pattern.
#[inline]
pub fn is_url_char(c: u8) -> bool {
    URL_CHAR[c as usize]
}

/// Check if a byte satisfies the `^` separator.
#[inline]
pub fn is_separator(c: u8) -> bool {
    SEPARATOR[c as usize]
}

/// Check if a byte may appear in a URL scheme.
#[inline]
pub fn is_scheme_char(c: u8) -> bool {
    SCHEME_CHAR[c as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_char() {
        for c in b"abcXYZ019-._~:/?#[]@!$&'()*+,;=%" {
            assert!(is_url_char(*c), "{} should be legal", *c as char);
        }
        for c in b" \"<>\\^`{|}" {
            assert!(!is_url_char(*c), "{} should be illegal", *c as char);
        }
        assert!(!is_url_char(0));
        assert!(!is_url_char(b'\t'));
        assert!(!is_url_char(0x7f));
        assert!(!is_url_char(0xc3));
    }

    #[test]
    fn test_separator() {
        assert!(is_separator(0));
        for c in b"/?&=:^!@[]{}| " {
            assert!(is_separator(*c), "{} should separate", *c as char);
        }
        for c in b"azAZ09_-.%" {
            assert!(!is_separator(*c), "{} should not separate", *c as char);
        }
        assert!(!is_separator(0xe3));
    }

    #[test]
    fn test_scheme_char() {
        for c in b"httpsHTTPS09+-." {
            assert!(is_scheme_char(*c));
        }
        for c in b":/@_ " {
            assert!(!is_scheme_char(*c));
        }
        assert!(!is_scheme_char(0));
    }
}
