//! Character classes shared by the scanner and the emitter.
//!
//! The scanner represents end of input as `'\0'`, so `is_z` doubles as the EOF check.

#[inline]
pub(crate) fn is_z(c: char) -> bool {
    c == '\0'
}

#[inline]
pub(crate) fn is_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

#[inline]
pub(crate) fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

#[inline]
pub(crate) fn is_breakz(c: char) -> bool {
    is_break(c) || is_z(c)
}

#[inline]
pub(crate) fn is_blankz(c: char) -> bool {
    is_blank(c) || is_breakz(c)
}

#[inline]
pub(crate) fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Characters allowed in anchor and alias names, and in tag handles.
#[inline]
pub(crate) fn is_alpha(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' | '-')
}

#[inline]
pub(crate) fn is_flow(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

#[inline]
pub(crate) fn as_hex(c: char) -> Option<u32> {
    c.to_digit(16)
}

/// Characters permitted in a tag URI (besides `%`-escapes).
#[inline]
pub(crate) fn is_uri_char(c: char) -> bool {
    is_alpha(c)
        || matches!(
            c,
            ';' | '/' | '?' | ':' | '@' | '&' | '=' | '+' | '$' | ',' | '.' | '!' | '~' | '*'
                | '\'' | '(' | ')' | '[' | ']' | '%'
        )
}

/// YAML's printable set: what may appear unescaped in a YAML stream.
#[inline]
pub(crate) fn is_printable(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{7E}' | '\u{85}'
        | '\u{A0}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
        && c != '\u{FEFF}'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert!(is_blankz('\0'));
        assert!(is_breakz('\u{2028}'));
        assert!(is_alpha('-') && is_alpha('_') && !is_alpha(' '));
        assert_eq!(as_hex('f'), Some(15));
        assert_eq!(as_hex('g'), None);
        assert!(!is_printable('\u{7}'));
        assert!(!is_printable('\u{FEFF}'));
        assert!(is_printable('é'));
    }
}
