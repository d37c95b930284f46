//! Which presentation styles a scalar value can take.

use crate::chars::{is_blankz, is_break, is_printable};

/// Style permissions for one scalar value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScalarAnalysis {
    pub multiline: bool,
    pub flow_plain_allowed: bool,
    pub block_plain_allowed: bool,
    pub single_quoted_allowed: bool,
    pub block_allowed: bool,
}

/// Inspect `value` character by character.
///
/// With `unicode` off, any non-ASCII character forces double quotes so it can be escaped.
pub(crate) fn analyze(value: &str, unicode: bool) -> ScalarAnalysis {
    if value.is_empty() {
        return ScalarAnalysis {
            multiline: false,
            flow_plain_allowed: false,
            block_plain_allowed: true,
            single_quoted_allowed: true,
            block_allowed: false,
        };
    }

    let mut block_indicators = false;
    let mut flow_indicators = false;
    let mut line_breaks = false;
    let mut special_characters = false;

    let mut leading_space = false;
    let mut leading_break = false;
    let mut trailing_space = false;
    let mut trailing_break = false;
    let mut break_space = false;
    let mut space_break = false;

    let mut previous_space = false;
    let mut previous_break = false;

    if value.starts_with("---") || value.starts_with("...") {
        block_indicators = true;
        flow_indicators = true;
    }

    let chars: Vec<char> = value.chars().collect();
    let mut preceded_by_whitespace = true;

    for (i, &c) in chars.iter().enumerate() {
        let first = i == 0;
        let last = i + 1 == chars.len();
        let followed_by_whitespace = is_blankz(chars.get(i + 1).copied().unwrap_or('\0'));

        if first {
            match c {
                '#' | ',' | '[' | ']' | '{' | '}' | '&' | '*' | '!' | '|' | '>' | '\'' | '"'
                | '%' | '@' | '`' => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                '?' | ':' => {
                    flow_indicators = true;
                    if followed_by_whitespace {
                        block_indicators = true;
                    }
                }
                '-' if followed_by_whitespace => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                _ => {}
            }
        } else {
            match c {
                ',' | '?' | '[' | ']' | '{' | '}' => flow_indicators = true,
                ':' => {
                    flow_indicators = true;
                    if followed_by_whitespace {
                        block_indicators = true;
                    }
                }
                '#' if preceded_by_whitespace => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                _ => {}
            }
        }

        // Tabs and every break except `\n` survive only as double-quoted escapes.
        if !is_printable(c)
            || c == '\t'
            || (is_break(c) && c != '\n')
            || (!c.is_ascii() && !unicode)
        {
            special_characters = true;
        }
        if is_break(c) {
            line_breaks = true;
        }

        if c == ' ' {
            if first {
                leading_space = true;
            }
            if last {
                trailing_space = true;
            }
            if previous_break {
                break_space = true;
            }
            previous_space = true;
            previous_break = false;
        } else if is_break(c) {
            if first {
                leading_break = true;
            }
            if last {
                trailing_break = true;
            }
            if previous_space {
                space_break = true;
            }
            previous_break = true;
            previous_space = false;
        } else {
            previous_space = false;
            previous_break = false;
        }

        preceded_by_whitespace = is_blankz(c);
    }

    let mut analysis = ScalarAnalysis {
        multiline: line_breaks,
        flow_plain_allowed: true,
        block_plain_allowed: true,
        single_quoted_allowed: true,
        block_allowed: true,
    };

    if leading_space || leading_break || trailing_space || trailing_break {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
    }
    if trailing_space {
        analysis.block_allowed = false;
    }
    if break_space {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
        analysis.single_quoted_allowed = false;
    }
    if space_break || special_characters {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
        analysis.single_quoted_allowed = false;
        analysis.block_allowed = false;
    }
    if line_breaks {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
    }
    if flow_indicators {
        analysis.flow_plain_allowed = false;
    }
    if block_indicators {
        analysis.block_plain_allowed = false;
    }
    analysis
}

/// True if `value`, written plain, would be read back as something other than a string.
///
/// The table is fixed: empty, `~`, null, YAML 1.1 and 1.2 booleans in any ASCII case,
/// integers (decimal, `0x`, `0o`, `0b`, signed, `_` separators), floats with optional
/// exponent, and the `.inf`/`.nan` family.
pub(crate) fn is_ambiguous(value: &str) -> bool {
    const WORDS: [&str; 9] = ["null", "true", "false", "yes", "no", "on", "off", "y", "n"];
    if value.is_empty() || value == "~" {
        return true;
    }
    if WORDS.iter().any(|w| value.eq_ignore_ascii_case(w)) {
        return true;
    }
    if matches!(
        value.to_ascii_lowercase().as_str(),
        ".inf" | "-.inf" | "+.inf" | ".nan"
    ) {
        return true;
    }
    looks_numeric(value)
}

fn looks_numeric(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if let (Some(prefix), Some(digits)) = (unsigned.get(..2), unsigned.get(2..)) {
        let radix = match prefix.to_ascii_lowercase().as_str() {
            "0x" => Some(16),
            "0o" => Some(8),
            "0b" => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix) || c == '_');
        }
    }

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(pos) => (&unsigned[..pos], Some(&unsigned[pos + 1..])),
        None => (unsigned, None),
    };
    let mut digits = 0;
    let mut dots = 0;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '_' if digits > 0 => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }
    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_ambiguous() {
        for v in [
            "", "~", "null", "Null", "NULL", "true", "False", "YES", "no", "On", "off", "y", "N",
        ] {
            assert!(is_ambiguous(v), "{v:?} should be ambiguous");
        }
    }

    #[test]
    fn numbers_are_ambiguous() {
        for v in [
            "0", "-12", "+7", "1_000", "0x1F", "0o17", "0b101", "3.14", ".5", "5.", "1e10",
            "-2.5E-3", ".inf", "-.Inf", "+.INF", ".NaN",
        ] {
            assert!(is_ambiguous(v), "{v:?} should be ambiguous");
        }
    }

    #[test]
    fn ordinary_strings_are_not_ambiguous() {
        for v in [
            "PandaTea", "yesterday", "0x", "1.2.3", "e5", "12abc", "00:00:00", "nul", "-", ".",
        ] {
            assert!(!is_ambiguous(v), "{v:?} should not be ambiguous");
        }
    }

    #[test]
    fn plain_allowed_for_simple_words() {
        let a = analyze("hello world", true);
        assert!(a.flow_plain_allowed && a.block_plain_allowed && !a.multiline);
    }

    #[test]
    fn indicators_block_plain() {
        assert!(!analyze("- item", true).block_plain_allowed);
        assert!(analyze("-item", true).block_plain_allowed);
        assert!(!analyze("a: b", true).block_plain_allowed);
        assert!(analyze("a:b", true).block_plain_allowed);
        assert!(!analyze("a:b", true).flow_plain_allowed);
        assert!(!analyze("a #b", true).block_plain_allowed);
        assert!(analyze("a#b", true).block_plain_allowed);
        assert!(!analyze("---", true).block_plain_allowed);
        assert!(!analyze("&x", true).block_plain_allowed);
    }

    #[test]
    fn whitespace_edges() {
        let a = analyze(" lead", true);
        assert!(!a.block_plain_allowed && a.single_quoted_allowed);
        let a = analyze("trail ", true);
        assert!(!a.block_plain_allowed && !a.block_allowed);
    }

    #[test]
    fn multiline_and_specials() {
        let a = analyze("one\ntwo", true);
        assert!(a.multiline && !a.block_plain_allowed && a.block_allowed);
        let a = analyze("tab\there", true);
        assert!(!a.single_quoted_allowed && !a.block_allowed);
        let a = analyze("héllo", false);
        assert!(!a.single_quoted_allowed);
        assert!(analyze("héllo", true).block_plain_allowed);
    }

    #[test]
    fn non_ascii_words_are_not_numbers() {
        for v in ["€x", "日本", "-€", "0€", "é"] {
            assert!(!is_ambiguous(v), "{v:?} should not be ambiguous");
        }
    }

    #[test]
    fn unicode_breaks_need_double_quotes() {
        for v in ["a\u{85}b", "a\u{2028}b", "\u{2029}", "a\rb"] {
            let a = analyze(v, true);
            assert!(
                !a.block_plain_allowed && !a.flow_plain_allowed,
                "{v:?} must not be plain"
            );
            assert!(!a.single_quoted_allowed && !a.block_allowed, "{v:?} needs escapes");
        }
        let a = analyze("a\nb", true);
        assert!(a.single_quoted_allowed && a.block_allowed);
    }

    #[test]
    fn empty_value() {
        let a = analyze("", true);
        assert!(a.block_plain_allowed && !a.flow_plain_allowed && !a.block_allowed);
    }
}
