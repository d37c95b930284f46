//! Source snippets for diagnostics, rendered with `annotate-snippets`.

use annotate_snippets::{
    AnnotationKind, Level, Renderer, Snippet as AnnotateSnippet, renderer::DecorStyle,
};

use crate::Mark;
use crate::chars::is_break;

/// Lines of context shown above and below the error line.
const CONTEXT_LINES: usize = 2;

/// Render `msg` with a window of `text` around `mark`.
///
/// Returns `None` when the mark lies outside `text` (for example when the error was raised
/// for a different input than the one supplied).
#[cold]
#[inline(never)]
pub(crate) fn render(
    msg: &str,
    mark: &Mark,
    text: &str,
    path: &str,
    crop_radius: usize,
) -> Option<String> {
    if mark.is_empty() {
        return None;
    }
    // Marks are computed after the scanner skipped the BOM.
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let lines = source_lines(text);

    let row = mark.line();
    if row > lines.len() {
        return None;
    }
    let col = mark.column().max(1);
    let first = row.saturating_sub(CONTEXT_LINES).max(1);
    let last = row.saturating_add(CONTEXT_LINES).min(lines.len());

    let (left, right) = if crop_radius == 0 {
        (1, usize::MAX)
    } else {
        (
            col.saturating_sub(crop_radius).max(1),
            col.saturating_add(crop_radius),
        )
    };

    let mut window = String::new();
    let mut span = 0..0;
    for r in first..=last {
        let line_start = window.len();
        let (rendered, caret) = crop_line(lines[r - 1], left, right, col);
        window.push_str(&rendered);
        if r == row {
            let start = line_start + caret;
            let end = rendered[caret..]
                .chars()
                .next()
                .map_or(start, |c| start + c.len_utf8());
            span = start..end;
        }
        if r < last {
            window.push('\n');
        }
    }

    let report = &[Level::ERROR
        .primary_title(format!("line {row} column {col}: {msg}"))
        .element(
            AnnotateSnippet::source(&window)
                .line_start(first)
                .path(path)
                .fold(false)
                .annotation(AnnotationKind::Primary.span(span).label(msg)),
        )];

    // Plain ASCII decorations keep `Display` output stable and free of escape sequences.
    let renderer = Renderer::plain().decor_style(DecorStyle::Ascii);
    Some(renderer.render(report).to_string())
}

/// Split `text` at every break that advances the scanner's line count: `\n`, `\r\n`, a
/// lone `\r`, NEL, LS and PS.
fn source_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !is_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' && chars.next_if(|&(_, n)| n == '\n').is_some() {
            start += 1;
        }
    }
    lines.push(&text[start..]);
    lines
}

/// Crop `line` to the 1-based column window `[left, right]`, marking cut ends with `…`,
/// and neutralize control characters.
///
/// Returns the rendered line and the byte offset of column `col` within it, clamped to
/// the end of the line.
fn crop_line(line: &str, left: usize, right: usize, col: usize) -> (String, usize) {
    let len = line.chars().count();
    // Short context lines that would crop to nothing are left intact.
    let (left, right) = if left > len { (1, usize::MAX) } else { (left, right) };

    let mut out = String::with_capacity(line.len().min(512));
    if left > 1 {
        out.push('…');
    }
    let mut caret = None;
    for (i, ch) in line.chars().enumerate() {
        let c = i + 1;
        if c < left {
            continue;
        }
        if c > right {
            out.push('…');
            break;
        }
        if c == col {
            caret = Some(out.len());
        }
        out.push(if ch.is_control() && ch != '\t' { ' ' } else { ch });
    }
    let caret = caret.unwrap_or(out.len());
    (out, caret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_window_with_caret() {
        let text = "a: 1\nb: [\nc: 3\n";
        let out = render("unterminated", &Mark::new(8, 2, 4), text, "<input>", 0)
            .expect("mark is inside the text");
        assert!(out.contains("line 2 column 4: unterminated"), "{out}");
        assert!(out.contains("b: ["), "{out}");
        assert!(out.contains('^'), "{out}");
    }

    #[test]
    fn crops_long_lines() {
        let (line, caret) = crop_line("0123456789abcdef", 5, 9, 7);
        assert_eq!(line, "…45678…");
        assert_eq!(&line[caret..caret + 1], "6");
    }

    #[test]
    fn lines_split_like_the_scanner() {
        assert_eq!(
            source_lines("a\r\nb\rc\u{85}d\u{2028}e\u{2029}f\n"),
            ["a", "b", "c", "d", "e", "f", ""]
        );
        let out = render("here", &Mark::new(5, 2, 4), "a: 1\rb: *x\u{2028}c: 3", "<input>", 0)
            .expect("mark is inside the text");
        assert!(out.contains("b: *x"), "{out}");
        assert!(!out.contains("a: 1b"), "{out}");
    }

    #[test]
    fn out_of_range_mark_gives_none() {
        assert!(render("x", &Mark::new(0, 9, 1), "a\n", "<input>", 0).is_none());
        assert!(render("x", &Mark::EMPTY, "a\n", "<input>", 0).is_none());
    }
}
