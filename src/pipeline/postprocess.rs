//! Post-processing: deterministic cleanup of the rendered post body.
//!
//! Notion text regularly carries Windows line endings pasted from other
//! tools, zero-width spaces and BOMs copied from web pages, and runs of
//! empty paragraphs used as spacers. note.com's editor renders all of them
//! badly, so the formatter's output goes through these passes:
//!
//! 1. Normalise line endings (CRLF / CR → LF)
//! 2. Strip invisible Unicode (zero-width space, BOM, soft hyphen, word joiner)
//! 3. Trim trailing whitespace per line
//! 4. Collapse runs of blank lines to a single blank line
//! 5. Ensure the body ends with exactly one newline
//!
//! Passes 2 to 4 leave fenced code blocks untouched. Zero-width joiners and
//! non-joiners are kept: emoji sequences and scripts depend on them.

/// Apply every cleanup pass in order.
pub fn clean_body(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = tidy_lines_outside_fences(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{2060}'], "")
}

// ── Rules 2-4 per line, fences skipped ───────────────────────────────────────

/// Length of the backtick run opening a fence, if `line` opens one.
fn fence_len(line: &str) -> Option<usize> {
    let ticks = line.trim_start().chars().take_while(|&c| c == '`').count();
    (ticks >= 3).then_some(ticks)
}

/// A fence closes on a line of backticks at least as long as its opener.
fn closes_fence(line: &str, open: usize) -> bool {
    let t = line.trim();
    t.len() >= open && t.chars().all(|c| c == '`')
}

fn tidy_lines_outside_fences(input: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut fence: Option<usize> = None;
    let mut previous_blank = false;

    for line in input.lines() {
        if let Some(open) = fence {
            out.push(line.to_string());
            if closes_fence(line, open) {
                fence = None;
            }
            previous_blank = false;
            continue;
        }

        let cleaned = remove_invisible_chars(line);
        let trimmed = cleaned.trim_end();
        if trimmed.is_empty() {
            if previous_blank {
                continue;
            }
            previous_blank = true;
            out.push(String::new());
            continue;
        }

        previous_blank = false;
        fence = fence_len(trimmed);
        out.push(trimmed.to_string());
    }

    out.join("\n")
}

// ── Rule 5: Ensure body ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed.trim_start_matches('\n'))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn test_trailing_whitespace_trimmed_outside_fences() {
        let input = "text   \n```rust\nlet x = 1;   \n```\nmore  ";
        assert_eq!(
            tidy_lines_outside_fences(input),
            "text\n```rust\nlet x = 1;   \n```\nmore"
        );
    }

    #[test]
    fn test_blank_runs_collapsed() {
        let input = "a\n\n\n\n\nb";
        assert_eq!(tidy_lines_outside_fences(input), "a\n\nb");
    }

    #[test]
    fn test_blank_runs_kept_inside_fences() {
        let input = "```\nx\n\n\n\ny\n```";
        assert_eq!(tidy_lines_outside_fences(input), input);
    }

    #[test]
    fn test_joiners_kept() {
        let input = "\u{1F468}\u{200D}\u{1F4BB} ok\u{200C}";
        assert_eq!(clean_body(input), format!("{input}\n"));
    }

    #[test]
    fn test_fenced_code_untouched() {
        let input = "x\u{200B}\n```\na\u{200B}b\u{FEFF}\n```\n";
        assert_eq!(clean_body(input), "x\n```\na\u{200B}b\u{FEFF}\n```\n");
    }

    #[test]
    fn test_longer_fence_not_closed_by_shorter_run() {
        let input = "````\n```\n\n\n\nx  \n````\nafter  ";
        assert_eq!(
            tidy_lines_outside_fences(input),
            "````\n```\n\n\n\nx  \n````\nafter"
        );
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn test_clean_body_full_pipeline() {
        let input = "# Title\r\n\r\n\r\n\r\nSome\u{200B} text   \n\n\n\n";
        assert_eq!(clean_body(input), "# Title\n\nSome text\n");
    }

    #[test]
    fn test_clean_body_is_idempotent() {
        let input = "a  \n\n\n\nb\n```\n  c  \n```\n";
        let once = clean_body(input);
        assert_eq!(clean_body(&once), once);
    }
}
