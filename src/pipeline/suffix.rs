//! Built-in steps for trailing site-name suffixes.
//!
//! Page titles often carry the publisher after a separator:
//! `"Some headline | Healthcare IT News"` or
//! `"Some headline - The Wall Street Journal"`. The steps here either strip
//! that suffix or only report that it is there.
//!
//! Every pattern is anchored to end-of-text and removes everything from the
//! **first** separator onward, so each strip is idempotent: its output never
//! contains the separator again.
//!
//! Audit messages quote titles with [`quote`], which escapes the same way as
//! Go's `%q` so log lines stay comparable with existing tooling.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::{Auditor, Context, FnStep, Step, TransformStep};

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

/// Matches `" | Healthcare IT News"` in `"xyz title | Healthcare IT News"`.
static PIPE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \| .*$").expect("pipe suffix regex must compile"));

/// Matches `" - The Wall Street Journal"` in `"xyz title - The Wall Street Journal"`.
///
/// Hyphens inside words (`hyphen-nated`) have no surrounding spaces and are
/// never matched.
static HYPHEN_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" - .*$").expect("hyphen suffix regex must compile"));

/// Matches the shortest prefix ending in a sentence terminator.
static FIRST_SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)[.?!]").expect("first sentence regex must compile"));

// ---------------------------------------------------------------------------
// Message quoting
// ---------------------------------------------------------------------------

/// Double-quote `text` for an audit message.
///
/// Printable characters pass through. Quotes and backslashes get a backslash,
/// the usual C escapes (`\n`, `\t`, ...) are used where they exist, and any
/// other non-printable character becomes `\xNN` (ASCII), `\uNNNN` or
/// `\UNNNNNNNN` in lowercase hex.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if is_printable(c) => out.push(c),
            c if c < ' ' || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if (c as u32) < 0x10000 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
        }
    }
    out.push('"');
    out
}

/// Control characters and separators other than the ASCII space are not
/// printable, nor are the zero-width and tag format characters.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !(c.is_control()
        || c.is_whitespace()
        || matches!(
            c,
            '\u{ad}'
                | '\u{200b}'..='\u{200f}'
                | '\u{2060}'..='\u{2064}'
                | '\u{feff}'
                | '\u{e0000}'..='\u{e007f}'
        ))
}

// ---------------------------------------------------------------------------
// Strip steps
// ---------------------------------------------------------------------------

/// Remove everything from the first `" | "` to the end of the text.
pub fn remove_piped_suffix(ctx: &Context, from: &str, audit: &mut Auditor<'_>) -> String {
    let result = PIPE_SUFFIX_RE.replace(from, "");
    if result != from {
        audit.emit_with(ctx, || {
            format!("Removed piped suffix from {}, now {}", quote(from), quote(&result))
        });
    }
    result.into_owned()
}

/// Remove everything from the first `" - "` to the end of the text.
///
/// `"a - b - c"` becomes `"a"`: the match is leftmost and runs to the end.
pub fn remove_hyphenated_suffix(ctx: &Context, from: &str, audit: &mut Auditor<'_>) -> String {
    let result = HYPHEN_SUFFIX_RE.replace(from, "");
    if result != from {
        audit.emit_with(ctx, || {
            format!("Removed hyphen suffix from {}, now {}", quote(from), quote(&result))
        });
    }
    result.into_owned()
}

/// Truncate the text just after its first `.`, `?` or `!`.
pub fn keep_first_sentence(ctx: &Context, from: &str, audit: &mut Auditor<'_>) -> String {
    let Some(found) = FIRST_SENTENCE_RE.find(from) else {
        return from.to_string();
    };

    let result = found.as_str();
    if result != from {
        audit.emit_with(ctx, || {
            format!("Kept first sentence of {}, now {}", quote(from), quote(result))
        });
    }
    result.to_string()
}

// ---------------------------------------------------------------------------
// Audit-only steps
// ---------------------------------------------------------------------------

/// Report a `" - "` suffix without changing the text.
pub fn warn_hyphenated_suffix(ctx: &Context, from: &str, audit: &mut Auditor<'_>) -> String {
    if HYPHEN_SUFFIX_RE.is_match(from) {
        audit.emit_with(ctx, || format!("Hyphenated suffix found in {}", quote(from)));
    }
    from.to_string()
}

/// Report a `" | "` suffix without changing the text.
pub fn warn_piped_suffix(ctx: &Context, from: &str, audit: &mut Auditor<'_>) -> String {
    if PIPE_SUFFIX_RE.is_match(from) {
        audit.emit_with(ctx, || format!("Piped suffix found in {}", quote(from)));
    }
    from.to_string()
}

// ---------------------------------------------------------------------------
// Boxed constructors
// ---------------------------------------------------------------------------

pub fn pipe_step() -> Step {
    FnStep::named("pipe", remove_piped_suffix).boxed()
}

pub fn hyphen_step() -> Step {
    FnStep::named("hyphen", remove_hyphenated_suffix).boxed()
}

pub fn warn_hyphen_step() -> Step {
    FnStep::named("warn-hyphen", warn_hyphenated_suffix).boxed()
}

pub fn warn_pipe_step() -> Step {
    FnStep::named("warn-pipe", warn_piped_suffix).boxed()
}

pub fn first_sentence_step() -> Step {
    FnStep::named("first-sentence", keep_first_sentence).boxed()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    type StepFn = fn(&Context, &str, &mut Auditor<'_>) -> String;

    /// Run one step function directly and collect its audit messages.
    fn apply(step: StepFn, input: &str) -> (String, Vec<String>) {
        let ctx = Context::background();
        let mut messages = Vec::new();
        let mut sink = |_: &Context, message: &str| messages.push(message.to_string());
        let result = {
            let mut auditor = Auditor::new(Some(&mut sink));
            step(&ctx, input, &mut auditor)
        };
        (result, messages)
    }

    #[test]
    fn pipe_strip_removes_suffix() {
        let (result, messages) = apply(remove_piped_suffix, "title | Source Name");
        assert_eq!(result, "title");
        assert_eq!(
            messages,
            vec![r#"Removed piped suffix from "title | Source Name", now "title""#]
        );
    }

    #[test]
    fn pipe_strip_cuts_at_first_pipe() {
        let (result, messages) = apply(remove_piped_suffix, "a | b | c");
        assert_eq!(result, "a");
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn pipe_without_spaces_is_not_a_separator() {
        let (result, messages) = apply(remove_piped_suffix, "a|b and c |d");
        assert_eq!(result, "a|b and c |d");
        assert!(messages.is_empty());
    }

    #[test]
    fn hyphen_strip_cuts_at_first_separator() {
        let (result, messages) = apply(remove_hyphenated_suffix, "a - b - c");
        assert_eq!(result, "a");
        assert_eq!(
            messages,
            vec![r#"Removed hyphen suffix from "a - b - c", now "a""#]
        );
    }

    #[test]
    fn hyphen_strip_ignores_word_hyphens() {
        let (result, messages) = apply(remove_hyphenated_suffix, "well-known - Site");
        assert_eq!(result, "well-known");
        assert_eq!(messages.len(), 1);

        let (result, messages) = apply(remove_hyphenated_suffix, "well-known self-evident");
        assert_eq!(result, "well-known self-evident");
        assert!(messages.is_empty());
    }

    #[test]
    fn separator_before_a_line_break_does_not_match() {
        let input = "headline - site\nsecond line";
        let (result, messages) = apply(remove_hyphenated_suffix, input);
        assert_eq!(result, input);
        assert!(messages.is_empty());
    }

    #[test]
    fn message_quotes_escape_embedded_quotes() {
        let (_, messages) = apply(warn_hyphenated_suffix, r#"say "hi" - Site"#);
        assert_eq!(messages, vec![r#"Hyphenated suffix found in "say \"hi\" - Site""#]);
    }

    #[test]
    fn message_quotes_escape_control_characters_as_hex() {
        let (_, messages) = apply(warn_hyphenated_suffix, "a\0\x1b - b");
        assert_eq!(messages, vec![r#"Hyphenated suffix found in "a\x00\x1b - b""#]);
    }

    #[test]
    fn quote_matches_go_escapes() {
        assert_eq!(quote(""), r#""""#);
        assert_eq!(quote("plain title"), r#""plain title""#);
        assert_eq!(quote(r"back\slash"), r#""back\\slash""#);
        assert_eq!(quote("tab\tnl\ncr\r"), r#""tab\tnl\ncr\r""#);
        assert_eq!(quote("\u{07}\u{08}\u{0c}\u{0b}"), r#""\a\b\f\v""#);
        assert_eq!(quote("del\u{7f}"), r#""del\x7f""#);
        assert_eq!(quote("c1\u{85}"), r#""c1\u0085""#);
        assert_eq!(quote("nbsp\u{a0}zw\u{200b}"), r#""nbsp\u00a0zw\u200b""#);
        assert_eq!(quote("\u{e0001}"), r#""\U000e0001""#);
        assert_eq!(quote("café ünïcödé 日本"), r#""café ünïcödé 日本""#);
    }

    #[test]
    fn warn_hyphen_reports_without_changing() {
        let input = "headline - Site";
        let (result, messages) = apply(warn_hyphenated_suffix, input);
        assert_eq!(result, input);
        assert_eq!(messages, vec![r#"Hyphenated suffix found in "headline - Site""#]);

        let (result, messages) = apply(warn_hyphenated_suffix, "headline | Site");
        assert_eq!(result, "headline | Site");
        assert!(messages.is_empty());
    }

    #[test]
    fn warn_pipe_reports_without_changing() {
        let (result, messages) = apply(warn_piped_suffix, "headline | Site");
        assert_eq!(result, "headline | Site");
        assert_eq!(messages, vec![r#"Piped suffix found in "headline | Site""#]);
    }

    #[test]
    fn first_sentence_keeps_terminator() {
        let (result, messages) = apply(keep_first_sentence, "Hello there. More text! End?");
        assert_eq!(result, "Hello there.");
        assert_eq!(
            messages,
            vec![r#"Kept first sentence of "Hello there. More text! End?", now "Hello there.""#]
        );
    }

    #[test]
    fn first_sentence_without_terminator_is_silent() {
        let (result, messages) = apply(keep_first_sentence, "no terminator here");
        assert_eq!(result, "no terminator here");
        assert!(messages.is_empty());

        let (result, messages) = apply(keep_first_sentence, "Already one sentence.");
        assert_eq!(result, "Already one sentence.");
        assert!(messages.is_empty());
    }

    #[test]
    fn empty_input_is_untouched_by_every_step() {
        let steps: [StepFn; 5] = [
            remove_piped_suffix,
            remove_hyphenated_suffix,
            keep_first_sentence,
            warn_hyphenated_suffix,
            warn_piped_suffix,
        ];
        for step in steps {
            let (result, messages) = apply(step, "");
            assert_eq!(result, "");
            assert!(messages.is_empty());
        }
    }

    #[test]
    fn boxed_constructors_carry_names() {
        assert_eq!(pipe_step().name(), "pipe");
        assert_eq!(hyphen_step().name(), "hyphen");
        assert_eq!(warn_hyphen_step().name(), "warn-hyphen");
        assert_eq!(warn_pipe_step().name(), "warn-pipe");
        assert_eq!(first_sentence_step().name(), "first-sentence");
    }
}
