// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Joining continuation lines into one logical string, and wrapping a
//! logical string back into prefixed lines.
//!
//! For any trimmed, single-line `text` that doesn't start with a delimiter
//! the join pattern would strip, joining the output of `wrap_lines` gives
//! back `text` exactly.

use regex::Regex;

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Concatenates raw lines into one logical string.
///
/// Each line loses its terminator, a leading match of `head` and
/// surrounding whitespace; the last line also loses a trailing match of
/// `tail`.  A trailing `\` on any line but the last is a continuation
/// marker and is dropped too.  The remaining non-empty pieces are joined
/// with single spaces.
pub fn join_lines<S: AsRef<str>>(lines: &[S], head: Option<&Regex>, tail: Option<&Regex>) -> String {
    let mut pieces: Vec<&str> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let mut line = strip_terminator(line.as_ref());
        if let Some(head) = head
            && let Some(m) = head.find(line)
            && m.start() == 0
        {
            line = &line[m.end()..];
        }
        if i + 1 == lines.len()
            && let Some(tail) = tail
            && let Some(m) = tail.find(line)
            && m.end() == line.len()
        {
            line = &line[..m.start()];
        }
        let mut line = line.trim();
        if i + 1 < lines.len()
            && let Some(continued) = line.strip_suffix('\\')
        {
            line = continued.trim_end();
        }
        if !line.is_empty() {
            pieces.push(line);
        }
    }

    pieces.join(" ")
}

fn width(s: &str) -> usize {
    s.chars().count()
}

/// Byte offsets of the spaces `wrap_lines` may replace with a line break.
///
/// A break must not change what joining reads back, so we only break at a
/// single space between two non-blank characters, never before a `~` or
/// `|` (they would read as delimiters), never after a `\` (it would read as
/// a continuation) or a `|`, and never inside a quoted name.
fn break_points(text: &str) -> Vec<usize> {
    let mut points = Vec::new();
    let mut in_quote = false;
    let mut escaped = false;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);
        if in_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quote = false;
            }
        } else if c == '"' {
            in_quote = true;
        } else if c == ' '
            && let (Some(p), Some(n)) = (prev, next)
            && !p.is_whitespace()
            && p != '\\'
            && p != '|'
            && !n.is_whitespace()
            && n != '~'
            && n != '|'
        {
            points.push(i);
        }
        prev = Some(c);
    }

    points
}

/// Re-flows `text` into lines of at most `max_width` characters, counting
/// the prefix, breaking only at spaces.  The first line starts with
/// `first_prefix` and every other line with `other_prefix`.  A run with no
/// usable break stays on one overlong line.
pub fn wrap_lines(text: &str, max_width: usize, first_prefix: &str, other_prefix: &str) -> Vec<String> {
    let breaks = break_points(text);
    let mut lines = Vec::new();
    let mut start = 0;
    let mut prefix = first_prefix;

    loop {
        let budget = max_width.saturating_sub(width(prefix));
        let rest = &text[start..];
        if width(rest) <= budget {
            lines.push(format!("{prefix}{rest}"));
            return lines;
        }

        let mut chosen = None;
        for &b in breaks.iter().filter(|&&b| b > start) {
            if width(&text[start..b]) <= budget || chosen.is_none() {
                chosen = Some(b);
            }
            if width(&text[start..b]) > budget {
                break;
            }
        }

        match chosen {
            Some(b) => {
                lines.push(format!("{prefix}{}", &text[start..b]));
                start = b + 1;
                prefix = other_prefix;
            }
            None => {
                lines.push(format!("{prefix}{rest}"));
                return lines;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_join_strips_and_collapses() {
        let lines = [" INTEG (\n", "\tbirths - deaths,\n", "\t\t100)\n"];
        assert_eq!("INTEG ( births - deaths, 100)", join_lines(&lines, None, None));
    }

    #[test]
    fn test_join_head_and_tail() {
        let head = Regex::new(r"^\s*~?").unwrap();
        let tail = Regex::new(r"\s*\|\s*$").unwrap();
        let lines = ["\t~\tThe number of\r\n", "\t\tpeople.\r\n", "\t|\r\n"];
        assert_eq!(
            "The number of people.",
            join_lines(&lines, Some(&head), Some(&tail))
        );
        assert_eq!("", join_lines(&["\t~\t\t|\n"], Some(&head), Some(&tail)));
    }

    #[test]
    fn test_join_tail_only_on_last_line() {
        let tail = Regex::new(r"\s*\|\s*$").unwrap();
        let lines = ["choose a|\n", "or b |\n", "\t|\n"];
        assert_eq!("choose a| or b |", join_lines(&lines, None, Some(&tail)));
        assert_eq!("x", join_lines(&["x |\n"], None, Some(&tail)));
    }

    #[test]
    fn test_join_backslash_continuation() {
        let lines = ["very long\\\n", "\t\tname + 1\n"];
        assert_eq!("very long name + 1", join_lines(&lines, None, None));
        // a backslash ending the last line is content
        assert_eq!("C:\\", join_lines(&["C:\\"], None, None));
    }

    #[test]
    fn test_join_empty() {
        let lines: [&str; 0] = [];
        assert_eq!("", join_lines(&lines, None, None));
        assert_eq!("", join_lines(&["\n", "\t\n"], None, None));
    }

    #[test]
    fn test_wrap_short() {
        assert_eq!(vec!["\ta + b"], wrap_lines("a + b", 80, "\t", "\t\t"));
        assert_eq!(vec!["\t~\t"], wrap_lines("", 80, "\t~\t", "\t\t"));
    }

    #[test]
    fn test_wrap_breaks_at_spaces() {
        let lines = wrap_lines("aaaa bbbb cccc dddd", 11, "\t", "\t\t");
        assert_eq!(vec!["\taaaa bbbb", "\t\tcccc dddd"], lines);
        for line in &lines {
            assert!(width(line) <= 11);
        }
    }

    #[test]
    fn test_wrap_overlong_word() {
        let lines = wrap_lines("abcdefghijklmnop q", 8, "", "");
        assert_eq!(vec!["abcdefghijklmnop", "q"], lines);
    }

    #[test]
    fn test_wrap_respects_quotes_and_delimiters() {
        assert_eq!(
            vec!["\"a b c d\"", "e"],
            wrap_lines("\"a b c d\" e", 4, "", "")
        );
        assert_eq!(vec!["aa ~b", "c"], wrap_lines("aa ~b c", 3, "", ""));
        assert_eq!(vec!["a\\ b"], wrap_lines("a\\ b", 2, "", ""));
        assert_eq!(vec!["a| b"], wrap_lines("a| b", 2, "", ""));
    }

    #[test]
    fn test_wrap_keeps_double_spaces() {
        let lines = wrap_lines("aa  bb cc", 6, "", "");
        assert_eq!(vec!["aa  bb", "cc"], lines);
    }

    fn text() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z0-9_+*/(),.|\"-]{1,12}", 0..30).prop_flat_map(|words| {
            let n = words.len();
            prop::collection::vec(prop_oneof![Just(" "), Just("  "), Just(", ")], n).prop_map(
                move |seps| {
                    let mut out = String::new();
                    for (i, w) in words.iter().enumerate() {
                        if i > 0 {
                            out.push_str(seps[i]);
                        }
                        out.push_str(w);
                    }
                    out
                },
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn join_inverts_wrap(text in text(), width in 16usize..100) {
            let head = Regex::new(r"^\s*~?").unwrap();
            let tail = Regex::new(r"\s*\|\s*$").unwrap();
            let wrapped = wrap_lines(&text, width, "\t~\t", "\t\t");
            prop_assert_eq!(&text, &join_lines(&wrapped, Some(&head), None));

            // a comment followed by its block terminator
            let mut block = wrapped.clone();
            block.push("\t|".to_owned());
            prop_assert_eq!(&text, &join_lines(&block, Some(&head), Some(&tail)));

            let wrapped = wrap_lines(&text, width, "\t", "\t\t");
            prop_assert_eq!(&text, &join_lines(&wrapped, None, None));
        }

        #[test]
        fn wrapped_lines_fit_when_breakable(words in prop::collection::vec("[a-z]{1,8}", 1..20)) {
            let text = words.join(" ");
            for line in wrap_lines(&text, 20, "\t", "\t\t") {
                prop_assert!(width(&line) <= 20);
            }
        }
    }
}
