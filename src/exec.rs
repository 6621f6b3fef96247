//! Search helpers: last-match search, offset-preserving enumeration, and
//! pattern combination.

use crate::api::{Error, Match, Pattern, Range};
use crate::types::CaptureGroupID;
use log::debug;

/// Text size in bytes at or above which `find_last` switches from forward
/// iteration to reversing the pattern and matching once. The choice is a
/// performance trade-off only; both strategies agree on the result.
pub const LAST_MATCH_REVERSAL_THRESHOLD: usize = 16 * 1024;

pub(crate) fn find_last(pattern: &Pattern, text: &str, threshold: usize) -> Option<Match> {
    if text.len() < threshold {
        find_last_forward(pattern, text)
    } else {
        debug!(
            "last-match search over {} bytes via pattern reversal",
            text.len()
        );
        find_last_reversed(pattern, text)
    }
}

/// Iterate forward matches, keeping the last. O(n * matches), cheap for
/// small texts.
fn find_last_forward(pattern: &Pattern, text: &str) -> Option<Match> {
    let mut last = None;
    let mut start = 0;
    while let Some(m) = pattern.find_from(text, start) {
        // An empty match would never advance; surface the engine defect
        // rather than loop or silently return an empty result.
        assert!(
            !m.range.is_empty(),
            "zero-length match during forward last-match scan"
        );
        start = m.range.end;
        last = Some(m);
    }
    last
}

/// Reverse the pattern, match once against the reversed text, and map the
/// result back. O(n) regardless of how many matches precede the last one.
fn find_last_reversed(pattern: &Pattern, text: &str) -> Option<Match> {
    let backwards: String = text.chars().rev().collect();
    let m = pattern.reversed().find(&backwards)?;
    Some(m.map_reversed(text.len()))
}

/// Enumerate non-overlapping matches in ascending order, advancing one
/// character past each zero-length match so enumeration terminates.
fn for_each_match<F: FnMut(Match)>(pattern: &Pattern, text: &str, mut f: F) {
    let mut start = 0;
    while start <= text.len() {
        let m = match pattern.find_from(text, start) {
            Some(m) => m,
            None => break,
        };
        let end = m.range.end;
        let empty = m.range.is_empty();
        f(m);
        start = if empty {
            match text[end..].chars().next() {
                Some(c) => end + c.len_utf8(),
                None => break,
            }
        } else {
            end
        };
    }
}

pub(crate) fn match_ranges(pattern: &Pattern, text: &str) -> Vec<Match> {
    let mut results = Vec::new();
    for_each_match(pattern, text, |m| results.push(m));
    results
}

pub(crate) fn split_ranges(pattern: &Pattern, text: &str) -> Vec<Range> {
    let mut results = Vec::new();
    let mut prev = 0;
    for_each_match(pattern, text, |m| {
        results.push(prev..m.range.start);
        prev = m.range.end;
    });
    results.push(prev..text.len());
    results
}

/// Combine two patterns into one that matches wherever either would.
/// \return the combined pattern and the index of a marker capture group
/// which participates (capturing the empty string) exactly when \p b, not
/// \p a, produced the match. Groups keep their captures: a group of \p b
/// with index i appears in the combination at index i plus \p a's group
/// count, and backreferences inside \p b are renumbered to follow.
pub fn alternate(a: &Pattern, b: &Pattern) -> Result<(Pattern, CaptureGroupID), Error> {
    let offset = a.group_count();
    let source = format!(
        "(?:{})|(?:{})()",
        a.source(),
        renumber_backrefs(b.source(), offset)
    );
    let marker = offset + b.group_count() + 1;
    let combined = Pattern::with_flags(&source, a.flags().union(b.flags()))?;
    debug_assert_eq!(combined.group_count(), marker);
    Ok((combined, marker))
}

/// Rewrite every numeric backreference in \p source upwards by \p offset.
/// Escaped positions are copied verbatim and bracket contents have no
/// backreferences to rewrite.
fn renumber_backrefs(source: &str, offset: CaptureGroupID) -> String {
    let mut out = String::with_capacity(source.len() + 4);
    let mut chars = source.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some('1'..='9') if !in_class => {
                    let mut value: CaptureGroupID = 0;
                    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                        chars.next();
                        value = value.saturating_mul(10).saturating_add(d);
                    }
                    out.push('\\');
                    out.push_str(&(value + offset).to_string());
                }
                _ => {
                    out.push('\\');
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
            },
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(source: &str) -> Pattern {
        Pattern::new(source).unwrap()
    }

    #[test]
    fn find_last_iterates_forward() {
        let p = pattern(r"\d+");
        let m = p.find_last("12 34 56").unwrap();
        assert_eq!(m.range(), 6..8);
        assert!(p.find_last("no digits").is_none());
    }

    #[test]
    fn find_last_strategies_agree() {
        let p = pattern(r"a(\w)");
        let text = "ab xx ac xx ad";
        let forward = p.find_last_with_threshold(text, usize::MAX).unwrap();
        let reversed = p.find_last_with_threshold(text, 0).unwrap();
        assert_eq!(forward.range(), 12..14);
        assert_eq!(reversed.range(), forward.range());
        assert_eq!(reversed.group(1), forward.group(1));
        assert_eq!(forward.group(1), Some(13..14));
    }

    #[test]
    fn find_last_reversed_maps_multibyte_offsets() {
        let p = pattern("é.");
        let text = "éa xé éb";
        let forward = p.find_last_with_threshold(text, usize::MAX).unwrap();
        let reversed = p.find_last_with_threshold(text, 0).unwrap();
        assert_eq!(forward.range(), reversed.range());
        assert_eq!(&text[forward.range()], "éb");
    }

    #[test]
    #[should_panic(expected = "zero-length match")]
    fn find_last_rejects_empty_matches() {
        pattern("a*").find_last("bbb");
    }

    #[test]
    fn split_ranges_are_absolute() {
        let p = pattern(r"\d+");
        assert_eq!(p.split_ranges("a1b22c"), vec![0..1, 2..3, 5..6]);
        assert_eq!(p.split_ranges("abc"), vec![0..3]);
        assert_eq!(p.split_ranges("1ab2"), vec![0..0, 1..3, 4..4]);
    }

    #[test]
    fn match_ranges_are_absolute() {
        let p = pattern(r"\d+");
        let ranges: Vec<Range> = p.match_ranges("a1b22c").iter().map(Match::range).collect();
        assert_eq!(ranges, vec![1..2, 3..5]);
    }

    #[test]
    fn zero_length_matches_advance_by_one() {
        let p = pattern("b*");
        let ranges: Vec<Range> = p.match_ranges("abc").iter().map(Match::range).collect();
        assert_eq!(ranges, vec![0..0, 1..2, 2..2, 3..3]);
        // Splitting by an everywhere-empty pattern still terminates.
        let empty = pattern("");
        assert_eq!(empty.split_ranges("ab"), vec![0..0, 0..1, 1..2, 2..2]);
    }

    #[test]
    fn alternate_matches_either_operand() {
        let a = pattern("(a)b");
        let b = pattern("(c)d");
        let (combined, marker) = alternate(&a, &b).unwrap();
        assert_eq!(combined.source(), "(?:(a)b)|(?:(c)d)()");
        assert_eq!(marker, 3);

        let via_b = combined.find("cd").unwrap();
        assert_eq!(via_b.group(1), None);
        assert_eq!(via_b.group(2), Some(0..1));
        let marker_capture = via_b.group(marker as usize).unwrap();
        assert!(marker_capture.is_empty());

        let via_a = combined.find("ab").unwrap();
        assert_eq!(via_a.group(1), Some(0..1));
        assert_eq!(via_a.group(marker as usize), None);
    }

    #[test]
    fn alternate_renumbers_backreferences() {
        let a = pattern("(x)");
        let b = pattern(r"(y)\1");
        let (combined, marker) = alternate(&a, &b).unwrap();
        assert_eq!(combined.source(), r"(?:(x))|(?:(y)\2)()");
        assert_eq!(marker, 3);
        let m = combined.find("yy").unwrap();
        assert_eq!(m.group(2), Some(0..1));
    }

    #[test]
    fn alternate_unions_flags() {
        let a = Pattern::with_flags("a", "i").unwrap();
        let b = Pattern::with_flags("b", "m").unwrap();
        let (combined, _) = alternate(&a, &b).unwrap();
        assert_eq!(combined.flags().to_string(), "im");
    }

    #[test]
    fn renumber_skips_escapes_and_classes() {
        assert_eq!(renumber_backrefs(r"(a)\1", 2), r"(a)\3");
        assert_eq!(renumber_backrefs(r"[\1]", 2), r"[\1]");
        assert_eq!(renumber_backrefs(r"\\1", 2), r"\\1");
        assert_eq!(renumber_backrefs(r"\12", 1), r"\13");
        assert_eq!(renumber_backrefs(r"a\0b", 5), r"a\0b");
    }
}
