// Work around dead code warnings: rust-lang issue #46379
pub mod common;

// Work around dead code warnings: rust-lang issue #46379
use common::*;

use retrograde::{alternate, static_strings, Range};

#[test]
fn line_feed_reachability_scenarios() {
    assert!(!compile("a(b)c").can_match_line_feed());
    assert!(compile(r"a[\s\S]b").can_match_line_feed());
    assert!(compilef("a.b", "s").can_match_line_feed());
    assert!(!compile("a.b").can_match_line_feed());
}

/// When a pattern cannot match a line feed, scanning line by line must
/// produce the same matches as scanning the whole buffer at once.
fn check_line_by_line(pattern: &str, text: &str) {
    let p = compile(pattern);
    assert!(
        !p.can_match_line_feed(),
        "pattern unexpectedly reaches a line feed: {}",
        pattern
    );

    let whole = all_matches(&p, text);

    let mut by_line = Vec::new();
    let mut offset = 0;
    for line in text.split('\n') {
        for (range, formatted) in all_matches(&p, line) {
            by_line.push(((range.start + offset)..(range.end + offset), formatted));
        }
        offset += line.len() + 1;
    }

    assert_eq!(
        whole, by_line,
        "line-by-line scan diverged for /{}/ on {:?}",
        pattern, text
    );
}

#[test]
fn line_by_line_scanning_is_equivalent() {
    check_line_by_line(r"\w+", "ab cd\nef\n\ngh i");
    check_line_by_line(r"\d+", "1\n22\n333 4");
    check_line_by_line(r"\bx\b", "x y\ny x\nxx");
    check_line_by_line(r"(ca)+t", "cat\ncacat x\nct");
}

#[test]
fn find_last_agrees_across_the_threshold() {
    let p = compile(r"(\w)(\d)");
    let text = "a1 b2 c3 d4".repeat(3);
    // Thresholds straddling the text length force each strategy in turn.
    let forward = p.find_last_with_threshold(&text, text.len() + 1).unwrap();
    let reversed = p.find_last_with_threshold(&text, text.len()).unwrap();
    assert_eq!(forward.range(), reversed.range());
    assert_eq!(forward.group(1), reversed.group(1));
    assert_eq!(forward.group(2), reversed.group(2));
    assert_eq!(forward.range(), text.len() - 2..text.len());
}

#[test]
fn find_last_with_case_insensitive_flags() {
    let p = compilef("ab", "i");
    let m = p.find_last("AB ab aB").unwrap();
    assert_eq!(m.range(), 6..8);
}

#[test]
fn alternation_matches_exactly_the_union() {
    let a = compile(r"\d+x");
    let b = compile("y(z*)");
    let (combined, marker) = alternate(&a, &b).unwrap();

    for text in &["12x", "y", "yzz", "a 3x b"] {
        assert!(
            combined.find(text).is_some(),
            "combination should match {:?}",
            text
        );
        assert!(a.find(text).is_some() || b.find(text).is_some());
    }
    for text in &["x", "12", "z", ""] {
        assert!(combined.find(text).is_none());
        assert!(a.find(text).is_none() && b.find(text).is_none());
    }

    // The marker participates exactly for matches produced by b. With no
    // groups in a, b's group keeps index 1 and the marker lands at 2.
    assert_eq!(marker, 2);
    let via_b = combined.find("yzz").unwrap();
    assert_eq!(via_b.group(marker as usize), Some(3..3));
    // b's own group resolves to the same substring b alone would capture.
    assert_eq!(via_b.group(1), b.find("yzz").unwrap().group(1));

    let via_a = combined.find("12x").unwrap();
    assert_eq!(via_a.group(marker as usize), None);
}

#[test]
fn static_string_extraction_scenarios() {
    assert_eq!(
        static_strings("cat|dog"),
        Some(vec!["cat".to_string(), "dog".to_string()])
    );
    assert_eq!(static_strings("a.b"), None);
}

#[test]
fn static_strings_are_sound() {
    let pattern = r"cat|dog|bird\.";
    let p = compile(pattern);
    let strings = static_strings(pattern).unwrap();
    assert_eq!(strings, vec!["cat", "dog", "bird."]);
    for s in &strings {
        let m = p.find(s).unwrap();
        assert_eq!(m.range(), 0..s.len(), "should match all of {:?}", s);
    }
    assert!(p.find("catalog").is_some());
    assert!(p.find("cow").is_none());
}

#[test]
fn split_and_match_ranges_cover_the_text() {
    let p = compile(",");
    let text = "a,bb,,c";
    let splits = p.split_ranges(text);
    assert_eq!(splits, vec![0..1, 2..4, 5..5, 6..7]);
    let matches: Vec<Range> = p.match_ranges(text).iter().map(|m| m.range()).collect();
    assert_eq!(matches, vec![1..2, 4..5, 5..6]);

    // Split pieces and separators tile the text exactly.
    let mut pieces: Vec<Range> = splits.into_iter().chain(matches.into_iter()).collect();
    pieces.sort_by_key(|r| r.start);
    let mut pos = 0;
    for piece in pieces {
        assert_eq!(piece.start, pos);
        pos = piece.end;
    }
    assert_eq!(pos, text.len());
}

#[test]
fn reversal_survives_the_kitchen_sink() {
    // A pattern using most syntactic forms at once still reverses into
    // something the host engine accepts, twice over.
    let p = compilef(
        r"^(?<head>\w+)[-:]\d{1,3}(?:x|y)+(?=z)z(?<tail>[a-f]*)\k<tail>$",
        "m",
    );
    let reversed = p.reversed();
    let twice = reversed.reversed();
    let text = "abc-12xyz";
    let forward = p.find(text).map(|m| format_match(&m, text));
    let again = twice.find(text).map(|m| format_match(&m, text));
    assert_eq!(forward, again);
    forward.unwrap().test_eq("abc-12xyz,abc,");
}
