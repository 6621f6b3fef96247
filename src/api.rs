use crate::ast::Expr;
use crate::exec;
use crate::newline;
use crate::parse;
use crate::reverse;
use crate::types::{CaptureGroupID, CaptureGroupName};
use core::{fmt, str::FromStr};

pub use crate::parse::Error;

/// Flags used to control pattern parsing and matching.
/// The default flags are case-sensitive, not-multiline, with the dot
/// excluding line terminators.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// If set, make the pattern case-insensitive.
    /// Equivalent to the 'i' flag in JavaScript.
    pub icase: bool,

    /// If set, ^ and $ match at line separators, not just the input
    /// boundaries. Equivalent to the 'm' flag in JavaScript.
    pub multiline: bool,

    /// If set, . matches at line separators as well as any other character.
    /// Equivalent to the 's' flag in JavaScript.
    pub dot_all: bool,

    /// If set, the pattern is interpreted as a Unicode pattern.
    /// Equivalent to the 'u' flag in JavaScript.
    pub unicode: bool,

    /// The 'g' flag. Irrelevant to parsing and analysis; carried through so
    /// a pattern re-renders with the flags it arrived with.
    pub global: bool,

    /// The 'y' flag. Carried through like 'g'.
    pub sticky: bool,
}

impl Flags {
    /// \return the union of two flag sets, used when combining patterns.
    pub fn union(self, other: Flags) -> Flags {
        Flags {
            icase: self.icase || other.icase,
            multiline: self.multiline || other.multiline,
            dot_all: self.dot_all || other.dot_all,
            unicode: self.unicode || other.unicode,
            global: self.global || other.global,
            sticky: self.sticky || other.sticky,
        }
    }

    /// \return the flag string handed to the host engine. The 'g' and 'y'
    /// flags describe iteration state, not syntax, and are withheld.
    pub(crate) fn host(self) -> String {
        let mut result = String::new();
        if self.icase {
            result.push('i');
        }
        if self.multiline {
            result.push('m');
        }
        if self.dot_all {
            result.push('s');
        }
        if self.unicode {
            result.push('u');
        }
        result
    }
}

impl From<&str> for Flags {
    /// Construct a Flags from a string, using JavaScript flag letters.
    /// Unsupported flags are silently skipped.
    fn from(s: &str) -> Self {
        let mut result = Self::default();
        for c in s.chars() {
            match c {
                'i' => result.icase = true,
                'm' => result.multiline = true,
                's' => result.dot_all = true,
                'u' => result.unicode = true,
                'g' => result.global = true,
                'y' => result.sticky = true,
                _ => {
                    // Silently skip unsupported flags.
                }
            }
        }
        result
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.global {
            f.write_str("g")?;
        }
        if self.icase {
            f.write_str("i")?;
        }
        if self.multiline {
            f.write_str("m")?;
        }
        if self.dot_all {
            f.write_str("s")?;
        }
        if self.unicode {
            f.write_str("u")?;
        }
        if self.sticky {
            f.write_str("y")?;
        }
        Ok(())
    }
}

/// Range is used to express the extent of a match, as byte indexes into the
/// input string.
pub type Range = core::ops::Range<usize>;

/// A Match represents a portion of a string which was found to match a
/// Pattern.
#[derive(Debug, Clone)]
pub struct Match {
    /// The total range of the match. Note this may be empty, if the pattern
    /// matched an empty string.
    pub range: Range,

    /// The capture list, with length equal to the number of capturing
    /// groups in the pattern, indexed by group index minus one. A None
    /// entry means the group did not participate in the match.
    pub captures: Vec<Option<Range>>,

    /// Capture group names in index order; empty strings for unnamed
    /// groups.
    pub(crate) group_names: Box<[Box<str>]>,
}

impl Match {
    /// Access a group by index. Index 0 is the total match, index 1 is the
    /// first capture group.
    pub fn group(&self, index: usize) -> Option<Range> {
        if index == 0 {
            Some(self.range.clone())
        } else {
            self.captures[index - 1].clone()
        }
    }

    /// Access a named group by name.
    pub fn named_group(&self, name: &str) -> Option<Range> {
        if name.is_empty() {
            return None;
        }
        let pos = self.group_names.iter().position(|n| n.as_ref() == name)?;
        self.captures[pos].clone()
    }

    /// \return an iterator over the groups of the match: first the total
    /// match, then each capture group.
    pub fn groups(&self) -> impl Iterator<Item = Option<Range>> + '_ {
        (0..=self.captures.len()).map(move |index| self.group(index))
    }

    /// \return an iterator over the named groups of the match.
    pub fn named_groups(&self) -> impl Iterator<Item = (&str, Option<Range>)> + '_ {
        self.group_names
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(move |(pos, name)| (name.as_ref(), self.captures[pos].clone()))
    }

    /// Returns the range over the starting and ending byte offsets of the
    /// match in the haystack.
    pub fn range(&self) -> Range {
        self.range.clone()
    }

    /// Returns the starting byte offset of the match in the haystack.
    pub fn start(&self) -> usize {
        self.range.start
    }

    /// Returns the ending byte offset of the match in the haystack.
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Build a Match from a raw host result. Host captures are positional;
    /// \p order maps each position back to the pattern's own group index.
    pub(crate) fn from_host(
        m: regress::Match,
        order: &[CaptureGroupID],
        group_names: &[Option<CaptureGroupName>],
    ) -> Match {
        let mut captures: Vec<Option<Range>> = vec![None; group_names.len()];
        for (pos, capture) in m.captures.iter().enumerate() {
            captures[order[pos] as usize - 1] = capture.clone();
        }
        Match {
            range: m.range(),
            captures,
            group_names: group_names
                .iter()
                .map(|name| name.clone().unwrap_or_default().into_boxed_str())
                .collect(),
        }
    }

    /// Map a match found in character-reversed text of byte length \p len
    /// back into forward coordinates. Character reversal preserves UTF-8
    /// lengths, so byte offsets mirror exactly.
    pub(crate) fn map_reversed(&self, len: usize) -> Match {
        let flip = |r: &Range| (len - r.end)..(len - r.start);
        Match {
            range: flip(&self.range),
            captures: self
                .captures
                .iter()
                .map(|capture| capture.as_ref().map(&flip))
                .collect(),
            group_names: self.group_names.clone(),
        }
    }
}

/// A Pattern is a parsed pattern together with its host-compiled form.
#[derive(Debug)]
pub struct Pattern {
    source: String,
    flags: Flags,
    expr: Expr,
    /// Group indices in host (rendering) order; identity for parsed
    /// patterns, a permutation for reversed ones.
    order: Vec<CaptureGroupID>,
    host: regress::Regex,
}

impl Pattern {
    /// Construct a pattern by parsing \p pattern using the default flags.
    /// An Error may be returned if the syntax is invalid.
    pub fn new(pattern: &str) -> Result<Pattern, Error> {
        Self::with_flags(pattern, Flags::default())
    }

    /// Construct a pattern by parsing \p pattern with \p flags.
    /// An Error may be returned if the syntax is invalid.
    /// Note it is preferable to cache a Pattern which is intended to be
    /// used more than once, as the parse may be expensive.
    pub fn with_flags<F>(pattern: &str, flags: F) -> Result<Pattern, Error>
    where
        F: Into<Flags>,
    {
        let flags = flags.into();
        let expr = parse::parse(pattern, flags)?;
        // The host compiles the rendered tree, not the raw source: the
        // renderer normalizes the few spellings this parser accepts and the
        // host does not (legacy octal, a dash adjacent to a class).
        let host = match compile_host(&expr.to_string(), flags) {
            Ok(host) => host,
            Err(err) => {
                return Err(Error {
                    text: format!("unsupported by host engine: {}", err),
                    position: 0,
                })
            }
        };
        let order = expr.capture_order();
        Ok(Pattern {
            source: pattern.to_string(),
            flags,
            expr,
            order,
            host,
        })
    }

    /// Construct a pattern from an already-built tree. Failure to compile a
    /// rendered tree is an engine defect, not a user error.
    pub(crate) fn from_expr(expr: Expr) -> Pattern {
        let source = expr.to_string();
        let host = match compile_host(&source, expr.flags) {
            Ok(host) => host,
            Err(err) => panic!("derived pattern failed to compile: /{}/: {}", source, err),
        };
        let order = expr.capture_order();
        Pattern {
            source,
            flags: expr.flags,
            expr,
            order,
            host,
        }
    }

    /// \return the pattern source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// \return the pattern's flags.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// \return the parsed form of the pattern.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// \return the number of capturing groups.
    pub fn group_count(&self) -> CaptureGroupID {
        self.expr.group_count
    }

    /// Searches \p text to find the first match.
    pub fn find(&self, text: &str) -> Option<Match> {
        self.find_from(text, 0)
    }

    /// \return the first match found in \p text starting at byte index
    /// \p start. Note this may be different from passing a sliced text, in
    /// the case of lookbehind assertions.
    pub fn find_from(&self, text: &str, start: usize) -> Option<Match> {
        let m = self.host.find_from(text, start).next()?;
        Some(Match::from_host(m, &self.order, &self.expr.group_names))
    }

    /// \return whether this pattern can match a string containing a line
    /// feed. When false, a search may safely scan one line at a time.
    pub fn can_match_line_feed(&self) -> bool {
        newline::can_match_line_feed(&self.expr)
    }

    /// \return the reversed pattern: matching it against character-reversed
    /// text mirrors matching this pattern against the original text.
    pub fn reversed(&self) -> Pattern {
        Pattern::from_expr(reverse::reverse(&self.expr))
    }

    /// Find the rightmost match in \p text. Small texts iterate forward
    /// matches; texts at or above the default threshold are searched once,
    /// backwards, via the reversed pattern.
    pub fn find_last(&self, text: &str) -> Option<Match> {
        exec::find_last(self, text, exec::LAST_MATCH_REVERSAL_THRESHOLD)
    }

    /// As `find_last`, with an explicit size threshold. The threshold is a
    /// performance trade-off only; both strategies agree on the result.
    pub fn find_last_with_threshold(&self, text: &str, threshold: usize) -> Option<Match> {
        exec::find_last(self, text, threshold)
    }

    /// \return the ranges of \p text lying between matches, in absolute
    /// offsets, including the possibly-empty leading and trailing ranges.
    pub fn split_ranges(&self, text: &str) -> Vec<Range> {
        exec::split_ranges(self, text)
    }

    /// \return every non-overlapping match in \p text, in ascending order,
    /// in absolute offsets.
    pub fn match_ranges(&self, text: &str) -> Vec<Match> {
        exec::match_ranges(self, text)
    }
}

/// The single place a pattern is handed to the host engine for
/// compilation.
fn compile_host(source: &str, flags: Flags) -> Result<regress::Regex, regress::Error> {
    regress::Regex::with_flags(source, flags.host().as_str())
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl FromStr for Pattern {
    type Err = Error;

    /// Attempts to parse a string into a pattern.
    fn from_str(s: &str) -> Result<Self, Error> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_roundtrip() {
        let flags = Flags::from("gisu");
        assert!(flags.global && flags.icase && flags.dot_all && flags.unicode);
        assert!(!flags.multiline && !flags.sticky);
        assert_eq!(flags.to_string(), "gisu");
        assert_eq!(Flags::from("xyz").to_string(), "y");
        assert_eq!(Flags::from("gi").union(Flags::from("my")).to_string(), "gimy");
    }

    #[test]
    fn host_flags_withhold_iteration_state() {
        assert_eq!(Flags::from("gimsuy").host(), "imsu");
    }

    #[test]
    fn find_reports_groups_by_index_and_name() {
        let pattern = Pattern::new(r"(?<first>\w+)-(\d+)").unwrap();
        let m = pattern.find("id: abc-42").unwrap();
        assert_eq!(m.range(), 4..10);
        assert_eq!(m.group(0), Some(4..10));
        assert_eq!(m.group(1), Some(4..7));
        assert_eq!(m.group(2), Some(8..10));
        assert_eq!(m.named_group("first"), Some(4..7));
        assert_eq!(m.named_group("missing"), None);
        let named: Vec<_> = m.named_groups().collect();
        assert_eq!(named, vec![("first", Some(4..7))]);
    }

    #[test]
    fn find_from_honors_lookbehind() {
        let pattern = Pattern::new(r"(?<=x)y").unwrap();
        let m = pattern.find_from("xyxy", 1).unwrap();
        assert_eq!(m.range(), 1..2);
    }

    #[test]
    fn non_participating_groups_are_none() {
        let pattern = Pattern::new("aa(b)?aa").unwrap();
        let m = pattern.find("aaaa").unwrap();
        assert_eq!(m.group(1), None);
        let collected: Vec<_> = m.groups().collect();
        assert_eq!(collected, vec![Some(0..4), None]);
    }

    #[test]
    fn display_renders_source_and_flags() {
        let pattern = Pattern::with_flags("a|b", "im").unwrap();
        assert_eq!(pattern.to_string(), "/a|b/im");
    }

    #[test]
    fn host_rejection_is_an_error() {
        // Parses on our side but the host has no such property class.
        assert!(Pattern::with_flags(r"\p{NoSuchProperty}", "u").is_err());
    }

    #[test]
    fn normalized_spellings_reach_the_host() {
        // Legacy octal and a class-adjacent dash are accepted here and
        // re-rendered into spellings the host understands.
        let octal = Pattern::new(r"\07").unwrap();
        assert_eq!(octal.find("a\u{7}b").unwrap().range(), 1..2);
        let dash = Pattern::new(r"[\d-]").unwrap();
        assert_eq!(dash.find("x-y").unwrap().range(), 1..2);
    }

    #[test]
    fn reversed_pattern_maps_captures_to_original_indices() {
        let pattern = Pattern::new("(a)(b)").unwrap();
        let reversed = pattern.reversed();
        assert_eq!(reversed.source(), "(b)(a)");
        let m = reversed.find("ba").unwrap();
        // Group 1 is still the group that captures "a".
        assert_eq!(m.group(1), Some(1..2));
        assert_eq!(m.group(2), Some(0..1));
    }
}
