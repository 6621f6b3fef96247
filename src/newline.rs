//! Deciding whether a pattern can match text containing a line feed.
//!
//! The answer selects the scanning strategy upstream: a pattern that can
//! never match a line feed may be searched one line at a time, while a
//! pattern that can must be run over the whole remaining buffer. The walk
//! never invokes the host matcher, with one narrow exception for Unicode
//! property classes. Answering true spuriously only costs performance;
//! answering false must be sound.

use crate::ast::{
    AnchorType, Bracket, BracketItem, ClassEscape, Expr, Group, Node, Sequence,
};
use crate::types::{CaptureGroupID, CharacterClassType};
use log::debug;

const LINE_FEED: u32 = 0xA;

/// \return whether \p expr can match a string containing a line feed.
pub fn can_match_line_feed(expr: &Expr) -> bool {
    let mut analyzer = Analyzer {
        expr,
        groups: expr.capture_groups(),
        visiting: Vec::new(),
    };
    analyzer.alternatives(&expr.alts, false)
}

struct Analyzer<'a> {
    expr: &'a Expr,

    /// Capturing groups by index, for resolving backreferences.
    groups: Vec<&'a Group>,

    /// Groups currently being tested through a backreference; guards
    /// against self-referential groups like (a\1).
    visiting: Vec<CaptureGroupID>,
}

impl<'a> Analyzer<'a> {
    fn alternatives(&mut self, alts: &'a [Sequence], inverse: bool) -> bool {
        alts.iter().any(|alt| self.sequence(alt, inverse))
    }

    fn sequence(&mut self, seq: &'a [Node], inverse: bool) -> bool {
        seq.iter().any(|node| self.node(node, inverse))
    }

    fn node(&mut self, node: &'a Node, inverse: bool) -> bool {
        match node {
            Node::Literal(s) => s.contains('\n') != inverse,

            Node::Escaped(e) => (e.cp == LINE_FEED) != inverse,

            Node::Class(ce) => class_matches_line_feed(*ce) != inverse,

            Node::Property { name, negate } => {
                property_matches_line_feed(name, *negate) != inverse
            }

            Node::Bracket(b) => self.bracket(b) != inverse,

            Node::Dot => self.expr.flags.dot_all != inverse,

            // Start and end anchors interact with line boundaries under the
            // multiline flag, so a pattern containing them is always
            // searched against the whole buffer.
            Node::Anchor(AnchorType::Start) | Node::Anchor(AnchorType::End) => true,
            Node::Anchor(AnchorType::WordBoundary) => inverse,
            Node::Anchor(AnchorType::NotWordBoundary) => !inverse,

            // Bounds are irrelevant: one iteration is enough to reach a
            // line feed.
            Node::Repeat { node, .. } => self.node(node, inverse),

            Node::Group(group) => self.alternatives(&group.alts, inverse),

            Node::Lookaround(look) => {
                let inverse = if look.negate { !inverse } else { inverse };
                self.alternatives(&look.alts, inverse)
            }

            Node::BackRef(index) => self.backref(*index, inverse),

            Node::NamedBackRef(name) => {
                let index = self
                    .expr
                    .group_index(name)
                    .expect("named backreference to unknown group");
                self.backref(index, inverse)
            }
        }
    }

    /// A backreference matches whatever its group matched, so recurse into
    /// the group body.
    fn backref(&mut self, index: CaptureGroupID, inverse: bool) -> bool {
        if self.visiting.contains(&index) {
            // Self-referential: the inner reference matches the empty
            // string on the group's first iteration.
            return false;
        }
        let group = self.groups[index as usize - 1];
        self.visiting.push(index);
        let result = self.alternatives(&group.alts, inverse);
        self.visiting.pop();
        result
    }

    /// Structural membership of the line feed in a bracket expression,
    /// composing the bracket's own negation; the caller applies `inverse`.
    fn bracket(&mut self, bracket: &Bracket) -> bool {
        let mut included = false;
        for item in &bracket.items {
            included |= match item {
                BracketItem::Char(c) => c.code_point() == LINE_FEED,
                BracketItem::Range(lo, hi) => {
                    (lo.code_point()..=hi.code_point()).contains(&LINE_FEED)
                }
                BracketItem::Class(ce) => class_matches_line_feed(*ce),
                BracketItem::Property { name, negate } => {
                    property_matches_line_feed(name, *negate)
                }
            };
        }
        included != bracket.negate
    }
}

fn class_matches_line_feed(ce: ClassEscape) -> bool {
    match ce.class_type {
        // \s contains the line feed; \S excludes it.
        CharacterClassType::Spaces => !ce.negate,
        // \d and \w exclude it; their negations contain it.
        CharacterClassType::Digits | CharacterClassType::Words => ce.negate,
    }
}

/// The one escape hatch to the host engine: enumerating Unicode property
/// membership by hand is impractical, so build the minimal single-class
/// pattern and test it against a lone line feed.
fn property_matches_line_feed(name: &str, negate: bool) -> bool {
    let source = format!("[\\{}{{{}}}]", if negate { 'P' } else { 'p' }, name);
    match regress::Regex::with_flags(&source, "u") {
        Ok(re) => re.find("\n").is_some(),
        Err(err) => {
            // Not a property class the host knows about; assume the worst.
            debug!("host engine rejected {}: {}", source, err);
            true
        }
    }
}
