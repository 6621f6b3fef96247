//! Structural reversal of a pattern.
//!
//! The reversed pattern, matched against character-reversed text, finds the
//! mirror image of what the original finds forward: a match of `s[i..j)`
//! becomes a match of `reverse(s)[(n-j)..(n-i))`. Sequences reverse their
//! node order, lookarounds flip direction, and start/end anchors swap.
//! Captured group text comes out character-reversed; callers map offsets
//! back with `new = len - old_end .. len - old_start`.
//!
//! The delicate part is backreferences. Reversing `(a)x\1` node by node
//! would put the reference before the group it refers to, where it can no
//! longer see a capture. Instead, the first site (in reversed order) that
//! refers to a group emits the reversed group itself, and every later site
//! (including the group's original position) becomes a plain numeric
//! backreference. A side table of already-reversed groups, local to one
//! reversal call, keeps repeated references from re-expanding the group.

use crate::ast::{AnchorType, Expr, Group, Lookaround, Node, Sequence};
use crate::types::CaptureGroupID;
use std::collections::HashSet;

/// Reverse \p expr, producing a new tree. The input is never mutated, so
/// the same tree may be reversed any number of times.
pub fn reverse(expr: &Expr) -> Expr {
    let mut reverser = Reverser {
        groups: expr.capture_groups(),
        expr,
        reversed: HashSet::new(),
    };
    let alts = expr
        .alts
        .iter()
        .map(|alt| reverser.sequence(alt))
        .collect();
    // Every capturing group must have been emitted somewhere.
    assert_eq!(
        reverser.reversed.len(),
        expr.group_count as usize,
        "capture group left unresolved by reversal"
    );
    Expr {
        alts,
        flags: expr.flags,
        group_count: expr.group_count,
        group_names: expr.group_names.clone(),
    }
}

/// State for a single reversal pass.
struct Reverser<'a> {
    expr: &'a Expr,

    /// Capturing groups of the source tree by index, so a backreference
    /// can find its referent from anywhere.
    groups: Vec<&'a Group>,

    /// Indices of groups already emitted in reversed form.
    reversed: HashSet<CaptureGroupID>,
}

impl<'a> Reverser<'a> {
    fn alternatives(&mut self, alts: &'a [Sequence]) -> Vec<Sequence> {
        alts.iter().map(|alt| self.sequence(alt)).collect()
    }

    fn sequence(&mut self, seq: &'a [Node]) -> Sequence {
        seq.iter().rev().map(|node| self.node(node)).collect()
    }

    fn node(&mut self, node: &'a Node) -> Node {
        match node {
            // A literal run reverses its characters.
            Node::Literal(s) => Node::Literal(s.chars().rev().collect()),

            // Single code points are order-invariant.
            Node::Escaped(_)
            | Node::Class(_)
            | Node::Property { .. }
            | Node::Bracket(_)
            | Node::Dot => node.clone(),

            // Start-of-input before a match reads as end-of-input after the
            // reversed match, and vice versa. Word boundaries are symmetric.
            Node::Anchor(AnchorType::Start) => Node::Anchor(AnchorType::End),
            Node::Anchor(AnchorType::End) => Node::Anchor(AnchorType::Start),
            Node::Anchor(_) => node.clone(),

            Node::Repeat { node, quant } => Node::Repeat {
                node: Box::new(self.node(node)),
                quant: *quant,
            },

            Node::Group(group) => match group.index {
                None => Node::Group(Group {
                    alts: self.alternatives(&group.alts),
                    index: None,
                    name: None,
                }),
                Some(index) => self.emit_group(group, index),
            },

            // Looking ahead in the original is looking behind in the
            // reversed text; the polarity is untouched.
            Node::Lookaround(look) => Node::Lookaround(Lookaround {
                alts: self.alternatives(&look.alts),
                negate: look.negate,
                behind: !look.behind,
            }),

            Node::BackRef(index) => self.reference(*index),

            Node::NamedBackRef(name) => {
                let index = self
                    .expr
                    .group_index(name)
                    .expect("named backreference to unknown group");
                self.reference(index)
            }
        }
    }

    /// Emit group \p index at the current site, unless it has already been
    /// emitted, in which case this site becomes a backreference.
    fn emit_group(&mut self, group: &'a Group, index: CaptureGroupID) -> Node {
        // Insert before recursing: a self-referential group must see
        // itself as already reversed.
        if !self.reversed.insert(index) {
            return Node::BackRef(index);
        }
        Node::Group(Group {
            alts: self.alternatives(&group.alts),
            index: Some(index),
            name: group.name.clone(),
        })
    }

    /// Reverse a reference to group \p index. The first reference seen
    /// claims the group and expands to it.
    fn reference(&mut self, index: CaptureGroupID) -> Node {
        if self.reversed.contains(&index) {
            return Node::BackRef(index);
        }
        let group = self.groups[index as usize - 1];
        self.emit_group(group, index)
    }
}
