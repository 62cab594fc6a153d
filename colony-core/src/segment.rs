use crate::approx::near_eq;
use crate::tree::Tree;
use crate::types::NodeId;
use glam::Vec2;

/// A directed edge between two adjacent growth nodes.
///
/// Holds arena ids only; positions are resolved against the [`Tree`] that
/// issued them. The reducer reassigns `head`/`tail` when extending a kept
/// segment through a collinear neighbor.
#[derive(Clone, Copy, Debug)]
pub struct Segment {
    pub head: NodeId,
    pub tail: NodeId,
}

impl Segment {
    pub fn new(head: NodeId, tail: NodeId) -> Self {
        Self { head, tail }
    }

    pub fn head_pos(&self, tree: &Tree) -> Vec2 {
        tree.pos(self.head)
    }

    pub fn tail_pos(&self, tree: &Tree) -> Vec2 {
        tree.pos(self.tail)
    }

    /// Rise over run, head to tail. Vertical segments report ±∞, which the
    /// tolerance comparison treats as equal per sign.
    pub fn slope(&self, tree: &Tree) -> f32 {
        let a = self.head_pos(tree);
        let b = self.tail_pos(tree);
        (b.y - a.y) / (b.x - a.x)
    }

    pub fn touches_head_approximately(&self, tree: &Tree, pt: Vec2) -> bool {
        let h = self.head_pos(tree);
        near_eq(h.x, pt.x) && near_eq(h.y, pt.y)
    }

    pub fn touches_tail_approximately(&self, tree: &Tree, pt: Vec2) -> bool {
        let t = self.tail_pos(tree);
        near_eq(t.x, pt.x) && near_eq(t.y, pt.y)
    }

    /// True when both endpoints coincide within tolerance, in either
    /// direction.
    pub fn overlaps_approximately(&self, tree: &Tree, other: &Segment) -> bool {
        let (h, t) = (self.head_pos(tree), self.tail_pos(tree));
        let (oh, ot) = (other.head_pos(tree), other.tail_pos(tree));

        let same = near_eq(h.x, oh.x) && near_eq(h.y, oh.y) && near_eq(t.x, ot.x) && near_eq(t.y, ot.y);
        let flipped =
            near_eq(h.x, ot.x) && near_eq(h.y, ot.y) && near_eq(t.x, oh.x) && near_eq(t.y, oh.y);
        same || flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_tree() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let a = tree.add_root(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 4.0);
        let b = tree.add_child(a, Vec2::new(4.0, 2.0), Vec2::new(1.0, 0.0), 4.0);
        let c = tree.add_child(b, Vec2::new(4.0, 6.0), Vec2::new(0.0, 1.0), 4.0);
        (tree, a, b, c)
    }

    #[test]
    fn slope_is_rise_over_run() {
        let (tree, a, b, _) = line_tree();
        let s = Segment::new(a, b);
        assert_eq!(s.slope(&tree), 0.5);
    }

    #[test]
    fn vertical_segments_report_infinite_slope() {
        let (tree, _, b, c) = line_tree();
        let s = Segment::new(b, c);
        assert_eq!(s.slope(&tree), f32::INFINITY);

        let reversed = Segment::new(c, b);
        assert_eq!(reversed.slope(&tree), f32::NEG_INFINITY);
    }

    #[test]
    fn endpoint_touch_uses_the_slope_tolerance() {
        let (tree, a, b, _) = line_tree();
        let s = Segment::new(a, b);

        assert!(s.touches_head_approximately(&tree, Vec2::new(0.02, 0.0)));
        assert!(!s.touches_head_approximately(&tree, Vec2::new(0.03, 0.0)));
        assert!(s.touches_tail_approximately(&tree, Vec2::new(4.0, 2.01)));
    }

    #[test]
    fn overlap_detects_both_directions() {
        let (tree, a, b, _) = line_tree();
        let s = Segment::new(a, b);
        let same = Segment::new(a, b);
        let flipped = Segment::new(b, a);

        assert!(s.overlaps_approximately(&tree, &same));
        assert!(s.overlaps_approximately(&tree, &flipped));
    }
}
