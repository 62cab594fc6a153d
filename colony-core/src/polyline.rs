use crate::approx::{TOUCH_EPSILON, near_equal};
use crate::tree::Tree;
use crate::types::NodeId;
use glam::Vec2;

/// An ordered chain of growth nodes: one continuous drawable stroke.
///
/// Built by chaining segments head-first, then lengthened by fusing whole
/// polylines end to end. Splices drop the shared junction vertex so the
/// total distinct-vertex count is preserved.
#[derive(Clone, Debug)]
pub struct Polyline {
    pub vertices: Vec<NodeId>,
}

impl Polyline {
    pub fn from_segment(head: NodeId, tail: NodeId) -> Self {
        Self {
            vertices: vec![head, tail],
        }
    }

    pub fn head(&self) -> NodeId {
        self.vertices[0]
    }

    pub fn tail(&self) -> NodeId {
        self.vertices[self.vertices.len() - 1]
    }

    pub fn head_pos(&self, tree: &Tree) -> Vec2 {
        tree.pos(self.head())
    }

    pub fn tail_pos(&self, tree: &Tree) -> Vec2 {
        tree.pos(self.tail())
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn add_to_head(&mut self, v: NodeId) {
        self.vertices.insert(0, v);
    }

    pub fn add_to_tail(&mut self, v: NodeId) {
        self.vertices.push(v);
    }

    /// Prepends `other`, whose tail coincides with this head; the duplicate
    /// junction vertex (other's tail) is dropped.
    pub fn add_polyline_to_head(&mut self, other: &Polyline) {
        let mut joined = Vec::with_capacity(other.len() - 1 + self.len());
        joined.extend_from_slice(&other.vertices[..other.len() - 1]);
        joined.extend_from_slice(&self.vertices);
        self.vertices = joined;
    }

    /// Appends `other`, whose head coincides with this tail; the duplicate
    /// junction vertex (other's head) is dropped.
    pub fn add_polyline_to_tail(&mut self, other: &Polyline) {
        self.vertices.extend_from_slice(&other.vertices[1..]);
    }

    pub fn reverse(&mut self) {
        self.vertices.reverse();
    }

    pub fn touches_head_approximately(&self, tree: &Tree, pt: Vec2) -> bool {
        let h = self.head_pos(tree);
        near_equal(h.x, pt.x, TOUCH_EPSILON) && near_equal(h.y, pt.y, TOUCH_EPSILON)
    }

    pub fn touches_tail_approximately(&self, tree: &Tree, pt: Vec2) -> bool {
        let t = self.tail_pos(tree);
        near_equal(t.x, pt.x, TOUCH_EPSILON) && near_equal(t.y, pt.y, TOUCH_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_tree(n: usize) -> Tree {
        let mut tree = Tree::new();
        let mut id = tree.add_root(Vec2::ZERO, Vec2::new(1.0, 0.0), 4.0);
        for i in 1..n {
            id = tree.add_child(id, Vec2::new(i as f32 * 4.0, 0.0), Vec2::new(1.0, 0.0), 4.0);
        }
        tree
    }

    #[test]
    fn head_and_tail_track_the_vertex_order() {
        let mut poly = Polyline::from_segment(0, 1);
        poly.add_to_tail(2);
        poly.add_to_head(3);

        assert_eq!(poly.vertices, vec![3, 0, 1, 2]);
        assert_eq!(poly.head(), 3);
        assert_eq!(poly.tail(), 2);
    }

    #[test]
    fn head_splice_drops_the_junction_vertex() {
        // other: 0-1-2, self: 2-3; other's tail 2 is the junction.
        let mut other = Polyline::from_segment(0, 1);
        other.add_to_tail(2);
        let mut poly = Polyline::from_segment(2, 3);

        poly.add_polyline_to_head(&other);
        assert_eq!(poly.vertices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn tail_splice_drops_the_junction_vertex() {
        let mut poly = Polyline::from_segment(0, 1);
        let mut other = Polyline::from_segment(1, 2);
        other.add_to_tail(3);

        poly.add_polyline_to_tail(&other);
        assert_eq!(poly.vertices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn reversal_swaps_head_and_tail() {
        let mut poly = Polyline::from_segment(4, 7);
        poly.add_to_tail(9);
        poly.reverse();

        assert_eq!(poly.head(), 9);
        assert_eq!(poly.tail(), 4);
    }

    #[test]
    fn endpoint_touch_uses_the_loose_tolerance() {
        let tree = strip_tree(3);
        let poly = Polyline::from_segment(0, 2);

        // Within 0.25 but outside the slope tolerance.
        assert!(poly.touches_head_approximately(&tree, Vec2::new(0.2, 0.0)));
        assert!(!poly.touches_head_approximately(&tree, Vec2::new(0.3, 0.0)));
        assert!(poly.touches_tail_approximately(&tree, Vec2::new(8.0, -0.2)));
    }
}
