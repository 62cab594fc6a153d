use crate::types::NodeId;
use glam::Vec2;

/// One emitted point of the growing structure.
///
/// `pos`, `parent`, `orig_dir` and `len` are fixed at creation; `dir` and
/// `count` are scratch state accumulated during a growth tick and reset by
/// [`BranchNode::reset`] afterwards.
#[derive(Clone, Debug)]
pub struct BranchNode {
    pub pos: Vec2,
    pub parent: Option<NodeId>,
    /// Accumulated steering direction for the current tick.
    pub dir: Vec2,
    /// Direction at creation; `dir` returns here on reset.
    pub orig_dir: Vec2,
    pub len: f32,
    /// Attractors pulling on this node in the current tick.
    pub count: u32,
}

impl BranchNode {
    pub fn new_root(pos: Vec2, dir: Vec2, len: f32) -> Self {
        Self {
            pos,
            parent: None,
            dir,
            orig_dir: dir,
            len,
            count: 0,
        }
    }

    pub fn new_child(parent: NodeId, pos: Vec2, dir: Vec2, len: f32) -> Self {
        Self {
            pos,
            parent: Some(parent),
            dir,
            orig_dir: dir,
            len,
            count: 0,
        }
    }

    pub fn reset(&mut self) {
        self.dir = self.orig_dir;
        self.count = 0;
    }
}

/// Arena holding the grown forest.
///
/// Children reference parents by [`NodeId`]; there are no child lists, and
/// parents always precede their children in `nodes`, so the graph is acyclic
/// by construction.
#[derive(Debug, Default)]
pub struct Tree {
    pub nodes: Vec<BranchNode>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, pos: Vec2, dir: Vec2, len: f32) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(BranchNode::new_root(pos, dir, len));
        id
    }

    pub fn add_child(&mut self, parent: NodeId, pos: Vec2, dir: Vec2, len: f32) -> NodeId {
        debug_assert!(parent < self.nodes.len());
        let id = self.nodes.len();
        self.nodes.push(BranchNode::new_child(parent, pos, dir, len));
        id
    }

    pub fn pos(&self, id: NodeId) -> Vec2 {
        self.nodes[id].pos
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }
}
