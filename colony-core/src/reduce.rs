//! Post-growth topology reduction.
//!
//! The raw forest renders terribly: overlapping growth paths duplicate
//! edges, and every branch is its own two-point stroke. This pipeline turns
//! the forest into the minimal set of polylines without losing or
//! duplicating geometry:
//!
//! 1. [`dedupe`] — drop nodes whose parent edge duplicates one already seen.
//! 2. [`create_segments`] — one canonicalized segment per surviving edge.
//! 3. [`prune_segments`] — merge collinear touching segments to fixed point.
//! 4. [`make_polylines_from_segments`] — chain segments into open polylines.
//! 5. [`prune_polylines`] — fuse polylines whose endpoints touch, first
//!    without and then with reversal.
//!
//! All geometric comparisons go through [`crate::approx`]; exact float
//! equality is unreliable after the growth-direction rotations.

use crate::approx::near_eq;
use crate::polyline::Polyline;
use crate::segment::Segment;
use crate::tree::Tree;
use crate::types::NodeId;
use std::collections::HashSet;
use tracing::debug;

/// Upper bound on merge/fusion passes. Each pass either shrinks the set or
/// ends the loop, so this only caps pathological inputs.
const MAX_PASSES: usize = 10;

/// Runs the full pipeline over the node ids stored in the index.
///
/// The two fusion passes mirror the growth of the longest strokes: the
/// reversal-free pass joins everything joinable in place, the
/// reversal-enabled pass then flips whole polylines to extend them further.
///
/// ### Parameters
/// - `tree` - Arena the ids resolve against; read-only.
/// - `ids` - The forest to reduce, usually the index's `flatten()` output.
///
/// ### Returns
/// The minimal polyline set covering every unique surviving edge.
pub fn reduce(tree: &Tree, ids: Vec<NodeId>) -> Vec<Polyline> {
    debug!(nodes = ids.len(), "reduce: raw forest");

    let kept = dedupe(tree, ids);
    debug!(nodes = kept.len(), "reduce: deduped");

    let segments = create_segments(tree, &kept);
    debug!(segments = segments.len(), "reduce: segments built");

    let segments = prune_segments(tree, segments);

    let polylines = make_polylines_from_segments(tree, segments, false);
    debug!(polylines = polylines.len(), "reduce: polylines chained");

    let polylines = prune_polylines(tree, polylines, false);
    prune_polylines(tree, polylines, true)
}

/// Stage A: drops every node whose edge to its parent duplicates an edge
/// already seen.
///
/// The edge key orders endpoints by ascending x and rounds coordinates to
/// one decimal, so duplicates are caught regardless of growth direction.
/// Rounding makes this lossy for edges closer than the precision; accepted,
/// since such edges render identically anyway. Roots carry no edge and are
/// always kept.
pub fn dedupe(tree: &Tree, ids: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(ids.len());

    for id in ids {
        let Some(parent) = tree.parent(id) else {
            kept.push(id);
            continue;
        };

        let mut a = tree.pos(id);
        let mut b = tree.pos(parent);
        if a.x >= b.x {
            std::mem::swap(&mut a, &mut b);
        }
        let key = format!("{:.1}:{:.1}-{:.1}:{:.1}", a.x, a.y, b.x, b.y);

        if seen.insert(key) {
            kept.push(id);
        }
    }

    kept
}

/// Stage B: builds one segment per surviving non-root node.
///
/// Near-vertical edges are ordered top-to-bottom and near-horizontal edges
/// left-to-right, so the collinear merge's head/tail matching is symmetric
/// for the axis-aligned strokes the steering modes produce. Diagonal edges
/// keep child→parent order.
pub fn create_segments(tree: &Tree, ids: &[NodeId]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(ids.len());

    for &id in ids {
        let Some(parent) = tree.parent(id) else {
            continue;
        };
        let n = tree.pos(id);
        let p = tree.pos(parent);

        let s = if near_eq(n.x, p.x) {
            if n.y <= p.y {
                Segment::new(id, parent)
            } else {
                Segment::new(parent, id)
            }
        } else if near_eq(n.y, p.y) {
            if n.x <= p.x {
                Segment::new(id, parent)
            } else {
                Segment::new(parent, id)
            }
        } else {
            Segment::new(id, parent)
        };
        segments.push(s);
    }

    segments
}

/// Stage C: merges collinear touching segments until a pass stops shrinking
/// the set (or the pass budget runs out).
pub fn prune_segments(tree: &Tree, mut segments: Vec<Segment>) -> Vec<Segment> {
    let mut pass = 0;
    loop {
        pass += 1;
        let before = segments.len();
        segments = merge_collinear(tree, segments);
        debug!(pass, segments = segments.len(), "collinear merge pass");

        if segments.len() == before || pass >= MAX_PASSES {
            break;
        }
    }
    segments
}

/// One merge sweep: each raw segment either extends a kept segment with the
/// same slope whose endpoint it touches, or is kept itself.
fn merge_collinear(tree: &Tree, segments: Vec<Segment>) -> Vec<Segment> {
    let mut kept: Vec<Segment> = Vec::with_capacity(segments.len());

    for raw in segments {
        let raw_slope = raw.slope(tree);
        let rh = raw.head_pos(tree);
        let rt = raw.tail_pos(tree);

        let mut extended = false;
        for k in kept.iter_mut() {
            if !near_eq(raw_slope, k.slope(tree)) {
                continue;
            }

            let kh = k.head_pos(tree);
            let kt = k.tail_pos(tree);
            if near_eq(rh.x, kt.x) && near_eq(rh.y, kt.y) {
                // Raw continues past the kept tail.
                k.tail = raw.tail;
                extended = true;
                break;
            } else if near_eq(rt.x, kh.x) && near_eq(rt.y, kh.y) {
                // Raw leads into the kept head.
                k.head = raw.head;
                extended = true;
                break;
            }
        }

        if !extended {
            kept.push(raw);
        }
    }

    kept
}

/// Stage D: chains segments into polylines.
///
/// Each segment first tries to extend the head of an existing polyline
/// (latest-built first); with `try_tail` it also tries the tail. Unmatched
/// segments open a new polyline.
pub fn make_polylines_from_segments(
    tree: &Tree,
    segments: Vec<Segment>,
    try_tail: bool,
) -> Vec<Polyline> {
    let mut polylines: Vec<Polyline> = Vec::new();

    for s in segments {
        let mut matched = false;

        for poly in polylines.iter_mut().rev() {
            let head = poly.head_pos(tree);
            if s.touches_head_approximately(tree, head) {
                // Segment runs out of the polyline head; its tail extends it.
                poly.add_to_head(s.tail);
                matched = true;
                break;
            }
            if s.touches_tail_approximately(tree, head) {
                poly.add_to_head(s.head);
                matched = true;
                break;
            }

            if try_tail {
                let tail = poly.tail_pos(tree);
                if s.touches_head_approximately(tree, tail) {
                    poly.add_to_tail(s.tail);
                    matched = true;
                    break;
                }
                if s.touches_tail_approximately(tree, tail) {
                    poly.add_to_tail(s.head);
                    matched = true;
                    break;
                }
            }
        }

        if !matched {
            polylines.push(Polyline::from_segment(s.head, s.tail));
        }
    }

    polylines
}

/// Stage E: fuses polylines whose endpoints touch, repeating until a pass
/// stops shrinking the set.
///
/// With `allow_reversal` a polyline may be flipped to line its endpoints up
/// before splicing; running a reversal-free pass first keeps orientations
/// stable wherever possible. Within one candidate comparison the first
/// matching rule wins, so a polyline is never spliced onto both ends of the
/// same candidate in a single step.
pub fn prune_polylines(
    tree: &Tree,
    mut polylines: Vec<Polyline>,
    allow_reversal: bool,
) -> Vec<Polyline> {
    let mut pass = 0;
    loop {
        pass += 1;
        let before = polylines.len();

        let mut pruned: Vec<Polyline> = Vec::new();
        for mut poly in polylines {
            let mut fused = false;

            for kept in pruned.iter_mut().rev() {
                let head = poly.head_pos(tree);
                let tail = poly.tail_pos(tree);

                if kept.touches_head_approximately(tree, tail) {
                    kept.add_polyline_to_head(&poly);
                    fused = true;
                } else if kept.touches_tail_approximately(tree, head) {
                    kept.add_polyline_to_tail(&poly);
                    fused = true;
                } else if allow_reversal && kept.touches_head_approximately(tree, head) {
                    poly.reverse();
                    kept.add_polyline_to_head(&poly);
                    fused = true;
                } else if allow_reversal && kept.touches_tail_approximately(tree, tail) {
                    poly.reverse();
                    kept.add_polyline_to_tail(&poly);
                    fused = true;
                }

                if fused {
                    break;
                }
            }

            if !fused {
                pruned.push(poly);
            }
        }

        polylines = pruned;
        debug!(pass, allow_reversal, polylines = polylines.len(), "fusion pass");

        if polylines.len() == before || pass >= MAX_PASSES {
            break;
        }
    }

    polylines
}
