//! The space-colonization growth simulation.
//!
//! A [`GrowthEngine`] seeds one or more root nodes and an attractor cloud,
//! then advances in discrete ticks: each tick, every active attractor pulls
//! on its nearest growth node (or is consumed when close enough), and every
//! pulled node emits a child one steering-adjusted step in the accumulated
//! direction. The caller drives the loop and stops once
//! [`GrowthEngine::is_exhausted`] reports no active attractors (or its own
//! iteration budget runs out).

use crate::attractor::{Attractor, AttractorSet};
use crate::config::{Config, ConfigError, DistortionMode, SteeringMode};
use crate::distortion::{DistortionField, FluidDistortion};
use crate::polyline::Polyline;
use crate::quadtree::{LEAF_CAPACITY, QuadTree, Rect};
use crate::tree::Tree;
use crate::types::NodeId;
use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::debug;

/// Scale applied to the normalized steering direction of every emitted
/// branch. Tuned for the stroke textures this engine exists to produce.
const GROWTH_STEP: f32 = 2.7;

/// Attractor query boxes span `2.25 × max_dist` per side: deliberately
/// generous, compensating for the index answering at region granularity.
const QUERY_BOX_SCALE: f32 = 2.25;

/// Owns the spatial index, node arena and attractor set, and runs the
/// per-tick growth algorithm against a fixed [`Config`].
pub struct GrowthEngine {
    cfg: Config,
    qt: QuadTree,
    tree: Tree,
    attractors: AttractorSet,
    rng: SmallRng,
    fluid: Option<FluidDistortion>,
    /// Degree-valued phase mixed into the sinusoidal warps.
    warp_phase: f32,
    /// Half the side of the per-attractor query box.
    query_radius: f32,
    dropped: usize,
}

impl GrowthEngine {
    /// Builds an engine with randomly placed roots and attractors. Every
    /// root is then extended forward until some attractor is in interaction
    /// range, so the first tick always has something to react to.
    pub fn new(cfg: Config) -> Result<Self, ConfigError> {
        let mut engine = Self::init(cfg)?;
        engine.place_random_roots();
        engine.place_random_attractors();
        engine.extend_roots_into_range();
        Ok(engine)
    }

    /// Random roots, caller-provided attractors.
    pub fn with_attractors(cfg: Config, attractors: Vec<Attractor>) -> Result<Self, ConfigError> {
        let mut engine = Self::init(cfg)?;
        engine.place_random_roots();
        engine.attractors = AttractorSet { points: attractors };
        engine.extend_roots_into_range();
        Ok(engine)
    }

    /// Fully explicit scene: `roots` are `(position, initial direction)`
    /// pairs. Used for reproducible setups and tests.
    pub fn with_scene(
        cfg: Config,
        roots: &[(Vec2, Vec2)],
        attractors: Vec<Attractor>,
    ) -> Result<Self, ConfigError> {
        let mut engine = Self::init(cfg)?;
        for &(pos, dir) in roots {
            let id = engine.tree.add_root(pos, dir, cfg.branch_length);
            if !engine.qt.insert(id, pos) {
                engine.dropped += 1;
            }
        }
        engine.attractors = AttractorSet { points: attractors };
        engine.extend_roots_into_range();
        Ok(engine)
    }

    fn init(cfg: Config) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let mut rng = SmallRng::seed_from_u64(cfg.seed);
        let warp_phase = rng.random_range(0.0..512.0);
        let fluid = (cfg.distortion == DistortionMode::Flow)
            .then(|| FluidDistortion::from_config(&cfg.flow, cfg.seed));

        Ok(Self {
            qt: QuadTree::new(Rect::new(0.0, 0.0, cfg.width, cfg.height), LEAF_CAPACITY),
            tree: Tree::new(),
            attractors: AttractorSet::default(),
            rng,
            fluid,
            warp_phase,
            query_radius: cfg.max_dist * QUERY_BOX_SCALE * 0.5,
            dropped: 0,
            cfg,
        })
    }

    /// Roots land in the inner 80% of the canvas, facing its center.
    fn place_random_roots(&mut self) {
        let cfg = self.cfg;
        let offset = cfg.width * 0.1;
        let span_w = cfg.width - 2.0 * offset;
        let span_h = cfg.height - 2.0 * offset;
        let center = Vec2::new(cfg.width, cfg.height) * 0.5;

        for _ in 0..cfg.num_roots {
            let pos = Vec2::new(
                offset + self.rng.random_range(0.0..span_w).floor(),
                offset + self.rng.random_range(0.0..span_h).floor(),
            );
            let dir = (center - pos).normalize_or_zero();
            let id = self.tree.add_root(pos, dir, cfg.branch_length);
            if !self.qt.insert(id, pos) {
                self.dropped += 1;
            }
        }
    }

    fn place_random_attractors(&mut self) {
        let cfg = self.cfg;
        let offset = cfg.width * 0.1;
        self.attractors = AttractorSet::random_in_rect(
            Vec2::new(offset, offset),
            cfg.width - 2.0 * offset,
            cfg.height - 2.0 * offset,
            cfg.num_attractors,
            &mut self.rng,
        );
    }

    /// Walks each root forward in a straight line until an attractor lies
    /// within `max_dist` of the tip. Without this, sparse clouds routinely
    /// produce an empty first tick.
    ///
    /// Bounded: gives up after enough steps to cross the canvas diagonal, or
    /// as soon as the tip can no longer be inserted (left the canvas). With
    /// an empty attractor set the walk always hits one of those bounds.
    fn extend_roots_into_range(&mut self) {
        let max_dist = self.cfg.max_dist;
        let max_steps = (self.cfg.width.hypot(self.cfg.height) / self.cfg.branch_length).ceil() as usize;

        let roots: Vec<NodeId> = (0..self.tree.nodes.len())
            .filter(|&id| self.tree.nodes[id].parent.is_none())
            .collect();

        for root in roots {
            let mut current = root;
            for _ in 0..max_steps {
                if self.attractor_in_range(self.tree.nodes[current].pos, max_dist) {
                    break;
                }
                let (pos, dir, len) = {
                    let n = &self.tree.nodes[current];
                    (n.pos + n.dir * n.len, n.dir, n.len)
                };
                let child = self.tree.add_child(current, pos, dir, len);
                if !self.qt.insert(child, pos) {
                    self.dropped += 1;
                    break;
                }
                current = child;
            }
        }
    }

    fn attractor_in_range(&self, pos: Vec2, dist: f32) -> bool {
        self.attractors
            .points
            .iter()
            .any(|a| !a.reached && a.pos.distance(pos) < dist)
    }

    /// Advances the simulation by one tick.
    ///
    /// 1. Each active attractor is perturbed by the configured distortion,
    ///    then matched to its nearest node among the index query results.
    ///    A node closer than `min_dist` consumes the attractor outright;
    ///    consumption beats steering. Otherwise the nearest node within
    ///    `max_dist` accumulates a weighted unit pull and bumps its count.
    /// 2. Consumed attractors leave the active set for good.
    /// 3. Every node pulled this tick emits a child one steering-adjusted
    ///    [`GROWTH_STEP`] in the accumulated direction, then resets its
    ///    scratch state. Emission runs over a snapshot of the index, so
    ///    children never grow in the tick that created them.
    ///
    /// ### Returns
    /// The ids of the nodes emitted this tick. Children that fall outside
    /// the index region are counted as dropped and not returned.
    pub fn grow(&mut self) -> Vec<NodeId> {
        let cfg = self.cfg;

        for a in self.attractors.points.iter_mut() {
            if a.reached {
                continue;
            }

            match cfg.distortion {
                DistortionMode::None => {}
                DistortionMode::SinWave1 => {
                    a.pos.x += (0.5 * a.pos.y).to_radians().sin();
                }
                DistortionMode::SinWave2 => {
                    a.pos.x += (2.0 * a.pos.y).to_radians().sin();
                }
                DistortionMode::SinWave3 => {
                    a.pos.x += 2.0 * (4.0 * a.pos.y).to_radians().sin();
                }
                DistortionMode::Warp => {
                    let dx = (a.pos.y + self.warp_phase).to_radians().sin();
                    let dy = (0.5 + 0.5 * (a.pos.x + self.warp_phase).to_radians().cos()) * 2.0;
                    a.pos += Vec2::new(dx, dy);
                }
                DistortionMode::Flow => {
                    if let Some(field) = &self.fluid {
                        let nx = a.pos.x / cfg.width;
                        let ny = a.pos.y / cfg.height;
                        let heading = (field.direction_at(nx, ny) * 360.0).to_radians();
                        let mag = field.magnitude_at(nx, ny) * 10.0;
                        a.pos += Vec2::new(mag * heading.cos(), mag * heading.sin());
                    }
                }
            }

            let candidates = self.qt.query(&Rect::around(a.pos, self.query_radius));

            // Nearest node wins, first-found on ties; consumption short-circuits.
            let mut closest: Option<NodeId> = None;
            let mut record = cfg.max_dist;
            for id in candidates {
                let d = a.pos.distance(self.tree.nodes[id].pos);
                if d < cfg.min_dist {
                    a.reached = true;
                    closest = None;
                    break;
                } else if d < record {
                    closest = Some(id);
                    record = d;
                }
            }

            if let Some(id) = closest {
                let node = &mut self.tree.nodes[id];
                node.dir += (a.pos - node.pos).normalize_or_zero() * a.weight;
                node.count += 1;
            }
        }

        self.attractors.retain_active();

        let snapshot = self.qt.flatten();
        let mut new_ids = Vec::new();
        for &id in snapshot.iter().rev() {
            if self.tree.nodes[id].count == 0 {
                continue;
            }

            let dir = steer(
                self.tree.nodes[id].dir.normalize_or_zero() * GROWTH_STEP,
                cfg.steering,
                cfg.angle,
            );
            let (pos, len) = {
                let n = &self.tree.nodes[id];
                (n.pos + dir * n.len, n.len)
            };

            let child = self.tree.add_child(id, pos, dir, len);
            if self.qt.insert(child, pos) {
                new_ids.push(child);
            } else {
                self.dropped += 1;
            }
            self.tree.nodes[id].reset();
        }

        debug!(
            emitted = new_ids.len(),
            active = self.attractors.points.len(),
            nodes = self.tree.nodes.len(),
            "growth tick"
        );

        new_ids
    }

    /// Runs the post-growth reduction pipeline over the current forest.
    pub fn reduce(&self) -> Vec<Polyline> {
        crate::reduce::reduce(&self.tree, self.qt.flatten())
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn quadtree(&self) -> &QuadTree {
        &self.qt
    }

    pub fn attractors(&self) -> &AttractorSet {
        &self.attractors
    }

    pub fn active_attractor_count(&self) -> usize {
        self.attractors.active_count()
    }

    /// The caller-visible termination signal: no attractors left to chase.
    pub fn is_exhausted(&self) -> bool {
        self.attractors.points.is_empty()
    }

    /// Nodes silently dropped by the index (out of region, or an
    /// undividable full leaf). Accepted loss, surfaced for observability.
    pub fn dropped_node_count(&self) -> usize {
        self.dropped
    }

    /// Snapshot of the engine's configuration for the export collaborator.
    pub fn current_config(&self) -> &Config {
        &self.cfg
    }

    /// All node ids currently stored in the index.
    pub fn flatten(&self) -> Vec<NodeId> {
        self.qt.flatten()
    }
}

/// Applies the steering policy to an emission direction.
///
/// The rounding modes snap the heading to a multiple of `angle_deg`:
/// flooring forces left-hand turns, ceiling forces right-hand turns.
fn steer(dir: Vec2, mode: SteeringMode, angle_deg: f32) -> Vec2 {
    let alpha = dir.to_angle().to_degrees();
    let theta = match mode {
        SteeringMode::None => return dir,
        SteeringMode::Rounding => (alpha / angle_deg).round() * angle_deg,
        SteeringMode::LeftRounding => (alpha / angle_deg).floor() * angle_deg,
        SteeringMode::RightRounding => (alpha / angle_deg).ceil() * angle_deg,
    };
    Vec2::from_angle((theta - alpha).to_radians()).rotate(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_cfg() -> Config {
        Config {
            width: 400.0,
            height: 400.0,
            num_attractors: 0,
            num_roots: 1,
            branch_length: 4.0,
            min_dist: 24.0,
            max_dist: 96.0,
            angle: 120.0,
            steering: SteeringMode::None,
            ..Config::default()
        }
    }

    #[test]
    fn attractor_just_inside_min_dist_is_consumed_without_growth() {
        let cfg = scene_cfg();
        let root_pos = Vec2::new(200.0, 200.0);
        let attractor = Attractor::new(root_pos + Vec2::new(cfg.min_dist - 0.01, 0.0));

        let mut engine =
            GrowthEngine::with_scene(cfg, &[(root_pos, Vec2::new(1.0, 0.0))], vec![attractor])
                .unwrap();
        assert_eq!(engine.tree().nodes.len(), 1, "no auto-extension expected");

        let new_ids = engine.grow();

        assert!(new_ids.is_empty());
        assert_eq!(engine.tree().nodes.len(), 1);
        assert_eq!(engine.active_attractor_count(), 0);
        assert!(engine.is_exhausted());
    }

    #[test]
    fn unsteered_growth_steps_exactly_toward_the_attractor() {
        let cfg = scene_cfg();
        let root_pos = Vec2::new(200.0, 200.0);
        let root_dir = Vec2::new(1.0, 0.0);
        let attractor = Attractor::new(root_pos + Vec2::new(cfg.max_dist / 2.0, 0.0));

        let mut engine =
            GrowthEngine::with_scene(cfg, &[(root_pos, root_dir)], vec![attractor]).unwrap();

        let new_ids = engine.grow();
        assert_eq!(new_ids.len(), 1);

        // Pull and creation direction are both +x, so the child lands one
        // 2.7-scaled branch length to the right.
        let child = &engine.tree().nodes[new_ids[0]];
        let expected = root_pos + Vec2::new(1.0, 0.0) * 2.7 * cfg.branch_length;
        assert!((child.pos - expected).length() < 1e-4, "child at {:?}", child.pos);
        assert_eq!(child.parent, Some(0));
    }

    #[test]
    fn left_rounding_floors_the_heading() {
        // Heading 45° with a 120° branch angle floors to 0°.
        let dir = Vec2::new(1.0, 1.0).normalize() * GROWTH_STEP;
        let steered = steer(dir, SteeringMode::LeftRounding, 120.0);

        assert!((steered.to_angle().to_degrees()).abs() < 1e-3);
        assert!((steered.length() - GROWTH_STEP).abs() < 1e-4);
    }

    #[test]
    fn right_rounding_ceilings_the_heading() {
        let dir = Vec2::new(1.0, 1.0).normalize() * GROWTH_STEP;
        let steered = steer(dir, SteeringMode::RightRounding, 120.0);

        assert!((steered.to_angle().to_degrees() - 120.0).abs() < 1e-3);
    }

    #[test]
    fn setup_with_no_attractors_still_terminates() {
        // Root extension must be bounded even when nothing is in reach.
        let cfg = scene_cfg();
        let engine =
            GrowthEngine::with_scene(cfg, &[(Vec2::new(200.0, 200.0), Vec2::new(1.0, 0.0))], vec![])
                .unwrap();

        let diagonal_steps = (cfg.width.hypot(cfg.height) / cfg.branch_length).ceil() as usize;
        assert!(engine.tree().nodes.len() <= diagonal_steps + 1);
        // The walk ran east and left the canvas; the last insert failed.
        assert!(engine.dropped_node_count() >= 1);
    }

    #[test]
    fn setup_extends_a_root_toward_a_distant_attractor() {
        let cfg = scene_cfg();
        let root_pos = Vec2::new(80.0, 200.0);
        // Far outside max_dist; the root faces it.
        let attractor = Attractor::new(Vec2::new(350.0, 200.0));

        let engine =
            GrowthEngine::with_scene(cfg, &[(root_pos, Vec2::new(1.0, 0.0))], vec![attractor])
                .unwrap();

        assert!(engine.tree().nodes.len() > 1);
        let tip = engine.tree().nodes.last().unwrap();
        assert!(tip.pos.distance(Vec2::new(350.0, 200.0)) < cfg.max_dist);
    }

    #[test]
    fn active_attractor_count_never_increases() {
        let cfg = Config {
            num_attractors: 60,
            seed: 11,
            ..Config::default()
        };
        let mut engine = GrowthEngine::new(cfg).unwrap();

        let mut last = engine.active_attractor_count();
        for _ in 0..40 {
            engine.grow();
            let now = engine.active_attractor_count();
            assert!(now <= last, "active set grew: {last} -> {now}");
            last = now;
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_forest() {
        let cfg = Config {
            num_attractors: 40,
            seed: 99,
            ..Config::default()
        };

        let run = || {
            let mut engine = GrowthEngine::new(cfg).unwrap();
            for _ in 0..20 {
                engine.grow();
            }
            engine
                .tree()
                .nodes
                .iter()
                .map(|n| (n.pos.x, n.pos.y))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn growth_out_of_region_is_counted_as_dropped() {
        let cfg = scene_cfg();
        let root_pos = Vec2::new(5.0, 200.0);
        // Pulls the root westward, straight off the canvas.
        let attractor = Attractor::new(Vec2::new(-40.0, 200.0));

        let mut engine =
            GrowthEngine::with_scene(cfg, &[(root_pos, Vec2::new(-1.0, 0.0))], vec![attractor])
                .unwrap();
        let before = engine.dropped_node_count();

        let new_ids = engine.grow();

        assert!(new_ids.is_empty());
        assert_eq!(engine.dropped_node_count(), before + 1);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let cfg = Config {
            max_dist: 10.0,
            min_dist: 20.0,
            ..Config::default()
        };
        assert!(GrowthEngine::new(cfg).is_err());
    }
}
