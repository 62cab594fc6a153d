use glam::Vec2;
use rand::Rng;

/// A consumable target point pulling nearby growth toward it.
#[derive(Clone, Debug)]
pub struct Attractor {
    pub pos: Vec2,
    pub weight: f32,
    pub reached: bool,
}

impl Attractor {
    pub fn new(pos: Vec2) -> Self {
        Self::weighted(pos, 1.0)
    }

    pub fn weighted(pos: Vec2, weight: f32) -> Self {
        Self {
            pos,
            weight,
            reached: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct AttractorSet {
    pub points: Vec<Attractor>,
}

impl AttractorSet {
    pub fn from_positions(positions: Vec<Vec2>) -> Self {
        let points = positions.into_iter().map(Attractor::new).collect();
        Self { points }
    }

    /// Scatters `count` attractors over `origin + [0, w) × [0, h)`.
    ///
    /// Positions are floored to whole units, as seeds on a pixel canvas.
    pub fn random_in_rect(origin: Vec2, w: f32, h: f32, count: usize, rng: &mut impl Rng) -> Self {
        let positions = (0..count)
            .map(|_| {
                let x = rng.random_range(0.0..w).floor();
                let y = rng.random_range(0.0..h).floor();
                origin + Vec2::new(x, y)
            })
            .collect();

        Self::from_positions(positions)
    }

    /// Like [`AttractorSet::random_in_rect`], but keeps only positions for
    /// which `keep` returns `true` (e.g. a signed-distance containment
    /// test). Rejected candidates are skipped, not re-drawn, so the result
    /// may hold fewer than `count` points.
    pub fn random_in_rect_masked(
        origin: Vec2,
        w: f32,
        h: f32,
        count: usize,
        rng: &mut impl Rng,
        keep: impl Fn(Vec2) -> bool,
    ) -> Self {
        let positions = (0..count)
            .map(|_| {
                let x = rng.random_range(0.0..w).floor();
                let y = rng.random_range(0.0..h).floor();
                origin + Vec2::new(x, y)
            })
            .filter(|&p| keep(p))
            .collect();

        Self::from_positions(positions)
    }

    pub fn active_count(&self) -> usize {
        self.points.iter().filter(|a| !a.reached).count()
    }

    /// Drops every reached attractor. Consumed attractors never return.
    pub fn retain_active(&mut self) {
        self.points.retain(|a| !a.reached);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn random_placement_stays_inside_the_rect() {
        let mut rng = SmallRng::seed_from_u64(7);
        let origin = Vec2::new(40.0, 40.0);
        let set = AttractorSet::random_in_rect(origin, 320.0, 320.0, 200, &mut rng);

        assert_eq!(set.points.len(), 200);
        for a in &set.points {
            assert!(a.pos.x >= 40.0 && a.pos.x < 360.0);
            assert!(a.pos.y >= 40.0 && a.pos.y < 360.0);
            assert_eq!(a.weight, 1.0);
            assert!(!a.reached);
        }
    }

    #[test]
    fn masked_placement_filters_positions() {
        let mut rng = SmallRng::seed_from_u64(7);
        let center = Vec2::new(200.0, 200.0);
        let set = AttractorSet::random_in_rect_masked(
            Vec2::ZERO,
            400.0,
            400.0,
            500,
            &mut rng,
            |p| p.distance(center) > 100.0,
        );

        assert!(!set.points.is_empty());
        assert!(set.points.len() < 500);
        for a in &set.points {
            assert!(a.pos.distance(center) > 100.0);
        }
    }

    #[test]
    fn retain_active_removes_reached_points_for_good() {
        let mut set =
            AttractorSet::from_positions(vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]);
        set.points[1].reached = true;

        assert_eq!(set.active_count(), 2);
        set.retain_active();
        assert_eq!(set.points.len(), 2);
        assert!(set.points.iter().all(|a| !a.reached));
    }
}
