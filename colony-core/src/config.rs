use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported when a [`Config`] cannot drive a simulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Post-growth heading adjustment applied to every emitted branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteeringMode {
    /// Heading unchanged.
    None,
    /// Heading rounded to the nearest multiple of the branch angle.
    Rounding,
    /// Heading floored to a multiple of the branch angle; biases left turns.
    LeftRounding,
    /// Heading ceilinged to a multiple of the branch angle; biases right turns.
    RightRounding,
}

/// Per-tick perturbation applied to attractor positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistortionMode {
    None,
    /// `x += sin(0.5 * y)`, angle in degrees.
    SinWave1,
    /// `x += sin(2 * y)`.
    SinWave2,
    /// `x += 2 * sin(4 * y)`.
    SinWave3,
    /// Sine/cosine warp on both axes, phased by the seed.
    Warp,
    /// Flow-field lookup at the attractor's canvas-normalized position.
    Flow,
}

/// Grid parameters for the flow field backing [`DistortionMode::Flow`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowFieldConfig {
    pub cols: usize,
    pub rows: usize,
    /// Noise frequency per grid cell.
    pub k: f64,
}

impl Default for FlowFieldConfig {
    fn default() -> Self {
        Self {
            cols: 40,
            rows: 40,
            k: 0.00085,
        }
    }
}

/// All parameters of one growth run.
///
/// Passed by reference into the engine and reducer; there is no ambient
/// global configuration. Serializes to a flat key-value snapshot for the
/// export collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub width: f32,
    pub height: f32,
    pub num_attractors: usize,
    pub num_roots: usize,
    pub branch_length: f32,
    /// Consumption distance: an attractor closer than this to a node is reached.
    pub min_dist: f32,
    /// Interaction distance: attractors farther than this pull on nothing.
    pub max_dist: f32,
    /// Branch angle in degrees; the steering modes snap headings to its multiples.
    pub angle: f32,
    pub steering: SteeringMode,
    pub distortion: DistortionMode,
    pub flow: FlowFieldConfig,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 400.0,
            num_attractors: 500,
            num_roots: 1,
            branch_length: 4.0,
            min_dist: 24.0,
            max_dist: 96.0,
            angle: 120.0,
            steering: SteeringMode::LeftRounding,
            distortion: DistortionMode::None,
            flow: FlowFieldConfig::default(),
            seed: 0,
        }
    }
}

impl Config {
    /// Checks that the parameters can drive a simulation at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ConfigError::Invalid("canvas dimensions must be positive"));
        }
        if self.num_roots == 0 {
            return Err(ConfigError::Invalid("at least one root is required"));
        }
        if self.branch_length <= 0.0 {
            return Err(ConfigError::Invalid("branch_length must be positive"));
        }
        if self.min_dist <= 0.0 {
            return Err(ConfigError::Invalid("min_dist must be positive"));
        }
        if self.max_dist <= self.min_dist {
            return Err(ConfigError::Invalid("max_dist must exceed min_dist"));
        }
        if self.angle <= 0.0 {
            return Err(ConfigError::Invalid("angle must be positive"));
        }
        if self.distortion == DistortionMode::Flow && (self.flow.cols == 0 || self.flow.rows == 0) {
            return Err(ConfigError::Invalid("flow field grid must be non-empty"));
        }
        Ok(())
    }

    /// Tightly packed growth on a large canvas.
    pub fn dense() -> Self {
        Self {
            width: 1080.0,
            height: 1080.0,
            num_attractors: 25_000,
            branch_length: 4.0,
            min_dist: 8.0,
            max_dist: 24.0,
            angle: 120.0,
            steering: SteeringMode::LeftRounding,
            ..Self::default()
        }
    }

    /// Rectilinear growth: right-hand turns snapped to 90 degrees.
    pub fn boxy() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            num_attractors: 25_000,
            branch_length: 8.0,
            min_dist: 12.0,
            max_dist: 24.0,
            angle: 90.0,
            steering: SteeringMode::RightRounding,
            ..Self::default()
        }
    }

    /// Unsteered growth swept by a flow field.
    pub fn flow_field() -> Self {
        Self {
            width: 1080.0,
            height: 1080.0,
            num_attractors: 25_000,
            branch_length: 4.0,
            min_dist: 8.0,
            max_dist: 24.0,
            angle: 60.0,
            steering: SteeringMode::None,
            distortion: DistortionMode::Flow,
            ..Self::default()
        }
    }

    /// Multi-root rhizome clusters with a gentle sine drift.
    pub fn rhizomes() -> Self {
        Self {
            width: 540.0,
            height: 540.0,
            num_attractors: 5_000,
            num_roots: 3,
            branch_length: 2.0,
            min_dist: 3.0,
            max_dist: 16.0,
            angle: 7.0,
            steering: SteeringMode::Rounding,
            distortion: DistortionMode::SinWave1,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn presets_are_valid() {
        for cfg in [
            Config::dense(),
            Config::boxy(),
            Config::flow_field(),
            Config::rhizomes(),
        ] {
            assert_eq!(cfg.validate(), Ok(()), "preset failed: {cfg:?}");
        }
    }

    #[test]
    fn inverted_interaction_distances_are_rejected() {
        let cfg = Config {
            min_dist: 30.0,
            max_dist: 20.0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_roots_are_rejected() {
        let cfg = Config {
            num_roots: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_snapshot_serializes_to_flat_keys() {
        let cfg = Config::default();
        let snapshot = serde_json::to_value(cfg).unwrap();

        assert_eq!(snapshot["width"], 400.0);
        assert_eq!(snapshot["num_attractors"], 500);
        assert_eq!(snapshot["steering"], "LeftRounding");
        assert_eq!(snapshot["flow"]["cols"], 40);
    }
}
