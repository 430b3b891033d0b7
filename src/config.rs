use crate::discretization::generator::{TubeDimensions, TubeGeometry};
use crate::discretization::grid::Rect;
use crate::numerics::interpolation::Sampling;
use crate::numerics::relaxation::RelaxationSolver;
use crate::numerics::trajectory::{BoundaryPolicy, TrajectoryIntegrator};
use crate::physics::collision::CollisionPolicy;
use crate::physics::particle::{ParticleState, Species};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Largest accepted `trunc(duration / dt)`.
pub const MAX_STEPS: f64 = 1e7;

/// Malformed configuration. Raised before any solver work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scale must be positive and finite, got {0} cells/mm")]
    InvalidScale(f64),
    #[error("{name} must be a non-negative finite length, got {value}")]
    InvalidLength { name: &'static str, value: f64 },
    #[error("voltage step must be finite, got {0}")]
    InvalidVoltage(f64),
    #[error("at least one electrode is required")]
    NoElectrodes,
    #[error("{name} of {value} mm is thinner than one grid cell")]
    SubCellFeature { name: &'static str, value: f64 },
    #[error("grid of {ny}x{nx} cells leaves no interior")]
    GridTooSmall { ny: usize, nx: usize },
    #[error("electrode {index} at {rect:?} does not fit inside the {ny}x{nx} grid with a 1-cell border")]
    ElectrodeOutOfBounds {
        index: usize,
        rect: Rect,
        ny: usize,
        nx: usize,
    },
    #[error("{name} is out of range, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let solver = RelaxationSolver::default();
        Self {
            tolerance: solver.tolerance,
            max_iterations: solver.max_iterations,
        }
    }
}

/// Initial state of the particle. Position in mm, velocity in m/s.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub x0: f64,
    /// Start height; the tube axis when absent.
    pub y0: Option<f64>,
    pub vx0: f64,
    pub vy0: f64,
    pub species: Species,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            x0: 0.0,
            y0: Some(3.0),
            vx0: 0.0,
            vy0: 0.0,
            species: Species::electron(),
        }
    }
}

/// Collision response with distances in mm.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollisionConfig {
    None,
    PotentialMatch { margin: f64 },
    SequentialImpact { rebound: f64 },
}

impl Default for CollisionConfig {
    fn default() -> Self {
        CollisionConfig::None
    }
}

impl CollisionConfig {
    pub fn to_policy(self, scale: f64) -> CollisionPolicy {
        match self {
            CollisionConfig::None => CollisionPolicy::None,
            CollisionConfig::PotentialMatch { margin } => CollisionPolicy::PotentialMatch { margin },
            CollisionConfig::SequentialImpact { rebound } => CollisionPolicy::SequentialImpact {
                rebound: rebound * scale,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub dt: f64,
    /// Total simulated time; the step budget is `trunc(duration / dt)`.
    pub duration: f64,
    pub acceleration_scale: f64,
    pub boundary: BoundaryPolicy,
    pub collision: CollisionConfig,
    /// Field interpolation between grid nodes.
    pub sampling: Sampling,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            dt: 3e-11,
            duration: 1.3e-7,
            acceleration_scale: 1e3,
            boundary: BoundaryPolicy::Clamp,
            collision: CollisionConfig::None,
            sampling: Sampling::Bilinear,
        }
    }
}

/// Everything needed for one geometry -> potential -> field -> trajectory run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub name: String,
    pub geometry: TubeDimensions,
    pub solver: SolverConfig,
    pub particle: ParticleConfig,
    pub integration: IntegrationConfig,
}

impl SimulationConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidParameter { name, value });
        }
        Ok(())
    }

    fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::InvalidParameter { name, value });
        }
        Ok(())
    }

    /// Check every section and build the tube geometry.
    pub fn validate(&self) -> Result<TubeGeometry, ConfigError> {
        let geometry = self.geometry.build()?;

        if self.solver.tolerance.is_nan() || self.solver.tolerance < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "tolerance",
                value: self.solver.tolerance,
            });
        }
        Self::positive("dt", self.integration.dt)?;
        Self::positive("duration", self.integration.duration)?;
        let budget = self.integration.duration / self.integration.dt;
        if !budget.is_finite() || budget > MAX_STEPS {
            return Err(ConfigError::InvalidParameter {
                name: "duration",
                value: self.integration.duration,
            });
        }
        Self::finite("acceleration_scale", self.integration.acceleration_scale)?;
        Self::finite("charge", self.particle.species.charge)?;
        Self::finite("x0", self.particle.x0)?;
        Self::finite("vx0", self.particle.vx0)?;
        Self::finite("vy0", self.particle.vy0)?;
        if let Some(y0) = self.particle.y0 {
            Self::finite("y0", y0)?;
        }
        if !self.particle.species.mass.is_finite() || self.particle.species.mass == 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "mass",
                value: self.particle.species.mass,
            });
        }
        match self.integration.collision {
            CollisionConfig::PotentialMatch { margin } if margin.is_nan() || margin < 0.0 => {
                return Err(ConfigError::InvalidParameter {
                    name: "margin",
                    value: margin,
                });
            }
            CollisionConfig::SequentialImpact { rebound } if rebound.is_nan() || rebound < 0.0 => {
                return Err(ConfigError::InvalidParameter {
                    name: "rebound",
                    value: rebound,
                });
            }
            _ => {}
        }

        Ok(geometry)
    }

    pub fn solver(&self) -> RelaxationSolver {
        RelaxationSolver::new(self.solver.tolerance, self.solver.max_iterations)
    }

    pub fn max_steps(&self) -> usize {
        (self.integration.duration / self.integration.dt) as usize
    }

    pub fn integrator(&self) -> TrajectoryIntegrator {
        TrajectoryIntegrator {
            dt: self.integration.dt,
            max_steps: self.max_steps(),
            species: self.particle.species,
            acceleration_scale: self.integration.acceleration_scale,
            boundary: self.integration.boundary,
            collision: self.integration.collision.to_policy(self.geometry.scale),
            sampling: self.integration.sampling,
        }
    }

    /// Initial particle state in cell units.
    pub fn initial_state(&self, geometry: &TubeGeometry) -> ParticleState {
        let scale = self.geometry.scale;
        let y0 = self
            .particle
            .y0
            .map(|y| y * scale)
            .unwrap_or(geometry.ny as f64 / 2.0);
        ParticleState::new(
            DVec2::new(self.particle.x0 * scale, y0),
            DVec2::new(self.particle.vx0, self.particle.vy0),
        )
    }
}
