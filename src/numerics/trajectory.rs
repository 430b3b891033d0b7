use crate::discretization::grid::{Electrode, Grid};
use crate::numerics::interpolation::Sampling;
use crate::physics::collision::CollisionPolicy;
use crate::physics::field::{ElectricField, FieldError};
use crate::physics::particle::{ParticleState, Species};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Samples preallocated up front; longer runs grow the buffers on demand.
const PREALLOC_STEPS: usize = 1 << 16;

/// What happens when a step carries the particle off the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Stop as soon as the position leaves `[0, nx) x [0, ny)`.
    Terminate,
    /// Pull the position back onto the grid after every step and carry on.
    Clamp,
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        BoundaryPolicy::Terminate
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TrajectoryError {
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    #[error("particle mass must be non-zero and finite, got {0}")]
    InvalidMass(f64),
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Why integration stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The particle was found outside the grid after `step` steps.
    ExitedDomain { step: usize },
    StepBudgetExhausted,
}

/// A collision response recorded during integration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    /// 1-based step at which the response fired.
    pub step: usize,
    /// Index into the electrode list handed to the integrator.
    pub electrode: usize,
    /// Position after the response.
    pub position: DVec2,
}

/// Sampled path of one particle. `positions[0]` is the initial state.
#[derive(Clone, Debug)]
pub struct Trajectory {
    pub positions: Vec<DVec2>,
    pub velocities: Vec<DVec2>,
    pub impacts: Vec<Impact>,
    pub termination: Termination,
    pub final_state: ParticleState,
}

impl Trajectory {
    /// Number of integration steps taken.
    pub fn steps(&self) -> usize {
        self.positions.len() - 1
    }

    /// Positions converted from cells to physical length units.
    pub fn positions_scaled(&self, scale: f64) -> Vec<DVec2> {
        self.positions.iter().map(|p| *p / scale).collect()
    }
}

/// Explicit Euler pusher for a point charge in a static field.
#[derive(Clone, Copy, Debug)]
pub struct TrajectoryIntegrator {
    pub dt: f64,
    pub max_steps: usize,
    pub species: Species,
    /// Converts `(q / m) * E` into the position units per unit time squared.
    /// With `E` in volts per mm, `1e3` yields volts per metre.
    pub acceleration_scale: f64,
    pub boundary: BoundaryPolicy,
    pub collision: CollisionPolicy,
    pub sampling: Sampling,
}

impl Default for TrajectoryIntegrator {
    fn default() -> Self {
        Self {
            dt: 3e-11,
            max_steps: 4333,
            species: Species::electron(),
            acceleration_scale: 1e3,
            boundary: BoundaryPolicy::Clamp,
            collision: CollisionPolicy::None,
            sampling: Sampling::Bilinear,
        }
    }
}

impl TrajectoryIntegrator {
    fn validate(&self) -> Result<(), TrajectoryError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(TrajectoryError::InvalidTimeStep(self.dt));
        }
        if !self.species.mass.is_finite() || self.species.mass == 0.0 {
            return Err(TrajectoryError::InvalidMass(self.species.mass));
        }
        Ok(())
    }

    /// Advance one step: sample `E`, update velocity then position, apply the
    /// boundary policy, then the collision policy. Returns the electrode that
    /// triggered a collision response, if any.
    pub fn step(
        &self,
        state: &mut ParticleState,
        field: &ElectricField,
        potential: &Grid,
        electrodes: &[Electrode],
    ) -> Option<usize> {
        let (ny, nx) = field.shape();
        let accel = field.sample_with(state.position, self.sampling)
            * (self.species.charge_to_mass() * self.acceleration_scale);

        state.velocity += accel * self.dt;
        state.position += state.velocity * self.dt;

        if self.boundary == BoundaryPolicy::Clamp {
            state.clamp_to(ny, nx);
        }

        self.collision.apply(state, electrodes, potential)
    }

    /// Integrate from `initial` until the particle leaves the grid or the step
    /// budget runs out. `electrodes` must be in strike order for
    /// [`CollisionPolicy::SequentialImpact`].
    pub fn integrate(
        &self,
        field: &ElectricField,
        potential: &Grid,
        electrodes: &[Electrode],
        initial: ParticleState,
    ) -> Result<Trajectory, TrajectoryError> {
        self.validate()?;
        field.ensure_matches(potential)?;

        let (ny, nx) = field.shape();
        let mut state = initial;
        let capacity = self.max_steps.min(PREALLOC_STEPS).saturating_add(1);
        let mut positions = Vec::with_capacity(capacity);
        let mut velocities = Vec::with_capacity(capacity);
        let mut impacts = Vec::new();
        positions.push(state.position);
        velocities.push(state.velocity);

        let mut termination = Termination::StepBudgetExhausted;
        for step in 0..self.max_steps {
            // A rebound can push a clamped particle off the grid, so the exit
            // test runs before every step under both boundary policies.
            if !state.is_inside(ny, nx) {
                termination = Termination::ExitedDomain { step };
                break;
            }

            if let Some(electrode) = self.step(&mut state, field, potential, electrodes) {
                log::debug!(
                    "step {}: response at electrode {} -> ({:.2}, {:.2})",
                    step + 1,
                    electrode,
                    state.position.x,
                    state.position.y
                );
                impacts.push(Impact {
                    step: step + 1,
                    electrode,
                    position: state.position,
                });
            }

            positions.push(state.position);
            velocities.push(state.velocity);
        }

        if termination == Termination::StepBudgetExhausted && !state.is_inside(ny, nx) {
            termination = Termination::ExitedDomain {
                step: self.max_steps,
            };
        }

        log::info!(
            "trajectory finished after {} steps ({:?}), {} collision responses",
            positions.len() - 1,
            termination,
            impacts.len()
        );

        Ok(Trajectory {
            positions,
            velocities,
            impacts,
            termination,
            final_state: state,
        })
    }
}
