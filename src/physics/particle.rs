use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Elementary charge of the electron (C).
pub const ELECTRON_CHARGE: f64 = -1.602e-19;
/// Electron rest mass (kg).
pub const ELECTRON_MASS: f64 = 9.109e-31;

/// Charge and mass of the simulated particle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub charge: f64,
    pub mass: f64,
}

impl Species {
    pub fn electron() -> Self {
        Self {
            charge: ELECTRON_CHARGE,
            mass: ELECTRON_MASS,
        }
    }

    pub fn charge_to_mass(&self) -> f64 {
        self.charge / self.mass
    }
}

impl Default for Species {
    fn default() -> Self {
        Self::electron()
    }
}

/// Position in cell units, velocity in cells per unit time, and the index of
/// the electrode the particle is expected to strike next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleState {
    pub position: DVec2,
    pub velocity: DVec2,
    pub next_electrode: usize,
}

impl ParticleState {
    pub fn new(position: DVec2, velocity: DVec2) -> Self {
        Self {
            position,
            velocity,
            next_electrode: 0,
        }
    }

    pub fn at_rest(position: DVec2) -> Self {
        Self::new(position, DVec2::ZERO)
    }

    /// Whether the particle lies inside `[0, nx) x [0, ny)`.
    pub fn is_inside(&self, ny: usize, nx: usize) -> bool {
        let p = self.position;
        p.x >= 0.0 && p.y >= 0.0 && p.x < nx as f64 && p.y < ny as f64
    }

    /// Pull the position back onto `[0, nx - 1] x [0, ny - 1]`.
    pub fn clamp_to(&mut self, ny: usize, nx: usize) {
        let max = DVec2::new(nx.saturating_sub(1) as f64, ny.saturating_sub(1) as f64);
        self.position = self.position.clamp(DVec2::ZERO, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn electron_charge_to_mass() {
        let q_m = Species::electron().charge_to_mass();
        assert!((q_m + 1.7587e11).abs() < 1e8);
    }

    #[test]
    fn domain_is_half_open() {
        let mut p = ParticleState::at_rest(DVec2::new(9.5, 0.0));
        assert!(p.is_inside(10, 10));
        p.position.x = 10.0;
        assert!(!p.is_inside(10, 10));
        p.clamp_to(10, 10);
        assert_eq!(p.position, DVec2::new(9.0, 0.0));
    }
}
