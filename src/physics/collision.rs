use super::particle::ParticleState;
use crate::discretization::grid::{Electrode, Grid};
use crate::numerics::interpolation::nearest;
use serde::{Deserialize, Serialize};

/// How the particle reacts on reaching a dynode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Dynodes are transparent; only the boundary policy stops the particle.
    None,
    /// Flip `vy` whenever the potential of the nearest cell lies within
    /// `margin` volts of any electrode's potential.
    ///
    /// This is a proxy for touching a plate and can fire in free space where
    /// the potential happens to match a dynode voltage.
    PotentialMatch { margin: f64 },
    /// Only the next expected electrode is tested. On entering it the particle
    /// is moved `rebound` cells away vertically, `vy` is zeroed and the
    /// expectation advances. Entering any other electrode is ignored.
    SequentialImpact { rebound: f64 },
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        CollisionPolicy::None
    }
}

impl CollisionPolicy {
    /// Apply the policy to the post-step state. Returns the index (into
    /// `electrodes`) of the electrode that triggered a response, if any.
    pub fn apply(
        &self,
        state: &mut ParticleState,
        electrodes: &[Electrode],
        potential: &Grid,
    ) -> Option<usize> {
        match *self {
            CollisionPolicy::None => None,
            CollisionPolicy::PotentialMatch { margin } => {
                let local = nearest(potential, state.position.x, state.position.y)?;
                let hit = electrodes
                    .iter()
                    .position(|e| (local - e.potential).abs() <= margin)?;
                state.velocity.y = -state.velocity.y;
                Some(hit)
            }
            CollisionPolicy::SequentialImpact { rebound } => {
                let index = state.next_electrode;
                let target = electrodes.get(index)?;
                if !target.rect.contains_point(state.position.x, state.position.y) {
                    return None;
                }
                let direction = if state.velocity.y > 0.0 { -1.0 } else { 1.0 };
                state.position.y += direction * rebound;
                state.velocity.y = 0.0;
                state.next_electrode += 1;
                Some(index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::grid::Rect;
    use glam::DVec2;

    fn electrodes() -> Vec<Electrode> {
        vec![
            Electrode::new(Rect::new(2, 2, 4, 1), 100.0, 0),
            Electrode::new(Rect::new(8, 7, 4, 1), 200.0, 1),
        ]
    }

    #[test]
    fn none_never_reacts() {
        let mut state = ParticleState::new(DVec2::new(3.0, 2.5), DVec2::new(1.0, -1.0));
        let before = state;
        let hit = CollisionPolicy::None.apply(&mut state, &electrodes(), &Grid::zeros(10, 14));
        assert_eq!(hit, None);
        assert_eq!(state, before);
    }

    #[test]
    fn potential_match_flips_vertical_velocity() {
        let mut potential = Grid::zeros(10, 14);
        potential[(4, 5)] = 199.5;
        let policy = CollisionPolicy::PotentialMatch { margin: 1.0 };

        let mut state = ParticleState::new(DVec2::new(5.2, 3.8), DVec2::new(2.0, 3.0));
        assert_eq!(policy.apply(&mut state, &electrodes(), &potential), Some(1));
        assert_eq!(state.velocity, DVec2::new(2.0, -3.0));

        let mut far = ParticleState::new(DVec2::new(1.0, 1.0), DVec2::new(2.0, 3.0));
        assert_eq!(policy.apply(&mut far, &electrodes(), &potential), None);
        assert_eq!(far.velocity, DVec2::new(2.0, 3.0));
    }

    #[test]
    fn potential_match_ignores_off_grid_positions() {
        let potential = Grid::from_element(4, 4, 100.0);
        let policy = CollisionPolicy::PotentialMatch { margin: 1.0 };
        let mut state = ParticleState::new(DVec2::new(-3.0, 1.0), DVec2::new(0.0, 1.0));
        assert_eq!(policy.apply(&mut state, &electrodes(), &potential), None);
    }

    #[test]
    fn sequential_impact_only_tests_expected_electrode() {
        let policy = CollisionPolicy::SequentialImpact { rebound: 3.0 };
        let potential = Grid::zeros(10, 14);

        // Inside electrode 1 while electrode 0 is expected: ignored.
        let mut state = ParticleState::new(DVec2::new(9.0, 7.5), DVec2::new(1.0, 2.0));
        assert_eq!(policy.apply(&mut state, &electrodes(), &potential), None);
        assert_eq!(state.next_electrode, 0);

        // Moving up into electrode 0: pushed down, vy cleared.
        let mut state = ParticleState::new(DVec2::new(3.0, 2.5), DVec2::new(1.0, 2.0));
        assert_eq!(policy.apply(&mut state, &electrodes(), &potential), Some(0));
        assert_eq!(state.position, DVec2::new(3.0, -0.5));
        assert_eq!(state.velocity, DVec2::new(1.0, 0.0));
        assert_eq!(state.next_electrode, 1);
    }

    #[test]
    fn sequential_impact_stops_after_last_electrode() {
        let policy = CollisionPolicy::SequentialImpact { rebound: 3.0 };
        let mut state = ParticleState::new(DVec2::new(9.0, 7.5), DVec2::new(0.0, -1.0));
        state.next_electrode = 2;
        assert_eq!(
            policy.apply(&mut state, &electrodes(), &Grid::zeros(10, 14)),
            None
        );
    }
}
