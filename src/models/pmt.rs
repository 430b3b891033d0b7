use crate::config::{CollisionConfig, IntegrationConfig, ParticleConfig, SimulationConfig};
use crate::discretization::generator::{Layout, TubeDimensions};
use crate::numerics::trajectory::BoundaryPolicy;
use std::fmt;
use std::str::FromStr;

/// Named tube configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Four wall-anchored dynodes, no collision handling.
    Standard,
    /// `Standard` with potential-match rebound and exit on leaving the grid.
    StandardRebound,
    /// Four dynodes hugging the axis at double resolution, sequential impacts.
    Adjusted,
    TwelveDynode,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Standard,
        Preset::StandardRebound,
        Preset::Adjusted,
        Preset::TwelveDynode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Standard => "standard",
            Preset::StandardRebound => "standard-rebound",
            Preset::Adjusted => "adjusted",
            Preset::TwelveDynode => "twelve-dynode",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn config(self) -> SimulationConfig {
        let base = SimulationConfig {
            name: self.name().to_string(),
            ..SimulationConfig::default()
        };
        match self {
            Preset::Standard => base,
            Preset::StandardRebound => SimulationConfig {
                integration: IntegrationConfig {
                    boundary: BoundaryPolicy::Terminate,
                    collision: CollisionConfig::PotentialMatch { margin: 1.0 },
                    ..base.integration
                },
                ..base
            },
            Preset::Adjusted => SimulationConfig {
                geometry: TubeDimensions {
                    scale: 20.0,
                    end_gap: 5.5,
                    length: 5.0,
                    spacing: 11.0,
                    thickness: 0.5,
                    height: 6.0,
                    layout: Layout::Centered { offset: 1.5 },
                    ..TubeDimensions::default()
                },
                particle: on_axis(),
                integration: IntegrationConfig {
                    duration: 1.7e-7,
                    boundary: BoundaryPolicy::Clamp,
                    collision: CollisionConfig::SequentialImpact { rebound: 2.0 },
                    ..IntegrationConfig::default()
                },
                ..base
            },
            Preset::TwelveDynode => SimulationConfig {
                geometry: TubeDimensions {
                    scale: 10.0,
                    end_gap: 2.25,
                    length: 8.0,
                    spacing: 6.8,
                    thickness: 0.4,
                    height: 10.86,
                    width: Some(93.3),
                    count: 12,
                    layout: Layout::Centered { offset: 2.0 },
                    ..TubeDimensions::default()
                },
                particle: on_axis(),
                integration: IntegrationConfig {
                    duration: 3.15e-7,
                    boundary: BoundaryPolicy::Clamp,
                    collision: CollisionConfig::SequentialImpact { rebound: 2.0 },
                    ..IntegrationConfig::default()
                },
                ..base
            },
        }
    }
}

fn on_axis() -> ParticleConfig {
    ParticleConfig {
        y0: None,
        ..ParticleConfig::default()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
            format!("unknown preset '{}' (known: {})", s, known.join(", "))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::CollisionPolicy;

    #[test]
    fn every_preset_validates() {
        for preset in Preset::ALL {
            let cfg = preset.config();
            let geometry = cfg
                .validate()
                .unwrap_or_else(|e| panic!("{} failed: {}", preset, e));
            assert_eq!(geometry.electrodes.len(), cfg.geometry.count);
        }
    }

    #[test]
    fn grid_sizes() {
        let size = |p: Preset| {
            let g = p.config().validate().unwrap();
            (g.ny, g.nx)
        };
        assert_eq!(size(Preset::Standard), (60, 190));
        assert_eq!(size(Preset::Adjusted), (120, 800));
        assert_eq!(size(Preset::TwelveDynode), (108, 933));
    }

    #[test]
    fn adjusted_starts_on_axis_with_rebound_in_cells() {
        let cfg = Preset::Adjusted.config();
        let geometry = cfg.validate().unwrap();
        let start = cfg.initial_state(&geometry);
        assert_eq!(start.position.y, 60.0);
        assert_eq!(
            cfg.integrator().collision,
            CollisionPolicy::SequentialImpact { rebound: 40.0 }
        );
        assert_eq!(cfg.max_steps(), 5666);
    }

    #[test]
    fn names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>(), Ok(preset));
        }
        assert!("nope".parse::<Preset>().is_err());
    }
}
