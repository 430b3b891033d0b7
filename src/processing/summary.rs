use crate::config::SimulationConfig;
use crate::discretization::generator::TubeGeometry;
use crate::discretization::grid::Rect;
use crate::numerics::relaxation::SolverResult;
use crate::numerics::trajectory::{Impact, Termination, Trajectory};
use glam::DVec2;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub struct ElectrodeInfo {
    pub index: usize,
    pub rect: Rect,
    pub potential: f64,
}

/// Parameters and outcome of one run, echoed to the console and to a text file.
pub struct RunSummary {
    pub name: String,

    // Geometry
    pub ny: usize,
    pub nx: usize,
    pub scale: f64,
    pub extent_mm: (f64, f64),
    pub electrodes: Vec<ElectrodeInfo>,

    // Solver info
    pub tolerance: f64,
    pub max_iterations: u32,
    pub iterations: Option<u32>,
    pub final_delta: Option<f64>,
    pub converged: Option<bool>,
    pub potential_range: Option<(f64, f64)>,

    // Trajectory info
    pub dt: f64,
    pub max_steps: usize,
    pub start: DVec2,
    pub steps: Option<usize>,
    pub termination: Option<Termination>,
    pub final_position: Option<DVec2>,
    pub impacts: Vec<Impact>,
}

impl RunSummary {
    pub fn from_config(config: &SimulationConfig, geometry: &TubeGeometry) -> Self {
        let electrodes = geometry
            .electrodes
            .iter()
            .map(|e| ElectrodeInfo {
                index: e.sequence_index,
                rect: e.rect,
                potential: e.potential,
            })
            .collect();

        Self {
            name: config.name.clone(),
            ny: geometry.ny,
            nx: geometry.nx,
            scale: geometry.scale,
            extent_mm: geometry.extent_mm(),
            electrodes,
            tolerance: config.solver.tolerance,
            max_iterations: config.solver.max_iterations,
            iterations: None,
            final_delta: None,
            converged: None,
            potential_range: None,
            dt: config.integration.dt,
            max_steps: config.max_steps(),
            start: config.initial_state(geometry).position,
            steps: None,
            termination: None,
            final_position: None,
            impacts: Vec::new(),
        }
    }

    pub fn add_solver_info(&mut self, result: &SolverResult) {
        self.iterations = Some(result.iterations);
        self.final_delta = Some(result.final_delta);
        self.converged = Some(result.converged);
        self.potential_range = Some((result.solution.min(), result.solution.max()));
    }

    pub fn add_trajectory_info(&mut self, trajectory: &Trajectory) {
        self.steps = Some(trajectory.steps());
        self.termination = Some(trajectory.termination);
        self.final_position = Some(trajectory.final_state.position);
        self.impacts = trajectory.impacts.clone();
    }

    fn termination_text(termination: Termination) -> String {
        match termination {
            Termination::ExitedDomain { step } => format!("left the grid after step {}", step),
            Termination::StepBudgetExhausted => "step budget exhausted".to_string(),
        }
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        self.write_report(&mut file)
    }

    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out, "PMT SIMULATION SUMMARY ({})", self.name)?;
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out)?;

        writeln!(out, "GEOMETRY")?;
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out, "Grid:                {} x {} cells (ny x nx)", self.ny, self.nx)?;
        writeln!(out, "Scale:               {} cells/mm", self.scale)?;
        writeln!(
            out,
            "Extent:              {:.2} x {:.2} mm",
            self.extent_mm.0, self.extent_mm.1
        )?;
        writeln!(out, "Electrodes:          {}", self.electrodes.len())?;
        for e in &self.electrodes {
            writeln!(
                out,
                "  #{:<2} x {:>4}..{:<4} y {:>4}..{:<4} {:>8.1} V",
                e.index,
                e.rect.x,
                e.rect.x_end(),
                e.rect.y,
                e.rect.y_end(),
                e.potential
            )?;
        }
        writeln!(out)?;

        writeln!(out, "POTENTIAL SOLVER")?;
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out, "Tolerance:           {:.3e}", self.tolerance)?;
        writeln!(out, "Iteration cap:       {}", self.max_iterations)?;
        if let (Some(iter), Some(delta), Some(converged)) =
            (self.iterations, self.final_delta, self.converged)
        {
            writeln!(out, "Iterations:          {}", iter)?;
            writeln!(out, "Final delta:         {:.6e}", delta)?;
            writeln!(out, "Converged:           {}", converged)?;
        }
        if let Some((lo, hi)) = self.potential_range {
            writeln!(out, "Potential range:     {:.3} .. {:.3} V", lo, hi)?;
        }
        writeln!(out)?;

        writeln!(out, "TRAJECTORY")?;
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out, "Time step:           {:.3e} s", self.dt)?;
        writeln!(out, "Step budget:         {}", self.max_steps)?;
        writeln!(
            out,
            "Start:               ({:.3}, {:.3}) mm",
            self.start.x / self.scale,
            self.start.y / self.scale
        )?;
        if let (Some(steps), Some(termination)) = (self.steps, self.termination) {
            writeln!(out, "Steps taken:         {}", steps)?;
            writeln!(
                out,
                "Termination:         {}",
                Self::termination_text(termination)
            )?;
        }
        if let Some(p) = self.final_position {
            writeln!(
                out,
                "Final position:      ({:.3}, {:.3}) mm",
                p.x / self.scale,
                p.y / self.scale
            )?;
        }
        if !self.impacts.is_empty() {
            writeln!(out, "Collision responses: {}", self.impacts.len())?;
            for impact in &self.impacts {
                writeln!(
                    out,
                    "  step {:>6}  electrode #{:<2} -> ({:.3}, {:.3}) mm",
                    impact.step,
                    impact.electrode,
                    impact.position.x / self.scale,
                    impact.position.y / self.scale
                )?;
            }
        }
        writeln!(out)?;

        writeln!(out, "{}", "=".repeat(60))?;

        Ok(())
    }

    pub fn print_to_console(&self) {
        println!("\n{}", "=".repeat(60));
        println!("SIMULATION SUMMARY ({})", self.name);
        println!("{}", "=".repeat(60));
        println!(
            "Grid:          {} x {} cells, {} electrodes",
            self.ny,
            self.nx,
            self.electrodes.len()
        );
        if let (Some(iter), Some(delta)) = (self.iterations, self.final_delta) {
            println!("Relaxation:    {} iterations, delta {:.3e}", iter, delta);
        }
        if let (Some(steps), Some(termination)) = (self.steps, self.termination) {
            println!(
                "Trajectory:    {} steps, {}",
                steps,
                Self::termination_text(termination)
            );
        }
        if !self.impacts.is_empty() {
            println!("Impacts:       {}", self.impacts.len());
        }
        println!("{}\n", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_every_electrode() {
        let config = SimulationConfig::default();
        let geometry = config.validate().unwrap();
        let summary = RunSummary::from_config(&config, &geometry);

        let mut buf = Vec::new();
        summary.write_report(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("60 x 190 cells"));
        assert_eq!(text.matches("  #").count(), 4);
        assert!(text.contains("400.0 V"));
        // nothing solved yet
        assert!(!text.contains("Iterations:"));
    }
}
