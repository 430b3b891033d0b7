use anyhow::{Context, Result};
use pmt_sim::config::SimulationConfig;
use pmt_sim::logging::init_logging;
use pmt_sim::models::pmt::Preset;
use pmt_sim::physics::field::compute_field;
use pmt_sim::processing::csv_writer;
use pmt_sim::processing::summary::RunSummary;
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    init_logging(None);

    let mut args = std::env::args().skip(1);
    let source = args.next().unwrap_or_else(|| Preset::Standard.name().to_string());
    let config = load_config(&source)?;
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new("output").join(&config.name));

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let geometry = config.validate().context("invalid configuration")?;
    let mut summary = RunSummary::from_config(&config, &geometry);

    println!("Relaxing potential on {} x {} grid...", geometry.ny, geometry.nx);
    let solved = config.solver().solve_tube(&geometry)?;
    summary.add_solver_info(&solved);

    let field = compute_field(&solved.solution, geometry.scale)?;

    println!("Integrating trajectory...");
    let trajectory = config.integrator().integrate(
        &field,
        &solved.solution,
        &geometry.electrodes,
        config.initial_state(&geometry),
    )?;
    summary.add_trajectory_info(&trajectory);

    let scale = geometry.scale;
    csv_writer::write_grid(out_dir.join("potential.csv"), &solved.solution, scale)?;
    csv_writer::write_field(out_dir.join("field.csv"), &field, scale)?;
    csv_writer::write_trajectory(out_dir.join("trajectory.csv"), &trajectory, scale)?;
    csv_writer::write_history(out_dir.join("convergence.csv"), &solved.history)?;
    fs::write(out_dir.join("config.json"), config.to_json()?)?;

    let summary_path = out_dir.join("simulation_summary.txt");
    summary.write_to_file(&summary_path)?;
    summary.print_to_console();

    println!("Outputs saved to {}", out_dir.display());
    Ok(())
}

/// A preset name, or a path to a JSON configuration.
fn load_config(source: &str) -> Result<SimulationConfig> {
    if let Some(preset) = Preset::from_name(source) {
        return Ok(preset.config());
    }
    let path = Path::new(source);
    if path.extension().is_some_and(|ext| ext == "json") || path.exists() {
        let mut config = SimulationConfig::from_json_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        if config.name.is_empty() {
            config.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom".to_string());
        }
        return Ok(config);
    }
    source
        .parse::<Preset>()
        .map(Preset::config)
        .map_err(anyhow::Error::msg)
}
