// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Reference-state benchmark and demo runs
//!
//! 1. Temporal evolution from a perturbed state (latency per step)
//! 2. Spatial sweep over an attractor-derived phase field
//! 3. Observational predictions (Hubble deviation, w band, bulk flow)
//!
//! Writes JSON trajectories and HTML charts to `--out-dir`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use nalgebra::Vector3;
use tracing::info;

use refstate_engine::{
    ObservationalPredictions, PhaseSource, ReferenceStateSimulation, SimulationConfig,
    SimulationTrajectory, StepOutcome,
};
use refstate_field::attractor::fiducial_great_attractor;
use refstate_field::{
    recommended_step_size, Attractor, DarkEnergyModel, FieldState, GreatAttractorModel,
    PhysicalConstants, SpatialDomain, MEGAPARSEC,
};
use refstate_viz::{render_domain_map, render_trajectory, Series, Theme};

#[derive(Parser, Debug)]
#[command(name = "refstate-bench")]
#[command(about = "Run reference-state cosmology scenarios and render the results")]
struct Args {
    /// Directory for JSON and HTML output
    #[arg(short, long, default_value = "refstate-out")]
    out_dir: PathBuf,

    /// Temporal steps to integrate
    #[arg(short, long, default_value = "100")]
    steps: u64,

    /// Cells per side of the spatial grid
    #[arg(short, long, default_value = "16")]
    cells: usize,

    /// Physical constants as JSON (defaults to the fiducial set)
    #[arg(long)]
    constants: Option<PathBuf>,

    /// Use the light chart theme
    #[arg(long)]
    light: bool,

    /// Series to chart, e.g. `density,w,amplitude` (defaults to density,
    /// pressure, w and potential)
    #[arg(long, value_delimiter = ',')]
    series: Vec<Series>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let constants = match &args.constants {
        Some(path) => PhysicalConstants::from_path(path)
            .with_context(|| format!("failed to load constants from {}", path.display()))?,
        None => PhysicalConstants::fiducial(),
    };
    let theme = if args.light { Theme::Light } else { Theme::Dark };
    let series: &[Series] = if args.series.is_empty() { &Series::DEFAULT } else { &args.series };

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    println!("=== Reference State Benchmarks ===\n");
    print_background(&constants)?;

    let predictions = ObservationalPredictions::new(&constants)?;
    let temporal = run_temporal(&constants, args.steps)?;
    temporal.write_json(args.out_dir.join("trajectory.json"))?;
    let summary = predictions.summarize(&temporal);
    write_text(
        &args.out_dir.join("trajectory.html"),
        &render_trajectory(&temporal, series, Some(&summary), theme),
    )?;
    write_text(
        &args.out_dir.join("summary.json"),
        &serde_json::to_string_pretty(&summary)?,
    )?;
    print_summary(&predictions, &temporal)?;

    run_spatial(&constants, args.cells, &args.out_dir, theme)?;
    print_flows(&constants, &predictions)?;

    println!("\nOutput written to {}", args.out_dir.display());
    Ok(())
}

fn print_background(constants: &PhysicalConstants) -> Result<()> {
    let model = DarkEnergyModel::new(constants)?;
    println!("--- Background ---");
    println!(
        "  H0 = {:.4e} 1/s, L_c = {:.2} Mpc, T_c = {:.4e} s",
        constants.hubble_constant,
        constants.coherence_length / MEGAPARSEC,
        constants.coherence_time,
    );
    println!("  Ω_DE(a=1) = {:.4}", constants.dark_energy_density_parameter());
    for a in [0.5, 1.0, 2.0] {
        let obs = model.observables(a)?;
        match obs.equation_of_state.value() {
            Some(w) => println!("  a = {a:.1}: ρ = {:.4e} J/m³, w = {w:+.4}", obs.density),
            None => println!("  a = {a:.1}: ρ = {:.4e} J/m³, w undefined", obs.density),
        }
    }
    println!();
    Ok(())
}

fn run_temporal(constants: &PhysicalConstants, steps: u64) -> Result<SimulationTrajectory> {
    let dt = recommended_step_size(constants);
    let initial = FieldState::new(1.02, 0.7, 0.0, 0.05 / constants.coherence_time)?;
    let config = SimulationConfig::temporal(steps, dt).with_initial_state(initial);
    let mut sim = ReferenceStateSimulation::new(constants, config)?;

    let start = Instant::now();
    let outcome = sim.run();
    let elapsed = start.elapsed();

    let per_step_us = elapsed.as_micros() as f64 / steps.max(1) as f64;
    println!(
        "[CPU] Temporal: {} steps in {:.2}ms ({:.1}us/step, a = {:.6})",
        sim.steps_taken(),
        elapsed.as_secs_f64() * 1000.0,
        per_step_us,
        sim.scale_factor(),
    );
    if outcome != StepOutcome::Completed {
        if let Some(failure) = sim.trajectory().failure() {
            bail!("temporal run failed at step {}: {}", failure.step, failure.message);
        }
        bail!("temporal run stopped in phase {}", sim.phase().label());
    }
    Ok(sim.into_trajectory())
}

fn run_spatial(constants: &PhysicalConstants, cells: usize, out_dir: &Path, theme: Theme) -> Result<()> {
    let lc = constants.coherence_length;
    let spacing = 0.5 * lc;
    let half = 0.5 * cells as f64 * spacing;
    let config = SimulationConfig::spatial(SpatialDomain::centered_square(cells, spacing)?)
        .with_attractors(vec![
            Attractor::new(Vector3::new(-0.4 * half, 0.3 * half, 0.0), 1.0, 0.0),
            Attractor::new(Vector3::new(0.45 * half, -0.2 * half, 0.0), 0.8, 3.0),
        ])
        .with_phase_source(PhaseSource::Attractors);
    let mut sim = ReferenceStateSimulation::new(constants, config)?;

    let start = Instant::now();
    let outcome = sim.run();
    let elapsed = start.elapsed();
    println!(
        "[CPU] Spatial: {} cells in {:.2}ms",
        sim.steps_taken(),
        elapsed.as_secs_f64() * 1000.0,
    );
    info!(outcome = ?outcome, "spatial sweep finished");

    sim.trajectory().write_json(out_dir.join("spatial.json"))?;

    let Some(web) = sim.cosmic_web() else {
        bail!("spatial run has no cosmic web");
    };
    println!(
        "  {} domains, filament fraction {:.3}",
        web.domain_count(),
        web.filament_fraction(),
    );
    if let Some(f) = web.filament_statistics() {
        println!("  filament density contrast {:+.4}", f.density_contrast);
    }
    let radii = ObservationalPredictions::new(constants)?.filament_size_distribution(web);
    if let Some(largest) = radii.last() {
        println!("  largest domain radius {:.2} Mpc", largest / MEGAPARSEC);
    }
    write_text(&out_dir.join("domains.html"), &render_domain_map(web, 0, theme))
}

fn print_summary(predictions: &ObservationalPredictions, trajectory: &SimulationTrajectory) -> Result<()> {
    println!("\n--- Predictions ---");
    println!(
        "  mean ΔH/H = {:+.4e}",
        predictions.mean_hubble_deviation(trajectory)?
    );
    match predictions.cpl_fit(trajectory) {
        Ok(cpl) => println!("  CPL: w0 = {:+.4}, wa = {:+.4}", cpl.w0, cpl.wa),
        Err(e) => println!("  CPL: {e}"),
    }
    Ok(())
}

fn print_flows(constants: &PhysicalConstants, predictions: &ObservationalPredictions) -> Result<()> {
    let model = GreatAttractorModel::new(constants, vec![fiducial_great_attractor()])?;
    let dipole = predictions.dipole_velocity(&model, &Vector3::zeros())?;
    println!("\n--- Flows ---");
    println!(
        "  dipole at origin: {:.1} km/s toward ({:+.3}, {:+.3}, {:+.3})",
        dipole.norm() / 1000.0,
        dipole.x / dipole.norm().max(f64::MIN_POSITIVE),
        dipole.y / dipole.norm().max(f64::MIN_POSITIVE),
        dipole.z / dipole.norm().max(f64::MIN_POSITIVE),
    );
    let flow = predictions.bulk_flow(&model, &Vector3::zeros(), 20.0 * MEGAPARSEC, 64)?;
    println!(
        "  bulk flow (R = 20 Mpc, {} points): {:.1} km/s",
        flow.samples,
        flow.speed() / 1000.0,
    );
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
