// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! ReferenceStateSimulation: the stepping driver
//!
//! Each call to `step()` produces at most one sample: in temporal mode it
//! evolves the field by dt and advances the scale factor alongside; in
//! spatial mode it evaluates the next cell of the domain in raster order.
//! The models are then sampled at the new state and the result appended to
//! the trajectory.
//!
//! State machine: Configured → Running → Completed | Failed. A model error
//! ends the run; samples already recorded are kept and the error is stored
//! on the trajectory. Stepping a finished run is a no-op.

use nalgebra::Vector3;
use refstate_field::field::energy_terms;
use refstate_field::{
    recommended_step_size, AdaptiveTimestep, CellClass, CosmicWebModel, CosmologyError,
    DarkEnergyModel, FieldState, GreatAttractorModel, PhaseField, PhysicalConstants,
    ReferenceStateField, Result,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{PhaseSource, SimulationConfig, SimulationMode, StepControl};
use crate::sample::{ObservableSample, SampleCoordinate};
use crate::trajectory::{FailureReason, SimulationTrajectory};

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationPhase {
    Configured,
    Running,
    Completed,
    Failed,
}

impl SimulationPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Configured => "configured",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Result of one call to [`ReferenceStateSimulation::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A sample was appended and more steps remain.
    Sampled { index: usize },
    /// The final sample has been appended (or the run was already done).
    Completed,
    /// The run has failed; see the trajectory's failure reason.
    Failed,
}

/// Stepping driver that owns one run and its trajectory.
pub struct ReferenceStateSimulation {
    constants: PhysicalConstants,
    config: SimulationConfig,
    field: ReferenceStateField,
    dark_energy: DarkEnergyModel,
    attractors: Option<GreatAttractorModel>,
    web: Option<CosmicWebModel>,
    phase: SimulationPhase,
    state: FieldState,
    scale_factor: f64,
    time: f64,
    dt: f64,
    adaptive: Option<AdaptiveTimestep>,
    oversized_step: bool,
    cursor: u64,
    total: u64,
    trajectory: SimulationTrajectory,
}

impl ReferenceStateSimulation {
    /// Validate everything up front; configuration errors never reach the
    /// stepping loop.
    pub fn new(constants: &PhysicalConstants, config: SimulationConfig) -> Result<Self> {
        constants.validate()?;
        config.validate()?;

        let attractors = if config.attractors.is_empty() {
            None
        } else {
            Some(GreatAttractorModel::new(constants, config.attractors.clone())?)
        };

        let recommended = recommended_step_size(constants);
        let mut oversized_step = false;
        let (web, total, dt, scale_factor) = match &config.mode {
            SimulationMode::Temporal {
                steps,
                dt,
                initial_scale_factor,
            } => {
                if *dt > recommended {
                    oversized_step = true;
                    warn!(
                        dt = *dt,
                        recommended,
                        "Step size exceeds the recommended step; field oscillations may alias"
                    );
                }
                (None, *steps, *dt, *initial_scale_factor)
            }
            SimulationMode::Spatial {
                domain,
                phase_source,
            } => {
                let field = match phase_source {
                    PhaseSource::Uniform { phase } => PhaseField::uniform(domain.clone(), *phase),
                    PhaseSource::Attractors => match &attractors {
                        Some(model) => PhaseField::from_attractors(domain.clone(), model),
                        None => {
                            return Err(CosmologyError::configuration(
                                "phase_source",
                                "attractor phase source needs at least one attractor",
                            ))
                        }
                    },
                    PhaseSource::RandomModes { modes, seed } => PhaseField::random_modes(
                        domain.clone(),
                        *modes,
                        constants.coherence_length,
                        *seed,
                    ),
                    PhaseSource::Values(values) => PhaseField::new(domain.clone(), values.clone())?,
                };
                let web = CosmicWebModel::new(constants, field)?;
                info!(
                    cells = domain.num_cells(),
                    domains = web.domain_count(),
                    filament_fraction = web.filament_fraction(),
                    "Classified spatial domain"
                );
                (Some(web), domain.num_cells() as u64, 0.0, 1.0)
            }
        };

        let adaptive = match (config.step_control, config.is_spatial()) {
            (StepControl::Adaptive, false) => Some(AdaptiveTimestep::new(dt, recommended)),
            _ => None,
        };
        let dt = adaptive.as_ref().map_or(dt, |a| a.current_dt());

        Ok(Self {
            constants: constants.clone(),
            field: ReferenceStateField::new(config.integrator),
            dark_energy: DarkEnergyModel::new(constants)?,
            attractors,
            web,
            phase: SimulationPhase::Configured,
            state: config.initial_state,
            scale_factor,
            time: 0.0,
            dt,
            adaptive,
            oversized_step,
            cursor: 0,
            total,
            trajectory: SimulationTrajectory::new(),
            config,
        })
    }

    /// Advance by one step (or one cell).
    pub fn step(&mut self) -> StepOutcome {
        match self.phase {
            SimulationPhase::Completed => return StepOutcome::Completed,
            SimulationPhase::Failed => return StepOutcome::Failed,
            SimulationPhase::Configured => {
                let mode = if self.config.is_spatial() { "spatial" } else { "temporal" };
                info!(
                    mode,
                    total = self.total,
                    "Simulation started"
                );
                self.phase = SimulationPhase::Running;
            }
            SimulationPhase::Running => {}
        }

        let result = if self.web.is_some() {
            self.spatial_step()
        } else {
            self.temporal_step()
        };

        match result {
            Ok(sample) => {
                self.trajectory.push(sample);
                self.cursor += 1;
                if self.cursor >= self.total {
                    self.phase = SimulationPhase::Completed;
                    self.trajectory.mark_complete();
                    info!(samples = self.trajectory.len(), "Simulation completed");
                    StepOutcome::Completed
                } else {
                    StepOutcome::Sampled {
                        index: self.trajectory.len() - 1,
                    }
                }
            }
            Err(err) => {
                warn!(step = self.cursor, error = %err, "Simulation failed");
                self.trajectory
                    .mark_failed(FailureReason::from_error(self.cursor, &err));
                self.phase = SimulationPhase::Failed;
                StepOutcome::Failed
            }
        }
    }

    /// Step until the run completes or fails.
    pub fn run(&mut self) -> StepOutcome {
        loop {
            match self.step() {
                StepOutcome::Sampled { .. } => continue,
                outcome => return outcome,
            }
        }
    }

    /// Evolve the homogeneous state together with the scale factor, so the
    /// friction is 3H(a); nothing is committed unless every model
    /// evaluation succeeds.
    fn temporal_step(&mut self) -> Result<ObservableSample> {
        let dt = self.dt;
        let (next, a_next) =
            self.field
                .evolve_expanding(&self.state, self.scale_factor, dt, &self.constants)?;
        let (potential, velocity) = match self.config.observer_position {
            Some(observer) => self.sample_attractors(&next, &observer)?,
            None => (None, None),
        };
        let observables = self.dark_energy.observables_for_state(&next)?;
        let next_dt = match self.adaptive.as_mut() {
            Some(ctl) => ctl.adapt(energy_terms(&next, &self.constants)?.total()),
            None => dt,
        };

        let time = self.time + dt;
        debug!(step = self.cursor, scale_factor = a_next, dt, "Temporal step");
        self.state = next;
        self.scale_factor = a_next;
        self.time = time;
        self.dt = next_dt;

        Ok(ObservableSample {
            step: self.cursor,
            coordinate: SampleCoordinate::ScaleFactor(a_next),
            time: Some(time),
            state: next,
            density: observables.density,
            pressure: observables.pressure,
            equation_of_state: observables.equation_of_state,
            potential,
            velocity,
            cell_class: None,
        })
    }

    /// Evaluate the next cell centre in raster order.
    fn spatial_step(&mut self) -> Result<ObservableSample> {
        let index = self.cursor as usize;
        let (position, local, class) = match &self.web {
            Some(web) => {
                let field = web.field();
                (
                    field.domain().cell_center(index),
                    self.config.initial_state.with_phase(field.phase(index)),
                    web.classify_cell(index),
                )
            }
            None => return Err(CosmologyError::configuration("mode", "not a spatial run")),
        };
        let observables = self.dark_energy.observables_for_state(&local)?;
        let (potential, velocity) = self.sample_attractors(&local, &position)?;
        self.state = local;

        Ok(ObservableSample {
            step: self.cursor,
            coordinate: SampleCoordinate::Position(position),
            time: None,
            state: local,
            density: observables.density,
            pressure: observables.pressure,
            equation_of_state: observables.equation_of_state,
            potential,
            velocity,
            cell_class: Some(class),
        })
    }

    /// Potential and velocity of the attractor model, its weights scaled by
    /// the state's coherence A².
    fn sample_attractors(
        &self,
        state: &FieldState,
        position: &Vector3<f64>,
    ) -> Result<(Option<f64>, Option<Vector3<f64>>)> {
        match &self.attractors {
            Some(model) => {
                let model = model.modulated(state.amplitude);
                Ok((
                    Some(model.potential(position)?),
                    Some(model.peculiar_velocity(position)?),
                ))
            }
            None => Ok((None, None)),
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Current (last good) field state.
    pub fn state(&self) -> &FieldState {
        &self.state
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Seconds elapsed in a temporal run.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// dt the next temporal step will use; `None` for spatial runs.
    pub fn step_size(&self) -> Option<f64> {
        (!self.config.is_spatial()).then_some(self.dt)
    }

    /// True when a temporal run was configured with dt above the
    /// recommended step. The run still proceeds.
    pub fn step_exceeds_recommended(&self) -> bool {
        self.oversized_step
    }

    pub fn recommended_step_size(&self) -> f64 {
        recommended_step_size(&self.constants)
    }

    pub fn steps_taken(&self) -> u64 {
        self.cursor
    }

    pub fn total_steps(&self) -> u64 {
        self.total
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn cosmic_web(&self) -> Option<&CosmicWebModel> {
        self.web.as_ref()
    }

    pub fn attractor_model(&self) -> Option<&GreatAttractorModel> {
        self.attractors.as_ref()
    }

    /// Class of the cell containing `position` in a spatial run.
    pub fn classify(&self, position: &Vector3<f64>) -> Option<Result<CellClass>> {
        self.web.as_ref().map(|w| w.classify_domain(position))
    }

    pub fn trajectory(&self) -> &SimulationTrajectory {
        &self.trajectory
    }

    pub fn into_trajectory(self) -> SimulationTrajectory {
        self.trajectory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use refstate_field::{Attractor, ErrorKind, IntegratorMethod, PhaseMapping, SpatialDomain};

    fn constants() -> PhysicalConstants {
        PhysicalConstants::fiducial()
    }

    fn excited(c: &PhysicalConstants) -> FieldState {
        FieldState::new(1.05, 0.2, 0.0, 0.01 / c.coherence_time).unwrap()
    }

    #[test]
    fn test_starts_configured() {
        let c = constants();
        let sim = ReferenceStateSimulation::new(&c, SimulationConfig::temporal(3, 1e14)).unwrap();
        assert_eq!(sim.phase(), SimulationPhase::Configured);
        assert!(sim.trajectory().is_empty());
        assert_eq!(sim.step_size(), Some(1e14));
    }

    #[test]
    fn test_step_wise_progress() {
        let c = constants();
        let dt = recommended_step_size(&c);
        let config = SimulationConfig::temporal(3, dt).with_initial_state(excited(&c));
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();

        assert_eq!(sim.step(), StepOutcome::Sampled { index: 0 });
        assert_eq!(sim.phase(), SimulationPhase::Running);
        assert_eq!(sim.step(), StepOutcome::Sampled { index: 1 });
        assert_eq!(sim.step(), StepOutcome::Completed);
        assert_eq!(sim.phase(), SimulationPhase::Completed);
        assert_eq!(sim.trajectory().len(), 3);

        // Finished runs stay put
        assert_eq!(sim.step(), StepOutcome::Completed);
        assert_eq!(sim.trajectory().len(), 3);
        assert!(sim.trajectory().is_complete());
    }

    #[test]
    fn test_state_matches_last_sample() {
        let c = constants();
        let dt = recommended_step_size(&c);
        let config = SimulationConfig::temporal(5, dt).with_initial_state(excited(&c));
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();
        sim.run();
        let last = sim.trajectory().last().unwrap();
        assert_eq!(&last.state, sim.state());
        assert_eq!(last.scale_factor(), Some(sim.scale_factor()));
        assert_relative_eq!(sim.time(), 5.0 * dt, max_relative = 1e-12);
    }

    #[test]
    fn test_oversized_step_warns_and_runs() {
        let c = constants();
        let dt = 2.0 * recommended_step_size(&c);
        let config = SimulationConfig::temporal(4, dt).with_initial_state(excited(&c));
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();
        assert!(sim.step_exceeds_recommended());
        assert_eq!(sim.step_size(), Some(dt));
        assert_eq!(sim.run(), StepOutcome::Completed);
        assert_eq!(sim.trajectory().len(), 4);

        let config = SimulationConfig::temporal(4, recommended_step_size(&c));
        let sim = ReferenceStateSimulation::new(&c, config).unwrap();
        assert!(!sim.step_exceeds_recommended());
    }

    #[test]
    fn test_simulated_w_tracks_mapped_background() {
        let mut c = constants();
        c.phase_mapping = PhaseMapping {
            offset: 0.0,
            drift: 5.0,
        };
        let model = DarkEnergyModel::new(&c).unwrap();
        let config = SimulationConfig::temporal(300, recommended_step_size(&c))
            .with_initial_state(model.field_state_at(1.0).unwrap());
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();
        assert_eq!(sim.run(), StepOutcome::Completed);
        assert!(sim.scale_factor() > 1.6);

        for s in sim.trajectory().samples() {
            let a = s.scale_factor().unwrap();
            let simulated = 1.0 + s.equation_of_state.value().unwrap();
            let mapped = 1.0 + model.equation_of_state(a).unwrap().value().unwrap();
            assert_relative_eq!(simulated, mapped, max_relative = 0.05);
        }
    }

    #[test]
    fn test_negative_amplitude_fails_and_keeps_samples() {
        let c = constants();
        let tc = c.coherence_time;
        let mut config = SimulationConfig::temporal(10, tc)
            .with_initial_state(FieldState::new(1.0, 0.0, -0.8 / tc, 0.0).unwrap());
        config.integrator = IntegratorMethod::Euler;
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();

        assert_eq!(sim.run(), StepOutcome::Failed);
        assert_eq!(sim.phase(), SimulationPhase::Failed);
        let traj = sim.trajectory();
        assert_eq!(traj.len(), 1);
        let failure = traj.failure().unwrap();
        assert_eq!(failure.step, 1);
        assert_eq!(failure.kind, ErrorKind::Domain);
        assert!(!traj.is_complete());

        // Last good state is still inspectable and stepping is inert
        assert_relative_eq!(sim.state().amplitude, 0.2, epsilon = 1e-12);
        assert_eq!(sim.step(), StepOutcome::Failed);
        assert_eq!(sim.trajectory().len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected_before_running() {
        let c = constants();
        let err = ReferenceStateSimulation::new(&c, SimulationConfig::temporal(0, 1.0))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_observer_samples_modulated_potential() {
        let c = constants();
        let lc = c.coherence_length;
        let dt = recommended_step_size(&c);
        let config = SimulationConfig::temporal(2, dt)
            .with_attractors(vec![Attractor::at_origin(1.0)])
            .with_observer(Vector3::new(2.0 * lc, 0.0, 0.0));
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();
        sim.run();

        // Ground state stays at A = 1, so the modulation is the identity
        let model = GreatAttractorModel::new(&c, vec![Attractor::at_origin(1.0)]).unwrap();
        let expected = model.potential(&Vector3::new(2.0 * lc, 0.0, 0.0)).unwrap();
        for s in sim.trajectory().samples() {
            assert_relative_eq!(s.potential.unwrap(), expected, max_relative = 1e-14);
            assert!(s.velocity.unwrap().x < 0.0);
        }
    }

    #[test]
    fn test_adaptive_step_capped_at_recommended() {
        let c = constants();
        let recommended = recommended_step_size(&c);
        let mut config = SimulationConfig::temporal(40, 0.5 * recommended)
            .with_initial_state(excited(&c));
        config.step_control = StepControl::Adaptive;
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();
        assert_eq!(sim.run(), StepOutcome::Completed);
        let dt = sim.step_size().unwrap();
        assert!(dt <= recommended * (1.0 + 1e-12));
        assert!(dt >= 0.5 * recommended / 16.0);
    }

    #[test]
    fn test_spatial_sweep_covers_every_cell() {
        let c = constants();
        let domain = SpatialDomain::centered_square(6, c.coherence_length).unwrap();
        let config = SimulationConfig::spatial(domain)
            .with_phase_source(PhaseSource::RandomModes { modes: 4, seed: 3 });
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();
        assert_eq!(sim.step_size(), None);
        assert_eq!(sim.run(), StepOutcome::Completed);

        let web = sim.cosmic_web().unwrap();
        let traj = sim.trajectory();
        assert_eq!(traj.len(), 36);
        for (idx, s) in traj.samples().iter().enumerate() {
            assert_eq!(s.cell_class, Some(web.classify_cell(idx)));
            assert_eq!(s.state.phase, web.field().phase(idx));
            assert!(s.position().is_some());
        }
    }

    #[test]
    fn test_spatial_singularity_fails_at_centre_cell() {
        let c = constants();
        let lc = c.coherence_length;
        let domain = SpatialDomain::centered_square(4, lc).unwrap();
        // Centre of cell (2, 2, 0)
        let attractor = Attractor::new(Vector3::new(0.5 * lc, 0.5 * lc, 0.0), 1.0, 0.0);
        let config = SimulationConfig::spatial(domain).with_attractors(vec![attractor]);
        let mut sim = ReferenceStateSimulation::new(&c, config).unwrap();

        assert_eq!(sim.run(), StepOutcome::Failed);
        let traj = sim.trajectory();
        assert_eq!(traj.len(), 10);
        assert_eq!(traj.failure().unwrap().step, 10);
        assert_eq!(traj.failure().unwrap().kind, ErrorKind::Singularity);
    }
}
