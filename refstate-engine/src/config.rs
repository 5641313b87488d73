// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Runtime configuration for a reference-state simulation run
//!
//! A run is either time-domain (evolve the homogeneous field over cosmic
//! time) or spatial (sweep the cells of a `SpatialDomain`). Presets build
//! the common cases; every field stays public so callers can adjust them.

use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::Vector3;
use refstate_field::{
    Attractor, CosmologyError, FieldState, IntegratorMethod, SpatialDomain,
};
use serde::{Deserialize, Serialize};

/// Where a spatial run takes its phase field from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhaseSource {
    /// Same phase everywhere.
    Uniform { phase: f64 },
    /// Circular mean of the configured attractor phases.
    Attractors,
    /// Seeded plane-wave superposition.
    RandomModes { modes: usize, seed: u64 },
    /// Explicit per-cell phases in raster order.
    Values(Vec<f64>),
}

/// What the driver steps over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationMode {
    Temporal {
        /// Number of evolve steps (one sample each)
        steps: u64,
        /// Step size in seconds
        dt: f64,
        /// Scale factor at the initial state
        initial_scale_factor: f64,
    },
    Spatial {
        domain: SpatialDomain,
        phase_source: PhaseSource,
    },
}

/// Step-size policy for time-domain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepControl {
    /// Use the configured dt for every step.
    #[default]
    Fixed,
    /// Energy-monitoring controller capped at the recommended step size.
    Adaptive,
}

/// Full configuration for a `ReferenceStateSimulation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub mode: SimulationMode,
    /// Initial field state (temporal) or template state per cell (spatial)
    pub initial_state: FieldState,
    /// Integrator for the field equation of motion
    pub integrator: IntegratorMethod,
    pub step_control: StepControl,
    /// Attractor centres; empty disables potential/velocity sampling
    pub attractors: Vec<Attractor>,
    /// Point at which temporal runs sample the attractor potential
    pub observer_position: Option<Vector3<f64>>,
}

impl SimulationConfig {
    /// Time-domain run of `steps` fixed steps of `dt` seconds from the
    /// ground state at a = 1.
    pub fn temporal(steps: u64, dt: f64) -> Self {
        Self {
            mode: SimulationMode::Temporal {
                steps,
                dt,
                initial_scale_factor: 1.0,
            },
            initial_state: FieldState::ground(),
            integrator: IntegratorMethod::Rk4,
            step_control: StepControl::Fixed,
            attractors: Vec::new(),
            observer_position: None,
        }
    }

    /// Spatial sweep over `domain` with a uniform phase.
    pub fn spatial(domain: SpatialDomain) -> Self {
        Self {
            mode: SimulationMode::Spatial {
                domain,
                phase_source: PhaseSource::Uniform { phase: 0.0 },
            },
            initial_state: FieldState::ground(),
            integrator: IntegratorMethod::Rk4,
            step_control: StepControl::Fixed,
            attractors: Vec::new(),
            observer_position: None,
        }
    }

    pub fn with_initial_state(mut self, state: FieldState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_attractors(mut self, attractors: Vec<Attractor>) -> Self {
        self.attractors = attractors;
        self
    }

    pub fn with_observer(mut self, position: Vector3<f64>) -> Self {
        self.observer_position = Some(position);
        self
    }

    pub fn with_phase_source(mut self, source: PhaseSource) -> Self {
        if let SimulationMode::Spatial { phase_source, .. } = &mut self.mode {
            *phase_source = source;
        }
        self
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self.mode, SimulationMode::Spatial { .. })
    }

    /// Structural checks that do not need the constants table.
    pub fn validate(&self) -> refstate_field::Result<()> {
        self.initial_state.check()?;
        match &self.mode {
            SimulationMode::Temporal {
                steps,
                dt,
                initial_scale_factor,
            } => {
                if *steps == 0 {
                    return Err(CosmologyError::configuration("steps", "must be at least 1"));
                }
                if !dt.is_finite() || *dt <= 0.0 {
                    return Err(CosmologyError::configuration(
                        "dt",
                        format!("must be finite and > 0, got {dt}"),
                    ));
                }
                if !initial_scale_factor.is_finite() || *initial_scale_factor <= 0.0 {
                    return Err(CosmologyError::configuration(
                        "initial_scale_factor",
                        format!("must be finite and > 0, got {initial_scale_factor}"),
                    ));
                }
            }
            SimulationMode::Spatial { phase_source, .. } => match phase_source {
                PhaseSource::Attractors if self.attractors.is_empty() => {
                    return Err(CosmologyError::configuration(
                        "phase_source",
                        "attractor phase source needs at least one attractor",
                    ));
                }
                PhaseSource::Uniform { phase } if !phase.is_finite() => {
                    return Err(CosmologyError::configuration(
                        "phase_source",
                        format!("uniform phase must be finite, got {phase}"),
                    ));
                }
                _ => {}
            },
        }
        if let Some(p) = &self.observer_position {
            if !p.iter().all(|v| v.is_finite()) {
                return Err(CosmologyError::configuration("observer_position", "must be finite"));
            }
        }
        Ok(())
    }

    /// Load a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read simulation config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse simulation config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_preset_is_valid() {
        let config = SimulationConfig::temporal(10, 1e14);
        assert!(config.validate().is_ok());
        assert!(!config.is_spatial());
        assert_eq!(config.integrator, IntegratorMethod::Rk4);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let err = SimulationConfig::temporal(0, 1e14).validate().unwrap_err();
        assert!(matches!(err, CosmologyError::Configuration { ref field, .. } if field == "steps"));
    }

    #[test]
    fn test_nonpositive_dt_rejected() {
        assert!(SimulationConfig::temporal(5, 0.0).validate().is_err());
        assert!(SimulationConfig::temporal(5, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_attractor_source_needs_attractors() {
        let domain = SpatialDomain::centered_square(4, 1.0).unwrap();
        let config = SimulationConfig::spatial(domain).with_phase_source(PhaseSource::Attractors);
        assert!(config.validate().is_err());
        let config = config.with_attractors(vec![Attractor::at_origin(1.0)]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nonfinite_uniform_phase_rejected() {
        let domain = SpatialDomain::centered_square(4, 1.0).unwrap();
        for phase in [f64::NAN, f64::INFINITY] {
            let err = SimulationConfig::spatial(domain.clone())
                .with_phase_source(PhaseSource::Uniform { phase })
                .validate()
                .unwrap_err();
            assert!(matches!(err, CosmologyError::Configuration { ref field, .. } if field == "phase_source"));
        }
        let ok = SimulationConfig::spatial(domain).with_phase_source(PhaseSource::Uniform { phase: 7.0 });
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let domain = SpatialDomain::centered_square(3, 2.0).unwrap();
        let config = SimulationConfig::spatial(domain)
            .with_phase_source(PhaseSource::RandomModes { modes: 4, seed: 9 })
            .with_observer(Vector3::new(1.0, 0.0, 0.0));
        let json = serde_json::to_string(&config).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
