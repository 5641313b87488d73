// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Ordered, append-only sequence of samples produced by one run.
//!
//! The trajectory is the interchange artifact handed to predictions and
//! renderers. JSON export keeps sample order and, with `float_roundtrip`,
//! every f64 bit.

use std::path::Path;

use anyhow::{Context, Result};
use refstate_field::{CosmologyError, ErrorKind};
use serde::{Deserialize, Serialize};

use crate::sample::ObservableSample;

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReason {
    /// Step (or cell) whose evaluation failed; no sample exists for it
    pub step: u64,
    pub kind: ErrorKind,
    pub message: String,
}

impl FailureReason {
    pub fn from_error(step: u64, error: &CosmologyError) -> Self {
        Self {
            step,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationTrajectory {
    samples: Vec<ObservableSample>,
    failure: Option<FailureReason>,
    complete: bool,
}

impl SimulationTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A finished trajectory from externally produced samples.
    pub fn from_samples(samples: Vec<ObservableSample>) -> Self {
        Self {
            samples,
            failure: None,
            complete: true,
        }
    }

    pub(crate) fn push(&mut self, sample: ObservableSample) {
        debug_assert!(!self.is_finished());
        self.samples.push(sample);
    }

    pub(crate) fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub(crate) fn mark_failed(&mut self, reason: FailureReason) {
        self.failure = Some(reason);
    }

    pub fn samples(&self) -> &[ObservableSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&ObservableSample> {
        self.samples.last()
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Completed or failed; no more samples will be appended.
    pub fn is_finished(&self) -> bool {
        self.complete || self.failure.is_some()
    }

    /// Scale factors of the temporal samples, in order.
    pub fn scale_factors(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.scale_factor()).collect()
    }

    pub fn densities(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.density).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json().context("Failed to serialize trajectory")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write trajectory to {}", path.display()))
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trajectory {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Failed to parse trajectory {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleCoordinate;
    use nalgebra::Vector3;
    use refstate_field::{CellClass, EquationOfState, FieldState};

    fn sample(step: u64, a: f64) -> ObservableSample {
        ObservableSample {
            step,
            coordinate: SampleCoordinate::ScaleFactor(a),
            time: Some(step as f64 * 1.0e15),
            state: FieldState::new(1.0 + 1e-3 * step as f64, 0.1 * step as f64, 1e-19, 3e-18).unwrap(),
            density: 5.253e-10 * (1.0 + 1.0 / 3.0 * step as f64),
            pressure: -5.253e-10 * 0.1_f64.sqrt(),
            equation_of_state: EquationOfState::Defined(-0.999_999_123_456_789),
            potential: Some(-2.426_789_123e12 / 7.0),
            velocity: Some(Vector3::new(-1.0 / 3.0, 2.0e5 / 7.0, 0.0)),
            cell_class: None,
        }
    }

    #[test]
    fn test_json_roundtrip_is_exact() {
        let mut samples: Vec<_> = (0..5).map(|i| sample(i, 1.0 + 0.013 * i as f64)).collect();
        samples[2].equation_of_state = EquationOfState::Undefined;
        samples[3].coordinate = SampleCoordinate::Position(Vector3::new(1e24 / 3.0, -2.0, 0.5));
        samples[3].cell_class = Some(CellClass::Domain(4));
        samples[4].cell_class = Some(CellClass::Filament);
        let traj = SimulationTrajectory::from_samples(samples);

        let json = traj.to_json().unwrap();
        let back = SimulationTrajectory::from_json(&json).unwrap();
        assert_eq!(traj, back);
        for (a, b) in traj.samples().iter().zip(back.samples()) {
            assert_eq!(a.density.to_bits(), b.density.to_bits());
            assert_eq!(a.state.phase.to_bits(), b.state.phase.to_bits());
        }
    }

    #[test]
    fn test_failure_survives_roundtrip() {
        let mut traj = SimulationTrajectory::new();
        traj.push(sample(0, 1.0));
        let err = CosmologyError::domain("amplitude", -0.5);
        traj.mark_failed(FailureReason::from_error(1, &err));
        let back = SimulationTrajectory::from_json(&traj.to_json().unwrap()).unwrap();
        let failure = back.failure().unwrap();
        assert_eq!(failure.step, 1);
        assert_eq!(failure.kind, ErrorKind::Domain);
        assert!(failure.message.contains("amplitude"));
        assert!(!back.is_complete());
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_scale_factors_in_order() {
        let traj = SimulationTrajectory::from_samples((0..4).map(|i| sample(i, 1.0 + i as f64)).collect());
        assert_eq!(traj.scale_factors(), vec![1.0, 2.0, 3.0, 4.0]);
    }
}
