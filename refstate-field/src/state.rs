// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Local field state and cosmic-time markers.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::{CosmologyError, Result};

/// Local description of the reference-state field.
///
/// The phase is tracked unwrapped so that derivatives stay continuous;
/// [`FieldState::wrapped_phase`] gives the [0, 2π) value for display.
/// Rates are per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub amplitude: f64,
    pub phase: f64,
    pub amplitude_rate: f64,
    pub phase_rate: f64,
}

impl FieldState {
    /// Build a state, rejecting negative or non-finite amplitude.
    pub fn new(amplitude: f64, phase: f64, amplitude_rate: f64, phase_rate: f64) -> Result<Self> {
        let state = Self {
            amplitude,
            phase,
            amplitude_rate,
            phase_rate,
        };
        state.check()?;
        Ok(state)
    }

    /// Static vacuum configuration: unit amplitude at rest.
    pub fn ground() -> Self {
        Self {
            amplitude: 1.0,
            phase: 0.0,
            amplitude_rate: 0.0,
            phase_rate: 0.0,
        }
    }

    /// Same state with a different phase; rates and amplitude are kept.
    pub fn with_phase(self, phase: f64) -> Self {
        Self { phase, ..self }
    }

    /// Phase normalized into [0, 2π).
    pub fn wrapped_phase(&self) -> f64 {
        wrap_phase(self.phase)
    }

    /// Boundary check applied before any closed-form evaluation.
    pub fn check(&self) -> Result<()> {
        if !self.amplitude.is_finite() || self.amplitude < 0.0 {
            return Err(CosmologyError::domain("amplitude", self.amplitude));
        }
        for (name, value) in [
            ("phase", self.phase),
            ("amplitude_rate", self.amplitude_rate),
            ("phase_rate", self.phase_rate),
        ] {
            if !value.is_finite() {
                return Err(CosmologyError::domain(name, value));
            }
        }
        Ok(())
    }
}

/// Normalize an angle into [0, 2π).
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Smallest signed difference b − a between two angles, in (−π, π].
pub fn phase_difference(a: f64, b: f64) -> f64 {
    let d = wrap_phase(b - a);
    if d > std::f64::consts::PI {
        d - TAU
    } else {
        d
    }
}

/// A point in cosmic time, stored as scale factor a > 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ScaleFactorPoint(f64);

impl ScaleFactorPoint {
    pub fn from_scale_factor(a: f64) -> Result<Self> {
        if !a.is_finite() || a <= 0.0 {
            return Err(CosmologyError::domain("scale_factor", a));
        }
        Ok(Self(a))
    }

    /// z = 1/a − 1, valid for z > −1.
    pub fn from_redshift(z: f64) -> Result<Self> {
        if !z.is_finite() || z <= -1.0 {
            return Err(CosmologyError::domain("redshift", z));
        }
        Ok(Self(1.0 / (1.0 + z)))
    }

    pub fn today() -> Self {
        Self(1.0)
    }

    pub fn scale_factor(&self) -> f64 {
        self.0
    }

    pub fn redshift(&self) -> f64 {
        1.0 / self.0 - 1.0
    }
}
