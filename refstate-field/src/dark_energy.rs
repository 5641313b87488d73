// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Dark energy from reference-state pressure.
//!
//! A scale factor a is mapped to a field state through the phase mapping in
//! [`PhysicalConstants::phase_mapping`], with E(a) = H(a)/H0:
//!
//!   θ̇(a) = κ H0 a⁻³,   θ(a) = θ0 + (2κ / 3Ω_m)(E(1) − E(a)),   A = 1,   Ȧ = 0
//!
//! and density, pressure and w are read off the field Lagrangian. θ̇ ∝ a⁻³
//! is what the expanding equation of motion conserves, so a simulation
//! started on the mapping tracks it. The phase kinetic term redshifts away,
//! so w(a) → −1 as a → ∞; κ = 0 is exactly Λ.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::PhysicalConstants;
use crate::error::Result;
use crate::field::{density_and_pressure, EquationOfState};
use crate::state::{FieldState, ScaleFactorPoint};

/// Density, pressure and w of one field state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DarkEnergyObservables {
    /// J/m³
    pub density: f64,
    /// Pa
    pub pressure: f64,
    pub equation_of_state: EquationOfState,
}

#[derive(Debug, Clone)]
pub struct DarkEnergyModel {
    constants: PhysicalConstants,
}

impl DarkEnergyModel {
    pub fn new(constants: &PhysicalConstants) -> Result<Self> {
        constants.validate()?;
        Ok(Self {
            constants: constants.clone(),
        })
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    /// θ(a)
    pub fn phase_at(&self, scale_factor: f64) -> Result<f64> {
        let a = ScaleFactorPoint::from_scale_factor(scale_factor)?.scale_factor();
        let c = &self.constants;
        let m = &c.phase_mapping;
        Ok(m.offset + self.phase_scale() * (c.expansion_ratio(1.0) - c.expansion_ratio(a)))
    }

    /// θ̇(a) in rad/s.
    pub fn phase_rate_at(&self, scale_factor: f64) -> Result<f64> {
        let a = ScaleFactorPoint::from_scale_factor(scale_factor)?.scale_factor();
        let c = &self.constants;
        Ok(c.phase_mapping.drift * c.hubble_constant * a.powi(-3))
    }

    /// 2κ / 3Ω_m
    fn phase_scale(&self) -> f64 {
        2.0 * self.constants.phase_mapping.drift / (3.0 * self.constants.matter_density_parameter)
    }

    /// Inverse of [`DarkEnergyModel::phase_at`]; `None` outside its range
    /// (θ ≥ θ0 + (2κ/3Ω_m)(E(1) − √Ω_Λ)) or when κ = 0.
    pub fn scale_factor_for_phase(&self, phase: f64) -> Option<f64> {
        let c = &self.constants;
        if c.phase_mapping.drift <= 0.0 {
            return None;
        }
        let e = c.expansion_ratio(1.0) - (phase - c.phase_mapping.offset) / self.phase_scale();
        let inv_cube = (e * e - c.dark_energy_density_parameter()) / c.matter_density_parameter;
        (e > 0.0 && inv_cube > 0.0).then(|| inv_cube.powf(-1.0 / 3.0))
    }

    /// Field state the mapping assigns to `scale_factor`.
    pub fn field_state_at(&self, scale_factor: f64) -> Result<FieldState> {
        FieldState::new(
            1.0,
            self.phase_at(scale_factor)?,
            0.0,
            self.phase_rate_at(scale_factor)?,
        )
    }

    /// Density, pressure and w of an arbitrary (e.g. simulated) state.
    pub fn observables_for_state(&self, state: &FieldState) -> Result<DarkEnergyObservables> {
        let (density, pressure) = density_and_pressure(state, &self.constants)?;
        Ok(DarkEnergyObservables {
            density,
            pressure,
            equation_of_state: EquationOfState::from_ratio(pressure, density),
        })
    }

    pub fn observables(&self, scale_factor: f64) -> Result<DarkEnergyObservables> {
        self.observables_for_state(&self.field_state_at(scale_factor)?)
    }

    pub fn dark_energy_density(&self, scale_factor: f64) -> Result<f64> {
        Ok(self.observables(scale_factor)?.density)
    }

    pub fn dark_energy_pressure(&self, scale_factor: f64) -> Result<f64> {
        Ok(self.observables(scale_factor)?.pressure)
    }

    pub fn equation_of_state(&self, scale_factor: f64) -> Result<EquationOfState> {
        Ok(self.observables(scale_factor)?.equation_of_state)
    }

    /// Expansion rate with this model's dark energy in place of Λ:
    /// H(a) = H0 sqrt(Ω_m a⁻³ + ρ_DE(a) / (ρ_c c²)).
    pub fn hubble_parameter(&self, scale_factor: f64) -> Result<f64> {
        let rho = self.dark_energy_density(scale_factor)?;
        let c = &self.constants;
        let om = c.matter_density_parameter / scale_factor.powi(3);
        Ok(c.hubble_constant * (om + rho / c.critical_energy_density()).sqrt())
    }

    /// Ω_DE(a) = ρ_DE(a) / ρ_crit(a) with ρ_crit(a) = 3H(a)²c² / (8πG).
    pub fn density_parameter(&self, scale_factor: f64) -> Result<f64> {
        let c = &self.constants;
        let h = self.hubble_parameter(scale_factor)?;
        let rho_crit = 3.0 * h * h * c.speed_of_light * c.speed_of_light
            / (8.0 * PI * c.gravitational_constant);
        Ok(self.dark_energy_density(scale_factor)? / rho_crit)
    }
}
