// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Physical constants and fiducial cosmological parameters.
//!
//! `PhysicalConstants` is built once (from [`PhysicalConstants::fiducial`] or
//! a JSON document) and passed by reference to every model. All values are SI.
//! The fields are public, so every model constructor runs
//! [`PhysicalConstants::validate`] and rejects a bad table with a
//! configuration error before any evaluation.

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CosmologyError, Result};

/// One megaparsec in metres.
pub const MEGAPARSEC: f64 = 3.085_677_581e22;

/// Maximum relative disagreement between `critical_density` and 3H0²/(8πG).
const CRITICAL_DENSITY_TOLERANCE: f64 = 0.05;

/// Steps per characteristic oscillation period used by the step-size helper.
pub const STEPS_PER_PERIOD: f64 = 32.0;

/// Monotonic map from scale factor to field phase.
///
/// θ̇(a) = drift · H0 · a⁻³ and, integrating dθ/da = θ̇ / (a H),
/// θ(a) = offset + (2 drift / 3Ω_m)(E(1) − E(a)) with E = H/H0.
/// `drift = 0` is the exact cosmological-constant limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseMapping {
    /// Phase at a = 1 (radians)
    pub offset: f64,
    /// Dimensionless phase-drift rate κ (≥ 0)
    pub drift: f64,
}

impl Default for PhaseMapping {
    fn default() -> Self {
        Self {
            offset: 0.0,
            drift: 5.0,
        }
    }
}

/// Immutable bundle of constants consumed by every model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// G (m³ kg⁻¹ s⁻²)
    pub gravitational_constant: f64,
    /// c (m/s)
    pub speed_of_light: f64,
    /// ħ (J s)
    pub reduced_planck_constant: f64,
    /// H0 (s⁻¹)
    pub hubble_constant: f64,
    /// ρ_c (kg/m³)
    pub critical_density: f64,
    /// Ω_m, present-day matter fraction
    pub matter_density_parameter: f64,
    /// ρ_v, reference vacuum energy density (J/m³)
    pub vacuum_energy_density: f64,
    /// L_c (m)
    pub coherence_length: f64,
    /// T_c (s)
    pub coherence_time: f64,
    /// Dimensionless stiffness m of the amplitude potential
    pub field_stiffness: f64,
    /// Attractor potential scale Φ0 / c² (dimensionless)
    pub attractor_coupling: f64,
    /// Phase-gradient threshold in radians per coherence length
    pub coherence_threshold: f64,
    /// Scale factor → phase map
    pub phase_mapping: PhaseMapping,
}

impl PhysicalConstants {
    /// Planck-like fiducial values (H0 = 67.4 km/s/Mpc, Ω_m = 0.315,
    /// Ω_Λ = 0.685, L_c = 50 Mpc, T_c = L_c / c).
    pub fn fiducial() -> Self {
        let speed_of_light = 2.997_924_58e8;
        let coherence_length = 50.0 * MEGAPARSEC;
        Self {
            gravitational_constant: 6.674_30e-11,
            speed_of_light,
            reduced_planck_constant: 1.054_571_817e-34,
            hubble_constant: 67.4e3 / MEGAPARSEC,
            critical_density: 8.533e-27,
            matter_density_parameter: 0.315,
            vacuum_energy_density: 5.253e-10,
            coherence_length,
            coherence_time: coherence_length / speed_of_light,
            field_stiffness: 1.0,
            attractor_coupling: 2.7e-5,
            coherence_threshold: 1.0,
            phase_mapping: PhaseMapping::default(),
        }
    }

    /// Fiducial constants with a different vacuum energy scale.
    pub fn with_vacuum_energy_density(vacuum_energy_density: f64) -> Result<Self> {
        let constants = Self {
            vacuum_energy_density,
            ..Self::fiducial()
        };
        constants.validate()?;
        Ok(constants)
    }

    /// Parse and validate a JSON constants document.
    ///
    /// Every physical field is required. `phase_mapping` may be omitted, in
    /// which case the cosmological-constant limit (drift 0) is used.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawConstants = serde_json::from_str(json)
            .map_err(|e| CosmologyError::configuration("<document>", e.to_string()))?;
        raw.into_constants()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CosmologyError::configuration("<document>", format!("{}: {e}", path.display()))
        })?;
        let constants = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "Loaded physical constants");
        Ok(constants)
    }

    /// Check every field is finite and strictly positive, and that the
    /// critical density agrees with H0 and G.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("gravitational_constant", self.gravitational_constant),
            ("speed_of_light", self.speed_of_light),
            ("reduced_planck_constant", self.reduced_planck_constant),
            ("hubble_constant", self.hubble_constant),
            ("critical_density", self.critical_density),
            ("matter_density_parameter", self.matter_density_parameter),
            ("vacuum_energy_density", self.vacuum_energy_density),
            ("coherence_length", self.coherence_length),
            ("coherence_time", self.coherence_time),
            ("field_stiffness", self.field_stiffness),
            ("attractor_coupling", self.attractor_coupling),
            ("coherence_threshold", self.coherence_threshold),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CosmologyError::configuration(
                    name,
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }

        if self.matter_density_parameter > 1.0 {
            return Err(CosmologyError::configuration(
                "matter_density_parameter",
                format!("must lie in (0, 1], got {}", self.matter_density_parameter),
            ));
        }
        if !self.phase_mapping.offset.is_finite() {
            return Err(CosmologyError::configuration(
                "phase_mapping.offset",
                "must be finite",
            ));
        }
        if !self.phase_mapping.drift.is_finite() || self.phase_mapping.drift < 0.0 {
            return Err(CosmologyError::configuration(
                "phase_mapping.drift",
                format!("must be finite and >= 0, got {}", self.phase_mapping.drift),
            ));
        }

        let expected = 3.0 * self.hubble_constant * self.hubble_constant
            / (8.0 * PI * self.gravitational_constant);
        let mismatch = (self.critical_density - expected).abs() / expected;
        if mismatch > CRITICAL_DENSITY_TOLERANCE {
            return Err(CosmologyError::configuration(
                "critical_density",
                format!(
                    "{:e} kg/m³ disagrees with 3H0²/(8πG) = {:e} by {:.1}%",
                    self.critical_density,
                    expected,
                    mismatch * 100.0
                ),
            ));
        }
        Ok(())
    }

    /// ρ_c c² (J/m³)
    pub fn critical_energy_density(&self) -> f64 {
        self.critical_density * self.speed_of_light * self.speed_of_light
    }

    /// Ω_Λ = ρ_v / (ρ_c c²)
    pub fn dark_energy_density_parameter(&self) -> f64 {
        self.vacuum_energy_density / self.critical_energy_density()
    }

    /// E(a) = H(a)/H0 = sqrt(Ω_m a⁻³ + Ω_Λ).
    pub fn expansion_ratio(&self, scale_factor: f64) -> f64 {
        let om = self.matter_density_parameter;
        let ol = self.dark_energy_density_parameter();
        (om / scale_factor.powi(3) + ol).sqrt()
    }

    /// ΛCDM-shaped expansion rate H(a) using Ω_m and Ω_Λ from this table.
    pub fn hubble_parameter(&self, scale_factor: f64) -> f64 {
        self.hubble_constant * self.expansion_ratio(scale_factor)
    }

    /// Hubble friction γ = 3 H0 (s⁻¹) damping the field.
    pub fn hubble_friction(&self) -> f64 {
        3.0 * self.hubble_constant
    }

    /// Natural angular frequency of amplitude oscillations, m / T_c (rad/s).
    pub fn oscillation_frequency(&self) -> f64 {
        self.field_stiffness / self.coherence_time
    }

    /// Characteristic oscillation period 2π T_c / m (s).
    pub fn characteristic_period(&self) -> f64 {
        2.0 * PI / self.oscillation_frequency()
    }

    /// Linear growth rate f ≈ Ω_m^0.55.
    pub fn growth_rate(&self) -> f64 {
        self.matter_density_parameter.powf(0.55)
    }

    /// Attractor potential scale Φ0 = coupling · c² (m²/s²).
    pub fn attractor_potential_scale(&self) -> f64 {
        self.attractor_coupling * self.speed_of_light * self.speed_of_light
    }
}

/// Wire form of the constants document: every field optional so that a
/// missing one can be named in the error.
#[derive(Debug, Default, Deserialize)]
struct RawConstants {
    gravitational_constant: Option<f64>,
    speed_of_light: Option<f64>,
    reduced_planck_constant: Option<f64>,
    hubble_constant: Option<f64>,
    critical_density: Option<f64>,
    matter_density_parameter: Option<f64>,
    vacuum_energy_density: Option<f64>,
    coherence_length: Option<f64>,
    coherence_time: Option<f64>,
    field_stiffness: Option<f64>,
    attractor_coupling: Option<f64>,
    coherence_threshold: Option<f64>,
    phase_mapping: Option<PhaseMapping>,
}

fn require(name: &str, value: Option<f64>) -> Result<f64> {
    value.ok_or_else(|| CosmologyError::configuration(name, "missing"))
}

impl RawConstants {
    fn into_constants(self) -> Result<PhysicalConstants> {
        let constants = PhysicalConstants {
            gravitational_constant: require("gravitational_constant", self.gravitational_constant)?,
            speed_of_light: require("speed_of_light", self.speed_of_light)?,
            reduced_planck_constant: require(
                "reduced_planck_constant",
                self.reduced_planck_constant,
            )?,
            hubble_constant: require("hubble_constant", self.hubble_constant)?,
            critical_density: require("critical_density", self.critical_density)?,
            matter_density_parameter: require(
                "matter_density_parameter",
                self.matter_density_parameter,
            )?,
            vacuum_energy_density: require("vacuum_energy_density", self.vacuum_energy_density)?,
            coherence_length: require("coherence_length", self.coherence_length)?,
            coherence_time: require("coherence_time", self.coherence_time)?,
            field_stiffness: require("field_stiffness", self.field_stiffness)?,
            attractor_coupling: require("attractor_coupling", self.attractor_coupling)?,
            coherence_threshold: require("coherence_threshold", self.coherence_threshold)?,
            phase_mapping: self.phase_mapping.unwrap_or(PhaseMapping {
                offset: 0.0,
                drift: 0.0,
            }),
        };
        constants.validate()?;
        Ok(constants)
    }
}
