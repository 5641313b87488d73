// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Great Attractor: phase-coherence potential and bulk flows
//!
//! Each configured attractor contributes a Yukawa kernel whose range is the
//! reference coherence length L_c:
//!
//!   Φ(r) = −Φ0 Σ_i s_i e^{−x_i} / x_i,   x_i = |r − r_i| / L_c
//!
//! with Φ0 = attractor_coupling · c². Peculiar velocities follow linear
//! theory:
//!
//!   v = −(2f / (3 H0 Ω_m)) ∇Φ,   f = Ω_m^0.55
//!
//! The potential is singular only at an attractor centre; evaluation there
//! returns a singularity error so the caller can offset the sample point.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{PhysicalConstants, MEGAPARSEC};
use crate::error::{CosmologyError, Result};

/// Distances below this fraction of L_c count as the attractor centre.
const SINGULAR_RADIUS: f64 = 1e-9;

/// Default central-difference step as a fraction of L_c.
const GRADIENT_STEP: f64 = 1e-4;

/// A configured attractor centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attractor {
    /// Centre (m)
    pub position: Vector3<f64>,
    /// Dimensionless kernel weight s_i (> 0)
    pub weight: f64,
    /// Field phase locked inside this attractor's coherent domain (radians)
    pub phase: f64,
}

impl Attractor {
    pub fn new(position: Vector3<f64>, weight: f64, phase: f64) -> Self {
        Self {
            position,
            weight,
            phase,
        }
    }

    pub fn at_origin(weight: f64) -> Self {
        Self::new(Vector3::zeros(), weight, 0.0)
    }
}

/// The Great Attractor at ~65 Mpc along +x, unit weight.
pub fn fiducial_great_attractor() -> Attractor {
    Attractor::new(Vector3::new(65.0 * MEGAPARSEC, 0.0, 0.0), 1.0, 0.0)
}

#[inline]
fn kernel(x: f64) -> f64 {
    (-x).exp() / x
}

/// |dk/dx| = e^{−x}(1 + x)/x²
#[inline]
fn kernel_slope(x: f64) -> f64 {
    (-x).exp() * (1.0 + x) / (x * x)
}

/// Superposed attractor potential and the velocity field it induces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreatAttractorModel {
    attractors: Vec<Attractor>,
    potential_scale: f64,
    coherence_length: f64,
    velocity_factor: f64,
}

impl GreatAttractorModel {
    pub fn new(constants: &PhysicalConstants, attractors: Vec<Attractor>) -> Result<Self> {
        constants.validate()?;
        if attractors.is_empty() {
            return Err(CosmologyError::configuration(
                "attractors",
                "at least one attractor is required",
            ));
        }
        for (i, a) in attractors.iter().enumerate() {
            if !a.weight.is_finite() || a.weight <= 0.0 {
                return Err(CosmologyError::configuration(
                    format!("attractors[{i}].weight"),
                    format!("must be finite and > 0, got {}", a.weight),
                ));
            }
            if !a.position.iter().all(|v| v.is_finite()) || !a.phase.is_finite() {
                return Err(CosmologyError::configuration(
                    format!("attractors[{i}]"),
                    "position and phase must be finite",
                ));
            }
        }
        let velocity_factor = 2.0 * constants.growth_rate()
            / (3.0 * constants.hubble_constant * constants.matter_density_parameter);
        Ok(Self {
            attractors,
            potential_scale: constants.attractor_potential_scale(),
            coherence_length: constants.coherence_length,
            velocity_factor,
        })
    }

    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    pub fn coherence_length(&self) -> f64 {
        self.coherence_length
    }

    /// Copy with every weight scaled by A², the field coherence strength.
    pub fn modulated(&self, amplitude: f64) -> Self {
        let factor = amplitude * amplitude;
        let mut model = self.clone();
        for a in &mut model.attractors {
            a.weight *= factor;
        }
        model
    }

    /// Index of and distance to the closest attractor centre.
    pub fn nearest_attractor(&self, position: &Vector3<f64>) -> (usize, f64) {
        self.attractors
            .iter()
            .enumerate()
            .map(|(i, a)| (i, (position - a.position).norm()))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
    }

    /// Dimensionless distance x_i to every attractor, failing at a centre.
    fn scaled_offsets(&self, position: &Vector3<f64>) -> Result<Vec<(Vector3<f64>, f64)>> {
        let mut out = Vec::with_capacity(self.attractors.len());
        for (i, a) in self.attractors.iter().enumerate() {
            let offset = position - a.position;
            let distance = offset.norm();
            if !distance.is_finite() {
                return Err(CosmologyError::domain("position", distance));
            }
            let x = distance / self.coherence_length;
            if x < SINGULAR_RADIUS {
                return Err(CosmologyError::Singularity {
                    attractor: i,
                    distance,
                });
            }
            out.push((offset, x));
        }
        Ok(out)
    }

    /// Φ(r) in m²/s²; always ≤ 0.
    pub fn potential(&self, position: &Vector3<f64>) -> Result<f64> {
        let offsets = self.scaled_offsets(position)?;
        let sum: f64 = offsets
            .iter()
            .zip(&self.attractors)
            .map(|((_, x), a)| a.weight * kernel(*x))
            .sum();
        Ok(-self.potential_scale * sum)
    }

    /// Closed-form ∇Φ (m/s²).
    pub fn gradient(&self, position: &Vector3<f64>) -> Result<Vector3<f64>> {
        let offsets = self.scaled_offsets(position)?;
        let mut grad = Vector3::zeros();
        for ((offset, x), a) in offsets.iter().zip(&self.attractors) {
            let unit = offset / (x * self.coherence_length);
            grad += unit * (a.weight * kernel_slope(*x));
        }
        Ok(grad * (self.potential_scale / self.coherence_length))
    }

    /// Symmetric finite-difference ∇Φ with step `h` metres.
    pub fn numerical_gradient(&self, position: &Vector3<f64>, h: f64) -> Result<Vector3<f64>> {
        if !h.is_finite() || h <= 0.0 {
            return Err(CosmologyError::domain("h", h));
        }
        let mut grad = Vector3::zeros();
        for axis in 0..3 {
            let mut step = Vector3::zeros();
            step[axis] = h;
            let plus = self.potential(&(position + step))?;
            let minus = self.potential(&(position - step))?;
            grad[axis] = (plus - minus) / (2.0 * h);
        }
        Ok(grad)
    }

    /// Default finite-difference step (a small fraction of L_c).
    pub fn default_gradient_step(&self) -> f64 {
        GRADIENT_STEP * self.coherence_length
    }

    /// Induced peculiar velocity (m/s).
    pub fn peculiar_velocity(&self, position: &Vector3<f64>) -> Result<Vector3<f64>> {
        Ok(-self.velocity_factor * self.gradient(position)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single() -> (PhysicalConstants, GreatAttractorModel) {
        let c = PhysicalConstants::fiducial();
        let model = GreatAttractorModel::new(&c, vec![Attractor::at_origin(1.0)]).unwrap();
        (c, model)
    }

    #[test]
    fn test_empty_configuration_rejected() {
        let c = PhysicalConstants::fiducial();
        assert!(matches!(
            GreatAttractorModel::new(&c, vec![]),
            Err(CosmologyError::Configuration { .. })
        ));
        let bad = Attractor::at_origin(-1.0);
        assert!(GreatAttractorModel::new(&c, vec![bad]).is_err());
    }

    #[test]
    fn test_invalid_constants_rejected() {
        let mut c = PhysicalConstants::fiducial();
        c.attractor_coupling = f64::INFINITY;
        assert!(matches!(
            GreatAttractorModel::new(&c, vec![Attractor::at_origin(1.0)]),
            Err(CosmologyError::Configuration { .. })
        ));
    }

    #[test]
    fn test_potential_rises_with_distance() {
        let (c, model) = single();
        let lc = c.coherence_length;
        let values: Vec<f64> = [1.0, 2.0, 4.0]
            .iter()
            .map(|r| model.potential(&Vector3::new(r * lc, 0.0, 0.0)).unwrap())
            .collect();
        assert!(values.iter().all(|v| *v < 0.0));
        assert!(values[0] < values[1] && values[1] < values[2], "{values:?}");
    }

    #[test]
    fn test_centre_is_singular() {
        let (_, model) = single();
        let err = model.potential(&Vector3::zeros()).unwrap_err();
        assert!(matches!(err, CosmologyError::Singularity { attractor: 0, .. }));
        assert!(model.peculiar_velocity(&Vector3::zeros()).is_err());
    }

    #[test]
    fn test_velocity_magnitude_decreases_beyond_coherence_length() {
        let (c, model) = single();
        let lc = c.coherence_length;
        let speeds: Vec<f64> = [1.5, 2.0, 3.0, 4.0]
            .iter()
            .map(|r| {
                model
                    .peculiar_velocity(&Vector3::new(0.0, r * lc, 0.0))
                    .unwrap()
                    .norm()
            })
            .collect();
        for w in speeds.windows(2) {
            assert!(w[1] < w[0], "{speeds:?}");
        }
    }

    #[test]
    fn test_velocity_points_at_attractor() {
        let (c, model) = single();
        let p = Vector3::new(1.0, 2.0, -0.5) * c.coherence_length;
        let v = model.peculiar_velocity(&p).unwrap();
        assert_relative_eq!(v.normalize().dot(&(-p).normalize()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fiducial_speed_is_hundreds_of_km_per_s() {
        let (c, model) = single();
        let v = model
            .peculiar_velocity(&Vector3::new(c.coherence_length, 0.0, 0.0))
            .unwrap()
            .norm();
        assert!(v > 1e5 && v < 2e6, "v = {v} m/s");
    }

    #[test]
    fn test_numerical_gradient_matches_closed_form() {
        let c = PhysicalConstants::fiducial();
        let lc = c.coherence_length;
        let model = GreatAttractorModel::new(
            &c,
            vec![
                Attractor::at_origin(1.0),
                Attractor::new(Vector3::new(3.0 * lc, 0.0, 0.0), 0.5, 1.0),
            ],
        )
        .unwrap();
        let p = Vector3::new(1.2 * lc, 0.7 * lc, -0.3 * lc);
        let exact = model.gradient(&p).unwrap();
        let approx = model
            .numerical_gradient(&p, model.default_gradient_step())
            .unwrap();
        for axis in 0..3 {
            assert_relative_eq!(exact[axis], approx[axis], max_relative = 1e-5);
        }
    }

    #[test]
    fn test_modulated_scales_potential() {
        let (c, model) = single();
        let p = Vector3::new(c.coherence_length, 0.0, 0.0);
        let base = model.potential(&p).unwrap();
        let scaled = model.modulated(2.0).potential(&p).unwrap();
        assert_relative_eq!(scaled, 4.0 * base, max_relative = 1e-14);
    }

    #[test]
    fn test_nearest_attractor() {
        let c = PhysicalConstants::fiducial();
        let model = GreatAttractorModel::new(
            &c,
            vec![Attractor::at_origin(1.0), fiducial_great_attractor()],
        )
        .unwrap();
        let (idx, _) = model.nearest_attractor(&Vector3::new(60.0 * MEGAPARSEC, 0.0, 0.0));
        assert_eq!(idx, 1);
    }
}
