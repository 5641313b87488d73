// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Observational predictions
//!
//! Derived statistics over trajectories and model outputs, in forms that
//! can be set against published measurements: Hubble-rate deviation from
//! ΛCDM, the w(z) history and its CPL fit, attractor dipole and bulk flows,
//! and the cosmic-web domain size distribution.

use std::f64::consts::PI;

use nalgebra::Vector3;
use refstate_field::{
    CosmicWebModel, CosmologyError, GreatAttractorModel, PhysicalConstants, Result,
};
use serde::{Deserialize, Serialize};

use crate::trajectory::SimulationTrajectory;

/// Samples needed for a 16/50/84 percentile band.
pub const MIN_PERCENTILE_SAMPLES: usize = 5;

/// Samples needed for a standard deviation.
pub const MIN_DEVIATION_SAMPLES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub p16: f64,
    pub p50: f64,
    pub p84: f64,
}

/// Model H(a) against the ΛCDM reference at one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HubbleDeviation {
    pub scale_factor: f64,
    /// s⁻¹
    pub model: f64,
    /// s⁻¹
    pub reference: f64,
    /// model / reference − 1
    pub relative: f64,
}

/// Chevallier–Polarski–Linder parameters of w(a) = w0 + wa (1 − a).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CplFit {
    pub w0: f64,
    pub wa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulkFlow {
    pub center: Vector3<f64>,
    /// m
    pub radius: f64,
    /// Mean velocity over the shell (m/s)
    pub velocity: Vector3<f64>,
    pub samples: usize,
}

impl BulkFlow {
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

/// Headline numbers for one trajectory; `None` where the data do not
/// support the statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub samples: usize,
    pub mean_hubble_deviation: Option<f64>,
    pub equation_of_state_band: Option<PercentileBand>,
    pub cpl: Option<CplFit>,
    pub mean_speed: Option<f64>,
    pub failed: bool,
}

// ---------------------------------------------------------------------------
// Plain statistics
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(CosmologyError::insufficient("mean", 1, 0));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n − 1 denominator).
pub fn standard_deviation(values: &[f64]) -> Result<f64> {
    if values.len() < MIN_DEVIATION_SAMPLES {
        return Err(CosmologyError::insufficient(
            "standard_deviation",
            MIN_DEVIATION_SAMPLES,
            values.len(),
        ));
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Ok((ss / (values.len() - 1) as f64).sqrt())
}

/// Linear interpolation between closest ranks of sorted data.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

pub fn percentile_band(values: &[f64]) -> Result<PercentileBand> {
    if values.len() < MIN_PERCENTILE_SAMPLES {
        return Err(CosmologyError::insufficient(
            "percentile_band",
            MIN_PERCENTILE_SAMPLES,
            values.len(),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(PercentileBand {
        p16: percentile_sorted(&sorted, 0.16),
        p50: percentile_sorted(&sorted, 0.50),
        p84: percentile_sorted(&sorted, 0.84),
    })
}

/// Points on a sphere spread by the golden-angle spiral.
pub fn fibonacci_sphere(center: &Vector3<f64>, radius: f64, n: usize) -> Vec<Vector3<f64>> {
    let golden_angle = PI * (3.0 - 5.0f64.sqrt());
    (0..n)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let r = (1.0 - y * y).sqrt();
            let phi = golden_angle * i as f64;
            center + Vector3::new(r * phi.cos(), y, r * phi.sin()) * radius
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// Aggregates trajectories and model outputs into observables.
#[derive(Debug, Clone)]
pub struct ObservationalPredictions {
    constants: PhysicalConstants,
}

impl ObservationalPredictions {
    pub fn new(constants: &PhysicalConstants) -> Result<Self> {
        constants.validate()?;
        Ok(Self {
            constants: constants.clone(),
        })
    }

    /// H(a) with the sampled field density as dark energy, against ΛCDM
    /// with Ω_Λ = ρ_v / (ρ_c c²). Spatial samples are skipped.
    pub fn hubble_deviation(&self, trajectory: &SimulationTrajectory) -> Result<Vec<HubbleDeviation>> {
        let c = &self.constants;
        let critical = c.critical_energy_density();
        let out: Vec<HubbleDeviation> = trajectory
            .samples()
            .iter()
            .filter_map(|s| s.scale_factor().map(|a| (a, s.density)))
            .map(|(a, density)| {
                let model = c.hubble_constant
                    * (c.matter_density_parameter / a.powi(3) + density / critical).sqrt();
                let reference = c.hubble_parameter(a);
                HubbleDeviation {
                    scale_factor: a,
                    model,
                    reference,
                    relative: model / reference - 1.0,
                }
            })
            .collect();
        if out.is_empty() {
            return Err(CosmologyError::insufficient("hubble_deviation", 1, 0));
        }
        Ok(out)
    }

    pub fn mean_hubble_deviation(&self, trajectory: &SimulationTrajectory) -> Result<f64> {
        let rel: Vec<f64> = self
            .hubble_deviation(trajectory)?
            .iter()
            .map(|d| d.relative)
            .collect();
        mean(&rel)
    }

    /// (z, w) pairs in sample order; undefined w and spatial samples skipped.
    pub fn equation_of_state_history(&self, trajectory: &SimulationTrajectory) -> Vec<(f64, f64)> {
        trajectory
            .samples()
            .iter()
            .filter_map(|s| Some((s.redshift()?, s.equation_of_state.value()?)))
            .collect()
    }

    /// Least-squares CPL fit over the temporal samples.
    pub fn cpl_fit(&self, trajectory: &SimulationTrajectory) -> Result<CplFit> {
        let points: Vec<(f64, f64)> = trajectory
            .samples()
            .iter()
            .filter_map(|s| Some((1.0 - s.scale_factor()?, s.equation_of_state.value()?)))
            .collect();
        if points.len() < 2 {
            return Err(CosmologyError::insufficient("cpl_fit", 2, points.len()));
        }
        let n = points.len() as f64;
        let mx = points.iter().map(|p| p.0).sum::<f64>() / n;
        let my = points.iter().map(|p| p.1).sum::<f64>() / n;
        let sxx: f64 = points.iter().map(|p| (p.0 - mx) * (p.0 - mx)).sum();
        let sxy: f64 = points.iter().map(|p| (p.0 - mx) * (p.1 - my)).sum();
        if sxx <= 0.0 {
            // every sample at one scale factor
            return Err(CosmologyError::insufficient("cpl_fit", 2, 1));
        }
        let wa = sxy / sxx;
        Ok(CplFit { w0: my - wa * mx, wa })
    }

    /// Peculiar velocity of an observer at `observer`.
    pub fn dipole_velocity(
        &self,
        model: &GreatAttractorModel,
        observer: &Vector3<f64>,
    ) -> Result<Vector3<f64>> {
        model.peculiar_velocity(observer)
    }

    /// Mean induced velocity over `points` positions on a sphere.
    pub fn bulk_flow(
        &self,
        model: &GreatAttractorModel,
        center: &Vector3<f64>,
        radius: f64,
        points: usize,
    ) -> Result<BulkFlow> {
        if points == 0 {
            return Err(CosmologyError::insufficient("bulk_flow", 1, 0));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(CosmologyError::domain("radius", radius));
        }
        let mut sum = Vector3::zeros();
        for p in fibonacci_sphere(center, radius, points) {
            sum += model.peculiar_velocity(&p)?;
        }
        Ok(BulkFlow {
            center: *center,
            radius,
            velocity: sum / points as f64,
            samples: points,
        })
    }

    /// Equivalent radii (m) of the cosmic-web domains, ascending.
    pub fn filament_size_distribution(&self, web: &CosmicWebModel) -> Vec<f64> {
        let mut radii: Vec<f64> = (0..web.domain_count() as u32)
            .filter_map(|id| web.domain_statistics(id).ok())
            .map(|s| s.equivalent_radius)
            .collect();
        radii.sort_by(f64::total_cmp);
        radii
    }

    /// 16/50/84 band of the density at `step` across an ensemble of runs.
    pub fn ensemble_density_band(
        &self,
        trajectories: &[SimulationTrajectory],
        step: usize,
    ) -> Result<PercentileBand> {
        let values: Vec<f64> = trajectories
            .iter()
            .filter_map(|t| t.samples().get(step).map(|s| s.density))
            .collect();
        percentile_band(&values)
    }

    pub fn summarize(&self, trajectory: &SimulationTrajectory) -> PredictionSummary {
        let ws: Vec<f64> = self
            .equation_of_state_history(trajectory)
            .into_iter()
            .map(|(_, w)| w)
            .collect();
        let speeds: Vec<f64> = trajectory.samples().iter().filter_map(|s| s.speed()).collect();
        PredictionSummary {
            samples: trajectory.len(),
            mean_hubble_deviation: self.mean_hubble_deviation(trajectory).ok(),
            equation_of_state_band: percentile_band(&ws).ok(),
            cpl: self.cpl_fit(trajectory).ok(),
            mean_speed: mean(&speeds).ok(),
            failed: trajectory.failure().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{ObservableSample, SampleCoordinate};
    use approx::assert_relative_eq;
    use refstate_field::{Attractor, EquationOfState, FieldState};

    fn temporal_sample(step: u64, a: f64, density: f64, w: f64) -> ObservableSample {
        ObservableSample {
            step,
            coordinate: SampleCoordinate::ScaleFactor(a),
            time: Some(step as f64),
            state: FieldState::ground(),
            density,
            pressure: w * density,
            equation_of_state: EquationOfState::Defined(w),
            potential: None,
            velocity: None,
            cell_class: None,
        }
    }

    #[test]
    fn test_percentile_band_interpolates() {
        let band = percentile_band(&[5.0, 1.0, 4.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(band.p16, 1.64, epsilon = 1e-12);
        assert_relative_eq!(band.p50, 3.0);
        assert_relative_eq!(band.p84, 4.36, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_band_needs_five_samples() {
        let err = percentile_band(&[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert_eq!(err, CosmologyError::insufficient("percentile_band", 5, 4));
    }

    #[test]
    fn test_standard_deviation() {
        assert_relative_eq!(standard_deviation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(), 2.138_089_935_299_395, epsilon = 1e-12);
        assert!(standard_deviation(&[1.0]).is_err());
        assert!(mean(&[]).is_err());
    }

    #[test]
    fn test_vacuum_density_has_no_hubble_deviation() {
        let c = PhysicalConstants::fiducial();
        let samples = (0..4)
            .map(|i| temporal_sample(i, 0.5 + 0.2 * i as f64, c.vacuum_energy_density, -1.0))
            .collect();
        let traj = SimulationTrajectory::from_samples(samples);
        let p = ObservationalPredictions::new(&c).unwrap();
        for d in p.hubble_deviation(&traj).unwrap() {
            assert_relative_eq!(d.relative, 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_excess_density_raises_hubble_rate() {
        let c = PhysicalConstants::fiducial();
        let traj = SimulationTrajectory::from_samples(vec![temporal_sample(
            0,
            1.0,
            1.1 * c.vacuum_energy_density,
            -0.9,
        )]);
        let p = ObservationalPredictions::new(&c).unwrap();
        assert!(p.mean_hubble_deviation(&traj).unwrap() > 0.0);
    }

    #[test]
    fn test_cpl_fit_recovers_linear_w() {
        let c = PhysicalConstants::fiducial();
        let samples = (0..6)
            .map(|i| {
                let a = 0.5 + 0.1 * i as f64;
                temporal_sample(i, a, c.vacuum_energy_density, -0.9 + 0.2 * (1.0 - a))
            })
            .collect();
        let fit = ObservationalPredictions::new(&c).unwrap()
            .cpl_fit(&SimulationTrajectory::from_samples(samples))
            .unwrap();
        assert_relative_eq!(fit.w0, -0.9, epsilon = 1e-12);
        assert_relative_eq!(fit.wa, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_cpl_fit_insufficient_data() {
        let c = PhysicalConstants::fiducial();
        let traj = SimulationTrajectory::from_samples(vec![temporal_sample(0, 1.0, 1.0, -1.0)]);
        let err = ObservationalPredictions::new(&c).unwrap().cpl_fit(&traj).unwrap_err();
        assert!(matches!(err, CosmologyError::InsufficientData { .. }));
    }

    #[test]
    fn test_bulk_flow_points_toward_attractor() {
        let c = PhysicalConstants::fiducial();
        let lc = c.coherence_length;
        let model = GreatAttractorModel::new(&c, vec![Attractor::at_origin(1.0)]).unwrap();
        let p = ObservationalPredictions::new(&c).unwrap();

        let flow = p
            .bulk_flow(&model, &Vector3::new(3.0 * lc, 0.0, 0.0), 0.5 * lc, 200)
            .unwrap();
        assert!(flow.velocity.x < 0.0);
        assert!(flow.velocity.x.abs() > 10.0 * flow.velocity.y.abs());

        let dipole = p.dipole_velocity(&model, &Vector3::new(3.0 * lc, 0.0, 0.0)).unwrap();
        assert_relative_eq!(flow.speed(), dipole.norm(), max_relative = 0.5);
    }

    #[test]
    fn test_bulk_flow_needs_points() {
        let c = PhysicalConstants::fiducial();
        let model = GreatAttractorModel::new(&c, vec![Attractor::at_origin(1.0)]).unwrap();
        let p = ObservationalPredictions::new(&c).unwrap();
        assert!(matches!(
            p.bulk_flow(&model, &Vector3::zeros(), 1.0, 0),
            Err(CosmologyError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_fibonacci_sphere_on_radius() {
        let center = Vector3::new(1.0, 2.0, 3.0);
        for p in fibonacci_sphere(&center, 4.0, 50) {
            assert_relative_eq!((p - center).norm(), 4.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ensemble_band_requires_members() {
        let c = PhysicalConstants::fiducial();
        let p = ObservationalPredictions::new(&c).unwrap();
        let runs: Vec<_> = (0..5)
            .map(|i| {
                SimulationTrajectory::from_samples(vec![temporal_sample(0, 1.0, 1.0 + i as f64, -1.0)])
            })
            .collect();
        let band = p.ensemble_density_band(&runs, 0).unwrap();
        assert_relative_eq!(band.p50, 3.0);
        assert!(p.ensemble_density_band(&runs[..3], 0).is_err());
        assert!(p.ensemble_density_band(&runs, 1).is_err());
    }

    #[test]
    fn test_invalid_constants_rejected() {
        let mut c = PhysicalConstants::fiducial();
        c.matter_density_parameter = 1.5;
        let err = ObservationalPredictions::new(&c).unwrap_err();
        assert!(matches!(err, CosmologyError::Configuration { .. }));
    }
}
