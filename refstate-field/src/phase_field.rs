// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Spatial Phase Field
//!
//! Stores the reference-state phase θ(x) at every cell of a
//! [`SpatialDomain`], in the domain's raster order. The phase-gradient
//! magnitude |∇θ| is what the cosmic-web classifier thresholds.
//!
//! Differences are taken on the circle (shortest signed angle), so a field
//! that wraps through 2π has no spurious gradient.

use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::attractor::GreatAttractorModel;
use crate::error::{CosmologyError, Result};
use crate::grid::SpatialDomain;
use crate::state::{phase_difference, wrap_phase};

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseField {
    domain: SpatialDomain,
    values: Vec<f64>,
}

impl PhaseField {
    pub fn new(domain: SpatialDomain, values: Vec<f64>) -> Result<Self> {
        if values.len() != domain.num_cells() {
            return Err(CosmologyError::configuration(
                "phase_values",
                format!("expected {} cells, got {}", domain.num_cells(), values.len()),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(CosmologyError::domain("phase", *bad));
        }
        Ok(Self { domain, values })
    }

    pub fn uniform(domain: SpatialDomain, phase: f64) -> Self {
        let n = domain.num_cells();
        Self {
            domain,
            values: vec![wrap_phase(phase); n],
        }
    }

    /// Sample `f` at every cell centre.
    pub fn from_fn(domain: SpatialDomain, f: impl Fn(&Vector3<f64>) -> f64) -> Result<Self> {
        let values = (0..domain.num_cells())
            .map(|idx| f(&domain.cell_center(idx)))
            .collect();
        Self::new(domain, values)
    }

    /// Circular mean of attractor phases weighted by e^{−x_i}.
    ///
    /// Inside an attractor's coherence length its own phase dominates, so
    /// the field is flat there and swings across the walls between
    /// attractors of different phase.
    pub fn from_attractors(domain: SpatialDomain, model: &GreatAttractorModel) -> Self {
        let lc = model.coherence_length();
        let values = (0..domain.num_cells())
            .map(|idx| {
                let p = domain.cell_center(idx);
                let (mut s, mut c) = (0.0f64, 0.0f64);
                for a in model.attractors() {
                    let w = a.weight * (-(p - a.position).norm() / lc).exp();
                    s += w * a.phase.sin();
                    c += w * a.phase.cos();
                }
                wrap_phase(s.atan2(c))
            })
            .collect();
        Self { domain, values }
    }

    /// Seeded superposition of `modes` plane waves with wavelengths in
    /// [L_c, 4 L_c]. Planar domains get in-plane wave vectors.
    pub fn random_modes(domain: SpatialDomain, modes: usize, coherence_length: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let planar = domain.is_planar();
        let amp = PI / (modes.max(1) as f64).sqrt();
        let waves: Vec<(Vector3<f64>, f64)> = (0..modes)
            .map(|_| {
                let azimuth = rng.gen_range(0.0..TAU);
                let cos_polar: f64 = if planar { 0.0 } else { rng.gen_range(-1.0..1.0) };
                let sin_polar = (1.0 - cos_polar * cos_polar).sqrt();
                let dir = Vector3::new(sin_polar * azimuth.cos(), sin_polar * azimuth.sin(), cos_polar);
                let wavelength = coherence_length * rng.gen_range(1.0..4.0);
                let offset = rng.gen_range(0.0..TAU);
                (dir * (TAU / wavelength), offset)
            })
            .collect();
        let values = (0..domain.num_cells())
            .map(|idx| {
                let p = domain.cell_center(idx);
                let theta: f64 = waves.iter().map(|(k, off)| amp * (k.dot(&p) + off).cos()).sum();
                wrap_phase(theta)
            })
            .collect();
        Self { domain, values }
    }

    pub fn domain(&self) -> &SpatialDomain {
        &self.domain
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn phase(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Phase of the cell containing `position`.
    pub fn phase_at(&self, position: &Vector3<f64>) -> Result<f64> {
        Ok(self.values[self.domain.locate(position)?])
    }

    /// |∇θ| at one cell (rad/m), zero along single-cell axes.
    ///
    /// Each axis takes the larger of the two one-sided circular differences
    /// (the only one on a box face). A wrapped central difference would fold
    /// steps above π/2 per cell back towards zero.
    pub fn gradient_magnitude(&self, index: usize) -> f64 {
        let d = &self.domain;
        let h = d.spacing();
        let ijk = d.coords(index);
        let theta = self.values[index];
        let mut sum_sq = 0.0;
        for axis in 0..3 {
            let n = d.dims()[axis];
            if n < 2 {
                continue;
            }
            let shifted = |delta: isize| {
                let mut c = ijk;
                c[axis] = (c[axis] as isize + delta) as usize;
                self.values[d.index(c[0], c[1], c[2])]
            };
            let pos = ijk[axis];
            let backward = (pos > 0).then(|| phase_difference(shifted(-1), theta).abs());
            let forward = (pos + 1 < n).then(|| phase_difference(theta, shifted(1)).abs());
            let g = backward.into_iter().chain(forward).fold(0.0f64, f64::max) / h;
            sum_sq += g * g;
        }
        sum_sq.sqrt()
    }

    /// |∇θ| for every cell, in raster order.
    ///
    /// Each cell is independent, so the scan runs on the rayon pool; the
    /// indexed collect keeps the output order fixed.
    pub fn gradient_magnitudes(&self) -> Vec<f64> {
        (0..self.domain.num_cells())
            .into_par_iter()
            .map(|idx| self.gradient_magnitude(idx))
            .collect()
    }
}
