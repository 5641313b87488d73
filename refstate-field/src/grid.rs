// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Grid-aligned spatial domain.
//!
//! A `SpatialDomain` is an axis-aligned box cut into cubic cells of side
//! `spacing`. Cells are indexed in raster order: x fastest, then y, then z.
//! A 2D domain is a box one cell thick in z.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{CosmologyError, Result};

/// Relative tolerance for extent / spacing being an integer.
const ALIGNMENT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialDomain {
    origin: Vector3<f64>,
    spacing: f64,
    dims: [usize; 3],
}

impl SpatialDomain {
    /// Build a domain from its lower corner, extent and cell spacing.
    ///
    /// Every extent component must be a positive integer multiple of
    /// `spacing`.
    pub fn new(origin: Vector3<f64>, extent: Vector3<f64>, spacing: f64) -> Result<Self> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(CosmologyError::configuration(
                "spacing",
                format!("must be finite and > 0, got {spacing}"),
            ));
        }
        let mut dims = [0usize; 3];
        for (axis, dim) in dims.iter_mut().enumerate() {
            let len = extent[axis];
            if !len.is_finite() || len <= 0.0 {
                return Err(CosmologyError::configuration(
                    format!("extent[{axis}]"),
                    format!("must be finite and > 0, got {len}"),
                ));
            }
            let cells = len / spacing;
            let rounded = cells.round();
            if rounded < 1.0 || (cells - rounded).abs() > ALIGNMENT_TOLERANCE * cells.max(1.0) {
                return Err(CosmologyError::configuration(
                    format!("extent[{axis}]"),
                    format!("{len} is not a multiple of spacing {spacing}"),
                ));
            }
            *dim = rounded as usize;
        }
        Ok(Self {
            origin,
            spacing,
            dims,
        })
    }

    /// Square 2D domain `n × n` cells, centred on the origin.
    pub fn centered_square(cells_per_side: usize, spacing: f64) -> Result<Self> {
        let half = 0.5 * cells_per_side as f64 * spacing;
        Self::new(
            Vector3::new(-half, -half, -0.5 * spacing),
            Vector3::new(2.0 * half, 2.0 * half, spacing),
            spacing,
        )
    }

    /// Cubic 3D domain `n × n × n` cells, centred on the origin.
    pub fn centered_cube(cells_per_side: usize, spacing: f64) -> Result<Self> {
        let half = 0.5 * cells_per_side as f64 * spacing;
        let side = 2.0 * half;
        Self::new(
            Vector3::new(-half, -half, -half),
            Vector3::new(side, side, side),
            spacing,
        )
    }

    pub fn origin(&self) -> Vector3<f64> {
        self.origin
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn extent(&self) -> Vector3<f64> {
        Vector3::new(
            self.dims[0] as f64 * self.spacing,
            self.dims[1] as f64 * self.spacing,
            self.dims[2] as f64 * self.spacing,
        )
    }

    pub fn num_cells(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    pub fn is_planar(&self) -> bool {
        self.dims[2] == 1
    }

    /// Volume of one cell (area × spacing for planar domains).
    pub fn cell_volume(&self) -> f64 {
        self.spacing.powi(3)
    }

    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.dims[0] * (j + self.dims[1] * k)
    }

    pub fn coords(&self, index: usize) -> [usize; 3] {
        let i = index % self.dims[0];
        let j = (index / self.dims[0]) % self.dims[1];
        let k = index / (self.dims[0] * self.dims[1]);
        [i, j, k]
    }

    pub fn cell_center(&self, index: usize) -> Vector3<f64> {
        let [i, j, k] = self.coords(index);
        self.origin
            + Vector3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5) * self.spacing
    }

    /// Cell containing `position`; positions on the upper faces belong to the
    /// last cell.
    pub fn locate(&self, position: &Vector3<f64>) -> Result<usize> {
        let mut ijk = [0usize; 3];
        for axis in 0..3 {
            let rel = (position[axis] - self.origin[axis]) / self.spacing;
            let n = self.dims[axis] as f64;
            if !rel.is_finite() || rel < 0.0 || rel > n {
                return Err(CosmologyError::domain(
                    format!("position[{axis}]"),
                    position[axis],
                ));
            }
            ijk[axis] = (rel.floor() as usize).min(self.dims[axis] - 1);
        }
        Ok(self.index(ijk[0], ijk[1], ijk[2]))
    }

    /// Face neighbours of a cell; the domain does not wrap.
    pub fn face_neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let [i, j, k] = self.coords(index);
        let [nx, ny, nz] = self.dims;
        let candidates = [
            (i > 0).then(|| self.index(i - 1, j, k)),
            (i + 1 < nx).then(|| self.index(i + 1, j, k)),
            (j > 0).then(|| self.index(i, j - 1, k)),
            (j + 1 < ny).then(|| self.index(i, j + 1, k)),
            (k > 0).then(|| self.index(i, j, k - 1)),
            (k + 1 < nz).then(|| self.index(i, j, k + 1)),
        ];
        candidates.into_iter().flatten()
    }
}
