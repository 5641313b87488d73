// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Cosmic web from phase-coherent domains.
//!
//! Cells whose phase gradient satisfies |∇θ| · L_c < coherence_threshold
//! are domain interiors; the rest are filament walls. Interior cells are
//! joined over face adjacency with a Union-Find, and domain ids are issued
//! in raster order of each domain's first cell, so labels depend only on
//! the field, never on how the gradient scan was partitioned.
//!
//! The box does not wrap: cells on its faces simply have fewer neighbours.

use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::PhysicalConstants;
use crate::error::{CosmologyError, Result};
use crate::phase_field::PhaseField;

pub type DomainId = u32;

/// Classification of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellClass {
    Domain(DomainId),
    Filament,
}

impl CellClass {
    pub fn domain_id(&self) -> Option<DomainId> {
        match self {
            Self::Domain(id) => Some(*id),
            Self::Filament => None,
        }
    }
}

/// Structural observables of a domain (or of the filament network).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainStatistics {
    pub cell_count: usize,
    /// m³ (cell count × spacing³)
    pub size: f64,
    /// Radius of the disc (planar grids) or ball with the same area/volume (m)
    pub equivalent_radius: f64,
    /// ⟨ε⟩_region / ⟨ε⟩_all − 1
    pub density_contrast: f64,
    /// Mean |∇θ| over the region (rad/m)
    pub mean_gradient: f64,
}

// ---------------------------------------------------------------------------
// Union-Find (path halving, lowest index survives)
// ---------------------------------------------------------------------------

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// The root with the lower cell index survives, so every root is the
    /// first cell of its component in raster order.
    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (keep, drop) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[drop] = keep;
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CosmicWebModel {
    field: PhaseField,
    gradient_threshold: f64,
    labels: Vec<CellClass>,
    gradients: Vec<f64>,
    density: Vec<f64>,
    mean_density: f64,
    domain_stats: Vec<DomainStatistics>,
    filament_stats: Option<DomainStatistics>,
}

impl CosmicWebModel {
    /// Classify `field` using the threshold and L_c from `constants`.
    pub fn new(constants: &PhysicalConstants, field: PhaseField) -> Result<Self> {
        constants.validate()?;
        Self::with_threshold(constants.coherence_length, constants.coherence_threshold, field)
    }

    /// `threshold` is in radians per coherence length.
    pub fn with_threshold(coherence_length: f64, threshold: f64, field: PhaseField) -> Result<Self> {
        for (name, value) in [("coherence_length", coherence_length), ("coherence_threshold", threshold)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CosmologyError::configuration(
                    name,
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }
        let gradient_threshold = threshold / coherence_length;
        let gradients = field.gradient_magnitudes();
        let density: Vec<f64> = gradients
            .iter()
            .map(|g| {
                let x = g * coherence_length;
                1.0 + 0.5 * x * x
            })
            .collect();
        let mean_density = density.iter().sum::<f64>() / density.len() as f64;

        let labels = label_domains(&field, &gradients, gradient_threshold);

        let mut model = Self {
            field,
            gradient_threshold,
            labels,
            gradients,
            density,
            mean_density,
            domain_stats: Vec::new(),
            filament_stats: None,
        };
        model.collect_statistics();
        Ok(model)
    }

    fn collect_statistics(&mut self) {
        let num_domains = self
            .labels
            .iter()
            .filter_map(CellClass::domain_id)
            .max()
            .map_or(0, |m| m as usize + 1);

        // (count, Σε, Σ|∇θ|) per domain, plus one slot for filaments
        let mut acc = vec![(0usize, 0.0f64, 0.0f64); num_domains + 1];
        for (idx, class) in self.labels.iter().enumerate() {
            let slot = match class {
                CellClass::Domain(id) => *id as usize,
                CellClass::Filament => num_domains,
            };
            acc[slot].0 += 1;
            acc[slot].1 += self.density[idx];
            acc[slot].2 += self.gradients[idx];
        }

        let filament = acc.pop().filter(|(count, _, _)| *count > 0);
        self.domain_stats = acc.into_iter().map(|a| self.region_statistics(a)).collect();
        self.filament_stats = filament.map(|a| self.region_statistics(a));
    }

    fn region_statistics(&self, (count, density_sum, gradient_sum): (usize, f64, f64)) -> DomainStatistics {
        let domain = self.field.domain();
        let size = count as f64 * domain.cell_volume();
        let equivalent_radius = if domain.is_planar() {
            let area = count as f64 * domain.spacing() * domain.spacing();
            (area / PI).sqrt()
        } else {
            (3.0 * size / (4.0 * PI)).cbrt()
        };
        let n = count.max(1) as f64;
        DomainStatistics {
            cell_count: count,
            size,
            equivalent_radius,
            density_contrast: (density_sum / n) / self.mean_density - 1.0,
            mean_gradient: gradient_sum / n,
        }
    }

    pub fn field(&self) -> &PhaseField {
        &self.field
    }

    /// Threshold in rad/m.
    pub fn gradient_threshold(&self) -> f64 {
        self.gradient_threshold
    }

    pub fn classify_cell(&self, index: usize) -> CellClass {
        self.labels[index]
    }

    /// Class of the cell containing `position`.
    pub fn classify_domain(&self, position: &Vector3<f64>) -> Result<CellClass> {
        Ok(self.labels[self.field.domain().locate(position)?])
    }

    /// Per-cell classes in raster order.
    pub fn domain_grid(&self) -> &[CellClass] {
        &self.labels
    }

    pub fn gradients(&self) -> &[f64] {
        &self.gradients
    }

    pub fn domain_count(&self) -> usize {
        self.domain_stats.len()
    }

    pub fn domain_statistics(&self, domain: DomainId) -> Result<DomainStatistics> {
        self.domain_stats
            .get(domain as usize)
            .copied()
            .ok_or_else(|| CosmologyError::domain("domain_id", domain as f64))
    }

    /// Statistics of all filament cells together; `None` without filaments.
    pub fn filament_statistics(&self) -> Option<DomainStatistics> {
        self.filament_stats
    }

    pub fn filament_fraction(&self) -> f64 {
        let filaments = self.filament_stats.map_or(0, |s| s.cell_count);
        filaments as f64 / self.labels.len() as f64
    }

    /// Domain sizes (m³) in domain-id order.
    pub fn size_distribution(&self) -> Vec<f64> {
        self.domain_stats.iter().map(|s| s.size).collect()
    }
}

/// Raster-order connected-component labelling of interior cells.
fn label_domains(field: &PhaseField, gradients: &[f64], threshold: f64) -> Vec<CellClass> {
    let domain = field.domain();
    let n = domain.num_cells();
    let interior: Vec<bool> = gradients.iter().map(|g| *g < threshold).collect();

    let mut uf = UnionFind::new(n);
    for idx in 0..n {
        if !interior[idx] {
            continue;
        }
        for nb in domain.face_neighbors(idx) {
            if nb < idx && interior[nb] {
                uf.union(idx, nb);
            }
        }
    }

    let mut root_label: Vec<Option<DomainId>> = vec![None; n];
    let mut next: DomainId = 0;
    let mut labels = Vec::with_capacity(n);
    for idx in 0..n {
        if !interior[idx] {
            labels.push(CellClass::Filament);
            continue;
        }
        let root = uf.find(idx);
        let id = *root_label[root].get_or_insert_with(|| {
            let id = next;
            next += 1;
            id
        });
        labels.push(CellClass::Domain(id));
    }
    labels
}
