// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! One output record of the simulation driver.

use nalgebra::Vector3;
use refstate_field::{CellClass, DomainId, EquationOfState, FieldState};
use serde::{Deserialize, Serialize};

/// Where a sample sits: a cosmic time or a point in space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleCoordinate {
    ScaleFactor(f64),
    Position(Vector3<f64>),
}

/// Observables at one step (temporal) or one cell (spatial).
///
/// Model outputs that were not configured for the run are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableSample {
    /// Step or cell index within the run
    pub step: u64,
    pub coordinate: SampleCoordinate,
    /// Seconds since the start of a temporal run
    pub time: Option<f64>,
    pub state: FieldState,
    /// J/m³
    pub density: f64,
    /// Pa
    pub pressure: f64,
    pub equation_of_state: EquationOfState,
    /// Attractor potential (m²/s²)
    pub potential: Option<f64>,
    /// Attractor-induced peculiar velocity (m/s)
    pub velocity: Option<Vector3<f64>>,
    /// Cosmic-web class of the cell (spatial runs)
    pub cell_class: Option<CellClass>,
}

impl ObservableSample {
    pub fn scale_factor(&self) -> Option<f64> {
        match self.coordinate {
            SampleCoordinate::ScaleFactor(a) => Some(a),
            SampleCoordinate::Position(_) => None,
        }
    }

    pub fn redshift(&self) -> Option<f64> {
        self.scale_factor().map(|a| 1.0 / a - 1.0)
    }

    pub fn position(&self) -> Option<Vector3<f64>> {
        match self.coordinate {
            SampleCoordinate::Position(p) => Some(p),
            SampleCoordinate::ScaleFactor(_) => None,
        }
    }

    pub fn domain_id(&self) -> Option<DomainId> {
        self.cell_class.and_then(|c| c.domain_id())
    }

    pub fn speed(&self) -> Option<f64> {
        self.velocity.map(|v| v.norm())
    }
}
