// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

pub mod error;
pub mod constants;
pub mod state;
pub mod field;
pub mod grid;
pub mod attractor;
pub mod phase_field;
pub mod dark_energy;
pub mod cosmic_web;

pub use error::{CosmologyError, ErrorKind, Result};
pub use constants::{PhaseMapping, PhysicalConstants, MEGAPARSEC};
pub use state::{FieldState, ScaleFactorPoint};
pub use field::{AdaptiveTimestep, EquationOfState, IntegratorMethod, ReferenceStateField, recommended_step_size};
pub use grid::SpatialDomain;
pub use attractor::{Attractor, GreatAttractorModel};
pub use phase_field::PhaseField;
pub use dark_energy::{DarkEnergyModel, DarkEnergyObservables};
pub use cosmic_web::{CellClass, CosmicWebModel, DomainId, DomainStatistics};
