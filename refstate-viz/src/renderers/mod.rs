// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Renderers for reference-state output.
//!
//! Each renderer takes simulation output (a trajectory or a classified
//! cosmic web) and produces a self-contained HTML document drawn with
//! Canvas 2D.

pub mod timeseries;
pub mod domain_map;

pub use timeseries::{render_trajectory, Series};
pub use domain_map::render_domain_map;
