// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

pub mod config;
pub mod sample;
pub mod trajectory;
pub mod simulation;
pub mod predictions;

pub use config::{PhaseSource, SimulationConfig, SimulationMode, StepControl};
pub use sample::{ObservableSample, SampleCoordinate};
pub use trajectory::{FailureReason, SimulationTrajectory};
pub use simulation::{ReferenceStateSimulation, SimulationPhase, StepOutcome};
pub use predictions::{
    BulkFlow, CplFit, HubbleDeviation, ObservationalPredictions, PercentileBand, PredictionSummary,
};
