// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Error taxonomy shared by every model and the simulation driver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the reference-state models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CosmologyError {
    /// Missing or invalid constant. Fatal; never retried.
    #[error("configuration error in `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    /// A physical quantity left its valid range (e.g. negative amplitude).
    #[error("domain error: {quantity} = {value} is outside its valid range")]
    Domain { quantity: String, value: f64 },

    /// Evaluation at (or numerically at) an attractor centre.
    #[error("singularity at attractor {attractor}: distance {distance:e} m")]
    Singularity { attractor: usize, distance: f64 },

    /// An aggregate statistic needs more samples than are available.
    #[error("insufficient data for {statistic}: need {required}, have {available}")]
    InsufficientData {
        statistic: String,
        required: usize,
        available: usize,
    },
}

impl CosmologyError {
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn domain(quantity: impl Into<String>, value: f64) -> Self {
        Self::Domain {
            quantity: quantity.into(),
            value,
        }
    }

    pub fn insufficient(statistic: impl Into<String>, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            statistic: statistic.into(),
            required,
            available,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Domain { .. } => ErrorKind::Domain,
            Self::Singularity { .. } => ErrorKind::Singularity,
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
        }
    }
}

/// Discriminant of [`CosmologyError`], serializable into failure records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Configuration,
    Domain,
    Singularity,
    InsufficientData,
}

pub type Result<T> = std::result::Result<T, CosmologyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_field() {
        let err = CosmologyError::configuration("coherence_length", "must be > 0");
        assert!(err.to_string().contains("coherence_length"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(CosmologyError::domain("amplitude", -1.0).kind(), ErrorKind::Domain);
        assert_eq!(
            CosmologyError::Singularity { attractor: 0, distance: 0.0 }.kind(),
            ErrorKind::Singularity
        );
        assert_eq!(
            CosmologyError::insufficient("percentile_band", 5, 2).kind(),
            ErrorKind::InsufficientData
        );
    }
}
