// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for cell-type construction

/// Error raised by an external model reducer, passed through untouched
pub type ReductionError = Box<dyn std::error::Error + Send + Sync>;

/// The model/synapse description cannot be turned into a cell type.
///
/// Always a setup-time failure: downstream wiring has no way to recover from
/// an ambiguous or inconsistent description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error(
        "synapse component '{namespace}' exposes {found} receive event ports; exactly one is required (ambiguous receive port)"
    )]
    AmbiguousReceivePort { namespace: String, found: usize },

    #[error("model has no subcomponent for synapse namespace '{0}'")]
    UnknownSynapseNamespace(String),

    #[error("synapse namespace '{0}' is attached more than once")]
    DuplicateSynapseNamespace(String),

    #[error("reduced component '{0}' declares no regimes")]
    NoRegimes(String),

    #[error("initial regime '{regime}' is not a regime of component '{component}'")]
    UnknownRegime { component: String, regime: String },
}

/// Errors from building and installing a cell-type extension
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Reduction(ReductionError),

    #[error("cell type '{0}' has already been built in this process")]
    AlreadyBuilt(String),

    #[error("{step} failed ({status}): {stderr}")]
    Toolchain {
        step: String,
        status: String,
        stderr: String,
    },

    #[error("failed to install module '{module}': {reason}")]
    Install { module: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, BuildError::Configuration(_))
    }
}

/// Result type for build operations
pub type Result<T> = std::result::Result<T, BuildError>;
