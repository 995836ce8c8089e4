// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the engine-state coordinator

use std::path::PathBuf;

use neurobridge_core::Gid;

use crate::engine::EngineError;

/// A connection request that cannot be wired.
///
/// Nothing is created in the engine when one of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid source id {source_gid} (gid_counter={gid_counter})")]
    InvalidSource { source_gid: Gid, gid_counter: u32 },

    #[error("invalid target id {target}: {reason}")]
    InvalidTarget { target: Gid, reason: String },

    #[error("delay ({delay}) is too small (< {min_delay})")]
    DelayTooSmall { delay: f64, min_delay: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Some connection is shorter than the configured minimum delay while
    /// running on more than one process.
    #[error(
        "there are connections with delays ({local_minimum_delay}) shorter than the minimum delay ({min_delay})"
    )]
    MinDelayViolation {
        local_minimum_delay: f64,
        min_delay: f64,
    },

    #[error("gid {0} is already registered with the parallel context")]
    GidAlreadyRegistered(Gid),

    /// Every `u32` gid has been handed out
    #[error("gid space exhausted (gid_counter={gid_counter})")]
    GidOverflow { gid_counter: u32 },

    #[error("no output destination: pass a file or create the recorder with one")]
    NoOutputDestination,

    #[error("unknown recording variable '{0}' (expected 'spikes' or 'v')")]
    UnknownVariable(String),

    #[error("NEURON mechanisms not found in {}", .0.display())]
    MechanismsNotFound(PathBuf),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gid {gid} has {times} sample times but {values} recorded values")]
    TraceLengthMismatch {
        gid: Gid,
        times: usize,
        values: usize,
    },

    #[error("recorded data has inconsistent shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Result type for coordinator operations
pub type Result<T> = std::result::Result<T, SimulatorError>;
