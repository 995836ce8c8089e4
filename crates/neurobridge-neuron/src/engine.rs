// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine abstraction traits
//!
//! The coordinator talks to a NEURON-style engine through three seams:
//! - [`ParallelContext`]: gid ownership, collective stepping, spike exchange
//! - [`CellApi`]: per-cell objects (netcons, synapses, traces)
//! - [`Engine`]: global variables (`t`, `dt`, `tstop`, `min_delay`) and
//!   process-level operations
//!
//! Collective calls (`set_maxstep`, `psolve`, `runworker`, `done`) block
//! until every participating process reaches them.

use std::path::{Path, PathBuf};

use neurobridge_core::{CellTypeDescriptor, Gid};

use crate::random::Distribution;

/// Opaque handle to a cell object owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellHandle(pub u64);

/// Opaque handle to a synapse (point process) on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SynapseHandle(pub u64);

/// Opaque handle to a network connection object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetConHandle(pub u64);

/// Errors reported by the native engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown cell handle {0:?}")]
    UnknownCell(CellHandle),

    #[error("unknown synapse handle {0:?}")]
    UnknownSynapse(SynapseHandle),

    #[error("unknown netcon handle {0:?}")]
    UnknownNetCon(NetConHandle),

    #[error("gid {0} has not been assigned to a host")]
    UnassignedGid(Gid),

    #[error("failed to load {}: {reason}", .path.display())]
    LoadLibrary { path: PathBuf, reason: String },

    #[error("invalid distribution parameters: {0}")]
    InvalidDistribution(String),

    #[error("{0}")]
    Native(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Parallel context of a distributed simulation
pub trait ParallelContext {
    /// Number of processes in the parallel group
    fn nhost(&self) -> usize;

    /// Rank of this process
    fn id(&self) -> usize;

    fn spike_compress(&mut self, nspike: i32, gid_compress: bool) -> EngineResult<()>;

    /// Collective: compute the usable integration step, bounded by
    /// `max_step`. Returns the minimum connection delay across all hosts.
    fn set_maxstep(&mut self, max_step: f64) -> EngineResult<f64>;

    /// Collective: integrate until `tstop`
    fn psolve(&mut self, tstop: f64) -> EngineResult<()>;

    fn runworker(&mut self) -> EngineResult<()>;

    fn done(&mut self) -> EngineResult<()>;

    fn set_gid2node(&mut self, gid: Gid, rank: usize) -> EngineResult<()>;

    /// Associate `gid` with the spike source behind `netcon`
    fn cell(&mut self, gid: Gid, netcon: NetConHandle) -> EngineResult<()>;

    /// Connect spikes of `source` (on any host) to a local synapse
    fn gid_connect(&mut self, source: Gid, target: SynapseHandle) -> EngineResult<NetConHandle>;
}

/// Per-cell engine objects
pub trait CellApi {
    /// Instantiate a cell of the given type on this host
    fn create_cell(&mut self, celltype: &CellTypeDescriptor) -> EngineResult<CellHandle>;

    /// Synapse of the given type on `cell`, if it has one
    fn synapse(&self, cell: CellHandle, synapse_type: &str) -> Option<SynapseHandle>;

    /// Spike-detecting netcon; `target` is `None` for a detector only
    fn new_netcon(
        &mut self,
        source: CellHandle,
        target: Option<SynapseHandle>,
    ) -> EngineResult<NetConHandle>;

    fn weight(&self, netcon: NetConHandle) -> EngineResult<f64>;
    fn set_weight(&mut self, netcon: NetConHandle, weight: f64) -> EngineResult<()>;
    fn delay(&self, netcon: NetConHandle) -> EngineResult<f64>;
    fn set_delay(&mut self, netcon: NetConHandle, delay: f64) -> EngineResult<()>;

    fn has_memb_init(&self, cell: CellHandle) -> bool;
    fn memb_init(&mut self, cell: CellHandle) -> EngineResult<()>;

    fn record_spikes(&mut self, cell: CellHandle) -> EngineResult<()>;
    fn record_v(&mut self, cell: CellHandle) -> EngineResult<()>;

    fn spike_times(&self, cell: CellHandle) -> EngineResult<Vec<f64>>;
    fn v_trace(&self, cell: CellHandle) -> EngineResult<Vec<f64>>;
    fn record_times(&self, cell: CellHandle) -> EngineResult<Vec<f64>>;
}

/// A complete engine: parallel context, cells and global state
pub trait Engine: ParallelContext + CellApi {
    fn t(&self) -> f64;
    fn set_t(&mut self, t: f64);
    fn dt(&self) -> f64;
    fn set_dt(&mut self, dt: f64);
    fn tstop(&self) -> f64;
    fn set_tstop(&mut self, tstop: f64);
    fn min_delay(&self) -> f64;
    fn set_min_delay(&mut self, min_delay: f64);

    /// Reset state variables and fire initialization handlers
    fn finitialize(&mut self) -> EngineResult<()>;

    fn quit(&mut self) -> EngineResult<()>;

    /// Load a compiled mechanism library
    fn load_dll(&mut self, path: &Path) -> EngineResult<()>;

    /// `n` values from the engine's own random generator
    fn random_draws(
        &mut self,
        seed: u64,
        distribution: Distribution,
        n: usize,
    ) -> EngineResult<Vec<f64>>;
}
