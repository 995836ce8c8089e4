// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine-state coordinator.
//!
//! A [`Simulator`] is the single authoritative view of the clock and the
//! parallel group for one engine session. It owns the engine, the deferred
//! [`Initializer`] and the gid counter; every operation that touches global
//! engine state goes through it.
//!
//! ## Lifecycle
//!
//! ```text
//! new ──> (create cells, register, connect) ──> run ──> run ... ──> finalize
//!                                                ^           |
//!                                                └── reset <─┘
//! ```
//!
//! The first `run` after construction or `reset` computes the usable step,
//! calls `finitialize`, initialises registered membranes and, on more than
//! one process, checks every connection delay against the minimum delay.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use neurobridge_config::SimulationConfig;
use neurobridge_core::{CellTypeDescriptor, Gid, SynapseType, DEFAULT_WEIGHT};
use tracing::{debug, info};

use crate::cell::{CellId, Population};
use crate::connection::Connection;
use crate::engine::{CellHandle, Engine};
use crate::error::{ConnectionError, Result, SimulatorError};
use crate::initializer::Initializer;
use crate::mechanisms::load_mechanisms;

pub struct Simulator<E: Engine> {
    engine: E,
    gid_counter: u32,
    running: bool,
    initialized: bool,
    num_processes: usize,
    mpi_rank: usize,
    max_step: f64,
    spike_time_tolerance: f64,
    initializer: Initializer,
    registered_gids: BTreeSet<Gid>,
    loaded_mechanisms: BTreeSet<PathBuf>,
}

impl<E: Engine> Simulator<E> {
    /// Take ownership of `engine` and set up its global state from `config`.
    pub fn new(mut engine: E, config: &SimulationConfig) -> Result<Self> {
        engine.set_min_delay(config.min_delay);
        engine.set_tstop(0.0);
        engine.set_dt(config.timestep);
        if config.spike_compression {
            engine.spike_compress(1, false)?;
        }

        let num_processes = engine.nhost();
        let mpi_rank = engine.id();

        let mut simulator = Self {
            engine,
            gid_counter: 0,
            running: false,
            initialized: false,
            num_processes,
            mpi_rank,
            max_step: config.max_step,
            spike_time_tolerance: config.spike_time_tolerance,
            initializer: Initializer::new(),
            registered_gids: BTreeSet::new(),
            loaded_mechanisms: BTreeSet::new(),
        };

        if let Some(dir) = &config.mechanisms_dir {
            simulator.load_mechanisms(dir)?;
        }

        debug!(
            "[SIMULATOR] Initialized on host #{} of {} (min_delay={}, dt={})",
            mpi_rank, num_processes, config.min_delay, config.timestep
        );
        Ok(simulator)
    }

    // ========================================================================
    // State accessors
    // ========================================================================

    pub fn t(&self) -> f64 {
        self.engine.t()
    }

    pub fn dt(&self) -> f64 {
        self.engine.dt()
    }

    pub fn set_dt(&mut self, dt: f64) {
        self.engine.set_dt(dt);
    }

    pub fn tstop(&self) -> f64 {
        self.engine.tstop()
    }

    pub fn min_delay(&self) -> f64 {
        self.engine.min_delay()
    }

    pub fn set_min_delay(&mut self, min_delay: f64) {
        self.engine.set_min_delay(min_delay);
    }

    pub fn num_processes(&self) -> usize {
        self.num_processes
    }

    pub fn mpi_rank(&self) -> usize {
        self.mpi_rank
    }

    pub fn gid_counter(&self) -> u32 {
        self.gid_counter
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether membranes have been initialised by a first `run`
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn spike_time_tolerance(&self) -> f64 {
        self.spike_time_tolerance
    }

    pub fn initializer(&self) -> &Initializer {
        &self.initializer
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stop the running session and rewind the clock. Idempotent.
    pub fn reset(&mut self) {
        self.running = false;
        self.engine.set_t(0.0);
        self.engine.set_tstop(0.0);
        debug!("[SIMULATOR] Reset");
    }

    /// Advance the simulation by `duration` ms and return the current time.
    ///
    /// # Errors
    ///
    /// [`SimulatorError::MinDelayViolation`] on the first run of a session
    /// when, with more than one process, some connection is shorter than the
    /// minimum delay. The session is left not running in that case.
    pub fn run(&mut self, duration: f64) -> Result<f64> {
        if !self.running {
            let local_minimum_delay = self.engine.set_maxstep(self.max_step)?;
            self.engine.finitialize()?;
            self.initializer.initialize(&mut self.engine)?;
            self.initialized = true;
            self.engine.set_tstop(0.0);

            debug!(
                "[SIMULATOR] local_minimum_delay on host #{} = {}",
                self.mpi_rank, local_minimum_delay
            );
            let min_delay = self.engine.min_delay();
            if self.num_processes > 1 && local_minimum_delay < min_delay {
                return Err(SimulatorError::MinDelayViolation {
                    local_minimum_delay,
                    min_delay,
                });
            }
            self.running = true;
        }

        let tstop = self.engine.tstop() + duration;
        self.engine.set_tstop(tstop);
        info!("[SIMULATOR] Running the simulation for {} ms", duration);
        self.engine.psolve(tstop)?;
        Ok(self.engine.t())
    }

    /// Release worker processes and hand the engine back.
    pub fn finalize(mut self, quit: bool) -> Result<E> {
        self.engine.runworker()?;
        self.engine.done()?;
        if quit {
            info!("[SIMULATOR] Finishing up with NEURON");
            self.engine.quit()?;
        }
        Ok(self.engine)
    }

    pub fn load_mechanisms(&mut self, dir: &Path) -> Result<bool> {
        load_mechanisms(&mut self.engine, dir, &mut self.loaded_mechanisms)
    }

    // ========================================================================
    // Gid management
    // ========================================================================

    /// Reserve `n` consecutive gids
    pub fn allocate_gids(&mut self, n: u32) -> Result<Vec<Gid>> {
        let start = self.gid_counter;
        self.gid_counter = start
            .checked_add(n)
            .ok_or(SimulatorError::GidOverflow { gid_counter: start })?;
        Ok((start..self.gid_counter).map(Gid).collect())
    }

    /// Assign `gid` to this host and bind it to the spike source of `source`.
    ///
    /// The gid counter is advanced past `gid` if needed, so the largest `u32`
    /// is rejected with [`SimulatorError::GidOverflow`].
    pub fn register_gid(&mut self, gid: Gid, source: CellHandle) -> Result<()> {
        if self.registered_gids.contains(&gid) {
            return Err(SimulatorError::GidAlreadyRegistered(gid));
        }
        let next = gid
            .as_u32()
            .checked_add(1)
            .ok_or(SimulatorError::GidOverflow {
                gid_counter: self.gid_counter,
            })?;

        self.engine.set_gid2node(gid, self.mpi_rank)?;
        let detector = self.engine.new_netcon(source, None)?;
        self.engine.cell(gid, detector)?;

        self.registered_gids.insert(gid);
        self.gid_counter = self.gid_counter.max(next);
        Ok(())
    }

    pub fn is_registered(&self, gid: Gid) -> bool {
        self.registered_gids.contains(&gid)
    }

    /// Create one cell. Gids are dealt round-robin over hosts; only cells
    /// owned by this host get an engine object.
    pub fn create_cell(&mut self, celltype: Arc<CellTypeDescriptor>) -> Result<CellId> {
        let gid = Gid(self.gid_counter);
        self.gid_counter = gid.as_u32().checked_add(1).ok_or(SimulatorError::GidOverflow {
            gid_counter: self.gid_counter,
        })?;

        if gid.as_u32() as usize % self.num_processes.max(1) != self.mpi_rank {
            return Ok(CellId::remote(gid, celltype));
        }

        let handle = self.engine.create_cell(&celltype)?;
        self.register_gid(gid, handle)?;
        Ok(CellId::local(gid, handle, celltype))
    }

    pub fn create_population(
        &mut self,
        label: &str,
        celltype: Arc<CellTypeDescriptor>,
        size: usize,
    ) -> Result<Population> {
        let cells = (0..size)
            .map(|_| self.create_cell(celltype.clone()))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "[SIMULATOR] Created population '{}' of {} '{}' cells",
            label,
            size,
            celltype.name
        );
        Ok(Population::new(label, celltype, cells))
    }

    // ========================================================================
    // Deferred initialization
    // ========================================================================

    pub fn register_cell(&mut self, cell: &CellId) -> bool {
        self.initializer.register_cell(&self.engine, cell)
    }

    pub fn register_population(&mut self, population: &Population) -> bool {
        self.initializer.register_population(population)
    }

    // ========================================================================
    // Connection wiring
    // ========================================================================

    /// Connect gid `source` to a local `target` cell.
    ///
    /// Without an explicit synapse type, non-negative weights go to the
    /// excitatory synapse and negative ones to the inhibitory synapse. The
    /// weight defaults to [`DEFAULT_WEIGHT`] and the delay to the minimum
    /// delay. Conductance-based targets always get a non-negative weight;
    /// inhibitory synapses on current-based targets a non-positive one.
    pub fn single_connect(
        &mut self,
        source: Gid,
        target: &CellId,
        weight: Option<f64>,
        delay: Option<f64>,
        synapse_type: Option<SynapseType>,
    ) -> Result<Connection> {
        if source.as_u32() > self.gid_counter {
            return Err(ConnectionError::InvalidSource {
                source_gid: source,
                gid_counter: self.gid_counter,
            }
            .into());
        }
        let target_cell = target.cell().ok_or_else(|| ConnectionError::InvalidTarget {
            target: target.gid,
            reason: "not a cell on this host".to_string(),
        })?;

        let mut weight = weight.unwrap_or(DEFAULT_WEIGHT);
        let synapse_type = synapse_type.unwrap_or_else(|| SynapseType::for_weight(weight));
        if target.celltype().capabilities.conductance_based {
            weight = weight.abs();
        } else if synapse_type.is_inhibitory() && weight > 0.0 {
            weight = -weight;
        }

        let min_delay = self.engine.min_delay();
        let delay = match delay {
            None => min_delay,
            Some(d) if d < min_delay => {
                return Err(ConnectionError::DelayTooSmall {
                    delay: d,
                    min_delay,
                }
                .into())
            }
            Some(d) => d,
        };

        let synapse = self
            .engine
            .synapse(target_cell, synapse_type.as_str())
            .ok_or_else(|| ConnectionError::InvalidTarget {
                target: target.gid,
                reason: format!("cell has no '{}' synapse", synapse_type),
            })?;

        let netcon = self.engine.gid_connect(source, synapse)?;
        self.engine.set_weight(netcon, weight)?;
        self.engine.set_delay(netcon, delay)?;

        debug!(
            "[SIMULATOR] Connected {} -> {} ({}, weight={}, delay={})",
            source, target.gid, synapse_type, weight, delay
        );

        Ok(Connection {
            pre: source,
            post: target.gid,
            netcon,
            synapse_type,
            weight,
            delay,
        })
    }
}

impl<E: Engine + std::fmt::Debug> std::fmt::Debug for Simulator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("engine", &self.engine)
            .field("gid_counter", &self.gid_counter)
            .field("running", &self.running)
            .field("num_processes", &self.num_processes)
            .field("mpi_rank", &self.mpi_rank)
            .finish_non_exhaustive()
    }
}
