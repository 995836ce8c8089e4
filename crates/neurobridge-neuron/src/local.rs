// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory engine for dry runs and tests.
//!
//! [`LocalEngine`] plays one rank of a parallel group without any peers:
//! collectives complete immediately and only local state is consulted.
//! There are no dynamics. Membrane potential stays at its initial value and
//! spikes happen only where scheduled with [`LocalEngine::schedule_spikes`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use neurobridge_core::{CellTypeDescriptor, Gid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::engine::{
    CellApi, CellHandle, Engine, EngineError, EngineResult, NetConHandle, ParallelContext,
    SynapseHandle,
};
use crate::random::Distribution;

/// Resting potential given to cells on `memb_init`
pub const DEFAULT_V_INIT: f64 = -65.0;

#[derive(Debug, Clone)]
struct LocalCell {
    synapses: BTreeMap<String, SynapseHandle>,
    has_memb_init: bool,
    v: f64,
    memb_init_count: usize,
    recording_spikes: bool,
    recording_v: bool,
    trace_requests: usize,
    scheduled_spikes: Vec<f64>,
    spike_times: Vec<f64>,
    v_trace: Vec<f64>,
    record_times: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct LocalNetCon {
    source_gid: Option<Gid>,
    target: Option<SynapseHandle>,
    weight: f64,
    delay: f64,
}

#[derive(Debug, Clone)]
pub struct LocalEngine {
    nhost: usize,
    rank: usize,
    t: f64,
    dt: f64,
    tstop: f64,
    min_delay: f64,
    cells: Vec<LocalCell>,
    synapse_owner: Vec<CellHandle>,
    netcons: Vec<LocalNetCon>,
    gid_owner: BTreeMap<Gid, usize>,
    gid_source: BTreeMap<Gid, NetConHandle>,
    spike_compression: Option<(i32, bool)>,
    loaded_libraries: Vec<PathBuf>,
    finitialize_count: usize,
    psolve_targets: Vec<f64>,
    worker_released: bool,
    done: bool,
    quit: bool,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEngine {
    /// Single-process engine
    pub fn new() -> Self {
        Self::with_hosts(1, 0)
    }

    /// Engine acting as rank `rank` of `nhost` processes
    pub fn with_hosts(nhost: usize, rank: usize) -> Self {
        Self {
            nhost: nhost.max(1),
            rank,
            t: 0.0,
            dt: 0.025,
            tstop: 0.0,
            min_delay: 0.0,
            cells: Vec::new(),
            synapse_owner: Vec::new(),
            netcons: Vec::new(),
            gid_owner: BTreeMap::new(),
            gid_source: BTreeMap::new(),
            spike_compression: None,
            loaded_libraries: Vec::new(),
            finitialize_count: 0,
            psolve_targets: Vec::new(),
            worker_released: false,
            done: false,
            quit: false,
        }
    }

    /// Cell without synapses or membrane-initialization routine, like a
    /// bare spike generator.
    pub fn create_bare_cell(&mut self) -> CellHandle {
        self.push_cell(&[], false)
    }

    /// Spikes the cell will emit once the integration reaches them
    pub fn schedule_spikes(&mut self, cell: CellHandle, times: &[f64]) -> EngineResult<()> {
        let cell = self.cell_mut(cell)?;
        cell.scheduled_spikes.extend_from_slice(times);
        cell.scheduled_spikes.sort_by(f64::total_cmp);
        Ok(())
    }

    pub fn memb_init_count(&self, cell: CellHandle) -> usize {
        self.cells
            .get(cell.0 as usize)
            .map_or(0, |c| c.memb_init_count)
    }

    /// How often spike or voltage tracing was switched on for `cell`
    pub fn trace_requests(&self, cell: CellHandle) -> usize {
        self.cells.get(cell.0 as usize).map_or(0, |c| c.trace_requests)
    }

    pub fn netcon_count(&self) -> usize {
        self.netcons.len()
    }

    /// Netcons created by `gid_connect`
    pub fn gid_connection_count(&self) -> usize {
        self.netcons.iter().filter(|n| n.source_gid.is_some()).count()
    }

    /// Netcons whose target synapse sits on `cell`
    pub fn connections_to(&self, cell: CellHandle) -> usize {
        self.netcons
            .iter()
            .filter_map(|n| n.target)
            .filter(|syn| self.synapse_owner.get(syn.0 as usize) == Some(&cell))
            .count()
    }

    pub fn gid_host(&self, gid: Gid) -> Option<usize> {
        self.gid_owner.get(&gid).copied()
    }

    pub fn is_gid_bound(&self, gid: Gid) -> bool {
        self.gid_source.contains_key(&gid)
    }

    pub fn spike_compression(&self) -> Option<(i32, bool)> {
        self.spike_compression
    }

    pub fn loaded_libraries(&self) -> &[PathBuf] {
        &self.loaded_libraries
    }

    pub fn finitialize_count(&self) -> usize {
        self.finitialize_count
    }

    /// Every `tstop` passed to `psolve`, in order
    pub fn psolve_targets(&self) -> &[f64] {
        &self.psolve_targets
    }

    pub fn is_done(&self) -> bool {
        self.worker_released && self.done
    }

    pub fn has_quit(&self) -> bool {
        self.quit
    }

    fn push_cell(&mut self, synapse_types: &[String], has_memb_init: bool) -> CellHandle {
        let handle = CellHandle(self.cells.len() as u64);
        let mut synapses = BTreeMap::new();
        for name in synapse_types {
            let syn = SynapseHandle(self.synapse_owner.len() as u64);
            self.synapse_owner.push(handle);
            synapses.insert(name.clone(), syn);
        }
        self.cells.push(LocalCell {
            synapses,
            has_memb_init,
            v: 0.0,
            memb_init_count: 0,
            recording_spikes: false,
            recording_v: false,
            trace_requests: 0,
            scheduled_spikes: Vec::new(),
            spike_times: Vec::new(),
            v_trace: Vec::new(),
            record_times: Vec::new(),
        });
        handle
    }

    fn cell_ref(&self, cell: CellHandle) -> EngineResult<&LocalCell> {
        self.cells
            .get(cell.0 as usize)
            .ok_or(EngineError::UnknownCell(cell))
    }

    fn cell_mut(&mut self, cell: CellHandle) -> EngineResult<&mut LocalCell> {
        self.cells
            .get_mut(cell.0 as usize)
            .ok_or(EngineError::UnknownCell(cell))
    }

    fn netcon_ref(&self, netcon: NetConHandle) -> EngineResult<&LocalNetCon> {
        self.netcons
            .get(netcon.0 as usize)
            .ok_or(EngineError::UnknownNetCon(netcon))
    }

    fn netcon_mut(&mut self, netcon: NetConHandle) -> EngineResult<&mut LocalNetCon> {
        self.netcons
            .get_mut(netcon.0 as usize)
            .ok_or(EngineError::UnknownNetCon(netcon))
    }

    fn push_netcon(&mut self, netcon: LocalNetCon) -> NetConHandle {
        let handle = NetConHandle(self.netcons.len() as u64);
        self.netcons.push(netcon);
        handle
    }
}

impl ParallelContext for LocalEngine {
    fn nhost(&self) -> usize {
        self.nhost
    }

    fn id(&self) -> usize {
        self.rank
    }

    fn spike_compress(&mut self, nspike: i32, gid_compress: bool) -> EngineResult<()> {
        self.spike_compression = Some((nspike, gid_compress));
        Ok(())
    }

    fn set_maxstep(&mut self, max_step: f64) -> EngineResult<f64> {
        Ok(self
            .netcons
            .iter()
            .filter(|n| n.source_gid.is_some())
            .map(|n| n.delay)
            .fold(max_step, f64::min))
    }

    fn psolve(&mut self, tstop: f64) -> EngineResult<()> {
        self.psolve_targets.push(tstop);
        let dt = self.dt;
        let start = self.t;

        for cell in &mut self.cells {
            if cell.recording_v {
                let steps = ((tstop - start) / dt).round().max(0.0) as usize;
                // the first sample of a session is taken at t = start
                let first = usize::from(!cell.record_times.is_empty());
                for step in first..=steps {
                    cell.record_times.push(start + step as f64 * dt);
                    cell.v_trace.push(cell.v);
                }
            }

            // threshold detection during the final step may report a spike
            // slightly past tstop
            let horizon = tstop + dt;
            let fired: Vec<f64> = cell
                .scheduled_spikes
                .iter()
                .copied()
                .filter(|t| *t >= start && *t < horizon)
                .collect();
            cell.scheduled_spikes.retain(|t| *t < start || *t >= horizon);
            if cell.recording_spikes {
                cell.spike_times.extend(fired);
            }
        }

        self.t = tstop;
        trace!("[LOCAL-ENGINE] Integrated to t={}", tstop);
        Ok(())
    }

    fn runworker(&mut self) -> EngineResult<()> {
        self.worker_released = true;
        Ok(())
    }

    fn done(&mut self) -> EngineResult<()> {
        self.done = true;
        Ok(())
    }

    fn set_gid2node(&mut self, gid: Gid, rank: usize) -> EngineResult<()> {
        self.gid_owner.insert(gid, rank);
        Ok(())
    }

    fn cell(&mut self, gid: Gid, netcon: NetConHandle) -> EngineResult<()> {
        if !self.gid_owner.contains_key(&gid) {
            return Err(EngineError::UnassignedGid(gid));
        }
        self.netcon_ref(netcon)?;
        self.gid_source.insert(gid, netcon);
        Ok(())
    }

    fn gid_connect(&mut self, source: Gid, target: SynapseHandle) -> EngineResult<NetConHandle> {
        if target.0 as usize >= self.synapse_owner.len() {
            return Err(EngineError::UnknownSynapse(target));
        }
        Ok(self.push_netcon(LocalNetCon {
            source_gid: Some(source),
            target: Some(target),
            weight: 0.0,
            delay: 1.0,
        }))
    }
}

impl CellApi for LocalEngine {
    fn create_cell(&mut self, celltype: &CellTypeDescriptor) -> EngineResult<CellHandle> {
        Ok(self.push_cell(
            &celltype.synapse_types,
            !celltype.capabilities.spike_source,
        ))
    }

    fn synapse(&self, cell: CellHandle, synapse_type: &str) -> Option<SynapseHandle> {
        self.cell_ref(cell)
            .ok()
            .and_then(|c| c.synapses.get(synapse_type).copied())
    }

    fn new_netcon(
        &mut self,
        source: CellHandle,
        target: Option<SynapseHandle>,
    ) -> EngineResult<NetConHandle> {
        self.cell_ref(source)?;
        Ok(self.push_netcon(LocalNetCon {
            source_gid: None,
            target,
            weight: 0.0,
            delay: 1.0,
        }))
    }

    fn weight(&self, netcon: NetConHandle) -> EngineResult<f64> {
        Ok(self.netcon_ref(netcon)?.weight)
    }

    fn set_weight(&mut self, netcon: NetConHandle, weight: f64) -> EngineResult<()> {
        self.netcon_mut(netcon)?.weight = weight;
        Ok(())
    }

    fn delay(&self, netcon: NetConHandle) -> EngineResult<f64> {
        Ok(self.netcon_ref(netcon)?.delay)
    }

    fn set_delay(&mut self, netcon: NetConHandle, delay: f64) -> EngineResult<()> {
        self.netcon_mut(netcon)?.delay = delay;
        Ok(())
    }

    fn has_memb_init(&self, cell: CellHandle) -> bool {
        self.cell_ref(cell).map_or(false, |c| c.has_memb_init)
    }

    fn memb_init(&mut self, cell: CellHandle) -> EngineResult<()> {
        let cell = self.cell_mut(cell)?;
        cell.v = DEFAULT_V_INIT;
        cell.memb_init_count += 1;
        Ok(())
    }

    fn record_spikes(&mut self, cell: CellHandle) -> EngineResult<()> {
        let cell = self.cell_mut(cell)?;
        cell.recording_spikes = true;
        cell.trace_requests += 1;
        Ok(())
    }

    fn record_v(&mut self, cell: CellHandle) -> EngineResult<()> {
        let cell = self.cell_mut(cell)?;
        cell.recording_v = true;
        cell.trace_requests += 1;
        Ok(())
    }

    fn spike_times(&self, cell: CellHandle) -> EngineResult<Vec<f64>> {
        Ok(self.cell_ref(cell)?.spike_times.clone())
    }

    fn v_trace(&self, cell: CellHandle) -> EngineResult<Vec<f64>> {
        Ok(self.cell_ref(cell)?.v_trace.clone())
    }

    fn record_times(&self, cell: CellHandle) -> EngineResult<Vec<f64>> {
        Ok(self.cell_ref(cell)?.record_times.clone())
    }
}

impl Engine for LocalEngine {
    fn t(&self) -> f64 {
        self.t
    }

    fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    fn dt(&self) -> f64 {
        self.dt
    }

    fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    fn tstop(&self) -> f64 {
        self.tstop
    }

    fn set_tstop(&mut self, tstop: f64) {
        self.tstop = tstop;
    }

    fn min_delay(&self) -> f64 {
        self.min_delay
    }

    fn set_min_delay(&mut self, min_delay: f64) {
        self.min_delay = min_delay;
    }

    fn finitialize(&mut self) -> EngineResult<()> {
        self.t = 0.0;
        for cell in &mut self.cells {
            cell.v = 0.0;
            cell.spike_times.clear();
            cell.v_trace.clear();
            cell.record_times.clear();
        }
        self.finitialize_count += 1;
        Ok(())
    }

    fn quit(&mut self) -> EngineResult<()> {
        self.quit = true;
        Ok(())
    }

    fn load_dll(&mut self, path: &Path) -> EngineResult<()> {
        if !path.exists() {
            return Err(EngineError::LoadLibrary {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }
        self.loaded_libraries.push(path.to_path_buf());
        Ok(())
    }

    fn random_draws(
        &mut self,
        seed: u64,
        distribution: Distribution,
        n: usize,
    ) -> EngineResult<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        match distribution {
            Distribution::Uniform { low, high } => {
                if !(low < high) {
                    return Err(EngineError::InvalidDistribution(format!(
                        "uniform({}, {}) needs low < high",
                        low, high
                    )));
                }
                Ok((0..n).map(|_| rng.gen_range(low..high)).collect())
            }
            Distribution::Normal { mean, variance } => {
                if variance < 0.0 {
                    return Err(EngineError::InvalidDistribution(format!(
                        "normal({}, {}) needs a non-negative variance",
                        mean, variance
                    )));
                }
                let sd = variance.sqrt();
                // Box-Muller on (0, 1] uniforms
                Ok((0..n)
                    .map(|_| {
                        let u1: f64 = 1.0 - rng.gen::<f64>();
                        let u2: f64 = rng.gen();
                        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
                        mean + sd * z
                    })
                    .collect())
            }
        }
    }
}
