// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deferred membrane-potential initialization.
//!
//! Cells and populations are registered while the network is built; their
//! membranes are initialised right after the engine's `finitialize`, which
//! would otherwise overwrite the values.

use tracing::info;

use crate::cell::{CellId, Population};
use crate::engine::{CellApi, EngineResult};

#[derive(Debug, Default)]
pub struct Initializer {
    cells: Vec<CellId>,
    populations: Vec<Population>,
}

impl Initializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single cell. Cells without a local membrane-initialization
    /// routine are ignored. Returns whether the cell was registered.
    pub fn register_cell<C: CellApi + ?Sized>(&mut self, api: &C, cell: &CellId) -> bool {
        match cell.cell() {
            Some(handle) if api.has_memb_init(handle) => {
                self.cells.push(cell.clone());
                true
            }
            _ => false,
        }
    }

    /// Register a population unless its cells are spike sources.
    pub fn register_population(&mut self, population: &Population) -> bool {
        if population.celltype().capabilities.spike_source {
            return false;
        }
        self.populations.push(population.clone());
        true
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn population_count(&self) -> usize {
        self.populations.len()
    }

    /// Initialise registered cells, then every local cell of each registered
    /// population, in registration order.
    pub fn initialize<C: CellApi + ?Sized>(&self, api: &mut C) -> EngineResult<()> {
        info!(
            "[INITIALIZER] Initializing membrane potential of {} cells and {} populations",
            self.cells.len(),
            self.populations.len()
        );

        for handle in self.cells.iter().filter_map(CellId::cell) {
            api.memb_init(handle)?;
        }
        for population in &self.populations {
            for handle in population.local_cells().filter_map(CellId::cell) {
                api.memb_init(handle)?;
            }
        }
        Ok(())
    }
}
