// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cell identifiers and populations

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use neurobridge_core::{CellTypeDescriptor, Gid};

use crate::engine::CellHandle;

/// Global id of a cell, plus its engine object when the cell lives on this
/// process.
#[derive(Debug, Clone, PartialEq)]
pub struct CellId {
    pub gid: Gid,
    cell: Option<CellHandle>,
    celltype: Arc<CellTypeDescriptor>,
}

impl CellId {
    pub fn local(gid: Gid, cell: CellHandle, celltype: Arc<CellTypeDescriptor>) -> Self {
        Self {
            gid,
            cell: Some(cell),
            celltype,
        }
    }

    /// Cell owned by another process
    pub fn remote(gid: Gid, celltype: Arc<CellTypeDescriptor>) -> Self {
        Self {
            gid,
            cell: None,
            celltype,
        }
    }

    pub fn cell(&self) -> Option<CellHandle> {
        self.cell
    }

    pub fn is_local(&self) -> bool {
        self.cell.is_some()
    }

    pub fn celltype(&self) -> &CellTypeDescriptor {
        &self.celltype
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.gid)
    }
}

/// Group of cells of one type
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    label: String,
    celltype: Arc<CellTypeDescriptor>,
    cells: Vec<CellId>,
    local_ids: BTreeSet<Gid>,
}

impl Population {
    pub fn new(
        label: impl Into<String>,
        celltype: Arc<CellTypeDescriptor>,
        cells: Vec<CellId>,
    ) -> Self {
        let local_ids = cells
            .iter()
            .filter(|c| c.is_local())
            .map(|c| c.gid)
            .collect();
        Self {
            label: label.into(),
            celltype,
            cells,
            local_ids,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn celltype(&self) -> &CellTypeDescriptor {
        &self.celltype
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn local_cells(&self) -> impl Iterator<Item = &CellId> {
        self.cells.iter().filter(|c| c.is_local())
    }

    pub fn is_local(&self, gid: Gid) -> bool {
        self.local_ids.contains(&gid)
    }

    pub fn first_id(&self) -> Option<Gid> {
        self.cells.first().map(|c| c.gid)
    }

    pub fn last_id(&self) -> Option<Gid> {
        self.cells.last().map(|c| c.gid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurobridge_core::CellTypeCapabilities;

    #[test]
    fn test_local_ids_exclude_remote_cells() {
        let celltype = Arc::new(CellTypeDescriptor::new(
            "IF_curr_alpha",
            CellTypeCapabilities::current_based(),
        ));
        let cells = vec![
            CellId::local(Gid(0), CellHandle(0), celltype.clone()),
            CellId::remote(Gid(1), celltype.clone()),
            CellId::local(Gid(2), CellHandle(1), celltype.clone()),
        ];
        let population = Population::new("exc", celltype, cells);

        assert_eq!(population.len(), 3);
        assert!(population.is_local(Gid(0)));
        assert!(!population.is_local(Gid(1)));
        assert_eq!(population.local_cells().count(), 2);
        assert_eq!(population.first_id(), Some(Gid(0)));
        assert_eq!(population.last_id(), Some(Gid(2)));
    }
}
