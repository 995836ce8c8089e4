// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cell-type descriptors handed from a backend to the population/connection
//! framework.
//!
//! Behaviour that depends on what kind of cell a type models (conductance vs
//! current synapses, spike sources without membrane state) is keyed on the
//! explicit [`CellTypeCapabilities`] flags, never on the type's name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Built-in recordable: spike times.
pub const RECORDABLE_SPIKES: &str = "spikes";

/// Built-in recordable: active dynamical regime.
pub const RECORDABLE_REGIME: &str = "regime";

/// Capability set of a cell type, fixed when the type is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellTypeCapabilities {
    /// Synapses are conductance based, so connection weights must be non-negative.
    pub conductance_based: bool,
    /// The type only emits spikes and has no membrane state to initialise.
    pub spike_source: bool,
    /// Current can be injected into cells of this type.
    pub injectable: bool,
}

impl CellTypeCapabilities {
    pub fn current_based() -> Self {
        Self {
            conductance_based: false,
            spike_source: false,
            injectable: true,
        }
    }

    pub fn conductance_based() -> Self {
        Self {
            conductance_based: true,
            spike_source: false,
            injectable: true,
        }
    }

    pub fn spike_source() -> Self {
        Self {
            conductance_based: false,
            spike_source: true,
            injectable: false,
        }
    }
}

/// Framework-facing description of a cell type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTypeDescriptor {
    pub name: String,
    pub capabilities: CellTypeCapabilities,
    pub default_parameters: BTreeMap<String, f64>,
    pub default_initial_values: BTreeMap<String, f64>,
    pub synapse_types: Vec<String>,
    pub recordable: Vec<String>,
}

impl CellTypeDescriptor {
    /// Descriptor with no parameters and only the built-in recordables.
    pub fn new(name: impl Into<String>, capabilities: CellTypeCapabilities) -> Self {
        let recordable = if capabilities.spike_source {
            vec![RECORDABLE_SPIKES.to_string()]
        } else {
            vec![RECORDABLE_SPIKES.to_string(), "v".to_string()]
        };
        Self {
            name: name.into(),
            capabilities,
            default_parameters: BTreeMap::new(),
            default_initial_values: BTreeMap::new(),
            synapse_types: if capabilities.spike_source {
                Vec::new()
            } else {
                vec!["excitatory".to_string(), "inhibitory".to_string()]
            },
            recordable,
        }
    }

    pub fn is_recordable(&self, variable: &str) -> bool {
        self.recordable.iter().any(|r| r == variable)
    }

    pub fn has_synapse_type(&self, synapse_type: &str) -> bool {
        self.synapse_types.iter().any(|s| s == synapse_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spike_source_has_no_synapses() {
        let desc = CellTypeDescriptor::new("SpikeSourceArray", CellTypeCapabilities::spike_source());
        assert!(desc.synapse_types.is_empty());
        assert!(desc.is_recordable("spikes"));
        assert!(!desc.is_recordable("v"));
    }

    #[test]
    fn test_conventional_synapse_pair() {
        let desc = CellTypeDescriptor::new("IF_cond_exp", CellTypeCapabilities::conductance_based());
        assert!(desc.has_synapse_type("excitatory"));
        assert!(desc.has_synapse_type("inhibitory"));
        assert!(desc.capabilities.conductance_based);
    }
}
