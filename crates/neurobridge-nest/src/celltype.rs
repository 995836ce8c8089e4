// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Generated cell-type records and the metadata derived for them.

use std::collections::{BTreeMap, BTreeSet};

use neurobridge_core::{
    CellTypeCapabilities, CellTypeDescriptor, SynapseType, RECORDABLE_REGIME, RECORDABLE_SPIKES,
};
use serde::{Deserialize, Serialize};

use crate::component::{ComponentClass, PortMode, ReducedComponent, SynapseComponent};
use crate::error::ConfigurationError;

/// Cell type produced by the builder.
///
/// Immutable once returned; the reduced component is frozen inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCellType {
    pub name: String,
    /// Class name of the native model inside the installed module
    pub nest_model: String,
    pub capabilities: CellTypeCapabilities,
    pub default_parameters: BTreeMap<String, f64>,
    pub default_initial_values: BTreeMap<String, f64>,
    /// Synapse namespaces, in attachment order
    pub synapse_types: Vec<String>,
    /// True when the namespaces are exactly `["excitatory", "inhibitory"]`
    pub standard_receptor_type: bool,
    pub recordable: Vec<String>,
    /// Synapse namespace -> flattened weight variable
    pub weight_variables: BTreeMap<String, String>,
    /// Flattened receive-port names (`<namespace>_<port>`)
    pub synapse_ports: Vec<String>,
    pub initial_regime: String,
    pub combined_model: ReducedComponent,
}

impl GeneratedCellType {
    /// Framework-facing view of this type
    pub fn descriptor(&self) -> CellTypeDescriptor {
        CellTypeDescriptor {
            name: self.name.clone(),
            capabilities: self.capabilities,
            default_parameters: self.default_parameters.clone(),
            default_initial_values: self.default_initial_values.clone(),
            synapse_types: self.synapse_types.clone(),
            recordable: self.recordable.clone(),
        }
    }

    pub fn weight_variable(&self, synapse_type: &str) -> Option<&str> {
        self.weight_variables.get(synapse_type).map(String::as_str)
    }

    pub fn is_recordable(&self, variable: &str) -> bool {
        self.recordable.iter().any(|r| r == variable)
    }
}

/// Per-build choices that are not part of the model itself
#[derive(Debug, Clone, PartialEq)]
pub struct CellTypeOptions {
    pub capabilities: CellTypeCapabilities,
    /// Defaults to the lexicographically first regime
    pub initial_regime: Option<String>,
}

impl Default for CellTypeOptions {
    fn default() -> Self {
        Self {
            capabilities: CellTypeCapabilities::conductance_based(),
            initial_regime: None,
        }
    }
}

/// Resolve the single receive event port of each synapse's subnode.
///
/// Returns the flattened port names in synapse order.
pub fn resolve_synapse_ports(
    model: &ComponentClass,
    synapses: &[SynapseComponent],
) -> Result<Vec<String>, ConfigurationError> {
    let mut seen = BTreeSet::new();
    let mut ports = Vec::with_capacity(synapses.len());

    for synapse in synapses {
        if !seen.insert(synapse.namespace.as_str()) {
            return Err(ConfigurationError::DuplicateSynapseNamespace(
                synapse.namespace.clone(),
            ));
        }

        let subnode = model
            .subnode(&synapse.namespace)
            .ok_or_else(|| ConfigurationError::UnknownSynapseNamespace(synapse.namespace.clone()))?;

        let receive: Vec<_> = subnode.filter_event_ports(PortMode::Recv).collect();
        if receive.len() != 1 {
            return Err(ConfigurationError::AmbiguousReceivePort {
                namespace: synapse.namespace.clone(),
                found: receive.len(),
            });
        }

        ports.push(format!("{}_{}", synapse.namespace, receive[0].name));
    }

    Ok(ports)
}

/// Analog port names followed by the built-in `spikes` and `regime`.
pub fn recordable_names(component: &ReducedComponent) -> Vec<String> {
    component
        .analog_ports
        .iter()
        .map(|p| p.name.clone())
        .chain([RECORDABLE_SPIKES.to_string(), RECORDABLE_REGIME.to_string()])
        .collect()
}

pub fn weight_variables(synapses: &[SynapseComponent]) -> BTreeMap<String, String> {
    synapses
        .iter()
        .map(|s| (s.namespace.clone(), s.weight_variable()))
        .collect()
}

pub fn is_standard_receptor_type(synapse_types: &[String]) -> bool {
    synapse_types.len() == 2
        && synapse_types[0] == SynapseType::Excitatory.as_str()
        && synapse_types[1] == SynapseType::Inhibitory.as_str()
}

/// Pick the requested regime, or the lexicographically smallest one.
pub fn select_initial_regime(
    component: &ReducedComponent,
    requested: Option<&str>,
) -> Result<String, ConfigurationError> {
    match requested {
        Some(regime) if component.regime_map.contains_key(regime) => Ok(regime.to_string()),
        Some(regime) => Err(ConfigurationError::UnknownRegime {
            component: component.name.clone(),
            regime: regime.to_string(),
        }),
        None => component
            .regime_map
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| ConfigurationError::NoRegimes(component.name.clone())),
    }
}
