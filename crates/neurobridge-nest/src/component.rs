// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! 9ML abstraction-layer descriptions as seen by the builder.
//!
//! Only the structure the builder inspects is modelled here (names, ports,
//! regimes, namespaced subcomponents). Equations and their reduction belong
//! to the external reducer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMode {
    Send,
    Recv,
    Reduce,
}

/// Continuous signal port (recordable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogPort {
    pub name: String,
    pub mode: PortMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
}

impl AnalogPort {
    pub fn new(name: impl Into<String>, mode: PortMode) -> Self {
        Self {
            name: name.into(),
            mode,
            dimension: None,
        }
    }
}

/// Discrete event port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPort {
    pub name: String,
    pub mode: PortMode,
}

impl EventPort {
    pub fn new(name: impl Into<String>, mode: PortMode) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }
}

/// Named dynamical regime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regime {
    pub name: String,
    /// Names of regimes reachable by a transition
    #[serde(default)]
    pub transitions: Vec<String>,
}

impl Regime {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transitions: Vec::new(),
        }
    }
}

/// A (possibly composite) 9ML component class
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentClass {
    pub name: String,
    pub parameters: Vec<String>,
    pub state_variables: Vec<String>,
    pub analog_ports: Vec<AnalogPort>,
    pub event_ports: Vec<EventPort>,
    pub regimes: Vec<Regime>,
    /// Namespaced subcomponents
    pub subnodes: BTreeMap<String, ComponentClass>,
}

impl ComponentClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn subnode(&self, namespace: &str) -> Option<&ComponentClass> {
        self.subnodes.get(namespace)
    }

    pub fn filter_event_ports(&self, mode: PortMode) -> impl Iterator<Item = &EventPort> {
        self.event_ports.iter().filter(move |p| p.mode == mode)
    }

    pub fn with_subnode(mut self, namespace: impl Into<String>, component: ComponentClass) -> Self {
        self.subnodes.insert(namespace.into(), component);
        self
    }
}

/// Single flattened component produced by the reducer.
///
/// Names are already namespace-qualified; expressions reference only base
/// parameters and state variables once back-substitution has run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducedComponent {
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub parameters: Vec<String>,
    pub state_variables: Vec<String>,
    pub analog_ports: Vec<AnalogPort>,
    pub event_ports: Vec<EventPort>,
    /// Ordered by regime name so "first regime" is well defined
    pub regime_map: BTreeMap<String, Regime>,
}

impl ReducedComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Synapse attached to a neuron model under a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynapseComponent {
    pub namespace: String,
    /// Name of the weight-bearing connector inside the namespace
    pub weight_connector: String,
}

impl SynapseComponent {
    pub fn new(namespace: impl Into<String>, weight_connector: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            weight_connector: weight_connector.into(),
        }
    }

    /// Flattened name of the weight variable (`<namespace>_<connector>`)
    pub fn weight_variable(&self) -> String {
        format!("{}_{}", self.namespace, self.weight_connector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_event_ports_by_mode() {
        let mut syn = ComponentClass::new("CondSyn");
        syn.event_ports.push(EventPort::new("spikeinput", PortMode::Recv));
        syn.event_ports.push(EventPort::new("relay", PortMode::Send));

        let recv: Vec<_> = syn.filter_event_ports(PortMode::Recv).collect();
        assert_eq!(recv.len(), 1);
        assert_eq!(recv[0].name, "spikeinput");
    }

    #[test]
    fn test_weight_variable_is_namespaced() {
        let syn = SynapseComponent::new("excitatory", "q");
        assert_eq!(syn.weight_variable(), "excitatory_q");
    }

    #[test]
    fn test_component_json_defaults() {
        let json = r#"{"name": "iaf", "regimes": [{"name": "subthreshold"}]}"#;
        let component: ComponentClass = serde_json::from_str(json).unwrap();
        assert_eq!(component.name, "iaf");
        assert!(component.subnodes.is_empty());
        assert!(component.regimes[0].transitions.is_empty());
    }
}
