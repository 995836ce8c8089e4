// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Default parameter and initial values for generated cell types

use std::collections::BTreeMap;

use crate::component::ReducedComponent;

/// Supplies default values for a reduced component's parameters and state.
pub trait DefaultResolver {
    fn default_parameters(&self, component: &ReducedComponent) -> BTreeMap<String, f64>;
    fn default_initial_values(&self, component: &ReducedComponent) -> BTreeMap<String, f64>;
}

/// One value for every parameter, another for every state variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformDefaults {
    pub parameter: f64,
    pub initial_value: f64,
}

impl Default for UniformDefaults {
    fn default() -> Self {
        Self {
            parameter: 1.0,
            initial_value: 0.0,
        }
    }
}

impl DefaultResolver for UniformDefaults {
    fn default_parameters(&self, component: &ReducedComponent) -> BTreeMap<String, f64> {
        component
            .parameters
            .iter()
            .map(|p| (p.clone(), self.parameter))
            .collect()
    }

    fn default_initial_values(&self, component: &ReducedComponent) -> BTreeMap<String, f64> {
        component
            .state_variables
            .iter()
            .map(|s| (s.clone(), self.initial_value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_defaults() {
        let mut component = ReducedComponent::new("iaf");
        component.parameters = vec!["cm".to_string(), "tau_refrac".to_string()];
        component.state_variables = vec!["iaf_V".to_string()];

        let defaults = UniformDefaults::default();
        let params = defaults.default_parameters(&component);
        let inits = defaults.default_initial_values(&component);

        assert_eq!(params.len(), 2);
        assert!(params.values().all(|v| *v == 1.0));
        assert_eq!(inits.get("iaf_V"), Some(&0.0));
    }
}
