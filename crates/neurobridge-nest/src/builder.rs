// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cell-type construction from 9ML models.
//!
//! A [`BuildContext`] owns the external collaborators (reducer, toolchain,
//! installer) and remembers which model names have been built, so each model
//! is compiled and installed at most once per context.

use std::collections::BTreeSet;

use neurobridge_config::NestConfig;
use tracing::{debug, info};

use crate::celltype::{
    is_standard_receptor_type, recordable_names, resolve_synapse_ports, select_initial_regime,
    weight_variables, CellTypeOptions, GeneratedCellType,
};
use crate::component::{ComponentClass, SynapseComponent};
use crate::defaults::{DefaultResolver, UniformDefaults};
use crate::error::{BuildError, Result};
use crate::reducer::{CommandReducer, ModelReducer};
use crate::toolchain::{CommandToolchain, ExtensionRequest, ExtensionToolchain, ModuleInstaller};

/// Description given to every generated model
pub const GENERATED_DESCRIPTION: &str = "Auto-generated 9ML neuron model for NEST";

pub struct BuildContext {
    reducer: Box<dyn ModelReducer>,
    toolchain: Box<dyn ExtensionToolchain>,
    installer: Box<dyn ModuleInstaller>,
    defaults: Box<dyn DefaultResolver>,
    module_name: String,
    built: BTreeSet<String>,
}

impl BuildContext {
    pub fn new(
        reducer: Box<dyn ModelReducer>,
        toolchain: Box<dyn ExtensionToolchain>,
        installer: Box<dyn ModuleInstaller>,
        module_name: impl Into<String>,
    ) -> Self {
        Self {
            reducer,
            toolchain,
            installer,
            defaults: Box::new(UniformDefaults::default()),
            module_name: module_name.into(),
            built: BTreeSet::new(),
        }
    }

    /// Command-driven context: external reducer and generator/build commands
    /// from `config`, installing through `installer`.
    pub fn from_config(config: &NestConfig, installer: Box<dyn ModuleInstaller>) -> Self {
        Self::new(
            Box::new(CommandReducer::new(config.reducer_command.clone())),
            Box::new(CommandToolchain::new(
                &config.working_dir,
                config.generator_command.clone(),
                config.build_commands.clone(),
            )),
            installer,
            config.module_name.clone(),
        )
    }

    pub fn with_defaults(mut self, defaults: Box<dyn DefaultResolver>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn is_built(&self, name: &str) -> bool {
        self.built.contains(name)
    }

    pub fn built_models(&self) -> impl Iterator<Item = &str> {
        self.built.iter().map(String::as_str)
    }

    /// Build, compile and install a cell type with default options.
    pub fn nineml_celltype_from_model(
        &mut self,
        name: &str,
        model: &ComponentClass,
        synapse_components: &[SynapseComponent],
    ) -> Result<GeneratedCellType> {
        self.build_celltype(name, model, synapse_components, &CellTypeOptions::default())
    }

    /// Build, compile and install a cell type.
    ///
    /// # Errors
    ///
    /// * [`BuildError::AlreadyBuilt`] if `name` was built by this context
    /// * [`BuildError::Configuration`] for ambiguous synapse ports, unknown
    ///   namespaces or regimes
    /// * [`BuildError::Reduction`] with the reducer's error untouched
    /// * [`BuildError::Toolchain`] / [`BuildError::Install`] from the external steps
    pub fn build_celltype(
        &mut self,
        name: &str,
        model: &ComponentClass,
        synapse_components: &[SynapseComponent],
        options: &CellTypeOptions,
    ) -> Result<GeneratedCellType> {
        if self.built.contains(name) {
            return Err(BuildError::AlreadyBuilt(name.to_string()));
        }

        debug!(
            "[NEST-BUILD] Creating cell type '{}' from model '{}' with {} synapse components",
            name,
            model.name,
            synapse_components.len()
        );

        // Reduce to one flat component
        let mut combined = self
            .reducer
            .reduce_to_single_component(model, name)
            .map_err(BuildError::Reduction)?;
        self.reducer
            .backsub_all(&mut combined)
            .map_err(BuildError::Reduction)?;
        combined.short_description = GENERATED_DESCRIPTION.to_string();
        combined.long_description = GENERATED_DESCRIPTION.to_string();

        let synapse_ports = resolve_synapse_ports(model, synapse_components)?;

        let default_parameters = self.defaults.default_parameters(&combined);
        let default_initial_values = self.defaults.default_initial_values(&combined);
        let synapse_types: Vec<String> = synapse_components
            .iter()
            .map(|s| s.namespace.clone())
            .collect();

        let initial_regime = select_initial_regime(&combined, options.initial_regime.as_deref())?;
        debug!(
            "[NEST-BUILD] '{}': {} parameters, {} state variables, initial regime '{}'",
            name,
            default_parameters.len(),
            default_initial_values.len(),
            initial_regime
        );

        let request = ExtensionRequest {
            nest_classname: name,
            module_name: &self.module_name,
            component: &combined,
            synapse_ports: &synapse_ports,
            initial_regime: &initial_regime,
            default_parameters: &default_parameters,
            default_initial_values: &default_initial_values,
        };
        let sources = self.toolchain.generate(&request)?;
        self.toolchain.compile(&sources)?;
        self.installer.install(&self.module_name)?;

        info!(
            "[NEST-BUILD] Installed cell type '{}' in module '{}'",
            name, self.module_name
        );
        self.built.insert(name.to_string());

        Ok(GeneratedCellType {
            name: name.to_string(),
            nest_model: name.to_string(),
            capabilities: options.capabilities,
            default_parameters,
            default_initial_values,
            standard_receptor_type: is_standard_receptor_type(&synapse_types),
            recordable: recordable_names(&combined),
            weight_variables: weight_variables(synapse_components),
            synapse_types,
            synapse_ports,
            initial_regime,
            combined_model: combined,
        })
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("module_name", &self.module_name)
            .field("built", &self.built)
            .finish_non_exhaustive()
    }
}
