// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurobridge-nest
//!
//! Turns declarative 9ML neuron models into NEST-native cell types.
//!
//! A composite model (neuron plus namespaced synapse subcomponents) is reduced
//! to a single flat component, its synapse receive ports are resolved, default
//! values and recordables are derived, and native sources are generated,
//! compiled and installed into the running engine. The result is a
//! [`GeneratedCellType`] the population framework can instantiate.
//!
//! ```rust,no_run
//! use neurobridge_nest::{BuildContext, ComponentClass, ModuleInstaller, SynapseComponent};
//!
//! struct Nest;
//! impl ModuleInstaller for Nest {
//!     fn install(&mut self, _module: &str) -> neurobridge_nest::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let config = neurobridge_config::NestConfig::default();
//! let mut ctx = BuildContext::from_config(&config, Box::new(Nest));
//! let model = ComponentClass::new("iaf_2coba");
//! let synapses = [
//!     SynapseComponent::new("excitatory", "q"),
//!     SynapseComponent::new("inhibitory", "q"),
//! ];
//! let celltype = ctx.nineml_celltype_from_model("iaf_2coba", &model, &synapses)?;
//! println!("recordable: {:?}", celltype.recordable);
//! # Ok::<(), neurobridge_nest::BuildError>(())
//! ```

pub mod builder;
pub mod celltype;
pub mod component;
pub mod defaults;
pub mod error;
pub mod reducer;
pub mod toolchain;

pub use builder::{BuildContext, GENERATED_DESCRIPTION};
pub use celltype::{CellTypeOptions, GeneratedCellType};
pub use component::{
    AnalogPort, ComponentClass, EventPort, PortMode, ReducedComponent, Regime, SynapseComponent,
};
pub use defaults::{DefaultResolver, UniformDefaults};
pub use error::{BuildError, ConfigurationError, ReductionError, Result};
pub use reducer::{CommandReducer, ModelReducer};
pub use toolchain::{
    CommandToolchain, ExtensionRequest, ExtensionToolchain, GeneratedSources, ModuleInstaller,
};
