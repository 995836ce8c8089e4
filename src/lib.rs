// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurobridge - simulator-backend adapters
//!
//! Connects a neural-simulation abstraction layer to two native engines:
//!
//! - **NEST** (`nest` feature): builds NEST-native cell types from
//!   declarative 9ML neuron models by reducing the model, generating and
//!   compiling an extension module, and installing it into the engine.
//! - **NEURON** (`neuron` feature): coordinates engine state for one
//!   simulation session: gid registration, deferred membrane initialization,
//!   minimum-delay validation across processes, and spike/voltage recording.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! neurobridge = "0.1"  # Default: both backends
//! ```
//!
//! ```rust
//! use std::sync::Arc;
//! use neurobridge::prelude::*;
//!
//! let config = NeurobridgeConfig::default();
//! let mut sim = Simulator::new(LocalEngine::new(), &config.simulation)?;
//!
//! let celltype = Arc::new(CellTypeDescriptor::new(
//!     "IF_curr_alpha",
//!     CellTypeCapabilities::current_based(),
//! ));
//! let exc = sim.create_population("exc", celltype, 10)?;
//! sim.register_population(&exc);
//!
//! let mut spikes = Recorder::new("spikes", Some(exc.clone()), RecordOutput::Memory)?;
//! spikes.record(&mut sim, exc.cells())?;
//!
//! sim.run(100.0)?;
//! let table = spikes.get(&sim, false)?;
//! assert_eq!(table.ncols(), 2);
//! # Ok::<(), SimulatorError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neurobridge-core, neurobridge-config       │
//! │  (Gid, SynapseType, cell-type capabilities, TOML)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: neurobridge-observability              │
//! │  (tracing subscriber, per-crate debug flags)            │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌──────────────────────────┐  ┌───────────────────────────┐
//! │  neurobridge-nest        │  │  neurobridge-neuron       │
//! │  (9ML -> NEST builder)   │  │  (engine-state coordinator│
//! │                          │  │   recorder, wiring)       │
//! └──────────────────────────┘  └───────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use neurobridge_config as config;
pub use neurobridge_core as types;
pub use neurobridge_observability as observability;

// Re-export backends
#[cfg(feature = "nest")]
pub use neurobridge_nest as nest;

#[cfg(feature = "neuron")]
pub use neurobridge_neuron as neuron;

use neurobridge_config::{LogFormat, LoggingConfig};
use neurobridge_observability::{CrateDebugFlags, LoggingOptions};

/// Logging options for the observability layer from the `[logging]` section
pub fn logging_options(config: &LoggingConfig) -> LoggingOptions {
    LoggingOptions {
        level: config.level.clone(),
        format: match config.format {
            LogFormat::Text => neurobridge_observability::LogFormat::Text,
            LogFormat::Json => neurobridge_observability::LogFormat::Json,
        },
        log_dir: config.log_dir.clone(),
        retention_days: config.retention_days,
        retention_runs: config.retention_runs,
    }
}

/// Install console logging configured by `config` and the process's debug
/// flags (`--debug-<crate>`, `NEUROBRIDGE_DEBUG`).
///
/// # Errors
///
/// Fails if the level is not a valid filter or a subscriber is already set.
pub fn init_logging_from_config(config: &LoggingConfig) -> anyhow::Result<()> {
    let flags = neurobridge_observability::parse_debug_flags();
    init_logging_with_flags(config, &flags)
}

pub fn init_logging_with_flags(config: &LoggingConfig, flags: &CrateDebugFlags) -> anyhow::Result<()> {
    neurobridge_observability::init_console_logging(flags, &logging_options(config))?;
    tracing::debug!(
        "[NEUROBRIDGE] Logging initialized (level={}, debug crates={})",
        config.level,
        flags.any_enabled()
    );
    Ok(())
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, NeurobridgeConfig};
    pub use crate::types::{CellTypeCapabilities, CellTypeDescriptor, Gid, SynapseType};

    #[cfg(feature = "nest")]
    pub use crate::nest::{
        BuildContext, BuildError, CellTypeOptions, ComponentClass, ConfigurationError,
        GeneratedCellType, ModuleInstaller, SynapseComponent,
    };

    #[cfg(feature = "neuron")]
    pub use crate::neuron::{
        CellApi, CellId, Connection, ConnectionError, Engine, LocalEngine, ParallelContext,
        Population, RecordOutput, Recorder, Simulator, SimulatorError,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_options_follow_config() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
            log_dir: Some("/tmp/neurobridge-logs".into()),
            retention_days: 3,
            retention_runs: 4,
        };
        let options = logging_options(&config);
        assert_eq!(options.level, "debug");
        assert_eq!(options.format, neurobridge_observability::LogFormat::Json);
        assert_eq!(options.retention_days, 3);
        assert_eq!(options.retention_runs, 4);
    }
}
