// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurobridge-neuron
//!
//! Adapts a NEURON-style engine to the population/connection interface:
//! - **[`Simulator`]**: clock, parallel rank/size, gid registration and the
//!   run/reset/finalize lifecycle
//! - **[`Initializer`]**: deferred membrane initialization after `finitialize`
//! - **[`Recorder`]**: spike and voltage recording with tab-delimited output
//! - **[`Simulator::single_connect`]**: gid-based connection wiring
//!
//! The engine itself sits behind the [`Engine`] trait. [`LocalEngine`] is a
//! single-host in-memory implementation.
//!
//! ```rust
//! use std::sync::Arc;
//! use neurobridge_config::SimulationConfig;
//! use neurobridge_core::{CellTypeCapabilities, CellTypeDescriptor};
//! use neurobridge_neuron::{LocalEngine, Simulator};
//!
//! let mut sim = Simulator::new(LocalEngine::new(), &SimulationConfig::default())?;
//! let celltype = Arc::new(CellTypeDescriptor::new(
//!     "IF_cond_exp",
//!     CellTypeCapabilities::conductance_based(),
//! ));
//! let cells = sim.create_population("exc", celltype, 2)?;
//! sim.register_population(&cells);
//! let conn = sim.single_connect(cells.cells()[0].gid, &cells.cells()[1], Some(0.5), None, None)?;
//! assert_eq!(conn.delay, sim.min_delay());
//! assert_eq!(sim.run(10.0)?, 10.0);
//! # Ok::<(), neurobridge_neuron::SimulatorError>(())
//! ```

pub mod cell;
pub mod connection;
pub mod engine;
pub mod error;
pub mod initializer;
pub mod local;
pub mod mechanisms;
pub mod output;
pub mod random;
pub mod recorder;
pub mod simulator;

pub use cell::{CellId, Population};
pub use connection::Connection;
pub use engine::{
    CellApi, CellHandle, Engine, EngineError, EngineResult, NetConHandle, ParallelContext,
    SynapseHandle,
};
pub use error::{ConnectionError, Result, SimulatorError};
pub use initializer::Initializer;
pub use local::LocalEngine;
pub use mechanisms::load_mechanisms;
pub use output::{CompatibleOutput, OutputHeader, StandardHeaderWriter};
pub use random::{native_rng_pick, Distribution};
pub use recorder::{RecordOutput, RecordVariable, Recorder};
pub use simulator::Simulator;
