// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurobridge core types
//!
//! Types shared by every simulator backend:
//! - **Identity**: [`Gid`], the global cell identifier used by parallel engines
//! - **Synapses**: [`SynapseType`] and the framework-wide [`DEFAULT_WEIGHT`]
//! - **Cell types**: [`CellTypeCapabilities`] and [`CellTypeDescriptor`], the
//!   record a backend hands to the population/connection framework

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod celltype;
pub mod ids;
pub mod synapse;

pub use celltype::{CellTypeCapabilities, CellTypeDescriptor, RECORDABLE_REGIME, RECORDABLE_SPIKES};
pub use ids::Gid;
pub use synapse::{SynapseType, SynapseTypeParseError, DEFAULT_WEIGHT};
