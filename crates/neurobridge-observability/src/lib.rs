// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurobridge-observability
//!
//! Logging infrastructure shared by the neurobridge crates, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: per-run log folders with rotation and retention cleanup

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known neurobridge crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neurobridge",
    "neurobridge-core",
    "neurobridge-config",
    "neurobridge-nest",
    "neurobridge-neuron",
];

/// Tracing target for a crate name (`neurobridge-nest` -> `neurobridge_nest`).
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
