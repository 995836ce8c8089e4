// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Loading of compiled NEURON mechanisms (`nrnivmodl` output).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::{Result, SimulatorError};

/// Architectures probed under `<dir>/hoc/`, host first.
///
/// The engine may have been built for a different architecture than the
/// host reports, so common alternatives are tried too.
pub fn candidate_architectures() -> Vec<&'static str> {
    let mut archs = vec![std::env::consts::ARCH];
    for arch in ["i686", "x86_64", "powerpc"] {
        if !archs.contains(&arch) {
            archs.push(arch);
        }
    }
    archs
}

pub fn mechanism_library_path(dir: &Path, arch: &str) -> PathBuf {
    dir.join("hoc").join(arch).join(".libs").join("libnrnmech.so")
}

/// Load the mechanism library found under `dir`, once per directory.
///
/// Returns `false` if `dir` was already loaded.
pub fn load_mechanisms<E: Engine + ?Sized>(
    engine: &mut E,
    dir: &Path,
    loaded: &mut BTreeSet<PathBuf>,
) -> Result<bool> {
    if loaded.contains(dir) {
        debug!("[SIMULATOR] Mechanisms in {} already loaded", dir.display());
        return Ok(false);
    }

    for arch in candidate_architectures() {
        let lib_path = mechanism_library_path(dir, arch);
        if lib_path.exists() {
            engine.load_dll(&lib_path)?;
            loaded.insert(dir.to_path_buf());
            info!("[SIMULATOR] Loaded mechanisms from {}", lib_path.display());
            return Ok(true);
        }
    }

    Err(SimulatorError::MechanismsNotFound(dir.join("hoc")))
}
