// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neurobridge.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurobridgeConfig {
    pub simulation: SimulationConfig,
    pub nest: NestConfig,
    pub recording: RecordingConfig,
    pub logging: LoggingConfig,
}

/// Engine-state coordinator settings (times in ms)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Smallest propagation delay the parallel scheduler guarantees correctness for
    pub min_delay: f64,
    /// Integration time step
    pub timestep: f64,
    /// Upper bound handed to the parallel context when computing the usable step
    pub max_step: f64,
    /// Spike times up to `t + spike_time_tolerance` count as recorded
    pub spike_time_tolerance: f64,
    /// Enable spike exchange compression in the parallel context
    pub spike_compression: bool,
    /// Directory containing compiled mechanisms (`hoc/<arch>/.libs/libnrnmech.so`)
    pub mechanisms_dir: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_delay: 0.1,
            timestep: 0.1,
            max_step: 10.0,
            spike_time_tolerance: 1e-9,
            spike_compression: true,
            mechanisms_dir: None,
        }
    }
}

/// 9ML -> NEST extension build settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NestConfig {
    /// Directory generated sources and build files are written to
    pub working_dir: PathBuf,
    /// Name of the extension module installed into the engine
    pub module_name: String,
    /// Code generator invocation; the build manifest path is appended as last argument
    pub generator_command: Vec<String>,
    /// Commands run in `working_dir` after generation, in order
    pub build_commands: Vec<Vec<String>>,
    /// External 9ML reduction tool (reads the model as JSON on stdin)
    pub reducer_command: Vec<String>,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("nest_models"),
            module_name: "mymodule".to_string(),
            generator_command: vec!["nineml-nest-gen".to_string()],
            build_commands: vec![
                vec!["make".to_string()],
                vec!["make".to_string(), "install".to_string()],
            ],
            reducer_command: vec!["nineml-reduce".to_string()],
        }
    }
}

/// Recorder output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory relative output paths are resolved against
    pub output_dir: Option<PathBuf>,
    /// Post-process written files into the standard header format
    pub compatible_output: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            compatible_output: true,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
    /// Base directory for per-run log folders (file logging only)
    pub log_dir: Option<PathBuf>,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            log_dir: None,
            retention_days: 30,
            retention_runs: 10,
        }
    }
}
