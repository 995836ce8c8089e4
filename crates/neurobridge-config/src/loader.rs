// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NeurobridgeConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "neurobridge.toml";

/// Find the neurobridge configuration file
///
/// Search order:
/// 1. `NEUROBRIDGE_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurobridge.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEUROBRIDGE_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NEUROBRIDGE_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "configuration file '{}' not found in any of these locations:\n{}\n\nSet NEUROBRIDGE_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurobridgeConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeurobridgeConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROBRIDGE_MIN_DELAY` -> `simulation.min_delay`
/// - `NEUROBRIDGE_TIMESTEP` -> `simulation.timestep`
/// - `NEUROBRIDGE_MECHANISMS_DIR` -> `simulation.mechanisms_dir`
/// - `NEUROBRIDGE_NEST_DIR` -> `nest.working_dir`
/// - `NEUROBRIDGE_NEST_MODULE` -> `nest.module_name`
/// - `NEUROBRIDGE_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut NeurobridgeConfig) {
    if let Ok(value) = env::var("NEUROBRIDGE_MIN_DELAY") {
        if let Ok(min_delay) = value.parse::<f64>() {
            config.simulation.min_delay = min_delay;
        }
    }
    if let Ok(value) = env::var("NEUROBRIDGE_TIMESTEP") {
        if let Ok(timestep) = value.parse::<f64>() {
            config.simulation.timestep = timestep;
        }
    }
    if let Ok(value) = env::var("NEUROBRIDGE_MECHANISMS_DIR") {
        config.simulation.mechanisms_dir = Some(PathBuf::from(value));
    }

    if let Ok(value) = env::var("NEUROBRIDGE_NEST_DIR") {
        config.nest.working_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("NEUROBRIDGE_NEST_MODULE") {
        config.nest.module_name = value;
    }

    if let Ok(value) = env::var("NEUROBRIDGE_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"min_delay": "0.2", "nest_dir": "/tmp/models"}`)
pub fn apply_cli_overrides(config: &mut NeurobridgeConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("min_delay") {
        if let Ok(min_delay) = value.parse::<f64>() {
            config.simulation.min_delay = min_delay;
        }
    }
    if let Some(value) = cli_args.get("timestep") {
        if let Ok(timestep) = value.parse::<f64>() {
            config.simulation.timestep = timestep;
        }
    }
    if let Some(value) = cli_args.get("max_step") {
        if let Ok(max_step) = value.parse::<f64>() {
            config.simulation.max_step = max_step;
        }
    }
    if let Some(value) = cli_args.get("mechanisms_dir") {
        config.simulation.mechanisms_dir = Some(PathBuf::from(value));
    }

    if let Some(value) = cli_args.get("nest_dir") {
        config.nest.working_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("nest_module") {
        config.nest.module_name = value.clone();
    }

    if let Some(value) = cli_args.get("compatible_output") {
        config.recording.compatible_output = value.to_lowercase() == "true" || value == "1";
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
