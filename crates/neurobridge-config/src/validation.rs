// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are within valid ranges and consistent with
//! each other before a simulator or builder is constructed from them.

use crate::{ConfigError, ConfigResult, NeurobridgeConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation found
pub fn validate_config(config: &NeurobridgeConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_nest(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_simulation(config: &NeurobridgeConfig, errors: &mut Vec<ConfigValidationError>) {
    let sim = &config.simulation;

    if !sim.min_delay.is_finite() || sim.min_delay < 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.min_delay".to_string(),
            reason: format!("must be a non-negative number, got {}", sim.min_delay),
        });
    }
    if !sim.timestep.is_finite() || sim.timestep <= 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.timestep".to_string(),
            reason: format!("must be positive, got {}", sim.timestep),
        });
    }
    if !sim.max_step.is_finite() || sim.max_step < sim.min_delay {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.max_step".to_string(),
            reason: format!(
                "must not be smaller than min_delay ({}), got {}",
                sim.min_delay, sim.max_step
            ),
        });
    }
    if !sim.spike_time_tolerance.is_finite() || sim.spike_time_tolerance < 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.spike_time_tolerance".to_string(),
            reason: format!("must be non-negative, got {}", sim.spike_time_tolerance),
        });
    }
}

fn validate_nest(config: &NeurobridgeConfig, errors: &mut Vec<ConfigValidationError>) {
    let nest = &config.nest;

    if nest.module_name.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "nest.module_name".to_string(),
        });
    }
    if nest.working_dir.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "nest.working_dir".to_string(),
        });
    }
    if nest.generator_command.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "nest.generator_command".to_string(),
        });
    }
    for (index, command) in nest.build_commands.iter().enumerate() {
        if command.is_empty() {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("nest.build_commands[{}]", index),
                reason: "command must not be empty".to_string(),
            });
        }
    }
}

fn validate_logging(config: &NeurobridgeConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("unknown level '{}'", config.logging.level),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_min_delay_rejected() {
        let mut config = NeurobridgeConfig::default();
        config.simulation.min_delay = -0.1;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("simulation.min_delay"));
    }

    #[test]
    fn test_max_step_below_min_delay_rejected() {
        let mut config = NeurobridgeConfig::default();
        config.simulation.min_delay = 5.0;
        config.simulation.max_step = 1.0;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("simulation.max_step"));
    }

    #[test]
    fn test_all_violations_reported() {
        let mut config = NeurobridgeConfig::default();
        config.simulation.timestep = 0.0;
        config.nest.module_name = "  ".to_string();
        config.nest.build_commands.push(Vec::new());
        config.logging.level = "loud".to_string();

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("simulation.timestep"));
        assert!(err.contains("nest.module_name"));
        assert!(err.contains("nest.build_commands[2]"));
        assert!(err.contains("logging.level"));
    }
}
