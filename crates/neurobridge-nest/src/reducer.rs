// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Model reduction seam.
//!
//! Flattening a composite 9ML model into a single component is done by an
//! external library. [`CommandReducer`] drives a reduction tool over a JSON
//! stdin/stdout exchange.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::Serialize;
use tracing::debug;

use crate::component::{ComponentClass, ReducedComponent};
use crate::error::ReductionError;

/// Flattens composite models and back-substitutes aliases.
pub trait ModelReducer {
    /// Reduce `model` to one component named `component_name`, with all
    /// subcomponent names namespace-qualified.
    fn reduce_to_single_component(
        &self,
        model: &ComponentClass,
        component_name: &str,
    ) -> Result<ReducedComponent, ReductionError>;

    /// Apply every backward substitution in place.
    fn backsub_all(&self, component: &mut ReducedComponent) -> Result<(), ReductionError>;
}

#[derive(Serialize)]
struct ReductionRequest<'a> {
    component_name: &'a str,
    model: &'a ComponentClass,
}

/// Runs an external reduction tool.
///
/// The tool receives `{"component_name": ..., "model": {...}}` on stdin and
/// must print the reduced component as JSON on stdout. Its output is already
/// back-substituted.
#[derive(Debug, Clone)]
pub struct CommandReducer {
    command: Vec<String>,
}

impl CommandReducer {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl ModelReducer for CommandReducer {
    fn reduce_to_single_component(
        &self,
        model: &ComponentClass,
        component_name: &str,
    ) -> Result<ReducedComponent, ReductionError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or("reducer command is empty")?;

        let request = serde_json::to_vec(&ReductionRequest {
            component_name,
            model,
        })?;

        debug!(
            "[NEST-BUILD] Reducing '{}' with external tool '{}'",
            component_name, program
        );

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stdin is fed from its own thread while stdout/stderr are drained
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || -> std::io::Result<()> {
                stdin.write_all(&request)?;
                stdin.flush()
            })
        });

        let output = child.wait_with_output()?;
        let written = match writer {
            Some(handle) => handle
                .join()
                .map_err(|_| "reducer stdin writer panicked")?,
            None => Ok(()),
        };
        if !output.status.success() {
            return Err(format!(
                "reducer '{}' exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }

        // a failed tool is reported by exit status, not by the broken pipe
        written?;

        let reduced: ReducedComponent = serde_json::from_slice(&output.stdout)?;
        Ok(reduced)
    }

    fn backsub_all(&self, _component: &mut ReducedComponent) -> Result<(), ReductionError> {
        Ok(())
    }
}
