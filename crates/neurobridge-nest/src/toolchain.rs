// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Code generation, compilation and installation of native extensions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info};

use crate::component::ReducedComponent;
use crate::error::{BuildError, Result};

/// Everything the generator needs to emit the native sources for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionRequest<'a> {
    pub nest_classname: &'a str,
    pub module_name: &'a str,
    pub component: &'a ReducedComponent,
    pub synapse_ports: &'a [String],
    pub initial_regime: &'a str,
    pub default_parameters: &'a BTreeMap<String, f64>,
    pub default_initial_values: &'a BTreeMap<String, f64>,
}

/// Location of the generated sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSources {
    pub working_dir: PathBuf,
    pub manifest: PathBuf,
}

/// Generates and compiles native sources
pub trait ExtensionToolchain {
    fn generate(&mut self, request: &ExtensionRequest<'_>) -> Result<GeneratedSources>;
    fn compile(&mut self, sources: &GeneratedSources) -> Result<()>;
}

/// Loads a compiled module into the running engine
pub trait ModuleInstaller {
    fn install(&mut self, module_name: &str) -> Result<()>;
}

/// Toolchain driven by external commands.
///
/// `generate` writes `<classname>.json` into the working directory and runs
/// the generator with that path appended. `compile` runs each build command
/// in the working directory.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    working_dir: PathBuf,
    generator_command: Vec<String>,
    build_commands: Vec<Vec<String>>,
}

impl CommandToolchain {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        generator_command: Vec<String>,
        build_commands: Vec<Vec<String>>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            generator_command,
            build_commands,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

impl ExtensionToolchain for CommandToolchain {
    fn generate(&mut self, request: &ExtensionRequest<'_>) -> Result<GeneratedSources> {
        std::fs::create_dir_all(&self.working_dir)?;

        let manifest = self
            .working_dir
            .join(format!("{}.json", request.nest_classname));
        std::fs::write(&manifest, serde_json::to_vec_pretty(request)?)?;
        debug!("[TOOLCHAIN] Wrote build manifest {}", manifest.display());

        run_step(
            "code generation",
            &self.generator_command,
            &self.working_dir,
            Some(&manifest),
        )?;

        Ok(GeneratedSources {
            working_dir: self.working_dir.clone(),
            manifest,
        })
    }

    fn compile(&mut self, sources: &GeneratedSources) -> Result<()> {
        for command in &self.build_commands {
            let step = command.join(" ");
            run_step(&step, command, &sources.working_dir, None)?;
        }
        info!(
            "[TOOLCHAIN] Compiled extension in {}",
            sources.working_dir.display()
        );
        Ok(())
    }
}

fn run_step(step: &str, command: &[String], dir: &Path, extra_arg: Option<&Path>) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        return Err(BuildError::Toolchain {
            step: step.to_string(),
            status: "not run".to_string(),
            stderr: "empty command".to_string(),
        });
    };

    debug!("[TOOLCHAIN] Running {} in {}", step, dir.display());

    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(dir);
    if let Some(arg) = extra_arg {
        cmd.arg(arg);
    }

    let output = cmd.output()?;
    if !output.status.success() {
        return Err(BuildError::Toolchain {
            step: step.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn request_for<'a>(
        component: &'a ReducedComponent,
        empty: &'a BTreeMap<String, f64>,
    ) -> ExtensionRequest<'a> {
        ExtensionRequest {
            nest_classname: "iaf_2coba",
            module_name: "mymodule",
            component,
            synapse_ports: &[],
            initial_regime: "subthreshold",
            default_parameters: empty,
            default_initial_values: empty,
        }
    }

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_generate_writes_manifest_and_runs_generator() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("build");
        let mut toolchain = CommandToolchain::new(
            &work,
            sh(r#"test -f "$0" && touch generated.cpp"#),
            vec![sh("touch module.so")],
        );

        let component = ReducedComponent::new("iaf_2coba");
        let empty = BTreeMap::new();
        let sources = toolchain.generate(&request_for(&component, &empty)).unwrap();

        assert_eq!(sources.manifest, work.join("iaf_2coba.json"));
        let manifest: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&sources.manifest).unwrap()).unwrap();
        assert_eq!(manifest["initial_regime"], "subthreshold");
        assert!(work.join("generated.cpp").exists());

        toolchain.compile(&sources).unwrap();
        assert!(work.join("module.so").exists());
    }

    #[test]
    fn test_failing_build_step_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let mut toolchain = CommandToolchain::new(
            dir.path(),
            sh("true"),
            vec![sh("echo 'undefined reference' >&2; exit 3")],
        );

        let component = ReducedComponent::new("iaf_2coba");
        let empty = BTreeMap::new();
        let sources = toolchain.generate(&request_for(&component, &empty)).unwrap();

        match toolchain.compile(&sources) {
            Err(BuildError::Toolchain { stderr, .. }) => {
                assert!(stderr.contains("undefined reference"))
            }
            other => panic!("expected toolchain error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_generator_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut toolchain = CommandToolchain::new(dir.path(), Vec::new(), Vec::new());
        let component = ReducedComponent::new("iaf_2coba");
        let empty = BTreeMap::new();
        assert!(matches!(
            toolchain.generate(&request_for(&component, &empty)),
            Err(BuildError::Toolchain { .. })
        ));
    }
}
