// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Recording of spikes and membrane potential.
//!
//! A [`Recorder`] tracks a growing set of local cells. Tracing is switched
//! on in the engine once per cell; data is pulled from the engine on `get`
//! and ordered by ascending gid.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::Array2;
use neurobridge_core::Gid;
use tracing::debug;

use crate::cell::{CellId, Population};
use crate::engine::{CellHandle, Engine};
use crate::error::{Result, SimulatorError};
use crate::output::{format_rows, CompatibleOutput, OutputHeader, StandardHeaderWriter};
use crate::simulator::Simulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordVariable {
    Spikes,
    V,
}

impl RecordVariable {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordVariable::Spikes => "spikes",
            RecordVariable::V => "v",
        }
    }

    /// Column layout of [`Recorder::get`] tables
    pub fn columns(&self) -> &'static str {
        match self {
            RecordVariable::Spikes => "t id",
            RecordVariable::V => "t v id",
        }
    }

    fn ncols(&self) -> usize {
        match self {
            RecordVariable::Spikes => 2,
            RecordVariable::V => 3,
        }
    }
}

impl fmt::Display for RecordVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordVariable {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spikes" => Ok(RecordVariable::Spikes),
            "v" => Ok(RecordVariable::V),
            other => Err(SimulatorError::UnknownVariable(other.to_string())),
        }
    }
}

/// Where [`Recorder::write`] puts data when no file is given
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutput {
    File(PathBuf),
    /// A temporary file, created on first write and reused afterwards
    TempFile,
    /// Data stays in memory; `write` needs an explicit file
    Memory,
}

pub struct Recorder {
    variable: RecordVariable,
    population: Option<Population>,
    output: RecordOutput,
    temp_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    recorded: BTreeMap<Gid, CellHandle>,
    compatible: Box<dyn CompatibleOutput>,
}

impl Recorder {
    /// # Errors
    ///
    /// [`SimulatorError::UnknownVariable`] unless `variable` is `"spikes"` or `"v"`.
    pub fn new(variable: &str, population: Option<Population>, output: RecordOutput) -> Result<Self> {
        Ok(Self {
            variable: variable.parse()?,
            population,
            output,
            temp_path: None,
            output_dir: None,
            recorded: BTreeMap::new(),
            compatible: Box::new(StandardHeaderWriter),
        })
    }

    pub fn with_compatible_output(mut self, writer: Box<dyn CompatibleOutput>) -> Self {
        self.compatible = writer;
        self
    }

    /// Resolve relative output paths against `dir`, created on first write
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn variable(&self) -> RecordVariable {
        self.variable
    }

    pub fn recorded_ids(&self) -> impl Iterator<Item = Gid> + '_ {
        self.recorded.keys().copied()
    }

    pub fn output(&self) -> &RecordOutput {
        &self.output
    }

    /// Add cells to the recorded set and enable tracing for the new ones.
    ///
    /// Cells outside the recorder's population and cells without a local
    /// engine object are skipped. Returns the number of newly recorded cells.
    pub fn record<E: Engine>(&mut self, sim: &mut Simulator<E>, ids: &[CellId]) -> Result<usize> {
        let mut added = 0;
        for id in ids {
            if let Some(population) = &self.population {
                if !population.is_local(id.gid) {
                    continue;
                }
            }
            let Some(handle) = id.cell() else {
                continue;
            };
            if self.recorded.contains_key(&id.gid) {
                continue;
            }

            let engine = sim.engine_mut();
            match self.variable {
                RecordVariable::Spikes => engine.record_spikes(handle)?,
                RecordVariable::V => engine.record_v(handle)?,
            }
            self.recorded.insert(id.gid, handle);
            added += 1;
        }

        debug!(
            "[RECORDER] Recording {} for {} new cells ({} total)",
            self.variable,
            added,
            self.recorded.len()
        );
        Ok(added)
    }

    /// Recorded data as a table: `(t, id)` rows for spikes, `(t, v, id)` for
    /// membrane potential. Spikes later than the current time (plus the
    /// configured tolerance) are left out.
    ///
    /// Rows are grouped per cell in ascending gid order, whatever order the
    /// cells were passed to [`Recorder::record`] in.
    ///
    /// `gather` is accepted for interface compatibility; only local data is
    /// returned.
    pub fn get<E: Engine>(&self, sim: &Simulator<E>, _gather: bool) -> Result<Array2<f64>> {
        let engine = sim.engine();
        let mut flat = Vec::new();

        match self.variable {
            RecordVariable::Spikes => {
                let limit = sim.t() + sim.spike_time_tolerance();
                for (gid, handle) in &self.recorded {
                    for t in engine.spike_times(*handle)? {
                        if t <= limit {
                            flat.extend_from_slice(&[t, gid.as_f64()]);
                        }
                    }
                }
            }
            RecordVariable::V => {
                for (gid, handle) in &self.recorded {
                    let times = engine.record_times(*handle)?;
                    let values = engine.v_trace(*handle)?;
                    push_voltage_rows(&mut flat, *gid, &times, &values)?;
                }
            }
        }

        let ncols = self.variable.ncols();
        Ok(Array2::from_shape_vec((flat.len() / ncols, ncols), flat)?)
    }

    /// Write recorded data and return the path written to.
    ///
    /// The destination is `file` if given, else the recorder's own output.
    pub fn write<E: Engine>(
        &mut self,
        sim: &Simulator<E>,
        file: Option<&Path>,
        gather: bool,
        compatible_output: bool,
    ) -> Result<PathBuf> {
        let data = self.get(sim, gather)?;
        let path = self.destination(file)?;

        std::fs::write(&path, format_rows(&data))?;

        if compatible_output {
            let header = OutputHeader {
                variable: self.variable.to_string(),
                columns: self.variable.columns().to_string(),
                dt: sim.dt(),
                n: data.nrows(),
                first_id: self
                    .population
                    .as_ref()
                    .and_then(Population::first_id)
                    .or_else(|| self.recorded.keys().next().copied()),
                last_id: self
                    .population
                    .as_ref()
                    .and_then(Population::last_id)
                    .or_else(|| self.recorded.keys().next_back().copied()),
                label: self.population.as_ref().map(|p| p.label().to_string()),
            };
            self.compatible.write_compatible_output(&path, &header)?;
        }

        debug!(
            "[RECORDER] Wrote {} rows of {} to {}",
            data.nrows(),
            self.variable,
            path.display()
        );
        Ok(path)
    }

    fn destination(&mut self, file: Option<&Path>) -> Result<PathBuf> {
        if let Some(file) = file {
            return self.resolve(file);
        }
        match &self.output {
            RecordOutput::File(path) => {
                let path = path.clone();
                self.resolve(&path)
            }
            RecordOutput::TempFile => {
                if let Some(path) = &self.temp_path {
                    return Ok(path.clone());
                }
                let (_, path) = tempfile::Builder::new()
                    .prefix("neurobridge_")
                    .suffix(&format!("_{}.dat", self.variable))
                    .tempfile()?
                    .keep()
                    .map_err(|e| SimulatorError::Io(e.error))?;
                self.temp_path = Some(path.clone());
                Ok(path)
            }
            RecordOutput::Memory => Err(SimulatorError::NoOutputDestination),
        }
    }
}

fn push_voltage_rows(flat: &mut Vec<f64>, gid: Gid, times: &[f64], values: &[f64]) -> Result<()> {
    if times.len() != values.len() {
        return Err(SimulatorError::TraceLengthMismatch {
            gid,
            times: times.len(),
            values: values.len(),
        });
    }
    for (t, v) in times.iter().zip(values) {
        flat.extend_from_slice(&[*t, *v, gid.as_f64()]);
    }
    Ok(())
}

impl Recorder {
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) if path.is_relative() => {
                std::fs::create_dir_all(dir)?;
                Ok(dir.join(path))
            }
            _ => Ok(path.to_path_buf()),
        }
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("variable", &self.variable)
            .field("output", &self.output)
            .field("recorded", &self.recorded.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_variable_is_rejected() {
        let err = Recorder::new("gsyn", None, RecordOutput::Memory).unwrap_err();
        assert!(matches!(err, SimulatorError::UnknownVariable(ref v) if v == "gsyn"));
    }

    #[test]
    fn test_memory_output_needs_explicit_file() {
        let mut recorder = Recorder::new("spikes", None, RecordOutput::Memory).unwrap();
        assert!(matches!(
            recorder.destination(None),
            Err(SimulatorError::NoOutputDestination)
        ));
        let explicit = recorder.destination(Some(Path::new("out.dat"))).unwrap();
        assert_eq!(explicit, PathBuf::from("out.dat"));
    }

    #[test]
    fn test_relative_paths_resolve_against_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let mut recorder = Recorder::new(
            "spikes",
            None,
            RecordOutput::File(PathBuf::from("exc.dat")),
        )
        .unwrap()
        .with_output_dir(&out);

        assert_eq!(recorder.destination(None).unwrap(), out.join("exc.dat"));
        assert!(out.is_dir());
        assert_eq!(
            recorder.destination(Some(Path::new("inh.dat"))).unwrap(),
            out.join("inh.dat")
        );

        let absolute = dir.path().join("elsewhere.dat");
        assert_eq!(recorder.destination(Some(&absolute)).unwrap(), absolute);
    }

    #[test]
    fn test_voltage_rows_need_matching_traces() {
        let mut flat = Vec::new();
        push_voltage_rows(&mut flat, Gid(3), &[0.0, 0.1], &[-65.0, -64.5]).unwrap();
        assert_eq!(flat, vec![0.0, -65.0, 3.0, 0.1, -64.5, 3.0]);

        let err = push_voltage_rows(&mut flat, Gid(4), &[0.0, 0.1, 0.2], &[-65.0]).unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::TraceLengthMismatch {
                gid: Gid(4),
                times: 3,
                values: 1
            }
        ));
        assert_eq!(flat.len(), 6);
    }

    #[test]
    fn test_temp_file_is_created_once() {
        let mut recorder = Recorder::new("v", None, RecordOutput::TempFile).unwrap();
        let first = recorder.destination(None).unwrap();
        let second = recorder.destination(None).unwrap();
        assert_eq!(first, second);
        assert!(first.exists());
        std::fs::remove_file(first).unwrap();
    }
}
