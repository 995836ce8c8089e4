// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Config file -> 9ML cell type -> NEURON session

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use neurobridge::nest::{EventPort, PortMode};
use neurobridge::prelude::*;

const REDUCED_IAF: &str = r#"{
    "name": "iaf_2coba",
    "parameters": ["iaf_cm", "iaf_gl", "excitatory_tau", "inhibitory_tau"],
    "state_variables": ["iaf_V", "iaf_tspike"],
    "analog_ports": [{"name": "iaf_V", "mode": "send"}],
    "event_ports": [{"name": "iaf_spikeoutput", "mode": "send"}],
    "regime_map": {
        "subthresholdregime": {"name": "subthresholdregime", "transitions": ["refractoryregime"]},
        "refractoryregime": {"name": "refractoryregime", "transitions": ["subthresholdregime"]}
    }
}"#;

struct RecordingInstaller(Rc<RefCell<Vec<String>>>);

impl ModuleInstaller for RecordingInstaller {
    fn install(&mut self, module_name: &str) -> neurobridge::nest::Result<()> {
        self.0.borrow_mut().push(module_name.to_string());
        Ok(())
    }
}

fn composite_model() -> ComponentClass {
    let mut synapse = ComponentClass::new("CoBaSyn");
    synapse
        .event_ports
        .push(EventPort::new("spikeinput", PortMode::Recv));
    ComponentClass::new("iaf_2coba")
        .with_subnode("iaf", ComponentClass::new("iaf"))
        .with_subnode("excitatory", synapse.clone())
        .with_subnode("inhibitory", synapse)
}

#[cfg(unix)]
#[test]
fn test_generated_celltype_runs_in_neuron_session() {
    let dir = tempfile::tempdir().unwrap();
    let reduced_path = dir.path().join("reduced.json");
    std::fs::write(&reduced_path, REDUCED_IAF).unwrap();
    let build_dir = dir.path().join("build");
    let results_dir = dir.path().join("results");

    let config_path = dir.path().join("neurobridge.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[simulation]
min_delay = 0.2
timestep = 0.1

[nest]
working_dir = '{build}'
module_name = "e2e_module"
generator_command = ["sh", "-c", 'test -f "$0" && touch iaf_2coba.cpp']
build_commands = [["sh", "-c", "touch e2e_module.so"]]
reducer_command = ["sh", "-c", 'cat > /dev/null; cat "{reduced}"']

[recording]
output_dir = '{results}'
compatible_output = false
"#,
            build = build_dir.display(),
            results = results_dir.display(),
            reduced = reduced_path.display(),
        ),
    )
    .unwrap();

    let cli = HashMap::from([("min_delay".to_string(), "0.2".to_string())]);
    let config = load_config(Some(&config_path), Some(&cli)).unwrap();
    validate_config(&config).unwrap();

    // NEST side: reduce, generate, compile, install
    let installed = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = BuildContext::from_config(
        &config.nest,
        Box::new(RecordingInstaller(installed.clone())),
    );
    let synapses = [
        SynapseComponent::new("excitatory", "q"),
        SynapseComponent::new("inhibitory", "q"),
    ];
    let celltype = ctx
        .nineml_celltype_from_model("iaf_2coba", &composite_model(), &synapses)
        .unwrap();

    assert_eq!(*installed.borrow(), vec!["e2e_module"]);
    assert!(build_dir.join("iaf_2coba.json").exists());
    assert!(build_dir.join("iaf_2coba.cpp").exists());
    assert!(build_dir.join("e2e_module.so").exists());
    assert_eq!(celltype.initial_regime, "refractoryregime");
    assert_eq!(celltype.recordable, vec!["iaf_V", "spikes", "regime"]);
    assert!(celltype.standard_receptor_type);

    // NEURON side: the generated type drives wiring and recording
    let descriptor = Arc::new(celltype.descriptor());
    let mut sim = Simulator::new(LocalEngine::new(), &config.simulation).unwrap();
    let population = sim.create_population("iaf", descriptor, 3).unwrap();
    sim.register_population(&population);

    let cells = population.cells();
    let conn = sim
        .single_connect(cells[0].gid, &cells[1], Some(-0.5), None, None)
        .unwrap();
    assert_eq!(conn.synapse_type, SynapseType::Inhibitory);
    assert_eq!(conn.weight, 0.5);
    assert_eq!(conn.delay, 0.2);

    sim.engine_mut()
        .schedule_spikes(cells[2].cell().unwrap(), &[4.0, 12.0])
        .unwrap();
    let output_dir = config.recording.output_dir.clone().unwrap();
    let mut recorder = Recorder::new("spikes", Some(population.clone()), RecordOutput::Memory)
        .unwrap()
        .with_output_dir(output_dir);
    recorder.record(&mut sim, cells).unwrap();

    assert_eq!(sim.run(10.0).unwrap(), 10.0);
    let out = recorder
        .write(
            &sim,
            Some(std::path::Path::new("spikes.dat")),
            false,
            config.recording.compatible_output,
        )
        .unwrap();
    assert_eq!(out, results_dir.join("spikes.dat"));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "4\t2\n");

    let engine = sim.finalize(false).unwrap();
    assert!(engine.is_done());

    let err = ctx
        .nineml_celltype_from_model("iaf_2coba", &composite_model(), &synapses)
        .unwrap_err();
    assert!(matches!(err, BuildError::AlreadyBuilt(_)));
}

#[test]
fn test_reducer_failure_stops_the_build() {
    let mut config = NeurobridgeConfig::default();
    config.nest.reducer_command = vec!["false".to_string()];
    let installed = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = BuildContext::from_config(
        &config.nest,
        Box::new(RecordingInstaller(installed.clone())),
    );

    let err = ctx
        .nineml_celltype_from_model(
            "iaf_2coba",
            &composite_model(),
            &[SynapseComponent::new("excitatory", "q")],
        )
        .unwrap_err();
    assert!(matches!(err, BuildError::Reduction(_)));
    assert!(installed.borrow().is_empty());
    assert!(!ctx.is_built("iaf_2coba"));
}

#[test]
fn test_console_logging_from_config() {
    let config = NeurobridgeConfig::default();
    let flags = neurobridge::observability::CrateDebugFlags::from_args(vec![
        "--debug-neurobridge-neuron".to_string(),
    ]);
    neurobridge::init_logging_with_flags(&config.logging, &flags).unwrap();

    // a second subscriber cannot be installed
    assert!(neurobridge::init_logging_with_flags(&config.logging, &flags).is_err());
}
