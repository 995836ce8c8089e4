// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cell-type construction against in-memory collaborators

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use neurobridge_nest::*;

#[derive(Default)]
struct Calls {
    generated: Vec<String>,
    compiled: usize,
    installed: Vec<String>,
    manifest_regime: Option<String>,
    manifest_ports: Vec<String>,
}

/// Returns a canned reduced component
struct StubReducer {
    reduced: ReducedComponent,
    fail: bool,
}

impl ModelReducer for StubReducer {
    fn reduce_to_single_component(
        &self,
        _model: &ComponentClass,
        component_name: &str,
    ) -> std::result::Result<ReducedComponent, ReductionError> {
        if self.fail {
            return Err("alias cycle detected".into());
        }
        let mut reduced = self.reduced.clone();
        reduced.name = component_name.to_string();
        Ok(reduced)
    }

    fn backsub_all(
        &self,
        component: &mut ReducedComponent,
    ) -> std::result::Result<(), ReductionError> {
        component.long_description = "substituted".to_string();
        Ok(())
    }
}

struct StubToolchain(Rc<RefCell<Calls>>);

impl ExtensionToolchain for StubToolchain {
    fn generate(&mut self, request: &ExtensionRequest<'_>) -> Result<GeneratedSources> {
        let mut calls = self.0.borrow_mut();
        calls.generated.push(request.nest_classname.to_string());
        calls.manifest_regime = Some(request.initial_regime.to_string());
        calls.manifest_ports = request.synapse_ports.to_vec();
        Ok(GeneratedSources {
            working_dir: PathBuf::from("/nonexistent"),
            manifest: PathBuf::from("/nonexistent/model.json"),
        })
    }

    fn compile(&mut self, _sources: &GeneratedSources) -> Result<()> {
        self.0.borrow_mut().compiled += 1;
        Ok(())
    }
}

struct StubInstaller {
    calls: Rc<RefCell<Calls>>,
    fail: bool,
}

impl ModuleInstaller for StubInstaller {
    fn install(&mut self, module_name: &str) -> Result<()> {
        if self.fail {
            return Err(BuildError::Install {
                module: module_name.to_string(),
                reason: "module already loaded".to_string(),
            });
        }
        self.calls.borrow_mut().installed.push(module_name.to_string());
        Ok(())
    }
}

fn reduced_iaf() -> ReducedComponent {
    let mut reduced = ReducedComponent::new("iaf_2coba");
    reduced.parameters = vec![
        "iaf_cm".to_string(),
        "iaf_gl".to_string(),
        "excitatory_tau".to_string(),
    ];
    reduced.state_variables = vec!["iaf_V".to_string(), "excitatory_g".to_string()];
    reduced.analog_ports = vec![
        AnalogPort::new("iaf_V", PortMode::Send),
        AnalogPort::new("excitatory_g", PortMode::Send),
    ];
    for regime in ["subthresholdregime", "refractoryregime"] {
        reduced
            .regime_map
            .insert(regime.to_string(), Regime::new(regime));
    }
    reduced
}

fn synapse_node(recv_ports: &[&str]) -> ComponentClass {
    let mut node = ComponentClass::new("CoBaSyn");
    for port in recv_ports {
        node.event_ports.push(EventPort::new(*port, PortMode::Recv));
    }
    node
}

fn composite_model() -> ComponentClass {
    ComponentClass::new("iaf_2coba")
        .with_subnode("iaf", ComponentClass::new("iaf"))
        .with_subnode("excitatory", synapse_node(&["spikeinput"]))
        .with_subnode("inhibitory", synapse_node(&["spikeinput"]))
}

fn standard_synapses() -> Vec<SynapseComponent> {
    vec![
        SynapseComponent::new("excitatory", "q"),
        SynapseComponent::new("inhibitory", "q"),
    ]
}

fn context(fail_reduce: bool, fail_install: bool) -> (BuildContext, Rc<RefCell<Calls>>) {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let ctx = BuildContext::new(
        Box::new(StubReducer {
            reduced: reduced_iaf(),
            fail: fail_reduce,
        }),
        Box::new(StubToolchain(calls.clone())),
        Box::new(StubInstaller {
            calls: calls.clone(),
            fail: fail_install,
        }),
        "mymodule",
    );
    (ctx, calls)
}

#[test]
fn test_builds_standard_two_synapse_celltype() {
    let (mut ctx, calls) = context(false, false);

    let celltype = ctx
        .nineml_celltype_from_model("iaf_2coba", &composite_model(), &standard_synapses())
        .unwrap();

    assert_eq!(celltype.nest_model, "iaf_2coba");
    assert!(celltype.standard_receptor_type);
    assert_eq!(celltype.synapse_types, vec!["excitatory", "inhibitory"]);
    assert_eq!(celltype.weight_variable("excitatory"), Some("excitatory_q"));
    assert_eq!(celltype.weight_variable("inhibitory"), Some("inhibitory_q"));
    assert_eq!(
        celltype.recordable,
        vec!["iaf_V", "excitatory_g", "spikes", "regime"]
    );
    assert_eq!(
        celltype.synapse_ports,
        vec!["excitatory_spikeinput", "inhibitory_spikeinput"]
    );

    assert_eq!(celltype.default_parameters.len(), 3);
    assert!(celltype.default_parameters.values().all(|v| *v == 1.0));
    assert_eq!(
        celltype.default_initial_values,
        BTreeMap::from([
            ("excitatory_g".to_string(), 0.0),
            ("iaf_V".to_string(), 0.0)
        ])
    );

    assert_eq!(celltype.combined_model.short_description, GENERATED_DESCRIPTION);
    assert_eq!(celltype.combined_model.long_description, GENERATED_DESCRIPTION);

    let calls = calls.borrow();
    assert_eq!(calls.generated, vec!["iaf_2coba"]);
    assert_eq!(calls.compiled, 1);
    assert_eq!(calls.installed, vec!["mymodule"]);
    assert_eq!(calls.manifest_regime.as_deref(), Some("refractoryregime"));
    assert_eq!(calls.manifest_ports.len(), 2);
}

#[test]
fn test_initial_regime_is_lexicographically_first() {
    let (mut ctx, _calls) = context(false, false);
    let celltype = ctx
        .nineml_celltype_from_model("iaf_2coba", &composite_model(), &standard_synapses())
        .unwrap();
    assert_eq!(celltype.initial_regime, "refractoryregime");
}

#[test]
fn test_requested_initial_regime() {
    let (mut ctx, _calls) = context(false, false);
    let options = CellTypeOptions {
        initial_regime: Some("subthresholdregime".to_string()),
        ..Default::default()
    };
    let celltype = ctx
        .build_celltype("iaf_2coba", &composite_model(), &standard_synapses(), &options)
        .unwrap();
    assert_eq!(celltype.initial_regime, "subthresholdregime");
}

#[test]
fn test_ambiguous_receive_port_fails_before_toolchain() {
    let (mut ctx, calls) = context(false, false);
    let model = ComponentClass::new("iaf_2coba")
        .with_subnode("excitatory", synapse_node(&["spikeinput", "modulation"]))
        .with_subnode("inhibitory", synapse_node(&["spikeinput"]));

    let err = ctx
        .nineml_celltype_from_model("iaf_2coba", &model, &standard_synapses())
        .unwrap_err();

    assert!(err.is_configuration_error());
    assert!(matches!(
        err,
        BuildError::Configuration(ConfigurationError::AmbiguousReceivePort { found: 2, .. })
    ));
    assert!(calls.borrow().generated.is_empty());
    assert!(!ctx.is_built("iaf_2coba"));
}

#[test]
fn test_nonstandard_synapse_set() {
    let (mut ctx, _calls) = context(false, false);
    let model = ComponentClass::new("iaf_nmda").with_subnode("nmda", synapse_node(&["spikeinput"]));
    let celltype = ctx
        .nineml_celltype_from_model("iaf_nmda", &model, &[SynapseComponent::new("nmda", "weight")])
        .unwrap();

    assert!(!celltype.standard_receptor_type);
    assert_eq!(celltype.weight_variable("nmda"), Some("nmda_weight"));
}

#[test]
fn test_reducer_error_propagates_unchanged() {
    let (mut ctx, _calls) = context(true, false);
    let err = ctx
        .nineml_celltype_from_model("iaf_2coba", &composite_model(), &standard_synapses())
        .unwrap_err();

    assert!(matches!(err, BuildError::Reduction(_)));
    assert_eq!(err.to_string(), "alias cycle detected");
}

#[test]
fn test_second_build_of_same_name_is_rejected() {
    let (mut ctx, calls) = context(false, false);
    ctx.nineml_celltype_from_model("iaf_2coba", &composite_model(), &standard_synapses())
        .unwrap();

    let err = ctx
        .nineml_celltype_from_model("iaf_2coba", &composite_model(), &standard_synapses())
        .unwrap_err();

    assert!(matches!(err, BuildError::AlreadyBuilt(ref name) if name == "iaf_2coba"));
    assert_eq!(calls.borrow().compiled, 1);
    assert_eq!(ctx.built_models().collect::<Vec<_>>(), vec!["iaf_2coba"]);
}

#[test]
fn test_install_failure_is_fatal_and_not_recorded() {
    let (mut ctx, _calls) = context(false, true);
    let err = ctx
        .nineml_celltype_from_model("iaf_2coba", &composite_model(), &standard_synapses())
        .unwrap_err();

    assert!(matches!(err, BuildError::Install { .. }));
    assert!(!ctx.is_built("iaf_2coba"));
}

#[test]
fn test_custom_default_resolver() {
    struct Fixed;
    impl DefaultResolver for Fixed {
        fn default_parameters(&self, c: &ReducedComponent) -> BTreeMap<String, f64> {
            c.parameters.iter().map(|p| (p.clone(), 0.25)).collect()
        }
        fn default_initial_values(&self, c: &ReducedComponent) -> BTreeMap<String, f64> {
            c.state_variables.iter().map(|s| (s.clone(), -65.0)).collect()
        }
    }

    let (ctx, _calls) = context(false, false);
    let mut ctx = ctx.with_defaults(Box::new(Fixed));
    let celltype = ctx
        .nineml_celltype_from_model("iaf_2coba", &composite_model(), &standard_synapses())
        .unwrap();

    assert_eq!(celltype.default_parameters.get("iaf_cm"), Some(&0.25));
    assert_eq!(celltype.default_initial_values.get("iaf_V"), Some(&-65.0));
    let descriptor = celltype.descriptor();
    assert!(descriptor.capabilities.conductance_based);
    assert!(descriptor.has_synapse_type("inhibitory"));
}
