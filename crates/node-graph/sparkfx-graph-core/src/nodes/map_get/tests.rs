use super::*;
use crate::error::GraphError;
use crate::graph::GraphContext;
use crate::history::ParameterMapHistorySink;
use crate::registry::VariableRegistry;
use crate::schema::{GraphSchema, ParameterCollection};
use crate::translator::{CompiledRef, IrEmitter};
use crate::undo::{NoTransactions, UndoStack};
use sparkfx_api_core::{DefaultMode, QualifiedName, TypeDef, Value, Variable, VariableMetadata};

struct Env {
    registry: VariableRegistry,
    schema: GraphSchema,
}

impl Env {
    fn new() -> Self {
        Env {
            registry: VariableRegistry::new(),
            schema: GraphSchema::new(),
        }
    }

    fn ctx(&mut self) -> GraphContext<'_> {
        GraphContext::new(&mut self.registry, &self.schema)
    }
}

fn name(s: &str) -> QualifiedName {
    QualifiedName::parse(s).unwrap()
}

fn assert_bijection(node: &MapGetNode) {
    let outputs: Vec<PortId> = node.value_outputs().map(|p| p.id).collect();
    assert_eq!(node.output_to_default().len(), outputs.len());
    for output in outputs {
        let default = node
            .default_pin_id(output)
            .unwrap_or_else(|| panic!("output {output} has no default pin"));
        assert!(node.port(default).unwrap().is_input());
        assert_eq!(node.output_for_default(default).unwrap().id, output);
    }
}

#[derive(Default)]
struct RecordingSink {
    ignore_disabled: bool,
    events: Vec<String>,
    reads: Vec<(String, Option<PortId>)>,
}

impl ParameterMapHistorySink for RecordingSink {
    fn ignore_disabled(&self) -> bool {
        self.ignore_disabled
    }

    fn visit_input_port(&mut self, port: &Port, _filter_for_compilation: bool) {
        self.events.push(format!("visit {}", port.name));
    }

    fn trace_parameter_map_output_port(&mut self, _output: PortId) -> Option<usize> {
        Some(0)
    }

    fn begin_node_visitation(&mut self, instance: usize, node: &NodeId) -> usize {
        self.events.push(format!("begin {node} on {instance}"));
        7
    }

    fn end_node_visitation(&mut self, _instance: usize, token: usize) {
        self.events.push(format!("end {token}"));
    }

    fn handle_variable_read(
        &mut self,
        _instance: usize,
        port: &Port,
        mandatory: bool,
        default_pin: Option<&Port>,
        _filter_for_compilation: bool,
    ) -> bool {
        assert!(mandatory);
        self.reads.push((port.name.clone(), default_pin.map(|p| p.id)));
        true
    }

    fn route_parameter_map_around(&mut self, node: &NodeId, instance: Option<usize>) {
        self.events.push(format!("route {node} {instance:?}"));
    }

    fn begin_parameter_map(&mut self, _node: &NodeId) -> usize {
        0
    }

    fn register_parameter_map_output(&mut self, _output: PortId, _instance: usize) {}

    fn handle_variable_write(&mut self, _instance: usize, _port: &Port) {}
}

#[derive(Default)]
struct RecordingEmitter {
    source: Option<CompiledRef>,
    compiled_ports: Vec<PortId>,
    errors: Vec<(String, NodeId, Option<PortId>)>,
    get_inputs: Vec<usize>,
}

impl IrEmitter for RecordingEmitter {
    fn compile_port(&mut self, port: &Port) -> Option<CompiledRef> {
        self.compiled_ports.push(port.id);
        self.source
    }

    fn error(&mut self, message: &str, node: &NodeId, port: Option<PortId>) {
        self.errors.push((message.to_string(), node.clone(), port));
    }

    fn parameter_map_get(
        &mut self,
        _node: &MapGetNode,
        inputs: &[Option<CompiledRef>],
        outputs: &mut [Option<CompiledRef>],
    ) {
        self.get_inputs.push(inputs.len());
        if inputs[0].is_some() {
            for (i, out) in outputs.iter_mut().enumerate() {
                *out = Some(CompiledRef(100 + i));
            }
        }
    }
}

fn node_with(env: &mut Env, names: &[(&str, TypeDef)]) -> (MapGetNode, Vec<PortId>) {
    let mut node = MapGetNode::new("get");
    let ids = names
        .iter()
        .map(|(n, ty)| node.add_output_port(ty.clone(), n, &mut env.ctx()).unwrap())
        .collect();
    (node, ids)
}

fn link_source(node: &mut MapGetNode) {
    node.ports[0].linked_to.push(PortId::new());
}

#[test]
fn new_node_has_source_and_add_pin() {
    let node = MapGetNode::new("get");
    assert_eq!(node.ports().len(), 2);
    let source = node.source_port().unwrap();
    assert_eq!(source.name, SOURCE_PIN_NAME);
    assert!(MapGetNode::is_parameter_map_pin(source));
    assert!(node.add_pin().is_some());
    assert_eq!(node.value_outputs().count(), 0);
    assert!(node.output_to_default().is_empty());
}

#[test]
fn added_output_is_namespaced_disambiguated_and_paired() {
    let mut env = Env::new();
    let (node, ids) = node_with(
        &mut env,
        &[("Foo", TypeDef::Float), ("Foo", TypeDef::Float)],
    );
    assert_eq!(node.port(ids[0]).unwrap().name, "Module.Foo");
    assert_eq!(node.port(ids[1]).unwrap().name, "Module.Foo_1");
    assert_eq!(node.pending_rename(), Some(ids[1]));
    assert!(node.ports().last().unwrap().is_add_pin());

    let default = node.default_pin(ids[1]).unwrap();
    assert_eq!(default.ty, TypeDef::Float);
    assert!(default.flags.not_connectable);
    assert!(default.flags.default_value_read_only);
    assert!(!default.flags.hidden);
    assert_eq!(default.default_value.as_deref(), Some("0.0"));
    assert_eq!(
        default.tooltip.as_deref(),
        Some("Default value for Module.Foo_1 if no other module has set it previously in the stack.")
    );

    assert!(env.registry.contains(&name("Module.Foo")));
    assert!(env.registry.contains(&name("Module.Foo_1")));
    assert_bijection(&node);
}

#[test]
fn invalid_proposed_name_is_rejected_without_mutation() {
    let mut env = Env::new();
    let mut node = MapGetNode::new("get");
    let before = node.clone();
    assert!(matches!(
        node.add_output_port(TypeDef::Float, "Module..Foo", &mut env.ctx()),
        Err(GraphError::InvalidPinName { .. })
    ));
    assert_eq!(node, before);
}

#[test]
fn bijection_survives_add_rename_remove_and_reload() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(
        &mut env,
        &[
            ("Speed", TypeDef::Float),
            ("Offset", TypeDef::Vec3),
            ("Tint", TypeDef::Color),
        ],
    );
    node.rename_output_port(ids[0], "Module.Velocity", &mut env.ctx(), &mut NoTransactions)
        .unwrap();
    assert_bijection(&node);

    node.remove_dynamic_pin(ids[1]).unwrap();
    assert_bijection(&node);

    let json = serde_json::to_string(&node).unwrap();
    let mut loaded: MapGetNode = serde_json::from_str(&json).unwrap();
    let removed = loaded.post_load(&mut env.ctx());
    assert!(removed.is_empty());
    assert_bijection(&loaded);
    assert_eq!(loaded.ports(), node.ports());
}

#[test]
fn post_load_repairs_drift_and_is_idempotent() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(
        &mut env,
        &[("Speed", TypeDef::Float), ("Offset", TypeDef::Vec3)],
    );
    let speed_default = node.default_pin_id(ids[0]).unwrap();

    // Format drift: a stray default-shaped input, a lost mapping entry, wrong flags.
    node.push_input(Port::input("", TypeDef::Float));
    node.output_to_default.remove(&ids[1]);
    node.port_mut(speed_default).unwrap().flags.hidden = true;

    let removed = node.post_load(&mut env.ctx());
    // The stray input and the unpaired old Offset default.
    assert_eq!(removed.len(), 2);
    assert!(!node.port(speed_default).unwrap().flags.hidden);
    assert_bijection(&node);
    assert_eq!(node.input_ports().count(), 3);

    let once = node.clone();
    let removed = node.post_load(&mut env.ctx());
    assert!(removed.is_empty());
    assert_eq!(node, once);
    assert!(!node.is_loading());
}

#[test]
fn post_load_restores_missing_fixed_pins() {
    let mut env = Env::new();
    let mut node: MapGetNode = serde_json::from_str(r#"{"id":"bare"}"#).unwrap();
    assert!(node.enabled);
    node.post_load(&mut env.ctx());
    assert!(node.source_port().unwrap().ty.is_parameter_map());
    assert!(node.add_pin().is_some());
}

#[test]
fn rename_to_different_typed_variable_is_rejected() {
    let mut env = Env::new();
    env.registry
        .add_parameter(Variable::new(name("Module.Count"), TypeDef::Int), false);
    env.registry
        .add_parameter(Variable::new(name("Module.Shared"), TypeDef::Float), false);
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let before = node.clone();

    let err = node
        .rename_output_port(ids[0], "Module.Count", &mut env.ctx(), &mut NoTransactions)
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::NameCollision {
            name: "Module.Count".into(),
            reason: "This variable already exists with a different type. Choose another name."
                .into(),
        }
    );
    assert_eq!(node, before);

    assert!(matches!(
        node.rename_output_port(ids[0], "  ", &mut env.ctx(), &mut NoTransactions),
        Err(GraphError::InvalidPinName { .. })
    ));
    assert_eq!(node, before);

    node.rename_output_port(ids[0], "Module.Shared", &mut env.ctx(), &mut NoTransactions)
        .unwrap();
    assert_eq!(node.port(ids[0]).unwrap().name, "Module.Shared");
    assert!(node.requires_synchronization());
    assert_bijection(&node);
}

#[test]
fn commit_pin_name_opens_a_transaction_only_for_real_changes() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let source = node.source_port().unwrap().id;
    let mut undo: UndoStack<MapGetNode> = UndoStack::new();

    assert!(node.commit_pin_name(ids[0], "Module.Speed", false, &mut env.ctx(), &mut undo));
    assert!(!undo.can_undo());
    assert_eq!(node.pending_rename(), None);

    assert!(!node.commit_pin_name(source, "Module.X", false, &mut env.ctx(), &mut undo));
    assert!(!undo.can_undo());

    assert!(node.commit_pin_name(ids[0], "Module.Rate", true, &mut env.ctx(), &mut undo));
    assert_eq!(undo.undo_label(), Some("Renamed pin"));
    // Events suppressed: nothing registered, no sync request.
    assert!(!env.registry.contains(&name("Module.Rate")));
    assert!(!node.requires_synchronization());

    let restored = undo.undo(&node).unwrap();
    assert_eq!(restored.port(ids[0]).unwrap().name, "Module.Speed");
}

#[test]
fn pin_editability() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let add = node.add_pin().unwrap().id;
    let source = node.source_port().unwrap().id;

    assert!(node.is_pin_name_editable(ids[0]));
    assert!(!node.is_pin_name_editable(add));
    assert!(!node.is_pin_name_editable(source));
    assert!(node.can_modify_pin(ids[0]));
    assert!(!node.can_modify_pin(add));

    assert!(node.is_pin_name_editable_upon_creation(ids[0], &env.schema));
    assert!(node.cancel_pin_name(ids[0]));
    assert!(!node.is_pin_name_editable_upon_creation(ids[0], &env.schema));

    let engine = node
        .add_output_port(TypeDef::Float, "Engine.DeltaTime", &mut env.ctx())
        .unwrap();
    assert_eq!(node.pending_rename(), Some(engine));
    assert!(!node.is_pin_name_editable_upon_creation(engine, &env.schema));
}

#[test]
fn add_pin_cannot_be_renamed() {
    let mut env = Env::new();
    let (mut node, _) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let add = node.add_pin().unwrap().id;
    let mut undo: UndoStack<MapGetNode> = UndoStack::new();

    assert_eq!(
        node.rename_output_port(add, "Module.Ghost", &mut env.ctx(), &mut undo),
        Err(GraphError::NotAnOutput(add))
    );
    assert!(!node.commit_pin_name(add, "Module.Ghost", false, &mut env.ctx(), &mut undo));
    assert_eq!(node.add_pin().unwrap().name, "Add");
    assert!(!env.registry.contains(&name("Module.Ghost")));
    assert!(!undo.can_undo());
}

#[test]
fn orphaned_output_cannot_be_renamed() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    node.orphan_output_port(ids[0]);

    assert_eq!(
        node.rename_output_port(ids[0], "Module.Velocity", &mut env.ctx(), &mut NoTransactions),
        Err(GraphError::NotAnOutput(ids[0]))
    );
    assert!(!node.commit_pin_name(
        ids[0],
        "Module.Velocity",
        false,
        &mut env.ctx(),
        &mut NoTransactions
    ));
    assert_eq!(node.port(ids[0]).unwrap().name, "Module.Speed");
    assert!(!env.registry.contains(&name("Module.Velocity")));

    let missing = PortId::new();
    assert_eq!(
        node.rename_output_port(missing, "Module.Velocity", &mut env.ctx(), &mut NoTransactions),
        Err(GraphError::UnknownPort(missing))
    );
}

#[test]
fn fixed_pins_are_never_removed() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let source = node.source_port().unwrap().id;
    let add = node.add_pin().unwrap().id;
    assert!(node.is_fixed_pin(source));
    assert!(node.is_fixed_pin(add));
    assert!(!node.is_fixed_pin(ids[0]));

    assert!(node.remove_port(source).is_empty());
    assert!(node.remove_port(add).is_empty());
    let source_port = node.source_port().unwrap();
    assert_eq!(source_port.id, source);
    assert!(MapGetNode::is_parameter_map_pin(source_port));
    assert_eq!(node.add_pin().map(|p| p.id), Some(add));
    assert_bijection(&node);
}

#[test]
fn undoing_a_rename_keeps_the_new_registry_entry() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let mut undo: UndoStack<MapGetNode> = UndoStack::new();
    node.rename_output_port(ids[0], "Module.Velocity", &mut env.ctx(), &mut undo)
        .unwrap();

    let restored = undo.undo(&node).unwrap();
    assert_eq!(restored.port(ids[0]).unwrap().name, "Module.Speed");
    assert!(env.registry.contains(&name("Module.Speed")));
    assert!(env.registry.contains(&name("Module.Velocity")));
}

#[test]
fn engine_parameters_get_disabled_default_pins() {
    let mut env = Env::new();
    let (node, ids) = node_with(&mut env, &[("Engine.DeltaTime", TypeDef::Float)]);
    assert_eq!(node.port(ids[0]).unwrap().name, "Engine.DeltaTime");
    let default = node.default_pin(ids[0]).unwrap();
    assert!(default.flags.hidden);
    assert!(default.flags.not_connectable);
    assert!(default.flags.default_value_ignored);
    assert_eq!(
        default.tooltip.as_deref(),
        Some("Default value for Engine.DeltaTime. Disabled for Engine Parameters.")
    );
}

#[test]
fn default_mode_drives_default_pin_flags() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let default = node.default_pin_id(ids[0]).unwrap();
    let speed = name("Module.Speed");

    env.registry.set_default_mode(&speed, DefaultMode::Binding).unwrap();
    node.synchronize_default_pins(&mut env.ctx());
    assert!(node.port(default).unwrap().flags.hidden);

    env.registry.set_default_mode(&speed, DefaultMode::Custom).unwrap();
    let report = node.synchronize_default_pins(&mut env.ctx());
    assert_eq!(report.synchronized, 1);
    let flags = node.port(default).unwrap().flags;
    assert!(!flags.hidden);
    assert!(!flags.not_connectable);
    assert!(!flags.default_value_read_only);

    env.registry.set_default_mode(&speed, DefaultMode::Value).unwrap();
    node.synchronize_default_pins(&mut env.ctx());
    let flags = node.port(default).unwrap().flags;
    assert!(!flags.hidden);
    assert!(flags.not_connectable);
    assert!(flags.default_value_read_only);

    env.registry
        .set_default_mode(&speed, DefaultMode::FailIfPreviouslyNotSet)
        .unwrap();
    node.synchronize_default_pins(&mut env.ctx());
    assert!(node.port(default).unwrap().flags.hidden);
}

#[test]
fn missing_default_pin_is_reported_not_fatal() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(
        &mut env,
        &[("Speed", TypeDef::Float), ("Rate", TypeDef::Float)],
    );
    node.output_to_default.remove(&ids[0]);
    let report = node.synchronize_default_pins(&mut env.ctx());
    assert_eq!(report.synchronized, 1);
    assert_eq!(report.missing_default_pins, vec![ids[0]]);
}

#[test]
fn default_pin_is_seeded_from_registry_value() {
    let mut env = Env::new();
    env.registry.add_parameter(
        Variable::new(name("Module.Scale"), TypeDef::Vec3).with_value(Value::vec3(1.0, 2.0, 3.0)),
        false,
    );
    let (mut node, ids) = node_with(&mut env, &[("Scale", TypeDef::Vec3)]);
    let default = node.default_pin(ids[0]).unwrap();
    assert_eq!(default.default_value.as_deref(), Some("1.0,2.0,3.0"));
    assert_eq!(default.autogenerated_default.as_deref(), Some("0.0,0.0,0.0"));

    assert_eq!(node.create_default_pin(PortId::new(), &mut env.ctx()), None);
}

#[test]
fn unnamespaced_names_get_local_prefix_on_default_creation() {
    let mut env = Env::new();
    let mut node = MapGetNode::new("get");
    let id = node.insert_output(Port::output("Loose", TypeDef::Float));
    let default = node.create_default_pin(id, &mut env.ctx()).unwrap();
    assert_eq!(node.port(id).unwrap().name, "Local.Loose");
    assert_eq!(node.default_pin_id(id), Some(default));
}

#[test]
fn removing_an_output_removes_its_default_pin() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let default = node.default_pin_id(ids[0]).unwrap();

    let removed = node.remove_port(ids[0]);
    let removed: Vec<PortId> = removed.iter().map(|p| p.id).collect();
    assert_eq!(removed, vec![ids[0], default]);
    assert!(node.port(default).is_none());
    assert!(node.output_to_default().is_empty());
    assert_eq!(node.input_ports().count(), 1);
}

#[test]
fn removing_an_unpaired_default_only_drops_the_mapping() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let default = node.default_pin_id(ids[0]).unwrap();
    assert!(node.orphan_output_port(ids[0]));

    let removed = node.remove_port(default);
    assert_eq!(removed.len(), 1);
    assert!(node.port(ids[0]).is_some());
    assert!(node.output_to_default().is_empty());
}

#[test]
fn removing_an_orphaned_output_keeps_its_default() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    let default = node.default_pin_id(ids[0]).unwrap();
    node.orphan_output_port(ids[0]);

    let removed = node.remove_port(ids[0]);
    assert_eq!(removed.len(), 1);
    assert!(node.port(default).is_some());
    assert!(node.output_to_default().is_empty());
}

#[test]
fn orphaned_pairs_can_be_restored_or_purged() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(
        &mut env,
        &[("Speed", TypeDef::Float), ("Rate", TypeDef::Float)],
    );
    let speed_default = node.default_pin_id(ids[0]).unwrap();
    let rate_default = node.default_pin_id(ids[1]).unwrap();

    node.orphan_output_port(ids[0]);
    node.orphan_output_port(ids[1]);
    assert_eq!(node.value_outputs().count(), 0);
    assert!(node.port(speed_default).unwrap().flags.orphaned);
    // Orphans are not synchronized.
    assert_eq!(node.synchronize_default_pins(&mut env.ctx()).synchronized, 0);

    assert!(node.restore_orphaned_pin_pair(ids[0], &mut env.ctx()));
    assert!(!node.port(ids[0]).unwrap().flags.orphaned);
    assert!(!node.port(speed_default).unwrap().flags.orphaned);

    let purged: Vec<PortId> = node.purge_orphaned_pins().iter().map(|p| p.id).collect();
    assert_eq!(purged.len(), 2);
    assert!(purged.contains(&ids[1]) && purged.contains(&rate_default));
    assert_bijection(&node);

    // Re-recording a pair keeps the mapping even if the flags drifted.
    node.add_orphaned_pin_pair(ids[0], speed_default);
    assert_eq!(node.default_pin_id(ids[0]), Some(speed_default));
}

#[test]
fn loading_skips_registration_and_rename_prompt() {
    let mut env = Env::new();
    let mut node = MapGetNode::new("get");
    node.begin_load();
    let id = node
        .add_output_port(TypeDef::Float, "Speed", &mut env.ctx())
        .unwrap();
    node.end_load();
    assert_eq!(node.port(id).unwrap().name, "Module.Speed");
    assert!(node.default_pin_id(id).is_some());
    assert!(!env.registry.contains(&name("Module.Speed")));
    assert_eq!(node.pending_rename(), None);
}

#[test]
fn disconnected_source_records_nothing_and_compiles_nothing() {
    let mut env = Env::new();
    let (node, _) = node_with(
        &mut env,
        &[("Speed", TypeDef::Float), ("Rate", TypeDef::Float)],
    );

    let mut sink = RecordingSink::default();
    node.build_parameter_map_history(&mut sink, true, true);
    assert_eq!(sink.events, vec!["visit Source".to_string()]);
    assert!(sink.reads.is_empty());

    let mut emitter = RecordingEmitter {
        source: Some(CompiledRef(0)),
        ..Default::default()
    };
    let outputs = node.compile(&mut emitter, &env.schema);
    assert_eq!(outputs, vec![None, None]);
    assert!(emitter.errors.is_empty());
    assert!(emitter.get_inputs.is_empty());
    assert!(emitter.compiled_ports.is_empty());
}

#[test]
fn connected_source_reads_every_value_output() {
    let mut env = Env::new();
    let (mut node, ids) = node_with(
        &mut env,
        &[("Speed", TypeDef::Float), ("Rate", TypeDef::Float)],
    );
    link_source(&mut node);

    let mut sink = RecordingSink::default();
    node.build_parameter_map_history(&mut sink, true, true);
    assert_eq!(
        sink.events,
        vec!["visit Source", "begin get on 0", "end 7"]
    );
    assert_eq!(
        sink.reads,
        vec![
            ("Module.Speed".to_string(), node.default_pin_id(ids[0])),
            ("Module.Rate".to_string(), node.default_pin_id(ids[1])),
        ]
    );

    let mut shallow = RecordingSink::default();
    node.build_parameter_map_history(&mut shallow, false, true);
    assert_eq!(shallow.events, vec!["begin get on 0", "end 7"]);
    assert!(shallow.reads.iter().all(|(_, default)| default.is_none()));

    let mut emitter = RecordingEmitter {
        source: Some(CompiledRef(0)),
        ..Default::default()
    };
    let outputs = node.compile(&mut emitter, &env.schema);
    assert_eq!(outputs, vec![Some(CompiledRef(100)), Some(CompiledRef(101))]);
    // Source compiled once, default pins passed as placeholders.
    assert_eq!(emitter.compiled_ports, vec![node.source_port().unwrap().id]);
    assert_eq!(emitter.get_inputs, vec![3]);
}

#[test]
fn disabled_node_is_routed_around() {
    let mut env = Env::new();
    let (mut node, _) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    link_source(&mut node);
    node.enabled = false;

    let mut sink = RecordingSink {
        ignore_disabled: true,
        ..Default::default()
    };
    node.build_parameter_map_history(&mut sink, true, true);
    assert_eq!(sink.events, vec!["visit Source", "route get Some(0)"]);
    assert!(sink.reads.is_empty());

    let mut visiting = RecordingSink::default();
    node.build_parameter_map_history(&mut visiting, false, true);
    assert_eq!(visiting.reads.len(), 1);
}

#[test]
fn source_compile_failure_is_reported_once() {
    let mut env = Env::new();
    let (mut node, _) = node_with(
        &mut env,
        &[("Speed", TypeDef::Float), ("Rate", TypeDef::Float)],
    );
    link_source(&mut node);
    let source = node.source_port().unwrap().id;

    let mut emitter = RecordingEmitter::default();
    let outputs = node.compile(&mut emitter, &env.schema);
    assert_eq!(outputs, vec![None, None]);
    assert_eq!(
        emitter.errors,
        vec![(
            "Error compiling input for param map get node.".to_string(),
            "get".to_string(),
            Some(source)
        )]
    );
}

#[test]
fn shared_collection_dependencies_are_deduplicated() {
    let mut env = Env::new();
    let wind = ParameterCollection::new("/Game/FX/Wind", "Wind")
        .with_variable("Strength", TypeDef::Float)
        .with_variable("Direction", TypeDef::Vec3);
    let expected = wind.compile_hash();
    env.schema = GraphSchema::new().with_collection(wind);

    let (node, _) = node_with(
        &mut env,
        &[
            ("NPC.Wind.Strength", TypeDef::Float),
            ("NPC.Wind.Direction", TypeDef::Vec3),
            ("Speed", TypeDef::Float),
        ],
    );
    let mut hashes = Vec::new();
    let mut paths = Vec::new();
    node.gather_external_dependency_data(&env.schema, &mut hashes, &mut paths);
    assert_eq!(hashes, vec![expected]);
    assert_eq!(paths, vec!["/Game/FX/Wind".to_string()]);

    // A second pass over the same lists adds nothing.
    node.gather_external_dependency_data(&env.schema, &mut hashes, &mut paths);
    assert_eq!(hashes.len(), 1);
}

#[test]
fn hover_text_per_pin_kind() {
    let mut env = Env::new();
    let (node, ids) = node_with(&mut env, &[("Speed", TypeDef::Float)]);
    env.registry
        .set_metadata(&name("Module.Speed"), VariableMetadata::described("Units per second."))
        .unwrap();
    let hover = |id| node.pin_hover_text(id, &env.registry, &env.schema);

    assert_eq!(
        hover(node.add_pin().unwrap().id),
        "Request a new variable from the parameter map."
    );
    assert_eq!(
        hover(node.source_port().unwrap().id),
        "The source parameter map where we pull the values from."
    );
    assert!(hover(node.default_pin_id(ids[0]).unwrap())
        .starts_with("Default value for \"Module.Speed\" if no other module"));
    assert_eq!(
        hover(ids[0]),
        "Name: Module.Speed \nType: float\nDescription: Units per second."
    );
    assert_eq!(hover(PortId::new()), "");
}
