use super::*;
use crate::nodes::{MapGetNode, MapInputNode, MapSetNode};

struct Chain {
    graph: Graph,
    speed: PortId,
    rate: PortId,
}

/// in -> set(Module.Speed) -> get(Module.Speed, Module.Rate)
fn chain() -> Chain {
    let mut graph = Graph::new();
    let input = MapInputNode::new("in");
    let map = input.map_port_id().unwrap();
    let mut set = MapSetNode::new("set");
    set.add_value_input("Module.Speed", TypeDef::Float).unwrap();
    let (set_src, set_dst) = (set.source_port().unwrap().id, set.dest_port().unwrap().id);
    let get = MapGetNode::new("get");
    let get_src = get.source_port().unwrap().id;

    graph.add_node(input).unwrap();
    graph.add_node(set).unwrap();
    graph.add_node(get).unwrap();
    graph.connect(map, set_src).unwrap();
    graph.connect(set_dst, get_src).unwrap();
    let speed = graph.add_output_port("get", TypeDef::Float, "Speed").unwrap();
    let rate = graph.add_output_port("get", TypeDef::Float, "Rate").unwrap();
    Chain { graph, speed, rate }
}

#[test]
fn reads_fall_back_only_when_nothing_upstream_wrote() {
    let Chain { graph, speed, rate } = chain();
    let histories = build_histories(&graph, HistoryConfig::default()).unwrap();
    assert_eq!(histories.maps.len(), 1);

    let map = &histories.maps[0];
    assert_eq!(map.origin, "in");
    assert_eq!(map.visits, vec!["set", "get"]);
    assert_eq!(map.writes.len(), 1);
    assert_eq!(map.writes[0].node, "set");
    assert_eq!(map.reads_of("get").count(), 2);

    let (_, speed_read) = histories.read_for_port(speed).unwrap();
    assert!(!speed_read.used_default);
    assert!(speed_read.mandatory);
    let (instance, rate_read) = histories.read_for_port(rate).unwrap();
    assert_eq!(instance, 0);
    assert!(rate_read.used_default);
    assert_eq!(
        rate_read.default_pin,
        graph.get_node("get").unwrap().default_pin_id(rate)
    );
}

#[test]
fn disabled_get_is_routed_around() {
    let Chain { mut graph, .. } = chain();
    if let Some(GraphNode::Get(get)) = graph.nodes.iter_mut().find(|n| n.id() == "get") {
        get.enabled = false;
    }
    let histories = build_histories(&graph, HistoryConfig::default()).unwrap();
    let map = &histories.maps[0];
    assert_eq!(map.routed_around, vec!["get"]);
    assert_eq!(map.reads_of("get").count(), 0);

    let visiting = HistoryConfig {
        ignore_disabled: false,
        ..HistoryConfig::default()
    };
    let histories = build_histories(&graph, visiting).unwrap();
    assert_eq!(histories.maps[0].reads_of("get").count(), 2);
}

#[test]
fn disabled_set_forwards_the_map_without_writes() {
    let Chain {
        mut graph, speed, ..
    } = chain();
    if let Some(GraphNode::Set(set)) = graph.nodes.iter_mut().find(|n| n.id() == "set") {
        set.enabled = false;
    }
    let histories = build_histories(&graph, HistoryConfig::default()).unwrap();
    assert!(histories.maps[0].writes.is_empty());
    assert!(histories.read_for_port(speed).unwrap().1.used_default);
}

#[test]
fn each_input_node_starts_its_own_instance() {
    let Chain { mut graph, .. } = chain();
    let second = MapInputNode::new("in2");
    let map2 = second.map_port_id().unwrap();
    graph.add_node(second).unwrap();
    graph.add_node(MapGetNode::new("get2")).unwrap();
    let src2 = graph.get_node("get2").unwrap().source_port().unwrap().id;
    graph.connect(map2, src2).unwrap();
    let speed2 = graph.add_output_port("get2", TypeDef::Float, "Speed").unwrap();

    let histories = build_histories(&graph, HistoryConfig::default()).unwrap();
    assert_eq!(histories.maps.len(), 2);
    assert_eq!(histories.port_instances.get(&map2), Some(&1));
    let (instance, read) = histories.read_for_port(speed2).unwrap();
    assert_eq!(instance, 1);
    // The write on the first map does not reach the second.
    assert!(read.used_default);
}

#[test]
fn unconnected_get_records_nothing() {
    let mut graph = Graph::new();
    graph.add_node(MapGetNode::new("get")).unwrap();
    graph.add_output_port("get", TypeDef::Float, "Speed").unwrap();
    let histories = build_histories(&graph, HistoryConfig::default()).unwrap();
    assert!(histories.maps.is_empty());
}

/// in -> set(Module.Speed) and in -> get(Module.Speed) on sibling branches.
fn sibling_branches() -> (Graph, PortId) {
    let mut graph = Graph::new();
    let input = MapInputNode::new("in");
    let map = input.map_port_id().unwrap();
    let mut set = MapSetNode::new("set");
    set.add_value_input("Module.Speed", TypeDef::Float).unwrap();
    let set_src = set.source_port().unwrap().id;
    let get = MapGetNode::new("get");
    let get_src = get.source_port().unwrap().id;

    graph.add_node(input).unwrap();
    graph.add_node(set).unwrap();
    graph.add_node(get).unwrap();
    graph.connect(map, set_src).unwrap();
    graph.connect(map, get_src).unwrap();
    let speed = graph.add_output_port("get", TypeDef::Float, "Speed").unwrap();
    (graph, speed)
}

#[test]
fn sibling_branches_do_not_see_each_others_writes() {
    let (graph, speed) = sibling_branches();
    let histories = build_histories(&graph, HistoryConfig::default()).unwrap();
    assert_eq!(histories.maps.len(), 2);
    assert_eq!(histories.maps[0].writes.len(), 1);
    assert_eq!(histories.maps[1].forked_from, Some(0));
    assert_eq!(histories.maps[1].origin, "in");
    assert!(histories.maps[1].writes.is_empty());

    let (instance, read) = histories.read_for_port(speed).unwrap();
    assert_eq!(instance, 1);
    assert!(read.used_default);
}

#[test]
fn forked_branch_keeps_writes_made_before_the_fork_point() {
    let Chain {
        mut graph, speed, ..
    } = chain();
    // A second reader hanging off the set node's output.
    let set_dst = match graph.node("set") {
        Some(GraphNode::Set(set)) => set.dest_port().unwrap().id,
        _ => unreachable!(),
    };
    graph.add_node(MapGetNode::new("side")).unwrap();
    let side_src = graph.get_node("side").unwrap().source_port().unwrap().id;
    graph.connect(set_dst, side_src).unwrap();
    let side_speed = graph.add_output_port("side", TypeDef::Float, "Speed").unwrap();

    let histories = build_histories(&graph, HistoryConfig::default()).unwrap();
    assert!(!histories.read_for_port(speed).unwrap().1.used_default);
    let (instance, read) = histories.read_for_port(side_speed).unwrap();
    assert_eq!(histories.maps[instance].forked_from, Some(0));
    assert!(!read.used_default);
}
