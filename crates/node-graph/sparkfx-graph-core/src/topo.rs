use crate::error::GraphError;
use crate::graph::Graph;
use crate::types::NodeId;
use hashbrown::HashMap;
use std::collections::VecDeque;

/// Nodes ordered so that every node comes after the nodes feeding its inputs. Ties keep
/// declaration order.
pub fn topo_order(graph: &Graph) -> Result<Vec<NodeId>, GraphError> {
    let mut indeg: HashMap<&str, usize> = HashMap::new();
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();

    for n in &graph.nodes {
        indeg.entry(n.id().as_str()).or_insert(0);
    }
    for n in &graph.nodes {
        for inp in n.ports().iter().filter(|p| p.is_input()) {
            for upstream in &inp.linked_to {
                let Some(from) = graph.node_of_port(*upstream) else {
                    continue;
                };
                adj.entry(from.id().as_str()).or_default().push(n.id().as_str());
                *indeg.entry(n.id().as_str()).or_default() += 1;
            }
        }
    }

    let mut q: VecDeque<&str> = graph
        .nodes
        .iter()
        .map(|n| n.id().as_str())
        .filter(|id| indeg.get(id).copied() == Some(0))
        .collect();

    let mut order = Vec::with_capacity(graph.nodes.len());
    while let Some(u) = q.pop_front() {
        order.push(u.to_string());
        if let Some(vs) = adj.get(u) {
            for v in vs {
                if let Some(d) = indeg.get_mut(v) {
                    *d -= 1;
                    if *d == 0 {
                        q.push_back(*v);
                    }
                }
            }
        }
    }

    if order.len() != indeg.len() {
        return Err(GraphError::Cycle);
    }
    Ok(order)
}
