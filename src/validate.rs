//! Structural checks a circuit has to pass before it can be evaluated.
//!
//! Each check is usable on its own; [`validate`] runs them in order (direction,
//! cycle, continuity, arity) and stops at the first category that fails,
//! handing back every diagnostic of that category.

use std::collections::VecDeque;

use tracing::{debug, error};

use crate::{
    circuit::{Circuit, GateKind, NodeIdx, NodeKind},
    config::ArityBounds,
    error::Diagnostic,
    graph::Graph,
};

/// A circuit that passed every structural check, with the graph and the
/// evaluation order computed along the way.
#[derive(Clone, Debug)]
pub struct Validated {
    pub graph: Graph,
    pub order: Vec<NodeIdx>,
}

pub fn validate(circuit: &Circuit, arity: &ArityBounds) -> Result<Validated, Vec<Diagnostic>> {
    let direction = check_direction(circuit);
    if !direction.is_empty() {
        debug!(violations = direction.len(), "direction check failed");
        return Err(direction);
    }

    let graph = Graph::build(circuit);
    let order = match topological_order(&graph) {
        Some(order) => order,
        None => {
            debug!("cycle check failed");
            return Err(vec![Diagnostic::Cycle]);
        }
    };

    let continuity = check_continuity(&graph, circuit.output());
    if !continuity.is_valid() {
        debug!(
            unreachable = continuity.unreachable.len(),
            "continuity check failed"
        );
        let nodes = continuity
            .unreachable
            .iter()
            .map(|idx| circuit.node(*idx).id.clone())
            .collect();
        return Err(vec![Diagnostic::Disconnected { nodes }]);
    }

    let arity = check_arity(circuit, arity);
    if !arity.is_empty() {
        debug!(violations = arity.len(), "arity check failed");
        return Err(arity);
    }

    debug!(
        nodes = circuit.num_nodes(),
        wires = circuit.links().len(),
        "circuit is structurally valid"
    );
    Ok(Validated { graph, order })
}

/// Every wire has to go strictly left to right. Placement is the only thing
/// that orders nodes, so a wire to the same or a smaller x is rejected.
pub fn check_direction(circuit: &Circuit) -> Vec<Diagnostic> {
    circuit
        .links()
        .iter()
        .filter_map(|link| {
            let source = circuit.node(link.source);
            let target = circuit.node(link.target);
            if source.position.x >= target.position.x {
                Some(Diagnostic::RightToLeft {
                    from: source.id.clone(),
                    to: target.id.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}

pub fn has_cycle(graph: &Graph) -> bool {
    fn visit(graph: &Graph, idx: NodeIdx, visited: &mut [bool], on_stack: &mut [bool]) -> bool {
        visited[idx.index()] = true;
        on_stack[idx.index()] = true;
        for &child in graph.children(idx) {
            if on_stack[child.index()] {
                return true;
            }
            if !visited[child.index()] && visit(graph, child, visited, on_stack) {
                return true;
            }
        }
        on_stack[idx.index()] = false;
        false
    }

    let mut visited = vec![false; graph.num_nodes()];
    let mut on_stack = vec![false; graph.num_nodes()];
    graph
        .node_ids()
        .any(|idx| !visited[idx.index()] && visit(graph, idx, &mut visited, &mut on_stack))
}

/// Kahn's algorithm. `None` when the graph has a cycle.
pub fn topological_order(graph: &Graph) -> Option<Vec<NodeIdx>> {
    if has_cycle(graph) {
        return None;
    }

    let mut in_degree: Vec<usize> = graph
        .node_ids()
        .map(|idx| graph.parents(idx).len())
        .collect();
    let mut queue: VecDeque<NodeIdx> = graph
        .node_ids()
        .filter(|idx| in_degree[idx.index()] == 0)
        .collect();
    let mut order = Vec::with_capacity(graph.num_nodes());

    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        for &child in graph.children(idx) {
            in_degree[child.index()] -= 1;
            if in_degree[child.index()] == 0 {
                queue.push_back(child);
            }
        }
    }

    if order.len() != graph.num_nodes() {
        // Acyclic graphs always drain completely.
        error!(
            ordered = order.len(),
            nodes = graph.num_nodes(),
            "topological order is incomplete on an acyclic graph"
        );
        debug_assert_eq!(order.len(), graph.num_nodes());
        return None;
    }
    Some(order)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Continuity {
    /// Nodes with at least one wire that have no path to the output.
    pub unreachable: Vec<NodeIdx>,
}

impl Continuity {
    pub fn is_valid(&self) -> bool {
        self.unreachable.is_empty()
    }
}

/// Walks the reverse graph breadth-first from `output`. Nodes without any
/// wire are ignored: they are simply not part of the circuit yet.
pub fn check_continuity(graph: &Graph, output: NodeIdx) -> Continuity {
    let mut reachable = vec![false; graph.num_nodes()];
    let mut queue = VecDeque::from([output]);
    reachable[output.index()] = true;

    while let Some(idx) = queue.pop_front() {
        for &parent in graph.parents(idx) {
            if !reachable[parent.index()] {
                reachable[parent.index()] = true;
                queue.push_back(parent);
            }
        }
    }

    let unreachable = graph
        .node_ids()
        .filter(|idx| graph.is_connected(*idx) && !reachable[idx.index()])
        .collect();
    Continuity { unreachable }
}

/// Fan-in limits, counted straight from the wire list.
pub fn check_arity(circuit: &Circuit, bounds: &ArityBounds) -> Vec<Diagnostic> {
    let mut in_degree = vec![0usize; circuit.num_nodes()];
    for link in circuit.links() {
        in_degree[link.target] += 1;
    }

    circuit
        .nodes()
        .filter_map(|(idx, node)| {
            let found = in_degree[idx];
            match node.kind {
                NodeKind::Gate(GateKind::Not) if found != bounds.not => Some(Diagnostic::NotArity {
                    gate: node.label().to_string(),
                    expected: bounds.not,
                    found,
                }),
                NodeKind::Gate(GateKind::Not) => None,
                NodeKind::Gate(kind)
                    if found < bounds.min_fan_in || found > bounds.max_fan_in =>
                {
                    Some(Diagnostic::GateArity {
                        gate: node.label().to_string(),
                        kind,
                        min: bounds.min_fan_in,
                        max: bounds.max_fan_in,
                        found,
                    })
                }
                NodeKind::Output if idx == circuit.output() && found != 1 => {
                    Some(Diagnostic::OutputArity {
                        output: node.label().to_string(),
                        found,
                    })
                }
                NodeKind::Gate(_) | NodeKind::Input | NodeKind::Output => None,
            }
        })
        .collect()
}
