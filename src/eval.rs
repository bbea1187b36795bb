use tracing::trace;

use crate::{
    circuit::{Circuit, GateKind, NodeIdx, NodeKind},
    error::Diagnostic,
    graph::Graph,
    validate::{topological_order, Validated},
};

pub fn and(inputs: &[bool]) -> bool {
    inputs.iter().all(|input| *input)
}

pub fn or(inputs: &[bool]) -> bool {
    inputs.iter().any(|input| *input)
}

/// N-ary parity: true when an odd number of inputs are set.
pub fn xor(inputs: &[bool]) -> bool {
    inputs.iter().filter(|input| **input).count() % 2 == 1
}

pub fn not(input: bool) -> bool {
    !input
}

pub fn apply(kind: GateKind, inputs: &[bool]) -> bool {
    match kind {
        GateKind::And => and(inputs),
        GateKind::Or => or(inputs),
        GateKind::Xor => xor(inputs),
        GateKind::Not => match inputs {
            [input] => not(*input),
            _ => false,
        },
    }
}

/// Result of one propagation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    values: Vec<bool>,
    pub errors: Vec<Diagnostic>,
}

impl Evaluation {
    pub fn value(&self, idx: NodeIdx) -> bool {
        self.values[idx]
    }

    pub fn values(&self) -> &[bool] {
        &self.values
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Propagates values through a circuit in topological order.
///
/// The order and every node's upstream list are computed once, so the same
/// evaluator can be run for any number of input assignments. It does not
/// re-validate: on a circuit that failed [`crate::validate::validate`] the
/// per-node values are meaningless.
pub struct Evaluator<'c> {
    circuit: &'c Circuit,
    order: Vec<NodeIdx>,
    upstream: Vec<Vec<NodeIdx>>,
}

impl<'c> Evaluator<'c> {
    /// Fails only when the circuit has no topological order.
    pub fn new(circuit: &'c Circuit) -> Result<Self, Diagnostic> {
        let order = topological_order(&Graph::build(circuit)).ok_or(Diagnostic::Cycle)?;
        Ok(Self::with_order(circuit, order))
    }

    pub fn from_validated(circuit: &'c Circuit, validated: &Validated) -> Self {
        Self::with_order(circuit, validated.order.clone())
    }

    fn with_order(circuit: &'c Circuit, order: Vec<NodeIdx>) -> Self {
        // Upstream lists follow wire order.
        let mut upstream = vec![Vec::new(); circuit.num_nodes()];
        for link in circuit.links() {
            upstream[link.target].push(link.source);
        }
        Evaluator {
            circuit,
            order,
            upstream,
        }
    }

    pub fn circuit(&self) -> &'c Circuit {
        self.circuit
    }

    /// Inputs missing from `inputs` read as false. A gate or output with no
    /// upstream node is reported and reads as false; evaluation carries on so
    /// every such node shows up in one pass.
    pub fn evaluate(&self, inputs: &[(NodeIdx, bool)]) -> Evaluation {
        let mut values = vec![false; self.circuit.num_nodes()];
        for &(idx, value) in inputs {
            values[idx] = value;
        }
        let mut errors = Vec::new();
        let mut gathered = Vec::with_capacity(4);

        for &idx in &self.order {
            let node = self.circuit.node(idx);
            let upstream = &self.upstream[idx];
            match node.kind {
                NodeKind::Input => continue,
                NodeKind::Gate(kind) => {
                    if upstream.is_empty() {
                        errors.push(Diagnostic::GateWithoutInputs {
                            gate: node.label().to_string(),
                        });
                        values[idx] = false;
                    } else {
                        gathered.clear();
                        gathered.extend(upstream.iter().map(|parent| values[*parent]));
                        values[idx] = apply(kind, &gathered);
                    }
                }
                NodeKind::Output => match upstream.first() {
                    Some(parent) => values[idx] = values[*parent],
                    None => {
                        if idx == self.circuit.output() {
                            errors.push(Diagnostic::OutputWithoutInput);
                        }
                        values[idx] = false;
                    }
                },
            }
            trace!(node = %node.id, value = values[idx.index()], "evaluated");
        }

        Evaluation { values, errors }
    }
}
