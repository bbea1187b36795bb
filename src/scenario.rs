//! Scenario descriptors: the inputs, target table and pre-placed nodes a
//! session starts from. Read-only as far as the engine is concerned.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    circuit::{Board, Circuit, GateKind, Node, NodeKind, Position, Wire},
    error::{CircuitError, ScenarioError},
    truth_table::{OutputColumns, TruthTable},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gates: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wires: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_sec: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    /// Every gate is pre-placed; only the wiring is up to the player.
    Csfair,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum LockedRole {
    Input,
    Output,
    Gate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLockedNode {
    #[serde(rename = "type")]
    role: LockedRole,
    id: String,
    label: String,
    position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gate_type: Option<GateKind>,
}

/// A node placed by the scenario. The player can wire it but not remove it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLockedNode", into = "RawLockedNode")]
pub struct LockedNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub position: Position,
}

impl TryFrom<RawLockedNode> for LockedNode {
    type Error = String;

    fn try_from(raw: RawLockedNode) -> Result<Self, Self::Error> {
        let kind = match (raw.role, raw.gate_type) {
            (LockedRole::Input, _) => NodeKind::Input,
            (LockedRole::Output, _) => NodeKind::Output,
            (LockedRole::Gate, Some(kind)) => NodeKind::Gate(kind),
            (LockedRole::Gate, None) => {
                return Err(format!("locked gate {} has no gateType", raw.id))
            }
        };
        Ok(LockedNode {
            id: raw.id,
            kind,
            label: raw.label,
            position: raw.position,
        })
    }
}

impl From<LockedNode> for RawLockedNode {
    fn from(node: LockedNode) -> Self {
        let (role, gate_type) = match node.kind {
            NodeKind::Input => (LockedRole::Input, None),
            NodeKind::Output => (LockedRole::Output, None),
            NodeKind::Gate(kind) => (LockedRole::Gate, Some(kind)),
        };
        RawLockedNode {
            role,
            id: node.id,
            label: node.label,
            position: node.position,
            gate_type,
        }
    }
}

impl LockedNode {
    pub fn to_node(&self) -> Node {
        Node::new(self.id.clone(), self.kind, self.position)
            .with_label(self.label.clone())
            .locked()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionWire {
    pub source: String,
    pub target: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Input labels, most significant first.
    pub inputs: Vec<String>,
    pub target_truth: TruthTable,
    #[serde(default)]
    pub allowed_gates: Vec<GateKind>,
    #[serde(default)]
    pub constraints: Constraints,
    pub locked_nodes: Vec<LockedNode>,
    pub single_output_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub mode: Mode,
    /// Only for a "show solution" overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_wiring: Option<Vec<SolutionWire>>,
    /// When set, only this column of the target table is compared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_label: Option<String>,
}

impl Scenario {
    /// Parses and checks a descriptor.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.check()?;
        Ok(scenario)
    }

    fn invalid(&self, reason: impl Into<String>) -> ScenarioError {
        ScenarioError::Invalid {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }

    /// Internal consistency of the descriptor.
    pub fn check(&self) -> Result<(), ScenarioError> {
        let mut ids = HashSet::new();
        for node in &self.locked_nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(self.invalid(format!("duplicate locked node {}", node.id)));
            }
        }

        match self.locked(&self.single_output_id) {
            Some(node) if node.kind == NodeKind::Output => {}
            Some(_) => {
                return Err(self.invalid(format!(
                    "{} is not an output node",
                    self.single_output_id
                )))
            }
            None => {
                return Err(self.invalid(format!(
                    "output {} is not a locked node",
                    self.single_output_id
                )))
            }
        }

        let input_nodes = self
            .locked_nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Input)
            .count();
        if input_nodes != self.inputs.len() {
            return Err(self.invalid(format!(
                "{} input labels but {} input nodes",
                self.inputs.len(),
                input_nodes
            )));
        }
        for label in &self.inputs {
            if self.input_node(label).is_none() {
                return Err(self.invalid(format!("no input node labelled {label}")));
            }
        }

        let expected_rows = 1usize
            .checked_shl(self.inputs.len() as u32)
            .ok_or_else(|| self.invalid("too many inputs"))?;
        if self.target_truth.len() != expected_rows {
            return Err(self.invalid(format!(
                "target table has {} rows, expected {expected_rows}",
                self.target_truth.len()
            )));
        }

        for wire in self.solution_wiring.iter().flatten() {
            for end in [&wire.source, &wire.target] {
                if !ids.contains(end.as_str()) {
                    return Err(self.invalid(format!("solution wires unknown node {end}")));
                }
            }
        }
        Ok(())
    }

    fn locked(&self, id: &str) -> Option<&LockedNode> {
        self.locked_nodes.iter().find(|node| node.id == id)
    }

    fn input_node(&self, label: &str) -> Option<&LockedNode> {
        self.locked_nodes
            .iter()
            .find(|node| node.kind == NodeKind::Input && node.label == label)
    }

    pub fn locked_nodes(&self) -> Vec<Node> {
        self.locked_nodes.iter().map(LockedNode::to_node).collect()
    }

    /// Ids of the input nodes, in the declared label order.
    pub fn input_ids(&self) -> Vec<String> {
        self.inputs
            .iter()
            .filter_map(|label| self.input_node(label))
            .map(|node| node.id.clone())
            .collect()
    }

    pub fn allows(&self, kind: GateKind) -> bool {
        self.allowed_gates.contains(&kind)
    }

    pub fn output_columns(&self) -> OutputColumns {
        match &self.output_label {
            Some(label) => OutputColumns::Named(label.clone()),
            None => OutputColumns::Heuristic,
        }
    }

    /// Locked nodes wired up with the reference solution, if there is one.
    pub fn solution_board(&self) -> Option<Board> {
        let wiring = self.solution_wiring.as_ref()?;
        Some(Board {
            nodes: self.locked_nodes(),
            wires: wiring
                .iter()
                .map(|wire| Wire::new(wire.source.clone(), wire.target.clone()))
                .collect(),
        })
    }

    pub fn solution_circuit(&self) -> Option<Result<Circuit, CircuitError>> {
        self.solution_board()
            .map(|board| board.snapshot(&self.single_output_id))
    }
}
