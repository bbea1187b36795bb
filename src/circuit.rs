use std::{
    collections::{HashMap, HashSet},
    fmt,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};

use crate::error::CircuitError;

/// Slot of a node inside a [`Circuit`] snapshot. Stable for the lifetime of
/// the snapshot; never reused across snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(u32);

impl NodeIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for NodeIdx {
    fn from(index: usize) -> Self {
        NodeIdx(index as u32)
    }
}

impl<T> Index<NodeIdx> for Vec<T> {
    type Output = T;

    fn index(&self, index: NodeIdx) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<NodeIdx> for Vec<T> {
    fn index_mut(&mut self, index: NodeIdx) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    And,
    Or,
    Xor,
    Not,
}

impl GateKind {
    pub const ALL: [GateKind; 4] = [GateKind::And, GateKind::Or, GateKind::Xor, GateKind::Not];

    pub fn name(self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Xor => "XOR",
            GateKind::Not => "NOT",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Input,
    Output,
    Gate(GateKind),
}

impl NodeKind {
    pub fn gate(self) -> Option<GateKind> {
        match self {
            NodeKind::Gate(kind) => Some(kind),
            NodeKind::Input | NodeKind::Output => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub position: Position,
    pub label: Option<String>,
    pub locked: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        Node {
            id: id.into(),
            kind,
            position,
            label: None,
            locked: false,
        }
    }

    pub fn input(id: impl Into<String>, position: Position) -> Self {
        Self::new(id, NodeKind::Input, position)
    }

    pub fn output(id: impl Into<String>, position: Position) -> Self {
        Self::new(id, NodeKind::Output, position)
    }

    pub fn gate(id: impl Into<String>, kind: GateKind, position: Position) -> Self {
        Self::new(id, NodeKind::Gate(kind), position)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Display name: the label when set, the id otherwise.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Wire representation of a node: `type` plus an optional `gateType`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    role: RawRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gate_type: Option<GateKind>,
    #[serde(default)]
    position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default)]
    locked: bool,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum RawRole {
    Input,
    Output,
    Gate,
}

impl TryFrom<RawNode> for Node {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let kind = match (raw.role, raw.gate_type) {
            (RawRole::Input, _) => NodeKind::Input,
            (RawRole::Output, _) => NodeKind::Output,
            (RawRole::Gate, Some(kind)) => NodeKind::Gate(kind),
            (RawRole::Gate, None) => return Err(format!("gate {} has no gateType", raw.id)),
        };
        Ok(Node {
            id: raw.id,
            kind,
            position: raw.position,
            label: raw.label,
            locked: raw.locked,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let (role, gate_type) = match node.kind {
            NodeKind::Input => (RawRole::Input, None),
            NodeKind::Output => (RawRole::Output, None),
            NodeKind::Gate(kind) => (RawRole::Gate, Some(kind)),
        };
        RawNode {
            id: node.id,
            role,
            gate_type,
            position: node.position,
            label: node.label,
            locked: node.locked,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wire {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    /// Display hint only.
    #[serde(default)]
    pub animated: bool,
}

impl Wire {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Wire {
            id: format!("{source}-{target}"),
            source,
            target,
            source_handle: None,
            target_handle: None,
            animated: false,
        }
    }
}

/// The editable description of a circuit, as a UI would persist it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub wires: Vec<Wire>,
}

impl Board {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn snapshot(&self, output: &str) -> Result<Circuit, CircuitError> {
        Circuit::new(self.nodes.clone(), &self.wires, output)
    }
}

/// A directed edge between two slots of a [`Circuit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: NodeIdx,
    pub target: NodeIdx,
}

/// Immutable snapshot of a board, with node ids resolved to arena slots.
///
/// Every link references a node in the arena, no (source, target) pair occurs
/// twice, and the designated output is an [`NodeKind::Output`] node.
#[derive(Clone, Debug)]
pub struct Circuit {
    nodes: Vec<Node>,
    index: HashMap<String, NodeIdx>,
    links: Vec<Link>,
    output: NodeIdx,
}

impl Circuit {
    pub fn new(nodes: Vec<Node>, wires: &[Wire], output: &str) -> Result<Self, CircuitError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), NodeIdx::from(i)).is_some() {
                return Err(CircuitError::DuplicateNode(node.id.clone()));
            }
        }

        let resolve = |wire: &Wire, id: &str| {
            index
                .get(id)
                .copied()
                .ok_or_else(|| CircuitError::UnknownEndpoint {
                    wire: wire.id.clone(),
                    node: id.to_string(),
                })
        };
        let mut seen = HashSet::with_capacity(wires.len());
        let mut links = Vec::with_capacity(wires.len());
        for wire in wires {
            let link = Link {
                source: resolve(wire, &wire.source)?,
                target: resolve(wire, &wire.target)?,
            };
            if !seen.insert(link) {
                return Err(CircuitError::DuplicateWire {
                    from: wire.source.clone(),
                    to: wire.target.clone(),
                });
            }
            links.push(link);
        }

        let output = *index
            .get(output)
            .ok_or_else(|| CircuitError::UnknownOutput(output.to_string()))?;
        if nodes[output].kind != NodeKind::Output {
            return Err(CircuitError::NotAnOutput(nodes[output].id.clone()));
        }

        Ok(Circuit {
            nodes,
            index,
            links,
            output,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIdx::from(i), node))
    }

    pub fn idx(&self, id: &str) -> Option<NodeIdx> {
        self.index.get(id).copied()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn output(&self) -> NodeIdx {
        self.output
    }

    /// Every `Input` node, in arena order.
    pub fn inputs(&self) -> Vec<NodeIdx> {
        self.nodes()
            .filter(|(_, node)| node.kind == NodeKind::Input)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Resolves a list of input ids to slots, keeping their order.
    pub fn resolve_inputs<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<NodeIdx>, CircuitError> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref();
                match self.idx(id) {
                    Some(idx) if self.nodes[idx].kind == NodeKind::Input => Ok(idx),
                    _ => Err(CircuitError::UnknownInput(id.to_string())),
                }
            })
            .collect()
    }

    pub fn label(&self, idx: NodeIdx) -> &str {
        self.nodes[idx].label()
    }
}
