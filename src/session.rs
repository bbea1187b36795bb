use tracing::{info, warn};

use crate::{
    circuit::{Board, Circuit, GateKind, Node, NodeIdx, NodeKind, Position, Wire},
    config::EngineConfig,
    error::{SessionError, SessionResult},
    eval::{Evaluation, Evaluator},
    rating::{rate, Rating, Usage},
    scenario::{Scenario, SolutionWire},
    simulation::{simulate, SimulationReport},
};

/// Observers of board edits. Every hook defaults to doing nothing.
pub trait SessionHooks: Default {
    fn node_added(&mut self, _node: &Node) {}
    fn node_removed(&mut self, _node: &Node) {}
    fn wire_added(&mut self, _wire: &Wire) {}
    fn wire_removed(&mut self, _wire: &Wire) {}
}

#[derive(Default)]
pub struct NoHooks;
impl SessionHooks for NoHooks {}

pub type Session = SessionWithHooks<NoHooks>;

const DEFAULT_MAX_GATES: usize = 20;

/// Emitted when a run matches the target table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    pub rating: Rating,
}

/// The editable board for one scenario.
///
/// All mutation happens here; each simulation works on a fresh [`Circuit`]
/// snapshot, so a run never sees a half-applied edit.
pub struct SessionWithHooks<T: SessionHooks> {
    scenario: Scenario,
    config: EngineConfig,
    board: Board,
    usage: Usage,
    next_gate: usize,
    completion: Option<Completion>,
    hooks: T,
}

impl<T: SessionHooks> SessionWithHooks<T> {
    pub fn new(scenario: Scenario, config: EngineConfig) -> Self {
        let mut session = SessionWithHooks {
            scenario,
            config,
            board: Board::default(),
            usage: Usage::default(),
            next_gate: 0,
            completion: None,
            hooks: T::default(),
        };
        session.reset();
        session
    }

    /// Back to the scenario's locked nodes, no wires, counters cleared.
    pub fn reset(&mut self) {
        self.board = Board {
            nodes: self.scenario.locked_nodes(),
            wires: Vec::new(),
        };
        self.usage = Usage {
            gates_used: self
                .board
                .nodes
                .iter()
                .filter(|node| node.kind.gate().is_some())
                .count(),
            ..Usage::default()
        };
        self.completion = None;
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn wires_used(&self) -> usize {
        self.board.wires.len()
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    pub fn hooks(&self) -> &T {
        &self.hooks
    }

    fn node_position(&self, id: &str) -> SessionResult<Position> {
        self.board
            .node(id)
            .map(|node| node.position)
            .ok_or_else(|| SessionError::UnknownNode(id.to_string()))
    }

    /// Gates the player may have on the board, locked ones included.
    pub fn max_gates(&self) -> usize {
        self.scenario
            .constraints
            .max_gates
            .unwrap_or(DEFAULT_MAX_GATES)
    }

    /// Adds `node` unless its id is taken, in which case nothing happens and
    /// `false` comes back.
    ///
    /// Only the scenario places locked nodes, and those are already on the
    /// board, so a `locked` flag on `node` is cleared.
    pub fn add_node(&mut self, mut node: Node) -> SessionResult<bool> {
        if self.board.node(&node.id).is_some() {
            return Ok(false);
        }
        if node.locked {
            warn!(node = %node.id, "clearing locked flag on a placed node");
            node.locked = false;
        }
        if let NodeKind::Gate(kind) = node.kind {
            if !self.scenario.allows(kind) {
                warn!(%kind, "gate kind not allowed");
                return Err(SessionError::GateNotAllowed(kind));
            }
            let max_gates = self.max_gates();
            if self.usage.gates_used >= max_gates {
                warn!(max_gates, "gate budget exhausted");
                return Err(SessionError::GateBudget(max_gates));
            }
        }
        if node.kind.gate().is_some() {
            self.usage.gates_used += 1;
        }
        self.hooks.node_added(&node);
        self.board.nodes.push(node);
        Ok(true)
    }

    /// Places a new gate and returns its id.
    pub fn add_gate(&mut self, kind: GateKind, position: Position) -> SessionResult<String> {
        let id = loop {
            let id = format!("gate-{}", self.next_gate);
            self.next_gate += 1;
            if self.board.node(&id).is_none() {
                break id;
            }
        };
        self.add_node(Node::gate(id.clone(), kind, position).with_label(kind.name()))?;
        Ok(id)
    }

    /// Removes a node together with every wire touching it. Locked nodes
    /// cannot be removed; unknown ids are a no-op.
    pub fn remove_node(&mut self, id: &str) -> SessionResult<bool> {
        let Some(index) = self.board.nodes.iter().position(|node| node.id == id) else {
            return Ok(false);
        };
        if self.board.nodes[index].locked {
            warn!(node = id, "refusing to remove locked node");
            return Err(SessionError::Locked(id.to_string()));
        }
        let node = self.board.nodes.remove(index);
        if node.kind.gate().is_some() {
            self.usage.gates_used = self.usage.gates_used.saturating_sub(1);
        }

        let (dropped, kept): (Vec<Wire>, Vec<Wire>) = std::mem::take(&mut self.board.wires)
            .into_iter()
            .partition(|wire| wire.source == id || wire.target == id);
        self.board.wires = kept;
        for wire in &dropped {
            self.hooks.wire_removed(wire);
        }
        self.hooks.node_removed(&node);
        Ok(true)
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> SessionResult<()> {
        let node = self
            .board
            .nodes
            .iter_mut()
            .find(|node| node.id == id)
            .ok_or_else(|| SessionError::UnknownNode(id.to_string()))?;
        node.position = position;
        Ok(())
    }

    /// Wires `source` to `target`. A pair that is already wired is a no-op
    /// returning `false`. `maxWires` is shown to the player but not enforced.
    pub fn connect(&mut self, source: &str, target: &str) -> SessionResult<bool> {
        self.connect_wire(Wire::new(source, target))
    }

    /// [`Self::connect`] for a wire carrying its own id and handles, as a
    /// saved board stores them.
    pub fn connect_wire(&mut self, wire: Wire) -> SessionResult<bool> {
        let from = self.node_position(&wire.source)?;
        let to = self.node_position(&wire.target)?;
        if self
            .board
            .wires
            .iter()
            .any(|w| w.source == wire.source && w.target == wire.target)
        {
            return Ok(false);
        }
        if from.x >= to.x {
            warn!(
                source = %wire.source,
                target = %wire.target,
                "refusing right-to-left wire"
            );
            return Err(SessionError::RightToLeft {
                from: wire.source,
                to: wire.target,
            });
        }

        self.hooks.wire_added(&wire);
        self.board.wires.push(wire);
        Ok(true)
    }

    pub fn disconnect(&mut self, wire_id: &str) -> bool {
        let Some(index) = self.board.wires.iter().position(|wire| wire.id == wire_id) else {
            return false;
        };
        let wire = self.board.wires.remove(index);
        self.hooks.wire_removed(&wire);
        true
    }

    pub fn use_hint(&mut self) -> Option<&str> {
        self.usage.hints_used += 1;
        self.scenario.hint.as_deref()
    }

    pub fn set_elapsed(&mut self, secs: u64) {
        self.usage.elapsed_secs = secs;
    }

    /// Wiring of the reference solution, for display.
    pub fn solution(&self) -> &[SolutionWire] {
        self.scenario.solution_wiring.as_deref().unwrap_or_default()
    }

    pub fn snapshot(&self) -> SessionResult<Circuit> {
        Ok(self.board.snapshot(&self.scenario.single_output_id)?)
    }

    /// Evaluates the current board for one assignment, keyed by input id.
    /// Returns `None` when the board has a cycle.
    pub fn probe(&self, assignment: &[(&str, bool)]) -> SessionResult<Option<Evaluation>> {
        let circuit = self.snapshot()?;
        let ids: Vec<&str> = assignment.iter().map(|(id, _)| *id).collect();
        let inputs: Vec<(NodeIdx, bool)> = circuit
            .resolve_inputs(&ids)?
            .into_iter()
            .zip(assignment.iter().map(|(_, value)| *value))
            .collect();
        Ok(Evaluator::new(&circuit)
            .ok()
            .map(|evaluator| evaluator.evaluate(&inputs)))
    }

    /// Runs the full pipeline on a snapshot of the board. A successful run
    /// records a [`Completion`].
    pub fn simulate(&mut self) -> SessionResult<SimulationReport> {
        let circuit = self.snapshot()?;
        let inputs = circuit.resolve_inputs(&self.scenario.input_ids())?;
        let report = simulate(
            &circuit,
            &inputs,
            &self.scenario.target_truth,
            &self.config,
            &self.scenario.output_columns(),
        );
        if report.success {
            let rating = rate(&self.scenario.constraints, &self.usage);
            info!(
                scenario = %self.scenario.id,
                stars = rating.stars,
                score = rating.score,
                "scenario completed"
            );
            self.completion = Some(Completion { rating });
        }
        Ok(report)
    }
}
