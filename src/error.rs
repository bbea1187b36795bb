use thiserror::Error;

use crate::circuit::GateKind;

/// A problem found in a circuit, either structurally before evaluation or
/// while propagating values through it.
///
/// None of these abort the process: they are collected and handed back to the
/// caller, who decides whether the generated table is usable.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("Wires must flow from left to right ({from} -> {to})")]
    RightToLeft { from: String, to: String },

    #[error("Circuit contains a cycle")]
    Cycle,

    #[error("Nodes not connected to output: {}", .nodes.join(", "))]
    Disconnected { nodes: Vec<String> },

    #[error("NOT gate {gate} must have exactly {expected} input (has {found})")]
    NotArity {
        gate: String,
        expected: usize,
        found: usize,
    },

    #[error("{kind} gate {gate} must have {min}-{max} inputs (has {found})")]
    GateArity {
        gate: String,
        kind: GateKind,
        min: usize,
        max: usize,
        found: usize,
    },

    #[error("Output {output} must have exactly 1 input (has {found})")]
    OutputArity { output: String, found: usize },

    #[error("Gate {gate} has no inputs")]
    GateWithoutInputs { gate: String },

    #[error("Output has no input connection")]
    OutputWithoutInput,

    #[error("Too many inputs to enumerate: {count} (limit {max})")]
    TooManyInputs { count: usize, max: usize },
}

/// Errors raised while turning a board description into a [`crate::Circuit`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CircuitError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("wire {wire} references unknown node {node}")]
    UnknownEndpoint { wire: String, node: String },

    #[error("duplicate wire from {from} to {to}")]
    DuplicateWire { from: String, to: String },

    #[error("unknown output node: {0}")]
    UnknownOutput(String),

    #[error("node {0} is not an output node")]
    NotAnOutput(String),

    #[error("unknown input node: {0}")]
    UnknownInput(String),
}

/// Rejected edit operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("node {0} is locked and cannot be removed")]
    Locked(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("{0} gates are not allowed in this scenario")]
    GateNotAllowed(GateKind),

    #[error("wire from {from} to {to} must flow left to right")]
    RightToLeft { from: String, to: String },

    #[error("gate budget of {0} exhausted")]
    GateBudget(usize),

    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

/// Errors raised while loading a scenario descriptor.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scenario {id}: {reason}")]
    Invalid { id: String, reason: String },
}

/// Returned by the cancellable truth-table generator when the caller flags
/// the run as cancelled.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("truth table generation cancelled after {rows_done} rows")]
pub struct Cancelled {
    pub rows_done: usize,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
