pub mod builder;
pub mod components;
pub mod config;
pub mod error;
pub mod eval;
pub mod graph;
pub mod rating;
pub mod scenario;
pub mod session;
pub mod simulation;
pub mod truth_table;
pub mod validate;

mod circuit;
pub use circuit::{Board, Circuit, GateKind, Link, Node, NodeIdx, NodeKind, Position, Wire};
pub use config::EngineConfig;
pub use error::{CircuitError, Diagnostic, ScenarioError, SessionError};
pub use scenario::Scenario;
pub use session::Session;
pub use simulation::{simulate, SimulationReport};
pub use truth_table::{OutputColumns, Row, TruthTable};
