use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::{
    circuit::{Circuit, NodeIdx},
    config::EngineConfig,
    error::Diagnostic,
    eval::Evaluator,
    truth_table::{self, OutputColumns, TruthTable},
    validate::validate,
};

/// Everything a caller needs to show the outcome of one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub table: TruthTable,
    /// One flag per generated row.
    pub matches: Vec<bool>,
    pub mismatches: Vec<usize>,
    #[serde(serialize_with = "messages")]
    pub errors: Vec<Diagnostic>,
    pub success: bool,
}

fn messages<S: Serializer>(errors: &[Diagnostic], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|error| error.to_string()))
}

impl SimulationReport {
    fn unusable(table: TruthTable, errors: Vec<Diagnostic>) -> Self {
        let rows = table.len();
        SimulationReport {
            table,
            matches: vec![false; rows],
            mismatches: (0..rows).collect(),
            errors,
            success: false,
        }
    }
}

/// Validates `circuit`, enumerates every assignment of `inputs`, and compares
/// the result with `target`.
///
/// Structural problems stop the run before evaluation; the returned table then
/// lists every assignment with a 0 output and every row is flagged as failed.
pub fn simulate(
    circuit: &Circuit,
    inputs: &[NodeIdx],
    target: &TruthTable,
    config: &EngineConfig,
    columns: &OutputColumns,
) -> SimulationReport {
    let limit = config.input_limit();
    if inputs.len() > limit {
        return SimulationReport::unusable(
            TruthTable::default(),
            vec![Diagnostic::TooManyInputs {
                count: inputs.len(),
                max: limit,
            }],
        );
    }

    let validated = match validate(circuit, &config.arity) {
        Ok(validated) => validated,
        Err(errors) => {
            let table = truth_table::placeholder(circuit, inputs, &config.output_label);
            return SimulationReport::unusable(table, errors);
        }
    };

    let evaluator = Evaluator::from_validated(circuit, &validated);
    let generated = truth_table::generate(&evaluator, inputs, &config.output_label);
    if !generated.is_usable() {
        debug!(
            failed_rows = generated.failed_rows.len(),
            "evaluation reported errors"
        );
        return SimulationReport::unusable(generated.table, generated.errors);
    }

    let comparison = truth_table::compare(&generated.table, target, columns);
    let matches = comparison.row_flags(generated.table.len());
    if comparison.matches {
        info!(rows = generated.table.len(), "circuit matches target table");
    } else {
        debug!(
            mismatches = comparison.mismatches.len(),
            length_mismatch = comparison.length_mismatch,
            "circuit does not match target table"
        );
    }
    SimulationReport {
        table: generated.table,
        matches,
        mismatches: comparison.mismatches,
        errors: Vec::new(),
        success: comparison.matches,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        circuit::{Board, GateKind, Node, Position, Wire},
        row,
    };

    fn board() -> Board {
        Board {
            nodes: vec![
                Node::input("inA", Position::new(100.0, 150.0)).with_label("A"),
                Node::input("inB", Position::new(100.0, 250.0)).with_label("B"),
                Node::gate("g", GateKind::And, Position::new(400.0, 200.0)),
                Node::output("lampY", Position::new(700.0, 200.0)).with_label("Lamp"),
            ],
            wires: vec![
                Wire::new("inA", "g"),
                Wire::new("inB", "g"),
                Wire::new("g", "lampY"),
            ],
        }
    }

    fn and_target() -> TruthTable {
        TruthTable::new(vec![
            row!["A" => 0, "B" => 0, "Y" => 0],
            row!["A" => 0, "B" => 1, "Y" => 0],
            row!["A" => 1, "B" => 0, "Y" => 0],
            row!["A" => 1, "B" => 1, "Y" => 1],
        ])
    }

    fn run(board: &Board, target: &TruthTable) -> SimulationReport {
        let circuit = board.snapshot("lampY").unwrap();
        let inputs = circuit.inputs();
        simulate(
            &circuit,
            &inputs,
            target,
            &EngineConfig::default(),
            &OutputColumns::Heuristic,
        )
    }

    #[test]
    fn matching_circuit_succeeds() {
        let report = run(&board(), &and_target());
        assert!(report.success);
        assert!(report.errors.is_empty());
        assert!(report.mismatches.is_empty());
        assert_eq!(report.matches, vec![true; 4]);
        assert_eq!(report.table, and_target());
    }

    #[test]
    fn wrong_gate_reports_mismatching_rows() {
        let mut board = board();
        board.nodes[2].kind = crate::circuit::NodeKind::Gate(GateKind::Or);
        let report = run(&board, &and_target());
        assert!(!report.success);
        assert!(report.errors.is_empty());
        assert_eq!(report.mismatches, vec![1, 2]);
        assert_eq!(report.matches, vec![true, false, false, true]);
    }

    #[test]
    fn structural_errors_abort_before_evaluation() {
        let mut board = board();
        board.wires.pop();
        board.wires.push(Wire::new("g", "inA"));
        let report = run(&board, &and_target());
        assert!(!report.success);
        assert!(matches!(report.errors[..], [Diagnostic::RightToLeft { .. }]));
        assert_eq!(report.table.len(), 4);
        assert!(report.table.rows.iter().all(|row| row.get("Y") == Some(false)));
        assert_eq!(report.matches, vec![false; 4]);
    }

    #[test]
    fn too_many_inputs() {
        let circuit = board().snapshot("lampY").unwrap();
        let config = EngineConfig {
            max_inputs: 1,
            ..EngineConfig::default()
        };
        let report = simulate(
            &circuit,
            &circuit.inputs(),
            &and_target(),
            &config,
            &OutputColumns::Heuristic,
        );
        assert_eq!(
            report.errors,
            vec![Diagnostic::TooManyInputs { count: 2, max: 1 }]
        );
        assert!(report.table.is_empty());
    }

    #[test]
    fn input_limit_is_capped_whatever_the_config() {
        let mut nodes: Vec<Node> = (0..64)
            .map(|i| Node::input(format!("in{i}"), Position::new(100.0, i as f64)))
            .collect();
        nodes.push(Node::output("y", Position::new(300.0, 0.0)));
        let circuit = Board {
            nodes,
            wires: vec![Wire::new("in0", "y")],
        }
        .snapshot("y")
        .unwrap();
        let config = EngineConfig {
            max_inputs: 64,
            ..EngineConfig::default()
        };

        let report = simulate(
            &circuit,
            &circuit.inputs(),
            &and_target(),
            &config,
            &OutputColumns::Heuristic,
        );
        assert!(!report.success);
        assert_eq!(
            report.errors,
            vec![Diagnostic::TooManyInputs { count: 64, max: 20 }]
        );
        assert!(report.table.is_empty());
    }

    #[test]
    fn report_json_carries_messages() {
        let mut board = board();
        board.wires.pop();
        let json = serde_json::to_value(run(&board, &and_target())).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(
            json["errors"][0],
            "Nodes not connected to output: inA, inB, g"
        );
    }
}
