use std::{
    convert::Infallible,
    fmt,
    ops::{BitAnd, Shl},
    sync::atomic::{AtomicBool, Ordering},
};

use num_traits::Unsigned;
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use tracing::{debug, trace};

use crate::{
    circuit::{Circuit, NodeIdx},
    config::INPUT_CEILING,
    error::{Cancelled, Diagnostic},
    eval::Evaluator,
};

/// One line of a truth table: variable label to bit, in column order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, bool)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `label`, replacing an earlier cell with the same label.
    pub fn set(&mut self, label: impl Into<String>, value: bool) {
        let label = label.into();
        match self.cells.iter_mut().find(|(l, _)| *l == label) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((label, value)),
        }
    }

    pub fn with(mut self, label: impl Into<String>, value: bool) -> Self {
        self.set(label, value);
        self
    }

    pub fn get(&self, label: &str) -> Option<bool> {
        self.cells
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, value)| *value)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(label, _)| label.as_str())
    }

    pub fn cells(&self) -> &[(String, bool)] {
        &self.cells
    }
}

/// Builds a row from `label => bit` pairs, bits written as `0`/`1`.
#[macro_export]
macro_rules! row {
    ( $( $label:expr => $bit:expr ),* $(,)? ) => {
        $crate::truth_table::Row::new() $( .with($label, $bit != 0) )*
    };
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (label, value) in &self.cells {
            map.serialize_entry(label, &u8::from(*value))?;
        }
        map.end()
    }
}

/// Target tables write bits either as numbers or as booleans.
#[derive(Deserialize)]
#[serde(untagged)]
enum Bit {
    Number(u8),
    Bool(bool),
}

impl From<Bit> for bool {
    fn from(bit: Bit) -> Self {
        match bit {
            Bit::Number(n) => n != 0,
            Bit::Bool(b) => b,
        }
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of labels to 0/1")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((label, bit)) = access.next_entry::<String, Bit>()? {
                    row.set(label, bit.into());
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruthTable {
    pub rows: Vec<Row>,
}

impl TruthTable {
    pub fn new(rows: Vec<Row>) -> Self {
        TruthTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.rows.first() else {
            return writeln!(f, "(empty)");
        };
        let widths: Vec<usize> = first.labels().map(|label| label.len().max(1)).collect();
        write!(f, "|")?;
        for (label, &width) in first.labels().zip(&widths) {
            write!(f, " {label:^width$} |")?;
        }
        writeln!(f)?;
        write!(f, "|")?;
        for width in &widths {
            write!(f, "{}|", "-".repeat(width + 2))?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "|")?;
            for ((_, value), &width) in row.cells().iter().zip(&widths) {
                write!(f, " {:^width$} |", u8::from(*value))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The low `width` bits of `value`, most significant first.
pub fn bits_msb_first<T>(value: T, width: usize) -> impl Iterator<Item = bool>
where
    T: Unsigned + Copy + BitAnd<T, Output = T> + Shl<usize, Output = T>,
{
    (0..width)
        .rev()
        .map(move |bit| !(value & (T::one() << bit)).is_zero())
}

/// A generated table plus whatever went wrong while producing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated {
    pub table: TruthTable,
    /// Distinct diagnostics over all rows, in first-seen order.
    pub errors: Vec<Diagnostic>,
    /// Rows whose evaluation reported an error; their output reads 0.
    pub failed_rows: Vec<usize>,
}

impl Generated {
    /// A table with any failed row is not fit for comparison: the errors
    /// belong to the circuit, not to one input combination.
    pub fn is_usable(&self) -> bool {
        self.failed_rows.is_empty()
    }
}

fn input_row(circuit: &Circuit, inputs: &[NodeIdx], assignment: u64) -> Row {
    let mut row = Row::new();
    for (idx, value) in inputs.iter().zip(bits_msb_first(assignment, inputs.len())) {
        row.set(circuit.label(*idx), value);
    }
    row
}

/// `2^n`, saturating at `u64::MAX` for 64 inputs or more.
fn num_rows(inputs: &[NodeIdx]) -> u64 {
    u32::try_from(inputs.len())
        .ok()
        .and_then(|n| 1u64.checked_shl(n))
        .unwrap_or(u64::MAX)
}

fn row_capacity(inputs: &[NodeIdx]) -> usize {
    num_rows(inputs).min(1 << INPUT_CEILING) as usize
}

/// Enumerates all `2^n` assignments of `inputs` (first input is the most
/// significant bit) and records one row per assignment. Rows are produced for
/// every assignment even when some of them fail.
pub fn generate(evaluator: &Evaluator, inputs: &[NodeIdx], output_label: &str) -> Generated {
    match enumerate(evaluator, inputs, output_label, |_| Ok::<(), Infallible>(())) {
        Ok(generated) => generated,
        Err(never) => match never {},
    }
}

/// [`generate`], checking `cancel` once per row.
pub fn generate_cancellable(
    evaluator: &Evaluator,
    inputs: &[NodeIdx],
    output_label: &str,
    cancel: &AtomicBool,
) -> Result<Generated, Cancelled> {
    generate_until(evaluator, inputs, output_label, |_| cancel.load(Ordering::Relaxed))
}

/// [`generate`], asking `stop` with the number of finished rows before each
/// row.
pub fn generate_until(
    evaluator: &Evaluator,
    inputs: &[NodeIdx],
    output_label: &str,
    mut stop: impl FnMut(usize) -> bool,
) -> Result<Generated, Cancelled> {
    enumerate(evaluator, inputs, output_label, |rows_done| {
        if stop(rows_done) {
            debug!(rows_done, "truth table generation cancelled");
            Err(Cancelled { rows_done })
        } else {
            Ok(())
        }
    })
}

fn enumerate<E>(
    evaluator: &Evaluator,
    inputs: &[NodeIdx],
    output_label: &str,
    mut before_row: impl FnMut(usize) -> Result<(), E>,
) -> Result<Generated, E> {
    let circuit = evaluator.circuit();
    let output = circuit.output();
    let mut rows = Vec::with_capacity(row_capacity(inputs));
    let mut errors: Vec<Diagnostic> = Vec::new();
    let mut failed_rows = Vec::new();
    let mut assignment = Vec::with_capacity(inputs.len());

    for i in 0..num_rows(inputs) {
        before_row(rows.len())?;

        assignment.clear();
        assignment.extend(inputs.iter().copied().zip(bits_msb_first(i, inputs.len())));
        let evaluation = evaluator.evaluate(&assignment);

        let mut row = input_row(circuit, inputs, i);
        if evaluation.is_success() {
            row.set(output_label, evaluation.value(output));
        } else {
            row.set(output_label, false);
            failed_rows.push(rows.len());
            for error in evaluation.errors {
                if !errors.contains(&error) {
                    errors.push(error);
                }
            }
        }
        trace!(row = i, ?row, "generated row");
        rows.push(row);
    }

    Ok(Generated {
        table: TruthTable::new(rows),
        errors,
        failed_rows,
    })
}

/// Input columns for every assignment with the output column at 0, for
/// circuits that never reached evaluation.
pub fn placeholder(circuit: &Circuit, inputs: &[NodeIdx], output_label: &str) -> TruthTable {
    TruthTable::new(
        (0..num_rows(inputs))
            .map(|i| {
                let mut row = input_row(circuit, inputs, i);
                row.set(output_label, false);
                row
            })
            .collect(),
    )
}

/// Which columns of a target table hold outputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputColumns {
    /// `Y`, or any label containing `Lamp` or `Output`.
    #[default]
    Heuristic,
    /// Exactly this label.
    Named(String),
}

impl OutputColumns {
    pub fn is_output(&self, label: &str) -> bool {
        match self {
            OutputColumns::Heuristic => {
                label == "Y" || label.contains("Lamp") || label.contains("Output")
            }
            OutputColumns::Named(name) => label == name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub matches: bool,
    /// Indices of mismatching rows; empty on a full match and on a length
    /// mismatch.
    pub mismatches: Vec<usize>,
    pub length_mismatch: bool,
}

impl Comparison {
    /// One flag per generated row. A length mismatch marks every row false.
    pub fn row_flags(&self, rows: usize) -> Vec<bool> {
        if self.length_mismatch {
            return vec![false; rows];
        }
        (0..rows).map(|i| !self.mismatches.contains(&i)).collect()
    }
}

/// Compares only the output columns of `target`, row by row.
pub fn compare(actual: &TruthTable, target: &TruthTable, columns: &OutputColumns) -> Comparison {
    if actual.len() != target.len() {
        return Comparison {
            matches: false,
            mismatches: Vec::new(),
            length_mismatch: true,
        };
    }

    let mismatches: Vec<usize> = actual
        .rows
        .iter()
        .zip(&target.rows)
        .enumerate()
        .filter(|(_, (actual, target))| {
            target
                .cells()
                .iter()
                .filter(|(label, _)| columns.is_output(label))
                .any(|(label, expected)| actual.get(label) != Some(*expected))
        })
        .map(|(i, _)| i)
        .collect();

    Comparison {
        matches: mismatches.is_empty(),
        mismatches,
        length_mismatch: false,
    }
}
