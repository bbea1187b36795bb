use std::{cell::RefCell, rc::Rc};

use crate::{
    circuit::{Board, Circuit, GateKind, Node, NodeKind, Position, Wire},
    error::CircuitError,
};

const COLUMN_WIDTH: f64 = 200.0;
const ROW_HEIGHT: f64 = 100.0;
const MARGIN: f64 = 100.0;

pub trait BuilderHooks: Default {
    fn create_node_hook(&mut self, _node: &Node) {}
    fn connect_hook(&mut self, _wire: &Wire) {}

    type MarkNodeArgs;
    fn mark_node(&mut self, _node_id: &str, _args: Self::MarkNodeArgs) {}
}

#[derive(Default)]
pub struct NoHooks;
impl BuilderHooks for NoHooks {
    type MarkNodeArgs = ();
}

pub type BoardBuilder = BoardBuilderWithHooks<NoHooks>;

/// Accumulates a [`Board`], placing each node one column to the right of its
/// rightmost upstream node so every wire flows left to right.
#[derive(Default)]
pub struct BoardBuilderWithHooks<T: BuilderHooks> {
    pub board: Board,
    /// Nodes placed so far in each column.
    column_heights: Vec<usize>,
    hooks: T,
}

impl<T: BuilderHooks> BoardBuilderWithHooks<T> {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    fn create_node(&mut self, kind: NodeKind, column: usize, label: Option<String>) -> String {
        if self.column_heights.len() <= column {
            self.column_heights.resize(column + 1, 0);
        }
        let row = self.column_heights[column];
        self.column_heights[column] += 1;

        let id = format!("n{}", self.board.nodes.len());
        let position = Position::new(
            MARGIN + column as f64 * COLUMN_WIDTH,
            MARGIN + row as f64 * ROW_HEIGHT,
        );
        let mut node = Node::new(id.clone(), kind, position);
        node.label = label;
        self.hooks.create_node_hook(&node);
        self.board.nodes.push(node);
        id
    }

    fn connect(&mut self, source: &str, target: &str) {
        let wire = Wire::new(source, target);
        self.hooks.connect_hook(&wire);
        self.board.wires.push(wire);
    }

    fn mark_node(&mut self, node_id: &str, args: T::MarkNodeArgs) {
        self.hooks.mark_node(node_id, args);
    }

    pub fn build(&mut self) -> (&Board, &mut T) {
        (&self.board, &mut self.hooks)
    }

    pub fn snapshot(&self, output: &Connector<T>) -> Result<Circuit, CircuitError> {
        self.board.snapshot(&output.id)
    }
}

pub struct Connector<T: BuilderHooks> {
    builder: Rc<RefCell<BoardBuilderWithHooks<T>>>,
    pub id: String,
    column: usize,
}

impl<T: BuilderHooks> Clone for Connector<T> {
    fn clone(&self) -> Self {
        Self::from_node(self.builder.clone(), self.id.clone(), self.column)
    }
}

impl<T: BuilderHooks> Connector<T> {
    fn from_node(
        builder: Rc<RefCell<BoardBuilderWithHooks<T>>>,
        id: String,
        column: usize,
    ) -> Self {
        Connector {
            builder,
            id,
            column,
        }
    }

    pub fn input(builder: Rc<RefCell<BoardBuilderWithHooks<T>>>, label: &str) -> Self {
        let id = builder
            .borrow_mut()
            .create_node(NodeKind::Input, 0, Some(label.to_string()));
        Self::from_node(builder, id, 0)
    }

    fn gate_gen(kind: GateKind, inputs: &[&Self]) -> Self {
        let builder = inputs[0].builder.clone();
        let column = 1 + inputs.iter().map(|input| input.column).max().unwrap_or(0);
        let mut builder_mut = builder.borrow_mut();
        let output = builder_mut.create_node(NodeKind::Gate(kind), column, None);
        for input in inputs {
            debug_assert!(Rc::ptr_eq(&builder, &input.builder));
            builder_mut.connect(&input.id, &output);
        }
        drop(builder_mut);
        Self::from_node(builder, output, column)
    }

    pub fn mark(&self, args: T::MarkNodeArgs) -> &Self {
        self.builder.borrow_mut().mark_node(&self.id, args);
        self
    }

    pub fn invert(&self) -> Self {
        Self::gate_gen(GateKind::Not, &[self])
    }

    /// Terminates this signal in an `Output` node.
    pub fn output(&self, label: &str) -> Self {
        let column = self.column + 1;
        let mut builder_mut = self.builder.borrow_mut();
        let output = builder_mut.create_node(NodeKind::Output, column, Some(label.to_string()));
        builder_mut.connect(&self.id, &output);
        drop(builder_mut);
        Self::from_node(self.builder.clone(), output, column)
    }

    pub fn connect(&self, target: &Connector<T>) {
        self.builder.borrow_mut().connect(&self.id, &target.id);
    }
}

pub mod ops {
    use crate::circuit::GateKind;

    use super::{BuilderHooks, Connector};

    pub use crate::{and, or, xor};

    macro_rules! gate_fn_gen {
        ( $gate_lowercase:ident, $gate_uppercase:ident ) => {
            pub fn $gate_lowercase<T: BuilderHooks>(inputs: Vec<&Connector<T>>) -> Connector<T> {
                Connector::gate_gen(GateKind::$gate_uppercase, &inputs)
            }
        };
    }

    gate_fn_gen!(or, Or);
    gate_fn_gen!(and, And);
    gate_fn_gen!(xor, Xor);

    pub fn not<T: BuilderHooks>(input: &Connector<T>) -> Connector<T> {
        input.invert()
    }

    #[macro_export]
    macro_rules! or {
        ( $( $inputs:expr ),+ ) => {
            or(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! and {
        ( $( $inputs:expr ),+ ) => {
            and(vec!($(&$inputs),+))
        };
    }

    #[macro_export]
    macro_rules! xor {
        ( $( $inputs:expr ),+ ) => {
            xor(vec!($(&$inputs),+))
        };
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use super::{ops::*, *};
    use crate::{
        config::ArityBounds,
        eval::Evaluator,
        validate::{check_direction, validate},
    };

    #[derive(Default)]
    struct Marks {
        marks: BTreeMap<String, String>,
        wires: usize,
    }

    impl BuilderHooks for Marks {
        type MarkNodeArgs = String;

        fn connect_hook(&mut self, _wire: &Wire) {
            self.wires += 1;
        }

        fn mark_node(&mut self, node_id: &str, name: String) {
            self.marks.insert(name, node_id.to_string());
        }
    }

    #[test]
    fn columns_flow_left_to_right() {
        let builder = BoardBuilder::shared();
        let a = Connector::input(builder.clone(), "A");
        let b = Connector::input(builder.clone(), "B");
        let y = and!(a, b.invert()).output("Y");

        let circuit = builder.borrow().snapshot(&y).unwrap();
        assert!(check_direction(&circuit).is_empty());
        assert!(validate(&circuit, &ArityBounds::default()).is_ok());

        let positions: Vec<f64> = builder
            .borrow()
            .board
            .nodes
            .iter()
            .map(|node| node.position.x)
            .collect();
        assert_eq!(positions, vec![100.0, 100.0, 300.0, 500.0, 700.0]);
    }

    #[test]
    fn inverter_series() {
        let builder = BoardBuilderWithHooks::<Marks>::shared();
        let a = Connector::input(builder.clone(), "A");
        let mut signal = a.invert();
        signal.mark("1-output".to_string());
        for i in 2..=5 {
            signal = signal.invert();
            signal.mark(format!("{i}-output"));
        }
        let y = signal.output("Y");

        let circuit = builder.borrow().snapshot(&y).unwrap();
        let evaluator = Evaluator::new(&circuit).unwrap();
        let values = evaluator.evaluate(&[(circuit.idx(&a.id).unwrap(), true)]);
        assert!(values.is_success());

        let mut builder_mut = builder.borrow_mut();
        let (_, marks) = builder_mut.build();
        assert_eq!(marks.wires, 6);
        for (name, id) in &marks.marks {
            let depth: usize = name[..1].parse().unwrap();
            let value = values.value(circuit.idx(id).unwrap());
            assert_eq!(value, depth % 2 == 0, "{name}");
        }
    }
}
