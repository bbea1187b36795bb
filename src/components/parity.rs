use crate::{
    builder::{ops::xor, BuilderHooks, Connector},
    config::ArityBounds,
};

/// XOR tree over `inputs`, no gate wider than the configured fan-in.
/// `None` for an empty input list; a single input is passed through.
pub fn parity<T: BuilderHooks>(
    inputs: &[Connector<T>],
    bounds: &ArityBounds,
) -> Option<Connector<T>> {
    let width = bounds.max_fan_in.max(2);
    let mut layer = inputs.to_vec();
    while layer.len() > 1 {
        layer = layer
            .chunks(width)
            .map(|chunk| match chunk {
                [single] => single.clone(),
                _ => xor(chunk.iter().collect()),
            })
            .collect();
    }
    layer.pop()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{builder::BoardBuilder, eval::Evaluator, truth_table::generate, validate::validate};

    #[test]
    fn five_input_parity() {
        let builder = BoardBuilder::shared();
        let inputs: Vec<_> = ["A", "B", "C", "D", "E"]
            .into_iter()
            .map(|label| Connector::input(builder.clone(), label))
            .collect();
        let bounds = ArityBounds::default();
        let y = parity(&inputs, &bounds).unwrap().output("Y");

        let circuit = builder.borrow().snapshot(&y).unwrap();
        let validated = validate(&circuit, &bounds).unwrap();
        let evaluator = Evaluator::from_validated(&circuit, &validated);
        let generated = generate(&evaluator, &circuit.inputs(), "Y");
        assert!(generated.is_usable());
        for (i, row) in generated.table.rows.iter().enumerate() {
            assert_eq!(row.get("Y"), Some(i.count_ones() % 2 == 1), "row {i}");
        }
    }

    #[test]
    fn narrow_fan_in_builds_deeper_tree() {
        let builder = BoardBuilder::shared();
        let inputs: Vec<_> = (0..4)
            .map(|i| Connector::input(builder.clone(), &format!("I{i}")))
            .collect();
        let bounds = ArityBounds {
            max_fan_in: 2,
            ..ArityBounds::default()
        };
        parity(&inputs, &bounds).unwrap().output("Y");
        assert_eq!(builder.borrow().board.nodes.len(), 4 + 3 + 1);
    }

    #[test]
    fn empty_and_single() {
        let builder = BoardBuilder::shared();
        assert!(parity::<crate::builder::NoHooks>(&[], &ArityBounds::default()).is_none());
        let a = Connector::input(builder.clone(), "A");
        let single = parity(&[a.clone()], &ArityBounds::default()).unwrap();
        assert_eq!(single.id, a.id);
    }
}
