use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

use gatecheck::{
    builder::BoardBuilder,
    components::adder::RippleCarryAdder,
    config::EngineConfig,
    eval::Evaluator,
    simulate,
    truth_table::{generate, OutputColumns},
    validate::validate,
    Board, GateKind, Node, Position, Wire,
};

/// `layers` columns of `width` gates, each fed by two or three neighbouring
/// nodes of the previous column, all summed into the output by an OR tree.
/// Every node ends up on a path to the output.
fn layered_board(rng: &mut StdRng, inputs: usize, layers: usize, width: usize) -> Board {
    let mut board = Board::default();
    let mut previous: Vec<String> = (0..inputs)
        .map(|i| {
            let id = format!("in{i}");
            board.nodes.push(
                Node::input(id.clone(), Position::new(0.0, i as f64)).with_label(format!("I{i}")),
            );
            id
        })
        .collect();

    for layer in 0..layers {
        let x = 100.0 * (layer + 1) as f64;
        let mut current = Vec::with_capacity(width);
        for g in 0..width {
            let id = format!("g{layer}-{g}");
            let kind = [GateKind::And, GateKind::Or, GateKind::Xor][rng.gen_range(0..3)];
            board
                .nodes
                .push(Node::gate(id.clone(), kind, Position::new(x, g as f64)));
            let fan_in = rng.gen_range(2..=3).min(previous.len());
            for k in 0..fan_in {
                let source = &previous[(g + k) % previous.len()];
                board.wires.push(Wire::new(source.clone(), id.clone()));
            }
            current.push(id);
        }
        previous = current;
    }

    let mut layer = layers;
    while previous.len() > 1 {
        layer += 1;
        let x = 100.0 * (layer + 1) as f64;
        previous = previous
            .chunks(4)
            .enumerate()
            .map(|(g, chunk)| {
                if let [single] = chunk {
                    return single.clone();
                }
                let id = format!("or{layer}-{g}");
                board
                    .nodes
                    .push(Node::gate(id.clone(), GateKind::Or, Position::new(x, g as f64)));
                for source in chunk {
                    board.wires.push(Wire::new(source.clone(), id.clone()));
                }
                id
            })
            .collect();
    }

    let x = 100.0 * (layer + 2) as f64;
    board.nodes.push(Node::output("y", Position::new(x, 0.0)));
    board.wires.push(Wire::new(previous[0].clone(), "y"));
    board
}

fn truth_table_benches(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    for inputs in [4, 8, 12] {
        let board = layered_board(&mut rng, inputs, 6, 16);
        let circuit = board.snapshot("y").unwrap();
        let config = EngineConfig::default();
        let validated = validate(&circuit, &config.arity).unwrap();
        let evaluator = Evaluator::from_validated(&circuit, &validated);
        let input_ids = circuit.inputs();
        println!("{} nodes, {} wires", circuit.num_nodes(), circuit.links().len());

        c.bench_function(&format!("{inputs}-input truth table"), |b| {
            b.iter(|| generate(&evaluator, &input_ids, &config.output_label))
        });

        let target = generate(&evaluator, &input_ids, &config.output_label).table;
        c.bench_function(&format!("{inputs}-input simulate"), |b| {
            b.iter(|| {
                simulate(
                    &circuit,
                    &input_ids,
                    &target,
                    &config,
                    &OutputColumns::Heuristic,
                )
            })
        });
    }
}

fn validate_benches(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let circuit = layered_board(&mut rng, 8, 32, 32).snapshot("y").unwrap();
    let config = EngineConfig::default();
    c.bench_function("validate 1K gates", |b| {
        b.iter(|| validate(&circuit, &config.arity).is_ok())
    });
}

pub fn adder_bench(c: &mut Criterion, bits: usize) {
    let name = format!("{bits}-bit adder");
    let builder = BoardBuilder::shared();
    let rca = RippleCarryAdder::new(&builder, bits);
    let circuit = builder.borrow().board.snapshot(&rca.cout).unwrap();
    let evaluator = Evaluator::new(&circuit).unwrap();
    let a: Vec<_> = circuit.resolve_inputs(&rca.input_a).unwrap();
    let b: Vec<_> = circuit.resolve_inputs(&rca.input_b).unwrap();

    c.bench_function(&name, |bench| {
        let mut rng = StdRng::from_entropy();
        bench.iter_batched(
            move || rng.next_u64(),
            |input| {
                let mut assignment = Vec::with_capacity(2 * bits);
                for i in 0..bits {
                    assignment.push((a[i], (input & (1 << i)) != 0));
                    assignment.push((b[i], (input & (1 << (i + 32))) != 0));
                }
                evaluator.evaluate(&assignment)
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn adder_benches(c: &mut Criterion) {
    adder_bench(c, 8);
    adder_bench(c, 16);
    adder_bench(c, 32);
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = truth_table_benches, validate_benches, adder_benches
}
criterion_main!(benches);
