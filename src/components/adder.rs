use std::{cell::RefCell, rc::Rc};

use crate::builder::{ops::*, BoardBuilder, BuilderHooks, Connector};

pub struct Adder<T: BuilderHooks> {
    pub sum: Connector<T>,
    pub carry: Connector<T>,
}

pub fn half_adder<T: BuilderHooks>(a: &Connector<T>, b: &Connector<T>) -> Adder<T> {
    let sum = xor!(*a, *b);
    let carry = and!(*a, *b);
    Adder { sum, carry }
}

pub fn full_adder<T: BuilderHooks>(
    a: &Connector<T>,
    b: &Connector<T>,
    cin: &Connector<T>,
) -> Adder<T> {
    let sum = xor!(*a, *b, *cin);
    let carry = or!(and!(*a, *b), and!(*a, *cin), and!(*b, *cin));
    Adder { sum, carry }
}

/// Chain of full adders. Bit 0 is the least significant; every sum bit and
/// the final carry end in a labelled output node.
pub struct RippleCarryAdder {
    pub input_a: Vec<String>,
    pub input_b: Vec<String>,
    pub cin: String,
    pub sum: Vec<String>,
    pub cout: String,
}

impl RippleCarryAdder {
    pub fn new(builder: &Rc<RefCell<BoardBuilder>>, bits: usize) -> Self {
        let cin = Connector::input(builder.clone(), "Cin");
        let mut rca = RippleCarryAdder {
            input_a: Vec::with_capacity(bits),
            input_b: Vec::with_capacity(bits),
            cin: cin.id.clone(),
            sum: Vec::with_capacity(bits),
            cout: String::new(),
        };

        let mut carry = cin;
        for i in 0..bits {
            let a = Connector::input(builder.clone(), &format!("A{i}"));
            let b = Connector::input(builder.clone(), &format!("B{i}"));
            rca.input_a.push(a.id.clone());
            rca.input_b.push(b.id.clone());
            let Adder { sum, carry: cout } = full_adder(&a, &b, &carry);
            rca.sum.push(sum.output(&format!("S{i}")).id);
            carry = cout;
        }
        rca.cout = carry.output("Cout").id;
        rca
    }
}

#[cfg(test)]
mod test {
    use rand::RngCore;

    use super::*;
    use crate::{
        circuit::{Circuit, NodeIdx},
        eval::Evaluator,
        truth_table::generate,
    };

    fn idx(circuit: &Circuit, id: &str) -> NodeIdx {
        circuit.idx(id).unwrap()
    }

    #[test]
    fn half_adder_table() {
        let builder = BoardBuilder::shared();
        let a = Connector::input(builder.clone(), "A");
        let b = Connector::input(builder.clone(), "B");
        let Adder { sum, carry } = half_adder(&a, &b);
        let carry = carry.output("C");
        let sum = sum.output("S");

        let circuit = builder.borrow().board.snapshot(&sum.id).unwrap();
        let evaluator = Evaluator::new(&circuit).unwrap();
        let sums = generate(&evaluator, &circuit.inputs(), "S");
        let sums: Vec<_> = sums.table.rows.iter().map(|row| row.get("S")).collect();
        assert_eq!(sums, [Some(false), Some(true), Some(true), Some(false)]);

        let carry = idx(&circuit, &carry.id);
        for (a_val, b_val) in [(false, false), (false, true), (true, false), (true, true)] {
            let values = evaluator.evaluate(&[
                (idx(&circuit, &a.id), a_val),
                (idx(&circuit, &b.id), b_val),
            ]);
            assert_eq!(values.value(carry), a_val && b_val);
        }
    }

    fn test_adder(a: bool, b: bool, cin: bool) {
        let builder = BoardBuilder::shared();
        let ca = Connector::input(builder.clone(), "A");
        let cb = Connector::input(builder.clone(), "B");
        let ccin = Connector::input(builder.clone(), "Cin");
        let adder = full_adder(&ca, &cb, &ccin);
        let sum = adder.sum.output("S");
        let carry = adder.carry.output("C");

        let circuit = builder.borrow().snapshot(&sum).unwrap();
        let values = Evaluator::new(&circuit).unwrap().evaluate(&[
            (idx(&circuit, &ca.id), a),
            (idx(&circuit, &cb.id), b),
            (idx(&circuit, &ccin.id), cin),
        ]);
        assert!(values.is_success());
        assert_eq!(values.value(idx(&circuit, &sum.id)), a ^ b ^ cin);
        assert_eq!(
            values.value(idx(&circuit, &carry.id)),
            (a && b) || (a && cin) || (b && cin)
        );
    }

    #[test]
    fn adder_tests() {
        test_adder(false, false, false);
        test_adder(true, false, false);
        test_adder(false, true, false);
        test_adder(true, true, false);
        test_adder(false, false, true);
        test_adder(true, false, true);
        test_adder(false, true, true);
        test_adder(true, true, true);
    }

    fn test_rca_add(evaluator: &Evaluator, rca: &RippleCarryAdder, bits: usize, a: u64, b: u64) {
        let circuit = evaluator.circuit();
        let overflow = 1 << bits;
        assert!(a < overflow && b < overflow);

        let mut inputs = vec![(idx(circuit, &rca.cin), false)];
        for i in 0..bits {
            inputs.push((idx(circuit, &rca.input_a[i]), (a & (1 << i)) != 0));
            inputs.push((idx(circuit, &rca.input_b[i]), (b & (1 << i)) != 0));
        }
        let values = evaluator.evaluate(&inputs);

        let expected_sum = a + b;
        let (expected_sum, expected_cout) = if expected_sum < overflow {
            (expected_sum, false)
        } else {
            (expected_sum - overflow, true)
        };

        let mut sum = 0;
        for i in 0..bits {
            if values.value(idx(circuit, &rca.sum[i])) {
                sum += 1 << i;
            }
        }
        let cout = values.value(idx(circuit, &rca.cout));

        assert_eq!(sum, expected_sum, "{a} + {b} = {expected_sum}");
        assert_eq!(
            cout, expected_cout,
            "{a} + {b} with {bits} bits has cout: {expected_cout}"
        );
    }

    #[test]
    fn rca_tests() {
        let builder = BoardBuilder::shared();
        let rca = RippleCarryAdder::new(&builder, 16);
        let circuit = builder.borrow().board.snapshot(&rca.cout).unwrap();
        let evaluator = Evaluator::new(&circuit).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let a = rng.next_u32() as u16;
            let b = rng.next_u32() as u16;
            test_rca_add(&evaluator, &rca, 16, a as u64, b as u64);
        }
    }
}
