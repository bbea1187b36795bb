use serde::{Deserialize, Serialize};

use crate::scenario::Constraints;

const DEFAULT_MAX_GATES: usize = 10;
const DEFAULT_TIME_SECS: u64 = 180;

/// Counters tracked by the session, outside the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    pub gates_used: usize,
    pub elapsed_secs: u64,
    pub hints_used: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub stars: u8,
    pub score: u64,
}

/// Three stars, minus one for each of: going over the gate budget, going
/// over the time budget, using a hint. Never below one.
pub fn rate(constraints: &Constraints, usage: &Usage) -> Rating {
    let max_gates = constraints.max_gates.unwrap_or(DEFAULT_MAX_GATES);
    let time_secs = constraints.time_sec.unwrap_or(DEFAULT_TIME_SECS);

    let mut stars: u8 = 3;
    if usage.gates_used > max_gates {
        stars -= 1;
    }
    if usage.elapsed_secs > time_secs {
        stars -= 1;
    }
    if usage.hints_used > 0 {
        stars -= 1;
    }
    let stars = stars.max(1);

    let score = (100 + 50 * u64::from(stars)).saturating_sub(usage.elapsed_secs);
    Rating { stars, score }
}

#[cfg(test)]
mod test {
    use super::*;

    fn constraints() -> Constraints {
        Constraints {
            max_gates: Some(1),
            max_wires: Some(3),
            time_sec: Some(60),
        }
    }

    #[test]
    fn perfect_run() {
        let usage = Usage {
            gates_used: 1,
            elapsed_secs: 20,
            hints_used: 0,
        };
        assert_eq!(
            rate(&constraints(), &usage),
            Rating {
                stars: 3,
                score: 230
            }
        );
    }

    #[test]
    fn penalties_floor_at_one_star() {
        let usage = Usage {
            gates_used: 2,
            elapsed_secs: 61,
            hints_used: 1,
        };
        let rating = rate(&constraints(), &usage);
        assert_eq!(rating.stars, 1);
        assert_eq!(rating.score, 89);
    }

    #[test]
    fn defaults_apply_without_constraints() {
        let usage = Usage {
            gates_used: 10,
            elapsed_secs: 181,
            hints_used: 0,
        };
        let rating = rate(&Constraints::default(), &usage);
        assert_eq!(rating.stars, 2);
        assert_eq!(rating.score, 19);
    }

    #[test]
    fn slow_runs_score_zero() {
        let usage = Usage {
            gates_used: 0,
            elapsed_secs: 10_000,
            hints_used: 0,
        };
        assert_eq!(rate(&Constraints::default(), &usage).score, 0);
    }
}
