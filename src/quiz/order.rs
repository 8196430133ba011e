use once_cell::sync::Lazy;
use rand::Rng;

use crate::quiz::ANSWERS_PER_QUESTION;

/// 4! display orders for the 4 answer slots.
pub const ORDER_COUNT: usize = 24;

/// Seeds are drawn from 0..16 even though the table has 24 entries, so only
/// the first 16 orders ever show up. Existing sessions store raw seeds, so
/// widening the range would reshuffle answers under people mid-quiz.
pub const SEED_RANGE: usize = 16;

static ORDERS: Lazy<Vec<[usize; ANSWERS_PER_QUESTION]>> = Lazy::new(build_orders);

// All permutations of [0, 1, 2, 3], in lexicographic order.
fn build_orders() -> Vec<[usize; ANSWERS_PER_QUESTION]> {
    let mut orders = Vec::with_capacity(ORDER_COUNT);
    for a in 0..ANSWERS_PER_QUESTION {
        for b in 0..ANSWERS_PER_QUESTION {
            for c in 0..ANSWERS_PER_QUESTION {
                if b == a || c == a || c == b {
                    continue;
                }
                // The one index not taken by a, b or c.
                let d = 6 - a - b - c;
                orders.push([a, b, c, d]);
            }
        }
    }
    return orders;
}

pub fn all_orders() -> &'static [[usize; ANSWERS_PER_QUESTION]] {
    &ORDERS
}

/// Display order for a stored seed.
pub fn order_for(seed: usize) -> [usize; ANSWERS_PER_QUESTION] {
    all_orders()[seed]
}

/// Fresh seed for a question, drawn once per session.
pub fn random_seed() -> usize {
    rand::thread_rng().gen_range(0..SEED_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_all_24_orders_in_lexicographic_order() {
        let orders = all_orders();
        assert_eq!(orders.len(), ORDER_COUNT);
        assert_eq!(orders[0], [0, 1, 2, 3]);
        assert_eq!(orders[ORDER_COUNT - 1], [3, 2, 1, 0]);
        for pair in orders.windows(2) {
            assert!(pair[0] < pair[1], "{:?} not before {:?}", pair[0], pair[1]);
        }
        for order in orders {
            let mut sorted = *order;
            sorted.sort();
            assert_eq!(sorted, [0, 1, 2, 3]);
        }
    }

    #[test]
    fn table_is_stable_across_calls() {
        assert_eq!(all_orders().as_ptr(), all_orders().as_ptr());
        assert_eq!(order_for(7), order_for(7));
    }

    #[test]
    fn seeds_stay_in_the_restricted_range() {
        // Only the first 16 of the 24 orders are reachable through
        // random_seed. That restriction is load-bearing for stored sessions.
        for _ in 0..1000 {
            let seed = random_seed();
            assert!(seed < SEED_RANGE, "seed {} out of range", seed);
            order_for(seed);
        }
    }

    #[test]
    fn every_seed_in_range_resolves() {
        for seed in 0..SEED_RANGE {
            let order = order_for(seed);
            let mut sorted = order;
            sorted.sort();
            assert_eq!(sorted, [0, 1, 2, 3]);
        }
    }
}
