//! Circle-method round-robin pairing.

/// Pairings for `count` entrants over `cycles` full round-robin cycles.
///
/// Returns one entry per round, each a list of `(home, away)` index pairs into
/// the entrant list. With an odd count a phantom entrant is added; pairings
/// against it are dropped, so that entrant sits the round out.
///
/// Index 0 stays fixed while the others rotate one step per round, which is
/// what makes every pair meet exactly once per cycle. Each cycle restarts the
/// rotation from the original order.
pub fn circle_pairings(count: usize, cycles: u32) -> Vec<Vec<(usize, usize)>> {
    if count < 2 {
        return Vec::new();
    }

    let mut initial: Vec<Option<usize>> = (0..count).map(Some).collect();
    if count % 2 == 1 {
        initial.push(None);
    }
    let slots = initial.len();

    let mut rounds = Vec::with_capacity((slots - 1) * cycles as usize);
    for _ in 0..cycles {
        let mut order = initial.clone();
        for _ in 0..slots - 1 {
            let pairs = (0..slots / 2)
                .filter_map(|i| match (order[i], order[slots - 1 - i]) {
                    (Some(home), Some(away)) => Some((home, away)),
                    _ => None,
                })
                .collect();
            rounds.push(pairs);

            if let Some(last) = order.pop() {
                order.insert(1, last);
            }
        }
    }

    rounds
}
