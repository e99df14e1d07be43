//! Winner selection.
//!
//! Implements the three allocation strategies:
//! - HighestN: largest amounts win
//! - RandomN: seeded draw of distinct bids
//! - ClosestToMeanN: amounts nearest the truncated mean win
//!
//! Every strategy returns `min(winner_count, bids.len())` winners, ordered by
//! rank (or by draw order for RandomN). Ties always go to the earlier bid.

use auction_types::{RevealedBid, SelectionStrategy};

use crate::error::SelectionError;

/// Select winners under `strategy`.
///
/// `seed` is only read by RandomN. An empty bid set yields no winners under every
/// strategy.
pub fn select_winners(
    strategy: SelectionStrategy,
    bids: &[RevealedBid],
    winner_count: u64,
    seed: &[u8],
) -> Result<Vec<RevealedBid>, SelectionError> {
    select_eligible_winners(strategy, bids, |_| true, winner_count, seed)
}

/// Select winners among the bids accepted by `eligible`.
///
/// Ineligible bids can never win, but they still count toward the
/// ClosestToMeanN mean, which is always taken over the whole of `bids`.
pub fn select_eligible_winners<F>(
    strategy: SelectionStrategy,
    bids: &[RevealedBid],
    eligible: F,
    winner_count: u64,
    seed: &[u8],
) -> Result<Vec<RevealedBid>, SelectionError>
where
    F: Fn(&RevealedBid) -> bool,
{
    let candidates: Vec<RevealedBid> = bids.iter().filter(|&bid| eligible(bid)).cloned().collect();
    let take = winner_slots(candidates.len(), winner_count);
    if take == 0 {
        return Ok(Vec::new());
    }

    match strategy {
        SelectionStrategy::HighestN => Ok(select_highest(candidates, take)),
        SelectionStrategy::RandomN => select_random(&candidates, take, seed),
        SelectionStrategy::ClosestToMeanN => Ok(select_closest_to(
            candidates,
            take,
            truncating_mean(bids),
        )),
    }
}

fn winner_slots(available: usize, winner_count: u64) -> usize {
    usize::try_from(winner_count)
        .unwrap_or(usize::MAX)
        .min(available)
}

/// Sort descending by amount. The sort is stable and the input is in arrival
/// order, so equal amounts keep the earlier bid first.
fn select_highest(mut sorted: Vec<RevealedBid>, take: usize) -> Vec<RevealedBid> {
    sorted.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then(a.origin_index.cmp(&b.origin_index))
    });
    sorted.truncate(take);
    sorted
}

/// Seeded draw of `take` distinct positions.
///
/// Position `i` is drawn from `seed[i % seed.len()] % bids.len()`; when that position
/// is already taken, the first free position scanning from 0 is used instead, so
/// the draw always completes.
fn select_random(
    bids: &[RevealedBid],
    take: usize,
    seed: &[u8],
) -> Result<Vec<RevealedBid>, SelectionError> {
    if seed.is_empty() {
        return Err(SelectionError::EmptySeed);
    }

    let mut taken = vec![false; bids.len()];
    let mut winners = Vec::with_capacity(take);

    for i in 0..take {
        let mut candidate = usize::from(seed[i % seed.len()]) % bids.len();
        if taken[candidate] {
            // take <= bids.len(), so a free slot always remains here
            candidate = taken
                .iter()
                .position(|t| !t)
                .unwrap_or(candidate);
        }
        taken[candidate] = true;
        winners.push(bids[candidate].clone());
    }

    Ok(winners)
}

/// Sort ascending by distance from `mean`.
fn select_closest_to(mut sorted: Vec<RevealedBid>, take: usize, mean: u64) -> Vec<RevealedBid> {
    sorted.sort_by(|a, b| {
        a.amount
            .abs_diff(mean)
            .cmp(&b.amount.abs_diff(mean))
            .then(a.origin_index.cmp(&b.origin_index))
    });
    sorted.truncate(take);
    sorted
}

/// Integer mean of all amounts, truncated toward zero. Zero for an empty set.
pub fn truncating_mean(bids: &[RevealedBid]) -> u64 {
    if bids.is_empty() {
        return 0;
    }
    let total: u128 = bids.iter().map(|b| u128::from(b.amount)).sum();
    // The mean of u64 values always fits in u64.
    (total / bids.len() as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn revealed(amounts: &[u64]) -> Vec<RevealedBid> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| RevealedBid {
                bidder: [i as u8; 32],
                amount,
                payment_amount: 1,
                origin_index: i,
                malformed: false,
            })
            .collect()
    }

    fn indices(winners: &[RevealedBid]) -> Vec<usize> {
        winners.iter().map(|w| w.origin_index).collect()
    }

    #[test]
    fn test_highest_n_breaks_ties_by_arrival() {
        // A=100, B=300, C=300, D=50
        let bids = revealed(&[100, 300, 300, 50]);
        let winners = select_winners(SelectionStrategy::HighestN, &bids, 2, &[]).unwrap();
        assert_eq!(indices(&winners), vec![1, 2]);
    }

    #[test]
    fn test_highest_n_more_slots_than_bids() {
        let bids = revealed(&[5, 9]);
        let winners = select_winners(SelectionStrategy::HighestN, &bids, 10, &[]).unwrap();
        assert_eq!(indices(&winners), vec![1, 0]);
    }

    #[test]
    fn test_empty_bid_set_has_no_winners() {
        for strategy in [
            SelectionStrategy::HighestN,
            SelectionStrategy::RandomN,
            SelectionStrategy::ClosestToMeanN,
        ] {
            assert!(select_winners(strategy, &[], 3, &[]).unwrap().is_empty());
        }
    }

    #[test]
    fn test_random_n_follows_seed_bytes() {
        let bids = revealed(&[1, 2, 3, 4, 5]);
        // 7 % 5 = 2, 12 % 5 = 2 (taken -> first free is 0), 4 % 5 = 4
        let winners = select_winners(SelectionStrategy::RandomN, &bids, 3, &[7, 12, 4]).unwrap();
        assert_eq!(indices(&winners), vec![2, 0, 4]);
    }

    #[test]
    fn test_random_n_wraps_seed() {
        let bids = revealed(&[1, 2, 3]);
        // Seed of length 1 repeats: 1, then 1 (taken -> 0), then 1 (taken -> 2)
        let winners = select_winners(SelectionStrategy::RandomN, &bids, 3, &[1]).unwrap();
        assert_eq!(indices(&winners), vec![1, 0, 2]);
    }

    #[test]
    fn test_random_n_rejects_empty_seed() {
        let bids = revealed(&[1]);
        assert_eq!(
            select_winners(SelectionStrategy::RandomN, &bids, 1, &[]),
            Err(SelectionError::EmptySeed)
        );
    }

    #[test]
    fn test_random_n_total_and_deterministic() {
        let mut rng = StdRng::seed_from_u64(0xA11CE);
        for _ in 0..200 {
            let len = rng.gen_range(1..40);
            let amounts: Vec<u64> = (0..len).map(|_| rng.gen_range(0..1000)).collect();
            let bids = revealed(&amounts);
            let winner_count = rng.gen_range(0..50u64);
            let mut seed = [0u8; 32];
            rng.fill(&mut seed[..]);

            let first = select_winners(SelectionStrategy::RandomN, &bids, winner_count, &seed)
                .unwrap();
            let second = select_winners(SelectionStrategy::RandomN, &bids, winner_count, &seed)
                .unwrap();

            assert_eq!(first, second);
            assert_eq!(first.len(), (winner_count as usize).min(len));
            let unique: HashSet<usize> = indices(&first).into_iter().collect();
            assert_eq!(unique.len(), first.len());
        }
    }

    #[test]
    fn test_closest_to_mean() {
        // mean = (10 + 20 + 30 + 100) / 4 = 40
        let bids = revealed(&[10, 20, 30, 100]);
        let winners =
            select_winners(SelectionStrategy::ClosestToMeanN, &bids, 2, &[]).unwrap();
        assert_eq!(indices(&winners), vec![2, 1]);
    }

    #[test]
    fn test_closest_to_mean_ties_by_arrival() {
        // mean = 20; both 10 and 30 are 10 away
        let bids = revealed(&[30, 10, 20]);
        let winners =
            select_winners(SelectionStrategy::ClosestToMeanN, &bids, 3, &[]).unwrap();
        assert_eq!(indices(&winners), vec![2, 0, 1]);
    }

    #[test]
    fn test_closest_to_mean_counts_ineligible_bids() {
        // mean over all four = 1130 / 4 = 282, so 100 is nearest even though
        // the 1000 bid itself cannot win.
        let bids = revealed(&[1000, 10, 20, 100]);
        let winners = select_eligible_winners(
            SelectionStrategy::ClosestToMeanN,
            &bids,
            |b| b.origin_index != 0,
            1,
            &[],
        )
        .unwrap();
        assert_eq!(indices(&winners), vec![3]);
    }

    #[test]
    fn test_ineligible_bids_never_win() {
        let bids = revealed(&[900, 5, 7]);
        for strategy in [
            SelectionStrategy::HighestN,
            SelectionStrategy::RandomN,
            SelectionStrategy::ClosestToMeanN,
        ] {
            let winners =
                select_eligible_winners(strategy, &bids, |b| b.amount < 900, 3, &[0, 1, 2])
                    .unwrap();
            let mut chosen = indices(&winners);
            chosen.sort_unstable();
            assert_eq!(chosen, vec![1, 2]);
        }
    }

    #[test]
    fn test_truncating_mean_large_values() {
        let bids = revealed(&[u64::MAX, u64::MAX, 1]);
        // (2 * MAX + 1) / 3 truncated
        let expected = ((2 * u128::from(u64::MAX) + 1) / 3) as u64;
        assert_eq!(truncating_mean(&bids), expected);
        assert_eq!(truncating_mean(&revealed(&[3, 4])), 3);
    }

    #[test]
    fn test_highest_n_matches_reference() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let len = rng.gen_range(0..30);
            let amounts: Vec<u64> = (0..len).map(|_| rng.gen_range(0..20)).collect();
            let bids = revealed(&amounts);
            let n = rng.gen_range(0..35u64);

            let winners = select_winners(SelectionStrategy::HighestN, &bids, n, &[]).unwrap();

            let mut reference: Vec<(u64, usize)> =
                amounts.iter().enumerate().map(|(i, &a)| (a, i)).collect();
            reference.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            let expected: Vec<usize> = reference
                .into_iter()
                .take((n as usize).min(len))
                .map(|(_, i)| i)
                .collect();
            assert_eq!(indices(&winners), expected);
        }
    }

    #[test]
    fn test_closest_to_mean_matches_reference() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let len = rng.gen_range(1..30);
            let amounts: Vec<u64> = (0..len).map(|_| rng.gen_range(0..500)).collect();
            let bids = revealed(&amounts);
            let n = rng.gen_range(1..35u64);

            let mean = amounts.iter().sum::<u64>() / len as u64;
            let winners =
                select_winners(SelectionStrategy::ClosestToMeanN, &bids, n, &[]).unwrap();

            let worst_winner = winners
                .iter()
                .map(|w| w.amount.abs_diff(mean))
                .max()
                .unwrap_or(0);
            let chosen: HashSet<usize> = indices(&winners).into_iter().collect();
            for bid in &bids {
                if !chosen.contains(&bid.origin_index) {
                    assert!(bid.amount.abs_diff(mean) >= worst_winner);
                }
            }
        }
    }
}
