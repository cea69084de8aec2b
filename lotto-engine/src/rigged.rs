//! Génération truquée, réservée aux démonstrations.
//!
//! Les candidats sont fabriqués à partir du tirage réel : une partie le
//! reproduit exactement, le reste le frôle. Ce module n'est jamais appelé par
//! le chemin équitable de [`crate::sampler`].

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use lotto_db::models::{CombinationBatch, Draw, GenerationMode, LotteryRule};

use crate::sampler::{sample_distinct, sample_from};

/// Taille du recouvrement avec le tirage réel pour un candidat perdant :
/// de 2 à `main_count - 1`, resserré quand `main_count < 3`.
fn overlap_bounds(main_count: usize) -> (usize, usize) {
    let hi = main_count.saturating_sub(1);
    (hi.min(2), hi)
}

fn near_miss<R: Rng + ?Sized>(rule: &LotteryRule, real: &Draw, rng: &mut R) -> Draw {
    let main_count = rule.main_count as usize;
    let (lo, hi) = overlap_bounds(main_count);
    let overlap = rng.random_range(lo..=hi).min(real.main.len());

    let mut main = sample_from(&real.main, overlap, rng);
    let needed = main_count - main.len();

    let outside: Vec<u8> = (1..=rule.main_range)
        .filter(|n| !real.main.contains(n))
        .collect();
    // Pool trop petit hors du tirage réel : on complète hors du recouvrement
    let pool = if outside.len() >= needed {
        outside
    } else {
        (1..=rule.main_range).filter(|n| !main.contains(n)).collect()
    };
    main.extend(sample_from(&pool, needed, rng));

    // Complémentaire indépendant du tirage réel
    let extra = sample_distinct(rule.extra_range, rule.extra_count, rng);
    Draw::new(main, extra)
}

/// Produit `guaranteed_winners` permutations gagnantes de `real` et
/// `count - guaranteed_winners` quasi-gagnants, dans un ordre aléatoire.
/// `guaranteed_winners` est ramené à `count` s'il le dépasse.
pub fn generate_biased_combinations<R: Rng + ?Sized>(
    rule: &LotteryRule,
    real: &Draw,
    count: usize,
    guaranteed_winners: usize,
    rng: &mut R,
) -> Vec<Draw> {
    let winners = guaranteed_winners.min(count);
    if winners < guaranteed_winners {
        warn!(requested = guaranteed_winners, count, "Guaranteed winners clamped to batch size");
    }

    let mut candidates = Vec::with_capacity(count);
    for _ in 0..winners {
        let mut main = real.main.clone();
        main.shuffle(rng);
        candidates.push(Draw::new(main, real.extra.clone()));
    }
    for _ in winners..count {
        candidates.push(near_miss(rule, real, rng));
    }
    candidates.shuffle(rng);
    candidates
}

pub fn rigged_batch<R: Rng + ?Sized>(
    rule: &LotteryRule,
    real: Draw,
    count: usize,
    guaranteed_winners: usize,
    rng: &mut R,
) -> CombinationBatch {
    let candidates = generate_biased_combinations(rule, &real, count, guaranteed_winners, rng);
    let winners = guaranteed_winners.min(count);
    debug!(lottery = %rule.name, count, winners, "Rigged batch generated");
    CombinationBatch {
        lottery: rule.name.clone(),
        mode: GenerationMode::Rigged { guaranteed_winners: winners },
        real,
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use lotto_db::models::validate_draw;

    use crate::analysis::score_match;
    use crate::sampler::{generate_draw, seeded_rng};

    fn mega_millions() -> LotteryRule {
        LotteryRule::new("Mega Millions", 70, 5).with_extra(25, 1, "Mega Ball")
    }

    #[test]
    fn test_example_scenario_three_exact_winners() {
        let rule = mega_millions();
        let real = Draw::new(vec![7, 23, 16, 22, 36], vec![11]);
        let mut rng = seeded_rng(Some(2024));

        let candidates = generate_biased_combinations(&rule, &real, 6, 3, &mut rng);
        assert_eq!(candidates.len(), 6);

        let exact = candidates.iter().filter(|c| c.same_numbers(&real)).count();
        assert_eq!(exact, 3);
        let jackpots = candidates
            .iter()
            .filter(|c| score_match(c, &real).is_jackpot(&real))
            .count();
        assert_eq!(jackpots, 3);
    }

    #[test]
    fn test_exact_winner_count_across_seeds() {
        let rule = mega_millions();
        for seed in 0..50 {
            let mut rng = seeded_rng(Some(seed));
            let real = generate_draw(&rule, &mut rng);
            let candidates = generate_biased_combinations(&rule, &real, 6, 3, &mut rng);
            let full_main = candidates
                .iter()
                .filter(|c| score_match(c, &real).main_matches == rule.main_count as usize)
                .count();
            assert_eq!(full_main, 3, "seed {seed}");
        }
    }

    #[test]
    fn test_near_misses_overlap_bounds() {
        let rule = mega_millions();
        let real = Draw::new(vec![7, 23, 16, 22, 36], vec![11]);
        for seed in 0..50 {
            let mut rng = seeded_rng(Some(seed));
            let candidates = generate_biased_combinations(&rule, &real, 10, 0, &mut rng);
            for c in &candidates {
                let score = score_match(c, &real);
                assert!((2..=4).contains(&score.main_matches), "{:?}", score);
                assert!(validate_draw(&rule, c).is_ok());
            }
        }
    }

    #[test]
    fn test_near_miss_extra_independent_of_real() {
        let rule = mega_millions();
        let real = Draw::new(vec![7, 23, 16, 22, 36], vec![11]);
        let mut rng = seeded_rng(Some(77));
        let n = 5000;
        let candidates = generate_biased_combinations(&rule, &real, n, 0, &mut rng);

        let mut extra_hits = 0;
        let mut seen_extras = BTreeSet::new();
        for c in &candidates {
            let score = score_match(c, &real);
            assert!(score.main_matches < rule.main_count as usize, "{:?}", c);
            extra_hits += score.extra_matches;
            seen_extras.extend(c.extra.iter().copied());
        }
        // Attendu : n / 25 = 200
        assert!((120..=300).contains(&extra_hits), "extra_hits = {extra_hits}");
        assert_eq!(seen_extras.len(), rule.extra_range as usize);
    }

    #[test]
    fn test_winners_keep_real_numbers() {
        let rule = LotteryRule::new("EuroMillions", 50, 5).with_extra(12, 2, "Lucky Stars");
        let real = Draw::new(vec![3, 14, 25, 36, 47], vec![2, 9]);
        let mut rng = seeded_rng(Some(8));
        let candidates = generate_biased_combinations(&rule, &real, 4, 4, &mut rng);
        for c in &candidates {
            let main: BTreeSet<u8> = c.main.iter().copied().collect();
            let expected: BTreeSet<u8> = real.main.iter().copied().collect();
            assert_eq!(main, expected);
            assert_eq!(c.extra, real.extra);
        }
    }

    #[test]
    fn test_winners_clamped_to_count() {
        let rule = mega_millions();
        let real = Draw::new(vec![7, 23, 16, 22, 36], vec![11]);
        let mut rng = seeded_rng(Some(1));
        let batch = rigged_batch(&rule, real.clone(), 2, 5, &mut rng);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.mode, GenerationMode::Rigged { guaranteed_winners: 2 });
        assert!(batch.candidates.iter().all(|c| c.same_numbers(&real)));
    }

    #[test]
    fn test_small_main_count() {
        let rule = LotteryRule::new("Duo", 10, 2);
        let real = Draw::new(vec![4, 8], vec![]);
        let mut rng = seeded_rng(Some(4));
        let candidates = generate_biased_combinations(&rule, &real, 20, 0, &mut rng);
        for c in &candidates {
            assert_eq!(score_match(c, &real).main_matches, 1);
            assert!(c.extra.is_empty());
            assert!(validate_draw(&rule, c).is_ok());
        }
    }

    #[test]
    fn test_tight_pool_falls_back() {
        // 5/6 : impossible de compléter hors du tirage réel
        let rule = LotteryRule::new("Serré", 6, 5);
        let real = Draw::new(vec![1, 2, 3, 4, 5], vec![]);
        let mut rng = seeded_rng(Some(12));
        let candidates = generate_biased_combinations(&rule, &real, 10, 0, &mut rng);
        for c in &candidates {
            assert!(validate_draw(&rule, c).is_ok());
        }
    }

    #[test]
    fn test_overlap_bounds() {
        assert_eq!(overlap_bounds(5), (2, 4));
        assert_eq!(overlap_bounds(3), (2, 2));
        assert_eq!(overlap_bounds(2), (1, 1));
        assert_eq!(overlap_bounds(1), (0, 0));
    }
}
