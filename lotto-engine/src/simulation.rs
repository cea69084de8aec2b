use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use lotto_db::models::{LotteryRule, MatchScore};

use crate::analysis::score_batch;
use crate::sampler::{fair_batch, generate_draw};

/// Répartition des candidats par nombre de numéros trouvés.
#[derive(Debug, Clone, Default)]
pub struct MatchTally {
    counts: BTreeMap<(usize, usize), u64>,
    rounds: usize,
    candidates: u64,
    jackpots: u64,
}

impl MatchTally {
    pub fn record(&mut self, score: MatchScore, jackpot: bool) {
        *self
            .counts
            .entry((score.main_matches, score.extra_matches))
            .or_insert(0) += 1;
        self.candidates += 1;
        if jackpot {
            self.jackpots += 1;
        }
    }

    pub fn count(&self, main_matches: usize, extra_matches: usize) -> u64 {
        self.counts
            .get(&(main_matches, extra_matches))
            .copied()
            .unwrap_or(0)
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn candidates(&self) -> u64 {
        self.candidates
    }

    pub fn jackpots(&self) -> u64 {
        self.jackpots
    }

    /// Du meilleur résultat au pire.
    pub fn rows(&self) -> Vec<((usize, usize), u64)> {
        self.counts.iter().rev().map(|(&k, &v)| (k, v)).collect()
    }
}

/// Joue `rounds` lots équitables de `count` candidats, chacun contre un
/// nouveau tirage réel. `on_round` est appelé après chaque lot.
pub fn simulate<R, F>(
    rule: &LotteryRule,
    rounds: usize,
    count: usize,
    rng: &mut R,
    mut on_round: F,
) -> MatchTally
where
    R: Rng + ?Sized,
    F: FnMut(usize),
{
    let mut tally = MatchTally::default();
    for round in 0..rounds {
        let real = generate_draw(rule, rng);
        let batch = fair_batch(rule, real, count, rng);
        for score in score_batch(&batch) {
            tally.record(score, score.is_jackpot(&batch.real));
        }
        tally.rounds += 1;
        on_round(round + 1);
    }
    debug!(lottery = %rule.name, rounds, candidates = tally.candidates, jackpots = tally.jackpots, "Simulation finished");
    tally
}
