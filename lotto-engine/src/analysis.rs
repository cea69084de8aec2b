use std::collections::{BTreeMap, BTreeSet};

use lotto_db::models::{CombinationBatch, Draw, LotteryRule, MatchScore, Pool};

/// Nombre de numéros principaux « prometteurs » affichés.
pub const PROMISING_MAIN: usize = 5;

/// Nombre de complémentaires « prometteurs » pour les jeux qui en ont.
pub const PROMISING_EXTRA: usize = 2;

/// Occurrences par numéro. Map ordonnée : l'itération suit l'ordre des numéros,
/// le classement passe toujours par [`top_k`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u32>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, number: u8) {
        *self.counts.entry(number).or_insert(0) += 1;
    }

    pub fn count(&self, number: u8) -> u32 {
        self.counts.get(&number).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts.iter().map(|(&n, &c)| (n, c))
    }
}

impl FromIterator<u8> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for n in iter {
            table.record(n);
        }
        table
    }
}

fn intersection_size(a: &[u8], b: &[u8]) -> usize {
    let a: BTreeSet<u8> = a.iter().copied().collect();
    let b: BTreeSet<u8> = b.iter().copied().collect();
    a.intersection(&b).count()
}

pub fn score_match(candidate: &Draw, real: &Draw) -> MatchScore {
    MatchScore {
        main_matches: intersection_size(&candidate.main, &real.main),
        extra_matches: intersection_size(&candidate.extra, &real.extra),
    }
}

/// Scores dans l'ordre des candidats.
pub fn score_batch(batch: &CombinationBatch) -> Vec<MatchScore> {
    batch
        .candidates
        .iter()
        .map(|c| score_match(c, &batch.real))
        .collect()
}

pub fn pool_frequencies(batch: &CombinationBatch, pool: Pool) -> FrequencyTable {
    batch
        .candidates
        .iter()
        .flat_map(|c| pool.numbers_from(c).iter().copied())
        .collect()
}

/// Fréquences des numéros principaux et complémentaires des candidats.
/// Le tirage réel n'est pas compté.
pub fn compute_frequencies(batch: &CombinationBatch) -> (FrequencyTable, FrequencyTable) {
    (
        pool_frequencies(batch, Pool::Main),
        pool_frequencies(batch, Pool::Extra),
    )
}

/// Classement par fréquence décroissante, ex aequo par numéro croissant.
pub fn top_k(table: &FrequencyTable, k: usize) -> Vec<(u8, u32)> {
    let mut ranked: Vec<(u8, u32)> = table.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked
}

/// Numéros les plus fréquents du lot : cinq principaux et deux
/// complémentaires (aucun si le jeu n'en a pas).
pub fn promising_numbers(
    rule: &LotteryRule,
    main: &FrequencyTable,
    extra: &FrequencyTable,
) -> (Vec<(u8, u32)>, Vec<(u8, u32)>) {
    let extra_k = if rule.has_extra() { PROMISING_EXTRA } else { 0 };
    (top_k(main, PROMISING_MAIN), top_k(extra, extra_k))
}
