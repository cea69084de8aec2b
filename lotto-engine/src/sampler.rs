use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::debug;

use lotto_db::models::{CombinationBatch, Draw, GenerationMode, LotteryRule};

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// `count` numéros distincts de `1..=range`, tirés uniformément sans remise.
pub(crate) fn sample_distinct<R: Rng + ?Sized>(range: u8, count: u8, rng: &mut R) -> Vec<u8> {
    if count == 0 {
        return Vec::new();
    }
    index::sample(rng, range as usize, count as usize)
        .into_iter()
        .map(|i| (i + 1) as u8)
        .collect()
}

/// `count` éléments distincts de `pool`, tirés uniformément sans remise.
pub(crate) fn sample_from<R: Rng + ?Sized>(pool: &[u8], count: usize, rng: &mut R) -> Vec<u8> {
    if count == 0 {
        return Vec::new();
    }
    index::sample(rng, pool.len(), count)
        .into_iter()
        .map(|i| pool[i])
        .collect()
}

/// Tirage équitable. La règle doit avoir été validée.
pub fn generate_draw<R: Rng + ?Sized>(rule: &LotteryRule, rng: &mut R) -> Draw {
    let main = sample_distinct(rule.main_range, rule.main_count, rng);
    let extra = sample_distinct(rule.extra_range, rule.extra_count, rng);
    Draw::new(main, extra)
}

pub fn generate_combinations<R: Rng + ?Sized>(
    rule: &LotteryRule,
    count: usize,
    rng: &mut R,
) -> Vec<Draw> {
    (0..count).map(|_| generate_draw(rule, rng)).collect()
}

/// Lot équitable : les candidats sont indépendants du tirage réel.
pub fn fair_batch<R: Rng + ?Sized>(
    rule: &LotteryRule,
    real: Draw,
    count: usize,
    rng: &mut R,
) -> CombinationBatch {
    let candidates = generate_combinations(rule, count, rng);
    debug!(lottery = %rule.name, count, "Fair batch generated");
    CombinationBatch {
        lottery: rule.name.clone(),
        mode: GenerationMode::Fair,
        real,
        candidates,
    }
}
