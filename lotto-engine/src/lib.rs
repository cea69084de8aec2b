//! Moteur de génération et d'analyse de combinaisons.
//!
//! - [`sampler`] : tirages équitables (uniformes, sans remise).
//! - [`rigged`] : génération truquée pour démonstration, jamais utilisée par défaut.
//! - [`analysis`] : correspondances avec le tirage réel, fréquences, top-K.
//! - [`simulation`] : répétition de lots équitables et distribution des gains.

pub mod analysis;
pub mod rigged;
pub mod sampler;
pub mod simulation;

pub use analysis::{compute_frequencies, score_batch, score_match, top_k, FrequencyTable};
pub use sampler::{fair_batch, generate_combinations, generate_draw, seeded_rng};
