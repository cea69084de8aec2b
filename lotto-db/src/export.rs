use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{format_numbers, CombinationBatch, MatchScore};

pub fn csv_path() -> PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("results.csv");
    path
}

/// Une ligne du fichier plat : un candidat et le tirage réel auquel il est comparé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub generated_at: String,
    pub lottery: String,
    pub mode: String,
    pub real_main: String,
    pub real_extra: String,
    pub position: usize,
    pub main: String,
    pub extra: String,
    pub main_matches: usize,
    pub extra_matches: usize,
}

fn batch_records(
    batch: &CombinationBatch,
    scores: &[MatchScore],
    generated_at: &DateTime<Local>,
) -> Vec<ResultRecord> {
    let stamp = generated_at.to_rfc3339();
    let real = batch.real.sorted();
    batch
        .candidates
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(i, (candidate, score))| {
            let candidate = candidate.sorted();
            ResultRecord {
                generated_at: stamp.clone(),
                lottery: batch.lottery.clone(),
                mode: batch.mode.as_str().to_string(),
                real_main: format_numbers(&real.main),
                real_extra: format_numbers(&real.extra),
                position: i + 1,
                main: format_numbers(&candidate.main),
                extra: format_numbers(&candidate.extra),
                main_matches: score.main_matches,
                extra_matches: score.extra_matches,
            }
        })
        .collect()
}

/// Ajoute le lot en fin de fichier. L'en-tête n'est écrit que si le fichier
/// est nouveau ou vide. Retourne le nombre de lignes écrites.
pub fn append_batch_csv(
    path: &Path,
    batch: &CombinationBatch,
    scores: &[MatchScore],
    generated_at: &DateTime<Local>,
) -> Result<usize> {
    if scores.len() != batch.len() {
        bail!(
            "{} scores pour {} candidats",
            scores.len(),
            batch.len()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }

    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);

    let records = batch_records(batch, scores, generated_at);
    for record in &records {
        writer.serialize(record).context("Échec de l'écriture CSV")?;
    }
    writer.flush().context("Échec de l'écriture CSV")?;

    info!(path = %path.display(), rows = records.len(), lottery = %batch.lottery, "Batch appended to CSV");
    Ok(records.len())
}
