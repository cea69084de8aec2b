mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lotto_db::db::{count_batches, db_path, fetch_last_batches, insert_batch, migrate, open_db};
use lotto_db::export::{append_batch_csv, csv_path};
use lotto_db::models::{parse_draw, validate_draw, CombinationBatch, MatchScore, Pool};
use lotto_db::RulesTable;
use lotto_engine::analysis::promising_numbers;
use lotto_engine::rigged::rigged_batch;
use lotto_engine::simulation::simulate;
use lotto_engine::{compute_frequencies, fair_batch, generate_draw, score_batch, seeded_rng};
use crate::display::{
    display_candidates, display_frequencies, display_frequency_chart, display_history,
    display_mode_banner, display_promising, display_real_draw, display_rule, display_rules,
    display_saved, display_simulation,
};

#[derive(Parser)]
#[command(name = "lotto", about = "Assistant loto : combinaisons aléatoires et statistiques")]
struct Cli {
    /// Fichier JSON de règles (remplace la table intégrée)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lister les jeux disponibles
    Rules,

    /// Générer des combinaisons et les comparer à un tirage
    Generate {
        /// Nom du jeu (ex: "Mega Millions")
        #[arg(short, long)]
        lottery: String,

        /// Nombre de combinaisons
        #[arg(short, long, default_value = "6")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Tirage réel imposé, ex: "7 23 16 22 36 + 11" (aléatoire sinon)
        #[arg(long)]
        real: Option<String>,

        /// DÉMO TRUQUÉE : nombre de combinaisons gagnantes fabriquées
        #[arg(long, value_name = "GAGNANTS")]
        rigged: Option<usize>,

        /// Ne rien enregistrer (ni CSV ni historique)
        #[arg(long)]
        no_save: bool,

        /// Fichier CSV de résultats
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Simuler de nombreux lots équitables et compter les gains
    Simulate {
        /// Nom du jeu
        #[arg(short, long)]
        lottery: String,

        /// Nombre de lots
        #[arg(short, long, default_value = "1000")]
        rounds: usize,

        /// Combinaisons par lot
        #[arg(short, long, default_value = "6")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Lister les derniers lots enregistrés
    History {
        /// Nombre de lots à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher le chemin de la base de données
    DbPath,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let rules = load_rules(cli.rules.as_deref())?;

    match cli.command {
        Command::Rules => {
            display_rules(&rules);
            Ok(())
        }
        Command::Generate {
            lottery,
            count,
            seed,
            real,
            rigged,
            no_save,
            csv,
        } => cmd_generate(&rules, &lottery, count, seed, real.as_deref(), rigged, no_save, csv),
        Command::Simulate {
            lottery,
            rounds,
            count,
            seed,
        } => cmd_simulate(&rules, &lottery, rounds, count, seed),
        Command::History { last } => cmd_history(last),
        Command::DbPath => {
            println!("{}", db_path().display());
            Ok(())
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn load_rules(path: Option<&Path>) -> Result<RulesTable> {
    match path {
        Some(p) => RulesTable::load(p),
        None => Ok(RulesTable::builtin()),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    rules: &RulesTable,
    lottery: &str,
    count: usize,
    seed: Option<u64>,
    real: Option<&str>,
    rigged: Option<usize>,
    no_save: bool,
    csv: Option<PathBuf>,
) -> Result<()> {
    let rule = rules.get(lottery)?;
    display_rule(rule);

    let mut rng = seeded_rng(seed);

    let real = match real {
        Some(raw) => {
            let draw = parse_draw(raw)?;
            validate_draw(rule, &draw).context("Tirage réel invalide")?;
            draw
        }
        None => generate_draw(rule, &mut rng),
    };

    let batch = match rigged {
        Some(winners) => {
            warn!(lottery = %rule.name, winners, "Rigged generation requested");
            rigged_batch(rule, real, count, winners, &mut rng)
        }
        None => fair_batch(rule, real, count, &mut rng),
    };

    let scores = score_batch(&batch);
    let (main_freq, extra_freq) = compute_frequencies(&batch);

    display_mode_banner(batch.mode);
    display_real_draw(rule, &batch);
    display_candidates(rule, &batch, &scores);

    display_frequencies(rule, Pool::Main, &main_freq);
    display_frequency_chart(rule, Pool::Main, &main_freq);
    if rule.has_extra() {
        display_frequencies(rule, Pool::Extra, &extra_freq);
    }

    let (top_main, top_extra) = promising_numbers(rule, &main_freq, &extra_freq);
    display_promising(rule, &top_main, &top_extra);

    if no_save {
        return Ok(());
    }

    let csv = csv.unwrap_or_else(csv_path);
    let (batch_id, rows) = save_batch(&db_path(), &csv, &batch, &scores)?;
    display_saved(batch_id, rows, &csv);
    Ok(())
}

/// CSV d'abord : un échec d'écriture n'enregistre rien dans l'historique.
fn save_batch(
    db: &Path,
    csv: &Path,
    batch: &CombinationBatch,
    scores: &[MatchScore],
) -> Result<(i64, usize)> {
    let generated_at = Local::now();
    let rows = append_batch_csv(csv, batch, scores, &generated_at)?;

    let conn = open_db(db)?;
    migrate(&conn)?;
    let batch_id = insert_batch(&conn, batch, scores, &generated_at).with_context(|| {
        format!("{} lignes déjà ajoutées à {:?}, historique non mis à jour", rows, csv)
    })?;
    Ok((batch_id, rows))
}

fn cmd_simulate(
    rules: &RulesTable,
    lottery: &str,
    rounds: usize,
    count: usize,
    seed: Option<u64>,
) -> Result<()> {
    let rule = rules.get(lottery)?;
    let mut rng = seeded_rng(seed);

    info!(lottery = %rule.name, rounds, count, "Starting simulation");

    let pb = ProgressBar::new(rounds as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("=> "));
    pb.set_message(rule.name.clone());

    let tally = simulate(rule, rounds, count, &mut rng, |_| pb.inc(1));

    pb.finish_with_message("Simulation terminée");

    display_simulation(rule, &tally);
    Ok(())
}

fn cmd_history(last: u32) -> Result<()> {
    let conn = open_db(&db_path())?;
    migrate(&conn)?;
    let n = count_batches(&conn)?;
    if n == 0 {
        println!("Historique vide. Lancez d'abord : lotto generate --lottery <JEU>");
        return Ok(());
    }
    let entries = fetch_last_batches(&conn, last)?;
    display_history(&entries);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::models::Draw;

    fn small_batch() -> (CombinationBatch, Vec<MatchScore>) {
        let rule = RulesTable::builtin().get("UK Lotto").unwrap().clone();
        let mut rng = seeded_rng(Some(3));
        let real = Draw::new(vec![1, 2, 3, 4, 5, 6], vec![]);
        let batch = fair_batch(&rule, real, 3, &mut rng);
        let scores = score_batch(&batch);
        (batch, scores)
    }

    #[test]
    fn test_save_batch_writes_csv_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("lotto.db");
        let csv = dir.path().join("results.csv");
        let (batch, scores) = small_batch();

        let (id, rows) = save_batch(&db, &csv, &batch, &scores).unwrap();
        assert_eq!(rows, 3);
        assert!(id > 0);
        let conn = open_db(&db).unwrap();
        assert_eq!(count_batches(&conn).unwrap(), 1);
    }

    #[test]
    fn test_csv_failure_leaves_history_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("lotto.db");
        // Un répertoire à la place du fichier CSV : l'ajout échoue
        let csv = dir.path().join("results.csv");
        std::fs::create_dir(&csv).unwrap();
        let (batch, scores) = small_batch();

        assert!(save_batch(&db, &csv, &batch, &scores).is_err());
        assert!(!db.exists());
    }
}
