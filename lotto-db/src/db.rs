use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use rusqlite::Connection;
use std::path::Path;
use tracing::info;

use crate::models::{format_numbers, parse_numbers, CombinationBatch, Draw, GenerationMode, MatchScore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS batches (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    generated_at        TEXT NOT NULL,
    lottery             TEXT NOT NULL,
    mode                TEXT NOT NULL,
    guaranteed_winners  INTEGER NOT NULL DEFAULT 0,
    real_main           TEXT NOT NULL,
    real_extra          TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS candidates (
    batch_id       INTEGER NOT NULL REFERENCES batches(id),
    position       INTEGER NOT NULL,
    main           TEXT NOT NULL,
    extra          TEXT NOT NULL DEFAULT '',
    main_matches   INTEGER NOT NULL,
    extra_matches  INTEGER NOT NULL,
    PRIMARY KEY (batch_id, position)
);
";

/// Lot relu depuis l'historique.
#[derive(Debug, Clone)]
pub struct StoredBatch {
    pub id: i64,
    pub generated_at: String,
    pub batch: CombinationBatch,
    pub scores: Vec<MatchScore>,
}

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotto.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

/// Enregistre un lot et ses candidats dans une seule transaction.
pub fn insert_batch(
    conn: &Connection,
    batch: &CombinationBatch,
    scores: &[MatchScore],
    generated_at: &DateTime<Local>,
) -> Result<i64> {
    if scores.len() != batch.len() {
        bail!("{} scores pour {} candidats", scores.len(), batch.len());
    }

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    tx.execute(
        "INSERT INTO batches (generated_at, lottery, mode, guaranteed_winners, real_main, real_extra)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            generated_at.to_rfc3339(),
            batch.lottery,
            batch.mode.as_str(),
            batch.mode.guaranteed_winners() as i64,
            format_numbers(&batch.real.main),
            format_numbers(&batch.real.extra),
        ],
    ).context("Échec de l'insertion du lot")?;
    let batch_id = tx.last_insert_rowid();

    for (i, (candidate, score)) in batch.candidates.iter().zip(scores).enumerate() {
        tx.execute(
            "INSERT INTO candidates (batch_id, position, main, extra, main_matches, extra_matches)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                batch_id,
                (i + 1) as i64,
                format_numbers(&candidate.main),
                format_numbers(&candidate.extra),
                score.main_matches as i64,
                score.extra_matches as i64,
            ],
        ).context("Échec de l'insertion d'un candidat")?;
    }

    tx.commit().context("Échec du commit")?;
    info!(batch_id, lottery = %batch.lottery, candidates = batch.len(), "Batch stored");
    Ok(batch_id)
}

struct BatchRow {
    id: i64,
    generated_at: String,
    lottery: String,
    mode: String,
    guaranteed_winners: i64,
    real_main: String,
    real_extra: String,
}

struct CandidateRow {
    main: String,
    extra: String,
    main_matches: i64,
    extra_matches: i64,
}

pub fn fetch_last_batches(conn: &Connection, limit: u32) -> Result<Vec<StoredBatch>> {
    let mut stmt = conn.prepare(
        "SELECT id, generated_at, lottery, mode, guaranteed_winners, real_main, real_extra
         FROM batches ORDER BY id DESC LIMIT ?1"
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok(BatchRow {
            id: row.get(0)?,
            generated_at: row.get(1)?,
            lottery: row.get(2)?,
            mode: row.get(3)?,
            guaranteed_winners: row.get(4)?,
            real_main: row.get(5)?,
            real_extra: row.get(6)?,
        })
    })?.collect::<Result<Vec<_>, _>>()?;

    let mut cand_stmt = conn.prepare(
        "SELECT main, extra, main_matches, extra_matches
         FROM candidates WHERE batch_id = ?1 ORDER BY position"
    )?;

    let mut batches = Vec::with_capacity(rows.len());
    for row in rows {
        let candidate_rows = cand_stmt.query_map([row.id], |r| {
            Ok(CandidateRow {
                main: r.get(0)?,
                extra: r.get(1)?,
                main_matches: r.get(2)?,
                extra_matches: r.get(3)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;

        let mut candidates = Vec::with_capacity(candidate_rows.len());
        let mut scores = Vec::with_capacity(candidate_rows.len());
        for c in candidate_rows {
            candidates.push(Draw::new(parse_numbers(&c.main)?, parse_numbers(&c.extra)?));
            scores.push(MatchScore {
                main_matches: c.main_matches as usize,
                extra_matches: c.extra_matches as usize,
            });
        }

        let mode = GenerationMode::from_parts(&row.mode, row.guaranteed_winners as usize)
            .with_context(|| format!("Lot {} corrompu", row.id))?;

        batches.push(StoredBatch {
            id: row.id,
            generated_at: row.generated_at,
            batch: CombinationBatch {
                lottery: row.lottery,
                mode,
                real: Draw::new(parse_numbers(&row.real_main)?, parse_numbers(&row.real_extra)?),
                candidates,
            },
            scores,
        });
    }
    Ok(batches)
}

pub fn count_batches(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM batches", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_batch(lottery: &str, mode: GenerationMode) -> (CombinationBatch, Vec<MatchScore>) {
        let batch = CombinationBatch {
            lottery: lottery.to_string(),
            mode,
            real: Draw::new(vec![7, 23, 16, 22, 36], vec![11]),
            candidates: vec![
                Draw::new(vec![7, 23, 16, 22, 36], vec![11]),
                Draw::new(vec![7, 23, 1, 2, 3], vec![4]),
            ],
        };
        let scores = vec![
            MatchScore { main_matches: 5, extra_matches: 1 },
            MatchScore { main_matches: 2, extra_matches: 0 },
        ];
        (batch, scores)
    }

    #[test]
    fn test_insert_and_count() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(count_batches(&conn).unwrap(), 0);

        let (batch, scores) = test_batch("Mega Millions", GenerationMode::Fair);
        insert_batch(&conn, &batch, &scores, &Local::now()).unwrap();
        assert_eq!(count_batches(&conn).unwrap(), 1);
    }

    #[test]
    fn test_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let mode = GenerationMode::Rigged { guaranteed_winners: 1 };
        let (batch, scores) = test_batch("Mega Millions", mode);
        let id = insert_batch(&conn, &batch, &scores, &Local::now()).unwrap();

        let stored = fetch_last_batches(&conn, 10).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].batch, batch);
        assert_eq!(stored[0].scores, scores);
    }

    #[test]
    fn test_fetch_order_and_limit() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        for name in ["A", "B", "C"] {
            let (batch, scores) = test_batch(name, GenerationMode::Fair);
            insert_batch(&conn, &batch, &scores, &Local::now()).unwrap();
        }

        let stored = fetch_last_batches(&conn, 2).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].batch.lottery, "C");
        assert_eq!(stored[1].batch.lottery, "B");
    }

    #[test]
    fn test_score_count_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let (batch, _) = test_batch("A", GenerationMode::Fair);
        assert!(insert_batch(&conn, &batch, &[], &Local::now()).is_err());
        assert_eq!(count_batches(&conn).unwrap(), 0);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(count_batches(&conn).unwrap(), 0);
    }
}
