use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use textplots::{Chart, Plot, Shape};

use lotto_db::db::StoredBatch;
use lotto_db::models::{join_numbers, CombinationBatch, GenerationMode, LotteryRule, MatchScore, Pool};
use lotto_db::RulesTable;
use lotto_engine::simulation::MatchTally;
use lotto_engine::FrequencyTable;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn sorted_numbers(numbers: &[u8]) -> String {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    join_numbers(&sorted, " - ")
}

pub fn display_rules(rules: &RulesTable) {
    let mut table = new_table();
    table.set_header(vec!["Jeu", "Numéros", "Complémentaires"]);

    for rule in rules.iter() {
        let extra = if rule.has_extra() {
            format!(
                "{} × {} (1-{})",
                rule.extra_count,
                rule.extra_label(),
                rule.extra_range
            )
        } else {
            "—".to_string()
        };
        table.add_row(vec![
            rule.name.clone(),
            format!("{} parmi 1-{}", rule.main_count, rule.main_range),
            extra,
        ]);
    }
    println!("{table}");
}

pub fn display_rule(rule: &LotteryRule) {
    println!("Jeu sélectionné : {}", rule.name);
    println!("  Numéros principaux : {} parmi 1 à {}", rule.main_count, rule.main_range);
    if rule.has_extra() {
        println!(
            "  {} : {} parmi 1 à {}",
            rule.extra_label(),
            rule.extra_count,
            rule.extra_range
        );
    }
}

pub fn display_mode_banner(mode: GenerationMode) {
    if let GenerationMode::Rigged { .. } = mode {
        println!("\n⚠️  Mode {} : résultats fabriqués pour la démonstration, pas un tirage équitable.", mode);
    }
}

pub fn display_real_draw(rule: &LotteryRule, batch: &CombinationBatch) {
    println!("\n🎯 Tirage\n");
    println!("  Numéros tirés : {}", sorted_numbers(&batch.real.main));
    if !batch.real.extra.is_empty() {
        println!("  {} : {}", rule.extra_label(), sorted_numbers(&batch.real.extra));
    }
}

pub fn display_candidates(rule: &LotteryRule, batch: &CombinationBatch, scores: &[MatchScore]) {
    println!("\n📝 Combinaisons générées\n");

    let mut header = vec!["#", "Numéros"];
    if rule.has_extra() {
        header.push(rule.extra_label());
    }
    header.push("Trouvés");
    let mut table = new_table();
    table.set_header(header);

    for (i, (candidate, score)) in batch.candidates.iter().zip(scores).enumerate() {
        let color = if score.is_jackpot(&batch.real) {
            Color::Green
        } else {
            Color::White
        };
        let mut row = vec![
            Cell::new(i + 1),
            Cell::new(sorted_numbers(&candidate.main)).fg(color),
        ];
        if rule.has_extra() {
            row.push(Cell::new(sorted_numbers(&candidate.extra)).fg(color));
        }
        let found = if rule.has_extra() {
            format!("{} + {}", score.main_matches, score.extra_matches)
        } else {
            score.main_matches.to_string()
        };
        row.push(Cell::new(found).fg(color));
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_frequencies(rule: &LotteryRule, pool: Pool, freq: &FrequencyTable) {
    println!("\n📈 Fréquences — {}\n", pool.label(rule));

    let mut table = new_table();
    table.set_header(vec!["Numéro", "Fréquence", ""]);

    // Tri explicite, jamais l'ordre d'insertion
    let ranked = lotto_engine::top_k(freq, freq.len());
    for (number, count) in &ranked {
        table.add_row(vec![
            format!("{:2}", number),
            count.to_string(),
            "█".repeat(*count as usize),
        ]);
    }
    println!("{table}");
}

pub fn display_frequency_chart(rule: &LotteryRule, pool: Pool, freq: &FrequencyTable) {
    let points: Vec<(f32, f32)> = (1..=pool.size(rule) as u8)
        .map(|n| (n as f32, freq.count(n) as f32))
        .collect();
    if points.is_empty() || freq.is_empty() {
        return;
    }
    let x_max = points.len() as f32 + 1.0;
    Chart::new(120, 40, 0.0, x_max)
        .lineplot(&Shape::Bars(&points))
        .display();
}

pub fn display_promising(rule: &LotteryRule, main: &[(u8, u32)], extra: &[(u8, u32)]) {
    println!("\n🔍 Numéros prometteurs\n");

    let mut table = new_table();
    table.set_header(vec!["Catégorie", "Numéro", "Fréquence"]);
    for (number, count) in main {
        table.add_row(vec![
            Pool::Main.label(rule).to_string(),
            format!("{:2}", number),
            count.to_string(),
        ]);
    }
    for (number, count) in extra {
        table.add_row(vec![
            Pool::Extra.label(rule).to_string(),
            format!("{:2}", number),
            count.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_saved(batch_id: i64, csv_rows: usize, csv_path: &std::path::Path) {
    println!("\n💾 Lot #{} enregistré ({} lignes ajoutées à {})", batch_id, csv_rows, csv_path.display());
}

pub fn display_history(entries: &[StoredBatch]) {
    if entries.is_empty() {
        println!("Aucun lot enregistré.");
        return;
    }

    let mut table = new_table();
    table.set_header(vec!["#", "Date", "Jeu", "Mode", "Tirage", "Candidats", "Meilleur", "Gagnants"]);

    for entry in entries {
        let batch = &entry.batch;
        let best = entry
            .scores
            .iter()
            .max_by_key(|s| (s.main_matches, s.extra_matches))
            .map(|s| format!("{} + {}", s.main_matches, s.extra_matches))
            .unwrap_or_else(|| "—".to_string());
        let winners = entry
            .scores
            .iter()
            .filter(|s| s.is_jackpot(&batch.real))
            .count();
        let mode_cell = match batch.mode {
            GenerationMode::Fair => Cell::new(batch.mode.to_string()),
            GenerationMode::Rigged { .. } => Cell::new(batch.mode.to_string()).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(&entry.generated_at),
            Cell::new(&batch.lottery),
            mode_cell,
            Cell::new(batch.real.to_string()),
            Cell::new(batch.len()),
            Cell::new(best),
            Cell::new(winners),
        ]);
    }
    println!("{table}");
}

pub fn display_simulation(rule: &LotteryRule, tally: &MatchTally) {
    println!(
        "\n🎲 Simulation équitable : {} lots, {} combinaisons ({})\n",
        tally.rounds(),
        tally.candidates(),
        rule.name
    );

    let mut header = vec!["Numéros trouvés"];
    if rule.has_extra() {
        header.push(rule.extra_label());
    }
    header.extend(["Combinaisons", "Part", "Fréquence"]);
    let mut table = new_table();
    table.set_header(header);

    let total = tally.candidates().max(1) as f64;
    for ((main, extra), count) in tally.rows() {
        let share = count as f64 / total;
        let mut row = vec![main.to_string()];
        if rule.has_extra() {
            row.push(extra.to_string());
        }
        row.push(count.to_string());
        row.push(format!("{:.4} %", share * 100.0));
        row.push(format!("1 sur {:.0}", 1.0 / share));
        table.add_row(row);
    }
    println!("{table}");

    let color = if tally.jackpots() > 0 { Color::Green } else { Color::Red };
    let mut summary = new_table();
    summary.set_header(vec![Cell::new(format!("Jackpots : {}", tally.jackpots())).fg(color)]);
    println!("{summary}");
}
