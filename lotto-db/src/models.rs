use std::collections::BTreeSet;
use std::fmt;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// Règles d'un jeu : tailles des pools et nombre de numéros tirés.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryRule {
    pub name: String,
    pub main_range: u8,
    pub main_count: u8,
    #[serde(default)]
    pub extra_range: u8,
    #[serde(default)]
    pub extra_count: u8,
    #[serde(default)]
    pub extra_name: Option<String>,
}

impl LotteryRule {
    pub fn new(name: &str, main_range: u8, main_count: u8) -> Self {
        Self {
            name: name.to_string(),
            main_range,
            main_count,
            extra_range: 0,
            extra_count: 0,
            extra_name: None,
        }
    }

    pub fn with_extra(mut self, extra_range: u8, extra_count: u8, extra_name: &str) -> Self {
        self.extra_range = extra_range;
        self.extra_count = extra_count;
        self.extra_name = Some(extra_name.to_string());
        self
    }

    pub fn has_extra(&self) -> bool {
        self.extra_count > 0
    }

    pub fn extra_label(&self) -> &str {
        self.extra_name.as_deref().unwrap_or("Complémentaire")
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RulesError::invalid(&self.name, "nom vide"));
        }
        if self.main_range == 0 {
            return Err(RulesError::invalid(name, "main_range doit être positif"));
        }
        if self.main_count == 0 {
            return Err(RulesError::invalid(name, "main_count doit être positif"));
        }
        if self.main_count > self.main_range {
            return Err(RulesError::invalid(
                name,
                format!("main_count ({}) > main_range ({})", self.main_count, self.main_range),
            ));
        }
        if self.extra_range == 0 && self.extra_count != 0 {
            return Err(RulesError::invalid(
                name,
                format!("extra_count ({}) sans pool complémentaire", self.extra_count),
            ));
        }
        if self.extra_count > self.extra_range {
            return Err(RulesError::invalid(
                name,
                format!("extra_count ({}) > extra_range ({})", self.extra_count, self.extra_range),
            ));
        }
        Ok(())
    }
}

/// Un tirage : numéros principaux + complémentaires (vide si le jeu n'en a pas).
/// Les deux listes sont des ensembles, l'ordre n'a pas de sens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draw {
    pub main: Vec<u8>,
    pub extra: Vec<u8>,
}

impl Draw {
    pub fn new(main: Vec<u8>, extra: Vec<u8>) -> Self {
        Self { main, extra }
    }

    pub fn sorted(&self) -> Draw {
        let mut main = self.main.clone();
        main.sort_unstable();
        let mut extra = self.extra.clone();
        extra.sort_unstable();
        Draw { main, extra }
    }

    /// Égalité ensembliste, indépendante de l'ordre de tirage.
    pub fn same_numbers(&self, other: &Draw) -> bool {
        let as_set = |v: &[u8]| v.iter().copied().collect::<BTreeSet<u8>>();
        as_set(&self.main) == as_set(&other.main) && as_set(&self.extra) == as_set(&other.extra)
    }
}

impl fmt::Display for Draw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sorted = self.sorted();
        write!(f, "{}", join_numbers(&sorted.main, " - "))?;
        if !sorted.extra.is_empty() {
            write!(f, " + {}", join_numbers(&sorted.extra, " - "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Main,
    Extra,
}

impl Pool {
    pub fn size(&self, rule: &LotteryRule) -> usize {
        match self {
            Pool::Main => rule.main_range as usize,
            Pool::Extra => rule.extra_range as usize,
        }
    }

    pub fn pick_count(&self, rule: &LotteryRule) -> usize {
        match self {
            Pool::Main => rule.main_count as usize,
            Pool::Extra => rule.extra_count as usize,
        }
    }

    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> &'a [u8] {
        match self {
            Pool::Main => &draw.main,
            Pool::Extra => &draw.extra,
        }
    }

    pub fn label<'a>(&self, rule: &'a LotteryRule) -> &'a str {
        match self {
            Pool::Main => "Numéros",
            Pool::Extra => rule.extra_label(),
        }
    }
}

/// Mode de génération d'un lot. `Rigged` ne sert qu'aux démonstrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationMode {
    #[default]
    Fair,
    Rigged { guaranteed_winners: usize },
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Fair => "fair",
            GenerationMode::Rigged { .. } => "rigged",
        }
    }

    pub fn guaranteed_winners(&self) -> usize {
        match self {
            GenerationMode::Fair => 0,
            GenerationMode::Rigged { guaranteed_winners } => *guaranteed_winners,
        }
    }

    pub fn from_parts(mode: &str, guaranteed_winners: usize) -> Result<Self> {
        match mode {
            "fair" => Ok(GenerationMode::Fair),
            "rigged" => Ok(GenerationMode::Rigged { guaranteed_winners }),
            other => bail!("Mode de génération inconnu : '{}'", other),
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Fair => write!(f, "équitable"),
            GenerationMode::Rigged { guaranteed_winners } => {
                write!(f, "TRUQUÉ ({} gagnants garantis)", guaranteed_winners)
            }
        }
    }
}

/// Un lot de candidats générés pour un jeu, avec le tirage « réel » de référence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationBatch {
    pub lottery: String,
    pub mode: GenerationMode,
    pub real: Draw,
    pub candidates: Vec<Draw>,
}

impl CombinationBatch {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchScore {
    pub main_matches: usize,
    pub extra_matches: usize,
}

impl MatchScore {
    /// Vrai si tous les numéros du tirage réel sont trouvés.
    pub fn is_jackpot(&self, real: &Draw) -> bool {
        self.main_matches == real.main.len() && self.extra_matches == real.extra.len()
    }
}

pub fn validate_draw(rule: &LotteryRule, draw: &Draw) -> Result<()> {
    if draw.main.len() != rule.main_count as usize {
        bail!(
            "{} numéros attendus pour {}, {} reçus",
            rule.main_count,
            rule.name,
            draw.main.len()
        );
    }
    if draw.extra.len() != rule.extra_count as usize {
        bail!(
            "{} {} attendus pour {}, {} reçus",
            rule.extra_count,
            rule.extra_label(),
            rule.name,
            draw.extra.len()
        );
    }
    for &n in &draw.main {
        if n < 1 || n > rule.main_range {
            bail!("Numéro {} hors limites (1-{})", n, rule.main_range);
        }
    }
    for &e in &draw.extra {
        if e < 1 || e > rule.extra_range {
            bail!("{} {} hors limites (1-{})", rule.extra_label(), e, rule.extra_range);
        }
    }
    if let Some(n) = first_duplicate(&draw.main) {
        bail!("Numéro en double : {}", n);
    }
    if let Some(e) = first_duplicate(&draw.extra) {
        bail!("{} en double : {}", rule.extra_label(), e);
    }
    Ok(())
}

fn first_duplicate(numbers: &[u8]) -> Option<u8> {
    let mut seen = BTreeSet::new();
    numbers.iter().copied().find(|n| !seen.insert(*n))
}

pub fn join_numbers(numbers: &[u8], sep: &str) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Format de stockage : numéros séparés par des espaces, sans padding.
pub fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_numbers(s: &str) -> Result<Vec<u8>> {
    s.split_whitespace()
        .map(|tok| {
            tok.parse::<u8>()
                .with_context(|| format!("Impossible de parser le numéro '{}'", tok))
        })
        .collect()
}

/// Parse un tirage saisi sous la forme `"7 23 16 22 36 + 11"`.
pub fn parse_draw(s: &str) -> Result<Draw> {
    let (main, extra) = match s.split_once('+') {
        Some((main, extra)) => (main, extra),
        None => (s, ""),
    };
    let main = parse_numbers(&main.replace(',', " "))?;
    let extra = parse_numbers(&extra.replace(',', " "))?;
    if main.is_empty() {
        bail!("Aucun numéro principal dans '{}'", s.trim());
    }
    Ok(Draw { main, extra })
}
