use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::RulesError;
use crate::models::LotteryRule;

/// Table immuable nom de jeu -> règles. Construite une fois au démarrage,
/// puis passée par référence.
#[derive(Debug, Clone)]
pub struct RulesTable {
    rules: Vec<LotteryRule>,
}

impl RulesTable {
    /// Valide chaque règle et refuse les noms en double.
    pub fn new(rules: Vec<LotteryRule>) -> Result<Self, RulesError> {
        for (i, rule) in rules.iter().enumerate() {
            rule.validate()?;
            let duplicate = rules[..i]
                .iter()
                .any(|other| same_name(&other.name, &rule.name));
            if duplicate {
                return Err(RulesError::invalid(&rule.name, "nom en double"));
            }
        }
        Ok(Self { rules })
    }

    /// Jeux connus de l'application d'origine.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                LotteryRule::new("Mega Millions", 70, 5).with_extra(25, 1, "Mega Ball"),
                LotteryRule::new("UK Lotto", 59, 6),
                LotteryRule::new("Australian Powerball", 35, 7).with_extra(20, 1, "Powerball"),
                LotteryRule::new("New Zealand Lotto", 40, 6).with_extra(40, 1, "Bonus Ball"),
                LotteryRule::new("Lotto 6/49", 49, 6).with_extra(49, 1, "Bonus Number"),
                LotteryRule::new("Lotto Max", 50, 7),
                LotteryRule::new("EuroMillions", 50, 5).with_extra(12, 2, "Lucky Stars"),
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let rules: Vec<LotteryRule> =
            serde_json::from_str(json).context("Fichier de règles mal formé")?;
        Ok(Self::new(rules)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire les règles {:?}", path))?;
        let table = Self::from_json(&json)
            .with_context(|| format!("Règles invalides dans {:?}", path))?;
        debug!(path = %path.display(), games = table.len(), "Rules table loaded");
        Ok(table)
    }

    /// Recherche insensible à la casse et aux espaces autour du nom.
    pub fn get(&self, name: &str) -> Result<&LotteryRule, RulesError> {
        self.rules
            .iter()
            .find(|rule| same_name(&rule.name, name))
            .ok_or_else(|| RulesError::UnknownLottery(name.trim().to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LotteryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RulesTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_are_valid() {
        let table = RulesTable::builtin();
        assert_eq!(table.len(), 7);
        for rule in table.iter() {
            assert!(rule.validate().is_ok(), "{} invalide", rule.name);
        }
        // La construction validée accepte la table intégrée
        assert!(RulesTable::new(table.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn test_builtin_order_preserved() {
        let table = RulesTable::builtin();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names.first(), Some(&"Mega Millions"));
        assert_eq!(names.last(), Some(&"EuroMillions"));
    }

    #[test]
    fn test_lookup() {
        let table = RulesTable::builtin();
        let rule = table.get("EuroMillions").unwrap();
        assert_eq!(rule.main_range, 50);
        assert_eq!(rule.extra_count, 2);
        assert_eq!(rule.extra_label(), "Lucky Stars");

        let rule = table.get("  mega millions ").unwrap();
        assert_eq!(rule.main_range, 70);
    }

    #[test]
    fn test_unknown_lottery() {
        let table = RulesTable::builtin();
        assert_eq!(
            table.get("Loto Foot").unwrap_err(),
            RulesError::UnknownLottery("Loto Foot".to_string())
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"name": "Mini", "main_range": 10, "main_count": 3},
            {"name": "Avec bonus", "main_range": 30, "main_count": 4,
             "extra_range": 5, "extra_count": 1, "extra_name": "Bonus"}
        ]"#;
        let table = RulesTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        let mini = table.get("mini").unwrap();
        assert_eq!(mini.extra_range, 0);
        assert!(!mini.has_extra());
        assert!(table.get("Avec bonus").unwrap().has_extra());
    }

    #[test]
    fn test_from_json_invalid_rule_fails_at_load() {
        let json = r#"[{"name": "Cassé", "main_range": 5, "main_count": 6}]"#;
        let err = RulesTable::from_json(json).unwrap_err();
        let rules_err = err.downcast_ref::<RulesError>().unwrap();
        assert!(matches!(rules_err, RulesError::InvalidRule { .. }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let rules = vec![
            LotteryRule::new("Mini", 10, 3),
            LotteryRule::new("MINI", 20, 3),
        ];
        assert!(matches!(
            RulesTable::new(rules),
            Err(RulesError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(RulesTable::load(Path::new("/nonexistent/rules.json")).is_err());
    }
}
