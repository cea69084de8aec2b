use thiserror::Error;

/// Erreurs de la table des règles, exposées telles quelles à l'appelant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("Loterie inconnue : '{0}'")]
    UnknownLottery(String),

    #[error("Règle invalide pour '{name}' : {reason}")]
    InvalidRule { name: String, reason: String },
}

impl RulesError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        RulesError::InvalidRule {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
