// ===========================================================================
// Erreurs du protocole PSO
//
// Taxonomie : configuration, aléa, arithmétique, collaborateur (filtre
// chiffré). Toutes remontent à l'appelant de l'orchestrateur ; aucune n'est
// rejouée : rejouer un tour risquerait de réutiliser des masques.
// ===========================================================================

use std::fmt;

use crate::crypto_error::CryptoError;

#[derive(Debug)]
pub enum PsoError {
    /// Paramètre rejeté avant tout travail cryptographique
    Config(String),
    /// La source d'entropie a échoué (jamais de repli sur un aléa faible)
    Randomness(String),
    /// Valeur non inversible modulo N pendant le décodage
    Arithmetic(CryptoError),
    /// Échec de construction, requête, combinaison ou déchiffrement
    Collaborator(CryptoError),
    /// Lecture du fichier de configuration / ouverture du fichier de logs
    Io(std::io::Error),
    /// JSON de configuration invalide
    Parse(serde_json::Error),
}

impl fmt::Display for PsoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PsoError::Config(msg) =>
                write!(f, "Configuration invalide : {msg}"),
            PsoError::Randomness(msg) =>
                write!(f, "Échec de la source d'aléa : {msg}"),
            PsoError::Arithmetic(e) =>
                write!(f, "Erreur arithmétique au décodage : {e}"),
            PsoError::Collaborator(e) =>
                write!(f, "Échec du filtre chiffré : {e}"),
            PsoError::Io(e) =>
                write!(f, "Erreur I/O : {e}"),
            PsoError::Parse(e) =>
                write!(f, "JSON de configuration invalide : {e}"),
        }
    }
}

impl std::error::Error for PsoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PsoError::Arithmetic(e) | PsoError::Collaborator(e) => Some(e),
            PsoError::Io(e) => Some(e),
            PsoError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CryptoError> for PsoError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Randomness(msg) => PsoError::Randomness(msg),
            other => PsoError::Collaborator(other),
        }
    }
}

impl From<rand_core::Error> for PsoError {
    fn from(e: rand_core::Error) -> Self { PsoError::Randomness(e.to_string()) }
}

impl From<std::io::Error> for PsoError {
    fn from(e: std::io::Error) -> Self { PsoError::Io(e) }
}

impl From<serde_json::Error> for PsoError {
    fn from(e: serde_json::Error) -> Self { PsoError::Parse(e) }
}
