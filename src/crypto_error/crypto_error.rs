// ===========================================================================
// Gestion centralisée des erreurs cryptographiques
//
// Erreurs remontées par la couche Paillier et par le filtre de Bloom chiffré.
// L'orchestrateur PSO les enveloppe dans PsoError::Collaborator : aucune
// n'est rattrapée silencieusement, un tour en échec est abandonné.
// ===========================================================================

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CryptoError {
    // --- Erreurs de paramètres d'entrée ---
    /// Le message m est >= n (hors domaine plaintext Paillier)
    MessageOutOfRange,
    /// Le chiffré c est >= n² (hors domaine ciphertext Paillier)
    CiphertextOutOfRange,
    /// La taille de clé demandée est trop petite (< MIN_KEY_BITS)
    KeySizeTooSmall { requested: u64, minimum: u64 },

    // --- Erreurs mathématiques internes ---
    /// L'inverse modulaire n'existe pas (gcd != 1)
    NoModularInverse,
    /// Conversion BigInt -> BigUint échouée (résultat négatif — invariant interne)
    NegativeConversion,

    // --- Erreurs de cycle de vie d'un tour ---
    /// Opération appelée dans la mauvaise phase du tour (ex. query après combine)
    RoundOrder { operation: &'static str, phase: &'static str },
    /// La source d'entropie a échoué (clés, aléas de chiffrement, masques)
    Randomness(String),
    /// Le pool de threads borné n'a pas pu être construit
    ThreadPool(String),

    InvalidInput(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::MessageOutOfRange =>
                write!(f, "Le message doit être dans [0, n)"),
            CryptoError::CiphertextOutOfRange =>
                write!(f, "Le chiffré doit être dans [0, n²)"),
            CryptoError::KeySizeTooSmall { requested, minimum } =>
                write!(f, "Taille de clé {requested} bits insuffisante, minimum requis : {minimum} bits"),
            CryptoError::NoModularInverse =>
                write!(f, "Impossible de calculer l'inverse modulaire (gcd != 1)"),
            CryptoError::NegativeConversion =>
                write!(f, "Conversion interne BigInt -> BigUint : résultat négatif inattendu"),
            CryptoError::RoundOrder { operation, phase } =>
                write!(f, "Opération '{operation}' interdite dans la phase '{phase}' du tour"),
            CryptoError::Randomness(msg) =>
                write!(f, "Échec de la source d'entropie : {msg}"),
            CryptoError::ThreadPool(msg) =>
                write!(f, "Construction du pool de threads impossible : {msg}"),
            CryptoError::InvalidInput(msg) =>
                write!(f, "Entrée invalide : {msg}"),
        }
    }
}

impl std::error::Error for CryptoError {}
