// ===========================================================================
// Contrat du filtre de Bloom chiffré
//
// Le décodeur et l'orchestrateur ne voient le cryptosystème qu'à travers
// ces deux traits : une implémentation Paillier réelle ou un double de test
// rejouant des paires fixes sont interchangeables.
// ===========================================================================

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::crypto_error::CryptoError;

// ─────────────────────────────────────────────────────────
// Mode d'opération
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// PSU : le détenteur apprend querier \ holder
    Union,
    /// PSI : le détenteur apprend querier ∩ holder
    Intersection,
    /// PSI-CA : seul |querier ∩ holder| est révélé
    Cardinality,
    /// Commodité : les trois modes à la suite sur une même session
    All,
}

impl Mode {
    /// Les trois modes réellement exécutables par un tour du protocole.
    pub const PROTOCOL_MODES: [Mode; 3] = [Mode::Union, Mode::Intersection, Mode::Cardinality];

    pub fn is_protocol_mode(self) -> bool {
        self != Mode::All
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Union        => "union",
            Mode::Intersection => "intersection",
            Mode::Cardinality  => "cardinality",
            Mode::All          => "all",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Codage numérique historique : 0 = PSU, 1 = PSI, 2 = PSI/PSU-CA
impl TryFrom<u8> for Mode {
    type Error = CryptoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Union),
            1 => Ok(Mode::Intersection),
            2 => Ok(Mode::Cardinality),
            3 => Ok(Mode::All),
            other => Err(CryptoError::InvalidInput(format!("mode inconnu : {other}"))),
        }
    }
}

impl FromStr for Mode {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "union" | "psu" | "0"               => Ok(Mode::Union),
            "intersection" | "psi" | "1"        => Ok(Mode::Intersection),
            "cardinality" | "ca" | "psi-ca" | "2" => Ok(Mode::Cardinality),
            "all" | "3"                         => Ok(Mode::All),
            other => Err(CryptoError::InvalidInput(format!("mode inconnu : {other}"))),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Paire de réponse déchiffrée, une par élément requêté
// ─────────────────────────────────────────────────────────

/// (a, b), chacun réduit modulo N, dans l'ordre de soumission des requêtes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePair {
    pub a: BigUint,
    pub b: BigUint,
}

impl ResponsePair {
    pub fn new(a: BigUint, b: BigUint) -> Self {
        ResponsePair { a, b }
    }
}

impl<A: Into<BigUint>, B: Into<BigUint>> From<(A, B)> for ResponsePair {
    fn from((a, b): (A, B)) -> Self {
        ResponsePair::new(a.into(), b.into())
    }
}

// ─────────────────────────────────────────────────────────
// Phase d'un tour : Idle → Querying → Combined → Decrypted
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Idle,
    Querying,
    Combined,
    Decrypted,
}

impl RoundPhase {
    pub fn label(self) -> &'static str {
        match self {
            RoundPhase::Idle      => "idle",
            RoundPhase::Querying  => "querying",
            RoundPhase::Combined  => "combined",
            RoundPhase::Decrypted => "decrypted",
        }
    }
}

/// Enregistrement de diagnostic (logs uniquement, aucune sémantique protocole).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterParameters {
    pub mode:                   Mode,
    pub modulus_bits:           u64,
    pub filter_bins:            usize,
    pub nhashes:                usize,
    pub max_concurrent_queries: usize,
    pub workers:                usize,
    pub pending_queries:        usize,
    pub phase:                  RoundPhase,
}

// ─────────────────────────────────────────────────────────
// Poignée de filtre chiffré
//
// Les méthodes prennent &mut self : une poignée n'est pilotée que par un
// seul orchestrateur à la fois. Le parallélisme des requêtes est interne
// (query_all), borné par max_concurrent_queries.
// ─────────────────────────────────────────────────────────

pub trait EncryptedFilter {
    /// Module public N du détenteur
    fn public_modulus(&self) -> &BigUint;

    fn mode(&self) -> Mode;

    /// Change le mode entre deux tours (phase Idle uniquement).
    fn set_mode(&mut self, mode: Mode) -> Result<(), CryptoError>;

    /// Met en file un élément (octets big-endian) pour le tour courant.
    fn query(&mut self, element: &[u8]) -> Result<(), CryptoError>;

    /// Met en file tous les éléments, dans l'ordre. Les implémentations
    /// peuvent paralléliser en conservant l'ordre de soumission.
    fn query_all(&mut self, elements: &[Vec<u8>]) -> Result<(), CryptoError> {
        for element in elements {
            self.query(element)?;
        }
        Ok(())
    }

    /// Finalise l'état homomorphe du tour ; après toutes les requêtes.
    fn combine(&mut self) -> Result<(), CryptoError>;

    /// Déchiffre l'état combiné : une paire par requête, ordre préservé.
    fn decrypt(&mut self) -> Result<Vec<ResponsePair>, CryptoError>;

    /// Efface l'état du tour ; conserve clés et filtre de base.
    fn reset_round(&mut self);

    fn dump_parameters(&self) -> FilterParameters;
}

/// Construction d'une poignée neuve à partir de l'ensemble du détenteur.
pub trait FilterBuilder {
    type Handle: EncryptedFilter;

    fn build(&self, holder_elements: &[Vec<u8>], mode: Mode) -> Result<Self::Handle, CryptoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("PSI".parse::<Mode>().unwrap(), Mode::Intersection);
        assert_eq!("cardinality".parse::<Mode>().unwrap(), Mode::Cardinality);
        assert_eq!(Mode::try_from(0u8).unwrap(), Mode::Union);
        assert!(Mode::try_from(7u8).is_err());
        assert!("xor".parse::<Mode>().is_err());
        assert!(!Mode::All.is_protocol_mode());
    }
}
