// ============================================================================
// Configuration d'une exécution PSO
//
// Valeurs par défaut = banc de test historique (n = 64, domaine = 5·n,
// clé 1024 bits, faux positifs 2^-50). Chargeable depuis un fichier JSON ;
// les options CLI surchargent ensuite champ par champ.
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::encbf::{Mode, PaillierFilterBuilder};
use crate::paillier::math::MIN_KEY_BITS;
use crate::pso::error::PsoError;

/// Taille maximale d'un fichier de configuration JSON en octets (64 Ko),
/// vérifiée avant lecture.
const MAX_CONFIG_FILE_BYTES: u64 = 65_536;

/// Au-delà, k = fp_log2 hachages par requête devient déraisonnable
const MAX_FP_LOG2: u32 = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoConfig {
    /// Taille de chaque ensemble
    pub set_size:               usize,
    /// Domaine des éléments = domain_factor · set_size
    pub domain_factor:          u64,
    /// Taille du module Paillier N en bits
    pub key_bits:               u64,
    /// Probabilité de faux positif du filtre = 2^-fp_log2
    pub fp_log2:                u32,
    pub mode:                   Mode,
    /// Borne sur les requêtes simultanément en vol sur une poignée
    pub max_concurrent_queries: usize,
    /// Threads de travail (plafonnés par max_concurrent_queries)
    pub threads:                usize,
    /// false : ensembles i.i.d. avec doublons possibles
    pub unique_sets:            bool,
    /// Destination des logs (stderr si absent)
    pub log_file:               Option<PathBuf>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        PsoConfig {
            set_size:               64,
            domain_factor:          5,
            key_bits:               1024,
            fp_log2:                50,
            mode:                   Mode::Union,
            max_concurrent_queries: 10_000,
            threads:                4,
            unique_sets:            true,
            log_file:               None,
        }
    }
}

impl PsoConfig {
    pub fn from_json_str(json: &str) -> Result<Self, PsoError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PsoError> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        if size > MAX_CONFIG_FILE_BYTES {
            return Err(PsoError::Config(format!(
                "fichier de configuration trop volumineux : {size} octets (maximum {MAX_CONFIG_FILE_BYTES})"
            )));
        }
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Taille du domaine [0, domain)
    pub fn domain(&self) -> BigUint {
        BigUint::from(self.domain_factor) * BigUint::from(self.set_size)
    }

    /// Rejette toute configuration incohérente avant le moindre calcul
    /// cryptographique.
    pub fn validate(&self) -> Result<(), PsoError> {
        let reject = |msg: String| -> Result<(), PsoError> { Err(PsoError::Config(msg)) };

        if self.set_size == 0 {
            return reject("set_size doit être >= 1".to_string());
        }
        if self.domain_factor == 0 {
            return reject("domain_factor doit être >= 1".to_string());
        }
        let domain = self.domain();
        if self.unique_sets && domain < BigUint::from(self.set_size) {
            return reject(format!(
                "domaine {domain} plus petit que la taille d'ensemble {}",
                self.set_size
            ));
        }
        if self.key_bits % 2 != 0 || self.key_bits < 2 * MIN_KEY_BITS {
            return reject(format!(
                "key_bits = {} : valeur paire >= {} attendue",
                self.key_bits,
                2 * MIN_KEY_BITS
            ));
        }
        // Tout élément doit rester < N, et N >= 2^(key_bits - 1)
        if domain.bits() >= self.key_bits {
            return reject(format!(
                "domaine de {} bits trop grand pour un module de {} bits",
                domain.bits(),
                self.key_bits
            ));
        }
        if self.fp_log2 == 0 || self.fp_log2 > MAX_FP_LOG2 {
            return reject(format!("fp_log2 = {} hors de [1, {MAX_FP_LOG2}]", self.fp_log2));
        }
        if self.max_concurrent_queries == 0 {
            return reject("max_concurrent_queries doit être >= 1".to_string());
        }
        if self.threads == 0 {
            return reject("threads doit être >= 1".to_string());
        }
        Ok(())
    }

    pub fn filter_builder(&self) -> PaillierFilterBuilder {
        PaillierFilterBuilder {
            key_bits:               self.key_bits,
            fp_log2:                self.fp_log2,
            max_concurrent_queries: self.max_concurrent_queries,
            threads:                self.threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = PsoConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.domain(), BigUint::from(320u32));
    }

    #[test]
    fn test_rejections() {
        let cases = [
            PsoConfig { set_size: 0, ..PsoConfig::default() },
            PsoConfig { domain_factor: 0, ..PsoConfig::default() },
            PsoConfig { key_bits: 1023, ..PsoConfig::default() },
            PsoConfig { key_bits: 128, ..PsoConfig::default() },
            PsoConfig { fp_log2: 0, ..PsoConfig::default() },
            PsoConfig { max_concurrent_queries: 0, ..PsoConfig::default() },
            PsoConfig { threads: 0, ..PsoConfig::default() },
            PsoConfig { fp_log2: 200, ..PsoConfig::default() },
        ];
        for cfg in cases {
            assert!(matches!(cfg.validate(), Err(PsoError::Config(_))), "{cfg:?}");
        }
    }

    #[test]
    fn test_duplicates_allowed_without_unique_sets() {
        // domain_factor = 1 : domaine = set_size, toujours valide
        let cfg = PsoConfig { domain_factor: 1, unique_sets: false, ..PsoConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_json_partial_override() {
        let cfg = PsoConfig::from_json_str(r#"{ "set_size": 16, "mode": "intersection", "key_bits": 512 }"#).unwrap();
        assert_eq!(cfg.set_size, 16);
        assert_eq!(cfg.mode, Mode::Intersection);
        assert_eq!(cfg.key_bits, 512);
        assert_eq!(cfg.fp_log2, 50);
        assert!(matches!(PsoConfig::from_json_str(r#"{ "mode": "xor" }"#), Err(PsoError::Parse(_))));
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("pso_bloom_cfg_{}.json", std::process::id()));
        let cfg = PsoConfig { set_size: 8, mode: Mode::Cardinality, ..PsoConfig::default() };
        fs::write(&path, serde_json::to_string_pretty(&cfg).unwrap()).unwrap();
        let loaded = PsoConfig::from_json_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(loaded, cfg);
    }
}
