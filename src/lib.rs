// Déclaration des modules
pub mod crypto_error;
pub mod paillier;
pub mod bloom;
pub mod encbf;
pub mod pso;
pub mod config;

pub use crate::paillier::math;
pub use crate::paillier::p_keygen;
pub use crate::paillier::p_encrypt;
pub use crate::paillier::p_decrypt;

// Types depuis keygen
pub use p_keygen::{KeyPair, PublicKey, SecretKey};

// Erreurs centralisées
pub use crypto_error::CryptoError;
pub use pso::PsoError;

// Contrat du filtre chiffré et son implémentation Paillier
pub use bloom::BloomFilter;
pub use encbf::{
    EncryptedFilter, FilterBuilder, FilterParameters, Mode, PaillierBloomFilter,
    PaillierFilterBuilder, ResponsePair, RoundPhase,
};

// Cœur du protocole
pub use pso::{
    decode, element_bytes, generate_set, generate_set_os, PhaseTimings, PsoOrchestrator,
    PsoResult, PsoSession, RoundReport, RunOutcome,
};

pub use config::PsoConfig;
