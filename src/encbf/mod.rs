// Filtre de Bloom chiffré : contrat consommé par le cœur PSO + implémentation Paillier

pub mod contract;
pub mod enc_bloom;

pub use contract::{EncryptedFilter, FilterBuilder, FilterParameters, Mode, ResponsePair, RoundPhase};
pub use enc_bloom::{PaillierBloomFilter, PaillierFilterBuilder};
