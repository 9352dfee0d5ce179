pub mod p_keygen;

pub use p_keygen::{p_keygen, KeyPair, PublicKey, SecretKey};
