use num_bigint::BigUint;
use crate::paillier::math::l_function;
use crate::paillier::p_keygen::{PublicKey, SecretKey};
use crate::crypto_error::CryptoError;

// ---------------------------------------------------------------------------
// Déchiffrement Paillier : m = L(c^lambda mod n²) · mu  mod n
// ---------------------------------------------------------------------------
pub fn p_decrypt(c: &BigUint, pk: &PublicKey, sk: &SecretKey) -> Result<BigUint, CryptoError> {
    if c >= &pk.n_squared {
        return Err(CryptoError::CiphertextOutOfRange);
    }

    let c_lambda = c.modpow(&sk.lambda, &pk.n_squared);
    Ok((l_function(&c_lambda, &pk.n) * &sk.mu) % &pk.n)
}
