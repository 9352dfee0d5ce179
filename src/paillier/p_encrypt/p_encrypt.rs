use num_bigint::BigUint;
use num_traits::One;
use rand_core::OsRng;
use crate::paillier::p_keygen::PublicKey;
use crate::paillier::math::random_unit;
use crate::crypto_error::CryptoError;

// ---------------------------------------------------------------------------
// Chiffrement Paillier : c = g^m * r^n  mod n²
//
// Avec g = n+1 : g^m mod n² = 1 + m·n, aucun modpow sur g n'est nécessaire.
// Retourne Err(CryptoError::MessageOutOfRange) si m >= n.
// ---------------------------------------------------------------------------
pub fn p_encrypt(m: &BigUint, pk: &PublicKey) -> Result<BigUint, CryptoError> {
    if m >= &pk.n {
        return Err(CryptoError::MessageOutOfRange);
    }

    let g_m = (BigUint::one() + m * &pk.n) % &pk.n_squared;
    Ok((g_m * fresh_mask(pk)?) % &pk.n_squared)
}

// r^n mod n² pour r uniforme dans Z*_n
fn fresh_mask(pk: &PublicKey) -> Result<BigUint, CryptoError> {
    let r = random_unit(&pk.n, &mut OsRng)?;
    Ok(r.modpow(&pk.n, &pk.n_squared))
}

fn check_ciphertext(c: &BigUint, pk: &PublicKey) -> Result<(), CryptoError> {
    if c >= &pk.n_squared {
        return Err(CryptoError::CiphertextOutOfRange);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Addition homomorphique : E(a) · E(b) mod n² = E(a + b mod n)
// ---------------------------------------------------------------------------
pub fn p_add(c1: &BigUint, c2: &BigUint, pk: &PublicKey) -> Result<BigUint, CryptoError> {
    check_ciphertext(c1, pk)?;
    check_ciphertext(c2, pk)?;
    Ok((c1 * c2) % &pk.n_squared)
}

// ---------------------------------------------------------------------------
// Multiplication par un scalaire clair : E(a)^k mod n² = E(k·a mod n)
// ---------------------------------------------------------------------------
pub fn p_scalar_mul(c: &BigUint, k: &BigUint, pk: &PublicKey) -> Result<BigUint, CryptoError> {
    check_ciphertext(c, pk)?;
    Ok(c.modpow(&(k % &pk.n), &pk.n_squared))
}

// ---------------------------------------------------------------------------
// Re-randomisation : c · r^n mod n², même clair, aléa indépendant.
// Appliquée à tout chiffré renvoyé au détenteur de la clé.
// ---------------------------------------------------------------------------
pub fn p_rerandomize(c: &BigUint, pk: &PublicKey) -> Result<BigUint, CryptoError> {
    check_ciphertext(c, pk)?;
    Ok((c * fresh_mask(pk)?) % &pk.n_squared)
}
