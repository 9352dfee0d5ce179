use num_bigint::BigUint;
use num_traits::One;
use zeroize::Zeroize;
use crate::paillier::math::{l_function, gcd, lcm, mod_inverse, generate_safe_prime, MIN_KEY_BITS};
use crate::crypto_error::CryptoError;

// ============================================================================
// Clé publique Paillier — pas de données secrètes, pas de zeroize nécessaire
// ============================================================================
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub n:         BigUint,
    pub g:         BigUint,
    pub n_squared: BigUint,
}

// ============================================================================
// Helper : écrase puis libère un BigUint secret
// ============================================================================
fn zeroize_biguint(n: &mut BigUint) {
    let bytes = ((n.bits() + 7) / 8) as usize;
    if bytes > 0 {
        *n = BigUint::from_bytes_be(&vec![0u8; bytes]);
    }
    *n = BigUint::default();
}

// ============================================================================
// Clé secrète Paillier — ZEROISÉE À LA DESTRUCTION
// ============================================================================
#[derive(Clone, Debug)]
pub struct SecretKey {
    pub lambda: BigUint,
    pub mu:     BigUint,
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        zeroize_biguint(&mut self.lambda);
        zeroize_biguint(&mut self.mu);
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// ============================================================================
// Paire de clés — détenue par le "holder" du filtre chiffré
// ============================================================================
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub secret_key: SecretKey,
}

// ============================================================================
// Génération de clés Paillier pour un module de `key_bits` bits.
//
// p et q sont des safe primes de key_bits/2 bits chacun, donc
// lambda = lcm(p-1, q-1) = 2·p'·q' et gcd(lambda, n) = 1.
// g = n+1 : (n+1)^m mod n² = 1 + m·n, donc g^lambda se calcule sans modpow.
// ============================================================================
pub fn p_keygen(key_bits: u64) -> Result<KeyPair, CryptoError> {
    if key_bits % 2 != 0 || key_bits < 2 * MIN_KEY_BITS {
        return Err(CryptoError::KeySizeTooSmall {
            requested: key_bits,
            minimum: 2 * MIN_KEY_BITS,
        });
    }
    let prime_bits = key_bits / 2;

    let p = generate_safe_prime(prime_bits)?;
    let mut q = generate_safe_prime(prime_bits)?;
    while p == q {
        q = generate_safe_prime(prime_bits)?;
    }

    let n         = &p * &q;
    let n_squared = &n * &n;

    let p_minus_1 = &p - BigUint::one();
    let q_minus_1 = &q - BigUint::one();

    if gcd(&n, &(&p_minus_1 * &q_minus_1)) != BigUint::one() {
        return Err(CryptoError::NoModularInverse);
    }

    let lambda   = lcm(&p_minus_1, &q_minus_1);
    let g        = &n + BigUint::one();
    let g_lambda = (BigUint::one() + &lambda * &n) % &n_squared;
    let mu       = mod_inverse(&l_function(&g_lambda, &n), &n)?;

    Ok(KeyPair {
        public_key: PublicKey { n, g, n_squared },
        secret_key: SecretKey { lambda, mu },
    })
}
