use std::sync::OnceLock;

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::OsRng;
use rand_core::RngCore;
use crate::crypto_error::CryptoError;

// Taille minimale (en bits) d'un facteur premier du module
pub const MIN_KEY_BITS: u64 = 128;

// Borne du crible préliminaire (petits premiers impairs < 3000)
const SIEVE_LIMIT: usize = 3000;

// ---------------------------------------------------------------------------
// Table de petits premiers impairs, calculée une seule fois (Ératosthène)
// ---------------------------------------------------------------------------
fn small_primes() -> &'static [u64] {
    static PRIMES: OnceLock<Vec<u64>> = OnceLock::new();
    PRIMES.get_or_init(|| {
        let mut composite = vec![false; SIEVE_LIMIT];
        let mut primes = Vec::new();
        for i in 2..SIEVE_LIMIT {
            if composite[i] {
                continue;
            }
            if i > 2 {
                primes.push(i as u64);
            }
            let mut j = i * i;
            while j < SIEVE_LIMIT {
                composite[j] = true;
                j += i;
            }
        }
        primes
    })
}

// Fonction L(u) = (u-1)/n
pub fn l_function(u: &BigUint, n: &BigUint) -> BigUint {
    (u - BigUint::one()) / n
}

// Calcule le pgcd de deux nombres
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    (a * b) / gcd(a, b)
}

// ---------------------------------------------------------------------------
// Nombre de rounds Miller-Rabin (erreur <= 4^-rounds par candidat)
// ---------------------------------------------------------------------------
fn miller_rabin_rounds(nbits: u64) -> u32 {
    if nbits >= 1024 { 8 } else { 12 }
}

// ---------------------------------------------------------------------------
// Génère un safe prime p = 2p' + 1 de exactement `nbits` bits.
// Les deux bits de poids fort de p' sont forcés : n = p·q a donc toujours
// exactement 2·nbits bits.
// ---------------------------------------------------------------------------
pub fn generate_safe_prime(nbits: u64) -> Result<BigUint, CryptoError> {
    generate_safe_prime_with(nbits, &mut OsRng)
}

pub fn generate_safe_prime_with<R: RngCore + ?Sized>(nbits: u64, rng: &mut R) -> Result<BigUint, CryptoError> {
    if nbits < MIN_KEY_BITS {
        return Err(CryptoError::KeySizeTooSmall {
            requested: nbits,
            minimum: MIN_KEY_BITS,
        });
    }

    let rounds = miller_rabin_rounds(nbits);
    let half_range = BigUint::one() << (nbits - 1);

    loop {
        let mut sophie_germain = random_below(&half_range, rng)?;
        sophie_germain.set_bit(nbits - 2, true);
        sophie_germain.set_bit(nbits - 3, true);
        sophie_germain.set_bit(0, true);

        if rejected_by_sieve(&sophie_germain) {
            continue;
        }
        if !is_probable_prime(&sophie_germain, rounds, rng)? {
            continue;
        }

        let safe_prime = (&sophie_germain << 1) + BigUint::one();
        if is_probable_prime(&safe_prime, rounds, rng)? {
            debug_assert_eq!(safe_prime.bits(), nbits);
            return Ok(safe_prime);
        }
    }
}

// ---------------------------------------------------------------------------
// Crible combiné : rejette p' si p' ou 2p'+1 a un petit facteur premier.
// ---------------------------------------------------------------------------
fn rejected_by_sieve(sophie_germain: &BigUint) -> bool {
    for &sp in small_primes() {
        if sophie_germain == &BigUint::from(sp) {
            return false;
        }
        // sp < 3000 : le reste tient dans un u64
        let r = (sophie_germain % sp).iter_u64_digits().next().unwrap_or(0);
        if r == 0 || (2 * r + 1) % sp == 0 {
            return true;
        }
    }
    false
}

fn is_probable_prime<R: RngCore + ?Sized>(n: &BigUint, rounds: u32, rng: &mut R) -> Result<bool, CryptoError> {
    let two = BigUint::from(2u32);
    if n < &two { return Ok(false); }
    if n == &two { return Ok(true); }
    if n.is_even() { return Ok(false); }
    if small_primes().iter().any(|&p| n == &BigUint::from(p)) { return Ok(true); }
    if n < &BigUint::from(5u32) { return Ok(false); }

    let n_minus_1 = n - BigUint::one();
    let r = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> r;
    // témoins a dans [2, n-2)
    let witness_span = n - BigUint::from(4u32);

    'witness: for _ in 0..rounds {
        let a = random_below(&witness_span, rng)? + &two;
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 1..r {
            x = (&x * &x) % n;
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return Ok(false);
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Calcule l'inverse modulaire de a mod n.
// Retourne Err(CryptoError::NoModularInverse) si gcd(a,n) != 1 (donc aussi
// pour a = 0).
// ---------------------------------------------------------------------------
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Result<BigUint, CryptoError> {
    if n.is_zero() {
        return Err(CryptoError::NoModularInverse);
    }
    let (g, x) = extended_gcd(&BigInt::from(a % n), &BigInt::from(n.clone()));
    if !g.is_one() {
        return Err(CryptoError::NoModularInverse);
    }
    let n_big = BigInt::from(n.clone());
    x.mod_floor(&n_big)
        .to_biguint()
        .ok_or(CryptoError::NegativeConversion)
}

// Retourne (gcd(a, b), s) avec a·s ≡ gcd (mod b)
fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let quotient = &old_r / &r;
        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &quotient * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    (old_r, old_s)
}

// ---------------------------------------------------------------------------
// Entier uniforme dans [0, bound), bound > 0, par rejet au niveau des octets.
// L'échec de la source d'entropie remonte en CryptoError::Randomness.
// ---------------------------------------------------------------------------
pub fn random_below<R: RngCore + ?Sized>(bound: &BigUint, rng: &mut R) -> Result<BigUint, CryptoError> {
    if bound.is_zero() {
        return Err(CryptoError::InvalidInput("borne de tirage nulle".to_string()));
    }
    let bits = bound.bits();
    let nbytes = ((bits + 7) / 8) as usize;
    let excess = (nbytes as u64 * 8 - bits) as u32;
    let mut buf = vec![0u8; nbytes];
    loop {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| CryptoError::Randomness(e.to_string()))?;
        buf[0] &= 0xffu8 >> excess;
        let candidate = BigUint::from_bytes_be(&buf);
        if &candidate < bound {
            return Ok(candidate);
        }
    }
}

// ---------------------------------------------------------------------------
// Tire un élément inversible de Z*_n (gcd(r, n) = 1), r dans [1, n).
// Sert aux aléas de chiffrement et aux masques multiplicatifs.
// ---------------------------------------------------------------------------
pub fn random_unit<R: RngCore + ?Sized>(n: &BigUint, rng: &mut R) -> Result<BigUint, CryptoError> {
    if n <= &BigUint::one() {
        return Err(CryptoError::InvalidInput("Z*_n vide pour n <= 1".to_string()));
    }
    loop {
        let candidate = random_below(n, rng)?;
        if !candidate.is_zero() && gcd(&candidate, n).is_one() {
            return Ok(candidate);
        }
    }
}
