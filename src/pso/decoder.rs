// ─────────────────────────────────────────────────────────
// Décodeur des paires de réponse
//
// Fonction pure : (mode, N, paires) -> résultat. Aucun état retenu,
// N n'est utilisé que comme module arithmétique.
//
//   Union        : item = a·b⁻¹ mod N ; conservé si item != 0
//   Intersection : conservé (item = a) si b == 0
//   Cardinalité  : compte des paires avec a == 0 (b ignoré)
// ─────────────────────────────────────────────────────────

use num_bigint::BigUint;
use num_traits::Zero;

use crate::encbf::contract::{Mode, ResponsePair};
use crate::paillier::math::mod_inverse;
use crate::pso::error::PsoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsoResult {
    /// Union (querier \ holder) ou intersection, dans l'ordre d'arrivée
    Elements(Vec<BigUint>),
    /// |querier ∩ holder|
    Cardinality(usize),
}

impl PsoResult {
    pub fn elements(&self) -> Option<&[BigUint]> {
        match self {
            PsoResult::Elements(items) => Some(items),
            PsoResult::Cardinality(_) => None,
        }
    }

    pub fn cardinality(&self) -> Option<usize> {
        match self {
            PsoResult::Cardinality(count) => Some(*count),
            PsoResult::Elements(_) => None,
        }
    }

    /// Nombre d'éléments ou valeur du compteur
    pub fn size(&self) -> usize {
        match self {
            PsoResult::Elements(items) => items.len(),
            PsoResult::Cardinality(count) => *count,
        }
    }
}

fn decode_union(n: &BigUint, pairs: &[ResponsePair]) -> Result<Vec<BigUint>, PsoError> {
    let mut items = Vec::new();
    for pair in pairs {
        // b non inversible : état du tour corrompu, on abandonne
        let b_inv = mod_inverse(&pair.b, n).map_err(PsoError::Arithmetic)?;
        let item = (&pair.a * b_inv) % n;
        if !item.is_zero() {
            items.push(item);
        }
    }
    Ok(items)
}

fn decode_intersection(pairs: &[ResponsePair]) -> Vec<BigUint> {
    pairs
        .iter()
        .filter(|pair| pair.b.is_zero())
        .map(|pair| pair.a.clone())
        .collect()
}

fn decode_cardinality(pairs: &[ResponsePair]) -> usize {
    pairs.iter().filter(|pair| pair.a.is_zero()).count()
}

pub fn decode(mode: Mode, n: &BigUint, pairs: &[ResponsePair]) -> Result<PsoResult, PsoError> {
    match mode {
        Mode::Union => decode_union(n, pairs).map(PsoResult::Elements),
        Mode::Intersection => Ok(PsoResult::Elements(decode_intersection(pairs))),
        Mode::Cardinality => Ok(PsoResult::Cardinality(decode_cardinality(pairs))),
        Mode::All => Err(PsoError::Config(
            "le mode 'all' ne se décode pas : exécuter chaque mode séparément".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_error::CryptoError;

    fn modulus() -> BigUint {
        // 11 · 13
        BigUint::from(143u32)
    }

    fn pair(a: u32, b: u32) -> ResponsePair {
        ResponsePair::from((a, b))
    }

    #[test]
    fn test_union_unblinds_and_drops_matches() {
        let n = modulus();
        // 7·5 = 35, 35·5⁻¹ = 7 ; 9·4 = 36 ; sentinelle (0, 1)
        let pairs = vec![pair(35, 5), pair(0, 1), pair(36, 4)];
        let res = decode(Mode::Union, &n, &pairs).unwrap();
        assert_eq!(res, PsoResult::Elements(vec![BigUint::from(7u32), BigUint::from(9u32)]));
    }

    #[test]
    fn test_union_non_invertible_is_fatal() {
        let n = modulus();
        let pairs = vec![pair(35, 5), pair(3, 11)];
        let res = decode(Mode::Union, &n, &pairs);
        assert!(matches!(res, Err(PsoError::Arithmetic(CryptoError::NoModularInverse))));
        let res = decode(Mode::Union, &n, &[pair(3, 0)]);
        assert!(matches!(res, Err(PsoError::Arithmetic(_))));
    }

    #[test]
    fn test_intersection_keeps_zero_b() {
        let n = modulus();
        let pairs = vec![pair(12, 0), pair(77, 3), pair(40, 0)];
        let res = decode(Mode::Intersection, &n, &pairs).unwrap();
        assert_eq!(res.elements().unwrap(), &[BigUint::from(12u32), BigUint::from(40u32)]);
    }

    #[test]
    fn test_cardinality_counts_zero_a() {
        let n = modulus();
        let pairs = vec![pair(0, 99), pair(5, 0), pair(0, 0), pair(1, 1)];
        let res = decode(Mode::Cardinality, &n, &pairs).unwrap();
        assert_eq!(res.cardinality(), Some(2));
        assert_eq!(res.size(), 2);
    }

    #[test]
    fn test_empty_input() {
        let n = modulus();
        assert_eq!(decode(Mode::Union, &n, &[]).unwrap(), PsoResult::Elements(vec![]));
        assert_eq!(decode(Mode::Intersection, &n, &[]).unwrap(), PsoResult::Elements(vec![]));
        assert_eq!(decode(Mode::Cardinality, &n, &[]).unwrap(), PsoResult::Cardinality(0));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let n = modulus();
        let pairs = vec![pair(35, 5), pair(0, 1), pair(36, 4)];
        for mode in Mode::PROTOCOL_MODES {
            let first = decode(mode, &n, &pairs).unwrap();
            let second = decode(mode, &n, &pairs).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_all_mode_is_rejected() {
        assert!(matches!(decode(Mode::All, &modulus(), &[]), Err(PsoError::Config(_))));
    }
}
