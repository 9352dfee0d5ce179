// ─────────────────────────────────────────────────────────
// Générateur d'ensembles privés
//
// Tirage uniforme dans [0, domain) par rejet au niveau des octets :
// l'échec de la source d'entropie remonte en PsoError::Randomness.
// ─────────────────────────────────────────────────────────

use std::collections::HashSet;

use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::{OsRng, RngCore};

use crate::paillier::math::random_below;
use crate::pso::error::PsoError;

/// Encodage canonique d'un élément : octets big-endian.
pub fn element_bytes(element: &BigUint) -> Vec<u8> {
    element.to_bytes_be()
}

// Entier uniforme dans [0, bound), bound > 0
fn sample_below<R: RngCore + ?Sized>(rng: &mut R, bound: &BigUint) -> Result<BigUint, PsoError> {
    random_below(bound, rng).map_err(PsoError::from)
}

/// Génère `count` éléments de [0, domain).
///
/// En mode `unique`, les éléments sont deux à deux distincts (tirage avec
/// rejet des doublons) ; `count > domain` est alors refusé d'emblée au lieu
/// de boucler indéfiniment. Sinon, tirage i.i.d. avec doublons possibles.
pub fn generate_set<R: RngCore + ?Sized>(
    rng: &mut R,
    count: usize,
    domain: &BigUint,
    unique: bool,
) -> Result<Vec<BigUint>, PsoError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if domain.is_zero() {
        return Err(PsoError::Config("domaine vide".to_string()));
    }
    if unique && &BigUint::from(count) > domain {
        return Err(PsoError::Config(format!(
            "impossible de tirer {count} éléments distincts dans un domaine de taille {domain}"
        )));
    }

    let mut set = Vec::with_capacity(count);
    if !unique {
        for _ in 0..count {
            set.push(sample_below(rng, domain)?);
        }
        return Ok(set);
    }

    let mut seen: HashSet<BigUint> = HashSet::with_capacity(count);
    while set.len() < count {
        let candidate = sample_below(rng, domain)?;
        if seen.insert(candidate.clone()) {
            set.push(candidate);
        }
    }
    Ok(set)
}

/// generate_set sur l'entropie système.
pub fn generate_set_os(count: usize, domain: &BigUint, unique: bool) -> Result<Vec<BigUint>, PsoError> {
    generate_set(&mut OsRng, count, domain, unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 { 0 }
        fn next_u64(&mut self) -> u64 { 0 }
        fn fill_bytes(&mut self, dest: &mut [u8]) { dest.fill(0) }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
            Err(rand_core::Error::new("entropie indisponible"))
        }
    }

    #[test]
    fn test_unique_sets_are_distinct_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        for (count, domain) in [(1usize, 1u32), (64, 320), (100, 100), (10, 1000)] {
            let domain = BigUint::from(domain);
            let set = generate_set(&mut rng, count, &domain, true).unwrap();
            assert_eq!(set.len(), count);
            let distinct: HashSet<_> = set.iter().collect();
            assert_eq!(distinct.len(), count);
            assert!(set.iter().all(|e| e < &domain));
        }
    }

    #[test]
    fn test_non_unique_allows_duplicates() {
        let mut rng = StdRng::seed_from_u64(11);
        let domain = BigUint::from(3u32);
        let set = generate_set(&mut rng, 50, &domain, false).unwrap();
        assert_eq!(set.len(), 50);
        assert!(set.iter().all(|e| e < &domain));
        let distinct: HashSet<_> = set.iter().collect();
        assert!(distinct.len() <= 3);
    }

    #[test]
    fn test_domain_too_small_is_a_config_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let res = generate_set(&mut rng, 11, &BigUint::from(10u32), true);
        assert!(matches!(res, Err(PsoError::Config(_))));
        let res = generate_set(&mut rng, 1, &BigUint::zero(), false);
        assert!(matches!(res, Err(PsoError::Config(_))));
        assert!(generate_set(&mut rng, 0, &BigUint::zero(), true).unwrap().is_empty());
    }

    #[test]
    fn test_entropy_failure_is_fatal() {
        let res = generate_set(&mut BrokenRng, 4, &BigUint::from(100u32), true);
        assert!(matches!(res, Err(PsoError::Randomness(_))));
    }

    #[test]
    fn test_large_domain() {
        let domain = BigUint::from(1u32) << 200;
        let set = generate_set_os(16, &domain, true).unwrap();
        assert!(set.iter().all(|e| e < &domain));
        assert_eq!(element_bytes(&BigUint::from(258u32)), vec![1u8, 2]);
    }
}
