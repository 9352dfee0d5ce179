// Oracle de validation : recalcul brute-force (quadratique) sur les
// ensembles en clair, réservé aux tests.

#![allow(dead_code)]

use num_bigint::BigUint;
use num_traits::Zero;
use pso_bloom::{Mode, PsoConfig, PsoResult};

fn member(set: &[BigUint], value: &BigUint) -> bool {
    set.iter().any(|u| u == value)
}

/// querier \ holder. 0 est exclu : en mode union il sert de sentinelle de
/// correspondance et n'est jamais restitué.
pub fn expected_union(holder: &[BigUint], querier: &[BigUint]) -> Vec<BigUint> {
    querier
        .iter()
        .filter(|v| !member(holder, v) && !v.is_zero())
        .cloned()
        .collect()
}

pub fn expected_intersection(holder: &[BigUint], querier: &[BigUint]) -> Vec<BigUint> {
    querier.iter().filter(|v| member(holder, v)).cloned().collect()
}

/// Compte des paires égales sur holder × querier
pub fn expected_cardinality(holder: &[BigUint], querier: &[BigUint]) -> usize {
    holder
        .iter()
        .map(|u| querier.iter().filter(|v| *v == u).count())
        .sum()
}

fn sorted(mut items: Vec<BigUint>) -> Vec<BigUint> {
    items.sort();
    items
}

pub fn check(mode: Mode, holder: &[BigUint], querier: &[BigUint], result: &PsoResult) {
    match (mode, result) {
        (Mode::Union, PsoResult::Elements(items)) => {
            for v in items {
                assert!(!member(holder, v), "élément {v} trouvé dans l'ensemble du détenteur");
                assert!(member(querier, v), "élément {v} absent de l'ensemble du requêteur");
            }
            assert_eq!(sorted(items.clone()), sorted(expected_union(holder, querier)));
        }
        (Mode::Intersection, PsoResult::Elements(items)) => {
            for v in items {
                assert!(member(holder, v), "élément {v} absent de l'ensemble du détenteur");
                assert!(member(querier, v), "élément {v} absent de l'ensemble du requêteur");
            }
            assert_eq!(sorted(items.clone()), sorted(expected_intersection(holder, querier)));
        }
        (Mode::Cardinality, PsoResult::Cardinality(count)) => {
            assert_eq!(*count, expected_cardinality(holder, querier));
        }
        (mode, result) => panic!("résultat {result:?} incohérent avec le mode {mode}"),
    }
}

/// Paramètres de test : module de 256 bits, faux positifs 2^-20
pub fn test_config(set_size: usize) -> PsoConfig {
    PsoConfig {
        set_size,
        domain_factor: 5,
        key_bits: 256,
        fp_log2: 20,
        max_concurrent_queries: 8,
        threads: 2,
        ..PsoConfig::default()
    }
}

pub fn range(from: u32, to_inclusive: u32) -> Vec<BigUint> {
    (from..=to_inclusive).map(BigUint::from).collect()
}
