// Réexporte toutes les structures et fonctions mathématiques

mod math;

pub use math::{l_function, gcd, generate_safe_prime, generate_safe_prime_with, mod_inverse, lcm, random_below, random_unit, MIN_KEY_BITS};
