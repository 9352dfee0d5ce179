// =========================================================
// Filtre de Bloom chiffré sous Paillier
//
// Le détenteur chiffre chaque case j du filtre sous la forme
// Enc(1 - B[j]) : une case à 1 devient Enc(0).
//
// Pour un élément x de positions h_1..h_k, la requête calcule
// homomorphiquement Enc(s) = Π Enc(1 - B[h_i]) = Enc(Σ (1 - B[h_i])) :
// s = 0 si x est dans le filtre, s > 0 sinon.
//
// La combinaison masque s par des unités aléatoires r, r' ∈ Z*_n :
//   - Union        : (Enc(r·s·x), Enc(r·s))   → a·b⁻¹ = x si s != 0
//   - Intersection : (Enc(x + r'·s), Enc(r·s)) → b = 0 et a = x si s = 0
//   - Cardinalité  : (Enc(r·s), —)            → a = 0 si s = 0
//
// En mode Union, une correspondance (b = 0) est renvoyée sous la forme
// sentinelle (0, 1) : le décodeur obtient item = 0 et l'écarte.
// =========================================================

use std::time::Instant;

use log::{debug, info};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::OsRng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::bloom::BloomFilter;
use crate::crypto_error::CryptoError;
use crate::encbf::contract::{EncryptedFilter, FilterBuilder, FilterParameters, Mode, ResponsePair, RoundPhase};
use crate::paillier::math::random_unit;
use crate::paillier::p_decrypt::p_decrypt;
use crate::paillier::p_encrypt::{p_add, p_encrypt, p_rerandomize, p_scalar_mul};
use crate::paillier::p_keygen::{p_keygen, KeyPair};

// Requête en attente : l'élément et Enc(s)
struct PendingQuery {
    element: BigUint,
    unset:   BigUint,
}

// Paire chiffrée produite par combine() ; b absent en mode cardinalité
struct CipherPair {
    a: BigUint,
    b: Option<BigUint>,
}

pub struct PaillierBloomFilter {
    keypair:                KeyPair,
    enc_bins:               Vec<BigUint>,
    nhashes:                usize,
    mode:                   Mode,
    max_concurrent_queries: usize,
    pool:                   ThreadPool,
    phase:                  RoundPhase,
    pending:                Vec<PendingQuery>,
    combined:               Vec<CipherPair>,
}

fn protocol_mode(mode: Mode) -> Result<Mode, CryptoError> {
    if mode.is_protocol_mode() {
        Ok(mode)
    } else {
        Err(CryptoError::InvalidInput(format!(
            "le mode '{mode}' n'est pas un mode de protocole"
        )))
    }
}

// Big-endian sans zéros de tête, comme element_bytes côté générateur
fn canonical_bytes(element: &[u8]) -> Vec<u8> {
    BigUint::from_bytes_be(element).to_bytes_be()
}

// Pool borné : au plus min(threads, max_concurrent_queries) opérations en vol
fn bounded_pool(threads: usize, max_concurrent_queries: usize) -> Result<ThreadPool, CryptoError> {
    ThreadPoolBuilder::new()
        .num_threads(threads.min(max_concurrent_queries).max(1))
        .thread_name(|i| format!("pso-query-{i}"))
        .build()
        .map_err(|e| CryptoError::ThreadPool(e.to_string()))
}

impl PaillierBloomFilter {
    /// newEncryptedHandle : génère la paire de clés puis chiffre chaque case.
    pub fn new(
        filter: &BloomFilter,
        key_bits: u64,
        mode: Mode,
        max_concurrent_queries: usize,
        threads: usize,
    ) -> Result<Self, CryptoError> {
        let mode = protocol_mode(mode)?;
        if max_concurrent_queries == 0 {
            return Err(CryptoError::InvalidInput(
                "max_concurrent_queries doit être >= 1".to_string(),
            ));
        }
        let pool = bounded_pool(threads, max_concurrent_queries)?;

        let t = Instant::now();
        let keypair = p_keygen(key_bits)?;
        debug!("[Construction] clés Paillier ({} bits) en {:.3?}", key_bits, t.elapsed());

        let t = Instant::now();
        let pk = &keypair.public_key;
        let (zero, one) = (BigUint::zero(), BigUint::one());
        let enc_bins = pool.install(|| {
            filter
                .bins()
                .par_iter()
                .map(|&set| p_encrypt(if set { &zero } else { &one }, pk))
                .collect::<Result<Vec<_>, _>>()
        })?;
        info!(
            "[Construction] filtre chiffré : {} cases, k = {}, chiffré en {:.3?}",
            enc_bins.len(),
            filter.nhashes(),
            t.elapsed()
        );

        Ok(PaillierBloomFilter {
            keypair,
            enc_bins,
            nhashes: filter.nhashes(),
            mode,
            max_concurrent_queries,
            pool,
            phase: RoundPhase::Idle,
            pending: Vec::new(),
            combined: Vec::new(),
        })
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    fn ensure_phase(&self, operation: &'static str, allowed: &[RoundPhase]) -> Result<(), CryptoError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(CryptoError::RoundOrder { operation, phase: self.phase.label() })
        }
    }

    // Enc(s) pour un élément ; lecture seule, appelable en parallèle
    fn prepare(&self, element: &[u8]) -> Result<PendingQuery, CryptoError> {
        let pk = &self.keypair.public_key;
        let x = BigUint::from_bytes_be(element);
        if x >= pk.n {
            return Err(CryptoError::MessageOutOfRange);
        }

        // haché sur l'encodage canonique : [0, 9] et [9] désignent le même x
        let positions = BloomFilter::hash_positions(&canonical_bytes(element), self.enc_bins.len(), self.nhashes);
        let (first, rest) = positions
            .split_first()
            .ok_or_else(|| CryptoError::InvalidInput("filtre sans fonction de hachage".to_string()))?;
        let mut unset = self.enc_bins[*first].clone();
        for &pos in rest {
            unset = p_add(&unset, &self.enc_bins[pos], pk)?;
        }

        Ok(PendingQuery { element: x, unset })
    }

    // Masquage propre au mode, une requête
    fn blind(&self, query: &PendingQuery) -> Result<CipherPair, CryptoError> {
        let pk = &self.keypair.public_key;
        let mut rng = OsRng;
        let r = random_unit(&pk.n, &mut rng)?;

        match self.mode {
            Mode::Union => {
                let rx = (&r * &query.element) % &pk.n;
                let a = p_rerandomize(&p_scalar_mul(&query.unset, &rx, pk)?, pk)?;
                let b = p_rerandomize(&p_scalar_mul(&query.unset, &r, pk)?, pk)?;
                Ok(CipherPair { a, b: Some(b) })
            }
            Mode::Intersection => {
                let r_prime = random_unit(&pk.n, &mut rng)?;
                let masked = p_scalar_mul(&query.unset, &r_prime, pk)?;
                // Enc(x) est frais : la somme l'est aussi
                let a = p_add(&p_encrypt(&query.element, pk)?, &masked, pk)?;
                let b = p_rerandomize(&p_scalar_mul(&query.unset, &r, pk)?, pk)?;
                Ok(CipherPair { a, b: Some(b) })
            }
            Mode::Cardinality => {
                let a = p_rerandomize(&p_scalar_mul(&query.unset, &r, pk)?, pk)?;
                Ok(CipherPair { a, b: None })
            }
            Mode::All => Err(CryptoError::InvalidInput("mode 'all' non combinable".to_string())),
        }
    }

    fn open(&self, pair: &CipherPair) -> Result<ResponsePair, CryptoError> {
        let pk = &self.keypair.public_key;
        let sk = &self.keypair.secret_key;
        let a = p_decrypt(&pair.a, pk, sk)?;
        let b = match &pair.b {
            Some(c) => p_decrypt(c, pk, sk)?,
            None => BigUint::zero(),
        };
        if self.mode == Mode::Union && b.is_zero() {
            return Ok(ResponsePair::new(BigUint::zero(), BigUint::one()));
        }
        Ok(ResponsePair::new(a, b))
    }
}

impl EncryptedFilter for PaillierBloomFilter {
    fn public_modulus(&self) -> &BigUint {
        &self.keypair.public_key.n
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) -> Result<(), CryptoError> {
        self.ensure_phase("set_mode", &[RoundPhase::Idle])?;
        self.mode = protocol_mode(mode)?;
        Ok(())
    }

    fn query(&mut self, element: &[u8]) -> Result<(), CryptoError> {
        self.ensure_phase("query", &[RoundPhase::Idle, RoundPhase::Querying])?;
        let prepared = self.prepare(element)?;
        self.pending.push(prepared);
        self.phase = RoundPhase::Querying;
        Ok(())
    }

    fn query_all(&mut self, elements: &[Vec<u8>]) -> Result<(), CryptoError> {
        self.ensure_phase("query", &[RoundPhase::Idle, RoundPhase::Querying])?;
        if elements.is_empty() {
            return Ok(());
        }
        let prepared = self.pool.install(|| {
            elements
                .par_iter()
                .map(|e| self.prepare(e))
                .collect::<Result<Vec<_>, _>>()
        })?;
        self.pending.extend(prepared);
        self.phase = RoundPhase::Querying;
        debug!("[Requêtes] {} élément(s) en file", self.pending.len());
        Ok(())
    }

    fn combine(&mut self) -> Result<(), CryptoError> {
        self.ensure_phase("combine", &[RoundPhase::Idle, RoundPhase::Querying])?;
        // les requêtes ne sont consommées qu'en cas de succès
        let combined = self.pool.install(|| {
            self.pending
                .par_iter()
                .map(|q| self.blind(q))
                .collect::<Result<Vec<_>, _>>()
        })?;
        self.pending.clear();
        self.combined = combined;
        self.phase = RoundPhase::Combined;
        Ok(())
    }

    fn decrypt(&mut self) -> Result<Vec<ResponsePair>, CryptoError> {
        self.ensure_phase("decrypt", &[RoundPhase::Combined])?;
        let pairs = self.pool.install(|| {
            self.combined
                .par_iter()
                .map(|pair| self.open(pair))
                .collect::<Result<Vec<_>, _>>()
        })?;
        self.combined.clear();
        self.phase = RoundPhase::Decrypted;
        Ok(pairs)
    }

    fn reset_round(&mut self) {
        self.pending.clear();
        self.combined.clear();
        self.phase = RoundPhase::Idle;
    }

    fn dump_parameters(&self) -> FilterParameters {
        FilterParameters {
            mode: self.mode,
            modulus_bits: self.keypair.public_key.n.bits(),
            filter_bins: self.enc_bins.len(),
            nhashes: self.nhashes,
            max_concurrent_queries: self.max_concurrent_queries,
            workers: self.pool.current_num_threads(),
            pending_queries: self.pending.len(),
            phase: self.phase,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Fabrique : buildFilter + newEncryptedHandle
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PaillierFilterBuilder {
    pub key_bits:               u64,
    pub fp_log2:                u32,
    pub max_concurrent_queries: usize,
    pub threads:                usize,
}

impl FilterBuilder for PaillierFilterBuilder {
    type Handle = PaillierBloomFilter;

    fn build(&self, holder_elements: &[Vec<u8>], mode: Mode) -> Result<PaillierBloomFilter, CryptoError> {
        let canonical: Vec<Vec<u8>> = holder_elements.iter().map(|e| canonical_bytes(e)).collect();
        let filter = BloomFilter::build(&canonical, canonical.len(), self.fp_log2);
        PaillierBloomFilter::new(&filter, self.key_bits, mode, self.max_concurrent_queries, self.threads)
    }
}
