// =========================================================
// Orchestrateur PSO — un tour complet du protocole
//
//   1. construire (ou réutiliser) le filtre chiffré du détenteur
//   2. matérialiser l'ensemble du requêteur
//   3. soumettre toutes les requêtes          ┐ chronométré
//   4. combinaison homomorphe (barrière)      ┘
//   5. déchiffrement des paires               — chronométré
//   6. décodage selon le mode                 — chronométré
//   7. reset du tour, restitution de la poignée
//
// Toute erreur du collaborateur abandonne le tour : la poignée est
// détruite avec lui, aucun résultat partiel n'est rendu.
// =========================================================

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use num_bigint::BigUint;
use num_traits::Zero;

use crate::config::PsoConfig;
use crate::encbf::contract::{EncryptedFilter, FilterBuilder, Mode};
use crate::encbf::enc_bloom::PaillierFilterBuilder;
use crate::pso::decoder::{decode, PsoResult};
use crate::pso::error::PsoError;
use crate::pso::set_gen::{element_bytes, generate_set_os};

/// Durées par phase ; `build` absent quand la poignée est réutilisée.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseTimings {
    pub build:         Option<Duration>,
    pub query_combine: Duration,
    pub decrypt:       Duration,
    pub decode:        Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.build.unwrap_or_default() + self.query_combine + self.decrypt + self.decode
    }
}

pub struct RunOutcome<H> {
    pub mode:        Mode,
    pub result:      PsoResult,
    /// Poignée remise à zéro, réutilisable pour un tour suivant
    pub handle:      H,
    /// Ensemble du détenteur, si le filtre a été construit pendant ce tour
    pub holder_set:  Option<Vec<BigUint>>,
    pub querier_set: Vec<BigUint>,
    pub timings:     PhaseTimings,
}

fn to_bytes(set: &[BigUint]) -> Vec<Vec<u8>> {
    set.iter().map(element_bytes).collect()
}

fn log_parameters<H: EncryptedFilter>(handle: &H) {
    match serde_json::to_string(&handle.dump_parameters()) {
        Ok(json) => info!("[Paramètres] {json}"),
        Err(e) => warn!("[Paramètres] sérialisation impossible : {e}"),
    }
}

pub struct PsoOrchestrator<B: FilterBuilder> {
    builder:     B,
    set_size:    usize,
    domain:      BigUint,
    unique_sets: bool,
}

impl PsoOrchestrator<PaillierFilterBuilder> {
    /// Orchestrateur Paillier ; la configuration est validée avant tout calcul.
    pub fn from_config(config: &PsoConfig) -> Result<Self, PsoError> {
        config.validate()?;
        Ok(PsoOrchestrator::new(
            config.filter_builder(),
            config.set_size,
            config.domain(),
            config.unique_sets,
        ))
    }
}

impl<B: FilterBuilder> PsoOrchestrator<B> {
    pub fn new(builder: B, set_size: usize, domain: BigUint, unique_sets: bool) -> Self {
        PsoOrchestrator { builder, set_size, domain, unique_sets }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Ensemble fourni, ou tiré dans [0, domain)
    pub fn materialize(&self, supplied: Option<&[BigUint]>) -> Result<Vec<BigUint>, PsoError> {
        match supplied {
            Some(set) => Ok(set.to_vec()),
            None => generate_set_os(self.set_size, &self.domain, self.unique_sets),
        }
    }

    /// run(mode, holder?, querier?, handle?) -> (résultat, poignée).
    ///
    /// Avec une poignée existante, son filtre et ses clés sont réutilisés tels
    /// quels et `holder` est ignoré ; son mode est ajusté si besoin.
    pub fn run(
        &self,
        mode: Mode,
        holder: Option<&[BigUint]>,
        querier: Option<&[BigUint]>,
        handle: Option<B::Handle>,
    ) -> Result<RunOutcome<B::Handle>, PsoError> {
        if !mode.is_protocol_mode() {
            return Err(PsoError::Config(format!(
                "'{mode}' n'est pas un mode de protocole exécutable en un tour"
            )));
        }

        // ── 1. Filtre chiffré ────────────────────────────────
        let (mut handle, holder_set, build) = match handle {
            Some(mut existing) => {
                if existing.mode() != mode {
                    existing.set_mode(mode)?;
                }
                debug!("[Phase 1] poignée existante réutilisée ({mode})");
                (existing, None, None)
            }
            None => {
                let holder_set = self.materialize(holder)?;
                let t = Instant::now();
                let fresh = self.builder.build(&to_bytes(&holder_set), mode)?;
                let elapsed = t.elapsed();
                info!("[Phase 1] construction du filtre chiffré ({} éléments) : {:.3?}", holder_set.len(), elapsed);
                log_parameters(&fresh);
                (fresh, Some(holder_set), Some(elapsed))
            }
        };

        // ── 2. Ensemble du requêteur ─────────────────────────
        let querier_set = self.materialize(querier)?;
        if mode == Mode::Union && querier_set.iter().any(|e| e.is_zero()) {
            warn!("[Phase 2] l'élément 0 est indiscernable d'une correspondance en mode union");
        }

        // ── 3-4. Requêtes puis combinaison ───────────────────
        let t = Instant::now();
        handle.query_all(&to_bytes(&querier_set))?;
        handle.combine()?;
        let query_combine = t.elapsed();
        info!("[Phase 3] {} requête(s) + combinaison ({mode}) : {:.3?}", querier_set.len(), query_combine);

        // ── 5. Déchiffrement ─────────────────────────────────
        let t = Instant::now();
        let pairs = handle.decrypt()?;
        let decrypt = t.elapsed();
        info!("[Phase 4] déchiffrement de {} paire(s) : {:.3?}", pairs.len(), decrypt);

        // ── 6. Décodage ──────────────────────────────────────
        let t = Instant::now();
        let result = decode(mode, handle.public_modulus(), &pairs)?;
        let decode_time = t.elapsed();
        info!("[Phase 5] décodage ({mode}) -> {} : {:.3?}", result.size(), decode_time);

        // ── 7. Reset du tour ─────────────────────────────────
        handle.reset_round();

        Ok(RunOutcome {
            mode,
            result,
            handle,
            holder_set,
            querier_set,
            timings: PhaseTimings { build, query_combine, decrypt, decode: decode_time },
        })
    }
}

// ─────────────────────────────────────────────────────────
// Session : ensembles et poignée portés explicitement d'un tour à l'autre
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub mode:    Mode,
    pub result:  PsoResult,
    pub timings: PhaseTimings,
}

pub struct PsoSession<B: FilterBuilder> {
    orchestrator: PsoOrchestrator<B>,
    holder_set:   Vec<BigUint>,
    querier_set:  Vec<BigUint>,
    handle:       Option<B::Handle>,
}

impl<B: FilterBuilder> PsoSession<B> {
    pub fn new(orchestrator: PsoOrchestrator<B>, holder_set: Vec<BigUint>, querier_set: Vec<BigUint>) -> Self {
        PsoSession { orchestrator, holder_set, querier_set, handle: None }
    }

    /// Session sur deux ensembles tirés indépendamment.
    pub fn generate(orchestrator: PsoOrchestrator<B>) -> Result<Self, PsoError> {
        let holder_set = orchestrator.materialize(None)?;
        let querier_set = orchestrator.materialize(None)?;
        Ok(Self::new(orchestrator, holder_set, querier_set))
    }

    pub fn holder_set(&self) -> &[BigUint] {
        &self.holder_set
    }

    pub fn querier_set(&self) -> &[BigUint] {
        &self.querier_set
    }

    pub fn handle(&self) -> Option<&B::Handle> {
        self.handle.as_ref()
    }

    /// Un tour ; le filtre n'est construit qu'au premier. Un tour en échec
    /// détruit la poignée.
    pub fn run(&mut self, mode: Mode) -> Result<RoundReport, PsoError> {
        let handle = self.handle.take();
        let outcome = self.orchestrator.run(
            mode,
            Some(self.holder_set.as_slice()),
            Some(self.querier_set.as_slice()),
            handle,
        )?;
        self.handle = Some(outcome.handle);
        Ok(RoundReport { mode, result: outcome.result, timings: outcome.timings })
    }

    /// Mode::All : union, intersection puis cardinalité sur la même poignée.
    pub fn run_modes(&mut self, mode: Mode) -> Result<Vec<RoundReport>, PsoError> {
        let modes: &[Mode] = if mode == Mode::All { &Mode::PROTOCOL_MODES } else { std::slice::from_ref(&mode) };
        modes.iter().map(|&m| self.run(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::crypto_error::CryptoError;
    use crate::encbf::contract::{FilterParameters, ResponsePair, RoundPhase};

    // Double de test : rejoue des paires fixées et trace les appels
    struct ReplayFilter {
        n:       BigUint,
        mode:    Mode,
        pairs:   Vec<ResponsePair>,
        queried: Vec<Vec<u8>>,
        calls:   Vec<&'static str>,
        fail_combine: bool,
    }

    impl EncryptedFilter for ReplayFilter {
        fn public_modulus(&self) -> &BigUint { &self.n }
        fn mode(&self) -> Mode { self.mode }
        fn set_mode(&mut self, mode: Mode) -> Result<(), CryptoError> {
            self.calls.push("set_mode");
            self.mode = mode;
            Ok(())
        }
        fn query(&mut self, element: &[u8]) -> Result<(), CryptoError> {
            self.calls.push("query");
            self.queried.push(element.to_vec());
            Ok(())
        }
        fn combine(&mut self) -> Result<(), CryptoError> {
            self.calls.push("combine");
            if self.fail_combine {
                return Err(CryptoError::InvalidInput("combine".to_string()));
            }
            Ok(())
        }
        fn decrypt(&mut self) -> Result<Vec<ResponsePair>, CryptoError> {
            self.calls.push("decrypt");
            Ok(self.pairs.clone())
        }
        fn reset_round(&mut self) {
            self.calls.push("reset");
            self.queried.clear();
        }
        fn dump_parameters(&self) -> FilterParameters {
            FilterParameters {
                mode: self.mode,
                modulus_bits: self.n.bits(),
                filter_bins: 0,
                nhashes: 0,
                max_concurrent_queries: 1,
                workers: 1,
                pending_queries: self.queried.len(),
                phase: RoundPhase::Idle,
            }
        }
    }

    struct ReplayBuilder {
        pairs:        Vec<ResponsePair>,
        builds:       Cell<usize>,
        fail_combine: bool,
    }

    impl ReplayBuilder {
        fn new(pairs: Vec<ResponsePair>) -> Self {
            ReplayBuilder { pairs, builds: Cell::new(0), fail_combine: false }
        }
    }

    impl FilterBuilder for ReplayBuilder {
        type Handle = ReplayFilter;

        fn build(&self, _holder: &[Vec<u8>], mode: Mode) -> Result<ReplayFilter, CryptoError> {
            self.builds.set(self.builds.get() + 1);
            Ok(ReplayFilter {
                n: BigUint::from(143u32),
                mode,
                pairs: self.pairs.clone(),
                queried: Vec::new(),
                calls: Vec::new(),
                fail_combine: self.fail_combine,
            })
        }
    }

    fn pairs() -> Vec<ResponsePair> {
        vec![ResponsePair::from((35u32, 5u32)), ResponsePair::from((0u32, 1u32))]
    }

    fn orchestrator(builder: ReplayBuilder) -> PsoOrchestrator<ReplayBuilder> {
        PsoOrchestrator::new(builder, 2, BigUint::from(10u32), true)
    }

    #[test]
    fn test_run_builds_and_sequences_phases() {
        let orch = orchestrator(ReplayBuilder::new(pairs()));
        let out = orch.run(Mode::Union, None, None, None).unwrap();

        assert_eq!(out.result, PsoResult::Elements(vec![BigUint::from(7u32)]));
        assert_eq!(out.handle.calls, vec!["query", "query", "combine", "decrypt", "reset"]);
        assert!(out.handle.queried.is_empty());
        assert_eq!(out.holder_set.as_ref().map(Vec::len), Some(2));
        assert_eq!(out.querier_set.len(), 2);
        assert!(out.timings.build.is_some());
        assert_eq!(orch.builder().builds.get(), 1);
    }

    #[test]
    fn test_run_reuses_handle_and_switches_mode() {
        let orch = orchestrator(ReplayBuilder::new(pairs()));
        let querier = vec![BigUint::from(3u32), BigUint::from(4u32)];
        let first = orch.run(Mode::Union, None, Some(querier.as_slice()), None).unwrap();

        let second = orch.run(Mode::Cardinality, Some(&[][..]), Some(querier.as_slice()), Some(first.handle)).unwrap();
        assert_eq!(second.result, PsoResult::Cardinality(1));
        assert!(second.holder_set.is_none());
        assert!(second.timings.build.is_none());
        assert_eq!(second.handle.mode, Mode::Cardinality);
        assert!(second.handle.calls.contains(&"set_mode"));
        assert_eq!(orch.builder().builds.get(), 1);
    }

    #[test]
    fn test_supplied_sets_are_used_as_is() {
        let orch = orchestrator(ReplayBuilder::new(vec![]));
        let holder = vec![BigUint::from(9u32)];
        let querier = vec![BigUint::from(258u32), BigUint::from(1u32), BigUint::from(4u32)];
        let out = orch.run(Mode::Intersection, Some(holder.as_slice()), Some(querier.as_slice()), None).unwrap();
        assert_eq!(out.holder_set, Some(holder));
        assert_eq!(out.querier_set, querier);
        assert_eq!(out.handle.calls.iter().filter(|c| **c == "query").count(), 3);
        assert_eq!(out.result, PsoResult::Elements(vec![]));
    }

    #[test]
    fn test_all_mode_rejected_before_any_work() {
        let orch = orchestrator(ReplayBuilder::new(pairs()));
        assert!(matches!(orch.run(Mode::All, None, None, None), Err(PsoError::Config(_))));
        assert_eq!(orch.builder().builds.get(), 0);
    }

    #[test]
    fn test_collaborator_failure_aborts_run() {
        let mut builder = ReplayBuilder::new(pairs());
        builder.fail_combine = true;
        let orch = orchestrator(builder);
        assert!(matches!(orch.run(Mode::Union, None, None, None), Err(PsoError::Collaborator(_))));
    }

    #[test]
    fn test_arithmetic_failure_propagates() {
        // 11 | 143 : b non inversible
        let orch = orchestrator(ReplayBuilder::new(vec![ResponsePair::from((3u32, 11u32))]));
        assert!(matches!(orch.run(Mode::Union, None, None, None), Err(PsoError::Arithmetic(_))));
    }

    #[test]
    fn test_session_runs_all_modes_on_one_handle() {
        let orch = orchestrator(ReplayBuilder::new(pairs()));
        let mut session = PsoSession::generate(orch).unwrap();
        let reports = session.run_modes(Mode::All).unwrap();

        let modes: Vec<Mode> = reports.iter().map(|r| r.mode).collect();
        assert_eq!(modes, Mode::PROTOCOL_MODES.to_vec());
        assert_eq!(reports[0].result, PsoResult::Elements(vec![BigUint::from(7u32)]));
        assert_eq!(reports[1].result, PsoResult::Elements(vec![]));
        assert_eq!(reports[2].result, PsoResult::Cardinality(1));
        assert!(reports[0].timings.build.is_some());
        assert!(reports[2].timings.build.is_none());
        assert_eq!(session.handle().map(|h| h.mode), Some(Mode::Cardinality));
        assert_eq!(session.holder_set().len(), 2);
        assert_eq!(session.querier_set().len(), 2);
    }
}
