// Cœur PSO : générateur d'ensembles, décodeur de réponses, orchestrateur

pub mod error;
pub mod set_gen;
pub mod decoder;
pub mod orchestrator;

pub use error::PsoError;
pub use set_gen::{element_bytes, generate_set, generate_set_os};
pub use decoder::{decode, PsoResult};
pub use orchestrator::{PhaseTimings, PsoOrchestrator, PsoSession, RoundReport, RunOutcome};
