// =========================================================
// pso_bloom — exécution du protocole PSO sur filtre de Bloom chiffré
//
// Tire deux ensembles indépendants (détenteur / requêteur), construit le
// filtre chiffré une seule fois puis exécute le ou les modes demandés.
// =========================================================

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info, LevelFilter};

use pso_bloom::{EncryptedFilter, Mode, PsoConfig, PsoError, PsoOrchestrator, PsoResult, PsoSession, RoundReport};

#[derive(Parser, Debug)]
#[command(
    name = "pso_bloom",
    about = "Opérations ensemblistes privées (union, intersection, cardinalité) sur filtre de Bloom chiffré Paillier"
)]
struct Cli {
    /// Fichier de configuration JSON (les options ci-dessous le surchargent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Taille du module Paillier en bits (1024 ou 2048 en pratique)
    #[arg(short = 'k', long)]
    key_bits: Option<u64>,

    /// Taille des ensembles
    #[arg(short = 'n', long)]
    set_size: Option<usize>,

    /// Nombre maximal de threads de travail
    #[arg(short = 'm', long)]
    threads: Option<usize>,

    /// Fichier de sortie des logs (ajout en fin de fichier)
    #[arg(short = 'f', long)]
    log_file: Option<PathBuf>,

    /// union | intersection | cardinality | all (ou 0..3)
    #[arg(long)]
    mode: Option<Mode>,

    /// Domaine = facteur · taille d'ensemble
    #[arg(long)]
    domain_factor: Option<u64>,

    /// Probabilité de faux positif = 2^-fp_log2
    #[arg(long)]
    fp_log2: Option<u32>,

    /// Borne sur les requêtes simultanées
    #[arg(long = "max-concurrent")]
    max_concurrent_queries: Option<usize>,

    /// Tirage i.i.d. des ensembles (doublons possibles)
    #[arg(long)]
    allow_duplicates: bool,
}

impl Cli {
    fn into_config(self) -> Result<PsoConfig, PsoError> {
        let mut config = match &self.config {
            Some(path) => PsoConfig::from_json_file(path)?,
            None => PsoConfig::default(),
        };
        if let Some(v) = self.key_bits { config.key_bits = v; }
        if let Some(v) = self.set_size { config.set_size = v; }
        if let Some(v) = self.threads { config.threads = v; }
        if let Some(v) = self.mode { config.mode = v; }
        if let Some(v) = self.domain_factor { config.domain_factor = v; }
        if let Some(v) = self.fp_log2 { config.fp_log2 = v; }
        if let Some(v) = self.max_concurrent_queries { config.max_concurrent_queries = v; }
        if self.allow_duplicates { config.unique_sets = false; }
        if self.log_file.is_some() { config.log_file = self.log_file; }
        Ok(config)
    }
}

// Niveau Info par défaut, RUST_LOG prioritaire ; fichier si demandé
fn init_logging(log_file: Option<&Path>) -> Result<(), PsoError> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder
        .try_init()
        .map_err(|e| PsoError::Config(format!("initialisation des logs : {e}")))
}

fn print_summary(config: &PsoConfig, reports: &[RoundReport]) {
    println!("\n==============================================");
    println!("    RÉSUMÉ — PSO sur filtre de Bloom chiffré");
    println!("==============================================");
    println!("  |ensembles|   = {}", config.set_size);
    println!("  domaine       = [0, {})", config.domain());
    println!("  |n|           = {} bits", config.key_bits);
    println!("  faux positifs = 2^-{}", config.fp_log2);
    for report in reports {
        let outcome = match &report.result {
            PsoResult::Elements(items) => format!("{} élément(s)", items.len()),
            PsoResult::Cardinality(count) => format!("cardinal = {count}"),
        };
        println!("\n  [{}] {}", report.mode, outcome);
        match report.timings.build {
            Some(d) => println!("    Construction du filtre : {:.3?}", d),
            None    => println!("    Construction du filtre : —  (poignée réutilisée)"),
        }
        println!("    Requêtes + combinaison : {:.3?}", report.timings.query_combine);
        println!("    Déchiffrement          : {:.3?}", report.timings.decrypt);
        println!("    Décodage               : {:.3?}", report.timings.decode);
        println!("    Total                  : {:.3?}", report.timings.total());
    }
    println!("==============================================");
}

fn run(cli: Cli) -> Result<(), PsoError> {
    let config = cli.into_config()?;
    init_logging(config.log_file.as_deref())?;
    config.validate()?;
    info!(
        "Taille de clé : {} bits, {} thread(s) max, mode {}",
        config.key_bits, config.threads, config.mode
    );

    let orchestrator = PsoOrchestrator::from_config(&config)?;
    let mut session = PsoSession::generate(orchestrator)?;
    let reports = session.run_modes(config.mode)?;

    if let Some(handle) = session.handle() {
        info!("Paramètres finaux : {:?}", handle.dump_parameters());
    }
    print_summary(&config, &reports);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        eprintln!("[FATAL] {e}");
        std::process::exit(1);
    }
}
