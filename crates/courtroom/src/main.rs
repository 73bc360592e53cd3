mod roster;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use proceedings::{
    load_case, Case, Courtroom, CourtroomConfig, CourtroomHandle, HumanInput, LegalSystem,
    ModelBackend, Ruling, TranscriptEntry, TrialEvent, TrialOutcome,
};
use roster::{build_roster, AgentSource};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "courtroom", version, about = "Run agent-driven trial simulations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one trial to its verdict.
    Run(RunArgs),
    /// Health-check every configured backend once.
    Probe {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Case file (JSON)
    #[arg(long)]
    case: PathBuf,
    /// Runner configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum)]
    jurisdiction: Option<JurisdictionArg>,
    /// Scripted statements instead of model backends
    #[arg(long)]
    offline: bool,
    /// Write the transcript and rulings as JSON
    #[arg(long)]
    transcript_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum JurisdictionArg {
    CommonLaw,
    Louisiana,
}

impl From<JurisdictionArg> for LegalSystem {
    fn from(arg: JurisdictionArg) -> Self {
        match arg {
            JurisdictionArg::CommonLaw => LegalSystem::CommonLaw,
            JurisdictionArg::Louisiana => LegalSystem::Louisiana,
        }
    }
}

#[derive(Debug, Serialize)]
struct TranscriptExport {
    case_title: String,
    legal_system: LegalSystem,
    exported_at: chrono::DateTime<Utc>,
    outcome: TrialOutcome,
    transcript: Vec<TranscriptEntry>,
    rulings: Vec<Ruling>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Probe { config } => probe(config.as_deref()).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<CourtroomConfig> {
    match path {
        Some(path) => CourtroomConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(CourtroomConfig::default()),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(system) = args.jurisdiction {
        config.jurisdiction.system = system.into();
    }

    let mut case = load_case(&args.case)
        .with_context(|| format!("loading case {}", args.case.display()))?;
    case.legal_system = config.jurisdiction.system;
    info!(
        title = %case.title,
        participants = case.participants.len(),
        system = %case.legal_system,
        "Case loaded"
    );

    let probe_cancel = CancellationToken::new();
    let source = if args.offline {
        AgentSource::Offline
    } else {
        let pool = Arc::new(config.backend_pool().context("building backend pool")?);
        let healthy = pool.probe_once().await;
        if healthy == 0 {
            warn!("No backend answered its health check; statements will fall back to placeholders");
        }
        pool.spawn_health_probe(config.health.interval(), probe_cancel.clone());
        AgentSource::Model {
            backend: pool as Arc<dyn ModelBackend>,
            max_tokens: config.max_tokens(),
        }
    };

    let human_input = config.simulation.allow_user_intervention;
    let built = build_roster(&case, &source, human_input);

    let mut builder = Courtroom::builder()
        .case(case)
        .settings(config.simulation.clone())
        .roster(built.roster)
        .objection_policy(config.objections.clone())
        .verdict_calculator(config.verdict)
        .pacing(config.pacing());
    if let Some(seed) = config.seed {
        builder = builder.seed(seed);
    }
    let court = builder.build().context("building courtroom")?;

    let events = court.handle().subscribe();
    let (handle, join) = court.spawn();

    let interrupted = CancellationToken::new();
    let printer = tokio::spawn(print_events(events, built.human_inputs, interrupted.clone()));
    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping the trial");
            interrupt.stop();
            interrupted.cancel();
        }
    });

    let outcome = join.await.context("trial task panicked")??;
    probe_cancel.cancel();
    // Let the printer drain the tail of the stream; it exits on completion.
    if tokio::time::timeout(Duration::from_millis(500), printer).await.is_err() {
        warn!("Event printer did not finish");
    }

    report(&outcome);
    if let Some(path) = &args.transcript_out {
        write_transcript(path, &handle, &outcome)?;
        info!(path = %path.display(), "Transcript written");
    }
    Ok(())
}

/// Stream events to stdout and answer input requests from stdin.
///
/// Returns when the trial completes or `interrupted` fires. Returning drops
/// the input queues, which releases a participant still waiting on a line.
async fn print_events(
    mut events: tokio::sync::broadcast::Receiver<TrialEvent>,
    inputs: HashMap<String, HumanInput>,
    interrupted: CancellationToken,
) {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let received = tokio::select! {
            biased;
            _ = interrupted.cancelled() => break,
            received = events.recv() => received,
        };
        match received {
            Ok(event) => {
                println!("{}", event.summary_line());
                if let TrialEvent::UserInputRequested {
                    participant_id,
                    role,
                    instruction,
                    ..
                } = &event
                {
                    let Some(input) = inputs.get(participant_id) else {
                        continue;
                    };
                    println!("> {} ({}):", role.title(), instruction);
                    let read = tokio::select! {
                        biased;
                        _ = interrupted.cancelled() => break,
                        read = stdin.next_line() => read,
                    };
                    let line = match read {
                        Ok(Some(line)) => line,
                        Ok(None) => String::new(),
                        Err(e) => {
                            warn!("stdin closed: {e}");
                            String::new()
                        }
                    };
                    if input.send(line).await.is_err() {
                        break;
                    }
                }
                if matches!(event, TrialEvent::SimulationCompleted { .. }) {
                    break;
                }
            }
            Err(RecvError::Lagged(n)) => warn!(missed = n, "Event stream lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn report(outcome: &TrialOutcome) {
    match outcome.verdict {
        Some(verdict) if outcome.hung_jury => println!("Verdict: {verdict} (hung jury)"),
        Some(verdict) => println!("Verdict: {verdict}"),
        None if outcome.stopped => println!("Trial stopped before a verdict"),
        None => println!("No verdict reached"),
    }
    println!(
        "Phases: {}  Transcript entries: {}  Rulings: {}",
        outcome.phases_entered.len(),
        outcome.transcript_len,
        outcome.rulings
    );
}

fn export(case: &Case, handle: &CourtroomHandle, outcome: &TrialOutcome) -> TranscriptExport {
    TranscriptExport {
        case_title: case.title.clone(),
        legal_system: case.legal_system,
        exported_at: Utc::now(),
        outcome: outcome.clone(),
        transcript: handle.get_transcript(),
        rulings: handle.get_rulings(),
    }
}

fn write_transcript(path: &Path, handle: &CourtroomHandle, outcome: &TrialOutcome) -> Result<()> {
    let doc = export(&handle.get_case(), handle, outcome);
    let json = serde_json::to_string_pretty(&doc).context("serializing transcript")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

async fn probe(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let pool = config.backend_pool().context("building backend pool")?;
    let healthy = pool.probe_once().await;
    for status in pool.status() {
        println!(
            "{:<16} {}",
            status.name,
            if status.healthy { "healthy" } else { "unreachable" }
        );
    }
    info!(healthy, total = pool.len(), "Probe complete");
    if healthy == 0 {
        anyhow::bail!("no backend is healthy");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proceedings::{Agent, CaseType, HumanAgent, Participant, Role, SimulationSettings};

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from([
            "courtroom",
            "run",
            "--case",
            "case.json",
            "--seed",
            "9",
            "--jurisdiction",
            "louisiana",
            "--offline",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.jurisdiction, Some(JurisdictionArg::Louisiana));
        assert!(args.offline);
        assert!(args.transcript_out.is_none());
    }

    #[test]
    fn test_unknown_jurisdiction_rejected() {
        let parsed = Cli::try_parse_from([
            "courtroom",
            "run",
            "--case",
            "c.json",
            "--jurisdiction",
            "civil-code",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_config_reported() {
        let err = load_config(Some(Path::new("/nonexistent/courtroom.toml"))).unwrap_err();
        assert!(err.to_string().contains("loading config"));
    }

    #[tokio::test]
    async fn test_interrupt_releases_a_waiting_participant() {
        let (agent, input) = HumanAgent::channel("Ms. Guidry", 1);
        let inputs = HashMap::from([("clerk".to_string(), input)]);
        let (tx, rx) = tokio::sync::broadcast::channel(8);
        tx.send(TrialEvent::UserInputRequested {
            participant_id: "clerk".into(),
            role: Role::CourtClerk,
            instruction: "Swear in the witness.".into(),
            timestamp: Utc::now(),
        })
        .unwrap();

        let interrupted = CancellationToken::new();
        interrupted.cancel();
        tokio::time::timeout(Duration::from_secs(1), print_events(rx, inputs, interrupted))
            .await
            .expect("printer returns once interrupted");

        assert!(agent.generate_statement("Swear in the witness.").await.is_err());
    }

    #[tokio::test]
    async fn test_offline_run_writes_transcript() {
        let case = Case::new("State v. Doe", CaseType::Criminal)
            .with_participant(Participant::new("judge", "Judge Reyes", Role::Judge))
            .with_participant(Participant::new("da", "Ms. Park", Role::Prosecutor));
        let built = build_roster(&case, &AgentSource::Offline, false);
        let mut court = Courtroom::builder()
            .case(case)
            .settings(SimulationSettings {
                jury_size: 0,
                ..SimulationSettings::default()
            })
            .roster(built.roster)
            .pacing(proceedings::Pacing::instant())
            .seed(3)
            .build()
            .unwrap();
        let outcome = court.start().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.json");
        write_transcript(&path, &court.handle(), &outcome).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["case_title"], "State v. Doe");
        assert_eq!(doc["legal_system"], "common-law");
        assert!(!doc["transcript"].as_array().unwrap().is_empty());
        assert!(doc["outcome"]["completed"].as_bool().unwrap());
    }
}
