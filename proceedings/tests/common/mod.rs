//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use proceedings::engine::CourtroomBuilder;
use proceedings::{
    Agent, Case, CaseType, Courtroom, Evidence, EventBus, Pacing, Participant, Personality, Role,
    ScriptedAgent, SharedEventBus, Side, SimulationSettings, TrialEvent,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn judge() -> Participant {
    Participant::new("judge", "Judge Reyes", Role::Judge)
}

pub fn prosecutor() -> Participant {
    Participant::new("da", "Ms. Park", Role::Prosecutor)
}

pub fn defense() -> Participant {
    Participant::new("pd", "Mr. Hale", Role::DefenseAttorney)
}

pub fn witness(id: &str, side: Side) -> Participant {
    Participant::new(id, format!("Witness {id}"), Role::Witness).with_side(side)
}

pub fn juror(n: usize) -> Participant {
    Participant::new(format!("juror-{n}"), format!("Juror {n}"), Role::JuryMember)
        .with_personality(Personality::default())
}

/// Judge and prosecutor only.
pub fn minimal_criminal_case() -> Case {
    Case::new("State v. Doe", CaseType::Criminal)
        .with_participant(judge())
        .with_participant(prosecutor())
}

/// Both counsel, one witness per side, one exhibit per side.
pub fn contested_criminal_case() -> Case {
    Case::new("State v. Roe", CaseType::Criminal)
        .with_summary("Burglary of a hardware store at night.")
        .with_participant(judge())
        .with_participant(prosecutor())
        .with_participant(defense())
        .with_participant(Participant::new("def", "Sam Roe", Role::Defendant))
        .with_participant(witness("officer", Side::Prosecution))
        .with_participant(witness("alibi", Side::Defense))
        .with_evidence(Evidence::new("ex-1", "Security footage").with_description("Camera 3, 02:14"))
        .with_evidence(Evidence::new("ex-2", "Receipt").offered_by(Side::Defense))
}

/// Civil case with a jury of `jurors`.
pub fn civil_jury_case(jurors: usize) -> Case {
    let mut case = Case::new("Acme v. Birch", CaseType::Civil)
        .with_participant(judge())
        .with_participant(Participant::new("pa", "Ms. Ortiz", Role::PlaintiffAttorney))
        .with_participant(defense())
        .with_participant(witness("engineer", Side::Prosecution))
        .with_evidence(Evidence::new("contract", "Supply contract"));
    for n in 1..=jurors {
        case = case.with_participant(juror(n));
    }
    case
}

pub fn quick_settings() -> SimulationSettings {
    SimulationSettings {
        jury_size: 0,
        ..SimulationSettings::default()
    }
}

pub fn journaled_bus() -> SharedEventBus {
    EventBus::with_journal(100_000).shared()
}

/// Builder with every participant bound to `agent`, no pacing, and a seed.
pub fn builder_with(case: Case, agent: Arc<dyn Agent>) -> CourtroomBuilder {
    let ids: Vec<String> = case.participants.iter().map(|p| p.id.clone()).collect();
    let mut builder = Courtroom::builder().case(case).pacing(Pacing::instant()).seed(11);
    for id in ids {
        builder = builder.agent(id, agent.clone());
    }
    builder
}

pub fn ok_agent() -> Arc<dyn Agent> {
    Arc::new(ScriptedAgent::constant("OK"))
}

pub fn phases_changed(events: &[TrialEvent]) -> Vec<proceedings::TrialPhase> {
    events
        .iter()
        .filter_map(|e| match e {
            TrialEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect()
}

pub fn count_type(events: &[TrialEvent], event_type: &str) -> usize {
    events.iter().filter(|e| e.event_type() == event_type).count()
}
