//! End-to-end trial runs with scripted agents.
//!
//! Covers the three reference scenarios plus the run-wide properties:
//! phase monotonicity, single witness on the stand, transcript order,
//! objection/ruling pairing, agent failure isolation, and determinism.

mod common;

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use proceedings::transcript::VERDICT_SUBJECT;
use proceedings::{
    ActionType, Agent, AgentResult, CourtroomHandle, Decision, EngineError, EntryKind,
    FixedSequence, ObjectionPolicy, Pacing, Role, RulingKind, ScriptedAgent, SimulationSettings,
    TrialEvent, TrialPhase, Verdict,
};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

// ── Scenario: bench trial with judge and prosecutor ────────────────────

#[tokio::test]
async fn test_bench_trial_with_two_participants_reaches_verdict() {
    init_tracing();
    let bus = journaled_bus();
    let settings = SimulationSettings {
        enable_objections: false,
        ..quick_settings()
    };
    let mut court = builder_with(minimal_criminal_case(), ok_agent())
        .settings(settings)
        .events(bus.clone())
        .build()
        .unwrap();

    let outcome = court.start().await.unwrap();

    assert!(outcome.completed);
    assert!(!outcome.stopped);
    assert!(!outcome.phases_entered.contains(&TrialPhase::JuryDeliberation));
    assert!(!outcome.phases_entered.contains(&TrialPhase::JurySelection));
    assert!(matches!(
        outcome.verdict,
        Some(Verdict::Guilty) | Some(Verdict::NotGuilty)
    ));

    let actions = court.get_action_history();
    let last_in_verdict = actions
        .iter()
        .rev()
        .find(|a| a.phase == TrialPhase::Verdict)
        .expect("verdict phase produced an action");
    let speaker = court.get_current_speaker().unwrap();
    assert_eq!(speaker.id, last_in_verdict.participant_id);
    assert_eq!(speaker.role, Role::Judge);

    let events = bus.journal();
    assert_eq!(events.first().map(|e| e.event_type()), Some("simulation:started"));
    assert_eq!(count_type(&events, "simulation:completed"), 1);
    assert_eq!(count_type(&events, "jury:deliberation:started"), 0);
    assert!(!court.is_active());
}

// ── Scenario: civil jury of six, every agent says "OK" ─────────────────

#[tokio::test]
async fn test_civil_jury_trial_records_exactly_one_verdict_ruling() {
    let bus = journaled_bus();
    let settings = SimulationSettings {
        jury_size: 6,
        enable_objections: true,
        ..SimulationSettings::default()
    };
    let mut court = builder_with(civil_jury_case(6), ok_agent())
        .settings(settings)
        .events(bus.clone())
        .build()
        .unwrap();

    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);
    assert!(outcome.phases_entered.contains(&TrialPhase::JurySelection));
    assert!(outcome.phases_entered.contains(&TrialPhase::JuryDeliberation));
    assert!(outcome.phases_entered.contains(&TrialPhase::PlaintiffCase));
    assert!(!outcome.phases_entered.contains(&TrialPhase::Rebuttal));
    assert!(matches!(
        outcome.verdict,
        Some(Verdict::Liable) | Some(Verdict::NotLiable)
    ));

    let transcript = court.get_transcript();
    let actions = court.get_action_history();
    assert!(!transcript.is_empty());
    assert_eq!(transcript.len(), actions.len());
    assert!(transcript.iter().all(|e| e.content == "OK"));

    let handle = court.handle();
    let verdict_rulings: Vec<_> = handle
        .get_rulings()
        .into_iter()
        .filter(|r| r.subject == VERDICT_SUBJECT)
        .collect();
    assert_eq!(verdict_rulings.len(), 1);
    assert!(verdict_rulings[0]
        .reasoning
        .as_deref()
        .unwrap_or_default()
        .starts_with("jury"));

    let events = bus.journal();
    assert_eq!(count_type(&events, "jury:deliberation:started"), 1);
    assert_eq!(count_type(&events, "action:generated"), actions.len());
}

// ── Scenario: stop during deliberation ──────────────────────────────────

#[tokio::test]
async fn test_stop_during_deliberation_silences_the_run() {
    let settings = SimulationSettings {
        jury_size: 6,
        enable_objections: false,
        ..SimulationSettings::default()
    };
    let court = builder_with(civil_jury_case(6), ok_agent())
        .settings(settings)
        .pacing(Pacing {
            action_delay: Duration::ZERO,
            deliberation_time: Duration::from_secs(3600),
        })
        .build()
        .unwrap();
    let mut rx = court.handle().subscribe();
    let (handle, join) = court.spawn();

    loop {
        match rx.recv().await {
            Ok(TrialEvent::JuryDeliberationStarted { .. }) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => panic!("bus closed before deliberation"),
        }
    }

    assert!(handle.stop());
    assert!(!handle.is_active());

    let outcome = tokio::time::timeout(Duration::from_secs(5), join)
        .await
        .expect("run unwinds promptly after stop")
        .unwrap()
        .unwrap();
    assert!(outcome.stopped);
    assert!(!outcome.completed);
    assert_eq!(outcome.verdict, None);

    let mut after_stop = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => after_stop.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    assert!(after_stop.iter().all(|e| e.action().is_none()));
    assert!(after_stop
        .iter()
        .any(|e| e.event_type() == "simulation:stopped"));
    assert!(!handle.is_active());
    assert!(!handle.stop());
}

/// Holds its answer until released.
struct HeldAnswer {
    release: Arc<tokio::sync::Notify>,
}

#[async_trait]
impl Agent for HeldAnswer {
    async fn think(&self, _context: &str) {}

    async fn generate_statement(&self, _prompt: &str) -> AgentResult<String> {
        self.release.notified().await;
        Ok("Arrived after stop.".into())
    }
}

#[tokio::test]
async fn test_answer_arriving_after_stop_is_discarded() {
    let release = Arc::new(tokio::sync::Notify::new());
    let court = builder_with(minimal_criminal_case(), ok_agent())
        .settings(quick_settings())
        .agent(
            "da",
            Arc::new(HeldAnswer {
                release: release.clone(),
            }),
        )
        .build()
        .unwrap();
    let mut rx = court.handle().subscribe();
    let (handle, join) = court.spawn();

    loop {
        match rx.recv().await {
            Ok(TrialEvent::AgentProcessing {
                participant_id,
                in_flight: true,
                ..
            }) if participant_id == "da" => break,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => panic!("bus closed before the prosecutor spoke"),
        }
    }
    assert!(handle.stop());
    release.notify_one();

    let outcome = tokio::time::timeout(Duration::from_secs(5), join)
        .await
        .expect("run unwinds once the held answer returns")
        .unwrap()
        .unwrap();
    assert!(outcome.stopped);
    assert!(!outcome.completed);

    assert!(handle
        .get_action_history()
        .iter()
        .all(|a| a.content != "Arrived after stop."));
    assert!(handle
        .get_transcript()
        .iter()
        .all(|e| e.content != "Arrived after stop."));
    let mut after_stop = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => after_stop.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    assert!(after_stop.iter().all(|e| e.action().is_none()));
}

// ── Properties ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_phases_only_move_forward() {
    let bus = journaled_bus();
    let mut court = builder_with(contested_criminal_case(), ok_agent())
        .settings(SimulationSettings {
            jury_size: 0,
            ..SimulationSettings::default()
        })
        .events(bus.clone())
        .build()
        .unwrap();
    court.start().await.unwrap();

    let phases = phases_changed(&bus.journal());
    assert_eq!(phases.first(), Some(&TrialPhase::PreTrial));
    assert!(phases.windows(2).all(|w| w[0].ordinal() < w[1].ordinal()));
    assert!(phases.contains(&TrialPhase::Rebuttal));
    assert!(phases.contains(&TrialPhase::Verdict));
}

/// Records who is on the stand whenever its witness speaks.
struct StandWatcher {
    handle: Arc<OnceLock<CourtroomHandle>>,
    seen: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl Agent for StandWatcher {
    async fn think(&self, _context: &str) {}

    async fn generate_statement(&self, _prompt: &str) -> AgentResult<String> {
        if let Some(handle) = self.handle.get() {
            self.seen.lock().unwrap().push(handle.get_state().current_witness);
        }
        Ok("I saw it.".into())
    }
}

#[tokio::test]
async fn test_one_witness_on_the_stand_at_a_time() {
    let slot = Arc::new(OnceLock::new());
    let officer = Arc::new(StandWatcher {
        handle: slot.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let alibi = Arc::new(StandWatcher {
        handle: slot.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let mut court = builder_with(contested_criminal_case(), ok_agent())
        .settings(quick_settings())
        .agent("officer", officer.clone())
        .agent("alibi", alibi.clone())
        .build()
        .unwrap();
    slot.set(court.handle()).unwrap();

    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);

    let officer_seen = officer.seen.lock().unwrap().clone();
    let alibi_seen = alibi.seen.lock().unwrap().clone();
    assert!(!officer_seen.is_empty());
    assert!(!alibi_seen.is_empty());
    assert!(officer_seen.iter().all(|w| w.as_deref() == Some("officer")));
    assert!(alibi_seen.iter().all(|w| w.as_deref() == Some("alibi")));
    assert_eq!(court.handle().get_state().current_witness, None);
}

#[tokio::test]
async fn test_transcript_order_matches_action_events() {
    let bus = journaled_bus();
    let mut court = builder_with(contested_criminal_case(), ok_agent())
        .settings(quick_settings())
        .events(bus.clone())
        .build()
        .unwrap();
    court.start().await.unwrap();

    let from_events: Vec<String> = bus
        .journal()
        .iter()
        .filter_map(|e| e.action())
        .filter_map(|a| a.entry_id.clone())
        .collect();
    let transcript_ids: Vec<String> = court.get_transcript().into_iter().map(|e| e.id).collect();
    assert_eq!(from_events, transcript_ids);
}

#[tokio::test]
async fn test_every_objection_has_a_paired_ruling() {
    // 0.0 wins every draw: objections always raised and always sustained.
    let mut court = builder_with(contested_criminal_case(), ok_agent())
        .settings(quick_settings())
        .random(FixedSequence::constant(0.0))
        .objection_policy(ObjectionPolicy::always())
        .build()
        .unwrap();
    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);

    let transcript = court.get_transcript();
    let rulings = court.handle().get_rulings();
    let objections: Vec<_> = transcript
        .iter()
        .filter(|e| e.kind == EntryKind::Objection)
        .collect();
    assert!(!objections.is_empty());

    for objection in &objections {
        let paired: Vec<_> = rulings
            .iter()
            .filter(|r| r.entry_id.as_deref() == Some(objection.id.as_str()))
            .collect();
        assert_eq!(paired.len(), 1, "objection {} ruled once", objection.id);
        assert_eq!(paired[0].kind, RulingKind::Objection);
        assert!(matches!(
            paired[0].decision,
            Decision::Sustained | Decision::Overruled
        ));
    }
    let objection_rulings = rulings
        .iter()
        .filter(|r| r.kind == RulingKind::Objection)
        .count();
    assert_eq!(objection_rulings, objections.len());
    assert!(rulings
        .iter()
        .filter(|r| r.kind == RulingKind::Objection)
        .all(|r| r.decision == Decision::Sustained));
    assert_eq!(court.handle().get_state().pending_objection, None);
}

/// Asks for a sidebar whenever it is told to object.
struct SidebarOnObjection {
    handle: Arc<OnceLock<CourtroomHandle>>,
}

#[async_trait]
impl Agent for SidebarOnObjection {
    async fn think(&self, _context: &str) {}

    async fn generate_statement(&self, prompt: &str) -> AgentResult<String> {
        if prompt.contains("Object on grounds") {
            if let Some(handle) = self.handle.get() {
                handle.request_sidebar();
            }
        }
        Ok("OK".into())
    }
}

#[tokio::test]
async fn test_sidebar_waits_until_the_objection_is_ruled_on() {
    let slot = Arc::new(OnceLock::new());
    let agent = Arc::new(SidebarOnObjection {
        handle: slot.clone(),
    });
    let mut court = builder_with(contested_criminal_case(), agent)
        .settings(SimulationSettings {
            enable_sidebar: true,
            ..quick_settings()
        })
        .random(FixedSequence::constant(0.0))
        .objection_policy(ObjectionPolicy::always())
        .build()
        .unwrap();
    slot.set(court.handle()).unwrap();

    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);

    let transcript = court.get_transcript();
    assert!(transcript.iter().any(|e| e.kind == EntryKind::Sidebar));
    let mut objections = 0;
    for (i, entry) in transcript.iter().enumerate() {
        if entry.kind == EntryKind::Objection {
            objections += 1;
            let next = transcript.get(i + 1).map(|e| e.kind);
            assert_eq!(next, Some(EntryKind::Ruling), "entry after objection {}", entry.id);
        }
    }
    assert!(objections > 0);
}

#[tokio::test]
async fn test_objections_disabled_means_none_raised() {
    let mut court = builder_with(contested_criminal_case(), ok_agent())
        .settings(SimulationSettings {
            enable_objections: false,
            ..quick_settings()
        })
        .random(FixedSequence::constant(0.0))
        .build()
        .unwrap();
    court.start().await.unwrap();
    assert!(court
        .get_transcript()
        .iter()
        .all(|e| e.kind != EntryKind::Objection));
}

#[tokio::test]
async fn test_failing_agent_degrades_to_fallback_text() {
    let mut court = builder_with(contested_criminal_case(), ok_agent())
        .settings(quick_settings())
        .agent("da", Arc::new(ScriptedAgent::failing()))
        .build()
        .unwrap();
    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);

    let transcript = court.get_transcript();
    let prosecutor_lines: Vec<_> = transcript.iter().filter(|e| e.speaker_id == "da").collect();
    assert!(!prosecutor_lines.is_empty());
    assert!(prosecutor_lines
        .iter()
        .all(|e| e.content.starts_with("[prosecutor ")));
    assert!(prosecutor_lines.iter().any(|e| e.content
        == "[prosecutor opening-statement] - Deliver your opening statement: outline what the evidence will show."));
}

#[tokio::test]
async fn test_unbound_participant_gets_fallback_text() {
    let mut court = proceedings::Courtroom::builder()
        .case(minimal_criminal_case())
        .settings(quick_settings())
        .pacing(Pacing::instant())
        .seed(3)
        .build()
        .unwrap();
    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);
    assert!(court
        .get_transcript()
        .iter()
        .all(|e| e.content.starts_with('[')));
}

#[tokio::test]
async fn test_same_seed_same_trial() {
    async fn run(seed: u64) -> (Option<Verdict>, Vec<String>, Vec<Decision>) {
        let mut court = builder_with(contested_criminal_case(), ok_agent())
            .settings(quick_settings())
            .objection_policy(ObjectionPolicy {
                probability: 0.5,
                ..ObjectionPolicy::default()
            })
            .seed(seed)
            .build()
            .unwrap();
        let outcome = court.start().await.unwrap();
        let actions = court
            .get_action_history()
            .into_iter()
            .map(|a| format!("{}:{}", a.participant_id, a.action_type))
            .collect();
        let decisions = court
            .handle()
            .get_rulings()
            .into_iter()
            .map(|r| r.decision)
            .collect();
        (outcome.verdict, actions, decisions)
    }

    let first = run(99).await;
    let second = run(99).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_scripted_evidence_is_introduced_and_ruled_on() {
    let case = contested_criminal_case()
        .with_evidence(proceedings::Evidence::new("ex-3", "Hearsay memo").inadmissible());
    let mut court = builder_with(case, ok_agent())
        .settings(SimulationSettings {
            enable_objections: false,
            ..quick_settings()
        })
        .build()
        .unwrap();
    court.start().await.unwrap();

    let state = court.handle().get_state();
    assert!(state.introduced_evidence.contains("ex-1"));
    assert!(state.introduced_evidence.contains("ex-2"));
    assert!(!state.introduced_evidence.contains("ex-3"));

    let rulings = court.handle().get_rulings();
    let memo = rulings
        .iter()
        .find(|r| r.kind == RulingKind::Admissibility && r.subject == "Hearsay memo")
        .unwrap();
    assert_eq!(memo.decision, Decision::Denied);
    assert!(court
        .get_action_history()
        .iter()
        .any(|a| a.action_type == ActionType::IntroduceEvidence));
}

#[tokio::test]
async fn test_exhibit_titled_verdict_keeps_a_single_verdict_ruling() {
    let case = minimal_criminal_case().with_evidence(proceedings::Evidence::new("ex-v", "Verdict"));
    let mut court = builder_with(case, ok_agent())
        .settings(SimulationSettings {
            enable_objections: false,
            ..quick_settings()
        })
        .build()
        .unwrap();
    court.start().await.unwrap();

    let rulings = court.handle().get_rulings();
    assert_eq!(rulings.iter().filter(|r| r.subject == VERDICT_SUBJECT).count(), 1);
    assert!(rulings
        .iter()
        .any(|r| r.kind == RulingKind::Admissibility && r.subject == "admissibility Verdict"));
}

#[tokio::test]
async fn test_absent_defense_is_never_called_on() {
    let judge = Arc::new(ScriptedAgent::constant("So ordered."));
    let mut court = builder_with(minimal_criminal_case(), ok_agent())
        .settings(SimulationSettings {
            enable_objections: false,
            ..quick_settings()
        })
        .agent("judge", judge.clone())
        .build()
        .unwrap();
    court.start().await.unwrap();

    let prompts = judge.prompts();
    assert!(prompts
        .iter()
        .any(|p| p.contains("Call on the prosecution to present its case.")));
    assert!(!prompts
        .iter()
        .any(|p| p.contains("Call on the defense to present its case.")));
}

#[tokio::test]
async fn test_prompts_carry_recent_actions_without_a_transcript() {
    let agent = Arc::new(ScriptedAgent::constant("Said in open court."));
    let mut court = builder_with(minimal_criminal_case(), agent.clone())
        .settings(SimulationSettings {
            enable_objections: false,
            record_transcript: false,
            ..quick_settings()
        })
        .build()
        .unwrap();
    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);
    assert!(court.get_transcript().is_empty());
    assert!(!court.get_action_history().is_empty());

    let prompts = agent.prompts();
    assert!(!prompts[0].contains("Recent proceedings:"));
    let last = prompts.last().unwrap();
    assert!(last.contains("Recent proceedings:"));
    assert!(last.contains("Said in open court."));
}

#[tokio::test]
async fn test_guilty_verdict_leads_to_sentencing() {
    // Zero threshold and no jitter: two admitted exhibits convict.
    let mut court = builder_with(contested_criminal_case(), ok_agent())
        .settings(SimulationSettings {
            enable_objections: false,
            ..quick_settings()
        })
        .verdict_calculator(proceedings::VerdictCalculator {
            threshold: 0.0,
            jitter: 0.0,
        })
        .build()
        .unwrap();
    let outcome = court.start().await.unwrap();

    assert_eq!(outcome.verdict, Some(Verdict::Guilty));
    assert_eq!(outcome.phases_entered.last(), Some(&TrialPhase::Sentencing));
    let last = court.get_action_history().pop().unwrap();
    assert_eq!(last.action_type, ActionType::Sentencing);
    assert_eq!(last.role, Role::Judge);
}

#[tokio::test]
async fn test_zero_speed_never_blocks() {
    let mut court = proceedings::Courtroom::builder()
        .case(minimal_criminal_case())
        .settings(SimulationSettings {
            realtime_speed: 0.0,
            ..quick_settings()
        })
        .agent("judge", ok_agent())
        .agent("da", ok_agent())
        .seed(1)
        .build()
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), court.start())
        .await
        .expect("default pacing at speed zero completes at once")
        .unwrap();
    assert!(outcome.completed);
}

// ── Invalid use ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let mut court = builder_with(minimal_criminal_case(), ok_agent())
        .settings(quick_settings())
        .build()
        .unwrap();
    court.start().await.unwrap();
    let len = court.get_transcript().len();

    let err = court.start().await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(court.get_transcript().len(), len);
}

#[test]
fn test_building_without_a_case_fails() {
    let err = proceedings::Courtroom::builder().build().unwrap_err();
    assert_eq!(err, EngineError::MissingCase);
}

#[test]
fn test_duplicate_participants_are_a_configuration_error() {
    let case = minimal_criminal_case().with_participant(judge());
    let err = proceedings::Courtroom::builder()
        .case(case)
        .build()
        .unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));
}

#[tokio::test]
async fn test_invalid_jury_size_skips_jury_phases() {
    let mut court = builder_with(civil_jury_case(3), ok_agent())
        .settings(SimulationSettings {
            jury_size: 3,
            ..SimulationSettings::default()
        })
        .build()
        .unwrap();
    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);
    assert!(!outcome.phases_entered.contains(&TrialPhase::JurySelection));
    assert!(!outcome.phases_entered.contains(&TrialPhase::JuryDeliberation));
}

// ── Demo case file ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_demo_case_file_runs_to_a_jury_verdict() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/state-v-faye.json");
    let case = proceedings::load_case(path).unwrap();
    assert_eq!(case.participants.len(), 13);

    let mut court = builder_with(case, ok_agent())
        .settings(SimulationSettings {
            jury_size: 6,
            ..SimulationSettings::default()
        })
        .build()
        .unwrap();
    let outcome = court.start().await.unwrap();
    assert!(outcome.completed);
    assert!(outcome.phases_entered.contains(&TrialPhase::JuryDeliberation));
    assert!(outcome.verdict.is_some());
}
