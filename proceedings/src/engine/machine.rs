//! The courtroom phase machine.
//!
//! A [`Courtroom`] walks the phase sequence once, dispatching each phase to
//! the handler its [`Jurisdiction`] registers. Handlers talk to participants
//! only through the helpers in the "Handler helpers" section below; those
//! helpers own prompt building, agent calls, fallbacks, recording, events,
//! and pacing.
//!
//! ```text
//! start() ─▶ next phase ─▶ gate ─▶ phase:changed ─▶ handler ─▶ … ─▶ verdict
//!                           │                          │
//!                     stop / pause /             speak() per step:
//!                     config swap                gate → agent → record → pace
//! ```

use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::control::{Pacing, RunControl};
use super::handle::CourtroomHandle;
use super::state::Docket;
use super::{
    ActionType, CourtAction, EngineError, EngineResult, SimulationSettings, TrialPhase,
};
use crate::agent::{fallback_statement, Agent, AgentRoster, PromptContext};
use crate::case::{Case, CaseType, Participant, Role, Side};
use crate::events::{EventBus, SharedEventBus, TrialEvent};
use crate::jurisdiction::Jurisdiction;
use crate::objection::ObjectionPolicy;
use crate::random::{RandomSource, SeededRandom};
use crate::transcript::{
    ruling_subject, Decision, Ruling, RulingKind, TranscriptEntry, VERDICT_SUBJECT,
};
use crate::turn::OppositionTable;
use crate::verdict::{
    JurorBallot, JuryTally, MajorityRule, ScoreInputs, Verdict, VerdictCalculator,
    VerdictFinding,
};

/// Result of a finished or stopped run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub verdict: Option<Verdict>,
    pub hung_jury: bool,
    pub completed: bool,
    pub stopped: bool,
    pub phases_entered: Vec<TrialPhase>,
    pub transcript_len: usize,
    pub rulings: usize,
}

/// A single trial run.
pub struct Courtroom {
    handle: CourtroomHandle,
    roster: AgentRoster,
    settings: SimulationSettings,
    jurisdiction: Jurisdiction,
    objections: ObjectionPolicy,
    opposition: OppositionTable,
    rng: Box<dyn RandomSource>,
    pacing: Pacing,
    calculator: VerdictCalculator,
    tally: Option<JuryTally>,
}

impl Courtroom {
    pub fn builder() -> CourtroomBuilder {
        CourtroomBuilder::default()
    }

    pub fn handle(&self) -> CourtroomHandle {
        self.handle.clone()
    }

    /// Run on a new task; steer it through the returned handle.
    pub fn spawn(self) -> (CourtroomHandle, JoinHandle<EngineResult<TrialOutcome>>) {
        let handle = self.handle();
        let join = tokio::spawn(async move {
            let mut courtroom = self;
            courtroom.start().await
        });
        (handle, join)
    }

    /// Run the trial from pre-trial to its last phase.
    ///
    /// Fails with [`EngineError::InvalidState`] if this courtroom already
    /// started, finished, or was stopped. A stop during the run is not an
    /// error; the outcome reports `stopped`.
    pub async fn start(&mut self) -> EngineResult<TrialOutcome> {
        self.handle.control.begin()?;

        let title = self.handle.read().case.title.clone();
        info!(
            case = %title,
            jurisdiction = %self.jurisdiction.system(),
            jury_size = self.settings.jury_size,
            "Trial started"
        );
        self.handle.publish(TrialEvent::SimulationStarted {
            case_title: title,
            timestamp: Utc::now(),
        });

        match self.run_phases().await {
            Ok(()) => {
                self.handle.control.finish();
                let verdict = self.handle.read().state.verdict;
                if let Some(verdict) = verdict {
                    info!(verdict = %verdict, "Trial completed");
                    self.handle.publish(TrialEvent::SimulationCompleted {
                        verdict,
                        timestamp: Utc::now(),
                    });
                } else {
                    warn!("Trial ran out of phases without a verdict");
                }
            }
            Err(EngineError::Stopped) => {
                debug!("Run unwound after stop");
            }
            Err(e) => {
                self.handle.control.finish();
                return Err(e);
            }
        }

        Ok(self.outcome())
    }

    // ── Read accessors ──────────────────────────────────────────────────

    pub fn get_current_phase(&self) -> TrialPhase {
        self.handle.get_current_phase()
    }

    pub fn get_transcript(&self) -> Vec<TranscriptEntry> {
        self.handle.get_transcript()
    }

    pub fn get_action_history(&self) -> Vec<CourtAction> {
        self.handle.get_action_history()
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    pub fn get_current_speaker(&self) -> Option<Participant> {
        self.handle.get_current_speaker()
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn jurisdiction(&self) -> &Jurisdiction {
        &self.jurisdiction
    }

    pub fn events(&self) -> SharedEventBus {
        self.handle.events()
    }

    // ── Run loop ────────────────────────────────────────────────────────

    async fn run_phases(&mut self) -> EngineResult<()> {
        let mut last: Option<TrialPhase> = None;
        loop {
            self.phase_gate().await?;
            let Some(phase) = self.next_phase(last) else {
                break;
            };
            self.enter_phase(phase)?;

            match self.jurisdiction.handler(phase) {
                Some(handler) => handler(self).await?,
                None => warn!(phase = %phase, "No handler registered; phase skipped"),
            }
            last = Some(phase);

            if !self.settings.auto_progress && self.next_phase(last).is_some() {
                self.handle.pause();
            }
        }
        Ok(())
    }

    /// Next phase to enter after `last`, skipping conditional phases whose
    /// preconditions do not hold.
    fn next_phase(&self, last: Option<TrialPhase>) -> Option<TrialPhase> {
        let docket = self.handle.read();
        let case = &docket.case;
        let state = &docket.state;

        TrialPhase::sequence(case.case_type)
            .into_iter()
            .filter(|p| last.map_or(true, |l| p.ordinal() > l.ordinal()))
            .find(|phase| match phase {
                _ if state.verdict.is_some() => *phase == TrialPhase::Sentencing
                    && state.verdict.is_some_and(Verdict::is_adverse)
                    && case.participant_with_role(Role::Judge).is_some(),
                TrialPhase::JurySelection | TrialPhase::JuryDeliberation => {
                    self.is_jury_trial(case)
                }
                TrialPhase::Rebuttal => {
                    case.case_type.is_criminal()
                        && !case.evidence.is_empty()
                        && case.participant_with_role(Role::Prosecutor).is_some()
                }
                TrialPhase::Sentencing => false,
                _ => true,
            })
    }

    fn is_jury_trial(&self, case: &Case) -> bool {
        self.settings.has_valid_jury_size()
            && case.participant_with_role(Role::JuryMember).is_some()
    }

    fn enter_phase(&mut self, phase: TrialPhase) -> EngineResult<()> {
        {
            let mut docket = self.handle.write();
            docket.state.transition(phase)?;
            docket.case.set_phase(phase);
        }
        info!(phase = %phase, "Entering phase");
        self.handle.publish(TrialEvent::PhaseChanged {
            phase,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn apply_pending_changes(&mut self) {
        let pending = self.handle.control.take_pending();
        if pending.is_empty() {
            return;
        }
        if let Some(enabled) = pending.witnesses_enabled {
            info!(enabled, "Witness examination toggled");
            self.settings.enable_witnesses = enabled;
        }
        if let Some(system) = pending.legal_system {
            if system != self.jurisdiction.system() {
                info!(from = %self.jurisdiction.system(), to = %system, "Switching jurisdiction");
                self.jurisdiction = Jurisdiction::for_system(system);
                self.handle.write().case.legal_system = system;
            }
        }
    }

    fn outcome(&self) -> TrialOutcome {
        let docket = self.handle.read();
        TrialOutcome {
            verdict: docket.state.verdict,
            hung_jury: docket.state.hung_jury,
            completed: docket.state.completed,
            stopped: self.handle.control.is_stopped(),
            phases_entered: docket.state.phases_entered(),
            transcript_len: docket.case.transcript().len(),
            rulings: docket.case.rulings().len(),
        }
    }

    // ── Step gates ──────────────────────────────────────────────────────

    /// Between phases: everything a step gate does, plus deferred configuration.
    async fn phase_gate(&mut self) -> EngineResult<()> {
        self.gate().await?;
        self.apply_pending_changes();
        Ok(())
    }

    /// Before every step: honour stop, wait out a pause, open a requested sidebar.
    async fn gate(&mut self) -> EngineResult<()> {
        self.handle.control.ensure_not_stopped()?;
        self.handle.control.wait_while_paused().await?;
        if self.handle.control.take_sidebar_request() {
            self.run_sidebar().await?;
        }
        Ok(())
    }

    async fn run_sidebar(&mut self) -> EngineResult<()> {
        let Some(judge) = self.find_participant_by_role(Role::Judge) else {
            warn!("Sidebar requested without a judge; ignored");
            return Ok(());
        };
        let phase = {
            let mut docket = self.handle.write();
            docket.state.sidebar_active = true;
            docket.state.current_phase
        };
        info!(phase = %phase, "Sidebar opened");
        self.handle.publish(TrialEvent::SidebarStarted {
            phase,
            timestamp: Utc::now(),
        });

        self.utter(
            &judge,
            ActionType::Sidebar,
            "Call counsel to the bench for a sidebar conference out of the jury's hearing.",
            None,
        )
        .await?;
        for side in [Side::Prosecution, Side::Defense] {
            if let Some(counsel) = self.counsel_for(side) {
                self.utter(
                    &counsel,
                    ActionType::Sidebar,
                    "Raise your concern with the judge at the sidebar.",
                    Some(Role::Judge),
                )
                .await?;
            }
        }

        if !self.settings.auto_progress {
            self.handle.control.wait_sidebar_release().await?;
        }

        self.handle.write().state.sidebar_active = false;
        info!(phase = %phase, "Sidebar closed");
        self.handle.publish(TrialEvent::SidebarEnded {
            phase,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    // ── Agent pipeline ──────────────────────────────────────────────────

    /// Generate, record, and pace one utterance without passing a gate.
    async fn utter(
        &mut self,
        speaker: &Arc<Participant>,
        action: ActionType,
        instruction: &str,
        target: Option<Role>,
    ) -> EngineResult<Option<String>> {
        let (phase, prompt, heard) = self.prepare_prompt(speaker, action, instruction, target);
        self.handle.write().state.current_speaker = Some(speaker.id.clone());

        let content = match self.roster.get(&speaker.id) {
            Some(agent) => {
                consult_agent(
                    agent,
                    &self.handle.events,
                    speaker,
                    action,
                    instruction,
                    &prompt,
                    &heard,
                    self.settings.allow_user_intervention,
                )
                .await
            }
            None => {
                warn!(participant = %speaker.id, action = %action, "No agent bound; using fallback");
                fallback_statement(speaker.role, action, instruction)
            }
        };

        // A result that lands after stop is dropped.
        self.handle.control.ensure_not_stopped()?;

        let entry_id = self.record_action(speaker, phase, action, content);
        self.handle.control.pace(self.pacing.action_delay).await?;
        Ok(entry_id)
    }

    fn prepare_prompt(
        &self,
        speaker: &Participant,
        action: ActionType,
        instruction: &str,
        target: Option<Role>,
    ) -> (TrialPhase, String, String) {
        let docket = self.handle.read();
        let phase = docket.state.current_phase;
        let window = self.settings.detail_level.context_window();
        // Without a transcript the window comes from the action log.
        let untranscribed: Vec<TranscriptEntry> = if self.settings.record_transcript {
            Vec::new()
        } else {
            let skip = docket.actions.len().saturating_sub(window);
            docket.actions[skip..].iter().map(CourtAction::to_entry).collect()
        };
        let mut context = PromptContext::new(
            &docket.case,
            speaker,
            phase,
            action,
            instruction,
            self.settings.detail_level,
        )
        .targeting(target);
        if !self.settings.record_transcript {
            context = context.with_recent(&untranscribed);
        }
        let heard = context
            .recent
            .last()
            .map(|e| e.render())
            .unwrap_or_else(|| format!("{} begins in {}", phase.title(), docket.case.title));
        let prompt = context.render();
        (phase, prompt, heard)
    }

    fn record_action(
        &self,
        speaker: &Participant,
        phase: TrialPhase,
        action: ActionType,
        content: String,
    ) -> Option<String> {
        let mut record = CourtAction::new(
            phase,
            speaker.id.clone(),
            speaker.name.clone(),
            speaker.role,
            action,
            content,
        );
        {
            let mut docket = self.handle.write();
            if self.settings.record_transcript {
                record.entry_id = Some(docket.case.record_mut().append_entry(record.to_entry()));
            }
            docket.actions.push(record.clone());
        }

        debug!(
            phase = %phase,
            participant = %speaker.id,
            action = %action,
            "Action recorded"
        );
        let entry_id = record.entry_id.clone();
        self.handle.publish(TrialEvent::ActionGenerated {
            action: record,
            timestamp: Utc::now(),
        });
        entry_id
    }

    fn record_ruling(&self, ruling: Ruling) {
        debug!(kind = ?ruling.kind, subject = %ruling.subject, decision = %ruling.decision, "Ruling recorded");
        self.handle.write().case.record_mut().append_ruling(ruling);
    }

    // ── Handler helpers ─────────────────────────────────────────────────
    //
    // The sanctioned surface for phase handlers, including jurisdiction
    // overrides.

    pub fn case_type(&self) -> CaseType {
        self.handle.read().case.case_type
    }

    pub fn case_title(&self) -> String {
        self.handle.read().case.title.clone()
    }

    /// First participant holding `role`.
    pub fn find_participant_by_role(&self, role: Role) -> Option<Arc<Participant>> {
        self.handle.read().case.participant_with_role(role).cloned()
    }

    pub fn participants_by_role(&self, role: Role) -> Vec<Arc<Participant>> {
        self.handle
            .read()
            .case
            .participants_with_role(role)
            .cloned()
            .collect()
    }

    /// Seated jurors: the first `jury_size` jury members, or none for a bench trial.
    pub fn jurors(&self) -> Vec<Arc<Participant>> {
        if !self.settings.has_valid_jury_size() {
            return Vec::new();
        }
        let mut jurors = self.participants_by_role(Role::JuryMember);
        jurors.truncate(self.settings.jury_size);
        jurors
    }

    /// Draw with probability `p` from the run's random source.
    pub fn draw(&mut self, p: f64) -> bool {
        self.rng.chance(p)
    }

    /// The judge opens the current phase. Skipped without a judge.
    pub async fn announce_phase(&mut self, instruction: &str) -> EngineResult<()> {
        match self.find_participant_by_role(Role::Judge) {
            Some(judge) => {
                self.speak(&judge, ActionType::Announcement, instruction).await?;
            }
            None => debug!("No judge to announce the phase"),
        }
        Ok(())
    }

    /// Generate and record one statement; returns the transcript entry id.
    pub async fn speak(
        &mut self,
        speaker: &Arc<Participant>,
        action: ActionType,
        instruction: &str,
    ) -> EngineResult<Option<String>> {
        self.speak_to(speaker, action, instruction, None).await
    }

    /// Like [`speak`](Self::speak), addressed to `target`.
    pub async fn speak_to(
        &mut self,
        speaker: &Arc<Participant>,
        action: ActionType,
        instruction: &str,
        target: Option<Role>,
    ) -> EngineResult<Option<String>> {
        self.gate().await?;
        self.utter(speaker, action, instruction, target).await
    }

    /// The judge states `decision` on `subject` and the ruling is recorded.
    ///
    /// Returns `false` without recording anything when there is no judge.
    pub async fn rule(
        &mut self,
        kind: RulingKind,
        subject: &str,
        decision: Decision,
        entry_id: Option<String>,
    ) -> EngineResult<bool> {
        if self.find_participant_by_role(Role::Judge).is_none() {
            return Ok(false);
        }
        self.gate().await?;
        self.rule_now(kind, subject, decision, entry_id).await
    }

    /// [`rule`](Self::rule) without the gate, for a ruling that must follow
    /// its triggering statement with nothing in between.
    pub(crate) async fn rule_now(
        &mut self,
        kind: RulingKind,
        subject: &str,
        decision: Decision,
        entry_id: Option<String>,
    ) -> EngineResult<bool> {
        let Some(judge) = self.find_participant_by_role(Role::Judge) else {
            return Ok(false);
        };
        let subject = ruling_subject(kind, subject);
        let instruction = format!("Rule on the {subject}. Your ruling: {decision}.");
        self.utter(&judge, ActionType::Ruling, &instruction, None).await?;
        self.record_ruling(
            Ruling::new(Some(judge.id.clone()), kind, subject, decision).for_entry(entry_id),
        );
        Ok(true)
    }

    /// `filer` moves for `motion` and the judge grants or denies it.
    pub async fn file_motion(
        &mut self,
        filer: &Arc<Participant>,
        motion: &str,
        grant_probability: f64,
    ) -> EngineResult<Option<Decision>> {
        if self.find_participant_by_role(Role::Judge).is_none() {
            debug!(motion, "No judge to hear the motion; skipped");
            return Ok(None);
        }
        let entry = self
            .speak_to(
                filer,
                ActionType::Motion,
                &format!("Present and argue the {motion}."),
                Some(Role::Judge),
            )
            .await?;
        let decision = if self.draw(grant_probability) {
            Decision::Granted
        } else {
            Decision::Denied
        };
        self.rule(RulingKind::Motion, motion, decision, entry).await?;
        Ok(Some(decision))
    }

    /// Facts the verdict is computed from.
    pub fn score_inputs(&self) -> ScoreInputs {
        let docket = self.handle.read();
        let evidence_count = docket
            .case
            .evidence
            .iter()
            .filter(|e| {
                e.offered_by == Side::Prosecution
                    && e.admissible
                    && docket.state.introduced_evidence.contains(&e.id)
            })
            .count();
        ScoreInputs {
            evidence_count,
            sustained_objections: docket.case.record().sustained_objections(),
            total_evidence: docket.case.evidence.len(),
        }
    }

    /// Instruct, retire, and poll the jury under `rule`.
    ///
    /// Returns `None` when no jurors are seated.
    pub async fn deliberate(
        &mut self,
        rule: MajorityRule,
        instruction: &str,
    ) -> EngineResult<Option<JuryTally>> {
        let jurors = self.jurors();
        if jurors.is_empty() {
            warn!("Deliberation without seated jurors; skipped");
            return Ok(None);
        }

        if let Some(judge) = self.find_participant_by_role(Role::Judge) {
            self.speak_to(&judge, ActionType::JuryInstruction, instruction, Some(Role::JuryMember))
                .await?;
        }

        self.handle.write().state.jury_deliberating = true;
        info!(jurors = jurors.len(), rule = %rule, "Jury retires to deliberate");
        self.handle.publish(TrialEvent::JuryDeliberationStarted {
            jurors: jurors.len(),
            timestamp: Utc::now(),
        });
        self.handle.control.pace(self.pacing.deliberation_time).await?;

        let case_type = self.case_type();
        let strength = self.score_inputs().evidence_strength();
        let mut ballots = Vec::with_capacity(jurors.len());
        for juror in &jurors {
            let ballot = JurorBallot::cast(juror, strength);
            let leaning = Verdict::for_case(case_type, ballot.adverse);
            self.speak(
                juror,
                ActionType::Deliberation,
                &format!("Share your view of the evidence with the other jurors. You lean toward {leaning}."),
            )
            .await?;
            ballots.push(ballot);
        }

        let tally = JuryTally::count(ballots, rule, case_type);
        self.handle.write().state.jury_deliberating = false;
        info!(result = %tally.summary_line(), "Jury reached a decision");
        self.tally = Some(tally.clone());
        Ok(Some(tally))
    }

    /// The jury's decision if one was reached, else the bench score.
    pub fn find_verdict(&mut self) -> VerdictFinding {
        if let Some(tally) = &self.tally {
            return VerdictFinding::from(tally);
        }
        let inputs = self.score_inputs();
        let case_type = self.case_type();
        VerdictFinding::from(self.calculator.assess(case_type, inputs, self.rng.as_mut()))
    }

    pub fn last_tally(&self) -> Option<&JuryTally> {
        self.tally.as_ref()
    }

    /// Record the verdict: state and the single verdict ruling change together.
    pub fn conclude(&mut self, finding: &VerdictFinding) -> EngineResult<()> {
        self.handle.control.ensure_not_stopped()?;
        let judge_id = self
            .find_participant_by_role(Role::Judge)
            .map(|j| j.id.clone());
        let decision = if finding.verdict.is_adverse() {
            Decision::Granted
        } else {
            Decision::Denied
        };
        {
            let mut docket = self.handle.write();
            docket.state.deliver_verdict(finding.verdict, finding.hung)?;
            let entry_id = docket.case.transcript().last().map(|e| e.id.clone());
            docket.case.record_mut().append_ruling(
                Ruling::new(judge_id, RulingKind::Procedural, VERDICT_SUBJECT, decision)
                    .with_reasoning(finding.reasoning.clone())
                    .for_entry(entry_id),
            );
        }
        info!(verdict = %finding.verdict, hung = finding.hung, reasoning = %finding.reasoning, "Verdict delivered");
        Ok(())
    }

    // Crate-internal accessors for the turn and objection modules.

    pub(crate) fn handle_ref(&self) -> &CourtroomHandle {
        &self.handle
    }

    pub(crate) fn objection_policy(&self) -> &ObjectionPolicy {
        &self.objections
    }

    pub(crate) fn opposition(&self) -> &OppositionTable {
        &self.opposition
    }

    pub(crate) fn random(&mut self) -> &mut dyn RandomSource {
        self.rng.as_mut()
    }
}

impl std::fmt::Debug for Courtroom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Courtroom")
            .field("handle", &self.handle)
            .field("jurisdiction", &self.jurisdiction.system())
            .field("roster", &self.roster)
            .finish_non_exhaustive()
    }
}

/// One agent call with observer reporting and fallback substitution.
#[allow(clippy::too_many_arguments)]
async fn consult_agent(
    agent: Arc<dyn Agent>,
    events: &EventBus,
    speaker: &Participant,
    action: ActionType,
    instruction: &str,
    prompt: &str,
    heard: &str,
    allow_user_intervention: bool,
) -> String {
    let fallback = fallback_statement(speaker.role, action, instruction);

    if agent.is_interactive() {
        if !allow_user_intervention {
            debug!(participant = %speaker.id, "User intervention disabled; using fallback");
            return fallback;
        }
        events.publish(TrialEvent::UserInputRequested {
            participant_id: speaker.id.clone(),
            role: speaker.role,
            instruction: instruction.to_string(),
            timestamp: Utc::now(),
        });
    }

    events.publish(TrialEvent::AgentProcessing {
        participant_id: speaker.id.clone(),
        participant_name: speaker.name.clone(),
        reason: action.to_string(),
        in_flight: true,
        timestamp: Utc::now(),
    });

    agent.think(heard).await;
    let result = agent.generate_statement(prompt).await;

    events.publish(TrialEvent::AgentProcessing {
        participant_id: speaker.id.clone(),
        participant_name: speaker.name.clone(),
        reason: action.to_string(),
        in_flight: false,
        timestamp: Utc::now(),
    });

    match result {
        Ok(text) => text,
        Err(e) => {
            warn!(participant = %speaker.id, action = %action, error = %e, "Agent failed; using fallback");
            fallback
        }
    }
}

// ── Builder ─────────────────────────────────────────────────────────────

/// Assembles a [`Courtroom`]; only the case is required.
#[derive(Default)]
pub struct CourtroomBuilder {
    case: Option<Case>,
    settings: SimulationSettings,
    roster: AgentRoster,
    jurisdiction: Option<Jurisdiction>,
    rng: Option<Box<dyn RandomSource>>,
    events: Option<SharedEventBus>,
    objections: ObjectionPolicy,
    opposition: OppositionTable,
    pacing: Pacing,
    calculator: VerdictCalculator,
}

impl CourtroomBuilder {
    pub fn case(mut self, case: Case) -> Self {
        self.case = Some(case);
        self
    }

    pub fn settings(mut self, settings: SimulationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn roster(mut self, roster: AgentRoster) -> Self {
        self.roster = roster;
        self
    }

    pub fn agent(mut self, participant_id: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        self.roster.bind(participant_id, agent);
        self
    }

    /// Overrides the jurisdiction implied by the case's legal system.
    pub fn jurisdiction(mut self, jurisdiction: Jurisdiction) -> Self {
        self.jurisdiction = Some(jurisdiction);
        self
    }

    pub fn random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn seed(self, seed: u64) -> Self {
        self.random(SeededRandom::new(seed))
    }

    pub fn events(mut self, events: SharedEventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn objection_policy(mut self, policy: ObjectionPolicy) -> Self {
        self.objections = policy;
        self
    }

    pub fn opposition(mut self, table: OppositionTable) -> Self {
        self.opposition = table;
        self
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn verdict_calculator(mut self, calculator: VerdictCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Fails with [`EngineError::MissingCase`] when no case was given.
    pub fn build(self) -> EngineResult<Courtroom> {
        let mut case = self.case.ok_or(EngineError::MissingCase)?;
        case.validate()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;

        let jurisdiction = self
            .jurisdiction
            .unwrap_or_else(|| Jurisdiction::for_system(case.legal_system));
        case.legal_system = jurisdiction.system();

        if self.settings.has_invalid_jury_size() {
            warn!(
                jury_size = self.settings.jury_size,
                "Jury size outside 6..=12; jury phases will be skipped"
            );
        }
        if self.objections.probability.is_nan() || !(0.0..=1.0).contains(&self.objections.probability) {
            return Err(EngineError::Configuration(format!(
                "objection probability {} is outside 0..=1",
                self.objections.probability
            )));
        }

        let control = RunControl::new(self.settings.realtime_speed, self.settings.enable_sidebar);
        let handle = CourtroomHandle {
            docket: Arc::new(RwLock::new(Docket::new(case))),
            control: Arc::new(control),
            events: self.events.unwrap_or_else(|| EventBus::new().shared()),
        };

        Ok(Courtroom {
            handle,
            roster: self.roster,
            settings: self.settings,
            jurisdiction,
            objections: self.objections,
            opposition: self.opposition,
            rng: self.rng.unwrap_or_else(|| Box::new(SeededRandom::from_entropy())),
            pacing: self.pacing,
            calculator: self.calculator,
            tally: None,
        })
    }
}
