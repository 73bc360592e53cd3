//! Phase handler table and the common-law handlers.
//!
//! A handler is a plain function pointer from `&mut Courtroom` to a boxed
//! future, so a table can be cloned and selectively overridden by a
//! jurisdiction without touching the other entries.

use std::collections::HashMap;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::{ActionType, Courtroom, EngineResult, TrialPhase};
use crate::case::{Role, Side};
use crate::verdict::VerdictFinding;

/// Runs one phase to completion.
pub type PhaseHandler = for<'a> fn(&'a mut Courtroom) -> BoxFuture<'a, EngineResult<()>>;

/// Chance the judge grants a pre-trial motion.
pub const MOTION_GRANT_PROBABILITY: f64 = 0.3;

/// Phase → handler map.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<TrialPhase, PhaseHandler>,
}

impl HandlerTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The common-law table: one handler per phase.
    pub fn base() -> Self {
        Self::empty()
            .with(TrialPhase::PreTrial, pre_trial)
            .with(TrialPhase::JurySelection, jury_selection)
            .with(TrialPhase::OpeningStatements, opening_statements)
            .with(TrialPhase::PlaintiffCase, case_in_chief)
            .with(TrialPhase::ProsecutionCase, case_in_chief)
            .with(TrialPhase::DefenseCase, defense_case)
            .with(TrialPhase::Rebuttal, rebuttal)
            .with(TrialPhase::ClosingArguments, closing_arguments)
            .with(TrialPhase::JuryDeliberation, jury_deliberation)
            .with(TrialPhase::Verdict, verdict)
            .with(TrialPhase::Sentencing, sentencing)
    }

    pub fn get(&self, phase: TrialPhase) -> Option<PhaseHandler> {
        self.handlers.get(&phase).copied()
    }

    /// Replace one entry, returning the handler it displaced.
    pub fn replace(&mut self, phase: TrialPhase, handler: PhaseHandler) -> Option<PhaseHandler> {
        self.handlers.insert(phase, handler)
    }

    pub fn with(mut self, phase: TrialPhase, handler: PhaseHandler) -> Self {
        self.replace(phase, handler);
        self
    }

    pub fn contains(&self, phase: TrialPhase) -> bool {
        self.handlers.contains_key(&phase)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phases: Vec<_> = TrialPhase::ALL
            .iter()
            .filter(|p| self.contains(**p))
            .collect();
        f.debug_struct("HandlerTable").field("phases", &phases).finish()
    }
}

// ── Common-law handlers ─────────────────────────────────────────────────

pub fn pre_trial(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        court
            .announce_phase("Call the case, confirm the parties are present, and invite pre-trial motions.")
            .await?;

        let Some(defense) = court.counsel_for(Side::Defense) else {
            debug!("No defense counsel; no pre-trial motions");
            return Ok(());
        };
        let motions: &[&str] = if court.case_type().is_criminal() {
            &[
                "motion to suppress evidence",
                "motion in limine",
                "motion for a bill of particulars",
                "motion to sever",
            ]
        } else {
            &[
                "motion for summary judgment",
                "motion in limine",
                "motion to compel discovery",
                "motion to exclude expert testimony",
            ]
        };
        let count = court.settings().detail_level.exchanges_per_segment();
        for motion in motions.iter().take(count) {
            court.file_motion(&defense, motion, MOTION_GRANT_PROBABILITY).await?;
        }
        Ok(())
    })
}

pub fn jury_selection(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        court
            .announce_phase("Explain voir dire to the venire and invite counsel to question the panel.")
            .await?;

        let jurors = court.jurors();
        let questioners: Vec<_> = [Side::Prosecution, Side::Defense]
            .into_iter()
            .filter_map(|side| court.counsel_for(side))
            .collect();
        if questioners.is_empty() {
            warn!("No counsel to conduct voir dire");
        }
        let examined = court.settings().detail_level.exchanges_per_segment();

        for (i, juror) in jurors.iter().take(examined).enumerate() {
            if let Some(counsel) = questioners.get(i % questioners.len().max(1)) {
                court
                    .speak_to(
                        counsel,
                        ActionType::VoirDire,
                        &format!("Ask {} a question that tests for bias in this case.", juror.name),
                        Some(Role::JuryMember),
                    )
                    .await?;
            }
            court
                .speak(
                    juror,
                    ActionType::JurorResponse,
                    "Answer counsel's question honestly and briefly.",
                )
                .await?;
        }

        court
            .announce_phase(&format!(
                "Announce that a jury of {} has been empanelled and administer the oath.",
                jurors.len()
            ))
            .await
    })
}

pub fn opening_statements(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        court
            .announce_phase("Invite counsel to deliver opening statements.")
            .await?;
        for side in [Side::Prosecution, Side::Defense] {
            match court.counsel_for(side) {
                Some(counsel) => {
                    court
                        .speak_to(
                            &counsel,
                            ActionType::OpeningStatement,
                            "Deliver your opening statement: outline what the evidence will show.",
                            Some(Role::JuryMember),
                        )
                        .await?;
                }
                None => debug!(side = %side, "No counsel for opening statement"),
            }
        }
        Ok(())
    })
}

pub fn case_in_chief(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(court.present_case(Side::Prosecution))
}

pub fn defense_case(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(court.present_case(Side::Defense))
}

pub fn rebuttal(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        court
            .announce_phase("Ask the prosecution whether it has rebuttal.")
            .await?;
        let Some(prosecutor) = court.find_participant_by_role(Role::Prosecutor) else {
            return Ok(());
        };
        court
            .speak(
                &prosecutor,
                ActionType::Rebuttal,
                "Rebut the defense case, pointing to the evidence it failed to answer.",
            )
            .await?;
        let objector = court.counsel_for(Side::Defense);
        court.arbitrate_objection(objector.as_ref()).await?;
        Ok(())
    })
}

pub fn closing_arguments(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        court
            .announce_phase("Invite counsel to deliver closing arguments.")
            .await?;
        for side in [Side::Prosecution, Side::Defense] {
            if let Some(counsel) = court.counsel_for(side) {
                court
                    .speak_to(
                        &counsel,
                        ActionType::ClosingArgument,
                        "Deliver your closing argument: tie the evidence to the burden of proof.",
                        Some(Role::JuryMember),
                    )
                    .await?;
            }
        }
        Ok(())
    })
}

pub fn jury_deliberation(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        let rule = court.jurisdiction().majority_for(court.case_type());
        let instruction = format!(
            "Instruct the jury on the burden of proof. Verdict rule: {rule} of the jurors."
        );
        court.deliberate(rule, &instruction).await?;
        Ok(())
    })
}

pub fn verdict(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        let finding = court.find_verdict();
        read_verdict(court, &finding).await?;
        court.conclude(&finding)
    })
}

/// Foreperson reads the jury's verdict, then the judge enters it.
pub(crate) async fn read_verdict(court: &mut Courtroom, finding: &VerdictFinding) -> EngineResult<()> {
    if court.last_tally().is_some() {
        if let Some(foreperson) = court.jurors().first().cloned() {
            court
                .speak(
                    &foreperson,
                    ActionType::VerdictReading,
                    &format!("As foreperson, read the jury's verdict: {}.", finding.verdict),
                )
                .await?;
        }
    }
    if let Some(judge) = court.find_participant_by_role(Role::Judge) {
        let note = if finding.hung {
            " The jury could not reach the required majority; the defendant prevails."
        } else {
            ""
        };
        court
            .speak(
                &judge,
                ActionType::VerdictReading,
                &format!("Enter the verdict of {} into the record.{note}", finding.verdict),
            )
            .await?;
    }
    Ok(())
}

pub fn sentencing(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        let criminal = court.case_type().is_criminal();
        court
            .announce_phase(if criminal {
                "Open the sentencing hearing."
            } else {
                "Open the hearing on damages."
            })
            .await?;
        if let Some(defense) = court.counsel_for(Side::Defense) {
            court
                .speak_to(
                    &defense,
                    ActionType::Sentencing,
                    if criminal {
                        "Argue for leniency in sentencing."
                    } else {
                        "Argue for a modest award of damages."
                    },
                    Some(Role::Judge),
                )
                .await?;
        }
        if let Some(judge) = court.find_participant_by_role(Role::Judge) {
            court
                .speak(
                    &judge,
                    ActionType::Sentencing,
                    if criminal {
                        "Pronounce sentence on the defendant."
                    } else {
                        "Enter judgment and award damages."
                    },
                )
                .await?;
        }
        Ok(())
    })
}
