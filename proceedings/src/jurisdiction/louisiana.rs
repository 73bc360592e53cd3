//! Louisiana procedure.
//!
//! Differs from the common-law table in five phases: pre-trial exceptions
//! instead of motions, a defense that may reserve its opening, a state
//! rebuttal closing, a 3/4 civil jury, and a polled jury at verdict.

use futures::future::BoxFuture;
use tracing::debug;

use super::Jurisdiction;
use crate::case::{LegalSystem, Role, Side};
use crate::engine::handlers::{read_verdict, MOTION_GRANT_PROBABILITY};
use crate::engine::{ActionType, Courtroom, EngineResult, HandlerTable, TrialPhase};
use crate::verdict::MajorityRule;

/// Louisiana civil juries need three quarters: 9 of 12, 5 of 6.
pub const CIVIL_MAJORITY: MajorityRule = MajorityRule::Fraction {
    numerator: 3,
    denominator: 4,
};

pub fn jurisdiction() -> Jurisdiction {
    let handlers = HandlerTable::base()
        .with(TrialPhase::PreTrial, pre_trial)
        .with(TrialPhase::OpeningStatements, opening_statements)
        .with(TrialPhase::ClosingArguments, closing_arguments)
        .with(TrialPhase::JuryDeliberation, jury_deliberation)
        .with(TrialPhase::Verdict, verdict);
    Jurisdiction {
        system: LegalSystem::Louisiana,
        handlers,
        criminal_majority: MajorityRule::Unanimous,
        civil_majority: CIVIL_MAJORITY,
    }
}

fn pre_trial(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        court
            .announce_phase("Call the matter and hear the defendant's exceptions before trial.")
            .await?;
        let Some(defense) = court.counsel_for(Side::Defense) else {
            return Ok(());
        };
        let filings: &[&str] = if court.case_type().is_criminal() {
            &["motion to quash", "motion for a preliminary examination", "motion to suppress evidence"]
        } else {
            &["declinatory exception", "dilatory exception", "peremptory exception"]
        };
        let count = court.settings().detail_level.exchanges_per_segment();
        for filing in filings.iter().take(count) {
            court.file_motion(&defense, filing, MOTION_GRANT_PROBABILITY).await?;
        }
        Ok(())
    })
}

fn opening_statements(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        court
            .announce_phase("Invite the State to open; the defense may reserve its opening.")
            .await?;
        if let Some(state) = court.counsel_for(Side::Prosecution) {
            court
                .speak_to(
                    &state,
                    ActionType::OpeningStatement,
                    "Deliver the opening statement explaining the nature of the charge and the evidence.",
                    Some(Role::JuryMember),
                )
                .await?;
        }
        if let Some(defense) = court.counsel_for(Side::Defense) {
            court
                .speak_to(
                    &defense,
                    ActionType::OpeningStatement,
                    "Tell the court you reserve the defense opening statement until the defense case.",
                    Some(Role::Judge),
                )
                .await?;
        }
        Ok(())
    })
}

fn closing_arguments(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        court
            .announce_phase("Invite closing arguments: the State, the defense, then the State in rebuttal.")
            .await?;
        let state = court.counsel_for(Side::Prosecution);
        if let Some(state) = &state {
            court
                .speak_to(
                    state,
                    ActionType::ClosingArgument,
                    "Deliver the State's closing argument.",
                    Some(Role::JuryMember),
                )
                .await?;
        }
        if let Some(defense) = court.counsel_for(Side::Defense) {
            court
                .speak_to(
                    &defense,
                    ActionType::ClosingArgument,
                    "Deliver the defense closing argument.",
                    Some(Role::JuryMember),
                )
                .await?;
        }
        if let Some(state) = &state {
            court
                .speak_to(
                    state,
                    ActionType::ClosingArgument,
                    "Give the State's rebuttal closing, answering only the defense argument.",
                    Some(Role::JuryMember),
                )
                .await?;
        }
        Ok(())
    })
}

fn jury_deliberation(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        let rule = court.jurisdiction().majority_for(court.case_type());
        let instruction = if court.case_type().is_criminal() {
            "Charge the jury under Louisiana law: a verdict must be unanimous.".to_string()
        } else {
            format!("Charge the jury under Louisiana law: {rule} of the jurors must concur.")
        };
        court.deliberate(rule, &instruction).await?;
        Ok(())
    })
}

fn verdict(court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
    Box::pin(async move {
        let finding = court.find_verdict();
        read_verdict(court, &finding).await?;

        if let Some(tally) = court.last_tally().cloned() {
            match court.find_participant_by_role(Role::CourtClerk) {
                Some(clerk) => {
                    court
                        .speak_to(
                            &clerk,
                            ActionType::JuryPoll,
                            "Poll the jury: ask each juror whether this is their verdict.",
                            Some(Role::JuryMember),
                        )
                        .await?;
                    for (juror, ballot) in court.jurors().iter().zip(&tally.ballots) {
                        let answer = if ballot.adverse == finding.verdict.is_adverse() {
                            "Answer the poll: yes, this is your verdict."
                        } else {
                            "Answer the poll: no, this is not your verdict."
                        };
                        court.speak(juror, ActionType::JurorResponse, answer).await?;
                    }
                }
                None => debug!("No court clerk; jury not polled"),
            }
        }

        court.conclude(&finding)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseType;

    #[test]
    fn test_louisiana_majorities() {
        let j = jurisdiction();
        assert_eq!(j.majority_for(CaseType::Criminal), MajorityRule::Unanimous);
        assert_eq!(j.majority_for(CaseType::Civil), CIVIL_MAJORITY);
        assert_eq!(CIVIL_MAJORITY.required(12), 9);
        assert_eq!(CIVIL_MAJORITY.required(6), 5);
    }

    #[test]
    fn test_overrides_leave_the_rest_of_the_table() {
        let j = jurisdiction();
        assert_eq!(j.system(), LegalSystem::Louisiana);
        assert_eq!(j.handlers().len(), TrialPhase::ALL.len());
        for phase in TrialPhase::ALL {
            assert!(j.handler(phase).is_some(), "missing {phase}");
        }
    }
}
