//! Turn-taking for a party's case: evidence, then each witness in order.
//!
//! Witnesses are examined strictly one at a time. Who cross-examines is
//! looked up in an [`OppositionTable`] supplied at construction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::case::{Participant, Role, Side};
use crate::engine::{ActionType, Courtroom, EngineResult};
use crate::transcript::{Decision, RulingKind};

/// Role pairs that oppose each other in examination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OppositionTable {
    pairs: Vec<(Role, Role)>,
}

impl Default for OppositionTable {
    fn default() -> Self {
        Self::new(vec![
            (Role::Prosecutor, Role::DefenseAttorney),
            (Role::PlaintiffAttorney, Role::DefenseAttorney),
            (Role::Plaintiff, Role::Defendant),
        ])
    }
}

impl OppositionTable {
    pub fn new(pairs: Vec<(Role, Role)>) -> Self {
        Self { pairs }
    }

    /// Every role opposing `role`, in table order; pairs apply both ways.
    pub fn opponents(&self, role: Role) -> impl Iterator<Item = Role> + '_ {
        self.pairs.iter().filter_map(move |&(a, b)| {
            if a == role {
                Some(b)
            } else if b == role {
                Some(a)
            } else {
                None
            }
        })
    }

    pub fn has_opponent(&self, role: Role) -> bool {
        self.opponents(role).next().is_some()
    }
}

/// Roles that can conduct a side's case, most senior first.
pub fn counsel_roles(side: Side) -> &'static [Role] {
    match side {
        Side::Prosecution => &[Role::Prosecutor, Role::PlaintiffAttorney, Role::Plaintiff],
        Side::Defense => &[Role::DefenseAttorney, Role::Defendant],
    }
}

impl Courtroom {
    /// Whoever conducts `side`'s case.
    pub fn counsel_for(&self, side: Side) -> Option<Arc<Participant>> {
        counsel_roles(side)
            .iter()
            .find_map(|role| self.find_participant_by_role(*role))
    }

    /// First participant present holding a role opposed to `role`.
    pub fn opponent_of(&self, role: Role) -> Option<Arc<Participant>> {
        self.opposition()
            .opponents(role)
            .find_map(|r| self.find_participant_by_role(r))
    }

    /// `side`'s witnesses in declaration order.
    pub fn witness_list(&self, side: Side) -> Vec<Arc<Participant>> {
        self.participants_by_role(Role::Witness)
            .into_iter()
            .filter(|w| w.called_by() == side)
            .collect()
    }

    /// Present `side`'s case: introduce its evidence, then examine its
    /// witnesses when witness examination is enabled.
    pub async fn present_case(&mut self, side: Side) -> EngineResult<()> {
        let party = match side {
            Side::Prosecution if !self.case_type().is_criminal() => "plaintiff",
            Side::Prosecution => "prosecution",
            Side::Defense => "defense",
        };
        let Some(counsel) = self.counsel_for(side) else {
            debug!(side = %side, "No one to present this side's case");
            return Ok(());
        };
        self.announce_phase(&format!("Call on the {party} to present its case."))
            .await?;

        self.introduce_evidence(&counsel, side).await?;

        if !self.settings().enable_witnesses {
            debug!(side = %side, "Witness examination disabled");
            return Ok(());
        }
        for witness in self.witness_list(side) {
            self.examine_witness(&counsel, &witness).await?;
        }
        Ok(())
    }

    async fn introduce_evidence(&mut self, counsel: &Arc<Participant>, side: Side) -> EngineResult<()> {
        let exhibits: Vec<_> = {
            let docket = self.handle_ref().read();
            docket.case.evidence_by(side).cloned().collect()
        };
        for exhibit in exhibits {
            let entry = self
                .speak(
                    counsel,
                    ActionType::IntroduceEvidence,
                    &format!("Offer into evidence {}.", exhibit.summary()),
                )
                .await?;
            let decision = if exhibit.admissible {
                self.handle_ref()
                    .write()
                    .state
                    .introduced_evidence
                    .insert(exhibit.id.clone());
                Decision::Granted
            } else {
                Decision::Denied
            };
            self.rule(RulingKind::Admissibility, &exhibit.title, decision, entry)
                .await?;
        }
        Ok(())
    }

    /// Direct, then cross, with an objection opportunity after each
    /// segment. The witness is off the stand afterwards even on error.
    pub async fn examine_witness(
        &mut self,
        counsel: &Arc<Participant>,
        witness: &Arc<Participant>,
    ) -> EngineResult<()> {
        self.handle_ref().write().state.call_witness(&witness.id)?;
        info!(witness = %witness.id, called_by = %counsel.id, "Witness called");

        let result = self.run_examination(counsel, witness).await;
        {
            let mut docket = self.handle_ref().write();
            docket.state.dismiss_witness();
        }
        result
    }

    async fn run_examination(
        &mut self,
        counsel: &Arc<Participant>,
        witness: &Arc<Participant>,
    ) -> EngineResult<()> {
        self.speak(
            counsel,
            ActionType::CallWitness,
            &format!("Call {} to the stand.", witness.name),
        )
        .await?;

        let exchanges = self.settings().detail_level.exchanges_per_segment();
        let opponent = self.opponent_of(counsel.role);

        self.examination_segment(counsel, witness, ActionType::DirectExamination, exchanges)
            .await?;
        self.arbitrate_objection(opponent.as_ref()).await?;

        match &opponent {
            Some(cross) => {
                self.examination_segment(cross, witness, ActionType::CrossExamination, exchanges)
                    .await?;
                self.arbitrate_objection(Some(counsel)).await?;
            }
            None => debug!(role = %counsel.role, "No opposing role; cross-examination skipped"),
        }
        Ok(())
    }

    async fn examination_segment(
        &mut self,
        examiner: &Arc<Participant>,
        witness: &Arc<Participant>,
        action: ActionType,
        exchanges: usize,
    ) -> EngineResult<()> {
        let instruction = match action {
            ActionType::CrossExamination => "Ask one probing cross-examination question.",
            _ => "Ask one open direct-examination question.",
        };
        for _ in 0..exchanges {
            self.speak_to(examiner, action, instruction, Some(Role::Witness))
                .await?;
            self.speak_to(
                witness,
                ActionType::WitnessAnswer,
                "Answer the question truthfully from what you know.",
                Some(examiner.role),
            )
            .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposition_is_symmetric() {
        let table = OppositionTable::default();
        assert_eq!(
            table.opponents(Role::Prosecutor).collect::<Vec<_>>(),
            vec![Role::DefenseAttorney]
        );
        assert_eq!(
            table.opponents(Role::DefenseAttorney).collect::<Vec<_>>(),
            vec![Role::Prosecutor, Role::PlaintiffAttorney]
        );
        assert_eq!(
            table.opponents(Role::Defendant).collect::<Vec<_>>(),
            vec![Role::Plaintiff]
        );
        assert!(!table.has_opponent(Role::Witness));
    }

    #[test]
    fn test_substituted_table() {
        let table = OppositionTable::new(vec![(Role::Plaintiff, Role::DefenseAttorney)]);
        assert!(!table.has_opponent(Role::Prosecutor));
        assert_eq!(table.opponents(Role::Plaintiff).next(), Some(Role::DefenseAttorney));
    }

    #[test]
    fn test_counsel_roles_by_side() {
        assert_eq!(counsel_roles(Side::Prosecution)[0], Role::Prosecutor);
        assert_eq!(counsel_roles(Side::Defense), &[Role::DefenseAttorney, Role::Defendant]);
    }
}
