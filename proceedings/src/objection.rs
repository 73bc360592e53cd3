//! Objection arbiter.
//!
//! After an examination segment the opposing counsel may object. The draw,
//! the objection type, and the judge's ruling all come from the run's
//! [`RandomSource`](crate::random::RandomSource), so a fixed sequence can
//! force any branch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::case::{Participant, ParticipantId, Role};
use crate::engine::{ActionType, Courtroom, EngineResult};
use crate::transcript::{Decision, RulingKind};

/// Chance an examination segment draws an objection.
pub const DEFAULT_OBJECTION_PROBABILITY: f64 = 0.2;

/// Chance the judge sustains an objection.
pub const SUSTAIN_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectionType {
    Relevance,
    Hearsay,
    Speculation,
    LeadingQuestion,
    Argumentative,
    AskedAndAnswered,
    CompoundQuestion,
    Foundation,
    Privilege,
}

impl ObjectionType {
    pub const ALL: [ObjectionType; 9] = [
        Self::Relevance,
        Self::Hearsay,
        Self::Speculation,
        Self::LeadingQuestion,
        Self::Argumentative,
        Self::AskedAndAnswered,
        Self::CompoundQuestion,
        Self::Foundation,
        Self::Privilege,
    ];

    /// Phrase counsel says when raising it.
    pub fn grounds(self) -> &'static str {
        match self {
            Self::Relevance => "the question is irrelevant",
            Self::Hearsay => "the answer calls for hearsay",
            Self::Speculation => "the question calls for speculation",
            Self::LeadingQuestion => "counsel is leading the witness",
            Self::Argumentative => "counsel is arguing with the witness",
            Self::AskedAndAnswered => "the question was asked and answered",
            Self::CompoundQuestion => "the question is compound",
            Self::Foundation => "no foundation has been laid",
            Self::Privilege => "the answer would disclose privileged material",
        }
    }
}

impl std::fmt::Display for ObjectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Relevance => "relevance",
            Self::Hearsay => "hearsay",
            Self::Speculation => "speculation",
            Self::LeadingQuestion => "leading-question",
            Self::Argumentative => "argumentative",
            Self::AskedAndAnswered => "asked-and-answered",
            Self::CompoundQuestion => "compound-question",
            Self::Foundation => "foundation",
            Self::Privilege => "privilege",
        };
        write!(f, "{s}")
    }
}

/// Objection draw probability and the types drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectionPolicy {
    pub probability: f64,
    pub types: Vec<ObjectionType>,
}

impl Default for ObjectionPolicy {
    fn default() -> Self {
        Self {
            probability: DEFAULT_OBJECTION_PROBABILITY,
            types: ObjectionType::ALL.to_vec(),
        }
    }
}

impl ObjectionPolicy {
    /// Every segment draws an objection.
    pub fn always() -> Self {
        Self {
            probability: 1.0,
            ..Self::default()
        }
    }

    pub fn never() -> Self {
        Self {
            probability: 0.0,
            ..Self::default()
        }
    }
}

/// An objection awaiting the judge's ruling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingObjection {
    pub objection: ObjectionType,
    pub raised_by: ParticipantId,
    /// Transcript entry of the objection, when recorded.
    pub entry_id: Option<String>,
}

impl Courtroom {
    /// Give `objector` the chance to object to the segment just finished.
    ///
    /// A no-op when objections are disabled, or when there is no objector or
    /// no judge to rule. Otherwise records the objection and the judge's
    /// ruling as two transcript entries plus one objection ruling.
    pub async fn arbitrate_objection(
        &mut self,
        objector: Option<&Arc<Participant>>,
    ) -> EngineResult<Option<Decision>> {
        if !self.settings().enable_objections {
            return Ok(None);
        }
        let Some(objector) = objector else {
            return Ok(None);
        };
        if self.find_participant_by_role(Role::Judge).is_none() {
            return Ok(None);
        }
        let policy = self.objection_policy().clone();
        if policy.types.is_empty() || !self.random().chance(policy.probability) {
            return Ok(None);
        }

        let idx = self.random().pick_index(policy.types.len());
        let objection = policy.types[idx];
        debug!(participant = %objector.id, objection = %objection, "Objection raised");

        let entry_id = self
            .speak_to(
                objector,
                ActionType::Objection,
                &format!("Object on grounds of {objection}: {}.", objection.grounds()),
                Some(Role::Judge),
            )
            .await?;
        self.handle_ref().write().state.pending_objection = Some(PendingObjection {
            objection,
            raised_by: objector.id.clone(),
            entry_id: entry_id.clone(),
        });

        let decision = if self.random().chance(SUSTAIN_PROBABILITY) {
            Decision::Sustained
        } else {
            Decision::Overruled
        };
        let subject = format!("{objection} objection");
        self.rule_now(RulingKind::Objection, &subject, decision, entry_id)
            .await?;
        self.handle_ref().write().state.pending_objection = None;

        Ok(Some(decision))
    }
}
