//! Jurisdictions: a handler table plus the rules that vary by legal system.
//!
//! A variant starts from [`HandlerTable::base`] and replaces only the
//! phases it does differently; everything else, including the helpers its
//! handlers call, is shared with the common-law machine.

pub mod louisiana;

use crate::case::{CaseType, LegalSystem};
use crate::engine::{HandlerTable, PhaseHandler, TrialPhase};
use crate::verdict::MajorityRule;

#[derive(Debug, Clone)]
pub struct Jurisdiction {
    system: LegalSystem,
    handlers: HandlerTable,
    criminal_majority: MajorityRule,
    civil_majority: MajorityRule,
}

impl Jurisdiction {
    /// Base table; unanimous juries in both criminal and civil trials.
    pub fn common_law() -> Self {
        Self {
            system: LegalSystem::CommonLaw,
            handlers: HandlerTable::base(),
            criminal_majority: MajorityRule::Unanimous,
            civil_majority: MajorityRule::Unanimous,
        }
    }

    pub fn for_system(system: LegalSystem) -> Self {
        match system {
            LegalSystem::CommonLaw => Self::common_law(),
            LegalSystem::Louisiana => louisiana::jurisdiction(),
        }
    }

    pub fn system(&self) -> LegalSystem {
        self.system
    }

    pub fn handler(&self, phase: TrialPhase) -> Option<PhaseHandler> {
        self.handlers.get(phase)
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Jury majority required for `case_type`.
    pub fn majority_for(&self, case_type: CaseType) -> MajorityRule {
        if case_type.is_criminal() {
            self.criminal_majority
        } else {
            self.civil_majority
        }
    }

    /// Replace the handler for one phase.
    pub fn with_handler(mut self, phase: TrialPhase, handler: PhaseHandler) -> Self {
        self.handlers.replace(phase, handler);
        self
    }

    pub fn with_majorities(mut self, criminal: MajorityRule, civil: MajorityRule) -> Self {
        self.criminal_majority = criminal;
        self.civil_majority = civil;
        self
    }
}

impl Default for Jurisdiction {
    fn default() -> Self {
        Self::common_law()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Courtroom, EngineResult};
    use futures::future::BoxFuture;

    fn skip(_court: &mut Courtroom) -> BoxFuture<'_, EngineResult<()>> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn test_common_law_defaults() {
        let j = Jurisdiction::default();
        assert_eq!(j.system(), LegalSystem::CommonLaw);
        assert_eq!(j.majority_for(CaseType::Criminal), MajorityRule::Unanimous);
        assert_eq!(j.majority_for(CaseType::Civil), MajorityRule::Unanimous);
        assert_eq!(j.handlers().len(), TrialPhase::ALL.len());
    }

    #[test]
    fn test_for_system_picks_variant() {
        assert_eq!(
            Jurisdiction::for_system(LegalSystem::Louisiana).system(),
            LegalSystem::Louisiana
        );
    }

    #[test]
    fn test_with_handler_keeps_other_entries() {
        let j = Jurisdiction::common_law().with_handler(TrialPhase::Rebuttal, skip);
        assert_eq!(j.handlers().len(), TrialPhase::ALL.len());
        assert!(j.handler(TrialPhase::Rebuttal).is_some());
    }

    #[test]
    fn test_with_majorities() {
        let j = Jurisdiction::common_law()
            .with_majorities(MajorityRule::AtLeast { votes: 10 }, MajorityRule::Unanimous);
        assert_eq!(
            j.majority_for(CaseType::Criminal),
            MajorityRule::AtLeast { votes: 10 }
        );
    }
}
