//! Opt-out and access-removal rules.
//!
//! One table keyed by LPA stage, actor kind and action decides what leaving
//! an LPA means. Handlers and services look the outcome up here instead of
//! branching on signing state themselves.

use super::{Result, TaskError};
use crate::actor::{ActorKind, ActorType, DonorProvidedDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpaStage {
    /// Not yet paid for or signed.
    Drafting,
    /// Paid for, not yet signed by the donor.
    Paid,
    /// Signed by the donor.
    Signed,
}

impl LpaStage {
    pub fn of(lpa: &DonorProvidedDetails) -> Self {
        if lpa.signed() {
            LpaStage::Signed
        } else if lpa.paid() {
            LpaStage::Paid
        } else {
            LpaStage::Drafting
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// An invited actor declines their role.
    OptOut,
    /// A supporter withdraws the access they gave a donor.
    RemoveAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Remove the actor from the LPA record.
    ClearFromLpa,
    /// Leave the LPA record alone and tell the donor the actor withdrew.
    NotifyDonor,
    /// Delete the access grant.
    DeleteAccess,
    Refused(&'static str),
}

pub fn transition(stage: LpaStage, actor_type: ActorType, action: Action) -> Outcome {
    use ActorKind::{Attorney, CertificateProvider, Donor};

    match (stage, actor_type.kind(), action) {
        (LpaStage::Drafting | LpaStage::Paid, Attorney | CertificateProvider, Action::OptOut) => {
            Outcome::ClearFromLpa
        }
        (LpaStage::Signed, Attorney | CertificateProvider, Action::OptOut) => Outcome::NotifyDonor,
        (LpaStage::Drafting, Donor, Action::RemoveAccess) => Outcome::DeleteAccess,
        (LpaStage::Paid | LpaStage::Signed, Donor, Action::RemoveAccess) => {
            Outcome::Refused("the donor has already paid for the LPA")
        }
        (_, _, Action::OptOut) => {
            Outcome::Refused("only attorneys and certificate providers can opt out")
        }
        (_, _, Action::RemoveAccess) => Outcome::Refused("only donor access can be removed"),
    }
}

/// Look up an outcome, turning refusals into errors.
pub fn check(stage: LpaStage, actor_type: ActorType, action: Action) -> Result<Outcome> {
    match transition(stage, actor_type, action) {
        Outcome::Refused(reason) => Err(TaskError::Refused {
            actor_type,
            action,
            reason,
        }),
        outcome => Ok(outcome),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::task::PaymentState;

    #[test]
    fn test_stage_of() {
        let mut lpa = DonorProvidedDetails::default();
        assert_eq!(LpaStage::of(&lpa), LpaStage::Drafting);

        lpa.tasks.pay_for_lpa = PaymentState::Completed;
        assert_eq!(LpaStage::of(&lpa), LpaStage::Paid);

        lpa.signed_at = Some(Utc::now());
        assert_eq!(LpaStage::of(&lpa), LpaStage::Signed);
    }

    #[test]
    fn test_opt_out_before_and_after_signing() {
        for actor_type in ActorType::ALL
            .into_iter()
            .filter(|t| t.is_attorney() || *t == ActorType::CertificateProvider)
        {
            assert_eq!(
                transition(LpaStage::Drafting, actor_type, Action::OptOut),
                Outcome::ClearFromLpa
            );
            assert_eq!(
                transition(LpaStage::Paid, actor_type, Action::OptOut),
                Outcome::ClearFromLpa
            );
            assert_eq!(
                transition(LpaStage::Signed, actor_type, Action::OptOut),
                Outcome::NotifyDonor
            );
        }
    }

    #[test]
    fn test_remove_donor_access_refused_once_paid() {
        assert_eq!(
            check(LpaStage::Drafting, ActorType::Donor, Action::RemoveAccess).unwrap(),
            Outcome::DeleteAccess
        );

        for stage in [LpaStage::Paid, LpaStage::Signed] {
            let err = check(stage, ActorType::Donor, Action::RemoveAccess).unwrap_err();
            assert!(matches!(
                err,
                TaskError::Refused {
                    actor_type: ActorType::Donor,
                    action: Action::RemoveAccess,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_unsupported_combinations_refused() {
        assert!(check(LpaStage::Drafting, ActorType::Donor, Action::OptOut).is_err());
        assert!(check(LpaStage::Drafting, ActorType::Supporter, Action::OptOut).is_err());
        assert!(check(LpaStage::Drafting, ActorType::Attorney, Action::RemoveAccess).is_err());
    }
}
