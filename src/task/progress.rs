//! LPA-level progress milestones.

use serde::Serialize;

use super::TaskState;
use crate::actor::{AttorneyProvidedDetails, DonorProvidedDetails};

/// Milestones in the order they are reached. The first one not yet reached
/// is reported in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub donor_signed: TaskState,
    pub certificate_provider_signed: TaskState,
    pub attorneys_signed: TaskState,
    pub submitted: TaskState,
}

impl Progress {
    pub fn compute(lpa: &DonorProvidedDetails, attorneys: &[AttorneyProvidedDetails]) -> Self {
        let reached = [
            lpa.signed(),
            lpa.certificate_provider_signed(),
            all_attorneys_signed(lpa, attorneys),
            lpa.submitted_at.is_some(),
        ];

        let mut current_found = false;
        let states = reached.map(|done| {
            if done {
                TaskState::Completed
            } else if !current_found {
                current_found = true;
                TaskState::InProgress
            } else {
                TaskState::NotStarted
            }
        });

        Self {
            donor_signed: states[0],
            certificate_provider_signed: states[1],
            attorneys_signed: states[2],
            submitted: states[3],
        }
    }
}

fn all_attorneys_signed(lpa: &DonorProvidedDetails, attorneys: &[AttorneyProvidedDetails]) -> bool {
    let expected = lpa.attorneys.len() + lpa.replacement_attorneys.len();
    expected > 0 && attorneys.iter().filter(|a| a.signed()).count() >= expected
}
