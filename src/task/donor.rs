//! Donor tasks.

use serde::{Deserialize, Serialize};

use super::{PaymentState, TaskState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DonorTasks {
    pub your_details: TaskState,
    pub choose_attorneys: TaskState,
    pub choose_replacement_attorneys: TaskState,
    pub certificate_provider: TaskState,
    pub check_your_lpa: TaskState,
    pub pay_for_lpa: PaymentState,
    pub confirm_your_identity: TaskState,
    pub sign_the_lpa: TaskState,
}

impl DonorTasks {
    /// The donor may sign once everything before signing is done.
    pub fn ready_to_sign(&self) -> bool {
        self.your_details.is_completed()
            && self.choose_attorneys.is_completed()
            && self.certificate_provider.is_completed()
            && self.check_your_lpa.is_completed()
            && self.pay_for_lpa == PaymentState::Completed
            && self.confirm_your_identity.is_completed()
    }
}
