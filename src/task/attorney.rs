//! Attorney tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require, Result, TaskListItem, TaskState};
use crate::actor::{AttorneyProvidedDetails, DonorProvidedDetails, TrustCorporationSignatory};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AttorneyTasks {
    pub confirm_your_details: TaskState,
    pub read_the_lpa: TaskState,
    pub sign_the_lpa: TaskState,
    pub sign_the_lpa_second: TaskState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttorneyTask {
    ConfirmYourDetails,
    ReadTheLpa,
    SignTheLpa,
    SignTheLpaSecond,
}

impl AttorneyTask {
    pub fn name(self) -> &'static str {
        match self {
            AttorneyTask::ConfirmYourDetails => "confirm_your_details",
            AttorneyTask::ReadTheLpa => "read_the_lpa",
            AttorneyTask::SignTheLpa => "sign_the_lpa",
            AttorneyTask::SignTheLpaSecond => "sign_the_lpa_second",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            AttorneyTask::ConfirmYourDetails => "/confirm-your-details",
            AttorneyTask::ReadTheLpa => "/read-the-lpa",
            AttorneyTask::SignTheLpa => "/sign",
            AttorneyTask::SignTheLpaSecond => "/sign?second",
        }
    }

    pub fn state(self, tasks: &AttorneyTasks) -> TaskState {
        match self {
            AttorneyTask::ConfirmYourDetails => tasks.confirm_your_details,
            AttorneyTask::ReadTheLpa => tasks.read_the_lpa,
            AttorneyTask::SignTheLpa => tasks.sign_the_lpa,
            AttorneyTask::SignTheLpaSecond => tasks.sign_the_lpa_second,
        }
    }

    fn set(self, tasks: &mut AttorneyTasks, state: TaskState) {
        let slot = match self {
            AttorneyTask::ConfirmYourDetails => &mut tasks.confirm_your_details,
            AttorneyTask::ReadTheLpa => &mut tasks.read_the_lpa,
            AttorneyTask::SignTheLpa => &mut tasks.sign_the_lpa,
            AttorneyTask::SignTheLpaSecond => &mut tasks.sign_the_lpa_second,
        };
        *slot = state;
    }
}

/// Check whether `task` may start for this attorney on this LPA.
pub fn can_start(
    task: AttorneyTask,
    attorney: &AttorneyProvidedDetails,
    lpa: &DonorProvidedDetails,
) -> Result<()> {
    match task {
        AttorneyTask::ConfirmYourDetails | AttorneyTask::ReadTheLpa => Ok(()),
        AttorneyTask::SignTheLpa => sign_prerequisites(task, attorney, lpa),
        AttorneyTask::SignTheLpaSecond => {
            require(
                attorney.is_trust_corporation && attorney.would_like_second_signatory,
                task.name(),
                "no second signatory was requested",
            )?;
            sign_prerequisites(task, attorney, lpa)?;
            require(
                attorney.authorised_signatories[0].signed(),
                task.name(),
                "the first signatory has not signed",
            )
        }
    }
}

fn sign_prerequisites(
    task: AttorneyTask,
    attorney: &AttorneyProvidedDetails,
    lpa: &DonorProvidedDetails,
) -> Result<()> {
    require(
        attorney.tasks.confirm_your_details.is_completed(),
        task.name(),
        "details have not been confirmed",
    )?;
    require(
        attorney.tasks.read_the_lpa.is_completed(),
        task.name(),
        "the LPA has not been read",
    )?;
    require(lpa.signed(), task.name(), "the donor has not signed")?;
    require(
        lpa.certificate_provider_signed(),
        task.name(),
        "the certificate provider has not signed",
    )
}

/// Mark a task in progress if it may start.
pub fn start(
    task: AttorneyTask,
    attorney: &mut AttorneyProvidedDetails,
    lpa: &DonorProvidedDetails,
) -> Result<()> {
    can_start(task, attorney, lpa)?;
    if task.state(&attorney.tasks).is_not_started() {
        task.set(&mut attorney.tasks, TaskState::InProgress);
    }
    Ok(())
}

/// Mark a task completed if it may start.
pub fn complete(
    task: AttorneyTask,
    attorney: &mut AttorneyProvidedDetails,
    lpa: &DonorProvidedDetails,
) -> Result<()> {
    can_start(task, attorney, lpa)?;
    task.set(&mut attorney.tasks, TaskState::Completed);
    Ok(())
}

/// Record a signature.
///
/// Individuals sign as themselves. Trust corporations sign through an
/// authorised signatory; `second` selects the second signatory slot.
pub fn sign(
    attorney: &mut AttorneyProvidedDetails,
    lpa: &DonorProvidedDetails,
    signatory: Option<TrustCorporationSignatory>,
    second: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let task = if second {
        AttorneyTask::SignTheLpaSecond
    } else {
        AttorneyTask::SignTheLpa
    };
    can_start(task, attorney, lpa)?;

    if attorney.is_trust_corporation {
        let slot = usize::from(second);
        attorney.authorised_signatories[slot] = TrustCorporationSignatory {
            signed_at: Some(now),
            ..signatory.unwrap_or_default()
        };
    } else {
        attorney.signed_at = Some(now);
    }

    task.set(&mut attorney.tasks, TaskState::Completed);
    Ok(())
}

/// Record whether a trust corporation wants its second authorised signatory
/// to sign too. Fixed once that signatory has signed.
pub fn choose_second_signatory(attorney: &mut AttorneyProvidedDetails, wanted: bool) -> Result<()> {
    let task = AttorneyTask::SignTheLpaSecond.name();
    require(
        attorney.is_trust_corporation,
        task,
        "only a trust corporation has authorised signatories",
    )?;
    require(
        !attorney.authorised_signatories[1].signed(),
        task,
        "the second signatory has already signed",
    )?;

    attorney.would_like_second_signatory = wanted;
    Ok(())
}

pub fn task_list(attorney: &AttorneyProvidedDetails, lpa: &DonorProvidedDetails) -> Vec<TaskListItem> {
    let mut tasks = vec![
        AttorneyTask::ConfirmYourDetails,
        AttorneyTask::ReadTheLpa,
        AttorneyTask::SignTheLpa,
    ];
    if attorney.is_trust_corporation && attorney.would_like_second_signatory {
        tasks.push(AttorneyTask::SignTheLpaSecond);
    }

    tasks
        .into_iter()
        .map(|task| TaskListItem {
            name: task.name(),
            path: task.path(),
            state: task.state(&attorney.tasks),
            enabled: can_start(task, attorney, lpa).is_ok(),
        })
        .collect()
}
