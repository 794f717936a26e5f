//! Certificate provider tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require, Result, TaskListItem, TaskState};
use crate::actor::{CertificateProviderProvidedDetails, DonorProvidedDetails};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CertificateProviderTasks {
    pub confirm_your_details: TaskState,
    pub confirm_your_identity: TaskState,
    pub read_the_lpa: TaskState,
    pub provide_the_certificate: TaskState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateProviderTask {
    ConfirmYourDetails,
    ConfirmYourIdentity,
    ReadTheLpa,
    ProvideTheCertificate,
}

impl CertificateProviderTask {
    pub const ALL: [CertificateProviderTask; 4] = [
        CertificateProviderTask::ConfirmYourDetails,
        CertificateProviderTask::ConfirmYourIdentity,
        CertificateProviderTask::ReadTheLpa,
        CertificateProviderTask::ProvideTheCertificate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CertificateProviderTask::ConfirmYourDetails => "confirm_your_details",
            CertificateProviderTask::ConfirmYourIdentity => "confirm_your_identity",
            CertificateProviderTask::ReadTheLpa => "read_the_lpa",
            CertificateProviderTask::ProvideTheCertificate => "provide_the_certificate",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            CertificateProviderTask::ConfirmYourDetails => "/enter-date-of-birth",
            CertificateProviderTask::ConfirmYourIdentity => "/prove-your-identity",
            CertificateProviderTask::ReadTheLpa => "/read-the-lpa",
            CertificateProviderTask::ProvideTheCertificate => "/provide-certificate",
        }
    }

    pub fn state(self, tasks: &CertificateProviderTasks) -> TaskState {
        match self {
            CertificateProviderTask::ConfirmYourDetails => tasks.confirm_your_details,
            CertificateProviderTask::ConfirmYourIdentity => tasks.confirm_your_identity,
            CertificateProviderTask::ReadTheLpa => tasks.read_the_lpa,
            CertificateProviderTask::ProvideTheCertificate => tasks.provide_the_certificate,
        }
    }

    fn set(self, tasks: &mut CertificateProviderTasks, state: TaskState) {
        let slot = match self {
            CertificateProviderTask::ConfirmYourDetails => &mut tasks.confirm_your_details,
            CertificateProviderTask::ConfirmYourIdentity => &mut tasks.confirm_your_identity,
            CertificateProviderTask::ReadTheLpa => &mut tasks.read_the_lpa,
            CertificateProviderTask::ProvideTheCertificate => &mut tasks.provide_the_certificate,
        };
        *slot = state;
    }
}

pub fn can_start(
    task: CertificateProviderTask,
    certificate_provider: &CertificateProviderProvidedDetails,
    lpa: &DonorProvidedDetails,
) -> Result<()> {
    let name = task.name();

    match task {
        CertificateProviderTask::ConfirmYourDetails => Ok(()),
        CertificateProviderTask::ReadTheLpa => {
            require(lpa.signed(), name, "the donor has not signed")
        }
        CertificateProviderTask::ConfirmYourIdentity => {
            require(lpa.signed(), name, "the donor has not signed")?;
            require(lpa.paid(), name, "the donor has not paid")
        }
        CertificateProviderTask::ProvideTheCertificate => {
            let tasks = &certificate_provider.tasks;
            require(
                tasks.confirm_your_details.is_completed(),
                name,
                "details have not been confirmed",
            )?;
            require(
                tasks.confirm_your_identity.is_completed(),
                name,
                "identity has not been confirmed",
            )?;
            require(
                tasks.read_the_lpa.is_completed(),
                name,
                "the LPA has not been read",
            )
        }
    }
}

pub fn start(
    task: CertificateProviderTask,
    certificate_provider: &mut CertificateProviderProvidedDetails,
    lpa: &DonorProvidedDetails,
) -> Result<()> {
    can_start(task, certificate_provider, lpa)?;
    if task.state(&certificate_provider.tasks).is_not_started() {
        task.set(&mut certificate_provider.tasks, TaskState::InProgress);
    }
    Ok(())
}

pub fn complete(
    task: CertificateProviderTask,
    certificate_provider: &mut CertificateProviderProvidedDetails,
    lpa: &DonorProvidedDetails,
) -> Result<()> {
    can_start(task, certificate_provider, lpa)?;
    task.set(&mut certificate_provider.tasks, TaskState::Completed);
    Ok(())
}

/// Agree to the certificate statement and reflect it on the LPA record.
pub fn provide_certificate(
    certificate_provider: &mut CertificateProviderProvidedDetails,
    lpa: &mut DonorProvidedDetails,
    now: DateTime<Utc>,
) -> Result<()> {
    complete(
        CertificateProviderTask::ProvideTheCertificate,
        certificate_provider,
        lpa,
    )?;

    certificate_provider.certificate.agree_to_statement = true;
    certificate_provider.certificate.agreed_at = Some(now);
    lpa.certificate_provider_signed_at = Some(now);
    Ok(())
}

pub fn task_list(
    certificate_provider: &CertificateProviderProvidedDetails,
    lpa: &DonorProvidedDetails,
) -> Vec<TaskListItem> {
    CertificateProviderTask::ALL
        .into_iter()
        .map(|task| TaskListItem {
            name: task.name(),
            path: task.path(),
            state: task.state(&certificate_provider.tasks),
            enabled: can_start(task, certificate_provider, lpa).is_ok(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::PaymentState;

    fn lpa(signed: bool, paid: bool) -> DonorProvidedDetails {
        let mut lpa = DonorProvidedDetails {
            signed_at: signed.then(Utc::now),
            ..Default::default()
        };
        if paid {
            lpa.tasks.pay_for_lpa = PaymentState::Completed;
        }
        lpa
    }

    #[test]
    fn test_read_the_lpa_waits_for_donor_signature() {
        let certificate_provider = CertificateProviderProvidedDetails::default();
        assert!(can_start(
            CertificateProviderTask::ReadTheLpa,
            &certificate_provider,
            &lpa(false, true)
        )
        .is_err());
        assert!(can_start(
            CertificateProviderTask::ReadTheLpa,
            &certificate_provider,
            &lpa(true, false)
        )
        .is_ok());
    }

    #[test]
    fn test_confirm_identity_waits_for_payment() {
        let certificate_provider = CertificateProviderProvidedDetails::default();
        let task = CertificateProviderTask::ConfirmYourIdentity;

        assert!(can_start(task, &certificate_provider, &lpa(true, false)).is_err());
        assert!(can_start(task, &certificate_provider, &lpa(false, true)).is_err());
        assert!(can_start(task, &certificate_provider, &lpa(true, true)).is_ok());
    }

    #[test]
    fn test_provide_certificate_needs_all_three_prerequisites() {
        let lpa_record = lpa(true, true);
        let prerequisites = [
            CertificateProviderTask::ConfirmYourDetails,
            CertificateProviderTask::ConfirmYourIdentity,
            CertificateProviderTask::ReadTheLpa,
        ];

        for missing in prerequisites {
            let mut certificate_provider = CertificateProviderProvidedDetails::default();
            for task in prerequisites.into_iter().filter(|t| *t != missing) {
                complete(task, &mut certificate_provider, &lpa_record).unwrap();
            }

            let mut lpa_record = lpa_record.clone();
            assert!(provide_certificate(&mut certificate_provider, &mut lpa_record, Utc::now()).is_err());
            assert!(certificate_provider.tasks.provide_the_certificate.is_not_started());
            assert!(!lpa_record.certificate_provider_signed());
        }
    }

    #[test]
    fn test_provide_certificate_marks_lpa() {
        let now = Utc::now();
        let mut lpa_record = lpa(true, true);
        let mut certificate_provider = CertificateProviderProvidedDetails {
            tasks: CertificateProviderTasks {
                confirm_your_details: TaskState::Completed,
                confirm_your_identity: TaskState::Completed,
                read_the_lpa: TaskState::Completed,
                provide_the_certificate: TaskState::NotStarted,
            },
            ..Default::default()
        };

        provide_certificate(&mut certificate_provider, &mut lpa_record, now).unwrap();

        assert!(certificate_provider.tasks.provide_the_certificate.is_completed());
        assert_eq!(certificate_provider.certificate.agreed_at, Some(now));
        assert_eq!(lpa_record.certificate_provider_signed_at, Some(now));
    }

    #[test]
    fn test_task_list_enablement() {
        let items = task_list(&CertificateProviderProvidedDetails::default(), &lpa(true, false));
        let enabled: Vec<_> = items.iter().map(|i| (i.name, i.enabled)).collect();
        assert_eq!(
            enabled,
            vec![
                ("confirm_your_details", true),
                ("confirm_your_identity", false),
                ("read_the_lpa", true),
                ("provide_the_certificate", false),
            ]
        );
    }
}
