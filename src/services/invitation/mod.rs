//! Invitation protocol: issue, redeem and opt out of share codes.
//!
//! A share code is issued for one actor on one LPA and sent to the invitee.
//! Redeeming it binds the redeemer's session to the LPA in that role. The
//! code is kept after redemption, marked with the redeeming session, so a
//! retried redemption by the same session succeeds again. Opting out deletes
//! it.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actor::{ActorKind, ActorType, DonorProvidedDetails, ShareCodeData};
use crate::clients::{ClientError, Email, NotifyClient};
use crate::repository::{self, Repositories};
use crate::session::RequestIdentity;
use crate::task::{transition, Action, LpaStage, Outcome, TaskError};
use crate::utils::clock::{system_now, Now};
use crate::utils::random::{code_generator, CodeGenerator};

/// Length of generated share codes.
pub const CODE_LENGTH: usize = 12;

pub type Result<T> = std::result::Result<T, InvitationError>;

#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
    /// Shown to the user as a correctable form error.
    #[error("incorrect reference number")]
    IncorrectReferenceNumber,

    #[error("cannot invite actor type {0}")]
    UnsupportedActorType(ActorType),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Repository(#[from] repository::Error),

    #[error("notification failed: {0}")]
    Notify(#[from] ClientError),
}

/// Who a share code is for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invitee {
    pub uid: Uuid,
    pub full_name: String,
    /// Empty when the invitee has no email address; no email is sent.
    pub email: String,
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeemed {
    pub lpa_id: String,
    pub actor_type: ActorType,
}

/// Strip the spaces and hyphens people type into reference numbers.
pub fn normalise_reference(reference: &str) -> String {
    reference
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

pub struct InvitationService {
    repositories: Repositories,
    notify: Arc<dyn NotifyClient>,
    app_public_url: String,
    generate: CodeGenerator,
    now: Now,
}

impl InvitationService {
    pub fn new(
        repositories: Repositories,
        notify: Arc<dyn NotifyClient>,
        app_public_url: &str,
    ) -> Self {
        Self {
            repositories,
            notify,
            app_public_url: app_public_url.trim_end_matches('/').to_string(),
            generate: code_generator(),
            now: system_now(),
        }
    }

    pub fn with_generator(mut self, generate: CodeGenerator) -> Self {
        self.generate = generate;
        self
    }

    pub fn with_clock(mut self, now: Now) -> Self {
        self.now = now;
        self
    }

    // ========================================================================
    // Issue
    // ========================================================================

    /// Issue a share code inviting `invitee` onto `lpa` as `actor_type`, and
    /// email it to them when an address is known.
    ///
    /// Codes are random and written unconditionally; a collision overwrites.
    pub async fn issue(
        &self,
        identity: &RequestIdentity,
        actor_type: ActorType,
        lpa: &DonorProvidedDetails,
        invitee: &Invitee,
    ) -> Result<String> {
        if actor_type.share_prefix().is_none() {
            return Err(InvitationError::UnsupportedActorType(actor_type));
        }

        let code = (self.generate)(CODE_LENGTH);
        let mut share = ShareCodeData {
            lpa_key: lpa.pk.clone(),
            lpa_owner_key: lpa.owner_key().to_string(),
            actor_uid: invitee.uid,
            actor_type: Some(actor_type),
            session_id: identity.session_id.clone(),
            organisation_id: identity.organisation_id.clone(),
            is_replacement_attorney: actor_type.is_replacement(),
            is_trust_corporation: actor_type.is_trust_corporation(),
            invitee_email: invitee.email.clone(),
            redeemed_by: None,
            created_at: (self.now)(),
            ..Default::default()
        };
        self.repositories
            .share_codes
            .put(actor_type, &code, &mut share)
            .await?;

        info!(lpa_id = %lpa.lpa_id, actor_type = %actor_type, "Issued share code");

        if !invitee.email.is_empty() {
            let email = self.invite_email(identity, actor_type, lpa, invitee, &code).await?;
            self.notify
                .send_actor_email(&invitee.email, &lpa.lpa_uid, &email)
                .await?;
        }

        Ok(code)
    }

    /// Invite the LPA's certificate provider.
    pub async fn send_certificate_provider_invite(
        &self,
        identity: &RequestIdentity,
        lpa: &DonorProvidedDetails,
    ) -> Result<String> {
        let certificate_provider = &lpa.certificate_provider;
        let invitee = Invitee {
            uid: certificate_provider.uid,
            full_name: certificate_provider.full_name(),
            email: certificate_provider.email.clone(),
        };
        self.issue(identity, ActorType::CertificateProvider, lpa, &invitee)
            .await
    }

    /// Invite every attorney, replacement attorney and trust corporation on
    /// the LPA. Stops at the first failure; codes already issued stay valid.
    pub async fn send_attorneys(
        &self,
        identity: &RequestIdentity,
        lpa: &DonorProvidedDetails,
    ) -> Result<Vec<String>> {
        let mut invites = Vec::new();

        for (list, is_replacement) in [(&lpa.attorneys, false), (&lpa.replacement_attorneys, true)] {
            if let Some(trust_corporation) = &list.trust_corporation {
                invites.push((
                    ActorType::attorney(is_replacement, true),
                    Invitee {
                        uid: trust_corporation.uid,
                        full_name: trust_corporation.name.clone(),
                        email: trust_corporation.email.clone(),
                    },
                ));
            }
            for attorney in &list.attorneys {
                invites.push((
                    ActorType::attorney(is_replacement, false),
                    Invitee {
                        uid: attorney.uid,
                        full_name: attorney.full_name(),
                        email: attorney.email.clone(),
                    },
                ));
            }
        }

        try_join_all(
            invites
                .iter()
                .map(|(actor_type, invitee)| self.issue(identity, *actor_type, lpa, invitee)),
        )
        .await
    }

    async fn invite_email(
        &self,
        identity: &RequestIdentity,
        actor_type: ActorType,
        lpa: &DonorProvidedDetails,
        invitee: &Invitee,
        code: &str,
    ) -> Result<Email> {
        let start_url = format!("{}{}", self.app_public_url, actor_type.start_path());

        let email = match actor_type.kind() {
            ActorKind::CertificateProvider => Email::CertificateProviderInvite {
                donor_full_name: lpa.donor.full_name(),
                lpa_type: lpa.lpa_type.as_str().to_string(),
                certificate_provider_full_name: invitee.full_name.clone(),
                certificate_provider_start_url: start_url,
                share_code: code.to_string(),
            },
            ActorKind::Attorney => Email::AttorneyInvite {
                donor_full_name: lpa.donor.full_name(),
                lpa_type: lpa.lpa_type.as_str().to_string(),
                attorney_full_name: invitee.full_name.clone(),
                attorney_start_page_url: start_url,
                share_code: code.to_string(),
                is_replacement: actor_type.is_replacement(),
            },
            ActorKind::Donor => {
                let organisation_name = if identity.is_organisation() {
                    self.repositories.organisations.get(identity).await?.name
                } else {
                    String::new()
                };
                Email::DonorAccess {
                    organisation_name,
                    donor_name: invitee.full_name.clone(),
                    url: start_url,
                    share_code: code.to_string(),
                }
            }
            ActorKind::Supporter => return Err(InvitationError::UnsupportedActorType(actor_type)),
        };

        Ok(email)
    }

    // ========================================================================
    // Redeem
    // ========================================================================

    /// Redeem a reference number entered on the `landing` actor's page.
    ///
    /// An unknown code, or one already redeemed by another session, is an
    /// [`InvitationError::IncorrectReferenceNumber`]. Redeeming again from the
    /// same session succeeds without creating a second record.
    pub async fn redeem(
        &self,
        identity: &RequestIdentity,
        landing: ActorType,
        reference: &str,
    ) -> Result<Redeemed> {
        let session_id = identity.session_id.clone();
        if session_id.is_empty() {
            return Err(repository::Error::SessionMissing.into());
        }

        let code = normalise_reference(reference);
        let mut share = self.find(landing, &code).await?;
        if share.redeemed_by_other(&session_id) {
            return Err(InvitationError::IncorrectReferenceNumber);
        }
        if !self
            .repositories
            .share_codes
            .claim(&share.keys(), &session_id)
            .await?
        {
            debug!(actor_type = %landing, "Share code claimed by another session");
            return Err(InvitationError::IncorrectReferenceNumber);
        }

        let lpa_id = share
            .lpa_id()
            .ok_or(InvitationError::IncorrectReferenceNumber)?
            .to_string();
        let actor_type = share.resolved_actor_type(landing);
        let actor = identity.merge(&RequestIdentity::default().with_lpa(&lpa_id));

        let created = match actor_type.kind() {
            ActorKind::Attorney => self
                .repositories
                .attorneys
                .create(&actor, &share)
                .await
                .map(|_| ()),
            ActorKind::CertificateProvider => self
                .repositories
                .certificate_providers
                .create(&actor, &share)
                .await
                .map(|_| ()),
            ActorKind::Donor => self.repositories.donors.link(&actor, &share).await,
            ActorKind::Supporter => return Err(InvitationError::UnsupportedActorType(actor_type)),
        };

        match created {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => {
                info!(lpa_id = %lpa_id, actor_type = %actor_type, "Share code already redeemed by this session");
            }
            Err(repository::Error::LinkWriteFailed { source }) => {
                warn!(
                    lpa_id = %lpa_id,
                    actor_type = %actor_type,
                    error = %source,
                    "Redeemed without dashboard pointer; redeeming again repairs it"
                );
            }
            Err(e) => return Err(e.into()),
        }

        if share.redeemed_by.is_none() {
            share.redeemed_by = Some(session_id);
            self.repositories
                .share_codes
                .put(actor_type, &code, &mut share)
                .await?;
        }

        info!(lpa_id = %lpa_id, actor_type = %actor_type, "Redeemed share code");
        Ok(Redeemed { lpa_id, actor_type })
    }

    async fn find(&self, landing: ActorType, code: &str) -> Result<ShareCodeData> {
        if code.is_empty() {
            return Err(InvitationError::IncorrectReferenceNumber);
        }

        match self.repositories.share_codes.get(landing, code).await {
            Ok(share) => Ok(share),
            Err(e) if e.is_not_found() => Err(InvitationError::IncorrectReferenceNumber),
            Err(e) => Err(e.into()),
        }
    }

    // ========================================================================
    // Opt out
    // ========================================================================

    /// Decline an invitation using its reference number.
    ///
    /// Before the donor signs, the actor is removed from the LPA; afterwards
    /// the LPA is left alone and the donor is told. The share code is deleted
    /// either way. A code the caller already redeemed also takes the caller's
    /// actor record and its pointer with it; a code redeemed by anyone else
    /// is an incorrect reference number.
    pub async fn opt_out(
        &self,
        identity: &RequestIdentity,
        landing: ActorType,
        reference: &str,
    ) -> Result<()> {
        let code = normalise_reference(reference);
        let share = self.find(landing, &code).await?;
        let redeemer = match share.redeemed_by.clone() {
            Some(redeemer) => Some(redeemer),
            None => self.repositories.share_codes.claimant(&share.keys()).await?,
        };
        if redeemer
            .as_deref()
            .is_some_and(|redeemer| redeemer != identity.session_id)
        {
            return Err(InvitationError::IncorrectReferenceNumber);
        }
        let lpa_id = share
            .lpa_id()
            .ok_or(InvitationError::IncorrectReferenceNumber)?;

        let mut lpa = self
            .repositories
            .donors
            .get_any(&RequestIdentity::default().with_lpa(lpa_id))
            .await?;
        let actor_type = share.resolved_actor_type(landing);

        self.leave(&mut lpa, actor_type, share.actor_uid).await?;

        if redeemer.is_some() {
            let bound = identity.merge(&RequestIdentity::default().with_lpa(lpa_id));
            match actor_type.kind() {
                ActorKind::Attorney => self.repositories.attorneys.delete(&bound).await?,
                ActorKind::CertificateProvider => {
                    self.repositories.certificate_providers.delete(&bound).await?
                }
                ActorKind::Donor | ActorKind::Supporter => {}
            }
        }
        self.repositories.share_codes.delete(&share.keys()).await?;

        info!(lpa_id = %lpa_id, actor_type = %actor_type, "Opted out with reference number");
        Ok(())
    }

    /// Opt out as a logged-in actor: apply the opt-out to the LPA, then
    /// delete the caller's record, its pointer and the share code it was
    /// created from.
    pub async fn withdraw(&self, identity: &RequestIdentity, kind: ActorKind) -> Result<()> {
        let mut lpa = self.repositories.donors.get_any(identity).await?;

        let (actor_type, uid, share_key) = match kind {
            ActorKind::Attorney => {
                let attorney = self.repositories.attorneys.get(identity).await?;
                (attorney.actor_type(), attorney.uid, attorney.share_key)
            }
            ActorKind::CertificateProvider => {
                let certificate_provider =
                    self.repositories.certificate_providers.get(identity).await?;
                (
                    ActorType::CertificateProvider,
                    certificate_provider.uid,
                    certificate_provider.share_key,
                )
            }
            ActorKind::Donor => return Err(InvitationError::UnsupportedActorType(ActorType::Donor)),
            ActorKind::Supporter => {
                return Err(InvitationError::UnsupportedActorType(ActorType::Supporter))
            }
        };

        self.leave(&mut lpa, actor_type, uid).await?;

        match kind {
            ActorKind::Attorney => self.repositories.attorneys.delete(identity).await?,
            _ => self.repositories.certificate_providers.delete(identity).await?,
        }
        if let Some(keys) = share_key {
            self.repositories.share_codes.delete(&keys).await?;
        }

        info!(lpa_id = %lpa.lpa_id, actor_type = %actor_type, "Actor withdrew");
        Ok(())
    }

    /// Apply the opt-out transition for one actor to the LPA.
    async fn leave(
        &self,
        lpa: &mut DonorProvidedDetails,
        actor_type: ActorType,
        uid: Uuid,
    ) -> Result<()> {
        let actor_name = actor_name(lpa, actor_type, uid);

        match transition::check(LpaStage::of(lpa), actor_type, Action::OptOut)? {
            Outcome::ClearFromLpa => {
                if lpa.remove_actor(actor_type, uid) {
                    self.repositories.donors.put(lpa).await?;
                }
            }
            Outcome::NotifyDonor => {
                let donor_start_page_url =
                    format!("{}{}", self.app_public_url, ActorType::Donor.start_path());
                let email = if actor_type.is_attorney() {
                    Email::AttorneyOptedOut {
                        attorney_full_name: actor_name,
                        donor_full_name: lpa.donor.full_name(),
                        lpa_uid: lpa.lpa_uid.clone(),
                        donor_start_page_url,
                    }
                } else {
                    Email::CertificateProviderOptedOut {
                        certificate_provider_full_name: actor_name,
                        donor_full_name: lpa.donor.full_name(),
                        lpa_uid: lpa.lpa_uid.clone(),
                        donor_start_page_url,
                    }
                };
                self.notify
                    .send_actor_email(&lpa.donor.email, &lpa.lpa_uid, &email)
                    .await?;
            }
            Outcome::DeleteAccess | Outcome::Refused(_) => {}
        }
        Ok(())
    }

    // ========================================================================
    // Donor access
    // ========================================================================

    /// Withdraw the access a supporter gave a donor to an organisation LPA.
    ///
    /// Refused, with nothing changed, once the LPA has been paid for.
    pub async fn remove_donor_access(
        &self,
        identity: &RequestIdentity,
        reference: &str,
    ) -> Result<()> {
        let lpa = self.repositories.donors.get(identity).await?;
        let share = self
            .find(ActorType::Donor, &normalise_reference(reference))
            .await?;
        if share.lpa_key != lpa.pk {
            return Err(InvitationError::IncorrectReferenceNumber);
        }

        transition::check(LpaStage::of(&lpa), ActorType::Donor, Action::RemoveAccess)?;

        self.repositories.donors.delete_link(&share).await?;
        self.repositories.share_codes.delete(&share.keys()).await?;

        info!(lpa_id = %lpa.lpa_id, "Removed donor access");
        Ok(())
    }
}

/// Display name of an actor on the LPA, empty when it is no longer listed.
fn actor_name(lpa: &DonorProvidedDetails, actor_type: ActorType, uid: Uuid) -> String {
    let list = if actor_type.is_replacement() {
        &lpa.replacement_attorneys
    } else {
        &lpa.attorneys
    };

    match actor_type {
        ActorType::CertificateProvider => lpa.certificate_provider.full_name(),
        ActorType::TrustCorporation | ActorType::ReplacementTrustCorporation => list
            .trust_corporation
            .as_ref()
            .map(|tc| tc.name.clone())
            .unwrap_or_default(),
        ActorType::Attorney | ActorType::ReplacementAttorney => list
            .get(uid)
            .map(|a| a.full_name())
            .unwrap_or_default(),
        ActorType::Donor | ActorType::Supporter => String::new(),
    }
}
