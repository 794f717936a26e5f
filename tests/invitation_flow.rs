//! End-to-end invitation scenarios over the in-memory store.
//!
//! Run with: cargo test --test invitation_flow

use std::sync::Arc;

use uuid::Uuid;

use lpa_access::actor::donor::{Attorney, CertificateProvider};
use lpa_access::actor::ActorType;
use lpa_access::actor::ActorKind;
use lpa_access::clients::MockNotifyClient;
use lpa_access::repository::Repositories;
use lpa_access::services::{InvitationError, InvitationService};
use lpa_access::session::RequestIdentity;
use lpa_access::storage::MockRecordStore;
use lpa_access::utils::clock;

struct World {
    repositories: Repositories,
    notify: Arc<MockNotifyClient>,
    invitations: InvitationService,
}

fn world() -> World {
    let store = Arc::new(MockRecordStore::new());
    let notify = Arc::new(MockNotifyClient::new());
    let repositories = Repositories::new(store, clock::system_now());
    let invitations =
        InvitationService::new(repositories.clone(), notify.clone(), "https://lpa.example");

    World {
        repositories,
        notify,
        invitations,
    }
}

#[tokio::test]
async fn test_invite_redeem_and_opt_out() {
    let w = world();
    let donor = RequestIdentity::new("donor-session").with_email("donor@example.com");

    // Donor drafts an LPA naming a certificate provider and one attorney.
    let created = w.repositories.donors.create(&donor).await.unwrap();
    let donor = donor.with_lpa(created.lpa_id.clone());
    let mut lpa = w.repositories.donors.get(&donor).await.unwrap();
    lpa.donor.first_names = "Jamie".to_string();
    lpa.donor.last_name = "Smith".to_string();
    lpa.certificate_provider = CertificateProvider {
        uid: Uuid::new_v4(),
        first_names: "Charlie".to_string(),
        last_name: "Cooper".to_string(),
        email: "cp@example.com".to_string(),
        ..Default::default()
    };
    lpa.attorneys.attorneys.push(Attorney {
        uid: Uuid::new_v4(),
        first_names: "Alex".to_string(),
        last_name: "Jones".to_string(),
        email: "attorney@example.com".to_string(),
        ..Default::default()
    });
    w.repositories.donors.put(&mut lpa).await.unwrap();

    let cp_code = w
        .invitations
        .send_certificate_provider_invite(&donor, &lpa)
        .await
        .unwrap();
    let attorney_codes = w.invitations.send_attorneys(&donor, &lpa).await.unwrap();
    assert_eq!(attorney_codes.len(), 1);
    assert_eq!(w.notify.sent().await.len(), 2);

    // Both invitees redeem their codes.
    let cp = RequestIdentity::new("cp-session").with_email("cp@example.com");
    let redeemed = w
        .invitations
        .redeem(&cp, ActorType::CertificateProvider, &cp_code)
        .await
        .unwrap();
    assert_eq!(redeemed.lpa_id, lpa.lpa_id);

    let attorney = RequestIdentity::new("attorney-session");
    let redeemed = w
        .invitations
        .redeem(&attorney, ActorType::Attorney, &attorney_codes[0])
        .await
        .unwrap();
    assert_eq!(redeemed.actor_type, ActorType::Attorney);

    // Each actor sees the LPA in their own dashboard bucket.
    let dashboard = w.repositories.dashboard.get_all(&cp).await.unwrap();
    assert_eq!(dashboard.certificate_provider.len(), 1);
    assert!(dashboard.attorney.is_empty());

    let dashboard = w.repositories.dashboard.get_all(&attorney).await.unwrap();
    assert_eq!(dashboard.attorney.len(), 1);
    assert_eq!(dashboard.attorney[0].lpa.lpa_id, lpa.lpa_id);

    let dashboard = w.repositories.dashboard.get_all(&donor).await.unwrap();
    assert_eq!(dashboard.donor.len(), 1);

    // A used code cannot be taken by someone else.
    let err = w
        .invitations
        .redeem(
            &RequestIdentity::new("intruder"),
            ActorType::CertificateProvider,
            &cp_code,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, InvitationError::IncorrectReferenceNumber));

    // The certificate provider withdraws before the LPA is signed.
    let cp_on_lpa = cp.clone().with_lpa(lpa.lpa_id.clone());
    w.invitations
        .withdraw(&cp_on_lpa, ActorKind::CertificateProvider)
        .await
        .unwrap();

    let lpa = w.repositories.donors.get(&donor).await.unwrap();
    assert!(lpa.certificate_provider.uid.is_nil());
    assert_eq!(lpa.attorneys.len(), 1);

    assert!(w
        .repositories
        .certificate_providers
        .get(&cp_on_lpa)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(w
        .repositories
        .dashboard
        .get_all(&cp)
        .await
        .unwrap()
        .is_empty());

    // The attorney is unaffected.
    let dashboard = w.repositories.dashboard.get_all(&attorney).await.unwrap();
    assert_eq!(dashboard.attorney.len(), 1);
}
