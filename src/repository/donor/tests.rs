use chrono::{Duration, TimeZone, Utc};

use super::*;
use crate::storage::MockRecordStore;
use crate::task::PaymentState;
use crate::utils::clock;

fn setup() -> (Arc<MockRecordStore>, DonorStore) {
    let mock = Arc::new(MockRecordStore::new());
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let store = DonorStore::new(mock.clone(), clock::fixed(at));
    (mock, store)
}

#[tokio::test]
async fn test_create_writes_record_and_pointer() {
    let (mock, store) = setup();
    let identity = RequestIdentity::new("sess").with_email("donor@example.com");

    let lpa = store.create(&identity).await.unwrap();

    assert_eq!(lpa.pk, format!("LPA#{}", lpa.lpa_id));
    assert_eq!(lpa.sk, "#DONOR#sess");
    assert_eq!(lpa.donor.email, "donor@example.com");
    assert_eq!(mock.len().await, 2);

    let pointer = mock
        .get(&keys::sub_keys(&lpa.lpa_id, "sess"))
        .await
        .unwrap();
    assert_eq!(pointer.data, "#DONOR#sess|DONOR");
}

#[tokio::test]
async fn test_get_requires_session() {
    let (_, store) = setup();

    let err = store.get(&RequestIdentity::default()).await.unwrap_err();
    assert!(matches!(err, Error::SessionMissing));

    let err = store.get(&RequestIdentity::new("sess")).await.unwrap_err();
    assert_eq!(err.to_string(), "donor_store.get requires lpa_id and session_id");
}

#[tokio::test]
async fn test_get_any_reads_without_caller_session() {
    let (_, store) = setup();
    let lpa = store.create(&RequestIdentity::new("donor")).await.unwrap();

    let other = RequestIdentity::new("attorney").with_lpa(&lpa.lpa_id);
    assert_eq!(store.get_any(&other).await.unwrap(), lpa);
    assert!(store
        .get(&other)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_get_any_without_any_identity_is_session_missing() {
    let (_, store) = setup();

    let err = store.get_any(&RequestIdentity::default()).await.unwrap_err();
    assert!(matches!(err, Error::SessionMissing));

    let err = store.get_any(&RequestIdentity::new("sess")).await.unwrap_err();
    assert_eq!(err.to_string(), "donor_store.get_any requires lpa_id");
}

#[tokio::test]
async fn test_get_all_sorted_most_recent_first() {
    let mock = Arc::new(MockRecordStore::new());
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let identity = RequestIdentity::new("sess");

    for (offset, lpa_id) in [(1, "b"), (5, "c"), (1, "a")] {
        let lpa = DonorProvidedDetails {
            pk: keys::lpa_key(lpa_id),
            sk: keys::donor_key("sess"),
            lpa_id: lpa_id.to_string(),
            updated_at: base + Duration::hours(offset),
            ..Default::default()
        };
        mock.put(Item::encode(lpa.keys(), &lpa).unwrap())
            .await
            .unwrap();
    }

    let store = DonorStore::new(mock, clock::fixed(base));
    let ids: Vec<_> = store
        .get_all(&identity)
        .await
        .unwrap()
        .into_iter()
        .map(|lpa| lpa.lpa_id)
        .collect();

    assert_eq!(ids, ["c", "a", "b"]);
}

#[tokio::test]
async fn test_put_stamps_updated_at() {
    let (mock, store) = setup();
    let mut lpa = store.create(&RequestIdentity::new("sess")).await.unwrap();
    lpa.updated_at = Utc.timestamp_opt(0, 0).unwrap();
    lpa.tasks.pay_for_lpa = PaymentState::Completed;

    store.put(&mut lpa).await.unwrap();

    assert_eq!(
        lpa.updated_at,
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    );
    let stored: DonorProvidedDetails = mock.get(&lpa.keys()).await.unwrap().decode().unwrap();
    assert!(stored.paid());
}

#[tokio::test]
async fn test_link_follows_reference_to_organisation_lpa() {
    let (mock, store) = setup();
    let org_lpa = DonorProvidedDetails {
        pk: keys::lpa_key("123"),
        sk: keys::organisation_key("org"),
        lpa_id: "123".to_string(),
        ..Default::default()
    };
    mock.put(Item::encode(org_lpa.keys(), &org_lpa).unwrap())
        .await
        .unwrap();

    let mut share = ShareCodeData {
        lpa_key: keys::lpa_key("123"),
        lpa_owner_key: keys::organisation_key("org"),
        ..Default::default()
    };
    let donor = RequestIdentity::new("donor").with_lpa("123");
    store.link(&donor, &share).await.unwrap();

    assert_eq!(store.get(&donor).await.unwrap(), org_lpa);
    assert_eq!(store.get_all(&donor).await.unwrap(), vec![org_lpa.clone()]);
    assert_eq!(
        mock.get(&keys::sub_keys("123", "donor")).await.unwrap().data,
        "#ORGANISATION#org|DONOR"
    );

    share.redeemed_by = Some("donor".to_string());
    store.delete_link(&share).await.unwrap();
    assert!(store.get(&donor).await.unwrap_err().is_not_found());
    assert_eq!(mock.len().await, 1);
}

#[tokio::test]
async fn test_get_any_falls_back_to_organisation_owner() {
    let (mock, store) = setup();
    let org_lpa = DonorProvidedDetails {
        pk: keys::lpa_key("9"),
        sk: keys::organisation_key("org"),
        lpa_id: "9".to_string(),
        ..Default::default()
    };
    mock.put(Item::encode(org_lpa.keys(), &org_lpa).unwrap())
        .await
        .unwrap();

    let identity = RequestIdentity::default().with_lpa("9");
    assert_eq!(store.get_any(&identity).await.unwrap(), org_lpa);
}
