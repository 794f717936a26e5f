//! RecordStore interface tests.
//!
//! These tests verify the contract of the RecordStore trait.
//! Each storage implementation should run these tests. Every test writes
//! under a fresh partition, so one store can serve the whole suite.

use uuid::Uuid;

use lpa_access::storage::keys;
use lpa_access::storage::{Item, Keys, RecordStore, StorageError, ACTOR_INDEX};

/// A partition key no other test touches.
pub fn fresh_pk() -> String {
    keys::lpa_key(&Uuid::new_v4().to_string())
}

pub fn make_item(pk: &str, sk: &str, data: &str) -> Item {
    Item::new(Keys::new(pk, sk), data)
}

// =============================================================================
// RecordStore::get / create / put / delete tests
// =============================================================================

pub async fn test_get_nonexistent<S: RecordStore>(store: &S) {
    let keys = Keys::new(fresh_pk(), "#DONOR#nobody");

    let err = store.get(&keys).await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
}

pub async fn test_create_then_get<S: RecordStore>(store: &S) {
    let pk = fresh_pk();
    let item = make_item(&pk, "#DONOR#s1", r#"{"LpaID":"1"}"#);

    store.create(item.clone()).await.unwrap();

    assert_eq!(store.get(&item.keys()).await.unwrap(), item);
}

pub async fn test_create_existing_fails<S: RecordStore>(store: &S) {
    let pk = fresh_pk();
    store
        .create(make_item(&pk, "#ATTORNEY#s1", "first"))
        .await
        .unwrap();

    let err = store
        .create(make_item(&pk, "#ATTORNEY#s1", "second"))
        .await
        .unwrap_err();
    assert!(err.is_already_exists(), "expected AlreadyExists, got {err:?}");

    let stored = store
        .get(&Keys::new(pk.as_str(), "#ATTORNEY#s1"))
        .await
        .unwrap();
    assert_eq!(stored.data, "first");
}

pub async fn test_put_overwrites<S: RecordStore>(store: &S) {
    let pk = fresh_pk();
    store
        .put(make_item(&pk, "#DONOR#s1", "v1"))
        .await
        .unwrap();
    store
        .put(make_item(&pk, "#DONOR#s1", "v2"))
        .await
        .unwrap();

    let stored = store.get(&Keys::new(pk.as_str(), "#DONOR#s1")).await.unwrap();
    assert_eq!(stored.data, "v2");
}

pub async fn test_delete<S: RecordStore>(store: &S) {
    let pk = fresh_pk();
    let item = make_item(&pk, "#SUB#s1", "#DONOR#d|ATTORNEY");
    store.put(item.clone()).await.unwrap();

    store.delete(&item.keys()).await.unwrap();

    assert!(store.get(&item.keys()).await.unwrap_err().is_not_found());
}

pub async fn test_delete_nonexistent_succeeds<S: RecordStore>(store: &S) {
    store
        .delete(&Keys::new(fresh_pk(), "#SUB#nobody"))
        .await
        .unwrap();
}

// =============================================================================
// RecordStore partial sort key tests
// =============================================================================

pub async fn test_get_one_by_partial_sk<S: RecordStore>(store: &S) {
    let pk = fresh_pk();
    store
        .put(make_item(&pk, "#DONOR#s1", "lpa"))
        .await
        .unwrap();
    store
        .put(make_item(&pk, "#ATTORNEY#s2", "attorney"))
        .await
        .unwrap();

    let item = store
        .get_one_by_partial_sk(&pk, keys::DONOR_PREFIX)
        .await
        .unwrap();
    assert_eq!(item.sk, "#DONOR#s1");
    assert_eq!(item.data, "lpa");
}

pub async fn test_get_one_by_partial_sk_none<S: RecordStore>(store: &S) {
    let pk = fresh_pk();
    store
        .put(make_item(&pk, "#ATTORNEY#s2", "attorney"))
        .await
        .unwrap();

    let err = store
        .get_one_by_partial_sk(&pk, keys::DONOR_PREFIX)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
}

pub async fn test_get_one_by_partial_sk_multiple<S: RecordStore>(store: &S) {
    let pk = fresh_pk();
    store
        .put(make_item(&pk, "#ATTORNEY#s1", "a"))
        .await
        .unwrap();
    store
        .put(make_item(&pk, "#ATTORNEY#s2", "b"))
        .await
        .unwrap();

    let err = store
        .get_one_by_partial_sk(&pk, keys::ATTORNEY_PREFIX)
        .await
        .unwrap_err();
    assert!(
        matches!(err, StorageError::MultipleResults { count: 2, .. }),
        "expected MultipleResults, got {err:?}"
    );
}

pub async fn test_get_all_by_partial_sk<S: RecordStore>(store: &S) {
    let pk = fresh_pk();
    store
        .put(make_item(&pk, "#ATTORNEY#s1", "a"))
        .await
        .unwrap();
    store
        .put(make_item(&pk, "#ATTORNEY#s2", "b"))
        .await
        .unwrap();
    store
        .put(make_item(&pk, "#DONOR#s3", "lpa"))
        .await
        .unwrap();
    store
        .put(make_item(&fresh_pk(), "#ATTORNEY#s4", "elsewhere"))
        .await
        .unwrap();

    let mut items = store
        .get_all_by_partial_sk(&pk, keys::ATTORNEY_PREFIX)
        .await
        .unwrap();
    items.sort_by(|a, b| a.sk.cmp(&b.sk));

    let sks: Vec<_> = items.iter().map(|i| i.sk.as_str()).collect();
    assert_eq!(sks, vec!["#ATTORNEY#s1", "#ATTORNEY#s2"]);
}

pub async fn test_get_all_by_partial_sk_empty<S: RecordStore>(store: &S) {
    let items = store
        .get_all_by_partial_sk(&fresh_pk(), keys::ATTORNEY_PREFIX)
        .await
        .unwrap();
    assert!(items.is_empty());
}

// =============================================================================
// RecordStore secondary index tests
// =============================================================================

pub async fn test_get_all_by_gsi_matches_sort_key<S: RecordStore>(store: &S) {
    let session = Uuid::new_v4().to_string();
    let sub_sk = keys::sub_key(&session);
    let lpa_a = fresh_pk();
    let lpa_b = fresh_pk();

    store
        .put(make_item(&lpa_a, &sub_sk, "#DONOR#d1|ATTORNEY"))
        .await
        .unwrap();
    store
        .put(make_item(&lpa_b, &sub_sk, "#DONOR#d2|CERTIFICATE_PROVIDER"))
        .await
        .unwrap();
    store
        .put(make_item(&lpa_a, &keys::sub_key("someone-else"), "#DONOR#d1|ATTORNEY"))
        .await
        .unwrap();

    let mut items = store.get_all_by_gsi(ACTOR_INDEX, &sub_sk).await.unwrap();
    items.sort_by(|a, b| a.pk.cmp(&b.pk));

    let mut expected = vec![lpa_a, lpa_b];
    expected.sort();
    let pks: Vec<_> = items.iter().map(|i| i.pk.clone()).collect();
    assert_eq!(pks, expected);
}

pub async fn test_get_all_by_gsi_preserves_pointer_data<S: RecordStore>(store: &S) {
    let session = Uuid::new_v4().to_string();
    let sub_sk = keys::sub_key(&session);
    let pk = fresh_pk();
    store
        .put(make_item(&pk, &sub_sk, "#ORGANISATION#org-1|REPLACEMENT_ATTORNEY"))
        .await
        .unwrap();

    let items = store.get_all_by_gsi(ACTOR_INDEX, &sub_sk).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].data, "#ORGANISATION#org-1|REPLACEMENT_ATTORNEY");
}

pub async fn test_get_all_by_gsi_unknown_index<S: RecordStore>(store: &S) {
    let err = store
        .get_all_by_gsi("SomeOtherIndex", "#SUB#x")
        .await
        .unwrap_err();
    assert!(
        matches!(err, StorageError::UnknownIndex(ref name) if name == "SomeOtherIndex"),
        "expected UnknownIndex, got {err:?}"
    );
}

// =============================================================================
// RecordStore::get_all_by_keys tests
// =============================================================================

pub async fn test_get_all_by_keys_skips_missing<S: RecordStore>(store: &S) {
    let pk_a = fresh_pk();
    let pk_b = fresh_pk();
    store
        .put(make_item(&pk_a, "#DONOR#s1", "a"))
        .await
        .unwrap();
    store
        .put(make_item(&pk_b, "#DONOR#s1", "b"))
        .await
        .unwrap();

    let mut items = store
        .get_all_by_keys(&[
            Keys::new(pk_a.as_str(), "#DONOR#s1"),
            Keys::new(fresh_pk(), "#DONOR#s1"),
            Keys::new(pk_b.as_str(), "#DONOR#s1"),
        ])
        .await
        .unwrap();
    items.sort_by(|a, b| a.data.cmp(&b.data));

    let data: Vec<_> = items.iter().map(|i| i.data.as_str()).collect();
    assert_eq!(data, vec!["a", "b"]);
}

pub async fn test_get_all_by_keys_empty<S: RecordStore>(store: &S) {
    assert!(store.get_all_by_keys(&[]).await.unwrap().is_empty());
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all RecordStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_record_store_tests {
    ($store:expr) => {
        use $crate::storage::record_store_tests::*;

        // point operations
        test_get_nonexistent($store).await;
        println!("  test_get_nonexistent: PASSED");

        test_create_then_get($store).await;
        println!("  test_create_then_get: PASSED");

        test_create_existing_fails($store).await;
        println!("  test_create_existing_fails: PASSED");

        test_put_overwrites($store).await;
        println!("  test_put_overwrites: PASSED");

        test_delete($store).await;
        println!("  test_delete: PASSED");

        test_delete_nonexistent_succeeds($store).await;
        println!("  test_delete_nonexistent_succeeds: PASSED");

        // partial sort key
        test_get_one_by_partial_sk($store).await;
        println!("  test_get_one_by_partial_sk: PASSED");

        test_get_one_by_partial_sk_none($store).await;
        println!("  test_get_one_by_partial_sk_none: PASSED");

        test_get_one_by_partial_sk_multiple($store).await;
        println!("  test_get_one_by_partial_sk_multiple: PASSED");

        test_get_all_by_partial_sk($store).await;
        println!("  test_get_all_by_partial_sk: PASSED");

        test_get_all_by_partial_sk_empty($store).await;
        println!("  test_get_all_by_partial_sk_empty: PASSED");

        // secondary index
        test_get_all_by_gsi_matches_sort_key($store).await;
        println!("  test_get_all_by_gsi_matches_sort_key: PASSED");

        test_get_all_by_gsi_preserves_pointer_data($store).await;
        println!("  test_get_all_by_gsi_preserves_pointer_data: PASSED");

        test_get_all_by_gsi_unknown_index($store).await;
        println!("  test_get_all_by_gsi_unknown_index: PASSED");

        // batch
        test_get_all_by_keys_skips_missing($store).await;
        println!("  test_get_all_by_keys_skips_missing: PASSED");

        test_get_all_by_keys_empty($store).await;
        println!("  test_get_all_by_keys_empty: PASSED");
    };
}
