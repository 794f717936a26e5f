//! In-memory storage contract tests.
//!
//! Run with: cargo test --test storage_mock

mod storage;

use lpa_access::storage::MockRecordStore;

#[tokio::test]
async fn test_mock_record_store() {
    println!("=== Mock RecordStore Tests ===");

    let store = MockRecordStore::new();
    run_record_store_tests!(&store);

    println!("=== All Mock RecordStore tests PASSED ===");
}
