use jobtrack_core::model::{Area, AreaEntry, AreaKind, JobRecord, OccupationRecord, Period};
use jobtrack_db::OccupationRepository;

use crate::common::setup_test_db;

fn sample_record(code: &str) -> OccupationRecord {
    let mut record = OccupationRecord::new(code);
    let mut county = AreaEntry::county(
        Area::new("San Francisco County", AreaKind::County),
        vec!["94123".into()],
    );
    assert!(county.push_record(Some(25), JobRecord::new(Period::new(2026, 8), 120, 34)));
    record.areas.push(county);
    let mut state = AreaEntry::primitive(Area::new("CA", AreaKind::State));
    assert!(state.push_record(None, JobRecord::new(Period::new(2026, 8), 4100, 800)));
    record.areas.push(state);
    record
}

#[tokio::test]
async fn upsert_and_get_round_trip() {
    let (pool, _container) = setup_test_db().await;
    let repo = OccupationRepository::new(pool);

    let record = sample_record("15-1134.00");
    repo.upsert(&record).await.unwrap();

    let loaded = repo
        .get("15-1134.00")
        .await
        .unwrap()
        .expect("Should find the occupation");
    assert_eq!(loaded.code, "15-1134.00");
    assert_eq!(loaded.areas.len(), 2);
    assert!(loaded.area("San Francisco County").is_some());
}

#[tokio::test]
async fn get_unknown_code_is_none() {
    let (pool, _container) = setup_test_db().await;
    let repo = OccupationRepository::new(pool);

    assert!(repo.get("99-9999.00").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_replaces_the_existing_document() {
    let (pool, _container) = setup_test_db().await;
    let repo = OccupationRepository::new(pool);

    repo.upsert(&sample_record("15-1134.00")).await.unwrap();

    let mut updated = sample_record("15-1134.00");
    updated
        .areas
        .push(AreaEntry::primitive(Area::new("US", AreaKind::Country)));
    repo.upsert(&updated).await.unwrap();

    let loaded = repo.get("15-1134.00").await.unwrap().unwrap();
    assert_eq!(loaded.areas.len(), 3);
}

#[tokio::test]
async fn update_area_patches_only_the_matching_element() {
    let (pool, _container) = setup_test_db().await;
    let repo = OccupationRepository::new(pool);

    repo.upsert(&sample_record("15-1134.00")).await.unwrap();

    let mut record = repo.get("15-1134.00").await.unwrap().unwrap();
    let entry = record.area_mut("CA").unwrap();
    assert!(entry.push_record(None, JobRecord::new(Period::new(2026, 9), 4300, 810)));
    let entry = entry.clone();
    repo.update_area("15-1134.00", &entry).await.unwrap();

    let loaded = repo.get("15-1134.00").await.unwrap().unwrap();
    let ca = loaded.area("CA").unwrap();
    match &ca.jobs {
        jobtrack_core::model::AreaJobs::Primitive { records } => {
            assert_eq!(records.len(), 2);
        }
        other => panic!("unexpected jobs shape: {other:?}"),
    }
    // The county element is untouched.
    let county = loaded.area("San Francisco County").unwrap();
    match &county.jobs {
        jobtrack_core::model::AreaJobs::County { buckets, .. } => {
            assert_eq!(buckets[0].records.len(), 1);
        }
        other => panic!("unexpected jobs shape: {other:?}"),
    }
}

#[tokio::test]
async fn update_area_for_unknown_area_is_not_found() {
    let (pool, _container) = setup_test_db().await;
    let repo = OccupationRepository::new(pool);

    repo.upsert(&sample_record("15-1134.00")).await.unwrap();

    let entry = AreaEntry::primitive(Area::new("NV", AreaKind::State));
    let err = repo.update_area("15-1134.00", &entry).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_codes_is_sorted() {
    let (pool, _container) = setup_test_db().await;
    let repo = OccupationRepository::new(pool);

    repo.upsert(&sample_record("29-1141.00")).await.unwrap();
    repo.upsert(&sample_record("15-1134.00")).await.unwrap();

    let codes = repo.list_codes().await.unwrap();
    assert_eq!(codes, vec!["15-1134.00", "29-1141.00"]);
}

#[tokio::test]
async fn delete_removes_the_document() {
    let (pool, _container) = setup_test_db().await;
    let repo = OccupationRepository::new(pool);

    repo.upsert(&sample_record("15-1134.00")).await.unwrap();
    repo.delete("15-1134.00").await.unwrap();

    assert!(repo.get("15-1134.00").await.unwrap().is_none());
    // Deleting again is a no-op.
    repo.delete("15-1134.00").await.unwrap();
}
