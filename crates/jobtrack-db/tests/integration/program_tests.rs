use jobtrack_core::program::{Program, ProgramCareer};
use jobtrack_db::ProgramRepository;

use crate::common::setup_test_db;

fn sample_program(code: u32, title: &str, careers: &[(&str, &str)]) -> Program {
    let mut program = Program::new(code, title, vec!["AS Degree".into()]);
    program.assign_careers(
        careers.iter().map(|(code, title)| ProgramCareer {
            code: code.to_string(),
            title: title.to_string(),
        }),
        &[],
    );
    program
}

#[tokio::test]
async fn upsert_and_get_round_trip() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProgramRepository::new(pool);

    let program = sample_program(1, "Computer Science", &[("15-1134.00", "Web Developers")]);
    repo.upsert(&program).await.unwrap();

    let loaded = repo.get(1).await.unwrap().expect("Should find the program");
    assert_eq!(loaded.title, "Computer Science");
    assert_eq!(loaded.degree_types, vec!["AS Degree"]);
    assert!(loaded.has_career("15-1134.00"));
}

#[tokio::test]
async fn get_unknown_code_is_none() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProgramRepository::new(pool);

    assert!(repo.get(42).await.unwrap().is_none());
}

#[tokio::test]
async fn title_lookup_is_case_insensitive() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProgramRepository::new(pool);

    repo.upsert(&sample_program(1, "Computer Science", &[]))
        .await
        .unwrap();

    let loaded = repo.get_by_title("computer science").await.unwrap();
    assert_eq!(loaded.map(|p| p.code), Some(1));
    assert!(repo.get_by_title("Nursing").await.unwrap().is_none());
}

#[tokio::test]
async fn next_code_continues_the_sequence() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProgramRepository::new(pool);

    assert_eq!(repo.next_code().await.unwrap(), 1);
    repo.upsert(&sample_program(1, "Computer Science", &[]))
        .await
        .unwrap();
    repo.upsert(&sample_program(2, "Nursing", &[]))
        .await
        .unwrap();
    assert_eq!(repo.next_code().await.unwrap(), 3);
}

#[tokio::test]
async fn summaries_sort_by_title_ignoring_case() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProgramRepository::new(pool);

    repo.upsert(&sample_program(1, "nursing", &[])).await.unwrap();
    repo.upsert(&sample_program(2, "Accounting", &[]))
        .await
        .unwrap();
    repo.upsert(&sample_program(3, "Biology", &[])).await.unwrap();

    let summaries = repo.list_summaries().await.unwrap();
    let titles: Vec<&str> = summaries.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(titles, vec!["Accounting", "Biology", "nursing"]);
}

#[tokio::test]
async fn find_by_career_matches_on_contained_code() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProgramRepository::new(pool);

    repo.upsert(&sample_program(
        1,
        "Computer Science",
        &[("15-1134.00", "Web Developers"), ("15-1132.00", "Software Developers")],
    ))
    .await
    .unwrap();
    repo.upsert(&sample_program(
        2,
        "Web Design",
        &[("15-1134.00", "Web Developers")],
    ))
    .await
    .unwrap();
    repo.upsert(&sample_program(3, "Nursing", &[("29-1141.00", "Registered Nurses")]))
        .await
        .unwrap();

    let related = repo.find_by_career("15-1134.00").await.unwrap();
    let titles: Vec<&str> = related.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Computer Science", "Web Design"]);
}

#[tokio::test]
async fn duplicate_titles_are_rejected() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProgramRepository::new(pool);

    repo.upsert(&sample_program(1, "Computer Science", &[]))
        .await
        .unwrap();
    assert!(repo
        .upsert(&sample_program(2, "computer science", &[]))
        .await
        .is_err());
}

#[tokio::test]
async fn delete_removes_the_program() {
    let (pool, _container) = setup_test_db().await;
    let repo = ProgramRepository::new(pool);

    repo.upsert(&sample_program(1, "Computer Science", &[]))
        .await
        .unwrap();
    repo.delete(1).await.unwrap();
    assert!(repo.get(1).await.unwrap().is_none());
    // Unknown codes are a no-op.
    repo.delete(1).await.unwrap();
}
