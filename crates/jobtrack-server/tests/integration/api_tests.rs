use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use jobtrack_core::model::{Area, AreaEntry, AreaKind, JobRecord, OccupationRecord, Period};
use jobtrack_core::program::{Program, ProgramCareer};

use crate::common::{setup_test_app, TEST_API_KEY};

fn seeded_record() -> OccupationRecord {
    let mut record = OccupationRecord::new("15-1134.00");
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
async fn health_returns_200() {
    let (app, _container) = setup_test_app().await;

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn unauthenticated_refresh_returns_401() {
    let (app, _container) = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::post("/v1/careers/15-1134.00/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let (app, _container) = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::post("/v1/refresh")
                .header("authorization", "Bearer wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authorized_refresh_is_accepted() {
    let (app, _container) = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::post("/v1/careers/15-1134.00/refresh")
                .header("authorization", format!("Bearer {TEST_API_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "15-1134.00");
    assert_eq!(json["status"], "accepted");
}

#[tokio::test]
async fn careers_list_is_public_and_sorted() {
    let (app, _container) = setup_test_app().await;
    app.repo.upsert(&seeded_record()).await.unwrap();

    let response = app
        .router
        .oneshot(Request::get("/v1/careers").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["codes"][0], "15-1134.00");
}

#[tokio::test]
async fn job_data_is_served_by_zip_alias_and_radius() {
    let (app, _container) = setup_test_app().await;
    app.repo.upsert(&seeded_record()).await.unwrap();

    let response = app
        .router
        .oneshot(
            Request::get("/v1/careers/15-1134.00/jobs?location=94123&radius=25")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["area"], "San Francisco County");
    assert_eq!(json["kind"], "county");
    assert_eq!(json["radius_miles"], 25);
    assert_eq!(json["records"][0]["job_count"], 120);
}

#[tokio::test]
async fn job_data_for_flat_area_ignores_radius() {
    let (app, _container) = setup_test_app().await;
    app.repo.upsert(&seeded_record()).await.unwrap();

    let response = app
        .router
        .oneshot(
            Request::get("/v1/careers/15-1134.00/jobs?location=CA")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["area"], "CA");
    assert!(json["radius_miles"].is_null());
    assert_eq!(json["records"][0]["job_count"], 4100);
}

#[tokio::test]
async fn job_data_for_unknown_code_is_404() {
    let (app, _container) = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::get("/v1/careers/99-9999.00/jobs?location=CA")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn seeded_program(code: u32, title: &str, careers: &[(&str, &str)]) -> Program {
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
async fn programs_list_is_public_and_sorted_by_title() {
    let (app, _container) = setup_test_app().await;
    app.programs
        .upsert(&seeded_program(1, "Nursing", &[]))
        .await
        .unwrap();
    app.programs
        .upsert(&seeded_program(2, "Accounting", &[]))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(Request::get("/v1/programs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["programs"][0]["title"], "Accounting");
    assert_eq!(json["programs"][1]["title"], "Nursing");
}

#[tokio::test]
async fn program_detail_includes_linked_careers() {
    let (app, _container) = setup_test_app().await;
    app.programs
        .upsert(&seeded_program(
            1,
            "Computer Science",
            &[("15-1134.00", "Web Developers")],
        ))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/v1/programs/1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["title"], "Computer Science");
    assert_eq!(json["careers"][0]["code"], "15-1134.00");

    let response = app
        .router
        .oneshot(Request::get("/v1/programs/99").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn career_programs_lists_only_linked_programs() {
    let (app, _container) = setup_test_app().await;
    app.programs
        .upsert(&seeded_program(
            1,
            "Web Design",
            &[("15-1134.00", "Web Developers")],
        ))
        .await
        .unwrap();
    app.programs
        .upsert(&seeded_program(
            2,
            "Computer Science",
            &[("15-1134.00", "Web Developers"), ("15-1132.00", "Software Developers")],
        ))
        .await
        .unwrap();
    app.programs
        .upsert(&seeded_program(3, "Nursing", &[("29-1141.00", "Registered Nurses")]))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(
            Request::get("/v1/careers/15-1134.00/programs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "15-1134.00");
    assert_eq!(json["total"], 2);
    assert_eq!(json["programs"][0]["title"], "Computer Science");
    assert_eq!(json["programs"][1]["title"], "Web Design");
    assert_eq!(json["programs"][1]["degree_types"][0], "AS Degree");
}

#[tokio::test]
async fn create_program_requires_auth() {
    let (app, _container) = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::post("/v1/programs")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title": "Computer Science"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn creating_an_existing_program_returns_it_without_rebuilding() {
    let (app, _container) = setup_test_app().await;
    app.programs
        .upsert(&seeded_program(
            7,
            "Computer Science",
            &[("15-1134.00", "Web Developers")],
        ))
        .await
        .unwrap();

    // Title match short-circuits before any occupation search.
    let response = app
        .router
        .oneshot(
            Request::post("/v1/programs")
                .header("authorization", format!("Bearer {TEST_API_KEY}"))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title": "computer science"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], 7);
    assert_eq!(json["title"], "Computer Science");
}

#[tokio::test]
async fn delete_requires_auth_and_removes_the_record() {
    let (app, _container) = setup_test_app().await;
    app.repo.upsert(&seeded_record()).await.unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::delete("/v1/careers/15-1134.00")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .oneshot(
            Request::delete("/v1/careers/15-1134.00")
                .header("authorization", format!("Bearer {TEST_API_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(app.repo.get("15-1134.00").await.unwrap().is_none());
}
