use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jobtrack_core::error::AppError;
use jobtrack_core::model::{AreaJobs, JobRecord, DEFAULT_RADIUS, NATIONAL_AREA};
use jobtrack_core::program::{Program, ProgramCareer};

use crate::auth::require_api_key;
use crate::dto::{
    BulkRefreshAcceptedResponse, CareerDetailQuery, CareerDetailResponse, CareerListResponse,
    CreateProgramRequest, HealthResponse, JobDataQuery, JobDataResponse, ProgramDetailResponse,
    ProgramListResponse, ProgramSummary, RefreshAcceptedResponse, RefreshRequest,
    RelatedProgramResponse, RelatedProgramsResponse,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/v1/careers/{code}/refresh", post(refresh_career))
        .route("/v1/refresh", post(refresh_all))
        .route("/v1/careers/{code}", delete(delete_career))
        .route("/v1/programs", post(create_program))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .route("/v1/careers", get(list_careers))
        .route("/v1/careers/{code}", get(career_detail))
        .route("/v1/careers/{code}/jobs", get(career_jobs))
        .route("/v1/careers/{code}/programs", get(career_programs))
        .route("/v1/programs", get(list_programs))
        .route("/v1/programs/{code}", get(program_detail))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(protected).with_state(state)
}

// ---------------------------------------------------------------------------
// Careers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/careers",
    responses(
        (status = 200, description = "Tracked occupation codes", body = CareerListResponse),
    ),
    tag = "careers"
)]
pub async fn list_careers(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let codes = state.db.occupation_repo().list_codes().await?;
    let total = codes.len();
    Ok(axum::Json(CareerListResponse { codes, total }))
}

#[utoipa::path(
    get,
    path = "/v1/careers/{code}",
    params(
        ("code" = String, Path, description = "Occupation code"),
        CareerDetailQuery,
    ),
    responses(
        (status = 200, description = "Occupation detail", body = CareerDetailResponse),
        (status = 404, description = "Unknown occupation", body = crate::dto::ErrorResponse),
    ),
    tag = "careers"
)]
pub async fn career_detail(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(query): Query<CareerDetailQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let location = query.location.unwrap_or_else(|| NATIONAL_AREA.to_string());
    let profile = state.careers.occupation_detail(&code, &location).await?;

    // Skills are decoration on the detail page; an O*NET outage should not
    // take the route down.
    let technical_skills = match state.onet.technical_skills(&code).await {
        Ok(skills) => skills,
        Err(err) => {
            tracing::warn!(code, error = %err, "technical skills unavailable");
            Vec::new()
        }
    };

    let wages = serde_json::to_value(&profile.wages).map_err(AppError::from)?;
    Ok(axum::Json(CareerDetailResponse::new(
        profile,
        technical_skills,
        wages,
    )))
}

#[utoipa::path(
    get,
    path = "/v1/careers/{code}/jobs",
    params(
        ("code" = String, Path, description = "Occupation code"),
        JobDataQuery,
    ),
    responses(
        (status = 200, description = "Persisted job data for an area", body = JobDataResponse),
        (status = 404, description = "No data for code or area", body = crate::dto::ErrorResponse),
    ),
    tag = "careers"
)]
pub async fn career_jobs(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(query): Query<JobDataQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .db
        .occupation_repo()
        .get(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("occupation {code}")))?;

    let entry = record
        .areas
        .iter()
        .find(|e| {
            e.area.name == query.location
                || matches!(&e.jobs, AreaJobs::County { zip_aliases, .. }
                    if zip_aliases.contains(&query.location))
        })
        .ok_or_else(|| {
            AppError::NotFound(format!("no data for {} near {}", code, query.location))
        })?;

    let (radius_miles, records): (Option<u32>, &[JobRecord]) = match &entry.jobs {
        AreaJobs::Primitive { records } => (None, records),
        AreaJobs::County { buckets, .. } => {
            let radius = query.radius.unwrap_or(DEFAULT_RADIUS);
            let bucket = buckets
                .iter()
                .find(|b| b.radius_miles == radius)
                .ok_or_else(|| {
                    AppError::NotFound(format!("no {radius}-mile bucket for {}", entry.area.name))
                })?;
            (Some(radius), &bucket.records)
        }
    };

    Ok(axum::Json(JobDataResponse::from_entry(
        &code,
        entry,
        radius_miles,
        records,
        record.last_updated,
    )))
}

#[utoipa::path(
    delete,
    path = "/v1/careers/{code}",
    params(("code" = String, Path, description = "Occupation code")),
    responses(
        (status = 204, description = "Occupation removed"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "careers"
)]
pub async fn delete_career(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.occupation_repo().delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/programs",
    responses(
        (status = 200, description = "Academic programs, sorted by title", body = ProgramListResponse),
    ),
    tag = "programs"
)]
pub async fn list_programs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let programs: Vec<ProgramSummary> = state
        .db
        .program_repo()
        .list_summaries()
        .await?
        .into_iter()
        .map(|(code, title)| ProgramSummary { code, title })
        .collect();
    let total = programs.len();
    Ok(axum::Json(ProgramListResponse { programs, total }))
}

#[utoipa::path(
    get,
    path = "/v1/programs/{code}",
    params(("code" = u32, Path, description = "Program code")),
    responses(
        (status = 200, description = "Program detail", body = ProgramDetailResponse),
        (status = 404, description = "Unknown program", body = crate::dto::ErrorResponse),
    ),
    tag = "programs"
)]
pub async fn program_detail(
    State(state): State<Arc<AppState>>,
    Path(code): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let program = state
        .db
        .program_repo()
        .get(code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("program {code}")))?;
    Ok(axum::Json(ProgramDetailResponse::from(program)))
}

#[utoipa::path(
    get,
    path = "/v1/careers/{code}/programs",
    params(("code" = String, Path, description = "Occupation code")),
    responses(
        (status = 200, description = "Programs feeding into an occupation", body = RelatedProgramsResponse),
    ),
    tag = "programs"
)]
pub async fn career_programs(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let programs: Vec<RelatedProgramResponse> = state
        .db
        .program_repo()
        .find_by_career(&code)
        .await?
        .into_iter()
        .map(|p| RelatedProgramResponse {
            code: p.code,
            title: p.title,
            degree_types: p.degree_types,
        })
        .collect();
    let total = programs.len();
    Ok(axum::Json(RelatedProgramsResponse {
        code,
        programs,
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/programs",
    request_body = CreateProgramRequest,
    responses(
        (status = 201, description = "Program created with its matched careers", body = ProgramDetailResponse),
        (status = 200, description = "Program already exists", body = ProgramDetailResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "programs"
)]
pub async fn create_program(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<CreateProgramRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.program_repo();
    if let Some(existing) = repo.get_by_title(&body.title).await? {
        return Ok((
            StatusCode::OK,
            axum::Json(ProgramDetailResponse::from(existing)),
        ));
    }

    let matches = state
        .onet
        .search_occupations(&body.title.to_lowercase())
        .await?;
    let code = repo.next_code().await?;
    let mut program = Program::new(code, body.title, body.degree_types);
    program.assign_careers(
        matches.into_iter().map(|m| ProgramCareer {
            code: m.code,
            title: m.title,
        }),
        &[],
    );
    repo.upsert(&program).await?;

    tracing::info!(code, title = %program.title, careers = program.careers.len(), "program created");
    Ok((
        StatusCode::CREATED,
        axum::Json(ProgramDetailResponse::from(program)),
    ))
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/careers/{code}/refresh",
    params(("code" = String, Path, description = "Occupation code")),
    request_body = RefreshRequest,
    responses(
        (status = 202, description = "Refresh accepted", body = RefreshAcceptedResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "refresh"
)]
pub async fn refresh_career(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    body: Option<axum::Json<RefreshRequest>>,
) -> impl IntoResponse {
    let location = body.and_then(|b| b.0.location);
    let engine = state.engine.clone();
    let spawn_code = code.clone();
    tokio::spawn(async move {
        match engine.refresh(&spawn_code, location.as_deref()).await {
            Ok(report) => tracing::info!(
                code = %report.code,
                records_written = report.records_written,
                "background refresh finished"
            ),
            Err(err) => tracing::error!(code = %spawn_code, error = %err, "background refresh failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        axum::Json(RefreshAcceptedResponse {
            code,
            status: "accepted".to_string(),
        }),
    )
}

#[utoipa::path(
    post,
    path = "/v1/refresh",
    responses(
        (status = 202, description = "Bulk refresh accepted", body = BulkRefreshAcceptedResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "refresh"
)]
pub async fn refresh_all(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = state.engine.clone();
    tokio::spawn(async move {
        match engine.refresh_all().await {
            Ok(report) => tracing::info!(
                refreshed = report.reports.len(),
                failed = report.failed.len(),
                "bulk refresh finished"
            ),
            Err(err) => tracing::error!(error = %err, "bulk refresh failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        axum::Json(BulkRefreshAcceptedResponse {
            status: "accepted".to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_status = match state.db.occupation_repo().health_check().await {
        Ok(()) => "ok",
        Err(_) => "error",
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        database: db_status,
    };

    (status, axum::Json(response))
}
