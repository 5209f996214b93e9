use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobtrack API",
        version = "0.1.0",
        description = "Aggregated career, education, and job-posting data keyed by occupation code."
    ),
    paths(
        crate::routes::list_careers,
        crate::routes::career_detail,
        crate::routes::career_jobs,
        crate::routes::delete_career,
        crate::routes::list_programs,
        crate::routes::program_detail,
        crate::routes::career_programs,
        crate::routes::create_program,
        crate::routes::refresh_career,
        crate::routes::refresh_all,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::CareerListResponse,
        crate::dto::CareerDetailResponse,
        crate::dto::JobDataResponse,
        crate::dto::JobRecordResponse,
        crate::dto::EmployerResponse,
        crate::dto::ProgramListResponse,
        crate::dto::ProgramSummary,
        crate::dto::ProgramDetailResponse,
        crate::dto::ProgramCareerResponse,
        crate::dto::RelatedProgramsResponse,
        crate::dto::RelatedProgramResponse,
        crate::dto::CreateProgramRequest,
        crate::dto::RefreshRequest,
        crate::dto::RefreshAcceptedResponse,
        crate::dto::BulkRefreshAcceptedResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "careers", description = "Occupation details and persisted job data"),
        (name = "programs", description = "Academic programs and their linked careers"),
        (name = "refresh", description = "Background reconciliation"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "API key. Set via JOBTRACK_SERVER_API_KEY environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
