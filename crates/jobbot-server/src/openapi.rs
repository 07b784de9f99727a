use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "JobBot API",
        version = "0.1.0",
        description = "Polite job-posting extraction from feeds, APIs, and rendered pages."
    ),
    paths(crate::routes::scrape, crate::routes::health),
    components(schemas(
        crate::dto::ScrapeRequest,
        crate::dto::ScrapeResponse,
        crate::dto::PostingDto,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "scrape", description = "Job posting extraction"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
