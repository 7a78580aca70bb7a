//! OpenAPI documentation assembly via `utoipa`/`utoipa-swagger-ui`, carried
//! through as ambient stack even though spec.md is silent on API docs.

use utoipa::OpenApi;

use crate::routes::chat::{ChatRequest, ChatResponse};
use crate::routes::health::HealthResponse;
use crate::routes::indexing::{DirectoryEntry, IndexingStatusResponse, RebuildRequest, RebuildResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::indexing::rebuild,
        crate::routes::indexing::cancel,
        crate::routes::indexing::status,
        crate::routes::indexing::files,
        crate::routes::indexing::browse,
        crate::routes::chat::chat,
    ),
    components(schemas(
        HealthResponse,
        RebuildRequest,
        RebuildResponse,
        IndexingStatusResponse,
        DirectoryEntry,
        ChatRequest,
        ChatResponse,
    )),
    tags((name = "coderag", description = "Retrieval-augmented code search"))
)]
pub struct ApiDoc;
