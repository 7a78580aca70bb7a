//! Indexing endpoints (spec.md §6 HTTP surface table): `rebuild`, `cancel`,
//! `status`, `files`, `browse`. Thin adapters — every one of these just
//! shapes a request/response around a `coderag_indexing::Indexer` or
//! `coderag_parsing` call; no business logic lives here (spec.md §1's
//! "deliberately out of scope" note for the HTTP surface).

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use coderag_indexing::IndexingStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RebuildRequest {
    pub root_path: String,
    #[serde(default)]
    pub exclude_patterns: Option<Vec<String>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RebuildResponse {
    pub message: String,
}

/// `POST /indexing/rebuild` — starts indexing; 202 Accepted.
///
/// Spawns the run on the background and returns immediately: spec.md §4.6
/// describes a single long-running coordinator observed via
/// `GET /indexing/status`, not a request that blocks until indexing finishes.
#[utoipa::path(
    post,
    path = "/indexing/rebuild",
    request_body = RebuildRequest,
    responses(
        (status = 202, description = "Indexing run accepted", body = RebuildResponse),
        (status = 400, description = "Bad request")
    )
)]
pub async fn rebuild(
    State(state): State<AppState>,
    Json(request): Json<RebuildRequest>,
) -> ApiResult<(StatusCode, Json<RebuildResponse>)> {
    if request.root_path.trim().is_empty() {
        return Err(ApiError::BadRequest("rootPath must not be empty".to_string()));
    }

    let indexer = state.indexer;
    let root_path = request.root_path;
    let exclude_patterns = request.exclude_patterns;
    tokio::spawn(async move {
        if let Err(err) = indexer.start_indexing(&root_path, exclude_patterns).await {
            tracing::warn!(error = %err, "indexing run rejected");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(RebuildResponse {
            message: "indexing run accepted".to_string(),
        }),
    ))
}

/// `POST /indexing/cancel` — signals cancellation; 200.
#[utoipa::path(
    post,
    path = "/indexing/cancel",
    responses((status = 200, description = "Cancellation signalled", body = RebuildResponse))
)]
pub async fn cancel(State(state): State<AppState>) -> Json<RebuildResponse> {
    state.indexer.cancel().await;
    Json(RebuildResponse {
        message: "cancellation signalled".to_string(),
    })
}

/// API-facing mirror of `coderag_indexing::IndexingStatus`, so the OpenAPI
/// schema doesn't require `utoipa` as a dependency of the core indexing crate.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct IndexingStatusResponse {
    pub is_indexing: bool,
    pub message: String,
    pub total_files: usize,
    pub processed_files: usize,
    pub current_file: Option<String>,
}

impl From<IndexingStatus> for IndexingStatusResponse {
    fn from(status: IndexingStatus) -> Self {
        Self {
            is_indexing: status.is_indexing,
            message: status.message,
            total_files: status.total_files,
            processed_files: status.processed_files,
            current_file: status.current_file,
        }
    }
}

/// `GET /indexing/status` — returns the `IndexingStatus` snapshot.
#[utoipa::path(
    get,
    path = "/indexing/status",
    responses((status = 200, description = "Current indexing status", body = IndexingStatusResponse))
)]
pub async fn status(State(state): State<AppState>) -> Json<IndexingStatusResponse> {
    Json(state.indexer.status().snapshot().await.into())
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct FilesQuery {
    pub root: String,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `GET /indexing/files` — lists the files that would be indexed under a root.
#[utoipa::path(
    get,
    path = "/indexing/files",
    params(FilesQuery),
    responses(
        (status = 200, description = "Indexable files under root", body = Vec<String>),
        (status = 400, description = "Bad request")
    )
)]
pub async fn files(
    Query(query): Query<FilesQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let root = PathBuf::from(&query.root);
    let exclude = query.exclude;
    let paths = tokio::task::spawn_blocking(move || -> ApiResult<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(ApiError::BadRequest(format!(
                "root path is not a directory: {}",
                root.display()
            )));
        }
        let project_type = coderag_parsing::detect_project_type(&root);
        let crawler = coderag_parsing::crawler_for(project_type);
        Ok(crawler.scan(&root, &exclude))
    })
    .await
    .map_err(|err| ApiError::Internal(format!("directory scan task panicked: {err}")))??;

    Ok(Json(
        paths
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect(),
    ))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct BrowseQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
}

/// `GET /indexing/browse` — directory listing; drives/roots when `path` is
/// omitted (spec.md §6).
#[utoipa::path(
    get,
    path = "/indexing/browse",
    params(BrowseQuery),
    responses(
        (status = 200, description = "Directory entries", body = Vec<DirectoryEntry>),
        (status = 400, description = "Bad request")
    )
)]
pub async fn browse(Query(query): Query<BrowseQuery>) -> ApiResult<Json<Vec<DirectoryEntry>>> {
    let Some(path) = query.path else {
        return Ok(Json(root_drives()));
    };

    let entries = tokio::task::spawn_blocking(move || -> ApiResult<Vec<DirectoryEntry>> {
        let dir = PathBuf::from(&path);
        if !dir.is_dir() {
            return Err(ApiError::BadRequest(format!(
                "path is not a directory: {path}"
            )));
        }

        let mut entries = Vec::new();
        let read_dir = std::fs::read_dir(&dir)
            .map_err(|err| ApiError::Internal(format!("could not read directory: {err}")))?;
        for entry in read_dir.flatten() {
            let entry_path = entry.path();
            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry_path.to_string_lossy().into_owned(),
                is_dir: entry_path.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    })
    .await
    .map_err(|err| ApiError::Internal(format!("directory listing task panicked: {err}")))??;

    Ok(Json(entries))
}

/// No drive letters to enumerate on a POSIX host; the filesystem root is the
/// starting point for an empty `path`.
fn root_drives() -> Vec<DirectoryEntry> {
    vec![DirectoryEntry {
        name: "/".to_string(),
        path: "/".to_string(),
        is_dir: true,
    }]
}
