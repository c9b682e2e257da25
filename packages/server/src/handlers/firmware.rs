use std::io;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use firmware_store::DistributionService;
use firmware_store::service::{Retrieval, UploadReceipt};
use firmware_store::storage::BoxReader;
use futures::SinkExt;
use futures::channel::mpsc;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::caller::CallerTag;
use crate::models::firmware::{DeleteResponse, FirmwareListResponse, UploadResponse};
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the artifact itself.
const MULTIPART_SLACK: usize = 1024 * 1024;

pub fn upload_body_limit(max_artifact_size: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_artifact_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_SLACK);
    DefaultBodyLimit::max(limit)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Artifacts",
    operation_id = "uploadArtifact",
    summary = "Upload a firmware binary",
    description = "Stores the `firmware` multipart file under an id derived from the upload time \
        and promotes it to `latest.bin`. Only `.bin` files up to the configured maximum size \
        (50 MiB by default) are accepted.",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `firmware` file field"),
    responses(
        (status = 200, description = "Firmware stored and promoted", body = UploadResponse),
        (status = 400, description = "Missing file, wrong extension or oversize (VALIDATION_ERROR, FILE_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_artifact(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("firmware") {
            continue; // Ignore unknown fields.
        }

        let file_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| AppError::Validation("Firmware field must have a filename".into()))?;

        let receipt = stream_field_to_service(field, &file_name, &state.service).await?;
        return Ok(Json(UploadResponse::from(receipt)));
    }

    Err(AppError::Validation("No firmware file provided".into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Artifacts",
    operation_id = "listArtifacts",
    summary = "List stored firmware",
    description = "Returns every stored firmware file except the `latest.bin` alias, newest first. \
        The file `latest.bin` currently serves carries `isLatest: true`.",
    responses(
        (status = 200, description = "Firmware list", body = FirmwareListResponse),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_artifacts(
    State(state): State<AppState>,
) -> Result<Json<FirmwareListResponse>, AppError> {
    let entries = state.service.enumerate().await?;
    Ok(Json(FirmwareListResponse::new(entries)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Artifacts",
    operation_id = "downloadArtifact",
    summary = "Download a firmware binary",
    description = "Streams the raw firmware bytes. `latest` or `latest.bin` returns the most \
        recently uploaded firmware; this is the URL OTA clients poll. Each successful download \
        is recorded in the download statistics.",
    params(("id" = String, Path, description = "Firmware file name, or `latest`")),
    responses(
        (status = 200, description = "Firmware bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 400, description = "Malformed file name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Firmware not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller))]
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: CallerTag,
) -> Result<Response, AppError> {
    let retrieval = state.service.retrieve(&id, caller.as_deref()).await?;
    build_firmware_response(retrieval)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Artifacts",
    operation_id = "deleteArtifact",
    summary = "Delete a firmware binary",
    description = "Deletes a stored firmware file. The `latest.bin` alias itself cannot be deleted. \
        Deleting the file `latest.bin` was promoted from is allowed; devices keep receiving its \
        bytes until the next upload, and no listed file is flagged latest in the meantime.",
    params(("id" = String, Path, description = "Firmware file name")),
    responses(
        (status = 200, description = "Firmware deleted", body = DeleteResponse),
        (status = 400, description = "Malformed name or the latest alias (VALIDATION_ERROR, LATEST_PROTECTED)", body = ErrorBody),
        (status = 404, description = "Firmware not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let removed = state.service.remove(&id).await?;
    Ok(Json(DeleteResponse {
        message: "Firmware file deleted successfully".into(),
        id: removed.into_inner(),
    }))
}

/// Pipe a multipart field into the service without buffering it in memory.
///
/// A read error on the request body is forwarded to the store as an I/O
/// error, so a truncated upload is discarded rather than published.
async fn stream_field_to_service(
    mut field: Field<'_>,
    file_name: &str,
    service: &DistributionService,
) -> Result<UploadReceipt, AppError> {
    let (mut tx, rx) = mpsc::channel::<io::Result<Bytes>>(8);
    let reader: BoxReader = Box::new(StreamReader::new(rx));

    let pump = async move {
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    // Receiver gone: the store stopped reading and reports why.
                    if tx.send(Ok(chunk)).await.is_err() {
                        return Ok(());
                    }
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    let _ = tx
                        .send(Err(io::Error::other(format!("upload aborted: {e}"))))
                        .await;
                    return Err(AppError::Validation(format!("Upload read error: {e}")));
                }
            }
        }
    };

    let (pumped, stored) = tokio::join!(pump, service.upload(file_name, reader));
    pumped?;
    Ok(stored?)
}

fn build_firmware_response(retrieval: Retrieval) -> Result<Response, AppError> {
    let Retrieval { metadata, reader } = retrieval;
    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, metadata.size_bytes.to_string())
        // Served ids are clock-derived ASCII names or `latest.bin`.
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", metadata.id),
        )
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
