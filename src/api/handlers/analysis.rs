use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::info;

use crate::analysis::analyze_placeholder;
use crate::api::{error::rejection_error, state::AppState, types::UploadResponse};
use crate::error::{EwclError, Result};
use crate::upload::{sanitize_filename, TempUpload};

/// Multipart field carrying the structure file.
pub const UPLOAD_FIELD: &str = "file";

/// POST /runrealewcltest
///
/// Placeholder analysis of an uploaded PDB file. The upload is staged in a
/// per-request temp file that is removed whether or not analysis succeeds.
pub async fn analyze_upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|r| rejection_error(r.status(), r.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection_error(e.status(), e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let raw_name = field
            .file_name()
            .ok_or_else(|| EwclError::Input("uploaded file has no filename".to_string()))?
            .to_string();
        let filename = sanitize_filename(&raw_name)?;
        let data = field
            .bytes()
            .await
            .map_err(|e| rejection_error(e.status(), e.body_text()))?;

        info!(filename = %filename, bytes = data.len(), "Received structure upload");

        let upload = TempUpload::write(&state.upload_dir, &data).await?;
        let text = upload.read_text().await?;

        let result = analyze_placeholder(&text, state.scoring);
        return Ok(Json(UploadResponse { filename, result }));
    }

    Err(EwclError::Input(format!(
        "missing multipart field `{UPLOAD_FIELD}`"
    )))
}
