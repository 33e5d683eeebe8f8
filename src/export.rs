use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::client::SecurityApi;
use crate::metrics::Metrics;
use crate::models::ExportRequest;

/// Canonical download name: `security-events-{from}-to-{to}.{format}`.
pub fn export_filename(request: &ExportRequest) -> String {
    format!(
        "security-events-{}-to-{}.{}",
        request.start_date.format("%Y-%m-%d"),
        request.end_date.format("%Y-%m-%d"),
        request.format.extension()
    )
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub filename: String,
    pub saved_to: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// Fetch an export blob and write it under the export directory. The size
/// reported is the real blob size; nothing is estimated.
pub async fn download(
    api: &dyn SecurityApi,
    request: &ExportRequest,
    export_dir: &Path,
    metrics: &Metrics,
) -> Result<ExportOutcome> {
    let blob = api.fetch_export(request).await?;
    let filename = export_filename(request);

    tokio::fs::create_dir_all(export_dir).await?;
    let path = export_dir.join(&filename);
    tokio::fs::write(&path, &blob.bytes).await?;

    metrics.exports.inc();
    info!(
        filename = %filename,
        size_bytes = blob.bytes.len(),
        "export download written"
    );

    Ok(ExportOutcome {
        filename,
        saved_to: path.display().to_string(),
        content_type: blob.content_type,
        size_bytes: blob.bytes.len(),
    })
}
