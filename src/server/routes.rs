use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::error::ApiError;
use super::state::{AppState, RunSummary};

/// GET /api/scan: run the pipeline and report its real outcome.
///
/// The run happens on the blocking pool inside a detached task that owns the
/// lock guard and records the summary. If the client goes away the run still
/// finishes, and later triggers keep getting 409 until it does.
pub async fn trigger_scan(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunSummary>, ApiError> {
    let guard = state
        .scan_lock
        .clone()
        .try_lock_owned()
        .map_err(|_| ApiError::Conflict("a scan is already running".into()))?;

    tracing::info!("running security scan");
    let run_state = state.clone();
    let run = tokio::spawn(async move {
        let _guard = guard;
        let options = run_state.scan_options.clone();
        let outcome = tokio::task::spawn_blocking(move || crate::scan(&options)).await?;
        if let Ok(report) = &outcome {
            *run_state.last_run.write().await = Some(RunSummary::from(report));
        }
        Ok::<_, tokio::task::JoinError>(outcome)
    });

    let outcome = run
        .await
        .and_then(|joined| joined)
        .map_err(|e| ApiError::Internal(format!("scan task failed: {e}")))?;

    match outcome {
        Ok(report) => {
            let summary = RunSummary::from(&report);
            tracing::info!(
                scan_id = %summary.scan_id,
                findings = summary.findings,
                high_risk = summary.high_risk,
                "scan completed"
            );
            Ok(Json(summary))
        }
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "scan failed");
            Err(ApiError::ScanFailed(e.to_string()))
        }
    }
}

/// GET /api/scan/status: summary of the last successful run.
pub async fn scan_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunSummary>, ApiError> {
    state
        .last_run
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no scan has completed yet".into()))
}
