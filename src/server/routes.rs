use crate::errors::{LedgerError, PersistenceWarning};
use crate::pricing::types::{BinomialRequest, HoLeeParams, HoLeeRequest, TermStructureUpload};
use crate::pricing::PricingRequest;
use crate::records::{BondRecord, RecordId};
use crate::session::{self, SessionView};
use crate::state::{AppState, PerfCounters, WsMessage};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use smallvec::SmallVec;
use std::sync::Arc;

/// Body returned by every mutating endpoint.
#[derive(Debug, serde::Serialize)]
pub struct MutationResponse {
    pub record: Option<BondRecord>,
    pub undo_available: bool,
    pub warnings: SmallVec<[PersistenceWarning; 2]>,
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = match &self {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::Pricing(_) => StatusCode::BAD_GATEWAY,
            LedgerError::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// GET /api/records -- full record log in display order
pub async fn get_records(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, LedgerError> {
    let records = state.session.records()?;
    let undo_available = state.session.snapshot_available()?;
    Ok(Json(serde_json::json!({
        "records": records,
        "undo_available": undo_available,
    })))
}

/// GET /api/view -- latest columnar view (from watch channel, no lock)
pub async fn get_view(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(state.session.view())
}

/// POST /api/records/binomial
pub async fn post_binomial(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BinomialRequest>,
) -> Result<Json<MutationResponse>, LedgerError> {
    submit(&state, PricingRequest::Binomial(req)).await
}

/// POST /api/records/ho-lee -- multipart: `params` JSON, optional `term_structure` file
pub async fn post_ho_lee(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<MutationResponse>, LedgerError> {
    let mut params: Option<HoLeeParams> = None;
    let mut term_structure = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LedgerError::Validation(format!("multipart: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("term_structure.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| LedgerError::Validation(format!("multipart {name}: {e}")))?;

        match name.as_str() {
            "params" => {
                let parsed = serde_json::from_slice(&bytes)
                    .map_err(|e| LedgerError::Validation(format!("params: {e}")))?;
                params = Some(parsed);
            }
            "term_structure" if !bytes.is_empty() => {
                term_structure = Some(TermStructureUpload::parse(file_name, bytes.to_vec())?);
            }
            "term_structure" => {}
            other => tracing::debug!(part = other, "ignoring unknown multipart part"),
        }
    }

    let params = params.ok_or_else(|| LedgerError::Validation("missing params part".into()))?;
    submit(&state, PricingRequest::HoLee(HoLeeRequest { params, term_structure })).await
}

async fn submit(
    state: &Arc<AppState>,
    request: PricingRequest,
) -> Result<Json<MutationResponse>, LedgerError> {
    let kind = request.kind();

    match session::price_and_record(&state.pricing, state.session.downgrade(), request).await {
        Ok(recorded) => {
            PerfCounters::bump(&state.counters.records_added);
            state.report_warnings(&recorded.report);
            Ok(Json(MutationResponse {
                record: Some(recorded.record),
                undo_available: recorded.undo_available,
                warnings: recorded.report.warnings,
            }))
        }
        Err(e) => {
            match &e {
                LedgerError::Pricing(failure) => {
                    PerfCounters::bump(&state.counters.pricing_failures);
                    state.broadcast(WsMessage::PricingFailed {
                        kind: kind.to_string(),
                        reason: failure.to_string(),
                    });
                }
                LedgerError::SessionClosed => {
                    PerfCounters::bump(&state.counters.completions_dropped);
                }
                _ => {}
            }
            Err(e)
        }
    }
}

/// DELETE /api/records/{id}
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<MutationResponse>, LedgerError> {
    let id: RecordId = raw_id
        .parse()
        .map_err(|e| LedgerError::Validation(format!("record id {raw_id:?}: {e}")))?;

    let deletion = state.session.delete(&id)?;
    if deletion.removed.is_some() {
        PerfCounters::bump(&state.counters.records_deleted);
    }
    tracing::info!(id = %id, removed = deletion.removed.is_some(), "delete applied");
    state.report_warnings(&deletion.report);

    Ok(Json(MutationResponse {
        record: deletion.removed,
        undo_available: true,
        warnings: deletion.report.warnings,
    }))
}

/// POST /api/undo -- 409 when no deletion has happened yet
pub async fn post_undo(State(state): State<Arc<AppState>>) -> Result<Response, LedgerError> {
    let Some(report) = state.session.undo()? else {
        let body = Json(serde_json::json!({ "error": "nothing to undo" }));
        return Ok((StatusCode::CONFLICT, body).into_response());
    };

    PerfCounters::bump(&state.counters.undos_applied);
    tracing::info!(records = state.session.view().table.len(), "undo applied");
    state.report_warnings(&report);

    Ok(Json(MutationResponse {
        record: None,
        undo_available: true,
        warnings: report.warnings,
    })
    .into_response())
}

/// GET /api/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "pricing_service": state.config.pricing_base_url,
        "records_added": state.counters.records_added.load(Relaxed),
        "records_deleted": state.counters.records_deleted.load(Relaxed),
        "undos_applied": state.counters.undos_applied.load(Relaxed),
        "pricing_failures": state.counters.pricing_failures.load(Relaxed),
        "persistence_warnings": state.counters.persistence_warnings.load(Relaxed),
        "completions_dropped": state.counters.completions_dropped.load(Relaxed),
        "notices_broadcast": state.counters.notices_broadcast.load(Relaxed),
        "ws_messages_sent": state.counters.ws_messages_sent.load(Relaxed),
    }))
}
