use crate::error::ReconError;
use crate::models::MatchSummary;
use crate::publish::{self, PublishRequest, PublishedReport};
use crate::service::ReconcileOutput;
use crate::sheet;
use axum::{
    extract::{Json, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::AppState;

/// 响应体
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    pub summary: Option<MatchSummary>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub warnings: Vec<String>,
    pub published: Option<PublishedReport>,
}

impl ReconcileResponse {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            summary: None,
            columns: Vec::new(),
            rows: Vec::new(),
            warnings: Vec::new(),
            published: None,
        }
    }
}

/// 上传的文件
#[derive(Debug, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
}

/// 上传表单: invoices / ledger 两个文件, company / email 可选
#[derive(Debug, Default)]
pub struct ReconcileForm {
    pub invoices: Option<Upload>,
    pub ledger: Option<Upload>,
    pub company: Option<String>,
    pub email: Option<String>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 对账接口, 返回 JSON 结果表
pub async fn reconcile(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => return failure(StatusCode::BAD_REQUEST, message),
    };

    match run_job(state, form).await {
        Ok((output, published)) => {
            let response = ReconcileResponse {
                success: true,
                message: format!(
                    "Reconciled {} invoices: {} strict, {} relaxed, {} for manual review",
                    output.summary.total_invoices,
                    output.summary.strict_matches,
                    output.summary.relaxed_matches,
                    output.summary.manual_review
                ),
                summary: Some(output.summary),
                columns: output.table.columns,
                rows: output.table.rows,
                warnings: output.warnings.iter().map(|w| w.to_string()).collect(),
                published,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err((status, message)) => failure(status, message),
    }
}

/// 对账接口, 返回 CSV
pub async fn reconcile_csv(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(message) => return failure(StatusCode::BAD_REQUEST, message),
    };

    match run_job(state, form).await {
        Ok((output, _)) => {
            let mut body = Vec::new();
            if let Err(e) = sheet::write_table(&output.table, &mut body) {
                return failure(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e));
            }
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
                body,
            )
                .into_response()
        }
        Err((status, message)) => failure(status, message),
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(ReconcileResponse::failure(message))).into_response()
}

async fn read_form(mut multipart: Multipart) -> Result<ReconcileForm, String> {
    let mut form = ReconcileForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid upload: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "invoices" | "ledger" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Invalid upload '{}': {}", name, e))?;
                let upload = Upload {
                    bytes: bytes.to_vec(),
                    file_name,
                };
                if name == "invoices" {
                    form.invoices = Some(upload);
                } else {
                    form.ledger = Some(upload);
                }
            }
            "company" | "email" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("Invalid field '{}': {}", name, e))?;
                let text = Some(text.trim().to_string()).filter(|t| !t.is_empty());
                if name == "company" {
                    form.company = text;
                } else {
                    form.email = text;
                }
            }
            other => tracing::debug!("ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

/// 在阻塞线程池中执行对账 (及可选的发布)
async fn run_job(
    state: AppState,
    form: ReconcileForm,
) -> Result<(ReconcileOutput, Option<PublishedReport>), (StatusCode, String)> {
    let invoices = form
        .invoices
        .ok_or((StatusCode::BAD_REQUEST, "Missing file field 'invoices'".to_string()))?;
    let ledger = form
        .ledger
        .ok_or((StatusCode::BAD_REQUEST, "Missing file field 'ledger'".to_string()))?;

    let publish_request = match (&form.company, &form.email, &state.publisher) {
        (Some(company), Some(email), Some(_)) => Some(PublishRequest {
            display_name: publish::display_name_today(company),
            recipient: email.clone(),
        }),
        _ => None,
    };

    let job = tokio::task::spawn_blocking(move || {
        let output = state.service.reconcile_bytes(
            &invoices.bytes,
            invoices.file_name.as_deref(),
            &ledger.bytes,
            ledger.file_name.as_deref(),
        )?;
        let published = match (publish_request, &state.publisher) {
            (Some(request), Some(publisher)) => Some(publisher.publish(&output.table, &request)?),
            _ => None,
        };
        Ok::<_, ReconError>((output, published))
    });

    match job.await {
        Ok(Ok(done)) => Ok(done),
        Ok(Err(e)) => {
            tracing::error!("reconciliation failed: {}", e);
            Err((status_for(&e), format!("Error: {}", e)))
        }
        Err(e) => {
            tracing::error!("reconciliation task panicked: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)))
        }
    }
}

fn status_for(error: &ReconError) -> StatusCode {
    match error {
        ReconError::Schema { .. } | ReconError::Load { .. } | ReconError::EmptyWorkbook { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ReconError::Publish(_) => StatusCode::BAD_GATEWAY,
        ReconError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
