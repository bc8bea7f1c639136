pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::publish::ReportPublisher;
use crate::service::ReconcileService;

pub use handlers::{health_check, reconcile, reconcile_csv, ReconcileResponse};

/// 共享状态: 对账服务 + 可选的报表发布
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReconcileService>,
    pub publisher: Option<Arc<dyn ReportPublisher>>,
}

impl AppState {
    pub fn new(service: ReconcileService) -> Self {
        Self {
            service: Arc::new(service),
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn ReportPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }
}

/// 构建路由
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/reconcile", post(reconcile))
        .route("/api/reconcile/csv", post(reconcile_csv))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
