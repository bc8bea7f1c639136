use std::sync::Arc;

use tax_recon_rust::{
    api::{self, AppState},
    AppConfig, ReconcileService, XlsxPublisher,
};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let mut state = AppState::new(ReconcileService::new(config.recon.clone()));
    if let Some(dir) = &config.publish.output_dir {
        info!("Reports will be published to {}", dir);
        state = state.with_publisher(Arc::new(XlsxPublisher::new(dir)));
    }

    let app = api::router(state, config.server.max_upload_bytes);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/reconcile      - JSON result table");
    info!("  POST /api/reconcile/csv  - CSV result table");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
