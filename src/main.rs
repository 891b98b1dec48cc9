use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use nobg_backend::cors::build_cors_layer;
use nobg_backend::features::health;
use nobg_backend::features::matting::{BorderFloodMatting, MattingService, create_matting_router};
use nobg_backend::request_id::request_id_middleware;
use nobg_backend::startup::run_startup_checks;
use nobg_backend::state::AppState;
use nobg_backend::{ShutdownManager, config::AppConfig};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        nobg_backend::features::health::handler::health_check,
        nobg_backend::features::matting::handler::remove_background,
        nobg_backend::features::matting::handler::remove_background_preview,
    ),
    components(schemas(
        nobg_backend::features::health::handler::HealthResponse,
        nobg_backend::error::ErrorBody,
    )),
    tags(
        (name = "Health", description = "Health APIs"),
        (name = "Matting", description = "Background removal APIs"),
    ),
    info(
        title = "NoBG Backend API",
        version = "0.1.0",
        description = "Background removal backend service (Axum)"
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nobg_backend=info,tower_http=info".into()),
        )
        .init();

    // 创建优雅退出管理器
    let shutdown_manager = ShutdownManager::new();

    // Load config
    if let Err(e) = AppConfig::init_global() {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();

    // 启动信号处理器
    if let Err(e) = shutdown_manager.start_signal_handler().await {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    // Run startup checks（上传目录 create-if-absent，一次性副作用）
    if let Err(e) = run_startup_checks(config).await {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    // Shared state：分割后端是可替换的协作方，这里装配默认的边界泛洪实现
    let backend = Arc::new(BorderFloodMatting::new(config.matting.tolerance));
    let app_state = AppState {
        matting: MattingService::new(backend, config.matting.max_parallel),
    };

    // Routes
    let api_router = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .merge(create_matting_router());

    let mut app = Router::<AppState>::new()
        .nest(&config.api.prefix, api_router)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // 全局 request_id 中间件
    app = app.layer(axum::middleware::from_fn(request_id_middleware));

    // CORS：默认对任意来源开放（无凭证），与前端直连的使用方式一致
    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    // 请求体大小上限（multipart 上传）
    app = app.layer(DefaultBodyLimit::max(config.upload.max_body_bytes));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}{}/health", addr, config.api.prefix);
    tracing::info!(
        "Matting API: http://{}{}/remove-background",
        addr,
        config.api.prefix
    );

    // 启动服务器并等待优雅退出信号
    let shutdown_timeout = config.shutdown.timeout_duration();
    let timeout_secs = config.shutdown.timeout_secs;
    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!(
            "接收到退出信号: {:?}，开始优雅关闭HTTP服务器（超时 {} 秒）...",
            reason,
            timeout_secs
        );
        // 超过优雅退出窗口仍未收尾的请求不再等待
        tokio::spawn(async move {
            tokio::time::sleep(shutdown_timeout).await;
            tracing::warn!("优雅退出超时，强制退出");
            std::process::exit(1);
        });
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
