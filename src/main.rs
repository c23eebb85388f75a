//! Picturebook - 故事插画生成服务
//!
//! - Domain: story/ 场景分割与提示词组装
//! - Application: commands, queries, ports
//! - Infrastructure: http, adapters, events

use picturebook::config::{load_config, print_config, BackendSecrets};
use picturebook::infrastructure::adapters::build_image_generator;
use picturebook::infrastructure::http::{AppState, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 只是可选的便利，不存在时忽略
    let dotenv_path = dotenvy::dotenv().ok();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let secrets = BackendSecrets::from_env();
    let config =
        load_config(&secrets).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},picturebook={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Picturebook - 故事插画生成服务");
    if let Some(path) = dotenv_path {
        tracing::info!(path = %path.display(), "Loaded .env");
    }
    tracing::debug!(?secrets, "Backend secrets");
    print_config(&config);

    // 创建图像后端（凭据缺失时不退出，每次运行前报告）
    let generator = build_image_generator(&config.backend, &secrets)?;
    if let Err(missing) = generator.check_credentials() {
        tracing::warn!("{}", missing);
    }

    let server_config = ServerConfig::from(&config.server);
    let state = AppState::new(generator, config.generation.clone());
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
