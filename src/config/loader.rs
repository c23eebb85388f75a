//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::secrets::BackendSecrets;
use super::types::{AppConfig, BackendKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `PICTUREBOOK_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `PICTUREBOOK_SERVER__PORT=8080`
/// - `PICTUREBOOK_BACKEND__KIND=hosted_inference`
/// - `PICTUREBOOK_BACKEND__TIMEOUT_SECS=240`
/// - `PICTUREBOOK_GENERATION__FAILURE_POLICY=skip_and_continue`
///
/// API Key / Token 不走这里，见 [`BackendSecrets`]；
/// 但 `OPENAI_IMAGE_MODEL`、`HF_MODEL`、`HF_INFERENCE_URL` 会在校验前覆盖后端配置
pub fn load_config(secrets: &BackendSecrets) -> Result<AppConfig, ConfigError> {
    load_config_from_path(None, secrets)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
/// - `secrets` - 从环境读取的凭据与覆盖项
pub fn load_config_from_path(
    config_path: Option<&Path>,
    secrets: &BackendSecrets,
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("backend.kind", "openai")?
        .set_default("backend.timeout_secs", 180)?
        .set_default("generation.default_max_scenes", 3)?
        .set_default("generation.max_scenes_limit", 6)?
        .set_default("generation.failure_policy", "fail_fast")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: PICTUREBOOK_BACKEND__KIND=fake
    builder = builder.add_source(
        Environment::with_prefix("PICTUREBOOK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 4. 环境中的模型/端点覆盖
    secrets.apply_overrides(&mut app_config.backend);

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub(crate) fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.backend.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Backend timeout cannot be 0".to_string(),
        ));
    }

    if config.backend.kind == BackendKind::InferenceEndpoint
        && config
            .backend
            .endpoint_url
            .as_deref()
            .map_or(true, |url| url.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "backend.endpoint_url (or HF_INFERENCE_URL) is required for inference_endpoint"
                .to_string(),
        ));
    }

    let generation = &config.generation;
    if generation.max_scenes_limit == 0 {
        return Err(ConfigError::ValidationError(
            "generation.max_scenes_limit must be at least 1".to_string(),
        ));
    }
    if generation.default_max_scenes == 0
        || generation.default_max_scenes > generation.max_scenes_limit
    {
        return Err(ConfigError::ValidationError(format!(
            "generation.default_max_scenes must be between 1 and {}",
            generation.max_scenes_limit
        )));
    }

    if !generation.image_size.contains('x') {
        return Err(ConfigError::ValidationError(format!(
            "generation.image_size must look like 1024x1024, got {}",
            generation.image_size
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Backend: {}", config.backend.kind.as_str());
    tracing::info!("Backend Model: {}", config.backend.model());
    tracing::info!("Backend Base URL: {}", config.backend.base_url());
    if let Some(url) = &config.backend.endpoint_url {
        tracing::info!("Inference Endpoint: {}", url);
    }
    tracing::info!("Backend Timeout: {}s", config.backend.timeout_secs);
    tracing::info!(
        "Max Scenes: default {}, limit {}",
        config.generation.default_max_scenes,
        config.generation.max_scenes_limit
    );
    tracing::info!("Failure Policy: {}", config.generation.failure_policy.as_str());
    tracing::info!("Image Size: {}", config.generation.image_size);
    if config.server.static_files.enabled {
        tracing::info!("Static Files: {:?}", config.server.static_files.dir);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
