//! Configuration Module
//!
//! 提供应用配置管理功能，支持多层级配置来源：
//! - 环境变量（最高优先级）
//! - 配置文件（TOML 格式）
//! - 默认值（最低优先级）
//!
//! 后端凭据单独从进程环境读取，见 `secrets`

mod loader;
mod secrets;
mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use secrets::{
    BackendSecrets, HF_INFERENCE_URL, HF_MODEL, HF_TOKEN, OPENAI_API_KEY, OPENAI_IMAGE_MODEL,
};
pub use types::{
    AppConfig, BackendConfig, BackendKind, GenerationConfig, LogConfig, ServerConfig,
    StaticFilesConfig,
};
