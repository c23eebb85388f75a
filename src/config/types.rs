//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::{FailurePolicy, DEFAULT_IMAGE_SIZE};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 图像后端配置
    #[serde(default)]
    pub backend: BackendConfig,

    /// 生成参数配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀（如 "/" 表示根路径托管）
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_enabled() -> bool {
    true
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 图像后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// 图像模型 API（API Key，返回 base64 JSON）
    #[default]
    Openai,
    /// 原始推理 HTTP 端点（Bearer Token，返回图像字节）
    InferenceEndpoint,
    /// 托管推理服务（Bearer Token，客户端内解码）
    HostedInference,
    /// 离线假后端（本地演示与测试）
    Fake,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Openai => "openai",
            BackendKind::InferenceEndpoint => "inference_endpoint",
            BackendKind::HostedInference => "hosted_inference",
            BackendKind::Fake => "fake",
        }
    }

    /// 默认模型
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Openai => "gpt-image-1",
            BackendKind::InferenceEndpoint | BackendKind::HostedInference => {
                "stabilityai/stable-diffusion-xl-base-1.0"
            }
            BackendKind::Fake => "fake",
        }
    }

    /// 默认服务地址
    pub fn default_base_url(&self) -> &'static str {
        match self {
            BackendKind::Openai => "https://api.openai.com",
            BackendKind::InferenceEndpoint | BackendKind::HostedInference => {
                "https://router.huggingface.co/hf-inference"
            }
            BackendKind::Fake => "",
        }
    }
}

/// 图像后端配置
///
/// 凭据不在这里：API Key / Token 只从进程环境变量读取
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// 后端类型
    #[serde(default)]
    pub kind: BackendKind,

    /// 模型标识，未设置时使用后端默认值
    #[serde(default)]
    pub model: Option<String>,

    /// 服务基础 URL，未设置时使用后端默认值
    #[serde(default)]
    pub base_url: Option<String>,

    /// 推理端点 URL（inference_endpoint 必填）
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// 单次请求超时时间（秒）
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_timeout() -> u64 {
    180
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            model: None,
            base_url: None,
            endpoint_url: None,
            timeout_secs: default_backend_timeout(),
        }
    }
}

impl BackendConfig {
    /// 实际使用的模型
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.kind.default_model().to_string())
    }

    /// 实际使用的服务地址（去掉末尾的 /）
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

/// 生成参数配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 请求未指定时的场景数
    #[serde(default = "default_max_scenes")]
    pub default_max_scenes: usize,

    /// 单次请求允许的最大场景数
    #[serde(default = "default_max_scenes_limit")]
    pub max_scenes_limit: usize,

    /// 场景失败后的处理策略
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// 出图尺寸
    #[serde(default = "default_image_size")]
    pub image_size: String,
}

fn default_max_scenes() -> usize {
    3
}

fn default_max_scenes_limit() -> usize {
    6
}

fn default_image_size() -> String {
    DEFAULT_IMAGE_SIZE.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_max_scenes: default_max_scenes(),
            max_scenes_limit: default_max_scenes_limit(),
            failure_policy: FailurePolicy::default(),
            image_size: default_image_size(),
        }
    }
}

impl GenerationConfig {
    /// 把请求的场景数限制在 [1, max_scenes_limit]
    pub fn clamp_max_scenes(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_scenes)
            .clamp(1, self.max_scenes_limit.max(1))
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.backend.kind, BackendKind::Openai);
        assert_eq!(config.backend.timeout_secs, 180);
        assert_eq!(config.generation.default_max_scenes, 3);
        assert_eq!(config.generation.max_scenes_limit, 6);
        assert_eq!(config.generation.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5070");
    }

    #[test]
    fn test_backend_defaults_per_kind() {
        let mut backend = BackendConfig::default();
        assert_eq!(backend.model(), "gpt-image-1");
        assert_eq!(backend.base_url(), "https://api.openai.com");

        backend.kind = BackendKind::HostedInference;
        assert_eq!(backend.model(), "stabilityai/stable-diffusion-xl-base-1.0");

        backend.model = Some("black-forest-labs/FLUX.1-schnell".into());
        backend.base_url = Some("http://localhost:9000/".into());
        assert_eq!(backend.model(), "black-forest-labs/FLUX.1-schnell");
        assert_eq!(backend.base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_clamp_max_scenes() {
        let generation = GenerationConfig::default();
        assert_eq!(generation.clamp_max_scenes(None), 3);
        assert_eq!(generation.clamp_max_scenes(Some(0)), 1);
        assert_eq!(generation.clamp_max_scenes(Some(4)), 4);
        assert_eq!(generation.clamp_max_scenes(Some(99)), 6);
    }
}
