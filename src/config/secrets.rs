//! Backend Secrets
//!
//! 凭据与模型覆盖项只从进程环境读取（可由 .env 注入），不进入配置文件。
//! 缺失不会导致启动失败，而是在每次运行前作为前置条件报告。

use super::types::BackendConfig;

/// 图像模型 API 的 Key
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// 图像模型覆盖
pub const OPENAI_IMAGE_MODEL: &str = "OPENAI_IMAGE_MODEL";
/// 推理服务的 Bearer Token
pub const HF_TOKEN: &str = "HF_TOKEN";
/// 推理模型覆盖
pub const HF_MODEL: &str = "HF_MODEL";
/// 推理端点覆盖
pub const HF_INFERENCE_URL: &str = "HF_INFERENCE_URL";

/// 从环境变量读取的后端凭据
#[derive(Clone, Default)]
pub struct BackendSecrets {
    pub openai_api_key: Option<String>,
    pub openai_image_model: Option<String>,
    pub hf_token: Option<String>,
    pub hf_model: Option<String>,
    pub hf_inference_url: Option<String>,
}

impl std::fmt::Debug for BackendSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSecrets")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("openai_image_model", &self.openai_image_model)
            .field("hf_token", &self.hf_token.as_ref().map(|_| "***"))
            .field("hf_model", &self.hf_model)
            .field("hf_inference_url", &self.hf_inference_url)
            .finish()
    }
}

impl BackendSecrets {
    /// 从进程环境读取
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，空白值视为未设置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            openai_api_key: read(OPENAI_API_KEY),
            openai_image_model: read(OPENAI_IMAGE_MODEL),
            hf_token: read(HF_TOKEN),
            hf_model: read(HF_MODEL),
            hf_inference_url: read(HF_INFERENCE_URL),
        }
    }

    /// 用环境变量中的模型/端点覆盖配置文件的值
    pub fn apply_overrides(&self, backend: &mut BackendConfig) {
        use super::types::BackendKind;

        match backend.kind {
            BackendKind::Openai => {
                if let Some(model) = &self.openai_image_model {
                    backend.model = Some(model.clone());
                }
            }
            BackendKind::InferenceEndpoint | BackendKind::HostedInference => {
                if let Some(model) = &self.hf_model {
                    backend.model = Some(model.clone());
                }
                if let Some(url) = &self.hf_inference_url {
                    backend.endpoint_url = Some(url.clone());
                }
            }
            BackendKind::Fake => {}
        }
    }
}
