//! Hosted Inference Client - 调用托管推理服务
//!
//! 外部 API:
//! POST {base_url}/models/{model}
//! Headers: Authorization: Bearer {HF_TOKEN}, Accept: image/png, x-wait-for-model: true
//! Request: {"inputs": "...", "parameters": {...}}  (JSON)
//! Response: 图像字节，在客户端内解码后返回
//!
//! 支持负向提示词、种子和引导强度

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

use super::inference_payload::{error_message, InferencePayload};
use crate::application::ports::{
    BackendCapabilities, GenerationError, ImageGeneratorPort, ImagePayload, ImageRequest,
    MissingCredentials,
};
use crate::config::HF_TOKEN;

/// 托管推理客户端配置
#[derive(Clone)]
pub struct HostedInferenceClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// 模型标识（如 stabilityai/stable-diffusion-xl-base-1.0）
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// Bearer Token
    pub token: Option<String>,
}

impl Default for HostedInferenceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.huggingface.co/hf-inference".to_string(),
            model: "stabilityai/stable-diffusion-xl-base-1.0".to_string(),
            timeout_secs: 180,
            token: None,
        }
    }
}

impl std::fmt::Debug for HostedInferenceClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedInferenceClientConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl HostedInferenceClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// 托管推理客户端
pub struct HostedInferenceClient {
    client: Client,
    config: HostedInferenceClientConfig,
}

impl HostedInferenceClient {
    pub fn new(config: HostedInferenceClientConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 模型 URL
    fn model_url(&self) -> String {
        format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl ImageGeneratorPort for HostedInferenceClient {
    fn backend_name(&self) -> &'static str {
        "hosted_inference"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::full()
    }

    fn check_credentials(&self) -> Result<(), MissingCredentials> {
        match &self.config.token {
            Some(_) => Ok(()),
            None => Err(MissingCredentials { variable: HF_TOKEN }),
        }
    }

    async fn generate(&self, request: ImageRequest) -> Result<ImagePayload, GenerationError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or_else(|| GenerationError::Auth(format!("{} is not configured", HF_TOKEN)))?;

        tracing::debug!(
            url = %self.model_url(),
            prompt_len = request.prompt.len(),
            seed = ?request.seed,
            "Sending hosted inference request"
        );

        let response = self
            .client
            .post(self.model_url())
            .bearer_auth(token)
            .header(header::ACCEPT, "image/png")
            .header("x-wait-for-model", "true")
            .json(&InferencePayload::from_request(&request))
            .send()
            .await
            .map_err(GenerationError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(
                status.as_u16(),
                error_message(error_text),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Network(format!("Failed to read body: {}", e)))?;

        if bytes.is_empty() {
            return Err(GenerationError::InvalidResponse(
                "hosted inference returned an empty body".to_string(),
            ));
        }

        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| GenerationError::Decode(format!("decode task failed: {}", e)))?
            .map_err(|e| GenerationError::Decode(e.to_string()))?;

        tracing::info!(
            model = %self.config.model,
            width = decoded.width(),
            height = decoded.height(),
            "Hosted inference returned image"
        );

        Ok(ImagePayload::Decoded(decoded))
    }
}
