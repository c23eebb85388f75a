//! OpenAI Image Client - 调用图像模型 API
//!
//! 实现 ImageGeneratorPort trait，通过 API Key 调用图像生成接口
//!
//! 外部 API:
//! POST {base_url}/v1/images/generations
//! Request: {"model": "...", "prompt": "...", "size": "1024x1024", "n": 1}  (JSON)
//! Response: {"data": [{"b64_json": "..."}]}
//!
//! 不支持负向提示词、种子和引导强度

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    BackendCapabilities, GenerationError, ImageGeneratorPort, ImagePayload, ImageRequest,
    MissingCredentials,
};
use crate::config::OPENAI_API_KEY;

/// 图像生成请求体 (JSON)
#[derive(Debug, Serialize)]
struct OpenAiImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
    /// 只有 dall-e 系列需要显式要求 base64，gpt-image 系列总是返回 base64
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'static str>,
}

/// 图像生成响应体
#[derive(Debug, Deserialize)]
struct OpenAiImageResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiImageData {
    #[serde(default)]
    b64_json: Option<String>,
}

/// 错误响应体
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// OpenAI 图像客户端配置
#[derive(Clone)]
pub struct OpenAiImageClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// 模型标识
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// API Key（缺失时在运行前报告）
    pub api_key: Option<String>,
}

impl Default for OpenAiImageClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-image-1".to_string(),
            timeout_secs: 180,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for OpenAiImageClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiImageClientConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl OpenAiImageClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// OpenAI 图像客户端
pub struct OpenAiImageClient {
    client: Client,
    config: OpenAiImageClientConfig,
}

impl OpenAiImageClient {
    /// 创建新的客户端
    pub fn new(config: OpenAiImageClientConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取生成 URL
    fn generations_url(&self) -> String {
        format!(
            "{}/v1/images/generations",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn response_format(&self) -> Option<&'static str> {
        self.config
            .model
            .starts_with("dall-e")
            .then_some("b64_json")
    }
}

#[async_trait]
impl ImageGeneratorPort for OpenAiImageClient {
    fn backend_name(&self) -> &'static str {
        "openai"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }

    fn check_credentials(&self) -> Result<(), MissingCredentials> {
        match &self.config.api_key {
            Some(_) => Ok(()),
            None => Err(MissingCredentials {
                variable: OPENAI_API_KEY,
            }),
        }
    }

    async fn generate(&self, request: ImageRequest) -> Result<ImagePayload, GenerationError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            GenerationError::Auth(format!("{} is not configured", OPENAI_API_KEY))
        })?;

        let body = OpenAiImageRequest {
            model: &self.config.model,
            prompt: &request.prompt,
            size: &request.size,
            n: 1,
            response_format: self.response_format(),
        };

        tracing::debug!(
            url = %self.generations_url(),
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            size = %request.size,
            "Sending image generation request"
        );

        let response = self
            .client
            .post(self.generations_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(GenerationError::from_status(status.as_u16(), message));
        }

        let parsed: OpenAiImageResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let b64 = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| {
                GenerationError::InvalidResponse("response contained no b64_json image".to_string())
            })?;

        tracing::info!(
            model = %self.config.model,
            payload_len = b64.len(),
            "Image generation completed"
        );

        Ok(ImagePayload::Base64(b64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::GeneratedImage;
    use crate::infrastructure::adapters::image::test_support::{png_base64, spawn_stub};
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_config_builder() {
        let config = OpenAiImageClientConfig::new("http://example.com")
            .with_model("dall-e-3")
            .with_timeout(60)
            .with_api_key("sk-test");
        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.model, "dall-e-3");
        assert_eq!(config.timeout_secs, 60);
        assert!(!format!("{:?}", config).contains("sk-test"));
    }

    #[test]
    fn test_missing_key_is_reported() {
        let client = OpenAiImageClient::new(OpenAiImageClientConfig::default()).unwrap();
        let err = client.check_credentials().unwrap_err();
        assert_eq!(err.variable, OPENAI_API_KEY);
        assert_eq!(client.capabilities(), BackendCapabilities::default());
    }

    #[test]
    fn test_response_format_only_for_dall_e() {
        let gpt = OpenAiImageClient::new(OpenAiImageClientConfig::default()).unwrap();
        assert_eq!(gpt.response_format(), None);
        let dalle =
            OpenAiImageClient::new(OpenAiImageClientConfig::default().with_model("dall-e-3"))
                .unwrap();
        assert_eq!(dalle.response_format(), Some("b64_json"));
    }

    #[tokio::test]
    async fn test_generate_decodes_b64_payload() {
        let seen: Arc<Mutex<Vec<(Option<String>, Value)>>> = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/v1/images/generations",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((auth, body));
                    Json(json!({ "created": 1, "data": [{ "b64_json": png_base64([200, 10, 10]) }] }))
                }
            }),
        );
        let base_url = spawn_stub(router).await;

        let client = OpenAiImageClient::new(
            OpenAiImageClientConfig::new(base_url).with_api_key("sk-test"),
        )
        .unwrap();
        let payload = client
            .generate(ImageRequest::new("Main character: Buddy"))
            .await
            .unwrap();
        let image = GeneratedImage::from_payload(payload).unwrap();
        assert_eq!(image.pixels().get_pixel(0, 0).0, [200, 10, 10]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("Bearer sk-test"));
        assert_eq!(seen[0].1["model"], "gpt-image-1");
        assert_eq!(seen[0].1["size"], "1024x1024");
        assert_eq!(seen[0].1["prompt"], "Main character: Buddy");
        assert!(seen[0].1.get("response_format").is_none());
    }

    #[tokio::test]
    async fn test_generate_surfaces_backend_error_message() {
        let router = Router::new().route(
            "/v1/images/generations",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": { "message": "Incorrect API key provided" } })),
                )
            }),
        );
        let base_url = spawn_stub(router).await;

        let client =
            OpenAiImageClient::new(OpenAiImageClientConfig::new(base_url).with_api_key("sk-bad"))
                .unwrap();
        let err = client.generate(ImageRequest::new("x")).await.unwrap_err();
        match err {
            GenerationError::Auth(message) => {
                assert!(message.contains("Incorrect API key provided"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_data() {
        let router = Router::new().route(
            "/v1/images/generations",
            post(|| async { Json(json!({ "created": 1, "data": [] })) }),
        );
        let base_url = spawn_stub(router).await;

        let client =
            OpenAiImageClient::new(OpenAiImageClientConfig::new(base_url).with_api_key("sk"))
                .unwrap();
        let err = client.generate(ImageRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
    }
}
