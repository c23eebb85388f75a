//! Inference Endpoint Client - 调用原始推理 HTTP 端点
//!
//! 外部 API:
//! POST {endpoint_url}
//! Headers: Authorization: Bearer {HF_TOKEN}
//! Request: {"inputs": "...", "parameters": {...}}  (JSON)
//! Response: 图像字节（image/png 或 image/jpeg）
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

/// 推理端点客户端配置
#[derive(Clone)]
pub struct InferenceEndpointClientConfig {
    /// 完整的端点 URL
    pub endpoint_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// Bearer Token
    pub token: Option<String>,
}

impl std::fmt::Debug for InferenceEndpointClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEndpointClientConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl InferenceEndpointClientConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            timeout_secs: 180,
            token: None,
        }
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

/// 推理端点客户端
pub struct InferenceEndpointClient {
    client: Client,
    config: InferenceEndpointClientConfig,
}

impl InferenceEndpointClient {
    pub fn new(config: InferenceEndpointClientConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ImageGeneratorPort for InferenceEndpointClient {
    fn backend_name(&self) -> &'static str {
        "inference_endpoint"
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
            url = %self.config.endpoint_url,
            prompt_len = request.prompt.len(),
            seed = ?request.seed,
            guidance = ?request.guidance,
            "Sending inference endpoint request"
        );

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .bearer_auth(token)
            .header(header::ACCEPT, "image/png")
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

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        // 部分端点在 200 下仍返回 JSON 错误
        if content_type.starts_with("application/json") {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::InvalidResponse(format!(
                "expected image bytes, got JSON: {}",
                error_message(body)
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Network(format!("Failed to read body: {}", e)))?;

        tracing::info!(
            bytes = bytes.len(),
            content_type = %content_type,
            "Inference endpoint returned image"
        );

        Ok(ImagePayload::Bytes(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::GeneratedImage;
    use crate::infrastructure::adapters::image::test_support::{png_bytes, spawn_stub};
    use axum::{
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_token_required() {
        let client =
            InferenceEndpointClient::new(InferenceEndpointClientConfig::new("http://x")).unwrap();
        assert_eq!(client.check_credentials().unwrap_err().variable, HF_TOKEN);
        assert_eq!(client.capabilities(), BackendCapabilities::full());

        let config = InferenceEndpointClientConfig::new("http://x").with_token("hf_secret");
        assert!(!format!("{:?}", config).contains("hf_secret"));
    }

    #[tokio::test]
    async fn test_generate_sends_parameters_and_returns_bytes() {
        let seen: Arc<Mutex<Vec<(Option<String>, Value)>>> = Arc::default();
        let recorder = seen.clone();
        let router = Router::new().route(
            "/run",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((auth, body));
                    ([(header::CONTENT_TYPE, "image/png")], png_bytes([0, 128, 255]))
                }
            }),
        );
        let base_url = spawn_stub(router).await;

        let client = InferenceEndpointClient::new(
            InferenceEndpointClientConfig::new(format!("{}/run", base_url)).with_token("hf_abc"),
        )
        .unwrap();
        let mut request = ImageRequest::new("Scene: a kite");
        request.negative_prompt = Some("crowd, watermark".into());
        request.seed = Some(42);
        request.guidance = Some(9.0);
        request.size = "512x512".into();

        let payload = client.generate(request).await.unwrap();
        assert!(matches!(payload, ImagePayload::Bytes(_)));
        let image = GeneratedImage::from_payload(payload).unwrap();
        assert_eq!(image.pixels().get_pixel(0, 0).0, [0, 128, 255]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0.as_deref(), Some("Bearer hf_abc"));
        let params = &seen[0].1["parameters"];
        assert_eq!(seen[0].1["inputs"], "Scene: a kite");
        assert_eq!(params["negative_prompt"], "crowd, watermark");
        assert_eq!(params["seed"], 42);
        assert_eq!(params["guidance_scale"], 9.0);
        assert_eq!(params["width"], 512);
        assert_eq!(params["height"], 512);
    }

    #[tokio::test]
    async fn test_json_body_on_success_is_invalid_response() {
        let router = Router::new().route(
            "/run",
            post(|| async { Json(json!({ "error": "Model is loading" })) }),
        );
        let base_url = spawn_stub(router).await;

        let client = InferenceEndpointClient::new(
            InferenceEndpointClientConfig::new(format!("{}/run", base_url)).with_token("hf"),
        )
        .unwrap();
        let err = client.generate(ImageRequest::new("x")).await.unwrap_err();
        match err {
            GenerationError::InvalidResponse(message) => {
                assert!(message.contains("Model is loading"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_service_error_is_classified() {
        let router = Router::new().route(
            "/run",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "overloaded" })),
                )
                    .into_response()
            }),
        );
        let base_url = spawn_stub(router).await;

        let client = InferenceEndpointClient::new(
            InferenceEndpointClientConfig::new(format!("{}/run", base_url)).with_token("hf"),
        )
        .unwrap();
        let err = client.generate(ImageRequest::new("x")).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Service { status: 503, ref message } if message == "overloaded"
        ));
    }
}
