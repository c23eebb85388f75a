//! Image Adapter - 图像后端客户端实现
//!
//! 启动时按 `backend.kind` 选择一个后端

mod fake_image_client;
mod hosted_inference_client;
mod inference_endpoint_client;
mod inference_payload;
mod openai_image_client;

pub use fake_image_client::{prompt_color, FakeImageClient, FakeImageClientConfig};
pub use hosted_inference_client::{HostedInferenceClient, HostedInferenceClientConfig};
pub use inference_endpoint_client::{InferenceEndpointClient, InferenceEndpointClientConfig};
pub use openai_image_client::{OpenAiImageClient, OpenAiImageClientConfig};

use std::sync::Arc;
use thiserror::Error;

use crate::application::ports::{GenerationError, ImageGeneratorPort};
use crate::config::{BackendConfig, BackendKind, BackendSecrets};

/// 后端构建错误
#[derive(Debug, Error)]
pub enum BackendBuildError {
    #[error("backend.endpoint_url (or HF_INFERENCE_URL) is required for inference_endpoint")]
    MissingEndpoint,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] GenerationError),
}

/// 按配置构建图像后端
///
/// 凭据缺失不在这里报错，每次运行前由 `check_credentials` 报告
pub fn build_image_generator(
    config: &BackendConfig,
    secrets: &BackendSecrets,
) -> Result<Arc<dyn ImageGeneratorPort>, BackendBuildError> {
    let generator: Arc<dyn ImageGeneratorPort> = match config.kind {
        BackendKind::Openai => {
            let mut client_config = OpenAiImageClientConfig::new(config.base_url())
                .with_model(config.model())
                .with_timeout(config.timeout_secs);
            client_config.api_key = secrets.openai_api_key.clone();
            Arc::new(OpenAiImageClient::new(client_config)?)
        }
        BackendKind::InferenceEndpoint => {
            let endpoint_url = config
                .endpoint_url
                .clone()
                .filter(|url| !url.trim().is_empty())
                .ok_or(BackendBuildError::MissingEndpoint)?;
            let mut client_config =
                InferenceEndpointClientConfig::new(endpoint_url).with_timeout(config.timeout_secs);
            client_config.token = secrets.hf_token.clone();
            Arc::new(InferenceEndpointClient::new(client_config)?)
        }
        BackendKind::HostedInference => {
            let mut client_config = HostedInferenceClientConfig::new(config.base_url())
                .with_model(config.model())
                .with_timeout(config.timeout_secs);
            client_config.token = secrets.hf_token.clone();
            Arc::new(HostedInferenceClient::new(client_config)?)
        }
        BackendKind::Fake => Arc::new(FakeImageClient::with_defaults()),
    };

    tracing::info!(
        backend = generator.backend_name(),
        model = %config.model(),
        "Image backend ready"
    );

    Ok(generator)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// 在本机随机端口启动一个桩服务，返回其 base URL
    pub async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
        let image = RgbImage::from_pixel(8, 8, Rgb(color));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    pub fn png_base64(color: [u8; 3]) -> String {
        BASE64.encode(png_bytes(color))
    }
}
