//! Fake Image Client - 离线图像后端
//!
//! 不调用任何外部服务，按提示词渲染一张纯色 PNG。
//! 用于本地演示和测试，可以配置在第 N 次调用时失败。

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::ports::{
    BackendCapabilities, GenerationError, ImageGeneratorPort, ImagePayload, ImageRequest,
    MissingCredentials,
};

/// Fake Image Client 配置
#[derive(Debug, Clone)]
pub struct FakeImageClientConfig {
    /// 输出边长上限（像素），避免演示时生成大图
    pub max_side: u32,
    /// 在第几次调用时失败（从 1 开始）
    pub fail_on_call: Option<usize>,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeImageClientConfig {
    fn default() -> Self {
        Self {
            max_side: 256,
            fail_on_call: None,
            latency_ms: 200,
        }
    }
}

impl FakeImageClientConfig {
    pub fn with_fail_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

/// Fake Image Client
///
/// 同一提示词总是得到同一颜色
pub struct FakeImageClient {
    config: FakeImageClientConfig,
    calls: AtomicUsize,
    requests: Mutex<Vec<ImageRequest>>,
}

impl FakeImageClient {
    pub fn new(config: FakeImageClientConfig) -> Self {
        tracing::info!(
            fail_on_call = ?config.fail_on_call,
            latency_ms = config.latency_ms,
            "FakeImageClient initialized"
        );
        Self {
            config,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeImageClientConfig::default())
    }

    /// 已处理的调用次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 收到的请求（按顺序）
    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn render(&self, request: &ImageRequest) -> Result<Vec<u8>, GenerationError> {
        let (width, height) = request.dimensions();
        let width = width.clamp(1, self.config.max_side);
        let height = height.clamp(1, self.config.max_side);

        let image = RgbImage::from_pixel(width, height, prompt_color(&request.prompt));
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

/// 由提示词字节得到颜色 (FNV-1a)
pub fn prompt_color(prompt: &str) -> Rgb<u8> {
    let hash = prompt
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
    let [r, g, b, ..] = hash.to_le_bytes();
    Rgb([r, g, b])
}

#[async_trait]
impl ImageGeneratorPort for FakeImageClient {
    fn backend_name(&self) -> &'static str {
        "fake"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::full()
    }

    fn check_credentials(&self) -> Result<(), MissingCredentials> {
        Ok(())
    }

    async fn generate(&self, request: ImageRequest) -> Result<ImagePayload, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        tracing::debug!(
            call,
            prompt_len = request.prompt.len(),
            "FakeImageClient: rendering solid colour image"
        );

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if self.config.fail_on_call == Some(call) {
            return Err(GenerationError::Service {
                status: 500,
                message: format!("fake backend failure on call {}", call),
            });
        }

        self.render(&request).map(ImagePayload::Bytes)
    }
}
