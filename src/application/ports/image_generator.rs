//! Image Generator Port - 图像生成后端抽象
//!
//! 定义图像生成的抽象接口，具体实现在 infrastructure/adapters 层
//!
//! 三种后端返回的负载形态不同（base64 JSON、原始字节、已解码图像），
//! 统一由 [`GeneratedImage::from_payload`] 归一化为 RGB 图像。

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// 默认出图尺寸
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// 图像生成错误
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),
}

impl GenerationError {
    /// 根据 HTTP 状态码归类错误
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth(format!("HTTP {}: {}", status, message)),
            _ => Self::Service { status, message },
        }
    }

    /// 归类 reqwest 发送阶段的错误
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Network(format!("Cannot connect to image backend: {}", err))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// 凭据缺失
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{variable} is missing. Put it in .env like: {variable}=...")]
pub struct MissingCredentials {
    /// 缺失的环境变量名
    pub variable: &'static str,
}

/// 后端支持的可选参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct BackendCapabilities {
    pub negative_prompt: bool,
    pub seed: bool,
    pub guidance: bool,
}

impl BackendCapabilities {
    /// 全部支持
    pub fn full() -> Self {
        Self {
            negative_prompt: true,
            seed: true,
            guidance: true,
        }
    }
}

/// 单次出图请求
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    /// 形如 "1024x1024"
    pub size: String,
    pub guidance: Option<f32>,
    pub seed: Option<u64>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            size: DEFAULT_IMAGE_SIZE.to_string(),
            guidance: None,
            seed: None,
        }
    }

    /// 解析 size 为 (宽, 高)，格式不对时回退为 1024x1024
    pub fn dimensions(&self) -> (u32, u32) {
        self.size
            .split_once('x')
            .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)))
            .unwrap_or((1024, 1024))
    }
}

/// 后端返回的原始负载
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// base64 编码的图像（JSON 响应）
    Base64(String),
    /// 原始图像字节（HTTP 响应体）
    Bytes(Vec<u8>),
    /// 后端客户端已解码的图像
    Decoded(DynamicImage),
}

/// 归一化后的图像：RGB8 像素缓冲，只存在于内存中
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pixels: RgbImage,
}

impl GeneratedImage {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// 把任意负载转换为 RGB 图像
    pub fn from_payload(payload: ImagePayload) -> Result<Self, GenerationError> {
        let decoded = match payload {
            ImagePayload::Base64(b64) => {
                let bytes = BASE64
                    .decode(b64.trim())
                    .map_err(|e| GenerationError::Decode(format!("invalid base64: {}", e)))?;
                decode_bytes(&bytes)?
            }
            ImagePayload::Bytes(bytes) => decode_bytes(&bytes)?,
            ImagePayload::Decoded(image) => image,
        };
        Ok(Self::new(decoded.into_rgb8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// 编码为 PNG（仅用于展示）
    pub fn to_png(&self) -> Result<Vec<u8>, GenerationError> {
        let mut buffer = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| GenerationError::Decode(format!("PNG encoding failed: {}", e)))?;
        Ok(buffer.into_inner())
    }

    /// 编码为 base64 PNG
    pub fn to_png_base64(&self) -> Result<String, GenerationError> {
        Ok(BASE64.encode(self.to_png()?))
    }
}

fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, GenerationError> {
    if bytes.is_empty() {
        return Err(GenerationError::Decode("empty image body".to_string()));
    }
    image::load_from_memory(bytes).map_err(|e| GenerationError::Decode(e.to_string()))
}

/// Image Generator Port
///
/// 外部图像生成服务的抽象接口
#[async_trait]
pub trait ImageGeneratorPort: Send + Sync {
    /// 后端名称（用于日志和展示）
    fn backend_name(&self) -> &'static str;

    /// 支持的可选参数
    fn capabilities(&self) -> BackendCapabilities;

    /// 检查凭据是否存在（不发起网络请求）
    fn check_credentials(&self) -> Result<(), MissingCredentials>;

    /// 根据提示词生成一张图像
    async fn generate(&self, request: ImageRequest) -> Result<ImagePayload, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn png_bytes(color: [u8; 3]) -> Vec<u8> {
        let image = RgbImage::from_pixel(4, 3, Rgb(color));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_from_bytes_payload() {
        let image = GeneratedImage::from_payload(ImagePayload::Bytes(png_bytes([9, 8, 7]))).unwrap();
        assert_eq!((image.width(), image.height()), (4, 3));
        assert_eq!(image.pixels().get_pixel(0, 0), &Rgb([9, 8, 7]));
    }

    #[test]
    fn test_from_base64_payload() {
        let b64 = BASE64.encode(png_bytes([1, 2, 3]));
        let image = GeneratedImage::from_payload(ImagePayload::Base64(b64)).unwrap();
        assert_eq!(image.pixels().get_pixel(3, 2), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_decoded_rgba_is_normalized_to_rgb() {
        let rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 128]));
        let image =
            GeneratedImage::from_payload(ImagePayload::Decoded(DynamicImage::ImageRgba8(rgba)))
                .unwrap();
        assert_eq!(image.pixels().get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_bad_payloads_are_decode_errors() {
        let err = GeneratedImage::from_payload(ImagePayload::Base64("%%%".into())).unwrap_err();
        assert!(matches!(err, GenerationError::Decode(_)));

        let err = GeneratedImage::from_payload(ImagePayload::Bytes(b"not an image".to_vec()))
            .unwrap_err();
        assert!(matches!(err, GenerationError::Decode(_)));

        let err = GeneratedImage::from_payload(ImagePayload::Bytes(Vec::new())).unwrap_err();
        assert!(matches!(err, GenerationError::Decode(_)));
    }

    #[test]
    fn test_png_round_trip_for_display() {
        let image = GeneratedImage::new(RgbImage::from_pixel(2, 2, Rgb([5, 5, 5])));
        let again = GeneratedImage::from_payload(ImagePayload::Bytes(image.to_png().unwrap()))
            .unwrap();
        assert_eq!(image, again);
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(GenerationError::from_status(401, "nope"), GenerationError::Auth(_)));
        assert!(matches!(
            GenerationError::from_status(500, "boom"),
            GenerationError::Service { status: 500, .. }
        ));
    }

    #[test]
    fn test_request_dimensions() {
        let mut request = ImageRequest::new("x");
        assert_eq!(request.dimensions(), (1024, 1024));
        request.size = "512x768".into();
        assert_eq!(request.dimensions(), (512, 768));
        request.size = "large".into();
        assert_eq!(request.dimensions(), (1024, 1024));
    }

    #[test]
    fn test_missing_credentials_message() {
        let err = MissingCredentials {
            variable: "OPENAI_API_KEY",
        };
        assert!(err.to_string().starts_with("OPENAI_API_KEY is missing"));
    }
}
