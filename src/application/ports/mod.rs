//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod image_generator;

pub use image_generator::{
    BackendCapabilities, GeneratedImage, GenerationError, ImageGeneratorPort, ImagePayload,
    ImageRequest, MissingCredentials, DEFAULT_IMAGE_SIZE,
};
