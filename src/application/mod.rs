//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ImageGenerator）
//! - commands: 插画生成命令及编排循环
//! - queries: 场景/提示词预览
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{GenerationRun, IllustrateStoryHandler, RunInfo, RunSummary, SceneOutcome},
    FailurePolicy, GenerationRequest, IllustrateStory,
};

pub use error::{ApplicationError, BackendOption, UnsupportedBackendOption};

pub use ports::{
    BackendCapabilities, GeneratedImage, GenerationError, ImageGeneratorPort, ImagePayload,
    ImageRequest, MissingCredentials, DEFAULT_IMAGE_SIZE,
};

pub use queries::{
    handlers::{PreviewScenesHandler, ScenePromptPreview},
    PreviewScenes,
};
