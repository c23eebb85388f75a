//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use serde::Serialize;
use thiserror::Error;

use crate::application::ports::{GenerationError, MissingCredentials};
use crate::domain::StoryError;

/// 应用层错误
#[derive(Debug, Clone, Error)]
pub enum ApplicationError {
    /// 故事输入问题（空故事、无场景等）
    #[error(transparent)]
    Story(#[from] StoryError),

    /// 后端凭据缺失
    #[error(transparent)]
    MissingCredentials(#[from] MissingCredentials),

    /// 某个场景出图失败
    #[error("Scene {scene_index}: error generating image: {source}")]
    Generation {
        scene_index: usize,
        #[source]
        source: GenerationError,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// 创建场景出图错误
    pub fn generation(scene_index: usize, source: GenerationError) -> Self {
        Self::Generation {
            scene_index,
            source,
        }
    }

    /// 是否为运行前的前置条件错误（此时没有发起任何后端调用）
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Story(StoryError::EmptyStory | StoryError::NoScenesDetected)
                | Self::MissingCredentials(_)
        )
    }
}

/// 后端不支持的可选参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendOption {
    Seed,
    Creativity,
    NegativePrompt,
}

impl BackendOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendOption::Seed => "seed",
            BackendOption::Creativity => "creativity",
            BackendOption::NegativePrompt => "negative prompt",
        }
    }
}

/// 后端拒绝某个参数时的提示
///
/// 不会中断运行：该参数从请求中移除，并告知用户
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("The {backend} backend does not support the {} option; it will be ignored.", .option.as_str())]
pub struct UnsupportedBackendOption {
    pub option: BackendOption,
    pub backend: &'static str,
}
