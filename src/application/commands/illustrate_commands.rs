//! Illustrate Commands

use serde::{Deserialize, Serialize};

use crate::application::ports::DEFAULT_IMAGE_SIZE;
use crate::domain::{CharacterConfig, StyleConfig};

/// 单个场景失败后的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 遇到第一个失败场景即停止
    #[default]
    FailFast,
    /// 报告失败场景并继续下一个
    SkipAndContinue,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "fail_fast",
            FailurePolicy::SkipAndContinue => "skip_and_continue",
        }
    }
}

/// 生成请求
///
/// 由校验后的用户输入一次性构造，按值传入编排循环，之后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub story: String,
    pub max_scenes: usize,
    pub character: CharacterConfig,
    pub style: StyleConfig,
    pub failure_policy: FailurePolicy,
    /// 出图尺寸，如 "1024x1024"
    pub image_size: String,
}

impl GenerationRequest {
    pub fn new(
        story: impl Into<String>,
        max_scenes: usize,
        character: CharacterConfig,
        style: StyleConfig,
    ) -> Self {
        Self {
            story: story.into(),
            max_scenes,
            character,
            style,
            failure_policy: FailurePolicy::default(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_image_size(mut self, size: impl Into<String>) -> Self {
        self.image_size = size.into();
        self
    }
}

/// 生成插画命令
#[derive(Debug, Clone)]
pub struct IllustrateStory {
    pub request: GenerationRequest,
}
