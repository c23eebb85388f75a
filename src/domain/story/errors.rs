//! Story Context - Errors

use thiserror::Error;

/// 故事输入相关的错误
///
/// 这些都是用户可修正的输入问题，在任何后端调用之前检测
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoryError {
    #[error("Please enter a story.")]
    EmptyStory,

    #[error("No scenes detected. Add blank lines between paragraphs.")]
    NoScenesDetected,

    #[error("Unknown art style: {0}")]
    UnknownStyle(String),

    #[error("Creativity must be between 1.0 and 12.0, got {0}")]
    CreativityOutOfRange(f32),
}
