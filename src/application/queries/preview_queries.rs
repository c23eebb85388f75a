//! Preview Queries

use crate::application::commands::GenerationRequest;
use crate::domain::{CharacterConfig, StyleConfig};

/// 预览场景与提示词（不调用后端）
#[derive(Debug, Clone)]
pub struct PreviewScenes {
    pub story: String,
    pub max_scenes: usize,
    pub character: CharacterConfig,
    pub style: StyleConfig,
}

impl From<&GenerationRequest> for PreviewScenes {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            story: request.story.clone(),
            max_scenes: request.max_scenes,
            character: request.character.clone(),
            style: request.style.clone(),
        }
    }
}
