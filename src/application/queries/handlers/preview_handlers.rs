//! Preview Query Handlers

use crate::application::error::ApplicationError;
use crate::application::queries::PreviewScenes;
use crate::domain::{plan_scenes, PromptComposer};

/// 单个场景的提示词预览
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenePromptPreview {
    /// 从 1 开始的场景序号
    pub index: usize,
    pub scene: String,
    pub prompt: String,
    pub negative_prompt: String,
}

/// PreviewScenes Handler
///
/// 纯计算，没有外部依赖
#[derive(Debug, Default, Clone, Copy)]
pub struct PreviewScenesHandler;

impl PreviewScenesHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, query: PreviewScenes) -> Result<Vec<ScenePromptPreview>, ApplicationError> {
        let scenes = plan_scenes(&query.story, query.max_scenes)?;
        let composer = PromptComposer::new(&query.character, &query.style);
        let negative_prompt = composer.negative();

        Ok(scenes
            .into_iter()
            .enumerate()
            .map(|(offset, scene)| ScenePromptPreview {
                index: offset + 1,
                prompt: composer.compose(&scene),
                negative_prompt: negative_prompt.clone(),
                scene: scene.into_inner(),
            })
            .collect())
    }
}
