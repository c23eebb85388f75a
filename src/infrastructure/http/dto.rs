//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::application::{
    ApplicationError, BackendCapabilities, FailurePolicy, GenerationRequest, PreviewScenes,
    RunSummary, SceneOutcome, ScenePromptPreview,
};
use crate::config::GenerationConfig;
use crate::domain::{ArtStyle, CharacterConfig, Creativity, StyleConfig};
use crate::infrastructure::events::{encode_outcome, scene_header};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Story Request
// ============================================================================

/// 故事请求（预览、生成、WebSocket 共用）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryRequest {
    #[serde(default)]
    pub story: String,
    /// 未指定时使用 generation.default_max_scenes
    #[serde(default)]
    pub max_scenes: Option<usize>,
    /// 未指定时使用默认主角
    #[serde(default)]
    pub character: Option<CharacterConfig>,
    /// 风格标签，如 "watercolor"、"digital painting"
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub creativity: Option<f32>,
    #[serde(default)]
    pub seed: Option<u64>,
    /// 未指定时使用 generation.failure_policy
    #[serde(default)]
    pub failure_policy: Option<FailurePolicy>,
}

impl StoryRequest {
    fn style_config(&self) -> Result<StyleConfig, ApplicationError> {
        let style = match &self.style {
            Some(label) => ArtStyle::from_str(label)?,
            None => ArtStyle::default(),
        };
        let mut config = StyleConfig::new(style);
        if let Some(creativity) = self.creativity {
            config = config.with_creativity(Creativity::clamped(creativity));
        }
        config.seed = self.seed;
        Ok(config)
    }

    /// 校验一次，转换为不可变的生成请求
    pub fn into_generation_request(
        self,
        generation: &GenerationConfig,
    ) -> Result<GenerationRequest, ApplicationError> {
        let style = self.style_config()?;
        let max_scenes = generation.clamp_max_scenes(self.max_scenes);
        let policy = self.failure_policy.unwrap_or(generation.failure_policy);

        Ok(GenerationRequest::new(
            self.story,
            max_scenes,
            self.character.unwrap_or_default(),
            style,
        )
        .with_failure_policy(policy)
        .with_image_size(generation.image_size.clone()))
    }

    pub fn into_preview_query(
        self,
        generation: &GenerationConfig,
    ) -> Result<PreviewScenes, ApplicationError> {
        let style = self.style_config()?;
        Ok(PreviewScenes {
            max_scenes: generation.clamp_max_scenes(self.max_scenes),
            story: self.story,
            character: self.character.unwrap_or_default(),
            style,
        })
    }
}

// ============================================================================
// Styles
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RangeResponse<T: Serialize> {
    pub min: T,
    pub max: T,
    pub default: T,
}

/// 前端表单需要的选项
#[derive(Debug, Serialize)]
pub struct StylesResponse {
    pub styles: Vec<&'static str>,
    pub default_style: &'static str,
    pub creativity: RangeResponse<f32>,
    pub max_scenes: RangeResponse<usize>,
    pub default_character: CharacterConfig,
    pub failure_policy: FailurePolicy,
    pub backend: &'static str,
    pub capabilities: BackendCapabilities,
}

// ============================================================================
// Scenes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ScenePreviewResponse {
    pub index: usize,
    pub header: String,
    pub scene: String,
    pub prompt: String,
    pub negative_prompt: String,
}

impl From<ScenePromptPreview> for ScenePreviewResponse {
    fn from(preview: ScenePromptPreview) -> Self {
        Self {
            header: scene_header(preview.index),
            index: preview.index,
            scene: preview.scene,
            prompt: preview.prompt,
            negative_prompt: preview.negative_prompt,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScenesResponse {
    pub total: usize,
    pub scenes: Vec<ScenePreviewResponse>,
}

// ============================================================================
// Illustrate
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    Rendered,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct SceneResultResponse {
    pub index: usize,
    pub header: String,
    pub scene: String,
    pub prompt: String,
    pub status: SceneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SceneOutcome> for SceneResultResponse {
    fn from(outcome: SceneOutcome) -> Self {
        let mut response = Self {
            index: outcome.index,
            header: scene_header(outcome.index),
            scene: outcome.scene.to_string(),
            prompt: outcome.prompt.clone(),
            status: SceneStatus::Failed,
            width: None,
            height: None,
            png_base64: None,
            error: None,
        };

        match encode_outcome(&outcome) {
            Ok(png) => {
                response.status = SceneStatus::Rendered;
                response.width = Some(png.width);
                response.height = Some(png.height);
                response.png_base64 = Some(png.base64);
            }
            Err(error) => response.error = Some(error),
        }
        response
    }
}

#[derive(Debug, Serialize)]
pub struct RunSummaryResponse {
    pub rendered: usize,
    pub failed: usize,
    pub halted_at: Option<usize>,
}

impl From<&RunSummary> for RunSummaryResponse {
    fn from(summary: &RunSummary) -> Self {
        Self {
            rendered: summary.rendered,
            failed: summary.failed,
            halted_at: summary.halted_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IllustrateResponse {
    pub run_id: Uuid,
    pub backend: &'static str,
    pub failure_policy: FailurePolicy,
    pub notices: Vec<String>,
    pub scenes: Vec<SceneResultResponse>,
    pub summary: RunSummaryResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoryError;

    fn parse(json: &str) -> StoryRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_minimal_request_uses_config_defaults() {
        let generation = GenerationConfig::default();
        let request = parse(r#"{"story": "A.\n\nB."}"#)
            .into_generation_request(&generation)
            .unwrap();

        assert_eq!(request.max_scenes, 3);
        assert_eq!(request.character, CharacterConfig::default());
        assert_eq!(request.style, StyleConfig::default());
        assert_eq!(request.failure_policy, FailurePolicy::FailFast);
        assert_eq!(request.image_size, "1024x1024");
    }

    #[test]
    fn test_request_values_are_clamped() {
        let generation = GenerationConfig::default();
        let request = parse(
            r#"{"story": "A", "max_scenes": 50, "creativity": 40.0, "style": "digital_painting",
                "seed": 7, "failure_policy": "skip_and_continue"}"#,
        )
        .into_generation_request(&generation)
        .unwrap();

        assert_eq!(request.max_scenes, 6);
        assert_eq!(request.style.creativity.value(), Creativity::MAX);
        assert_eq!(request.style.style, ArtStyle::DigitalPainting);
        assert_eq!(request.style.seed, Some(7));
        assert_eq!(request.failure_policy, FailurePolicy::SkipAndContinue);
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        let err = parse(r#"{"story": "A", "style": "cubism"}"#)
            .into_generation_request(&GenerationConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Story(StoryError::UnknownStyle(_))
        ));
    }

    #[test]
    fn test_character_block_is_deserialized() {
        let query = parse(
            r#"{"story": "A", "max_scenes": 0,
                "character": {"main_name": "Mia", "main_description": "a girl in a yellow raincoat"}}"#,
        )
        .into_preview_query(&GenerationConfig::default())
        .unwrap();

        assert_eq!(query.max_scenes, 1);
        assert_eq!(query.character.main_name, "Mia");
        assert!(query.character.strict_mode);
        assert!(query.character.allowed_others.is_empty());
    }
}
