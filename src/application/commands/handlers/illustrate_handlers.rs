//! Illustrate Command Handler
//!
//! 编排循环：校验前置条件，然后逐个场景组装提示词、调用后端、归一化图像。
//! 场景严格按顺序处理，同一时刻只有一个后端请求。

use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{FailurePolicy, GenerationRequest, IllustrateStory};
use crate::application::error::{ApplicationError, BackendOption, UnsupportedBackendOption};
use crate::application::ports::{
    BackendCapabilities, GeneratedImage, GenerationError, ImageGeneratorPort, ImageRequest,
};
use crate::domain::{plan_scenes, CharacterConfig, PromptComposer, Scene, StyleConfig};

// ============================================================================
// Run types
// ============================================================================

/// 单个场景的处理结果
#[derive(Debug, Clone)]
pub struct SceneOutcome {
    /// 从 1 开始的场景序号
    pub index: usize,
    pub scene: Scene,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub result: Result<GeneratedImage, GenerationError>,
}

impl SceneOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// 失败时给用户看的错误信息（带场景序号）
    pub fn error_message(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|e| ApplicationError::generation(self.index, e.clone()).to_string())
    }
}

/// 一次运行的元信息
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub backend: &'static str,
    pub capabilities: BackendCapabilities,
    pub total_scenes: usize,
    pub failure_policy: FailurePolicy,
    pub notices: Vec<UnsupportedBackendOption>,
}

/// 一次生成运行
///
/// `outcomes` 是惰性的：只有被轮询时才会调用后端。
/// 流是有限的、不可重启的，重新生成需要再次调用 handler。
pub struct GenerationRun {
    pub info: RunInfo,
    pub outcomes: BoxStream<'static, SceneOutcome>,
}

impl std::fmt::Debug for GenerationRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRun")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// 运行汇总（展示层消费完流之后生成）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rendered: usize,
    pub failed: usize,
    /// 因失败而提前停止时，停在哪个场景
    pub halted_at: Option<usize>,
}

impl RunSummary {
    /// 记录一个场景结果
    pub fn record(&mut self, outcome: &SceneOutcome, policy: FailurePolicy) {
        if outcome.is_success() {
            self.rendered += 1;
        } else {
            self.failed += 1;
            if policy == FailurePolicy::FailFast {
                self.halted_at = Some(outcome.index);
            }
        }
    }
}

// ============================================================================
// Handler
// ============================================================================

/// IllustrateStory Handler
pub struct IllustrateStoryHandler {
    generator: Arc<dyn ImageGeneratorPort>,
}

impl IllustrateStoryHandler {
    pub fn new(generator: Arc<dyn ImageGeneratorPort>) -> Self {
        Self { generator }
    }

    /// 校验前置条件并返回惰性的场景结果流
    ///
    /// 前置条件按顺序检查（失败时不发起任何后端调用）：
    /// 1. 故事非空
    /// 2. 至少分出一个场景
    /// 3. 后端凭据存在
    pub fn handle(&self, command: IllustrateStory) -> Result<GenerationRun, ApplicationError> {
        let request = command.request;
        let scenes = plan_scenes(&request.story, request.max_scenes)?;
        self.generator.check_credentials()?;

        let backend = self.generator.backend_name();
        let capabilities = self.generator.capabilities();
        let notices = unsupported_options(&request, capabilities, backend);
        let run_id = Uuid::new_v4();

        for notice in &notices {
            tracing::warn!(run_id = %run_id, backend = backend, "{}", notice);
        }
        tracing::info!(
            run_id = %run_id,
            backend = backend,
            total_scenes = scenes.len(),
            strict_mode = request.character.strict_mode,
            style = %request.style.style,
            failure_policy = request.failure_policy.as_str(),
            "Generation run started"
        );

        let info = RunInfo {
            run_id,
            started_at: Utc::now(),
            backend,
            capabilities,
            total_scenes: scenes.len(),
            failure_policy: request.failure_policy,
            notices,
        };

        let state = LoopState {
            run_id,
            generator: self.generator.clone(),
            capabilities,
            character: request.character,
            style: request.style,
            image_size: request.image_size,
            policy: request.failure_policy,
            scenes: scenes.into_iter().enumerate(),
            halted: false,
        };

        let outcomes = stream::unfold(state, |mut state| async move {
            if state.halted {
                return None;
            }
            let (offset, scene) = state.scenes.next()?;
            let outcome = state.render_scene(offset + 1, scene).await;
            if !outcome.is_success() && state.policy == FailurePolicy::FailFast {
                tracing::warn!(
                    run_id = %state.run_id,
                    scene_index = outcome.index,
                    "Halting run after failed scene"
                );
                state.halted = true;
            }
            Some((outcome, state))
        })
        .boxed();

        Ok(GenerationRun { info, outcomes })
    }
}

/// 编排循环在场景之间携带的只读状态
struct LoopState {
    run_id: Uuid,
    generator: Arc<dyn ImageGeneratorPort>,
    capabilities: BackendCapabilities,
    character: CharacterConfig,
    style: StyleConfig,
    image_size: String,
    policy: FailurePolicy,
    scenes: std::iter::Enumerate<std::vec::IntoIter<Scene>>,
    halted: bool,
}

impl LoopState {
    async fn render_scene(&self, index: usize, scene: Scene) -> SceneOutcome {
        let composer = PromptComposer::new(&self.character, &self.style);
        let prompt = composer.compose(&scene);
        let negative_prompt = self
            .capabilities
            .negative_prompt
            .then(|| composer.negative());

        let request = ImageRequest {
            prompt: prompt.clone(),
            negative_prompt: negative_prompt.clone(),
            size: self.image_size.clone(),
            guidance: self
                .capabilities
                .guidance
                .then(|| self.style.creativity.value()),
            seed: self.style.seed.filter(|_| self.capabilities.seed),
        };

        tracing::debug!(
            run_id = %self.run_id,
            scene_index = index,
            prompt_len = prompt.len(),
            "Generating scene image"
        );

        let result = match self.generator.generate(request).await {
            Ok(payload) => GeneratedImage::from_payload(payload),
            Err(e) => Err(e),
        };

        match &result {
            Ok(image) => tracing::info!(
                run_id = %self.run_id,
                scene_index = index,
                width = image.width(),
                height = image.height(),
                "Scene rendered"
            ),
            Err(e) => tracing::error!(
                run_id = %self.run_id,
                scene_index = index,
                error = %e,
                "Scene generation failed"
            ),
        }

        SceneOutcome {
            index,
            scene,
            prompt,
            negative_prompt,
            result,
        }
    }
}

/// 找出请求里后端不支持的参数
fn unsupported_options(
    request: &GenerationRequest,
    capabilities: BackendCapabilities,
    backend: &'static str,
) -> Vec<UnsupportedBackendOption> {
    let mut options = Vec::new();
    if request.style.seed.is_some() && !capabilities.seed {
        options.push(BackendOption::Seed);
    }
    if !request.style.creativity.is_default() && !capabilities.guidance {
        options.push(BackendOption::Creativity);
    }
    if request.character.strict_mode && !capabilities.negative_prompt {
        options.push(BackendOption::NegativePrompt);
    }
    options
        .into_iter()
        .map(|option| UnsupportedBackendOption { option, backend })
        .collect()
}
