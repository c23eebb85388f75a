//! Story HTTP Handlers

use axum::{extract::State, Json};
use futures_util::StreamExt;
use std::sync::Arc;

use crate::application::{GenerationRun, IllustrateStory, RunSummary, SceneOutcome};
use crate::domain::{ArtStyle, CharacterConfig, Creativity};
use crate::infrastructure::http::dto::{
    ApiResponse, IllustrateResponse, RangeResponse, ScenesResponse, StoryRequest, StylesResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 前端表单选项
pub async fn list_styles(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StylesResponse>> {
    let generation = &state.generation;
    Json(ApiResponse::success(StylesResponse {
        styles: ArtStyle::ALL.iter().map(ArtStyle::as_str).collect(),
        default_style: ArtStyle::default().as_str(),
        creativity: RangeResponse {
            min: Creativity::MIN,
            max: Creativity::MAX,
            default: Creativity::DEFAULT,
        },
        max_scenes: RangeResponse {
            min: 1,
            max: generation.max_scenes_limit,
            default: generation.default_max_scenes,
        },
        default_character: CharacterConfig::default(),
        failure_policy: generation.failure_policy,
        backend: state.generator.backend_name(),
        capabilities: state.generator.capabilities(),
    }))
}

/// 预览场景与提示词（不调用后端）
pub async fn preview_scenes(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StoryRequest>,
) -> Result<Json<ApiResponse<ScenesResponse>>, ApiError> {
    let query = body.into_preview_query(&state.generation)?;
    let previews = state.preview_handler.handle(query)?;

    Ok(Json(ApiResponse::success(ScenesResponse {
        total: previews.len(),
        scenes: previews.into_iter().map(Into::into).collect(),
    })))
}

/// 生成全部场景后一次性返回
///
/// 单个场景失败不是请求错误：失败信息放在对应场景里，errno 仍为 0
pub async fn illustrate_story(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StoryRequest>,
) -> Result<Json<ApiResponse<IllustrateResponse>>, ApiError> {
    let request = body.into_generation_request(&state.generation)?;
    let GenerationRun { info, outcomes } =
        state.illustrate_handler.handle(IllustrateStory { request })?;

    let outcomes: Vec<SceneOutcome> = outcomes.collect().await;

    let mut summary = RunSummary::default();
    for outcome in &outcomes {
        summary.record(outcome, info.failure_policy);
    }

    tracing::info!(
        run_id = %info.run_id,
        rendered = summary.rendered,
        failed = summary.failed,
        halted_at = ?summary.halted_at,
        "Generation run finished"
    );

    Ok(Json(ApiResponse::success(IllustrateResponse {
        run_id: info.run_id,
        backend: info.backend,
        failure_policy: info.failure_policy,
        notices: info.notices.iter().map(ToString::to_string).collect(),
        summary: (&summary).into(),
        scenes: outcomes.into_iter().map(Into::into).collect(),
    })))
}
