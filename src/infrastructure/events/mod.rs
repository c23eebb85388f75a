//! Illustration Events
//!
//! 生成过程中推送给 WebSocket 客户端的事件

use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::application::{
    ApplicationError, BackendCapabilities, FailurePolicy, GenerationRun, RunInfo, RunSummary,
    SceneOutcome, ScenePromptPreview,
};

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum IllustrationEvent {
    /// 前置条件通过，运行开始
    RunStarted {
        run_id: Uuid,
        backend: &'static str,
        capabilities: BackendCapabilities,
        total_scenes: usize,
        failure_policy: FailurePolicy,
        notices: Vec<String>,
    },
    /// 开始处理某个场景
    SceneStarted {
        run_id: Uuid,
        index: usize,
        header: String,
        scene: String,
        prompt: String,
    },
    /// 场景出图成功
    SceneRendered {
        run_id: Uuid,
        index: usize,
        width: u32,
        height: u32,
        png_base64: String,
    },
    /// 场景出图失败
    SceneFailed {
        run_id: Uuid,
        index: usize,
        error: String,
    },
    /// 运行结束
    RunFinished {
        run_id: Uuid,
        rendered: usize,
        failed: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        halted_at: Option<usize>,
    },
    /// 前置条件失败，没有调用后端
    RunRejected { error: String },
}

/// 场景标题
pub fn scene_header(index: usize) -> String {
    format!("Scene {}", index)
}

/// 用于展示的 PNG
#[derive(Debug, Clone)]
pub struct EncodedPng {
    pub width: u32,
    pub height: u32,
    pub base64: String,
}

/// 把场景结果编码为 PNG，失败时返回带场景序号的错误信息
pub fn encode_outcome(outcome: &SceneOutcome) -> Result<EncodedPng, String> {
    let image = outcome
        .result
        .as_ref()
        .map_err(|e| ApplicationError::generation(outcome.index, e.clone()).to_string())?;
    let base64 = image
        .to_png_base64()
        .map_err(|e| ApplicationError::generation(outcome.index, e).to_string())?;
    Ok(EncodedPng {
        width: image.width(),
        height: image.height(),
        base64,
    })
}

impl IllustrationEvent {
    pub fn run_started(info: &RunInfo) -> Self {
        Self::RunStarted {
            run_id: info.run_id,
            backend: info.backend,
            capabilities: info.capabilities,
            total_scenes: info.total_scenes,
            failure_policy: info.failure_policy,
            notices: info.notices.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn scene_started(run_id: Uuid, preview: &ScenePromptPreview) -> Self {
        Self::SceneStarted {
            run_id,
            index: preview.index,
            header: scene_header(preview.index),
            scene: preview.scene.clone(),
            prompt: preview.prompt.clone(),
        }
    }

    /// 把场景结果转换为事件，PNG 编码失败时视为场景失败
    pub fn from_outcome(run_id: Uuid, outcome: &SceneOutcome) -> Self {
        match encode_outcome(outcome) {
            Ok(png) => Self::SceneRendered {
                run_id,
                index: outcome.index,
                width: png.width,
                height: png.height,
                png_base64: png.base64,
            },
            Err(error) => Self::SceneFailed {
                run_id,
                index: outcome.index,
                error,
            },
        }
    }

    pub fn run_finished(run_id: Uuid, summary: &RunSummary) -> Self {
        Self::RunFinished {
            run_id,
            rendered: summary.rendered,
            failed: summary.failed,
            halted_at: summary.halted_at,
        }
    }

    pub fn rejected(error: &ApplicationError) -> Self {
        Self::RunRejected {
            error: error.to_string(),
        }
    }
}

/// 事件中继在两次轮询之间携带的状态
struct Relay {
    run_id: Uuid,
    policy: FailurePolicy,
    previews: std::vec::IntoIter<ScenePromptPreview>,
    outcomes: BoxStream<'static, SceneOutcome>,
    summary: RunSummary,
    awaiting_outcome: bool,
    finished: bool,
}

/// 把一次运行转换为事件流
///
/// 顺序：RunStarted，然后每个场景 SceneStarted 和 SceneRendered/SceneFailed，最后 RunFinished。
/// SceneStarted 在调用后端之前发出；丢弃事件流即取消剩余场景。
pub fn run_events(
    run: GenerationRun,
    previews: Vec<ScenePromptPreview>,
) -> BoxStream<'static, IllustrationEvent> {
    let GenerationRun { info, outcomes } = run;
    let started = IllustrationEvent::run_started(&info);

    let relay = Relay {
        run_id: info.run_id,
        policy: info.failure_policy,
        previews: previews.into_iter(),
        outcomes,
        summary: RunSummary::default(),
        awaiting_outcome: false,
        finished: false,
    };

    let events = stream::unfold(relay, |mut relay| async move {
        if relay.finished {
            return None;
        }

        if relay.awaiting_outcome {
            relay.awaiting_outcome = false;
            if let Some(outcome) = relay.outcomes.next().await {
                relay.summary.record(&outcome, relay.policy);
                let event = IllustrationEvent::from_outcome(relay.run_id, &outcome);
                return Some((event, relay));
            }
        }

        let next = if relay.summary.halted_at.is_none() {
            relay.previews.next()
        } else {
            None
        };

        match next {
            Some(preview) => {
                relay.awaiting_outcome = true;
                let event = IllustrationEvent::scene_started(relay.run_id, &preview);
                Some((event, relay))
            }
            None => {
                relay.finished = true;
                let event = IllustrationEvent::run_finished(relay.run_id, &relay.summary);
                Some((event, relay))
            }
        }
    });

    stream::once(async move { started }).chain(events).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{GeneratedImage, GenerationError};
    use crate::domain::{Scene, StoryError};
    use image::{Rgb, RgbImage};
    use serde_json::json;

    fn outcome(result: Result<GeneratedImage, GenerationError>) -> SceneOutcome {
        SceneOutcome {
            index: 2,
            scene: Scene::new("A happy end.").unwrap(),
            prompt: "Scene: A happy end.".to_string(),
            negative_prompt: None,
            result,
        }
    }

    #[test]
    fn test_rejected_event_shape() {
        let event = IllustrationEvent::rejected(&ApplicationError::Story(StoryError::EmptyStory));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "RunRejected", "data": { "error": "Please enter a story." } })
        );
    }

    #[test]
    fn test_failed_outcome_carries_scene_index() {
        let run_id = Uuid::new_v4();
        let event = IllustrationEvent::from_outcome(
            run_id,
            &outcome(Err(GenerationError::Service {
                status: 500,
                message: "backend exploded".into(),
            })),
        );
        match event {
            IllustrationEvent::SceneFailed { index, error, .. } => {
                assert_eq!(index, 2);
                assert_eq!(
                    error,
                    "Scene 2: error generating image: Service error (HTTP 500): backend exploded"
                );
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_rendered_outcome_is_png() {
        let image = GeneratedImage::new(RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])));
        let event = IllustrationEvent::from_outcome(Uuid::new_v4(), &outcome(Ok(image)));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "SceneRendered");
        assert_eq!(json["data"]["width"], 3);
        assert_eq!(json["data"]["height"], 2);
        assert!(json["data"]["png_base64"].as_str().unwrap().starts_with("iVBOR"));
    }

    #[test]
    fn test_run_finished_omits_halt_when_complete() {
        let json = serde_json::to_value(IllustrationEvent::run_finished(
            Uuid::nil(),
            &RunSummary {
                rendered: 2,
                failed: 0,
                halted_at: None,
            },
        ))
        .unwrap();
        assert_eq!(json["data"]["rendered"], 2);
        assert!(json["data"].get("halted_at").is_none());
    }

    mod relay {
        use super::*;
        use crate::application::{
            GenerationRequest, IllustrateStory, IllustrateStoryHandler, PreviewScenes,
            PreviewScenesHandler,
        };
        use crate::domain::{ArtStyle, CharacterConfig, StyleConfig};
        use crate::infrastructure::adapters::{FakeImageClient, FakeImageClientConfig};
        use std::sync::Arc;

        const THREE_SCENES: &str = "Buddy wakes up.\n\nBuddy finds a map.\n\nBuddy goes home.";

        async fn events_for(
            client: Arc<FakeImageClient>,
            policy: FailurePolicy,
        ) -> Vec<serde_json::Value> {
            let request = GenerationRequest::new(
                THREE_SCENES,
                3,
                CharacterConfig::default(),
                StyleConfig::new(ArtStyle::Sketch),
            )
            .with_failure_policy(policy);
            let previews = PreviewScenesHandler::new()
                .handle(PreviewScenes::from(&request))
                .unwrap();
            let run = IllustrateStoryHandler::new(client)
                .handle(IllustrateStory { request })
                .unwrap();

            run_events(run, previews)
                .map(|event| serde_json::to_value(event).unwrap())
                .collect()
                .await
        }

        fn names(events: &[serde_json::Value]) -> Vec<String> {
            events
                .iter()
                .map(|e| e["event"].as_str().unwrap().to_string())
                .collect()
        }

        #[tokio::test]
        async fn test_full_run_event_order() {
            let client = Arc::new(FakeImageClient::new(
                FakeImageClientConfig::default().with_latency_ms(0),
            ));
            let events = events_for(client.clone(), FailurePolicy::FailFast).await;

            assert_eq!(
                names(&events),
                vec![
                    "RunStarted",
                    "SceneStarted",
                    "SceneRendered",
                    "SceneStarted",
                    "SceneRendered",
                    "SceneStarted",
                    "SceneRendered",
                    "RunFinished",
                ]
            );
            assert_eq!(events[1]["data"]["header"], "Scene 1");
            assert!(events[3]["data"]["prompt"]
                .as_str()
                .unwrap()
                .ends_with("Scene: Buddy finds a map."));
            assert_eq!(events[7]["data"]["rendered"], 3);
            assert_eq!(client.call_count(), 3);
        }

        #[tokio::test]
        async fn test_fail_fast_stops_after_failed_scene() {
            let client = Arc::new(FakeImageClient::new(
                FakeImageClientConfig::default()
                    .with_latency_ms(0)
                    .with_fail_on_call(2),
            ));
            let events = events_for(client.clone(), FailurePolicy::FailFast).await;

            assert_eq!(
                names(&events),
                vec![
                    "RunStarted",
                    "SceneStarted",
                    "SceneRendered",
                    "SceneStarted",
                    "SceneFailed",
                    "RunFinished",
                ]
            );
            assert_eq!(events[5]["data"]["halted_at"], 2);
            assert_eq!(client.call_count(), 2);
        }

        #[tokio::test]
        async fn test_skip_and_continue_reports_and_moves_on() {
            let client = Arc::new(FakeImageClient::new(
                FakeImageClientConfig::default()
                    .with_latency_ms(0)
                    .with_fail_on_call(2),
            ));
            let events = events_for(client.clone(), FailurePolicy::SkipAndContinue).await;

            assert_eq!(events.len(), 8);
            assert_eq!(events[4]["event"], "SceneFailed");
            assert_eq!(events[6]["event"], "SceneRendered");
            assert_eq!(events[7]["data"]["rendered"], 2);
            assert_eq!(events[7]["data"]["failed"], 1);
            assert_eq!(client.call_count(), 3);
        }

        #[tokio::test]
        async fn test_dropping_stream_cancels_remaining_scenes() {
            let client = Arc::new(FakeImageClient::new(
                FakeImageClientConfig::default().with_latency_ms(0),
            ));
            let request = GenerationRequest::new(
                THREE_SCENES,
                3,
                CharacterConfig::default(),
                StyleConfig::default(),
            );
            let previews = PreviewScenesHandler::new()
                .handle(PreviewScenes::from(&request))
                .unwrap();
            let run = IllustrateStoryHandler::new(client.clone())
                .handle(IllustrateStory { request })
                .unwrap();

            let taken: Vec<_> = run_events(run, previews).take(3).collect().await;
            assert_eq!(taken.len(), 3);
            assert_eq!(client.call_count(), 1);
        }
    }
}
