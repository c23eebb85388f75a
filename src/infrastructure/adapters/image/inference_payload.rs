//! 推理服务共用的请求体与错误体
//!
//! Request: {"inputs": "...", "parameters": {"negative_prompt": "...", "guidance_scale": 7.5, "seed": 42, "width": 1024, "height": 1024}}

use serde::{Deserialize, Serialize};

use crate::application::ports::ImageRequest;

#[derive(Debug, Serialize)]
pub(super) struct InferencePayload<'a> {
    pub inputs: &'a str,
    pub parameters: InferenceParameters<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct InferenceParameters<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub width: u32,
    pub height: u32,
}

impl<'a> InferencePayload<'a> {
    pub fn from_request(request: &'a ImageRequest) -> Self {
        let (width, height) = request.dimensions();
        Self {
            inputs: &request.prompt,
            parameters: InferenceParameters {
                negative_prompt: request.negative_prompt.as_deref(),
                guidance_scale: request.guidance,
                seed: request.seed,
                width,
                height,
            },
        }
    }
}

/// 推理服务的错误体：{"error": "..."}
#[derive(Debug, Deserialize)]
struct InferenceErrorBody {
    error: String,
}

/// 取出错误消息，不是 JSON 时原样返回
pub(super) fn error_message(body: String) -> String {
    serde_json::from_str::<InferenceErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_omits_unset_options() {
        let request = ImageRequest::new("Scene: a park");
        let json = serde_json::to_value(InferencePayload::from_request(&request)).unwrap();
        assert_eq!(json["inputs"], "Scene: a park");
        assert_eq!(json["parameters"]["width"], 1024);
        assert!(json["parameters"].get("seed").is_none());
        assert!(json["parameters"].get("negative_prompt").is_none());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error":"Model is loading"}"#.to_string()),
            "Model is loading"
        );
        assert_eq!(error_message("plain text".to_string()), "plain text");
    }
}
