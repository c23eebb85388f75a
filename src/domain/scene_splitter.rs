//! 场景分割器
//!
//! 按空行把故事文本切成有序的场景序列

use super::story::{Scene, StoryError};

/// 场景分隔符（空行）
pub const SCENE_DELIMITER: &str = "\n\n";

/// 场景分割配置
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// 最多保留的场景数（至少为 1）
    pub max_scenes: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { max_scenes: 3 }
    }
}

impl SplitConfig {
    pub fn new(max_scenes: usize) -> Self {
        Self { max_scenes }
    }

    /// 实际生效的上限，0 视为 1
    #[inline]
    pub fn effective_max(&self) -> usize {
        self.max_scenes.max(1)
    }
}

/// 对故事文本进行场景分割
///
/// 分割策略：
/// 1. 统一换行符（\r\n -> \n）
/// 2. 按空行分割
/// 3. 去掉首尾空白，丢弃空片段
/// 4. 截断到前 max_scenes 个，顺序不变
pub fn split_scenes(text: &str, config: &SplitConfig) -> Vec<Scene> {
    let normalized;
    let text = if text.contains('\r') {
        normalized = text.replace("\r\n", "\n");
        normalized.as_str()
    } else {
        text
    };

    text.split(SCENE_DELIMITER)
        .filter_map(Scene::new)
        .take(config.effective_max())
        .collect()
}

/// 便捷方法：直接传入上限
pub fn split(text: &str, max_scenes: usize) -> Vec<Scene> {
    split_scenes(text, &SplitConfig::new(max_scenes))
}

/// 校验并分割故事
///
/// 空故事返回 `EmptyStory`，分割后没有场景返回 `NoScenesDetected`
pub fn plan_scenes(story: &str, max_scenes: usize) -> Result<Vec<Scene>, StoryError> {
    if story.trim().is_empty() {
        return Err(StoryError::EmptyStory);
    }

    let scenes = split(story, max_scenes);
    if scenes.is_empty() {
        return Err(StoryError::NoScenesDetected);
    }
    Ok(scenes)
}
