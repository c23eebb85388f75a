//! Domain Layer - 领域层
//!
//! 包含:
//! - Story Context: 场景、角色配置、提示词组装
//! - 场景分割器

pub mod story;

mod scene_splitter;

pub use scene_splitter::{plan_scenes, split, split_scenes, SplitConfig, SCENE_DELIMITER};
pub use story::{
    build_negative_prompt, build_prompt, ArtStyle, CharacterConfig, Creativity, PromptComposer,
    Scene, StoryError, StyleConfig,
};
