//! Story Context - 故事插画限界上下文
//!
//! 职责:
//! - 场景值对象
//! - 角色一致性与画风配置
//! - 提示词组装

mod errors;
mod prompt;
mod value_objects;

pub use errors::StoryError;
pub use prompt::{build_negative_prompt, build_prompt, PromptComposer};
pub use value_objects::{ArtStyle, CharacterConfig, Creativity, Scene, StyleConfig};
