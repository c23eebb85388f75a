//! 提示词组装
//!
//! 跨场景的角色一致性完全依赖文本锚定：每个场景的提示词都逐字重复
//! 同一段主角描述，场景之间不共享任何像素或种子图。
//!
//! 子句顺序固定：
//! 1. 角色锚定
//! 2. 角色名单规则
//! 3. 画风规则
//! 4. 场景描述
//!
//! 角色锚定放在场景描述之前，假设后端分词会更看重靠前的身份信息。
//! 这只是假设，不同后端的表现不作保证。

use super::{CharacterConfig, Scene, StyleConfig};

/// 所有后端都不希望出现的特征
const BASE_NEGATIVE_TRAITS: &[&str] = &[
    "extra people",
    "crowd",
    "watermark",
    "text",
    "low quality",
    "blurry",
    "deformed",
    "extra limbs",
];

/// 严格模式额外排除的特征
const STRICT_NEGATIVE_TRAITS: &[&str] = &[
    "random adults",
    "additional characters",
    "people in background",
    "crowds",
];

/// 严格模式下的排除子句
pub const EXCLUSION_CLAUSE: &str = "No random adults, no extra people, no new main characters.";

/// 提示词组装器
///
/// 纯函数：相同输入总是得到逐字节相同的输出
#[derive(Debug, Clone, Copy)]
pub struct PromptComposer<'a> {
    character: &'a CharacterConfig,
    style: &'a StyleConfig,
}

impl<'a> PromptComposer<'a> {
    pub fn new(character: &'a CharacterConfig, style: &'a StyleConfig) -> Self {
        Self { character, style }
    }

    /// 组装正向提示词
    pub fn compose(&self, scene: &Scene) -> String {
        [
            self.character_anchor(),
            self.cast_rule(),
            self.style_rule(),
            scene_clause(scene),
        ]
        .join(" ")
    }

    /// 组装负向提示词
    pub fn negative(&self) -> String {
        build_negative_prompt(self.character)
    }

    fn character_anchor(&self) -> String {
        let name = &self.character.main_name;
        format!(
            "Main character: {} — {}. {} must look the same in every scene.",
            name, self.character.main_description, name
        )
    }

    fn cast_rule(&self) -> String {
        let name = &self.character.main_name;
        if !self.character.strict_mode {
            return format!("Keep {} as the same main character in every scene.", name);
        }

        let others = self.character.allowed_others.trim();
        let cast = if others.is_empty() {
            name.to_string()
        } else {
            format!("{}, {}", name, others)
        };
        format!("Only include these characters: {}. {}", cast, EXCLUSION_CLAUSE)
    }

    fn style_rule(&self) -> String {
        format!(
            "Children's story illustration, {}, soft warm lighting, \
             consistent character design, high quality, clean composition.",
            self.style.style
        )
    }
}

fn scene_clause(scene: &Scene) -> String {
    format!("Scene: {}", scene.as_str())
}

/// 组装正向提示词（便捷方法）
pub fn build_prompt(scene: &Scene, character: &CharacterConfig, style: &StyleConfig) -> String {
    PromptComposer::new(character, style).compose(scene)
}

/// 组装负向提示词
///
/// 严格模式在基础特征前追加人物/人群排除
pub fn build_negative_prompt(character: &CharacterConfig) -> String {
    let strict: &[&str] = if character.strict_mode {
        STRICT_NEGATIVE_TRAITS
    } else {
        &[]
    };
    strict
        .iter()
        .chain(BASE_NEGATIVE_TRAITS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}
