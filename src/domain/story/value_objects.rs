//! Story Context - Value Objects

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::StoryError;

/// 场景：故事中按空行切出的一段文本
///
/// 不变量：内容已去除首尾空白且非空
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Scene(String);

impl Scene {
    /// 去除首尾空白，空内容返回 None
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for Scene {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// 画风预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArtStyle {
    #[default]
    #[serde(rename = "storybook illustration")]
    StorybookIllustration,
    #[serde(rename = "watercolor")]
    Watercolor,
    #[serde(rename = "manga")]
    Manga,
    #[serde(rename = "sketch")]
    Sketch,
    #[serde(rename = "digital painting")]
    DigitalPainting,
    #[serde(rename = "anime")]
    Anime,
}

impl ArtStyle {
    /// 全部预设，按界面展示顺序
    pub const ALL: [ArtStyle; 6] = [
        ArtStyle::StorybookIllustration,
        ArtStyle::Watercolor,
        ArtStyle::Manga,
        ArtStyle::Sketch,
        ArtStyle::DigitalPainting,
        ArtStyle::Anime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtStyle::StorybookIllustration => "storybook illustration",
            ArtStyle::Watercolor => "watercolor",
            ArtStyle::Manga => "manga",
            ArtStyle::Sketch => "sketch",
            ArtStyle::DigitalPainting => "digital painting",
            ArtStyle::Anime => "anime",
        }
    }
}

impl std::fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ArtStyle {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| StoryError::UnknownStyle(s.to_string()))
    }
}

/// 创作自由度（引导强度），取值范围 [1.0, 12.0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Creativity(f32);

impl Creativity {
    pub const MIN: f32 = 1.0;
    pub const MAX: f32 = 12.0;
    pub const DEFAULT: f32 = 7.5;

    pub fn new(value: f32) -> Result<Self, StoryError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(StoryError::CreativityOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// 超出范围时截断到边界，NaN 回退为默认值
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn is_default(&self) -> bool {
        (self.0 - Self::DEFAULT).abs() < f32::EPSILON
    }
}

impl Default for Creativity {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f32> for Creativity {
    type Error = StoryError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Creativity> for f32 {
    fn from(value: Creativity) -> Self {
        value.0
    }
}

/// 角色一致性配置
///
/// 每次生成只提供一次，对所有场景的提示词一视同仁。
/// 名称和描述非空不做强制校验。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterConfig {
    /// 主角名称（每个场景都会出现）
    pub main_name: String,
    /// 主角外观描述（越具体越稳定）
    pub main_description: String,
    /// 允许出现的其他角色（自由文本，逗号分隔）
    #[serde(default)]
    pub allowed_others: String,
    /// 严格模式：只允许名单内角色出现
    #[serde(default = "default_strict_mode")]
    pub strict_mode: bool,
}

fn default_strict_mode() -> bool {
    true
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            main_name: "Buddy".to_string(),
            main_description: "a small white fluffy dog with pointed ears, big black eyes, \
                               a red collar, cute friendly expression"
                .to_string(),
            allowed_others: "a lost child (boy, 8 years old), forest animals".to_string(),
            strict_mode: default_strict_mode(),
        }
    }
}

impl CharacterConfig {
    pub fn new(main_name: impl Into<String>, main_description: impl Into<String>) -> Self {
        Self {
            main_name: main_name.into(),
            main_description: main_description.into(),
            allowed_others: String::new(),
            strict_mode: false,
        }
    }

    pub fn with_allowed_others(mut self, allowed: impl Into<String>) -> Self {
        self.allowed_others = allowed.into();
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }
}

/// 画面风格配置
///
/// creativity 与 seed 作为后端参数传递，不写入提示词文本
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    pub style: ArtStyle,
    #[serde(default)]
    pub creativity: Creativity,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl StyleConfig {
    pub fn new(style: ArtStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    pub fn with_creativity(mut self, creativity: Creativity) -> Self {
        self.creativity = creativity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_trims_and_rejects_blank() {
        assert_eq!(Scene::new("  hello \n").unwrap().as_str(), "hello");
        assert!(Scene::new(" \t\n ").is_none());
    }

    #[test]
    fn test_art_style_from_str() {
        assert_eq!("watercolor".parse::<ArtStyle>().unwrap(), ArtStyle::Watercolor);
        assert_eq!(
            "Digital_Painting".parse::<ArtStyle>().unwrap(),
            ArtStyle::DigitalPainting
        );
        assert!("oil".parse::<ArtStyle>().is_err());
    }

    #[test]
    fn test_art_style_serde_uses_labels() {
        let json = serde_json::to_string(&ArtStyle::StorybookIllustration).unwrap();
        assert_eq!(json, "\"storybook illustration\"");
        let style: ArtStyle = serde_json::from_str("\"anime\"").unwrap();
        assert_eq!(style, ArtStyle::Anime);
    }

    #[test]
    fn test_creativity_bounds() {
        assert!(Creativity::new(0.5).is_err());
        assert!(Creativity::new(12.5).is_err());
        assert!(Creativity::new(f32::NAN).is_err());
        assert_eq!(Creativity::new(3.0).unwrap().value(), 3.0);
        assert_eq!(Creativity::clamped(40.0).value(), Creativity::MAX);
        assert_eq!(Creativity::clamped(-1.0).value(), Creativity::MIN);
        assert!(Creativity::clamped(f32::NAN).is_default());
    }

    #[test]
    fn test_style_config_deserialize_defaults() {
        let style: StyleConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(style.style, ArtStyle::StorybookIllustration);
        assert!(style.creativity.is_default());
        assert_eq!(style.seed, None);
    }
}
