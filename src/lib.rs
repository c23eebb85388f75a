//! Picturebook - 故事插画生成服务
//!
//! 把一段故事拆成场景，为每个场景组装带角色一致性约束的提示词，
//! 依次调用图像后端出图。
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Story Context: 场景、角色配置、风格、提示词组装
//! - 场景分割器
//!
//! 应用层 (application/):
//! - Ports: ImageGeneratorPort
//! - Commands: IllustrateStory（编排循环）
//! - Queries: PreviewScenes
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket + 静态页面
//! - Adapters: 三种图像后端与离线假后端
//! - Events: WebSocket 生成事件

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
