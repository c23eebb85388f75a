//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{IllustrateStoryHandler, ImageGeneratorPort, PreviewScenesHandler};
use crate::config::GenerationConfig;

/// 应用状态
///
/// 每次生成的状态都在编排循环内部，这里只有共享的只读依赖
pub struct AppState {
    // ========== Ports ==========
    pub generator: Arc<dyn ImageGeneratorPort>,

    // ========== Config ==========
    pub generation: GenerationConfig,

    // ========== Command Handlers ==========
    pub illustrate_handler: IllustrateStoryHandler,

    // ========== Query Handlers ==========
    pub preview_handler: PreviewScenesHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(generator: Arc<dyn ImageGeneratorPort>, generation: GenerationConfig) -> Self {
        Self {
            generator: generator.clone(),
            generation,
            illustrate_handler: IllustrateStoryHandler::new(generator),
            preview_handler: PreviewScenesHandler::new(),
        }
    }
}
