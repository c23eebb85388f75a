//! 应用层 - 查询
//!
//! 不触发任何后端调用的只读操作

mod preview_queries;

pub mod handlers;

pub use preview_queries::*;
