//! 应用层 - 命令
//!
//! 会调用外部图像后端的操作

mod illustrate_commands;

pub mod handlers;

pub use illustrate_commands::*;
