//! Command Handlers 实现

mod illustrate_handlers;

pub use illustrate_handlers::*;
