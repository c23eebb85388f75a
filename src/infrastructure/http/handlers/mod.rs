//! HTTP Handlers

mod ping;
mod story;
mod websocket;

pub use ping::*;
pub use story::*;
pub use websocket::*;
