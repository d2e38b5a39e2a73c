//! HTTP Handlers

mod call;
mod ping;
mod session;
mod status;
mod websocket;

pub use call::*;
pub use ping::*;
pub use session::*;
pub use status::*;
pub use websocket::*;
