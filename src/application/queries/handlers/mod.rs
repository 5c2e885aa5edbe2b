//! Query Handlers 实现

mod fragment_handlers;
mod voice_handlers;

pub use fragment_handlers::*;
pub use voice_handlers::*;
