//! 应用层 - 查询（读操作）
//!
//! 音色目录查询与分片预览

mod fragment_queries;
mod voice_queries;

pub mod handlers;

pub use fragment_queries::*;
pub use voice_queries::*;
