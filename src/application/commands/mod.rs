//! 应用层 - 命令（写操作）
//!
//! 合成批处理：分片 → 逐片段合成 → 打包 → 存储

mod generate_commands;

pub mod handlers;

pub use generate_commands::*;
