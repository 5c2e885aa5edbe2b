//! Vocero - 文本分片与批量语音合成
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Fragmenter: 将文本切分为长度受限的片段
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, VoiceCatalog, ArchiveBuilder, ArchiveStorage）
//! - Commands: 批量合成
//! - Queries: 音色目录、分片预览
//! - RetryPolicy: 合成请求重试策略
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP TTS Client, Fake TTS Client, ZIP 打包, 文件存储
//! - Events: 进度事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
pub use domain::{split, split_text, Fragment, FragmentLimit};
