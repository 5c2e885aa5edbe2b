//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、VoiceCatalog、ArchiveBuilder、ArchiveStorage）
//! - commands: 批量合成命令及处理器
//! - queries: 音色目录与分片预览查询
//! - retry: 合成请求重试策略
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod retry;

// Re-exports
pub use commands::{
    handlers::{archive_name, GenerateAudioHandler, DEFAULT_ARCHIVE_PREFIX},
    FailedFragment, GenerateAudioCommand, GenerateAudioResponse, StoredArchive,
    SynthesizedFragment,
};

pub use error::ApplicationError;

pub use ports::{
    ArchiveBuilderPort, ArchiveEntry, ArchiveError, ArchiveStorageError, ArchiveStoragePort,
    SynthesisRequest, TtsEnginePort, TtsError, VoiceCatalog, VoiceCatalogPort, VoiceSettings,
};

pub use queries::{
    handlers::{ListVoicesHandler, PreviewFragmentsHandler, ResolveVoiceHandler, ResolvedVoice},
    ListVoices, PreviewFragments, ResolveVoice,
};

pub use retry::RetryPolicy;
