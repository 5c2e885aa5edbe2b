//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod archive;
mod tts_engine;
mod voice_catalog;

pub use archive::{
    ArchiveBuilderPort, ArchiveEntry, ArchiveError, ArchiveStorageError, ArchiveStoragePort,
};
pub use tts_engine::{SynthesisRequest, TtsEnginePort, TtsError, VoiceSettings};
pub use voice_catalog::{VoiceCatalog, VoiceCatalogPort};
