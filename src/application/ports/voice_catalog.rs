//! Voice Catalog Port - 音色目录抽象

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::tts_engine::TtsError;

/// 音色显示名 -> 音色 ID
pub type VoiceCatalog = BTreeMap<String, String>;

/// Voice Catalog Port
///
/// 列出 TTS 服务可用的音色
#[async_trait]
pub trait VoiceCatalogPort: Send + Sync {
    async fn list_voices(&self) -> Result<VoiceCatalog, TtsError>;
}
