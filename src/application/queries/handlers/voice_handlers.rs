//! Voice Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{VoiceCatalog, VoiceCatalogPort};
use crate::application::queries::{ListVoices, ResolveVoice};

// ============================================================================
// Response DTOs
// ============================================================================

/// 解析后的音色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVoice {
    pub name: String,
    pub voice_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// ListVoices Handler
///
/// 获取失败或目录为空都视为不可用，调用方不应继续合成
pub struct ListVoicesHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
}

impl ListVoicesHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, _query: ListVoices) -> Result<VoiceCatalog, ApplicationError> {
        let voices = self.catalog.list_voices().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load voice catalog");
            ApplicationError::VoiceCatalogUnavailable(e.to_string())
        })?;

        if voices.is_empty() {
            return Err(ApplicationError::VoiceCatalogUnavailable(
                "No voices available".to_string(),
            ));
        }

        Ok(voices)
    }
}

/// ResolveVoice Handler
pub struct ResolveVoiceHandler {
    list_voices: ListVoicesHandler,
}

impl ResolveVoiceHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self {
            list_voices: ListVoicesHandler::new(catalog),
        }
    }

    pub async fn handle(&self, query: ResolveVoice) -> Result<ResolvedVoice, ApplicationError> {
        let voices = self.list_voices.handle(ListVoices).await?;

        let resolved = match query.name.as_deref() {
            // 目录非空，BTreeMap 按名称排序
            None => voices.iter().next(),
            Some(name) => voices
                .get_key_value(name)
                .or_else(|| voices.iter().find(|(_, id)| id.as_str() == name)),
        };

        let (name, voice_id) = resolved.ok_or_else(|| {
            ApplicationError::VoiceNotFound(query.name.clone().unwrap_or_default())
        })?;

        tracing::info!(voice = %name, voice_id = %voice_id, "Voice resolved");

        Ok(ResolvedVoice {
            name: name.clone(),
            voice_id: voice_id.clone(),
        })
    }
}
