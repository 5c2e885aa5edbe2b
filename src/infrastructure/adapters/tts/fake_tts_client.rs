//! Fake TTS Client - 离线 TTS 客户端
//!
//! 不调用外部服务，返回确定性的假音频；可预设失败，用于 dry-run 和测试

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{
    SynthesisRequest, TtsEnginePort, TtsError, VoiceCatalog, VoiceCatalogPort,
};

/// 默认音色 id
pub const FAKE_VOICE_ID: &str = "fake-voice";

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 音色目录
    pub voices: VoiceCatalog,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        let mut voices = VoiceCatalog::new();
        voices.insert("Fake Voice".to_string(), FAKE_VOICE_ID.to_string());
        Self { voices }
    }
}

impl FakeTtsClientConfig {
    /// 把音色名加入目录（dry-run 时接受任意配置的音色名）
    pub fn with_voice(mut self, name: impl Into<String>) -> Self {
        self.voices
            .entry(name.into())
            .or_insert_with(|| FAKE_VOICE_ID.to_string());
        self
    }
}

/// 预设的失败：文本包含 `needle` 的请求依次返回这些错误
struct ScriptedFailure {
    needle: String,
    errors: VecDeque<TtsError>,
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    failures: Mutex<Vec<ScriptedFailure>>,
    delays: Mutex<Vec<(String, Duration)>>,
    catalog_error: Mutex<Option<TtsError>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            voices = config.voices.len(),
            "FakeTtsClient initialized"
        );
        Self {
            config,
            failures: Mutex::new(Vec::new()),
            delays: Mutex::new(Vec::new()),
            catalog_error: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    /// 文本包含 `needle` 的请求依次返回 `errors`，用完后正常返回
    pub fn fail_text(&self, needle: &str, errors: Vec<TtsError>) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(ScriptedFailure {
                needle: needle.to_string(),
                errors: errors.into(),
            });
        }
    }

    /// 文本包含 `needle` 的请求在返回前等待 `delay`
    pub fn delay_text(&self, needle: &str, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push((needle.to_string(), delay));
        }
    }

    /// 让 list_voices 返回错误
    pub fn fail_catalog(&self, error: TtsError) {
        if let Ok(mut slot) = self.catalog_error.lock() {
            *slot = Some(error);
        }
    }

    /// 已收到的请求文本（按调用顺序，包括失败的请求）
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn delay_for(&self, text: &str) -> Duration {
        self.delays
            .lock()
            .ok()
            .and_then(|delays| {
                delays
                    .iter()
                    .find(|(needle, _)| text.contains(needle.as_str()))
                    .map(|(_, delay)| *delay)
            })
            .unwrap_or(Duration::ZERO)
    }

    fn next_failure(&self, text: &str) -> Option<TtsError> {
        let mut failures = self.failures.lock().ok()?;
        let error = failures
            .iter_mut()
            .find(|f| text.contains(&f.needle) && !f.errors.is_empty())
            .and_then(|f| f.errors.pop_front());
        error
    }

    /// 确定性的假音频数据
    pub fn fake_audio(request: &SynthesisRequest) -> Vec<u8> {
        format!("FAKE-MP3:{}:{}", request.voice_id, request.text).into_bytes()
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.text.clone());
        }

        tracing::debug!(
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            "FakeTtsClient: returning fake audio"
        );

        let delay = self.delay_for(&request.text);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.next_failure(&request.text) {
            Some(error) => Err(error),
            None => Ok(Self::fake_audio(request)),
        }
    }
}

#[async_trait]
impl VoiceCatalogPort for FakeTtsClient {
    async fn list_voices(&self) -> Result<VoiceCatalog, TtsError> {
        let error = self.catalog_error.lock().ok().and_then(|slot| slot.clone());
        match error {
            Some(error) => Err(error),
            None => Ok(self.config.voices.clone()),
        }
    }
}
