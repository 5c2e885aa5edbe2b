//! HTTP TTS Client - 调用 ElevenLabs 兼容的 TTS HTTP 服务
//!
//! 实现 TtsEnginePort 与 VoiceCatalogPort
//!
//! 外部 TTS API:
//! POST {base_url}/v1/text-to-speech/{voice_id}
//! Request: {"text": "...", "model_id": "...", "voice_settings": {...}}  (JSON)
//! Response: audio/mpeg binary
//!
//! GET {base_url}/v1/voices
//! Response: {"voices": [{"name": "...", "voice_id": "..."}]}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    SynthesisRequest, TtsEnginePort, TtsError, VoiceCatalog, VoiceCatalogPort, VoiceSettings,
};

/// API key 请求头
const API_KEY_HEADER: &str = "xi-api-key";

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// 音色列表响应
#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceEntry>,
}

#[derive(Debug, Deserialize)]
struct VoiceEntry {
    name: String,
    voice_id: String,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            timeout_secs: 120,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端，API key 不能为空
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        if config.api_key.trim().is_empty() {
            return Err(TtsError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// 获取合成 URL
    fn synthesize_url(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{}", self.base_url(), voice_id)
    }

    /// 获取音色列表 URL
    fn voices_url(&self) -> String {
        format!("{}/v1/voices", self.base_url())
    }
}

fn map_transport_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else if e.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        TtsError::NetworkError(e.to_string())
    }
}

/// 将非成功状态码映射为错误类别
fn map_status_error(status: StatusCode, body: &str) -> TtsError {
    let detail = format!("HTTP {}: {}", status, body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => TtsError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TtsError::Unauthorized(detail),
        s if s.is_server_error() => TtsError::ServerError(detail),
        _ => TtsError::RequestRejected(detail),
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        let url = self.synthesize_url(&request.voice_id);
        let body = TtsHttpRequest {
            text: &request.text,
            model_id: &request.model_id,
            voice_settings: request.settings,
        };

        tracing::debug!(
            url = %url,
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            model_id = %request.model_id,
            "Sending TTS request"
        );

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &error_text));
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        tracing::debug!(
            voice_id = %request.voice_id,
            audio_size = audio_data.len(),
            "TTS request completed"
        );

        Ok(audio_data)
    }
}

#[async_trait]
impl VoiceCatalogPort for HttpTtsClient {
    async fn list_voices(&self) -> Result<VoiceCatalog, TtsError> {
        let response = self
            .client
            .get(self.voices_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &error_text));
        }

        let body: VoicesResponse = response
            .json()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to parse voices: {}", e)))?;

        let catalog: VoiceCatalog = body
            .voices
            .into_iter()
            .map(|v| (v.name, v.voice_id))
            .collect();

        tracing::info!(voices = catalog.len(), "Voice catalog loaded");

        Ok(catalog)
    }
}
