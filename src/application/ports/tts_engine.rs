//! TTS Engine Port - 语音合成引擎抽象
//!
//! 定义单个片段的合成接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TtsError {
    #[error("Rate limited by TTS service")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request rejected: {0}")]
    RequestRejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key")]
    MissingApiKey,
}

impl TtsError {
    /// 是否值得重试（限流、服务端错误、网络错误、超时）
    pub fn is_retryable(&self) -> bool {
        match self {
            TtsError::RateLimited
            | TtsError::ServerError(_)
            | TtsError::NetworkError(_)
            | TtsError::Timeout => true,
            TtsError::Unauthorized(_)
            | TtsError::RequestRejected(_)
            | TtsError::InvalidResponse(_)
            | TtsError::MissingApiKey => false,
        }
    }

    /// 用于日志和进度事件的简短类别名
    pub fn kind(&self) -> &'static str {
        match self {
            TtsError::RateLimited => "rate_limited",
            TtsError::ServerError(_) => "server_error",
            TtsError::NetworkError(_) => "network_error",
            TtsError::Timeout => "timeout",
            TtsError::Unauthorized(_) => "unauthorized",
            TtsError::RequestRejected(_) => "request_rejected",
            TtsError::InvalidResponse(_) => "invalid_response",
            TtsError::MissingApiKey => "missing_api_key",
        }
    }
}

/// 音色参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    #[serde(rename = "similarity_boost")]
    pub similarity: f32,
    pub style: f32,
    #[serde(rename = "use_speaker_boost")]
    pub speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.52,
            similarity: 0.82,
            style: 0.0,
            speaker_boost: true,
        }
    }
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的片段文本
    pub text: String,
    /// 音色 ID
    pub voice_id: String,
    /// 模型 ID
    pub model_id: String,
    pub settings: VoiceSettings,
}

/// TTS Engine Port
///
/// 外部 TTS 服务的抽象接口，每个片段调用一次
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成单个片段，返回音频字节（MP3）
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError>;
}
