//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::ports::VoiceSettings;
use crate::application::retry::RetryPolicy;
use crate::domain::DEFAULT_MAX_CHARS;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// TTS 服务配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音色参数
    #[serde(default)]
    pub voice: VoiceConfig,

    /// 分片配置
    #[serde(default)]
    pub fragment: FragmentConfig,

    /// 重试配置
    #[serde(default)]
    pub retry: RetryConfig,

    /// 合成调度配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// TTS 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub base_url: String,

    /// API key（建议通过环境变量 VOCERO_TTS__API_KEY 提供）
    #[serde(default)]
    pub api_key: String,

    /// 模型 ID
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tts_url(),
            api_key: String::new(),
            model_id: default_model_id(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

impl TtsConfig {
    /// 用于日志输出的 API key（脱敏）
    pub fn redacted_api_key(&self) -> &'static str {
        if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        }
    }
}

/// 音色参数配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// 默认音色显示名，未设置时取目录中的第一个
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_stability")]
    pub stability: f32,

    #[serde(default = "default_similarity")]
    pub similarity: f32,

    #[serde(default)]
    pub style: f32,

    #[serde(default = "default_speaker_boost")]
    pub speaker_boost: bool,
}

fn default_stability() -> f32 {
    0.52
}

fn default_similarity() -> f32 {
    0.82
}

fn default_speaker_boost() -> bool {
    true
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            name: None,
            stability: default_stability(),
            similarity: default_similarity(),
            style: 0.0,
            speaker_boost: default_speaker_boost(),
        }
    }
}

impl VoiceConfig {
    pub fn settings(&self) -> VoiceSettings {
        VoiceSettings {
            stability: self.stability,
            similarity: self.similarity,
            style: self.style,
            speaker_boost: self.speaker_boost,
        }
    }
}

/// 分片配置
#[derive(Debug, Clone, Deserialize)]
pub struct FragmentConfig {
    /// 片段字符数上限，取值范围 100..=500
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

/// 重试配置
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// 最大尝试次数（包含首次）
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 重试间隔（毫秒）
    #[serde(default = "default_retry_delay")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }
}

/// 合成调度配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 同时进行的合成请求数，1 表示逐个顺序提交
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 归档输出目录
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// 归档名前缀
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_archive_prefix() -> String {
    crate::application::DEFAULT_ARCHIVE_PREFIX.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            archive_prefix: default_archive_prefix(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
