//! Generate Commands - 批量合成相关命令

use std::path::PathBuf;
use uuid::Uuid;

use crate::application::ports::{TtsError, VoiceSettings};

/// 批量生成音频命令
#[derive(Debug, Clone)]
pub struct GenerateAudioCommand {
    /// 原始文本
    pub text: String,
    /// 音色 ID
    pub voice_id: String,
    /// 模型 ID
    pub model_id: String,
    pub settings: VoiceSettings,
    /// 片段字符数上限
    pub max_chars: usize,
}

/// 合成成功的片段
#[derive(Debug, Clone)]
pub struct SynthesizedFragment {
    pub index: usize,
    pub text: String,
    /// 归档内的文件名，如 `3.mp3`
    pub filename: String,
    pub audio_size: usize,
    pub attempts: u32,
}

/// 合成失败的片段
#[derive(Debug, Clone)]
pub struct FailedFragment {
    pub index: usize,
    pub text: String,
    pub error: TtsError,
    pub attempts: u32,
}

/// 已写入存储的归档
#[derive(Debug, Clone)]
pub struct StoredArchive {
    pub name: String,
    pub path: PathBuf,
    pub size: usize,
}

/// 批量生成响应
#[derive(Debug, Clone)]
pub struct GenerateAudioResponse {
    pub run_id: Uuid,
    /// 片段总数
    pub total: usize,
    /// 按片段序号排列
    pub synthesized: Vec<SynthesizedFragment>,
    /// 按片段序号排列
    pub failed: Vec<FailedFragment>,
    /// 没有任何片段成功时为 None
    pub archive: Option<StoredArchive>,
}

impl GenerateAudioResponse {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.synthesized.len() == self.total
    }
}
