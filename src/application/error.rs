//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{ArchiveError, ArchiveStorageError};
use crate::domain::FragmentError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 音色目录不可用（空或获取失败），阻止后续合成
    #[error("Voice catalog unavailable: {0}")]
    VoiceCatalogUnavailable(String),

    /// 音色未找到
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// 打包错误
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<FragmentError> for ApplicationError {
    fn from(err: FragmentError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ArchiveError> for ApplicationError {
    fn from(err: ArchiveError) -> Self {
        Self::ArchiveError(err.to_string())
    }
}

impl From<ArchiveStorageError> for ApplicationError {
    fn from(err: ArchiveStorageError) -> Self {
        Self::StorageError(err.to_string())
    }
}
