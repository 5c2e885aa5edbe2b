//! Archive Ports - 打包与归档存储抽象
//!
//! 将合成成功的片段音频打包为单个归档，并写入存储

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// 打包错误
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    #[error("Archive write failed: {0}")]
    WriteError(String),
}

/// 归档存储错误
#[derive(Debug, Error)]
pub enum ArchiveStorageError {
    #[error("Invalid archive name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 归档中的单个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Archive Builder Port
///
/// 文件名在归档内必须唯一
pub trait ArchiveBuilderPort: Send + Sync {
    fn build(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError>;
}

/// Archive Storage Port
#[async_trait]
pub trait ArchiveStoragePort: Send + Sync {
    /// 保存归档，返回写入的路径
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArchiveStorageError>;
}
