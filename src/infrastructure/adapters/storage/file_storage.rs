//! File Storage - 文件系统归档存储实现
//!
//! 实现 ArchiveStoragePort trait

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{ArchiveStorageError, ArchiveStoragePort};

/// 文件系统归档存储
pub struct FileArchiveStorage {
    /// 输出目录
    base_dir: PathBuf,
}

impl FileArchiveStorage {
    /// 创建新的文件存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, ArchiveStorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| ArchiveStorageError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }

    /// 获取输出目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 归档名只能是单个文件名，不允许路径分隔符
    fn archive_path(&self, name: &str) -> Result<PathBuf, ArchiveStorageError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            return Err(ArchiveStorageError::InvalidName(name.to_string()));
        }
        Ok(self.base_dir.join(name))
    }
}

#[async_trait]
impl ArchiveStoragePort for FileArchiveStorage {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArchiveStorageError> {
        let path = self.archive_path(name)?;

        fs::write(&path, bytes)
            .await
            .map_err(|e| ArchiveStorageError::IoError(e.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            size = bytes.len(),
            "Saved archive"
        );

        Ok(path)
    }
}
