//! Zip Archive Builder
//!
//! 实现 ArchiveBuilderPort，将片段音频打包为 deflate 压缩的 ZIP

use chrono::{Datelike, Timelike};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::application::ports::{ArchiveBuilderPort, ArchiveEntry, ArchiveError};

/// ZIP 打包器
#[derive(Debug, Clone, Default)]
pub struct ZipArchiveBuilder;

impl ZipArchiveBuilder {
    pub fn new() -> Self {
        Self
    }

    fn file_options() -> FileOptions<'static, ()> {
        let now = chrono::Local::now();
        FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644)
            .last_modified_time(
                zip::DateTime::from_date_and_time(
                    now.year() as u16,
                    now.month() as u8,
                    now.day() as u8,
                    now.hour() as u8,
                    now.minute() as u8,
                    now.second() as u8,
                )
                .unwrap_or_default(),
            )
    }
}

impl ArchiveBuilderPort for ZipArchiveBuilder {
    fn build(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
        let mut seen = HashSet::new();
        for entry in entries {
            if !seen.insert(entry.filename.as_str()) {
                return Err(ArchiveError::DuplicateEntry(entry.filename.clone()));
            }
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = Self::file_options();

        for entry in entries {
            zip.start_file(entry.filename.as_str(), options)
                .map_err(|e| ArchiveError::WriteError(e.to_string()))?;
            zip.write_all(&entry.bytes)
                .map_err(|e| ArchiveError::WriteError(e.to_string()))?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| ArchiveError::WriteError(e.to_string()))?;

        let bytes = cursor.into_inner();
        tracing::debug!(
            entries = entries.len(),
            archive_size = bytes.len(),
            "Built zip archive"
        );

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_build_round_trips_entries() {
        let entries = vec![
            ArchiveEntry::new("1.mp3", b"first".to_vec()),
            ArchiveEntry::new("2.mp3", b"second".to_vec()),
        ];
        let bytes = ZipArchiveBuilder::new().build(&entries).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut file = archive.by_name("2.mp3").unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"second");
    }

    #[test]
    fn test_duplicate_filenames_rejected() {
        let entries = vec![
            ArchiveEntry::new("1.mp3", vec![1]),
            ArchiveEntry::new("1.mp3", vec![2]),
        ];
        let result = ZipArchiveBuilder::new().build(&entries);
        assert!(matches!(result, Err(ArchiveError::DuplicateEntry(name)) if name == "1.mp3"));
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = ZipArchiveBuilder::new().build(&[]).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
