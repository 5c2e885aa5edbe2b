//! Storage Adapter - 文件系统归档存储

mod file_storage;

pub use file_storage::FileArchiveStorage;
