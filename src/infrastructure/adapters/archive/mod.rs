//! Archive Adapter - ZIP 打包实现

mod zip_archive;

pub use zip_archive::ZipArchiveBuilder;
