// Pipeline ingestion: upload normalization and archive flattening

pub mod file_catalog;

pub use file_catalog::{classify_extensions, format_file_size, FileCatalog, Upload, UploadStatus};
