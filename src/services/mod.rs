pub mod download_store;
pub mod source_resolver;

pub use download_store::{DownloadSnapshot, DownloadStore};
pub use source_resolver::SourceResolver;
