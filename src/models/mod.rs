pub mod browser_kind;
pub mod outcome;
pub mod source;

pub use browser_kind::BrowserKind;
pub use outcome::{BatchReport, UploadOutcome, UploadStage};
pub use source::SourceSpec;
