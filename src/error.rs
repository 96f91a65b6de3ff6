use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("no table of contents found")]
    TocNotFound,
    #[error("table of contents on pages {pages:?} yielded no chapters")]
    EmptyToc { pages: Vec<u32> },
    #[error("failed to read document {path}: {reason}")]
    DocumentAccess { path: String, reason: String },
    #[error("page {page} is outside the document (1..={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("invalid detector configuration: {0}")]
    Config(String),
    #[error("failed to compile {name} pattern")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}
