pub mod analyze;
pub mod compare;
pub mod toc;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use chapterscan::config::DetectorConfig;
use chapterscan::document::{PageSource, open_document};

pub fn load_config(path: Option<&Path>) -> Result<DetectorConfig> {
    match path {
        Some(path) => {
            let config = DetectorConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            info!(path = %path.display(), "loaded detector config");
            Ok(config)
        }
        None => Ok(DetectorConfig::default()),
    }
}

pub fn open_book(path: &Path) -> Result<Box<dyn PageSource>> {
    let document =
        open_document(path).with_context(|| format!("failed to open {}", path.display()))?;
    info!(
        path = %path.display(),
        pages = document.page_count(),
        "opened book"
    );
    Ok(document)
}

pub fn book_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| path.display().to_string())
}
