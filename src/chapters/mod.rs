//! Chapter structure detection: table of contents location and parsing,
//! body scanning for chapter headers, and page range resolution.
//!
//! The functions at this level take a path and report failures through
//! `tracing` before returning an empty result. The submodules expose the
//! same steps over any [`PageSource`] with an explicit [`EventSink`].

pub mod body_scanner;
pub mod events;
pub mod merger;
pub mod patterns;
pub mod pipeline;
pub mod ranges;
pub mod section_enhancer;
pub mod toc_extractor;
pub mod toc_locator;


use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::config::DetectorConfig;
use crate::document::{PageSource, open_document};
use crate::model::{Chapter, ChapterPages, SectionMap};

pub use events::{ChapterEvent, EventSink, NullSink, TracingSink};
pub use patterns::LinePatterns;
pub use pipeline::{ScanOutcome, resolve_chapters, scan_source};

fn open_with_patterns(path: &Path) -> Option<(Box<dyn PageSource>, LinePatterns)> {
    let document = match open_document(path) {
        Ok(document) => document,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to open document");
            return None;
        }
    };
    match LinePatterns::new() {
        Ok(patterns) => Some((document, patterns)),
        Err(err) => {
            warn!(error = %err, "failed to build chapter patterns");
            None
        }
    }
}

/// Pages of the table of contents, or `None` when the book has none or
/// cannot be read.
pub fn find_toc_pages(path: &Path) -> Option<Vec<u32>> {
    let (document, patterns) = open_with_patterns(path)?;
    let config = DetectorConfig::default();
    let mut sink = TracingSink;
    toc_locator::locate_toc_pages(document.as_ref(), &patterns, &config, &mut sink)
}

pub fn extract_chapters_from_toc(path: &Path, toc_pages: &[u32]) -> (Vec<Chapter>, SectionMap) {
    let Some((document, patterns)) = open_with_patterns(path) else {
        return (Vec::new(), SectionMap::new());
    };
    let mut sink = TracingSink;
    toc_extractor::extract_toc(document.as_ref(), toc_pages, &patterns, &mut sink)
}

/// Chapter id to start page, from the TOC when it printed page numbers and
/// from the body otherwise.
pub fn scan_for_chapters(
    path: &Path,
    toc_pages: &[u32],
    sections: &SectionMap,
    toc_chapters: &[Chapter],
) -> BTreeMap<String, u32> {
    let Some((document, patterns)) = open_with_patterns(path) else {
        return BTreeMap::new();
    };
    let config = DetectorConfig::default();
    let mut sink = TracingSink;
    let outcome = scan_source(
        document.as_ref(),
        toc_pages,
        sections,
        toc_chapters,
        &patterns,
        &config,
        &mut sink,
    );
    outcome.pages.to_page_map()
}

pub fn merge_toc_with_pages(chapters: &[Chapter], pages: &BTreeMap<String, u32>) -> Vec<Chapter> {
    let evidence = ChapterPages::from_page_map(pages);
    let mut sink = TracingSink;
    merger::merge_chapters(chapters, &evidence, &mut sink)
}

pub fn calculate_page_ranges(chapters: &[Chapter], total_pages: u32) -> Vec<Chapter> {
    let mut sink = TracingSink;
    ranges::calculate_ranges(chapters, total_pages, &mut sink)
}
