use tracing::info;

use crate::chapters::body_scanner::{scan_body, section_keywords, toc_page_evidence};
use crate::chapters::events::{ChapterEvent, EventSink};
use crate::chapters::merger::merge_chapters;
use crate::chapters::patterns::LinePatterns;
use crate::chapters::ranges::calculate_ranges;
use crate::chapters::section_enhancer::{enhance_section_starts, section_first_chapters};
use crate::chapters::toc_extractor::extract_toc;
use crate::chapters::toc_locator::locate_toc_pages;
use crate::config::DetectorConfig;
use crate::document::PageSource;
use crate::error::ChapterError;
use crate::model::{Chapter, ChapterPages, ChapterPlan, SectionMap};

/// Result of locating chapter start pages in the body of a book.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub pages: ChapterPages,
    /// False when the TOC page numbers were used and the body was skipped.
    pub body_scanned: bool,
}

/// TOC page numbers when the TOC printed them, otherwise a body scan
/// followed by section divider relocation.
pub fn scan_source(
    source: &dyn PageSource,
    toc_pages: &[u32],
    sections: &SectionMap,
    toc_chapters: &[Chapter],
    patterns: &LinePatterns,
    config: &DetectorConfig,
    sink: &mut dyn EventSink,
) -> ScanOutcome {
    if let Some(pages) = toc_page_evidence(toc_chapters) {
        sink.emit(ChapterEvent::TocPagesUsed {
            chapters: pages.len(),
        });
        return ScanOutcome {
            pages,
            body_scanned: false,
        };
    }

    let keywords = section_keywords(config, sections);
    let mut pages = scan_body(source, toc_pages, &keywords, patterns, config, sink);

    let first_ids = section_first_chapters(toc_chapters, config);
    if !first_ids.is_empty() {
        enhance_section_starts(&mut pages, &first_ids, toc_pages, source, patterns, config, sink);
    }

    ScanOutcome {
        pages,
        body_scanned: true,
    }
}

/// Forwards events and keeps the text of every warning for the plan.
struct WarningCollector<'a> {
    inner: &'a mut dyn EventSink,
    warnings: Vec<String>,
}

impl EventSink for WarningCollector<'_> {
    fn emit(&mut self, event: ChapterEvent) {
        if event.is_warning() {
            self.warnings.push(event.describe());
        }
        self.inner.emit(event);
    }
}

/// Runs the whole detection pipeline over one document.
///
/// A book without a table of contents, or whose table of contents yields no
/// chapter entries, is rejected rather than guessed at.
pub fn resolve_chapters(
    source: &dyn PageSource,
    config: &DetectorConfig,
    sink: &mut dyn EventSink,
) -> Result<ChapterPlan, ChapterError> {
    config.validate()?;
    let patterns = LinePatterns::new()?;
    let mut collector = WarningCollector {
        inner: sink,
        warnings: Vec::new(),
    };

    let toc_pages = locate_toc_pages(source, &patterns, config, &mut collector)
        .ok_or(ChapterError::TocNotFound)?;
    info!(pages = ?toc_pages, "located table of contents");

    let (toc_chapters, sections) = extract_toc(source, &toc_pages, &patterns, &mut collector);
    if toc_chapters.is_empty() {
        return Err(ChapterError::EmptyToc { pages: toc_pages });
    }
    info!(
        chapters = toc_chapters.len(),
        sections = sections.len(),
        "parsed table of contents"
    );

    let outcome = scan_source(
        source,
        &toc_pages,
        &sections,
        &toc_chapters,
        &patterns,
        config,
        &mut collector,
    );
    let merged = merge_chapters(&toc_chapters, &outcome.pages, &mut collector);
    let total_pages = source.page_count();
    let chapters = calculate_ranges(&merged, total_pages, &mut collector);
    info!(chapters = chapters.len(), total_pages, "resolved chapter ranges");

    Ok(ChapterPlan {
        toc_pages,
        total_pages,
        body_scanned: outcome.body_scanned,
        sections,
        chapters,
        warnings: collector.warnings,
    })
}
