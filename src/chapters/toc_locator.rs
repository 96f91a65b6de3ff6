use crate::chapters::events::{ChapterEvent, EventSink, TocStop};
use crate::chapters::patterns::LinePatterns;
use crate::config::DetectorConfig;
use crate::document::PageSource;

/// Finds the contiguous run of pages holding the table of contents.
///
/// The opening page must sit inside the configured search window and carry
/// both a "contents" heading and at least one chapter-like line. Following
/// pages join the run while each shows enough continuation entries.
pub fn locate_toc_pages(
    source: &dyn PageSource,
    patterns: &LinePatterns,
    config: &DetectorConfig,
    sink: &mut dyn EventSink,
) -> Option<Vec<u32>> {
    let page_count = source.page_count();
    let last_candidate = config.toc_search_last_page.min(page_count);

    for page in config.toc_search_first_page..=last_candidate {
        let Some(text) = read_page(source, page, sink) else {
            continue;
        };

        if !is_toc_start_page(patterns, &text) {
            continue;
        }

        sink.emit(ChapterEvent::TocStart { page });
        let mut toc_pages = vec![page];
        extend_toc(source, patterns, config, page, &mut toc_pages, sink);
        return Some(toc_pages);
    }

    None
}

fn extend_toc(
    source: &dyn PageSource,
    patterns: &LinePatterns,
    config: &DetectorConfig,
    start_page: u32,
    toc_pages: &mut Vec<u32>,
    sink: &mut dyn EventSink,
) {
    let page_count = source.page_count();
    let span_end = start_page.saturating_add(config.max_toc_pages);
    let mut next_page = start_page + 1;

    loop {
        if next_page > page_count {
            sink.emit(ChapterEvent::TocEnds {
                page: next_page,
                reason: TocStop::EndOfDocument,
            });
            return;
        }
        if next_page >= span_end {
            sink.emit(ChapterEvent::TocEnds {
                page: next_page,
                reason: TocStop::SpanLimit,
            });
            return;
        }

        let text = read_page(source, next_page, sink).unwrap_or_default();
        let signals = patterns.toc_continuation_signals(&text);
        if signals < config.min_continuation_signals {
            let reason = if patterns.has_toc_end_marker(&text) {
                TocStop::EndMarker
            } else {
                TocStop::TooFewSignals
            };
            sink.emit(ChapterEvent::TocEnds {
                page: next_page,
                reason,
            });
            return;
        }

        sink.emit(ChapterEvent::TocContinues {
            page: next_page,
            signals,
        });
        toc_pages.push(next_page);
        next_page += 1;
    }
}

fn is_toc_start_page(patterns: &LinePatterns, text: &str) -> bool {
    patterns.has_contents_heading(text) && patterns.toc_start_signals(text) > 0
}

pub(crate) fn read_page(
    source: &dyn PageSource,
    page: u32,
    sink: &mut dyn EventSink,
) -> Option<String> {
    match source.page_text(page) {
        Ok(text) => Some(text),
        Err(err) => {
            sink.emit(ChapterEvent::PageUnreadable {
                page,
                reason: err.to_string(),
            });
            None
        }
    }
}
