use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::chapters::events::{ChapterEvent, EventSink};
use crate::chapters::patterns::LinePatterns;
use crate::config::DetectorConfig;
use crate::document::PageSource;
use crate::model::{Chapter, ChapterPages, MatchKind};
use crate::util::{chapter_id_order, non_blank_lines};

/// Section id to the id of the first chapter in that section.
///
/// Falls back to `config.fallback_section_starts` when the TOC carried no
/// sectioned chapters.
pub fn section_first_chapters(
    toc_chapters: &[Chapter],
    config: &DetectorConfig,
) -> BTreeMap<String, String> {
    let mut first_ids: BTreeMap<String, String> = BTreeMap::new();
    for chapter in toc_chapters {
        let Some(section) = chapter.section.as_ref() else {
            continue;
        };
        match first_ids.get(section) {
            Some(current) if chapter_id_order(&chapter.id, current) != Ordering::Less => {}
            _ => {
                first_ids.insert(section.clone(), chapter.id.clone());
            }
        }
    }

    if first_ids.is_empty() {
        return config.fallback_section_starts.clone();
    }
    first_ids
}

/// Moves the start of each section's first chapter back onto the divider
/// page that precedes it, if one exists within the lookback window.
///
/// The lookback never reaches a TOC page or the start page of another
/// chapter, so relocated chapters cannot overlap their neighbours.
pub fn enhance_section_starts(
    pages: &mut ChapterPages,
    first_ids: &BTreeMap<String, String>,
    toc_pages: &[u32],
    source: &dyn PageSource,
    patterns: &LinePatterns,
    config: &DetectorConfig,
    sink: &mut dyn EventSink,
) {
    let page_count = source.page_count();

    for chapter_id in first_ids.values() {
        let Some(evidence) = pages.get(chapter_id) else {
            continue;
        };
        if evidence.kind == MatchKind::Toc {
            continue;
        }

        let detected = evidence.source_page;
        let floor = lookback_floor(pages, chapter_id, detected, toc_pages);
        let divider = (1..=config.divider_lookback_pages)
            .filter_map(|offset| detected.checked_sub(offset))
            .take_while(|page| *page > floor)
            .filter(|page| *page <= page_count)
            .find(|page| match source.page_text(*page) {
                Ok(text) => is_divider_page(&text, patterns, config),
                Err(_) => false,
            });

        match divider {
            Some(page) => {
                if let Some(evidence) = pages.get_mut(chapter_id) {
                    evidence.page = page;
                }
                sink.emit(ChapterEvent::DividerFound {
                    id: chapter_id.clone(),
                    from_page: detected,
                    to_page: page,
                });
            }
            None => sink.emit(ChapterEvent::DividerNotFound {
                id: chapter_id.clone(),
                page: detected,
            }),
        }
    }
}

/// Highest page below `detected` that is either part of the TOC or already
/// claimed as another chapter's start; 0 when there is none.
fn lookback_floor(
    pages: &ChapterPages,
    chapter_id: &str,
    detected: u32,
    toc_pages: &[u32],
) -> u32 {
    let toc_floor = toc_pages.iter().copied().filter(|page| *page < detected);
    let chapter_floor = pages
        .iter()
        .filter(|(id, _)| id.as_str() != chapter_id)
        .map(|(_, evidence)| evidence.page)
        .filter(|page| *page < detected);

    toc_floor.chain(chapter_floor).max().unwrap_or(0)
}

/// A near-empty page (usually a full-page graphic) or a short page naming
/// a "Part" near its top.
pub fn is_divider_page(text: &str, patterns: &LinePatterns, config: &DetectorConfig) -> bool {
    let lines = non_blank_lines(text);
    if lines.len() <= config.divider_max_lines {
        return true;
    }

    lines.len() <= config.part_divider_max_lines
        && lines
            .iter()
            .take(config.part_divider_scan_lines)
            .any(|line| patterns.has_part_marker(line))
}
