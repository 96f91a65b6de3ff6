use std::collections::BTreeMap;

use crate::chapters::events::{ChapterEvent, EventSink};
use crate::model::{Chapter, ChapterPages, ChapterSource, MatchKind, PageEvidence};
use crate::util::{chapter_id_order, normalize_whitespace};

pub const ADDITIONAL_SECTION: &str = "Additional";
pub const ADDITIONAL_SECTION_TITLE: &str = "Additional Chapters";

/// Combines TOC chapters with scan evidence into one record per chapter id,
/// ordered by chapter id.
pub fn merge_chapters(
    toc_chapters: &[Chapter],
    pages: &ChapterPages,
    sink: &mut dyn EventSink,
) -> Vec<Chapter> {
    let toc_by_id = toc_chapters
        .iter()
        .map(|chapter| (chapter.id.as_str(), chapter))
        .collect::<BTreeMap<&str, &Chapter>>();

    let mut ids = toc_by_id.keys().copied().collect::<Vec<&str>>();
    ids.extend(
        pages
            .ids()
            .map(String::as_str)
            .filter(|id| !toc_by_id.contains_key(id)),
    );
    ids.sort_by(|left, right| chapter_id_order(left, right));

    ids.into_iter()
        .filter_map(|id| match (toc_by_id.get(id), pages.get(id)) {
            (Some(toc_chapter), evidence) => Some(merge_toc_chapter(toc_chapter, evidence, sink)),
            (None, Some(evidence)) => {
                sink.emit(ChapterEvent::ScanOnlyChapter {
                    id: id.to_string(),
                    page: evidence.page,
                });
                Some(scan_only_chapter(id, evidence))
            }
            (None, None) => None,
        })
        .collect()
}

fn merge_toc_chapter(
    toc_chapter: &Chapter,
    evidence: Option<&PageEvidence>,
    sink: &mut dyn EventSink,
) -> Chapter {
    let mut chapter = toc_chapter.clone();
    let Some(evidence) = evidence else {
        return chapter;
    };

    chapter.page = Some(evidence.page);
    chapter.source = match evidence.kind {
        MatchKind::Toc => ChapterSource::Toc,
        MatchKind::Real | MatchKind::Reference => ChapterSource::Pattern,
    };
    if evidence.relocated() {
        chapter.source_page = Some(evidence.source_page);
    }

    if let Some(heading) = evidence.heading.as_deref()
        && !chapter.title.is_empty()
        && !same_title(&chapter.title, heading)
    {
        sink.emit(ChapterEvent::TitleMismatch {
            id: chapter.id.clone(),
            toc_title: chapter.title.clone(),
            scanned_title: heading.to_string(),
        });
    }

    chapter
}

fn scan_only_chapter(id: &str, evidence: &PageEvidence) -> Chapter {
    Chapter {
        id: id.to_string(),
        title: format!("Chapter {id}"),
        page: Some(evidence.page),
        section: Some(ADDITIONAL_SECTION.to_string()),
        section_title: Some(ADDITIONAL_SECTION_TITLE.to_string()),
        source: ChapterSource::PdfOnly,
        start_page: None,
        end_page: None,
        page_range: None,
        source_page: evidence.relocated().then_some(evidence.source_page),
    }
}

fn same_title(left: &str, right: &str) -> bool {
    normalize_whitespace(left).to_lowercase() == normalize_whitespace(right).to_lowercase()
}
