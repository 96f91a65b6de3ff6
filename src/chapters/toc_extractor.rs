use crate::chapters::events::{ChapterEvent, EventSink};
use crate::chapters::patterns::{LineMatch, LinePatterns, part_number, part_section_id};
use crate::chapters::toc_locator::read_page;
use crate::document::PageSource;
use crate::model::{Chapter, Section, SectionMap};
use crate::util::numeric_id;

const INFERRED_FIRST_PART_TITLE: &str = "Part I";

/// Reads the TOC pages in order and parses their combined text.
pub fn extract_toc(
    source: &dyn PageSource,
    toc_pages: &[u32],
    patterns: &LinePatterns,
    sink: &mut dyn EventSink,
) -> (Vec<Chapter>, SectionMap) {
    let mut combined = String::new();
    for page in toc_pages {
        if let Some(text) = read_page(source, *page, sink) {
            combined.push_str(&text);
            combined.push('\n');
        }
    }

    parse_toc_text(&combined, patterns, sink)
}

#[derive(Debug, Default)]
struct TocState {
    chapters: Vec<Chapter>,
    sections: SectionMap,
    current_section: Option<String>,
    current_section_title: Option<String>,
    found_part_sections: bool,
}

impl TocState {
    fn open_section(&mut self, section: Section, sink: &mut dyn EventSink) {
        sink.emit(ChapterEvent::SectionFound {
            id: section.id.clone(),
            title: section.title.clone(),
            part_based: section.part_based,
        });
        self.current_section = Some(section.id.clone());
        self.current_section_title = Some(section.title.clone());
        self.sections.insert(section.id.clone(), section);
    }

    fn push_chapter(&mut self, chapter: Chapter, sink: &mut dyn EventSink) {
        sink.emit(ChapterEvent::TocChapter {
            id: chapter.id.clone(),
            page: chapter.page,
            section: chapter.section.clone(),
        });

        match self
            .chapters
            .iter_mut()
            .find(|existing| existing.id == chapter.id)
        {
            Some(existing) => {
                sink.emit(ChapterEvent::DuplicateTocChapter {
                    id: chapter.id.clone(),
                });
                *existing = chapter;
            }
            None => self.chapters.push(chapter),
        }
    }
}

/// Parses table-of-contents text into chapters and the section map.
///
/// Section headers ("Part II: ..." or "B. ...") set the section that every
/// following chapter line inherits. A chapter line without a page number
/// takes the next line's number when that line is purely numeric.
pub fn parse_toc_text(
    text: &str,
    patterns: &LinePatterns,
    sink: &mut dyn EventSink,
) -> (Vec<Chapter>, SectionMap) {
    let lines = text.split('\n').collect::<Vec<&str>>();
    let mut state = TocState::default();

    for (index, raw_line) in lines.iter().enumerate() {
        let Some(line_match) = patterns.classify_toc_line(raw_line) else {
            continue;
        };

        match line_match {
            LineMatch::PartHeader { numeral, title } => {
                let Some(section_id) = part_number(&numeral).and_then(part_section_id) else {
                    continue;
                };
                let section = Section {
                    id: section_id,
                    full_title: format!("Part {numeral}: {title}"),
                    title,
                    part_number: Some(numeral),
                    part_based: true,
                    inferred: false,
                };
                state.found_part_sections = true;
                state.open_section(section, sink);
            }
            LineMatch::SectionHeader { letter, title } => {
                let section = Section {
                    full_title: format!("{letter}. {title}"),
                    id: letter,
                    title,
                    part_number: None,
                    part_based: false,
                    inferred: false,
                };
                state.open_section(section, sink);
            }
            LineMatch::TocEntry { id, title, page } => {
                let page = page.or_else(|| {
                    lines
                        .get(index + 1)
                        .and_then(|next| wrapped_page_number(next))
                });
                let chapter = Chapter::from_toc(
                    id,
                    title,
                    page,
                    state.current_section.clone(),
                    state.current_section_title.clone(),
                );
                state.push_chapter(chapter, sink);
            }
            LineMatch::RealHeader { .. } | LineMatch::Reference { .. } => {}
        }
    }

    if state.found_part_sections {
        infer_missing_first_part(&mut state.chapters, &mut state.sections, sink);
    }

    (state.chapters, state.sections)
}

fn wrapped_page_number(line: &str) -> Option<u32> {
    let trimmed = line.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u32>().ok().filter(|page| *page > 0)
}

/// A book listing "Part II" onwards but no "Part I" gets section "A" for
/// every unsectioned chapter numbered below the first chapter of "B".
fn infer_missing_first_part(
    chapters: &mut [Chapter],
    sections: &mut SectionMap,
    sink: &mut dyn EventSink,
) {
    if sections.contains_key("A") || !sections.contains_key("B") {
        return;
    }

    let Some(first_b_id) = chapters
        .iter()
        .find(|chapter| chapter.section.as_deref() == Some("B"))
        .map(|chapter| numeric_id(&chapter.id).unwrap_or(u64::MAX))
    else {
        return;
    };

    let mut assigned = 0usize;
    for chapter in chapters.iter_mut() {
        if chapter.section.is_some() {
            continue;
        }
        if numeric_id(&chapter.id).unwrap_or(u64::MAX) < first_b_id {
            chapter.section = Some("A".to_string());
            chapter.section_title = Some(INFERRED_FIRST_PART_TITLE.to_string());
            assigned += 1;
        }
    }

    sections.insert(
        "A".to_string(),
        Section {
            id: "A".to_string(),
            title: INFERRED_FIRST_PART_TITLE.to_string(),
            full_title: INFERRED_FIRST_PART_TITLE.to_string(),
            part_number: Some("I".to_string()),
            part_based: true,
            inferred: true,
        },
    );
    sink.emit(ChapterEvent::SectionInferred {
        id: "A".to_string(),
        chapters: assigned,
    });
}
