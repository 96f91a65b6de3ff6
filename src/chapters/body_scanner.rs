use std::collections::HashSet;

use crate::chapters::events::{ChapterEvent, EventSink};
use crate::chapters::patterns::{LineMatch, LinePatterns};
use crate::chapters::toc_locator::read_page;
use crate::config::DetectorConfig;
use crate::document::PageSource;
use crate::model::{Chapter, ChapterPages, MatchKind, PageEvidence, RecordOutcome, SectionMap};

const MAX_HEADING_CHARS: usize = 80;
const SUBSTANTIAL_COLON_WINDOW: usize = 15;

/// When the TOC already printed page numbers, those pages are the answer
/// and the body is never scanned.
pub fn toc_page_evidence(toc_chapters: &[Chapter]) -> Option<ChapterPages> {
    let has_pages = toc_chapters
        .iter()
        .any(|chapter| chapter.page.is_some_and(|page| page > 0));
    if !has_pages {
        return None;
    }

    let mut pages = ChapterPages::new();
    for chapter in toc_chapters {
        if let Some(page) = chapter.page.filter(|page| *page > 0) {
            pages.record(&chapter.id, PageEvidence::new(page, MatchKind::Toc, None));
        }
    }
    Some(pages)
}

/// Section-opener keywords for strict validation: configured keywords plus
/// every section title parsed from the TOC, uppercased.
pub fn section_keywords(config: &DetectorConfig, sections: &SectionMap) -> Vec<String> {
    let mut keywords = config
        .section_keywords
        .iter()
        .chain(sections.values().map(|section| &section.title))
        .map(|keyword| keyword.trim().to_uppercase())
        .filter(|keyword| !keyword.is_empty())
        .collect::<Vec<String>>();
    keywords.sort();
    keywords.dedup();
    keywords
}

struct PageScan<'a> {
    patterns: &'a LinePatterns,
    config: &'a DetectorConfig,
    keywords: &'a [String],
}

/// Walks every page outside the TOC in ascending order looking for chapter
/// headers, falling back to "Chapter N:" references on pages without one.
pub fn scan_body(
    source: &dyn PageSource,
    toc_pages: &[u32],
    keywords: &[String],
    patterns: &LinePatterns,
    config: &DetectorConfig,
    sink: &mut dyn EventSink,
) -> ChapterPages {
    let skip_pages: HashSet<u32> = if toc_pages.is_empty() {
        (1..=config.leading_pages_without_toc).collect()
    } else {
        toc_pages.iter().copied().collect()
    };

    let scan = PageScan {
        patterns,
        config,
        keywords,
    };
    let mut found = ChapterPages::new();

    for page in 1..=source.page_count() {
        if skip_pages.contains(&page) {
            continue;
        }
        let Some(text) = read_page(source, page, sink) else {
            continue;
        };
        scan.scan_page(&text, page, &mut found, sink);
    }

    found
}

impl PageScan<'_> {
    fn scan_page(&self, text: &str, page: u32, found: &mut ChapterPages, sink: &mut dyn EventSink) {
        let lines = text.lines().collect::<Vec<&str>>();
        let strict = self.patterns.chapter_mentions(text) > self.config.dense_page_threshold;
        let mut found_real = false;

        for (index, line) in lines.iter().enumerate() {
            let Some(LineMatch::RealHeader { id, prefix_chars }) =
                self.patterns.classify_body_line(line)
            else {
                continue;
            };

            if prefix_chars > self.config.max_header_prefix_chars {
                sink.emit(ChapterEvent::HeaderRejected {
                    id,
                    page,
                    reason: "too much text before the header",
                });
                continue;
            }

            if strict && let Err(reason) = self.validate_strict(&lines, index) {
                sink.emit(ChapterEvent::HeaderRejected { id, page, reason });
                continue;
            }

            let heading = self.heading_after(&lines, index);
            let evidence = PageEvidence::new(page, MatchKind::Real, heading);
            if record(found, &id, evidence, strict, sink) {
                found_real = true;
            }
        }

        if found_real {
            return;
        }

        for line in &lines {
            let Some(LineMatch::Reference {
                id,
                prefix_chars,
                heading,
            }) = self.patterns.classify_body_line(line)
            else {
                continue;
            };

            if prefix_chars > self.config.max_reference_prefix_chars {
                sink.emit(ChapterEvent::HeaderRejected {
                    id,
                    page,
                    reason: "too much text before the reference",
                });
                continue;
            }
            if looks_like_dot_leader(line) {
                sink.emit(ChapterEvent::HeaderRejected {
                    id,
                    page,
                    reason: "dotted table-of-contents leader",
                });
                continue;
            }

            let evidence = PageEvidence::new(page, MatchKind::Reference, heading);
            record(found, &id, evidence, false, sink);
        }
    }

    /// Dense pages only trust a header that is followed by real prose and
    /// preceded by a section opener.
    fn validate_strict(&self, lines: &[&str], header_index: usize) -> Result<(), &'static str> {
        let has_substantial_line = lines
            .iter()
            .skip(header_index + 1)
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .take(self.config.strict_lookahead_lines)
            .any(|line| self.is_substantial(line));
        if !has_substantial_line {
            return Err("no substantial content after the header");
        }

        let before = lines[..header_index].join("\n").to_uppercase();
        let has_keyword = self
            .keywords
            .iter()
            .any(|keyword| before.contains(keyword.as_str()));
        if !has_keyword {
            return Err("no section heading before the header");
        }

        Ok(())
    }

    fn is_substantial(&self, line: &str) -> bool {
        let colon_window = line
            .chars()
            .take(SUBSTANTIAL_COLON_WINDOW)
            .any(|character| character == ':');

        line.chars().count() > self.config.substantial_line_chars
            && !self.patterns.is_chapter_like(line)
            && !colon_window
    }

    /// The first line after the header when it reads like a title rather
    /// than the opening sentence of the chapter.
    fn heading_after(&self, lines: &[&str], header_index: usize) -> Option<String> {
        lines
            .iter()
            .skip(header_index + 1)
            .map(|line| line.trim())
            .find(|line| !line.is_empty())
            .filter(|line| {
                line.chars().count() <= MAX_HEADING_CHARS
                    && !line.ends_with(['.', ',', ';', ':'])
                    && !self.patterns.is_chapter_like(line)
            })
            .map(|line| self.patterns.clean_title(line))
    }
}

fn looks_like_dot_leader(line: &str) -> bool {
    line.contains("...") || line.contains('…') || line.matches('.').count() > 3
}

fn record(
    found: &mut ChapterPages,
    id: &str,
    evidence: PageEvidence,
    strict: bool,
    sink: &mut dyn EventSink,
) -> bool {
    let page = evidence.page;
    let kind = evidence.kind;

    match found.record(id, evidence) {
        RecordOutcome::Inserted => {
            sink.emit(ChapterEvent::HeaderAccepted {
                id: id.to_string(),
                page,
                kind,
                strict,
            });
            true
        }
        RecordOutcome::Overrode { previous_page } => {
            sink.emit(ChapterEvent::EvidenceOverridden {
                id: id.to_string(),
                from_page: previous_page,
                to_page: page,
            });
            true
        }
        RecordOutcome::Discarded { existing } => {
            sink.emit(ChapterEvent::EvidenceDiscarded {
                id: id.to_string(),
                page,
                kind,
                existing,
            });
            false
        }
    }
}
