use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterSource {
    Toc,
    Pattern,
    PdfOnly,
}

impl ChapterSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toc => "toc",
            Self::Pattern => "pattern",
            Self::PdfOnly => "pdf_only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub page: Option<u32>,
    pub section: Option<String>,
    pub section_title: Option<String>,
    pub source: ChapterSource,
    #[serde(default)]
    pub start_page: Option<u32>,
    #[serde(default)]
    pub end_page: Option<u32>,
    #[serde(default)]
    pub page_range: Option<String>,
    /// Page the chapter header was detected on before a section divider
    /// page moved its start backwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<u32>,
}

impl Chapter {
    pub fn from_toc(
        id: impl Into<String>,
        title: impl Into<String>,
        page: Option<u32>,
        section: Option<String>,
        section_title: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            page,
            section,
            section_title,
            source: ChapterSource::Toc,
            start_page: None,
            end_page: None,
            page_range: None,
            source_page: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub full_title: String,
    pub part_number: Option<String>,
    pub part_based: bool,
    pub inferred: bool,
}

pub type SectionMap = BTreeMap<String, Section>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The page carries the chapter's own printed header.
    Real,
    /// A "Chapter N:" mention that may only point at the chapter.
    Reference,
    /// Page number taken verbatim from the table of contents.
    Toc,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Reference => "reference",
            Self::Toc => "toc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEvidence {
    pub page: u32,
    pub kind: MatchKind,
    pub source_page: u32,
    pub heading: Option<String>,
}

impl PageEvidence {
    pub fn new(page: u32, kind: MatchKind, heading: Option<String>) -> Self {
        Self {
            page,
            kind,
            source_page: page,
            heading,
        }
    }

    pub fn relocated(&self) -> bool {
        self.page != self.source_page
    }
}

/// Outcome of offering a piece of evidence to [`ChapterPages::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,
    /// A real header displaced an earlier reference.
    Overrode { previous_page: u32 },
    Discarded { existing: MatchKind },
}

impl RecordOutcome {
    pub fn accepted(self) -> bool {
        !matches!(self, Self::Discarded { .. })
    }
}

/// Chapter id to resolved start page, with the override rules of the body
/// scan applied as evidence arrives. Results depend on arrival order, so
/// callers must feed pages in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChapterPages {
    entries: BTreeMap<String, PageEvidence>,
}

impl ChapterPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: &str, evidence: PageEvidence) -> RecordOutcome {
        let Some(existing) = self.entries.get(id) else {
            self.entries.insert(id.to_string(), evidence);
            return RecordOutcome::Inserted;
        };

        match (existing.kind, evidence.kind) {
            (MatchKind::Reference, MatchKind::Real) => {
                let previous_page = existing.page;
                self.entries.insert(id.to_string(), evidence);
                RecordOutcome::Overrode { previous_page }
            }
            (existing_kind, _) => RecordOutcome::Discarded {
                existing: existing_kind,
            },
        }
    }

    pub fn get(&self, id: &str) -> Option<&PageEvidence> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PageEvidence> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PageEvidence)> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn to_page_map(&self) -> BTreeMap<String, u32> {
        self.entries
            .iter()
            .map(|(id, evidence)| (id.clone(), evidence.page))
            .collect()
    }

    /// Wraps bare pages from an external caller as scan evidence.
    pub fn from_page_map(pages: &BTreeMap<String, u32>) -> Self {
        let entries = pages
            .iter()
            .map(|(id, page)| (id.clone(), PageEvidence::new(*page, MatchKind::Real, None)))
            .collect();
        Self { entries }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterPlan {
    pub toc_pages: Vec<u32>,
    pub total_pages: u32,
    pub body_scanned: bool,
    pub sections: SectionMap,
    pub chapters: Vec<Chapter>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterReport {
    pub book_name: String,
    pub source_path: String,
    pub source_sha256: String,
    pub generated_at: String,
    pub total_pages: u32,
    pub total_chapters: usize,
    pub toc_pages: Vec<u32>,
    pub body_scanned: bool,
    pub sections: SectionMap,
    pub chapters: Vec<Chapter>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_header_overrides_earlier_reference() {
        let mut pages = ChapterPages::new();
        assert_eq!(
            pages.record("3", PageEvidence::new(12, MatchKind::Reference, None)),
            RecordOutcome::Inserted
        );
        assert_eq!(
            pages.record("3", PageEvidence::new(40, MatchKind::Real, None)),
            RecordOutcome::Overrode { previous_page: 12 }
        );

        let evidence = pages.get("3").expect("chapter 3 recorded");
        assert_eq!(evidence.page, 40);
        assert_eq!(evidence.kind, MatchKind::Real);
    }

    #[test]
    fn later_matches_never_displace_a_real_header() {
        let mut pages = ChapterPages::new();
        pages.record("3", PageEvidence::new(40, MatchKind::Real, None));

        let reference = pages.record("3", PageEvidence::new(55, MatchKind::Reference, None));
        let second_real = pages.record("3", PageEvidence::new(70, MatchKind::Real, None));

        assert!(!reference.accepted());
        assert!(!second_real.accepted());
        assert_eq!(pages.get("3").map(|evidence| evidence.page), Some(40));
    }

    #[test]
    fn first_reference_is_kept_over_later_references() {
        let mut pages = ChapterPages::new();
        pages.record("8", PageEvidence::new(20, MatchKind::Reference, None));
        let outcome = pages.record("8", PageEvidence::new(25, MatchKind::Reference, None));

        assert_eq!(
            outcome,
            RecordOutcome::Discarded {
                existing: MatchKind::Reference
            }
        );
        assert_eq!(pages.get("8").map(|evidence| evidence.page), Some(20));
    }
}
