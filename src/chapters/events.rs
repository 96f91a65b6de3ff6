use tracing::{debug, info, warn};

use crate::model::MatchKind;

/// Why the table of contents stopped growing at a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocStop {
    EndMarker,
    TooFewSignals,
    SpanLimit,
    EndOfDocument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterEvent {
    TocStart { page: u32 },
    TocContinues { page: u32, signals: usize },
    TocEnds { page: u32, reason: TocStop },
    SectionFound {
        id: String,
        title: String,
        part_based: bool,
    },
    SectionInferred { id: String, chapters: usize },
    TocChapter {
        id: String,
        page: Option<u32>,
        section: Option<String>,
    },
    DuplicateTocChapter { id: String },
    TocPagesUsed { chapters: usize },
    PageUnreadable { page: u32, reason: String },
    HeaderAccepted {
        id: String,
        page: u32,
        kind: MatchKind,
        strict: bool,
    },
    HeaderRejected {
        id: String,
        page: u32,
        reason: &'static str,
    },
    EvidenceOverridden {
        id: String,
        from_page: u32,
        to_page: u32,
    },
    EvidenceDiscarded {
        id: String,
        page: u32,
        kind: MatchKind,
        existing: MatchKind,
    },
    DividerFound {
        id: String,
        from_page: u32,
        to_page: u32,
    },
    DividerNotFound { id: String, page: u32 },
    TitleMismatch {
        id: String,
        toc_title: String,
        scanned_title: String,
    },
    ScanOnlyChapter { id: String, page: u32 },
    UnresolvedChapter { id: String },
    RangeCoerced {
        id: String,
        start_page: u32,
        computed_end: u32,
        coerced_end: u32,
    },
}

impl ChapterEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::PageUnreadable { .. }
                | Self::TitleMismatch { .. }
                | Self::UnresolvedChapter { .. }
                | Self::RangeCoerced { .. }
        )
    }

    pub fn describe(&self) -> String {
        match self {
            Self::TocStart { page } => format!("table of contents starts on page {page}"),
            Self::TocContinues { page, signals } => {
                format!("table of contents continues on page {page} ({signals} entries)")
            }
            Self::TocEnds { page, reason } => {
                format!("table of contents ends before page {page} ({reason:?})")
            }
            Self::SectionFound { id, title, .. } => format!("section {id}: {title}"),
            Self::SectionInferred { id, chapters } => {
                format!("inferred section {id} covering {chapters} chapters")
            }
            Self::TocChapter { id, page, section } => format!(
                "toc chapter {id} page {} section {}",
                page.map(|value| value.to_string()).unwrap_or_else(|| "-".to_string()),
                section.as_deref().unwrap_or("-")
            ),
            Self::DuplicateTocChapter { id } => {
                format!("chapter {id} listed twice in the table of contents, keeping the last")
            }
            Self::TocPagesUsed { chapters } => {
                format!("using table of contents pages for {chapters} chapters, body scan skipped")
            }
            Self::PageUnreadable { page, reason } => format!("skipped page {page}: {reason}"),
            Self::HeaderAccepted { id, page, kind, strict } => format!(
                "chapter {id} {} on page {page}{}",
                kind.as_str(),
                if *strict { " (strict)" } else { "" }
            ),
            Self::HeaderRejected { id, page, reason } => {
                format!("rejected chapter {id} header on page {page}: {reason}")
            }
            Self::EvidenceOverridden { id, from_page, to_page } => {
                format!("chapter {id} reference on page {from_page} replaced by page {to_page}")
            }
            Self::EvidenceDiscarded { id, page, kind, existing } => format!(
                "ignored chapter {id} {} on page {page}, {} already recorded",
                kind.as_str(),
                existing.as_str()
            ),
            Self::DividerFound { id, from_page, to_page } => {
                format!("chapter {id} moved from page {from_page} to divider page {to_page}")
            }
            Self::DividerNotFound { id, page } => {
                format!("no section divider before chapter {id} on page {page}")
            }
            Self::TitleMismatch { id, toc_title, scanned_title } => format!(
                "chapter {id} title differs: toc {toc_title:?}, page {scanned_title:?}"
            ),
            Self::ScanOnlyChapter { id, page } => {
                format!("chapter {id} found on page {page} but not in the table of contents")
            }
            Self::UnresolvedChapter { id } => format!("chapter {id} has no start page"),
            Self::RangeCoerced {
                id,
                start_page,
                computed_end,
                coerced_end,
            } => format!(
                "chapter {id} range {start_page}-{computed_end} is inverted, \
                 using {start_page}-{coerced_end}"
            ),
        }
    }
}

/// Receiver for progress and diagnostic events from the chapter pipeline.
pub trait EventSink {
    fn emit(&mut self, event: ChapterEvent);
}

impl EventSink for Vec<ChapterEvent> {
    fn emit(&mut self, event: ChapterEvent) {
        self.push(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: ChapterEvent) {}
}

/// Forwards events to `tracing`: warnings at `warn`, stage boundaries at
/// `info`, everything else at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: ChapterEvent) {
        let message = event.describe();
        if event.is_warning() {
            warn!(event = %message, "chapter detection warning");
            return;
        }

        match event {
            ChapterEvent::TocStart { .. }
            | ChapterEvent::TocEnds { .. }
            | ChapterEvent::SectionFound { .. }
            | ChapterEvent::SectionInferred { .. }
            | ChapterEvent::TocPagesUsed { .. }
            | ChapterEvent::DividerFound { .. }
            | ChapterEvent::ScanOnlyChapter { .. } => info!(event = %message, "chapter detection"),
            _ => debug!(event = %message, "chapter detection"),
        }
    }
}
