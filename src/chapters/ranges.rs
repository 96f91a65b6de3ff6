use crate::chapters::events::{ChapterEvent, EventSink};
use crate::model::Chapter;
use crate::util::chapter_id_order;

/// Orders chapters by start page and derives each end page from the next
/// chapter's start. Chapters without a page are left out.
pub fn calculate_ranges(
    chapters: &[Chapter],
    total_pages: u32,
    sink: &mut dyn EventSink,
) -> Vec<Chapter> {
    let mut placed = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        match chapter.page {
            Some(page) => placed.push((page, chapter)),
            None => sink.emit(ChapterEvent::UnresolvedChapter {
                id: chapter.id.clone(),
            }),
        }
    }
    placed.sort_by(|(left_page, left), (right_page, right)| {
        left_page
            .cmp(right_page)
            .then_with(|| chapter_id_order(&left.id, &right.id))
    });

    let next_starts = placed
        .iter()
        .skip(1)
        .map(|(page, _)| Some(*page))
        .chain(std::iter::once(None))
        .collect::<Vec<Option<u32>>>();

    placed
        .iter()
        .zip(next_starts)
        .map(|((start_page, chapter), next_start)| {
            let start_page = *start_page;
            let end_page = next_start.map(|next| {
                let computed_end = next.saturating_sub(1);
                if computed_end >= start_page {
                    return computed_end;
                }

                let coerced_end = coerce_end(start_page, total_pages);
                sink.emit(ChapterEvent::RangeCoerced {
                    id: chapter.id.clone(),
                    start_page,
                    computed_end,
                    coerced_end,
                });
                coerced_end
            });

            let mut ranged = (*chapter).clone();
            ranged.start_page = Some(start_page);
            ranged.end_page = end_page;
            ranged.page_range = Some(format_page_range(start_page, end_page));
            ranged
        })
        .collect()
}

/// One page past the start, kept inside the document unless the start
/// itself already lies beyond the last page.
fn coerce_end(start_page: u32, total_pages: u32) -> u32 {
    let end = start_page.saturating_add(1);
    if total_pages > 0 {
        end.min(total_pages.max(start_page))
    } else {
        end
    }
}

pub fn format_page_range(start_page: u32, end_page: Option<u32>) -> String {
    match end_page {
        Some(end_page) => format!("pages {start_page}-{end_page}"),
        None => format!("pages {start_page}-end"),
    }
}
