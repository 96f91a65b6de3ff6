use std::fmt::Write as _;

use serde::Serialize;

use crate::model::Chapter;
use crate::util::{chapter_id_order, sanitize_filename};

pub const FLAT_SECTION_KEY: &str = "Chapters";
const RULE_WIDTH: usize = 70;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedFile {
    pub chapter_id: String,
    pub title: String,
    pub filename: String,
    pub start_page: u32,
    pub end_page: u32,
    pub page_count: u32,
    pub page_range: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionGroup {
    /// Directory name, e.g. `B._Execution_Skills`.
    pub key: String,
    pub files: Vec<PlannedFile>,
}

/// Where each chapter would be written if the book were split on the
/// resolved ranges. Nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitPlan {
    pub book_name: String,
    pub groups: Vec<SectionGroup>,
    pub total_chapters: usize,
    pub total_pages: u32,
}

pub fn section_key(chapter: &Chapter) -> String {
    let title = chapter.section_title.as_deref().unwrap_or(FLAT_SECTION_KEY);
    match chapter.section.as_deref() {
        Some(section) if !section.is_empty() => format!("{section}._{}", title.replace(' ', "_")),
        _ => sanitize_filename(title),
    }
}

pub fn chapter_filename(chapter: &Chapter) -> String {
    format!("Chapter_{}-{}.pdf", chapter.id, sanitize_filename(&chapter.title))
}

/// Groups ranged chapters by section directory in order of first appearance.
/// Chapters without a start page are left out; an open-ended last chapter
/// runs to `document_pages`.
pub fn build_split_plan(book_name: &str, chapters: &[Chapter], document_pages: u32) -> SplitPlan {
    let mut groups: Vec<SectionGroup> = Vec::new();

    for chapter in chapters {
        let Some(start_page) = chapter.start_page else {
            continue;
        };
        let end_page = chapter.end_page.unwrap_or(document_pages).max(start_page);
        let file = PlannedFile {
            chapter_id: chapter.id.clone(),
            title: chapter.title.clone(),
            filename: chapter_filename(chapter),
            start_page,
            end_page,
            page_count: end_page - start_page + 1,
            page_range: chapter
                .page_range
                .clone()
                .unwrap_or_else(|| format!("pages {start_page}-{end_page}")),
        };

        let key = section_key(chapter);
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.files.push(file),
            None => groups.push(SectionGroup {
                key,
                files: vec![file],
            }),
        }
    }

    for group in &mut groups {
        group
            .files
            .sort_by(|left, right| chapter_id_order(&left.chapter_id, &right.chapter_id));
    }

    let total_chapters = groups.iter().map(|group| group.files.len()).sum();
    let total_pages = groups
        .iter()
        .flat_map(|group| group.files.iter())
        .map(|file| file.page_count)
        .sum();

    SplitPlan {
        book_name: book_name.to_string(),
        groups,
        total_chapters,
        total_pages,
    }
}

pub fn render_preview(plan: &SplitPlan) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "Split preview for '{}'", plan.book_name);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{}_chapters/", plan.book_name);
    for group in &plan.groups {
        let _ = writeln!(out, "├── {}/", group.key);
        for file in &group.files {
            let _ = writeln!(out, "│   ├── {} ({})", file.filename, file.page_range);
            let _ = writeln!(out, "│   │   {} pages", file.page_count);
        }
    }
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total chapters: {}", plan.total_chapters);
    let _ = writeln!(out, "Total pages: {}", plan.total_pages);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChapterSource;

    fn ranged(
        id: &str,
        title: &str,
        section: Option<(&str, &str)>,
        start: u32,
        end: Option<u32>,
    ) -> Chapter {
        let mut chapter = Chapter::from_toc(
            id,
            title,
            Some(start),
            section.map(|(id, _)| id.to_string()),
            section.map(|(_, title)| title.to_string()),
        );
        chapter.source = ChapterSource::Pattern;
        chapter.start_page = Some(start);
        chapter.end_page = end;
        chapter
    }

    #[test]
    fn groups_chapters_under_section_directories() {
        let chapters = vec![
            ranged("4", "User Insight", Some(("A", "Product Skills")), 45, Some(119)),
            ranged("10", "Scoping: What & Why?", Some(("B", "Execution Skills")), 120, None),
        ];

        let plan = build_split_plan("Cracking PM", &chapters, 200);

        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.groups[0].key, "A._Product_Skills");
        assert_eq!(plan.groups[1].key, "B._Execution_Skills");
        assert_eq!(plan.groups[0].files[0].filename, "Chapter_4-User_Insight.pdf");
        assert_eq!(
            plan.groups[1].files[0].filename,
            "Chapter_10-Scoping__What_&_Why.pdf"
        );
        assert_eq!(plan.groups[1].files[0].end_page, 200);
        assert_eq!(plan.groups[1].files[0].page_count, 81);
        assert_eq!(plan.total_pages, 75 + 81);
        assert_eq!(plan.total_chapters, 2);
    }

    #[test]
    fn flat_books_use_a_single_chapters_directory() {
        let chapters = vec![
            ranged("2", "Two", None, 10, Some(19)),
            ranged("1", "One", None, 1, Some(9)),
        ];

        let plan = build_split_plan("Flat", &chapters, 30);
        let preview = render_preview(&plan);

        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].key, FLAT_SECTION_KEY);
        assert_eq!(plan.groups[0].files[0].chapter_id, "1");
        assert!(preview.contains("├── Chapters/"));
        assert!(preview.contains("Chapter_1-One.pdf (pages 1-9)"));
        assert!(preview.contains("Total pages: 19"));
    }
}
