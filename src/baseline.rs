use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Chapter, SectionMap};

const TITLE_PREVIEW_CHARS: usize = 30;

/// The fields of a stored chapter that a regression run compares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BaselineChapter {
    pub id: Option<String>,
    pub title: Option<String>,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub section: Option<String>,
    pub section_title: Option<String>,
    pub page_range: Option<String>,
}

impl From<&Chapter> for BaselineChapter {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: Some(chapter.id.clone()),
            title: Some(chapter.title.clone()),
            start_page: chapter.start_page,
            end_page: chapter.end_page,
            section: chapter.section.clone(),
            section_title: chapter.section_title.clone(),
            page_range: chapter.page_range.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BaselineFile {
    Chapters(Vec<BaselineChapter>),
    Report { chapters: Vec<BaselineChapter> },
}

/// Reads a stored result: either a bare chapter array or a report object
/// with a `chapters` array.
pub fn load_baseline(path: &Path) -> Result<Vec<BaselineChapter>> {
    let raw = fs::read(path)
        .with_context(|| format!("failed to read baseline {}", path.display()))?;
    parse_baseline(&raw).with_context(|| format!("failed to parse baseline {}", path.display()))
}

pub fn parse_baseline(raw: &[u8]) -> Result<Vec<BaselineChapter>> {
    let file: BaselineFile =
        serde_json::from_slice(raw).context("expected a chapter array or an object with chapters")?;
    Ok(match file {
        BaselineFile::Chapters(chapters) => chapters,
        BaselineFile::Report { chapters } => chapters,
    })
}

/// Position-by-position comparison of baseline and current chapters. A
/// count mismatch is reported alone.
pub fn compare_chapters(baseline: &[BaselineChapter], current: &[Chapter]) -> Vec<String> {
    if baseline.len() != current.len() {
        return vec![format!(
            "chapter count mismatch: {} baseline vs {} current",
            baseline.len(),
            current.len()
        )];
    }

    let mut differences = Vec::new();
    for (index, (expected, chapter)) in baseline.iter().zip(current).enumerate() {
        let actual = BaselineChapter::from(chapter);
        let mut fields = Vec::new();

        push_if_changed(&mut fields, "id", &expected.id, &actual.id);
        push_if_changed(&mut fields, "title", &expected.title, &actual.title);
        push_if_changed(&mut fields, "start_page", &expected.start_page, &actual.start_page);
        push_if_changed(&mut fields, "end_page", &expected.end_page, &actual.end_page);
        push_if_changed(&mut fields, "section", &expected.section, &actual.section);
        push_if_changed(&mut fields, "page_range", &expected.page_range, &actual.page_range);

        if fields.is_empty() {
            continue;
        }

        let label = expected
            .id
            .clone()
            .unwrap_or_else(|| (index + 1).to_string());
        differences.push(format!(
            "chapter {label} ({}): {}",
            short_title(expected.title.as_deref().unwrap_or("Unknown")),
            fields.join(", ")
        ));
    }

    differences
}

/// Section ids and titles implied by the baseline chapters against the
/// sections parsed now.
pub fn compare_sections(baseline: &[BaselineChapter], current: &SectionMap) -> Vec<String> {
    let mut expected: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    for chapter in baseline {
        if let Some(section) = chapter.section.as_deref().filter(|s| !s.is_empty()) {
            expected
                .entry(section)
                .or_insert(chapter.section_title.as_deref());
        }
    }

    let expected_ids = expected.keys().copied().collect::<BTreeSet<&str>>();
    let current_ids = current.keys().map(String::as_str).collect::<BTreeSet<&str>>();
    let mut differences = Vec::new();

    let missing = expected_ids.difference(&current_ids).collect::<Vec<_>>();
    if !missing.is_empty() {
        differences.push(format!("missing sections in current: {missing:?}"));
    }
    let extra = current_ids.difference(&expected_ids).collect::<Vec<_>>();
    if !extra.is_empty() {
        differences.push(format!("extra sections in current: {extra:?}"));
    }

    for id in expected_ids.intersection(&current_ids) {
        let expected_title = expected.get(id).copied().flatten();
        let current_title = current.get(*id).map(|section| section.title.as_str());
        if expected_title != current_title {
            differences.push(format!(
                "section {id} title: {expected_title:?} -> {current_title:?}"
            ));
        }
    }

    differences
}

fn push_if_changed<T: PartialEq + std::fmt::Debug>(
    fields: &mut Vec<String>,
    name: &str,
    expected: &Option<T>,
    actual: &Option<T>,
) {
    if expected != actual {
        fields.push(format!("{name}: {expected:?} -> {actual:?}"));
    }
}

fn short_title(title: &str) -> String {
    if title.chars().count() > TITLE_PREVIEW_CHARS {
        let prefix = title.chars().take(TITLE_PREVIEW_CHARS).collect::<String>();
        format!("{prefix}...")
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Section;

    fn current_chapter(id: &str, title: &str, start: u32, end: Option<u32>) -> Chapter {
        let mut chapter = Chapter::from_toc(
            id,
            title,
            Some(start),
            Some("A".to_string()),
            Some("Product Skills".to_string()),
        );
        chapter.start_page = Some(start);
        chapter.end_page = end;
        chapter.page_range = Some(match end {
            Some(end) => format!("pages {start}-{end}"),
            None => format!("pages {start}-end"),
        });
        chapter
    }

    #[test]
    fn parses_bare_arrays_and_report_objects() {
        let bare = br#"[{"id": "1", "title": "Intro", "start_page": 5}]"#;
        let report =
            br#"{"book_name": "x", "chapters": [{"id": "1", "title": "Intro", "extra": true}]}"#;

        assert_eq!(parse_baseline(bare).expect("bare array")[0].start_page, Some(5));
        assert_eq!(
            parse_baseline(report).expect("report object")[0].title.as_deref(),
            Some("Intro")
        );
        assert!(parse_baseline(br#"{"pages": []}"#).is_err());
    }

    #[test]
    fn identical_results_have_no_differences() {
        let current = vec![
            current_chapter("1", "Intro", 5, Some(9)),
            current_chapter("2", "Depth", 10, None),
        ];
        let baseline = current.iter().map(BaselineChapter::from).collect::<Vec<_>>();

        assert!(compare_chapters(&baseline, &current).is_empty());
    }

    #[test]
    fn reports_field_changes_per_chapter() {
        let current = vec![current_chapter("1", "Intro", 6, None)];
        let mut expected = BaselineChapter::from(&current[0]);
        expected.start_page = Some(5);
        expected.page_range = Some("pages 5-end".to_string());

        let differences = compare_chapters(&[expected], &current);

        assert_eq!(differences.len(), 1);
        assert!(differences[0].starts_with("chapter 1 (Intro): start_page"));
        assert!(differences[0].contains("page_range"));
    }

    #[test]
    fn count_mismatch_is_reported_alone() {
        let current = vec![current_chapter("1", "Intro", 5, None)];
        let differences = compare_chapters(&[], &current);
        assert_eq!(differences, vec!["chapter count mismatch: 0 baseline vs 1 current"]);
    }

    #[test]
    fn section_comparison_flags_missing_and_renamed_sections() {
        let baseline = vec![
            BaselineChapter {
                section: Some("A".to_string()),
                section_title: Some("Product Skills".to_string()),
                ..BaselineChapter::default()
            },
            BaselineChapter {
                section: Some("B".to_string()),
                section_title: Some("Execution".to_string()),
                ..BaselineChapter::default()
            },
        ];
        let mut current = SectionMap::new();
        current.insert(
            "A".to_string(),
            Section {
                id: "A".to_string(),
                title: "Product Sense".to_string(),
                full_title: "A. Product Sense".to_string(),
                part_number: None,
                part_based: false,
                inferred: false,
            },
        );

        let differences = compare_sections(&baseline, &current);

        assert_eq!(differences.len(), 2);
        assert!(differences[0].starts_with("missing sections in current"));
        assert!(differences[1].starts_with("section A title"));
    }
}
