use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ChapterError;

/// Tunables for table-of-contents location and body scanning. Every field
/// has a default, so a JSON config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// First page (1-based) that may open the table of contents.
    pub toc_search_first_page: u32,
    /// Last page (1-based) that may open the table of contents.
    pub toc_search_last_page: u32,
    /// Upper bound on TOC length, counting the opening page.
    pub max_toc_pages: u32,
    pub min_continuation_signals: usize,
    /// Pages with more "Chapter N" mentions than this need strict
    /// validation before a header is trusted.
    pub dense_page_threshold: usize,
    pub strict_lookahead_lines: usize,
    pub substantial_line_chars: usize,
    pub max_header_prefix_chars: usize,
    pub max_reference_prefix_chars: usize,
    /// Pages skipped at the front of the book when no TOC pages are known.
    pub leading_pages_without_toc: u32,
    /// Extra uppercase-insensitive keywords that mark a section opener on a
    /// dense page, on top of the section titles parsed from the TOC.
    pub section_keywords: Vec<String>,
    pub divider_lookback_pages: u32,
    pub divider_max_lines: usize,
    pub part_divider_scan_lines: usize,
    pub part_divider_max_lines: usize,
    /// Section id to first chapter id, used for divider detection only when
    /// no TOC chapters are available.
    pub fallback_section_starts: BTreeMap<String, String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            toc_search_first_page: 4,
            toc_search_last_page: 16,
            max_toc_pages: 15,
            min_continuation_signals: 2,
            dense_page_threshold: 3,
            strict_lookahead_lines: 8,
            substantial_line_chars: 30,
            max_header_prefix_chars: 10,
            max_reference_prefix_chars: 5,
            leading_pages_without_toc: 3,
            section_keywords: Vec::new(),
            divider_lookback_pages: 4,
            divider_max_lines: 2,
            part_divider_scan_lines: 10,
            part_divider_max_lines: 15,
            fallback_section_starts: BTreeMap::new(),
        }
    }
}

impl DetectorConfig {
    pub fn load(path: &Path) -> Result<Self, ChapterError> {
        let raw = fs::read(path).map_err(|err| {
            ChapterError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        let config: Self = serde_json::from_slice(&raw).map_err(|err| {
            ChapterError::Config(format!("failed to parse {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChapterError> {
        if self.toc_search_first_page == 0 {
            return Err(ChapterError::Config(
                "toc_search_first_page is 1-based and must be at least 1".to_string(),
            ));
        }
        if self.toc_search_last_page < self.toc_search_first_page {
            return Err(ChapterError::Config(format!(
                "toc_search_last_page ({}) is before toc_search_first_page ({})",
                self.toc_search_last_page, self.toc_search_first_page
            )));
        }
        if self.max_toc_pages == 0 {
            return Err(ChapterError::Config(
                "max_toc_pages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let raw = r#"{ "section_keywords": ["PRODUCT SKILLS"], "dense_page_threshold": 5 }"#;
        let config: DetectorConfig = serde_json::from_str(raw).expect("config should parse");

        assert_eq!(config.section_keywords, vec!["PRODUCT SKILLS".to_string()]);
        assert_eq!(config.dense_page_threshold, 5);
        assert_eq!(config.toc_search_first_page, 4);
        assert_eq!(config.divider_lookback_pages, 4);
    }

    #[test]
    fn load_rejects_inverted_toc_window() {
        let path = std::env::temp_dir().join(format!(
            "chapterscan_config_{}_inverted.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{ "toc_search_first_page": 10, "toc_search_last_page": 5 }"#,
        )
        .expect("write temp config");

        let result = DetectorConfig::load(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ChapterError::Config(_))));
    }
}
