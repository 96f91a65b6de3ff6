use regex::Regex;

use crate::error::ChapterError;

/// Parts beyond this number no longer map onto a single letter and get a
/// `P<n>` section id instead.
pub const MAX_LETTER_SECTIONS: u32 = 26;

/// What a single line of text looks like to the chapter detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    /// "Part II: Execution"
    PartHeader { numeral: String, title: String },
    /// "B. Execution Skills"
    SectionHeader { letter: String, title: String },
    /// A chapter entry inside the table of contents.
    TocEntry {
        id: String,
        title: String,
        page: Option<u32>,
    },
    /// A line holding nothing but "CHAPTER <n>", possibly behind a few
    /// ornament characters.
    RealHeader { id: String, prefix_chars: usize },
    /// "Chapter <n>: ..." at the start of a line.
    Reference {
        id: String,
        prefix_chars: usize,
        heading: Option<String>,
    },
}

#[derive(Debug)]
pub struct LinePatterns {
    part_header: Regex,
    section_header: Regex,
    toc_entries: Vec<Regex>,
    real_header: Regex,
    reference: Regex,
    chapter_mention: Regex,
    chapter_like_line: Regex,
    part_marker: Regex,
    toc_start_signals: Vec<Regex>,
    toc_continuation_signals: Vec<Regex>,
    toc_end_markers: Vec<Regex>,
    dot_leader: Regex,
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, ChapterError> {
    Regex::new(pattern).map_err(|source| ChapterError::Pattern { name, source })
}

impl LinePatterns {
    pub fn new() -> Result<Self, ChapterError> {
        Ok(Self {
            part_header: compile("part header", r"(?i)^Part\s+([IVXLC]+|\d+):\s*(.+)$")?,
            section_header: compile("section header", r"^([A-Z])\.\s*(.+)$")?,
            toc_entries: vec![
                compile(
                    "numbered toc entry",
                    r"(?i)^(\d+)\.\s*(.+?)(?:(?:\s*(?:\.\s*){2,}|\s+)(\d+))?$",
                )?,
                compile(
                    "uppercase toc entry",
                    r"(?i)^CHAPTER\s+(\d+)\s+(.+?)(?:(?:\s*(?:\.\s*){2,}|\s+)(\d+))?$",
                )?,
                compile(
                    "colon toc entry",
                    r"(?i)^Chapter\s+(\d+):\s*(.+?)(?:(?:\s*(?:\.\s*){2,}|\s+)(\d+))?$",
                )?,
            ],
            real_header: compile(
                "chapter header",
                r"(?i)^(?P<prefix>[^\p{L}\p{N}]*?)\s*CHAPTER\s+(?P<id>\d+)$",
            )?,
            reference: compile(
                "chapter reference",
                r"(?i)^(?P<prefix>[^\p{L}]*?)\s*Chapter\s+(?P<id>\d+):(?P<rest>.*)$",
            )?,
            chapter_mention: compile("chapter mention", r"(?i)chapter\s+\d+")?,
            chapter_like_line: compile("chapter-like line", r"(?i)^chapter\b")?,
            part_marker: compile("part marker", r"(?i)\bPart\s+(?:[IVX]+|[1-9])\b")?,
            toc_start_signals: vec![
                compile("toc chapter signal", r"(?i)chapter\s+\d+")?,
                compile("toc numbered signal", r"(?i)\d+\.\s+\w+.*\d+")?,
                compile("toc roman signal", r"(?i)chapter\s+[ivx]+\b")?,
            ],
            toc_continuation_signals: vec![
                compile("toc chapter signal", r"(?i)chapter\s+\d+")?,
                compile("toc numbered signal", r"(?i)\d+\.\s+\w+.*\d+")?,
                compile("toc appendix signal", r"(?i)appendix\s+[a-z]\b")?,
                compile("toc interview signal", r"(?i)interview\s+\d+")?,
                compile("toc acknowledgments signal", r"(?i)acknowledg(?:e)?ments")?,
                compile("toc index signal", r"(?i)\bindex\b")?,
                compile("toc bibliography signal", r"(?i)bibliography")?,
            ],
            toc_end_markers: vec![
                compile("bare page number", r"\A\s*\d+\s*\z")?,
                compile("preface marker", r"(?i)preface")?,
                compile("introduction marker", r"(?i)introduction\s*\z")?,
                compile("part one marker", r"(?i)part\s+i\b")?,
            ],
            dot_leader: compile("dot leader", r"\s*(?:[.…]\s*){2,}\d*\s*$")?,
        })
    }

    /// Classifies a TOC line; Part headers win over lettered sections, which
    /// win over chapter entries. Entry patterns are tried in order.
    pub fn classify_toc_line(&self, line: &str) -> Option<LineMatch> {
        let line = strip_control_chars(line);
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(captures) = self.part_header.captures(line) {
            let numeral = captures.get(1)?.as_str().to_ascii_uppercase();
            let title = captures.get(2)?.as_str().trim().to_string();
            return Some(LineMatch::PartHeader { numeral, title });
        }

        if let Some(captures) = self.section_header.captures(line) {
            let letter = captures.get(1)?.as_str().to_string();
            let title = captures.get(2)?.as_str().trim().to_string();
            return Some(LineMatch::SectionHeader { letter, title });
        }

        for pattern in &self.toc_entries {
            let Some(captures) = pattern.captures(line) else {
                continue;
            };

            let id = captures.get(1)?.as_str().to_string();
            let title = self.clean_title(captures.get(2)?.as_str());
            let page = captures
                .get(3)
                .and_then(|value| value.as_str().parse::<u32>().ok())
                .filter(|page| *page > 0);
            return Some(LineMatch::TocEntry { id, title, page });
        }

        None
    }

    /// Classifies a body line; a bare header wins over a reference.
    pub fn classify_body_line(&self, line: &str) -> Option<LineMatch> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(captures) = self.real_header.captures(line) {
            let id = captures.name("id")?.as_str().to_string();
            let prefix_chars = non_whitespace_count(captures.name("prefix")?.as_str());
            return Some(LineMatch::RealHeader { id, prefix_chars });
        }

        if let Some(captures) = self.reference.captures(line) {
            let id = captures.name("id")?.as_str().to_string();
            let prefix_chars = non_whitespace_count(captures.name("prefix")?.as_str());
            let heading = captures
                .name("rest")
                .map(|rest| self.clean_title(rest.as_str()))
                .filter(|rest| !rest.is_empty());
            return Some(LineMatch::Reference {
                id,
                prefix_chars,
                heading,
            });
        }

        None
    }

    /// Number of "Chapter <n>" mentions anywhere in the text, any case.
    pub fn chapter_mentions(&self, text: &str) -> usize {
        self.chapter_mention.find_iter(text).count()
    }

    pub fn is_chapter_like(&self, line: &str) -> bool {
        self.chapter_like_line.is_match(line.trim())
    }

    pub fn has_part_marker(&self, line: &str) -> bool {
        self.part_marker.is_match(line)
    }

    pub fn has_contents_heading(&self, text: &str) -> bool {
        text.to_lowercase().contains("contents")
    }

    pub fn toc_start_signals(&self, text: &str) -> usize {
        count_matches(&self.toc_start_signals, text)
    }

    pub fn toc_continuation_signals(&self, text: &str) -> usize {
        count_matches(&self.toc_continuation_signals, text)
    }

    pub fn has_toc_end_marker(&self, text: &str) -> bool {
        self.toc_end_markers
            .iter()
            .any(|pattern| pattern.is_match(text))
    }

    /// Drops control characters, trailing dot leaders and any page number
    /// that trails them.
    pub fn clean_title(&self, raw: &str) -> String {
        let without_controls = strip_control_chars(raw);
        let without_leader = self.dot_leader.replace(without_controls.trim(), "");
        without_leader.trim().trim_end_matches('.').trim().to_string()
    }
}

fn count_matches(patterns: &[Regex], text: &str) -> usize {
    patterns
        .iter()
        .map(|pattern| pattern.find_iter(text).count())
        .sum()
}

fn non_whitespace_count(text: &str) -> usize {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .count()
}

pub fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|character| !character.is_control() || *character == '\t')
        .collect()
}

pub fn roman_to_number(numeral: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut previous = 0u32;

    for character in numeral.chars().rev() {
        let value = match character.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            _ => return None,
        };

        if value < previous {
            total = total.checked_sub(value)?;
        } else {
            total += value;
            previous = value;
        }
    }

    (total > 0).then_some(total)
}

pub fn part_number(numeral: &str) -> Option<u32> {
    if numeral.chars().all(|character| character.is_ascii_digit()) {
        return numeral.parse::<u32>().ok().filter(|number| *number > 0);
    }
    roman_to_number(numeral)
}

/// Part 1 maps to section "A", Part 2 to "B" and so on through "Z".
pub fn part_section_id(number: u32) -> Option<String> {
    match number {
        0 => None,
        1..=MAX_LETTER_SECTIONS => char::from_u32('A' as u32 + number - 1).map(String::from),
        _ => Some(format!("P{number}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> LinePatterns {
        LinePatterns::new().expect("patterns compile")
    }

    #[test]
    fn toc_entry_variants_capture_id_title_and_page() {
        let patterns = patterns();

        assert_eq!(
            patterns.classify_toc_line("4. User Insight 45"),
            Some(LineMatch::TocEntry {
                id: "4".to_string(),
                title: "User Insight".to_string(),
                page: Some(45),
            })
        );
        assert_eq!(
            patterns.classify_toc_line("CHAPTER 3 Building Teams 77"),
            Some(LineMatch::TocEntry {
                id: "3".to_string(),
                title: "Building Teams".to_string(),
                page: Some(77),
            })
        );
        assert_eq!(
            patterns.classify_toc_line("Chapter 1: Understanding the Infrastructure ....... 3"),
            Some(LineMatch::TocEntry {
                id: "1".to_string(),
                title: "Understanding the Infrastructure".to_string(),
                page: Some(3),
            })
        );
        assert_eq!(
            patterns.classify_toc_line("Chapter 12: Scoping\u{0008}\u{0008}"),
            Some(LineMatch::TocEntry {
                id: "12".to_string(),
                title: "Scoping".to_string(),
                page: None,
            })
        );
    }

    #[test]
    fn headers_take_priority_over_entries() {
        let patterns = patterns();

        assert_eq!(
            patterns.classify_toc_line("Part II: Execution"),
            Some(LineMatch::PartHeader {
                numeral: "II".to_string(),
                title: "Execution".to_string(),
            })
        );
        assert_eq!(
            patterns.classify_toc_line("B. Execution Skills"),
            Some(LineMatch::SectionHeader {
                letter: "B".to_string(),
                title: "Execution Skills".to_string(),
            })
        );
        assert_eq!(patterns.classify_toc_line("   "), None);
        assert_eq!(patterns.classify_toc_line("Foreword"), None);
    }

    #[test]
    fn body_lines_distinguish_headers_from_references() {
        let patterns = patterns();

        assert_eq!(
            patterns.classify_body_line("  CHAPTER 7  "),
            Some(LineMatch::RealHeader {
                id: "7".to_string(),
                prefix_chars: 0,
            })
        );
        assert_eq!(
            patterns.classify_body_line("— Chapter 7"),
            Some(LineMatch::RealHeader {
                id: "7".to_string(),
                prefix_chars: 1,
            })
        );
        assert_eq!(
            patterns.classify_body_line("Chapter 9: Roadmaps"),
            Some(LineMatch::Reference {
                id: "9".to_string(),
                prefix_chars: 0,
                heading: Some("Roadmaps".to_string()),
            })
        );
        assert_eq!(patterns.classify_body_line("CHAPTER 7 continues the story"), None);
        assert_eq!(patterns.classify_body_line("see Chapter 9: Roadmaps"), None);
    }

    #[test]
    fn clean_title_strips_leaders_but_keeps_version_numbers() {
        let patterns = patterns();
        assert_eq!(patterns.clean_title("Scoping . . . . . 120"), "Scoping");
        assert_eq!(patterns.clean_title("Web 2.0"), "Web 2.0");
        assert_eq!(patterns.clean_title("Endings."), "Endings");
    }

    #[test]
    fn part_numerals_map_to_section_letters() {
        assert_eq!(part_number("IV"), Some(4));
        assert_eq!(part_number("xii"), Some(12));
        assert_eq!(part_number("3"), Some(3));
        assert_eq!(part_number("0"), None);
        assert_eq!(part_section_id(1).as_deref(), Some("A"));
        assert_eq!(part_section_id(26).as_deref(), Some("Z"));
        assert_eq!(part_section_id(27).as_deref(), Some("P27"));
    }

    #[test]
    fn continuation_signals_count_entries_and_end_matter() {
        let patterns = patterns();
        let page = "Chapter 30 Building a Team\nAppendix A Templates\nIndex";
        assert_eq!(patterns.toc_continuation_signals(page), 3);
        assert!(patterns.has_toc_end_marker("  212 \n"));
        assert!(!patterns.has_toc_end_marker("Chapter 4 Strategy"));
    }
}
