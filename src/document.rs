use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::ChapterError;

/// Per-page plain text access to one document. Pages are 1-based.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Text of a single page. Pages without a text layer yield an empty
    /// string rather than an error.
    fn page_text(&self, page: u32) -> Result<String, ChapterError>;
}

/// Opens `path` with the backend matching its extension: `.txt` files are
/// read as form-feed separated pages, everything else goes through poppler.
pub fn open_document(path: &Path) -> Result<Box<dyn PageSource>, ChapterError> {
    let is_text = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);

    if is_text {
        Ok(Box::new(TextDocument::open(path)?))
    } else {
        Ok(Box::new(PdftotextDocument::open(path)?))
    }
}

/// PDF text layer extracted through poppler's `pdftotext`, one page per
/// form-feed separated chunk.
#[derive(Debug)]
pub struct PdftotextDocument {
    pages: Vec<String>,
    page_count: u32,
}

impl PdftotextDocument {
    pub fn open(path: &Path) -> Result<Self, ChapterError> {
        if !path.is_file() {
            return Err(access_error(path, "file does not exist"));
        }

        let page_count = read_page_count(path)?;
        let pages = extract_pages_with_pdftotext(path)?;

        if pages.len() as u32 != page_count {
            debug!(
                path = %path.display(),
                page_count,
                extracted = pages.len(),
                "pdftotext page split differs from pdfinfo page count"
            );
        }

        Ok(Self { pages, page_count })
    }
}

impl PageSource for PdftotextDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_text(&self, page: u32) -> Result<String, ChapterError> {
        if page == 0 || page > self.page_count {
            return Err(ChapterError::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }

        Ok(self
            .pages
            .get((page - 1) as usize)
            .cloned()
            .unwrap_or_default())
    }
}

fn read_page_count(pdf_path: &Path) -> Result<u32, ChapterError> {
    let output = Command::new("pdfinfo")
        .arg(pdf_path)
        .output()
        .map_err(|err| access_error(pdf_path, &format!("failed to execute pdfinfo: {err}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(access_error(
            pdf_path,
            &format!("pdfinfo returned non-zero exit status: {}", stderr.trim()),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_pdfinfo_pages(&stdout)
        .ok_or_else(|| access_error(pdf_path, "pdfinfo output has no page count"))
}

fn parse_pdfinfo_pages(stdout: &str) -> Option<u32> {
    stdout.lines().find_map(|line| {
        let value = line.strip_prefix("Pages:")?;
        value.trim().parse::<u32>().ok()
    })
}

fn extract_pages_with_pdftotext(pdf_path: &Path) -> Result<Vec<String>, ChapterError> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .map_err(|err| access_error(pdf_path, &format!("failed to execute pdftotext: {err}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(access_error(
            pdf_path,
            &format!("pdftotext returned non-zero exit status: {}", stderr.trim()),
        ));
    }

    Ok(split_form_feed_pages(&String::from_utf8_lossy(&output.stdout)))
}

/// pdftotext terminates every page with a form feed, so the chunk after the
/// final one is dropped when it is blank.
fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect::<Vec<String>>();

    if pages.len() > 1 && pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }

    pages
}

fn access_error(path: &Path, reason: &str) -> ChapterError {
    ChapterError::DocumentAccess {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Already-extracted page text, either read from a form-feed separated file
/// or built in memory.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, ChapterError> {
        let raw = fs::read_to_string(path).map_err(|err| access_error(path, &err.to_string()))?;
        Ok(Self {
            pages: split_form_feed_pages(&raw),
        })
    }
}

impl PageSource for TextDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, ChapterError> {
        if page == 0 {
            return Err(ChapterError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            });
        }

        self.pages
            .get((page - 1) as usize)
            .cloned()
            .ok_or(ChapterError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_form_feed_pages_drops_trailing_terminator_only() {
        let pages = split_form_feed_pages("first\u{000C}\u{000C}third\u{000C}");
        assert_eq!(pages, vec!["first", "", "third"]);
    }

    #[test]
    fn parse_pdfinfo_pages_reads_page_line() {
        let stdout = "Title:          Sample\nPages:          312\nEncrypted:      no\n";
        assert_eq!(parse_pdfinfo_pages(stdout), Some(312));
        assert_eq!(parse_pdfinfo_pages("Title: x\n"), None);
    }

    #[test]
    fn text_document_rejects_out_of_range_pages() {
        let document = TextDocument::new(["one", ""]);
        assert_eq!(document.page_count(), 2);
        assert_eq!(document.page_text(2).expect("empty page is readable"), "");
        assert!(document.page_text(0).is_err());
        assert!(document.page_text(3).is_err());
    }
}
