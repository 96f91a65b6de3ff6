use std::cmp::Ordering;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

const MAX_FILENAME_CHARS: usize = 200;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Numeric chapter ids sort numerically and ahead of everything else;
/// non-numeric ids follow in lexicographic order.
pub fn chapter_id_order(left: &str, right: &str) -> Ordering {
    match (numeric_id(left), numeric_id(right)) {
        (Some(a), Some(b)) => a.cmp(&b).then_with(|| left.cmp(right)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.cmp(right),
    }
}

pub fn numeric_id(id: &str) -> Option<u64> {
    if id.is_empty() || !id.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    id.parse::<u64>().ok()
}

pub fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn sanitize_filename(name: &str) -> String {
    let replaced = name
        .trim()
        .chars()
        .map(|character| match character {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect::<String>();

    let joined = replaced.split_whitespace().collect::<Vec<&str>>().join("_");
    let trimmed = joined.trim_matches(|character| character == '.' || character == '_');
    let limited = trimmed.chars().take(MAX_FILENAME_CHARS).collect::<String>();

    if limited.is_empty() {
        "untitled".to_string()
    } else {
        limited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_id_order_puts_numeric_ids_first() {
        let mut ids = vec!["10", "intro", "2", "appendix", "1"];
        ids.sort_by(|a, b| chapter_id_order(a, b));
        assert_eq!(ids, vec!["1", "2", "10", "appendix", "intro"]);
    }

    #[test]
    fn sanitize_filename_replaces_reserved_characters() {
        assert_eq!(sanitize_filename("Scoping: What / Why?"), "Scoping__What___Why");
        assert_eq!(sanitize_filename("  ...  "), "untitled");
        assert_eq!(sanitize_filename("User Insight"), "User_Insight");
    }
}
