use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use chapterscan::chapters::{TracingSink, resolve_chapters};
use chapterscan::model::{ChapterPlan, ChapterReport};
use chapterscan::plan::{build_split_plan, render_preview};
use chapterscan::util::{now_utc_string, sha256_file};

use crate::cli::AnalyzeArgs;
use crate::commands::{book_name, load_config, open_book};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let document = open_book(&args.path)?;

    let mut sink = TracingSink;
    let plan = resolve_chapters(document.as_ref(), &config, &mut sink)
        .with_context(|| format!("chapter detection failed for {}", args.path.display()))?;

    info!(
        chapters = plan.chapters.len(),
        warnings = plan.warnings.len(),
        body_scanned = plan.body_scanned,
        "chapter detection complete"
    );

    let report = build_report(&args.path, plan)?;

    if args.json {
        write_json_report(&report)?;
    } else {
        write_text_report(&report)?;
    }

    if args.preview {
        let split_plan = build_split_plan(&report.book_name, &report.chapters, report.total_pages);
        let mut output = io::BufWriter::new(io::stdout().lock());
        write!(output, "{}", render_preview(&split_plan))?;
        output.flush()?;
    }

    Ok(())
}

pub fn build_report(path: &Path, plan: ChapterPlan) -> Result<ChapterReport> {
    let source_sha256 = sha256_file(path)?;

    Ok(ChapterReport {
        book_name: book_name(path),
        source_path: path.display().to_string(),
        source_sha256,
        generated_at: now_utc_string(),
        total_pages: plan.total_pages,
        total_chapters: plan.chapters.len(),
        toc_pages: plan.toc_pages,
        body_scanned: plan.body_scanned,
        sections: plan.sections,
        chapters: plan.chapters,
        warnings: plan.warnings,
    })
}

fn write_json_report(report: &ChapterReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize chapter report")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_report(report: &ChapterReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Book: {}", report.book_name)?;
    writeln!(
        output,
        "Pages: {} toc_pages={:?} body_scanned={}",
        report.total_pages, report.toc_pages, report.body_scanned
    )?;
    writeln!(output, "Sections: {}", report.sections.len())?;
    for section in report.sections.values() {
        let inferred = if section.inferred { " (inferred)" } else { "" };
        writeln!(output, "\t{}\t{}{inferred}", section.id, section.title)?;
    }

    writeln!(output, "Chapters: {}", report.total_chapters)?;
    for chapter in &report.chapters {
        writeln!(
            output,
            "{}\t{}\t{}\t{}\t{}",
            chapter.id,
            chapter.section.as_deref().unwrap_or("-"),
            chapter.page_range.as_deref().unwrap_or("-"),
            chapter.source.as_str(),
            chapter.title
        )?;
    }

    if !report.warnings.is_empty() {
        writeln!(output, "Warnings: {}", report.warnings.len())?;
        for warning in &report.warnings {
            writeln!(output, "\t{warning}")?;
        }
    }

    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chapterscan::model::SectionMap;

    use super::*;

    #[test]
    fn report_carries_source_hash_and_plan() {
        let path = std::env::temp_dir().join(format!(
            "chapterscan_report_{}.txt",
            std::process::id()
        ));
        fs::write(&path, "abc").expect("write fixture");

        let plan = ChapterPlan {
            toc_pages: vec![4],
            total_pages: 12,
            body_scanned: true,
            sections: SectionMap::new(),
            chapters: Vec::new(),
            warnings: vec!["chapter 3 has no start page".to_string()],
        };
        let report = build_report(&path, plan).expect("report builds");
        fs::remove_file(&path).ok();

        assert_eq!(
            report.source_sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(report.book_name.starts_with("chapterscan_report_"));
        assert_eq!(report.total_pages, 12);
        assert_eq!(report.total_chapters, 0);
        assert_eq!(report.warnings.len(), 1);
    }
}
